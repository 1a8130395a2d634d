//! ROSflight MAVLink Dialect
//!
//! The ROSflight-specific messages as rust-mavlink [`MessageData`] types, and
//! [`RosflightMessage`], the dialect enum that layers them over
//! `mavlink::common`. Fields are declared in wire order (MAVLink sorts
//! fields by element size, largest first); serialization is little-endian.
//!
//! Decoding is total: a payload shorter than the message's encoded length
//! (MAVLink 2 trims trailing zeros, or the sender is simply wrong) is
//! zero-extended, and extra bytes are ignored.
//!
//! ROSflight identifiers take precedence over common ones: id 192 is
//! ROSFLIGHT_VERSION here, not MAG_CAL_REPORT.

use super::frame::MAX_PAYLOAD_LEN;
use crate::core::bounded::copy_bounded;
use ::core::ops::RangeInclusive;
use ::mavlink::bytes::Bytes;
use ::mavlink::bytes_mut::BytesMut;
use ::mavlink::common::MavMessage;
use ::mavlink::error::ParserError;
use ::mavlink::utils::remove_trailing_zeroes;
use ::mavlink::{MavlinkVersion, Message, MessageData};

/// A primitive or array that can appear as a payload field
pub trait WireField: Copy {
    /// Value of an all-zero encoding
    const ZERO: Self;

    fn put(&self, buf: &mut BytesMut<'_>);
    fn get(buf: &mut Bytes<'_>) -> Self;
}

macro_rules! wire_primitive {
    ($($ty:ty => $put:ident, $get:ident, $zero:expr;)*) => {
        $(
            impl WireField for $ty {
                const ZERO: Self = $zero;

                fn put(&self, buf: &mut BytesMut<'_>) {
                    buf.$put(*self);
                }

                fn get(buf: &mut Bytes<'_>) -> Self {
                    buf.$get()
                }
            }
        )*
    };
}

wire_primitive! {
    u8 => put_u8, get_u8, 0;
    i8 => put_i8, get_i8, 0;
    u16 => put_u16_le, get_u16_le, 0;
    i16 => put_i16_le, get_i16_le, 0;
    u32 => put_u32_le, get_u32_le, 0;
    i32 => put_i32_le, get_i32_le, 0;
    u64 => put_u64_le, get_u64_le, 0;
    i64 => put_i64_le, get_i64_le, 0;
    f32 => put_f32_le, get_f32_le, 0.0;
}

impl<T: WireField, const N: usize> WireField for [T; N] {
    const ZERO: Self = [T::ZERO; N];

    fn put(&self, buf: &mut BytesMut<'_>) {
        for item in self {
            item.put(buf);
        }
    }

    fn get(buf: &mut Bytes<'_>) -> Self {
        ::core::array::from_fn(|_| T::get(buf))
    }
}

macro_rules! message {
    (
        $(#[$meta:meta])*
        $name:ident { id: $id:expr, name: $wire:literal, crc_extra: $crc:expr, len: $len:expr }
        {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $name {
            pub const DEFAULT: Self = Self {
                $( $field: <$ty as WireField>::ZERO, )*
            };
        }

        impl Default for $name {
            fn default() -> Self {
                Self::DEFAULT
            }
        }

        impl MessageData for $name {
            type Message = RosflightMessage;

            const ID: u32 = $id;
            const NAME: &'static str = $wire;
            const EXTRA_CRC: u8 = $crc;
            const ENCODED_LEN: usize = $len;

            fn ser(&self, version: MavlinkVersion, bytes: &mut [u8]) -> usize {
                let mut buf = BytesMut::new(bytes);
                $( WireField::put(&self.$field, &mut buf); )*
                let len = buf.len();
                match version {
                    MavlinkVersion::V1 => len,
                    MavlinkVersion::V2 => remove_trailing_zeroes(&bytes[..len]),
                }
            }

            fn deser(_version: MavlinkVersion, payload: &[u8]) -> Result<Self, ParserError> {
                let mut padded = [0u8; $len];
                copy_bounded(&mut padded, payload);
                let mut buf = Bytes::new(&padded);
                Ok(Self {
                    $( $field: WireField::get(&mut buf), )*
                })
            }
        }
    };
}

message! {
    /// OFFBOARD_CONTROL (#180)
    OffboardControlData { id: 180, name: "OFFBOARD_CONTROL", crc_extra: 93, len: 18 } {
        x: f32,
        y: f32,
        z: f32,
        f: f32,
        mode: u8,
        /// Bit i set: axis i is ignored
        ignore: u8,
    }
}

message! {
    /// SMALL_IMU (#181)
    SmallImuData { id: 181, name: "SMALL_IMU", crc_extra: 67, len: 36 } {
        time_boot_us: u64,
        xacc: f32,
        yacc: f32,
        zacc: f32,
        xgyro: f32,
        ygyro: f32,
        zgyro: f32,
        temperature: f32,
    }
}

message! {
    /// SMALL_MAG (#182)
    SmallMagData { id: 182, name: "SMALL_MAG", crc_extra: 218, len: 12 } {
        xmag: f32,
        ymag: f32,
        zmag: f32,
    }
}

message! {
    /// SMALL_BARO (#183)
    SmallBaroData { id: 183, name: "SMALL_BARO", crc_extra: 206, len: 12 } {
        altitude: f32,
        pressure: f32,
        temperature: f32,
    }
}

message! {
    /// DIFF_PRESSURE (#184)
    DiffPressureData { id: 184, name: "DIFF_PRESSURE", crc_extra: 169, len: 12 } {
        velocity: f32,
        diff_pressure: f32,
        temperature: f32,
    }
}

/// SMALL_RANGE `range_type` of a sonar
pub const RANGE_TYPE_SONAR: u8 = 0;

message! {
    /// SMALL_RANGE (#187)
    SmallRangeData { id: 187, name: "SMALL_RANGE", crc_extra: 60, len: 13 } {
        range: f32,
        max_range: f32,
        min_range: f32,
        range_type: u8,
    }
}

message! {
    /// ROSFLIGHT_CMD (#188)
    RosflightCmdData { id: 188, name: "ROSFLIGHT_CMD", crc_extra: 249, len: 1 } {
        command: u8,
    }
}

message! {
    /// ROSFLIGHT_CMD_ACK (#189)
    RosflightCmdAckData { id: 189, name: "ROSFLIGHT_CMD_ACK", crc_extra: 113, len: 2 } {
        command: u8,
        success: u8,
    }
}

message! {
    /// ROSFLIGHT_OUTPUT_RAW (#190)
    RosflightOutputRawData { id: 190, name: "ROSFLIGHT_OUTPUT_RAW", crc_extra: 181, len: 64 } {
        stamp: u64,
        values: [f32; 14],
    }
}

message! {
    /// ROSFLIGHT_STATUS (#191)
    RosflightStatusData { id: 191, name: "ROSFLIGHT_STATUS", crc_extra: 183, len: 10 } {
        num_errors: i16,
        loop_time_us: i16,
        armed: u8,
        failsafe: u8,
        rc_override: u8,
        offboard: u8,
        error_code: u8,
        control_mode: u8,
    }
}

message! {
    /// ROSFLIGHT_VERSION (#192)
    RosflightVersionData { id: 192, name: "ROSFLIGHT_VERSION", crc_extra: 134, len: 50 } {
        version: [u8; 50],
    }
}

message! {
    /// ROSFLIGHT_AUX_CMD (#193)
    RosflightAuxCmdData { id: 193, name: "ROSFLIGHT_AUX_CMD", crc_extra: 1, len: 70 } {
        aux_cmd_array: [f32; 14],
        type_array: [u8; 14],
    }
}

message! {
    /// ROSFLIGHT_HARD_ERROR (#198)
    RosflightHardErrorData { id: 198, name: "ROSFLIGHT_HARD_ERROR", crc_extra: 10, len: 16 } {
        error_code: u32,
        pc: u32,
        reset_count: u32,
        do_rearm: u32,
    }
}

message! {
    /// ROSFLIGHT_GNSS (#199)
    RosflightGnssData { id: 199, name: "ROSFLIGHT_GNSS", crc_extra: 9, len: 93 } {
        time: u64,
        nanos: u64,
        rosflight_timestamp: u64,
        time_of_week: u32,
        lat: i32,
        lon: i32,
        height: i32,
        vel_n: i32,
        vel_e: i32,
        vel_d: i32,
        h_acc: u32,
        v_acc: u32,
        ecef_x: i32,
        ecef_y: i32,
        ecef_z: i32,
        p_acc: u32,
        ecef_v_x: i32,
        ecef_v_y: i32,
        ecef_v_z: i32,
        s_acc: u32,
        fix_type: u8,
    }
}

message! {
    /// ROSFLIGHT_GNSS_FULL (#200)
    RosflightGnssFullData { id: 200, name: "ROSFLIGHT_GNSS_FULL", crc_extra: 204, len: 84 } {
        rosflight_timestamp: u64,
        time_of_week: u32,
        t_acc: u32,
        nano: i32,
        lon: i32,
        lat: i32,
        height: i32,
        height_msl: i32,
        h_acc: u32,
        v_acc: u32,
        vel_n: i32,
        vel_e: i32,
        vel_d: i32,
        g_speed: i32,
        head_mot: i32,
        s_acc: u32,
        head_acc: u32,
        year: u16,
        p_dop: u16,
        month: u8,
        day: u8,
        hour: u8,
        min: u8,
        sec: u8,
        valid: u8,
        fix_type: u8,
        num_sat: u8,
    }
}

message! {
    /// ROSFLIGHT_BATTERY_STATUS (#201)
    RosflightBatteryStatusData { id: 201, name: "ROSFLIGHT_BATTERY_STATUS", crc_extra: 48, len: 8 } {
        battery_voltage: f32,
        battery_current: f32,
    }
}

message! {
    /// EXTERNAL_ATTITUDE (#202)
    ExternalAttitudeData { id: 202, name: "EXTERNAL_ATTITUDE", crc_extra: 65, len: 16 } {
        qw: f32,
        qx: f32,
        qy: f32,
        qz: f32,
    }
}

message! {
    /// STATUSTEXT (#253) with the severity as a raw code
    ///
    /// Outbound only. `MAV_SEVERITY` has no member for the out-of-range code
    /// sent for unknown log levels, so `common::STATUSTEXT_DATA` cannot carry
    /// it. Inbound STATUSTEXT parses as the common message.
    StatustextData { id: 253, name: "STATUSTEXT", crc_extra: 83, len: 51 } {
        severity: u8,
        text: [u8; 50],
    }
}

macro_rules! dialect {
    ($($variant:ident($data:ty)),* $(,)?) => {
        /// Every message the link can frame: the ROSflight messages over the
        /// common dialect
        #[derive(Debug, Clone, PartialEq)]
        pub enum RosflightMessage {
            Common(MavMessage),
            $( $variant($data), )*
        }

        /// Identifiers of the ROSflight-specific messages
        pub const ROSFLIGHT_MESSAGE_IDS: &[u32] = &[$( <$data>::ID ),*];

        impl Message for RosflightMessage {
            fn message_id(&self) -> u32 {
                match self {
                    Self::Common(msg) => msg.message_id(),
                    $( Self::$variant(_) => <$data>::ID, )*
                }
            }

            fn message_name(&self) -> &'static str {
                match self {
                    Self::Common(msg) => msg.message_name(),
                    $( Self::$variant(_) => <$data>::NAME, )*
                }
            }

            fn ser(&self, version: MavlinkVersion, bytes: &mut [u8]) -> usize {
                match self {
                    Self::Common(msg) => msg.ser(version, bytes),
                    $( Self::$variant(data) => data.ser(version, bytes), )*
                }
            }

            fn parse(version: MavlinkVersion, msgid: u32, payload: &[u8]) -> Result<Self, ParserError> {
                $(
                    if msgid == <$data>::ID {
                        return <$data>::deser(version, payload).map(Self::$variant);
                    }
                )*
                MavMessage::parse(version, msgid, payload).map(Self::Common)
            }

            fn message_id_from_name(name: &str) -> Result<u32, &'static str> {
                $(
                    if name == <$data>::NAME {
                        return Ok(<$data>::ID);
                    }
                )*
                MavMessage::message_id_from_name(name)
            }

            fn default_message_from_id(id: u32) -> Result<Self, &'static str> {
                $(
                    if id == <$data>::ID {
                        return Ok(Self::$variant(<$data>::DEFAULT));
                    }
                )*
                MavMessage::default_message_from_id(id).map(Self::Common)
            }

            fn extra_crc(id: u32) -> u8 {
                $(
                    if id == <$data>::ID {
                        return <$data>::EXTRA_CRC;
                    }
                )*
                MavMessage::extra_crc(id)
            }
        }
    };
}

dialect! {
    OffboardControl(OffboardControlData),
    SmallImu(SmallImuData),
    SmallMag(SmallMagData),
    SmallBaro(SmallBaroData),
    DiffPressure(DiffPressureData),
    SmallRange(SmallRangeData),
    RosflightCmd(RosflightCmdData),
    RosflightCmdAck(RosflightCmdAckData),
    RosflightOutputRaw(RosflightOutputRawData),
    RosflightStatus(RosflightStatusData),
    RosflightVersion(RosflightVersionData),
    RosflightAuxCmd(RosflightAuxCmdData),
    RosflightHardError(RosflightHardErrorData),
    RosflightGnss(RosflightGnssData),
    RosflightGnssFull(RosflightGnssFullData),
    RosflightBatteryStatus(RosflightBatteryStatusData),
    ExternalAttitude(ExternalAttitudeData),
}

/// Payload lengths a frame carrying `id` may declare
///
/// MAVLink 1 frames carry exactly the encoded length. MAVLink 2 frames may be
/// trimmed, and common messages may also carry extension fields this build
/// does not decode. `None` if `id` is not in the dialect.
pub fn payload_len_bounds(id: u32, version: MavlinkVersion) -> Option<RangeInclusive<usize>> {
    let message = RosflightMessage::default_message_from_id(id).ok()?;
    let mut scratch = [0u8; MAX_PAYLOAD_LEN];
    let encoded_len = message.ser(MavlinkVersion::V1, &mut scratch);

    Some(match (version, message) {
        (MavlinkVersion::V1, _) => encoded_len..=encoded_len,
        (MavlinkVersion::V2, RosflightMessage::Common(_)) => 0..=MAX_PAYLOAD_LEN,
        (MavlinkVersion::V2, _) => 0..=encoded_len,
    })
}
