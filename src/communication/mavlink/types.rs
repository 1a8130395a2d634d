//! Internal Message and Telemetry Types
//!
//! Wire-independent representations exchanged with the rest of the firmware.
//! Inbound frames are normalized into [`CommMessage`]; outbound telemetry is
//! described by the plain structs at the bottom of this module.
//!
//! # Clamping Conversions
//!
//! Every wire enumerator is converted through a total `from_wire` function with
//! an explicit fallback variant, so no wire value can produce an out-of-domain
//! internal enum.

use crate::core::bounded::{copy_nul_padded, nul_terminated_len};

/// Internal parameter name capacity (bytes)
pub const PARAM_NAME_LEN: usize = 16;

/// Number of actuator outputs addressable by an aux command
pub const NUM_AUX_CHANNELS: usize = 14;

/// Number of offboard control axes carried internally
pub const NUM_OFFBOARD_AXES: usize = 6;

/// Axes populated by the OFFBOARD_CONTROL message (x, y, z, F)
pub const NUM_WIRE_OFFBOARD_AXES: usize = 4;

/// Parameter name, nul-padded to [`PARAM_NAME_LEN`] bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParamName([u8; PARAM_NAME_LEN]);

impl ParamName {
    /// Build a name from raw bytes, truncating to [`PARAM_NAME_LEN`]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(copy_nul_padded(bytes))
    }

    /// Raw nul-padded storage
    pub fn as_raw(&self) -> &[u8; PARAM_NAME_LEN] {
        &self.0
    }

    /// Name content without padding
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..nul_terminated_len(&self.0)]
    }

    /// Name as UTF-8, if valid
    pub fn as_str(&self) -> Option<&str> {
        ::core::str::from_utf8(self.as_bytes()).ok()
    }
}

/// Value carried by a PARAM_SET request
///
/// The branch is selected by the frame's `param_type` field, never by
/// inspecting the value bits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamValue {
    /// MAV_PARAM_TYPE_INT32
    Int(i32),
    /// MAV_PARAM_TYPE_REAL32
    Float(f32),
    /// Any other type tag; no value is extracted
    #[default]
    Unsupported,
}

/// ROSflight command (ROSFLIGHT_CMD)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    ReadParams = 0,
    WriteParams = 1,
    SetParamDefaults = 2,
    AccelCalibration = 3,
    GyroCalibration = 4,
    BaroCalibration = 5,
    AirspeedCalibration = 6,
    RcCalibration = 7,
    Reboot = 8,
    RebootToBootloader = 9,
    SendVersion = 10,
    /// Fallback for wire values outside the known command set
    Unknown = 11,
}

impl Command {
    /// Clamping conversion from the wire command byte
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::ReadParams,
            1 => Self::WriteParams,
            2 => Self::SetParamDefaults,
            3 => Self::AccelCalibration,
            4 => Self::GyroCalibration,
            5 => Self::BaroCalibration,
            6 => Self::AirspeedCalibration,
            7 => Self::RcCalibration,
            8 => Self::Reboot,
            9 => Self::RebootToBootloader,
            10 => Self::SendVersion,
            _ => Self::Unknown,
        }
    }

    /// Wire command byte
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// Actuator output kind for an aux command channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputKind {
    Servo,
    Motor,
    /// Disabled or unrecognized output; never carries a command value
    #[default]
    None,
}

impl OutputKind {
    /// Wire tag for a disabled channel
    pub const WIRE_DISABLED: u8 = 0;
    /// Wire tag for a servo channel
    pub const WIRE_SERVO: u8 = 1;
    /// Wire tag for a motor channel
    pub const WIRE_MOTOR: u8 = 2;

    /// Clamping conversion from the wire type tag
    pub fn from_wire(value: u8) -> Self {
        match value {
            Self::WIRE_SERVO => Self::Servo,
            Self::WIRE_MOTOR => Self::Motor,
            _ => Self::None,
        }
    }

    /// Wire type tag
    pub fn to_wire(self) -> u8 {
        match self {
            Self::Servo => Self::WIRE_SERVO,
            Self::Motor => Self::WIRE_MOTOR,
            Self::None => Self::WIRE_DISABLED,
        }
    }
}

/// One actuator channel of an aux command
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AuxChannel {
    pub value: f32,
    pub kind: OutputKind,
}

/// Aux actuator command (ROSFLIGHT_AUX_CMD)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AuxCommand {
    pub channels: [AuxChannel; NUM_AUX_CHANNELS],
}

/// Offboard control mode (OFFBOARD_CONTROL)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OffboardControlMode {
    PassThrough = 0,
    RollRatePitchRateYawRateThrottle = 1,
    RollPitchYawRateThrottle = 2,
    /// Fallback for wire values outside the known mode set
    Unknown = 3,
}

impl OffboardControlMode {
    /// Clamping conversion from the wire mode byte
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::PassThrough,
            1 => Self::RollRatePitchRateYawRateThrottle,
            2 => Self::RollPitchYawRateThrottle,
            _ => Self::Unknown,
        }
    }

    /// Wire mode byte
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// One offboard control axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlAxis {
    pub value: f32,
    pub valid: bool,
}

/// Offboard control setpoint
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OffboardControl {
    pub mode: OffboardControlMode,
    /// x, y, z, F, then two axes the wire message does not carry
    pub axes: [ControlAxis; NUM_OFFBOARD_AXES],
}

/// Internal message decoded from one inbound frame
///
/// Self-contained: holds no references into decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommMessage {
    /// Nothing actionable (unsupported or ignored frame)
    #[default]
    None,
    Heartbeat,
    ParamRequestList,
    ParamRequestRead {
        index: i16,
        name: ParamName,
    },
    ParamSet {
        name: ParamName,
        value: ParamValue,
    },
    RosflightCommand {
        command: Command,
    },
    RosflightAuxCommand(AuxCommand),
    TimeSync {
        local: i64,
        remote: i64,
    },
    OffboardControl(OffboardControl),
    ExternalAttitudeQuaternion {
        /// w, x, y, z
        q: [f32; 4],
    },
}

// ============================================================================
// Outbound telemetry types
// ============================================================================

/// Severity of a log message forwarded to the ground station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
    Critical,
    /// Severity code outside the known set (from [`LogSeverity::from_code`])
    Unknown(u8),
}

impl LogSeverity {
    /// Interpret a firmware-internal severity code
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Info,
            1 => Self::Warning,
            2 => Self::Error,
            3 => Self::Critical,
            other => Self::Unknown(other),
        }
    }
}

/// Outcome of a ROSflight command, reported back in ROSFLIGHT_CMD_ACK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandResult {
    Success,
    Failed,
}

/// ECEF block of a GNSS solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GnssEcef {
    /// cm
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Position accuracy (cm)
    pub p_acc: u32,
    /// cm/s
    pub vx: i32,
    pub vy: i32,
    pub vz: i32,
    /// Speed accuracy (cm/s)
    pub s_acc: u32,
}

/// Condensed GNSS solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GnssData {
    pub time_of_week: u32,
    pub fix_type: u8,
    /// Unix time (s)
    pub time: u64,
    pub nanos: u64,
    /// deg * 1e7
    pub lat: i32,
    pub lon: i32,
    /// mm
    pub height: i32,
    /// mm/s
    pub vel_n: i32,
    pub vel_e: i32,
    pub vel_d: i32,
    pub h_acc: u32,
    pub v_acc: u32,
    pub ecef: GnssEcef,
    pub rosflight_timestamp: u64,
}

/// Full UBX-NAV-PVT style GNSS solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GnssFull {
    pub time_of_week: u32,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub min: u8,
    pub sec: u8,
    pub valid: u8,
    pub t_acc: u32,
    pub nano: i32,
    pub fix_type: u8,
    pub num_sat: u8,
    pub lon: i32,
    pub lat: i32,
    pub height: i32,
    pub height_msl: i32,
    pub h_acc: u32,
    pub v_acc: u32,
    pub vel_n: i32,
    pub vel_e: i32,
    pub vel_d: i32,
    pub g_speed: i32,
    pub head_mot: i32,
    pub s_acc: u32,
    pub head_acc: u32,
    pub p_dop: u16,
    pub rosflight_timestamp: u64,
}

/// Flight status snapshot (ROSFLIGHT_STATUS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub armed: bool,
    pub failsafe: bool,
    pub rc_override: bool,
    pub offboard: bool,
    pub error_code: u8,
    pub control_mode: u8,
    pub num_errors: i16,
    pub loop_time_us: i16,
}

/// Hard-fault record preserved across a watchdog reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BackupData {
    pub error_code: u32,
    /// Program counter at the time of the fault
    pub pc: u32,
    pub reset_count: u32,
    /// Equals [`BackupData::ARM_MAGIC`] when the vehicle was armed at reset
    pub arm_flag: u32,
}

impl BackupData {
    pub const ARM_MAGIC: u32 = 0xBAD2_FA11;

    /// Whether the vehicle should re-arm after the reset
    pub fn should_rearm(&self) -> bool {
        self.arm_flag == Self::ARM_MAGIC
    }
}
