//! MAVLink Message Writer
//!
//! Packs internal telemetry into ROSflight-dialect frames and hands them to the
//! board's [`SerialTransport`].
//!
//! # Architecture
//!
//! - One `send_*` operation per telemetry kind, taking typed domain values
//! - Every frame is built on the stack, written once, then discarded
//! - Sends before [`MavlinkWriter::init`] are dropped without touching the
//!   transport (counted in [`WriterStats`])
//! - Each write carries a [`QosClass`] chosen by message kind
//!
//! # QoS Classes
//!
//! | Message                                     | Class          |
//! |---------------------------------------------|----------------|
//! | SMALL_IMU                                   | `Realtime`     |
//! | TIMESYNC, ROSFLIGHT_OUTPUT_RAW, RC_CHANNELS | `TimeCritical` |
//! | everything else                             | `Telemetry`    |

use super::config::MavlinkConfig;
use super::frame::Frame;
use super::messages::{
    DiffPressureData, RosflightBatteryStatusData, RosflightCmdAckData, RosflightGnssData,
    RosflightGnssFullData, RosflightHardErrorData, RosflightOutputRawData, RosflightStatusData,
    RosflightVersionData, SmallBaroData, SmallImuData, SmallMagData, SmallRangeData,
    StatustextData, RANGE_TYPE_SONAR,
};
use super::transport::{QosClass, SerialTransport};
use super::types::{
    BackupData, Command, CommandResult, GnssData, GnssFull, LogSeverity, ParamName, StatusReport,
    NUM_AUX_CHANNELS,
};
use crate::core::bounded::copy_nul_padded;
use ::mavlink::common::{
    MavAutopilot, MavModeFlag, MavParamType, MavSeverity, MavState, MavType,
    ATTITUDE_QUATERNION_DATA, HEARTBEAT_DATA, NAMED_VALUE_FLOAT_DATA, NAMED_VALUE_INT_DATA,
    PARAM_VALUE_DATA, RC_CHANNELS_DATA, TIMESYNC_DATA,
};
use ::mavlink::{MavHeader, MessageData};
use nalgebra::{Quaternion, Vector3};

/// STATUSTEXT severity for codes outside the known set (MAV_SEVERITY_ENUM_END)
pub const SEVERITY_UNKNOWN: u8 = 8;

/// MAVLink protocol version advertised in HEARTBEAT
const HEARTBEAT_MAVLINK_VERSION: u8 = 3;

/// Component id used for PARAM_VALUE frames
const PARAM_COMPONENT_ID: u8 = 0;

/// Number of RC channels carried by `send_rc_raw`
pub const NUM_RC_RAW_CHANNELS: usize = 8;

/// Wire code of [`CommandResult::Failed`] in ROSFLIGHT_CMD_ACK
const CMD_ACK_FAILED: u8 = 0;
/// Wire code of [`CommandResult::Success`] in ROSFLIGHT_CMD_ACK
const CMD_ACK_SUCCESS: u8 = 1;

/// Writer statistics for monitoring and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriterStats {
    /// Frames handed to the transport
    pub messages_sent: u32,
    /// Sends dropped because the writer was not initialized
    pub dropped_uninitialized: u32,
}

/// MAVLink message writer
///
/// Owns the transport, the outgoing sequence counter and the initialized
/// flag. The sequence counter advances (wrapping) only when a frame actually
/// reaches the transport.
pub struct MavlinkWriter<T: SerialTransport> {
    transport: T,
    config: MavlinkConfig,
    sequence: u8,
    initialized: bool,
    stats: WriterStats,
}

impl<T: SerialTransport> MavlinkWriter<T> {
    /// Create a writer; nothing is sent until [`init`](Self::init) is called
    pub fn new(transport: T, config: MavlinkConfig) -> Self {
        Self {
            transport,
            config,
            sequence: 0,
            initialized: false,
            stats: WriterStats::default(),
        }
    }

    /// Open the serial device and enable sending
    pub fn init(&mut self, baud_rate: u32, device: u32) {
        self.transport.serial_init(baud_rate, device);
        self.initialized = true;
        crate::log_info!("MAVLink: link up at {} baud on device {}", baud_rate, device);
    }

    /// Whether `init` has been called
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Get writer statistics
    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Reset writer statistics
    pub fn reset_stats(&mut self) {
        self.stats = WriterStats::default();
    }

    /// Get current sequence number (used by the next frame)
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Link configuration
    pub fn config(&self) -> &MavlinkConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the writer and return the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Attitude estimate; `timestamp_us` is truncated to milliseconds
    pub fn send_attitude_quaternion(
        &mut self,
        system_id: u8,
        timestamp_us: u64,
        attitude: &Quaternion<f32>,
        angular_velocity: &Vector3<f32>,
    ) {
        let msg = ATTITUDE_QUATERNION_DATA {
            time_boot_ms: (timestamp_us / 1000) as u32,
            q1: attitude.w,
            q2: attitude.i,
            q3: attitude.j,
            q4: attitude.k,
            rollspeed: angular_velocity.x,
            pitchspeed: angular_velocity.y,
            yawspeed: angular_velocity.z,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    pub fn send_baro(&mut self, system_id: u8, altitude: f32, pressure: f32, temperature: f32) {
        let msg = SmallBaroData {
            altitude,
            pressure,
            temperature,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    /// Acknowledge a ROSflight command
    pub fn send_command_ack(&mut self, system_id: u8, command: Command, result: CommandResult) {
        let msg = RosflightCmdAckData {
            command: command.to_wire(),
            success: if result == CommandResult::Success {
                CMD_ACK_SUCCESS
            } else {
                CMD_ACK_FAILED
            },
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    pub fn send_diff_pressure(
        &mut self,
        system_id: u8,
        velocity: f32,
        pressure: f32,
        temperature: f32,
    ) {
        let msg = DiffPressureData {
            velocity,
            diff_pressure: pressure,
            temperature,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    /// Heartbeat advertising a fixed-wing or multirotor airframe
    pub fn send_heartbeat(&mut self, system_id: u8, fixed_wing: bool) {
        let mav_type = if fixed_wing {
            MavType::MAV_TYPE_FIXED_WING
        } else {
            MavType::MAV_TYPE_QUADROTOR
        };
        let msg = HEARTBEAT_DATA {
            custom_mode: 0,
            mavtype: mav_type,
            autopilot: MavAutopilot::MAV_AUTOPILOT_GENERIC,
            base_mode: MavModeFlag::empty(),
            system_status: MavState::MAV_STATE_UNINIT,
            mavlink_version: HEARTBEAT_MAVLINK_VERSION,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    pub fn send_imu(
        &mut self,
        system_id: u8,
        timestamp_us: u64,
        accel: &Vector3<f32>,
        gyro: &Vector3<f32>,
        temperature: f32,
    ) {
        let msg = SmallImuData {
            time_boot_us: timestamp_us,
            xacc: accel.x,
            yacc: accel.y,
            zacc: accel.z,
            xgyro: gyro.x,
            ygyro: gyro.y,
            zgyro: gyro.z,
            temperature,
        };
        self.send_default(system_id, &msg, QosClass::Realtime);
    }

    pub fn send_gnss(&mut self, system_id: u8, data: &GnssData) {
        let msg = RosflightGnssData {
            time: data.time,
            nanos: data.nanos,
            rosflight_timestamp: data.rosflight_timestamp,
            time_of_week: data.time_of_week,
            lat: data.lat,
            lon: data.lon,
            height: data.height,
            vel_n: data.vel_n,
            vel_e: data.vel_e,
            vel_d: data.vel_d,
            h_acc: data.h_acc,
            v_acc: data.v_acc,
            ecef_x: data.ecef.x,
            ecef_y: data.ecef.y,
            ecef_z: data.ecef.z,
            p_acc: data.ecef.p_acc,
            ecef_v_x: data.ecef.vx,
            ecef_v_y: data.ecef.vy,
            ecef_v_z: data.ecef.vz,
            s_acc: data.ecef.s_acc,
            fix_type: data.fix_type,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    pub fn send_gnss_full(&mut self, system_id: u8, full: &GnssFull) {
        let msg = RosflightGnssFullData {
            rosflight_timestamp: full.rosflight_timestamp,
            time_of_week: full.time_of_week,
            t_acc: full.t_acc,
            nano: full.nano,
            lon: full.lon,
            lat: full.lat,
            height: full.height,
            height_msl: full.height_msl,
            h_acc: full.h_acc,
            v_acc: full.v_acc,
            vel_n: full.vel_n,
            vel_e: full.vel_e,
            vel_d: full.vel_d,
            g_speed: full.g_speed,
            head_mot: full.head_mot,
            s_acc: full.s_acc,
            head_acc: full.head_acc,
            year: full.year,
            p_dop: full.p_dop,
            month: full.month,
            day: full.day,
            hour: full.hour,
            min: full.min,
            sec: full.sec,
            valid: full.valid,
            fix_type: full.fix_type,
            num_sat: full.num_sat,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    /// Forward a log line to the ground station as STATUSTEXT
    ///
    /// Text longer than 50 bytes is truncated.
    pub fn send_log_message(&mut self, system_id: u8, severity: LogSeverity, text: &str) {
        let msg = StatustextData {
            severity: mav_severity(severity),
            text: copy_nul_padded(text.as_bytes()),
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    pub fn send_mag(&mut self, system_id: u8, mag: &Vector3<f32>) {
        let msg = SmallMagData {
            xmag: mag.x,
            ymag: mag.y,
            zmag: mag.z,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    /// Debug value; `name` is truncated to 10 bytes
    pub fn send_named_value_int(&mut self, system_id: u8, timestamp_ms: u32, name: &str, value: i32) {
        let msg = NAMED_VALUE_INT_DATA {
            time_boot_ms: timestamp_ms,
            value,
            name: copy_nul_padded(name.as_bytes()),
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    /// Debug value; `name` is truncated to 10 bytes
    pub fn send_named_value_float(
        &mut self,
        system_id: u8,
        timestamp_ms: u32,
        name: &str,
        value: f32,
    ) {
        let msg = NAMED_VALUE_FLOAT_DATA {
            time_boot_ms: timestamp_ms,
            value,
            name: copy_nul_padded(name.as_bytes()),
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    /// Actuator outputs as commanded by the mixer
    pub fn send_output_raw(
        &mut self,
        system_id: u8,
        timestamp_ms: u32,
        outputs: &[f32; NUM_AUX_CHANNELS],
    ) {
        let msg = RosflightOutputRawData {
            stamp: timestamp_ms as u64,
            values: *outputs,
        };
        self.send_default(system_id, &msg, QosClass::TimeCritical);
    }

    /// Integer parameter; the value bits travel in the float field unchanged
    pub fn send_param_value_int(
        &mut self,
        system_id: u8,
        index: u16,
        name: &ParamName,
        value: i32,
        param_count: u16,
    ) {
        self.send_param_value(
            system_id,
            index,
            name,
            f32::from_bits(value as u32),
            MavParamType::MAV_PARAM_TYPE_INT32,
            param_count,
        );
    }

    pub fn send_param_value_float(
        &mut self,
        system_id: u8,
        index: u16,
        name: &ParamName,
        value: f32,
        param_count: u16,
    ) {
        self.send_param_value(
            system_id,
            index,
            name,
            value,
            MavParamType::MAV_PARAM_TYPE_REAL32,
            param_count,
        );
    }

    /// Raw RC inputs; wire channels 9..18 and `chancount` are sent as zero
    pub fn send_rc_raw(
        &mut self,
        system_id: u8,
        timestamp_ms: u32,
        channels: &[u16; NUM_RC_RAW_CHANNELS],
    ) {
        let [chan1_raw, chan2_raw, chan3_raw, chan4_raw, chan5_raw, chan6_raw, chan7_raw, chan8_raw] =
            *channels;
        let msg = RC_CHANNELS_DATA {
            time_boot_ms: timestamp_ms,
            chan1_raw,
            chan2_raw,
            chan3_raw,
            chan4_raw,
            chan5_raw,
            chan6_raw,
            chan7_raw,
            chan8_raw,
            ..RC_CHANNELS_DATA::DEFAULT
        };
        self.send_default(system_id, &msg, QosClass::TimeCritical);
    }

    /// Range reading, always tagged as sonar
    pub fn send_sonar(&mut self, system_id: u8, range: f32, max_range: f32, min_range: f32) {
        let msg = SmallRangeData {
            range,
            max_range,
            min_range,
            range_type: RANGE_TYPE_SONAR,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    pub fn send_status(&mut self, system_id: u8, status: &StatusReport) {
        let msg = RosflightStatusData {
            num_errors: status.num_errors,
            loop_time_us: status.loop_time_us,
            armed: status.armed as u8,
            failsafe: status.failsafe as u8,
            rc_override: status.rc_override as u8,
            offboard: status.offboard as u8,
            error_code: status.error_code,
            control_mode: status.control_mode,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    pub fn send_timesync(&mut self, system_id: u8, tc1: i64, ts1: i64) {
        self.send_default(system_id, &TIMESYNC_DATA { tc1, ts1 }, QosClass::TimeCritical);
    }

    /// Firmware version string (truncated to 50 bytes)
    pub fn send_version(&mut self, system_id: u8, version: &str) {
        let msg = RosflightVersionData {
            version: copy_nul_padded(version.as_bytes()),
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    /// Hard-fault record from the previous boot
    pub fn send_error_data(&mut self, system_id: u8, error_data: &BackupData) {
        let msg = RosflightHardErrorData {
            error_code: error_data.error_code,
            pc: error_data.pc,
            reset_count: error_data.reset_count,
            do_rearm: error_data.should_rearm() as u32,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    pub fn send_battery_status(&mut self, system_id: u8, voltage: f32, current: f32) {
        let msg = RosflightBatteryStatusData {
            battery_voltage: voltage,
            battery_current: current,
        };
        self.send_default(system_id, &msg, QosClass::Telemetry);
    }

    fn send_param_value(
        &mut self,
        system_id: u8,
        index: u16,
        name: &ParamName,
        param_value: f32,
        param_type: MavParamType,
        param_count: u16,
    ) {
        let msg = PARAM_VALUE_DATA {
            param_value,
            param_count,
            param_index: index,
            param_id: *name.as_raw(),
            param_type,
        };
        self.send(system_id, PARAM_COMPONENT_ID, &msg, QosClass::Telemetry);
    }

    fn send_default<D: MessageData>(&mut self, system_id: u8, msg: &D, qos: QosClass) {
        let component_id = self.config.component_id;
        self.send(system_id, component_id, msg, qos);
    }

    fn send<D: MessageData>(&mut self, system_id: u8, component_id: u8, msg: &D, qos: QosClass) {
        if !self.initialized {
            crate::log_trace!("MAVLink: dropping message {} before init", D::ID);
            self.stats.dropped_uninitialized = self.stats.dropped_uninitialized.wrapping_add(1);
            return;
        }

        let header = MavHeader {
            system_id,
            component_id,
            sequence: self.sequence,
        };
        let frame = Frame::serialize(self.config.protocol, header, msg);

        self.transport.serial_write(frame.raw_bytes(), qos);
        self.sequence = self.sequence.wrapping_add(1);
        self.stats.messages_sent = self.stats.messages_sent.wrapping_add(1);
    }
}

/// STATUSTEXT severity for an internal log severity
pub fn mav_severity(severity: LogSeverity) -> u8 {
    match severity {
        LogSeverity::Info => MavSeverity::MAV_SEVERITY_INFO as u8,
        LogSeverity::Warning => MavSeverity::MAV_SEVERITY_WARNING as u8,
        LogSeverity::Error => MavSeverity::MAV_SEVERITY_ERROR as u8,
        LogSeverity::Critical => MavSeverity::MAV_SEVERITY_CRITICAL as u8,
        LogSeverity::Unknown(_) => SEVERITY_UNKNOWN,
    }
}
