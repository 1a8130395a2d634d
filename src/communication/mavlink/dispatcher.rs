//! MAVLink Message Dispatcher
//!
//! Converts checksum-valid frames into [`CommMessage`] values for the rest of
//! the firmware.
//!
//! # Architecture
//!
//! ```text
//! Frame ──► InboundKind::from_id ──► RosflightMessage::parse ──► decode_* (pure) ──► (CommMessage, handled)
//! ```
//!
//! - **Closed set**: [`InboundKind`] enumerates every identifier the link
//!   consumes; anything else is reported as unhandled without decoding
//! - **Pure decoders**: one function per kind, no state, no side effects apart
//!   from diagnostic logging
//! - **Total**: every payload of every supported kind produces a message;
//!   short payloads are zero-extended and out-of-range enumerators clamp to a
//!   fallback variant

use super::frame::Frame;
use super::messages::{
    ExternalAttitudeData, OffboardControlData, RosflightAuxCmdData, RosflightCmdData,
    RosflightMessage,
};
use super::types::{
    AuxChannel, AuxCommand, Command, CommMessage, ControlAxis, OffboardControl,
    OffboardControlMode, OutputKind, ParamName, ParamValue, NUM_AUX_CHANNELS, NUM_OFFBOARD_AXES,
    NUM_WIRE_OFFBOARD_AXES,
};
use ::mavlink::common::{
    MavMessage, MavParamType, HEARTBEAT_DATA, PARAM_REQUEST_LIST_DATA, PARAM_REQUEST_READ_DATA,
    PARAM_SET_DATA, TIMESYNC_DATA,
};
use ::mavlink::{MavlinkVersion, Message, MessageData};

/// Offset of `param_id` in a PARAM_SET payload
const PARAM_SET_NAME_OFFSET: usize = 6;

/// Inbound message kinds understood by the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InboundKind {
    Heartbeat,
    ParamRequestList,
    ParamRequestRead,
    ParamSet,
    RosflightCommand,
    RosflightAuxCommand,
    TimeSync,
    OffboardControl,
    ExternalAttitude,
}

impl InboundKind {
    /// Classify a message identifier, `None` if the link does not consume it
    pub fn from_id(message_id: u32) -> Option<Self> {
        match message_id {
            HEARTBEAT_DATA::ID => Some(Self::Heartbeat),
            PARAM_REQUEST_LIST_DATA::ID => Some(Self::ParamRequestList),
            PARAM_REQUEST_READ_DATA::ID => Some(Self::ParamRequestRead),
            PARAM_SET_DATA::ID => Some(Self::ParamSet),
            RosflightCmdData::ID => Some(Self::RosflightCommand),
            RosflightAuxCmdData::ID => Some(Self::RosflightAuxCommand),
            TIMESYNC_DATA::ID => Some(Self::TimeSync),
            OffboardControlData::ID => Some(Self::OffboardControl),
            ExternalAttitudeData::ID => Some(Self::ExternalAttitude),
            _ => None,
        }
    }
}

/// Decode one inbound message
///
/// Returns the internal message and whether the identifier belongs to the
/// supported set. Unsupported identifiers yield `(CommMessage::None, false)`.
pub fn dispatch(message_id: u32, payload: &[u8]) -> (CommMessage, bool) {
    let Some(kind) = InboundKind::from_id(message_id) else {
        crate::log_debug!("MAVLink: unhandled message id {}", message_id);
        return (CommMessage::None, false);
    };

    let message = match kind {
        // Nothing in these payloads is consumed; a HEARTBEAT from a newer
        // ground station may carry MAV_TYPE values this build cannot decode
        InboundKind::Heartbeat => CommMessage::Heartbeat,
        InboundKind::ParamRequestList => CommMessage::ParamRequestList,
        _ => match RosflightMessage::parse(MavlinkVersion::V2, message_id, payload) {
            Ok(parsed) => dispatch_message(&parsed).0,
            Err(_) => decode_rejected(kind, payload),
        },
    };
    (message, true)
}

/// Decode a frame produced by the parser
pub fn dispatch_frame(frame: &Frame) -> (CommMessage, bool) {
    dispatch(frame.message_id(), frame.payload())
}

/// Map an already decoded dialect message
pub fn dispatch_message(message: &RosflightMessage) -> (CommMessage, bool) {
    let decoded = match message {
        RosflightMessage::Common(MavMessage::HEARTBEAT(_)) => CommMessage::Heartbeat,
        RosflightMessage::Common(MavMessage::PARAM_REQUEST_LIST(_)) => CommMessage::ParamRequestList,
        RosflightMessage::Common(MavMessage::PARAM_REQUEST_READ(msg)) => decode_param_request_read(msg),
        RosflightMessage::Common(MavMessage::PARAM_SET(msg)) => decode_param_set(msg),
        RosflightMessage::Common(MavMessage::TIMESYNC(msg)) => decode_timesync(msg),
        RosflightMessage::RosflightCmd(msg) => decode_command(msg),
        RosflightMessage::RosflightAuxCmd(msg) => decode_aux_command(msg),
        RosflightMessage::OffboardControl(msg) => decode_offboard_control(msg),
        RosflightMessage::ExternalAttitude(msg) => decode_external_attitude(msg),
        other => {
            crate::log_debug!("MAVLink: unhandled message id {}", other.message_id());
            return (CommMessage::None, false);
        }
    };
    (decoded, true)
}

/// Fallback for a supported payload the dialect decoder refused
///
/// Only enumerated fields can be refused, and PARAM_SET's `param_type` is the
/// only one among the supported kinds.
fn decode_rejected(kind: InboundKind, payload: &[u8]) -> CommMessage {
    match kind {
        InboundKind::ParamSet => {
            crate::log_warn!("MAVLink: PARAM_SET with unknown type tag");
            CommMessage::ParamSet {
                name: ParamName::from_bytes(payload.get(PARAM_SET_NAME_OFFSET..).unwrap_or_default()),
                value: ParamValue::default(),
            }
        }
        _ => {
            crate::log_warn!("MAVLink: undecodable payload for {:?}", kind);
            CommMessage::None
        }
    }
}

fn decode_param_request_read(msg: &PARAM_REQUEST_READ_DATA) -> CommMessage {
    CommMessage::ParamRequestRead {
        index: msg.param_index,
        name: ParamName::from_bytes(&msg.param_id),
    }
}

fn decode_param_set(msg: &PARAM_SET_DATA) -> CommMessage {
    let value = match msg.param_type {
        MavParamType::MAV_PARAM_TYPE_INT32 => ParamValue::Int(msg.param_value.to_bits() as i32),
        MavParamType::MAV_PARAM_TYPE_REAL32 => ParamValue::Float(msg.param_value),
        other => {
            crate::log_warn!("MAVLink: unsupported PARAM_SET type {}", other as u32);
            ParamValue::default()
        }
    };

    CommMessage::ParamSet {
        name: ParamName::from_bytes(&msg.param_id),
        value,
    }
}

fn decode_command(msg: &RosflightCmdData) -> CommMessage {
    CommMessage::RosflightCommand {
        command: Command::from_wire(msg.command),
    }
}

fn decode_aux_command(msg: &RosflightAuxCmdData) -> CommMessage {
    let mut command = AuxCommand::default();

    let wire = msg.aux_cmd_array.iter().zip(msg.type_array.iter());
    for (channel, (&value, &tag)) in command.channels.iter_mut().zip(wire).take(NUM_AUX_CHANNELS) {
        let kind = OutputKind::from_wire(tag);
        *channel = AuxChannel {
            value: match kind {
                OutputKind::None => 0.0,
                OutputKind::Servo | OutputKind::Motor => value,
            },
            kind,
        };
    }

    CommMessage::RosflightAuxCommand(command)
}

fn decode_timesync(msg: &TIMESYNC_DATA) -> CommMessage {
    CommMessage::TimeSync {
        local: msg.tc1,
        remote: msg.ts1,
    }
}

fn decode_offboard_control(msg: &OffboardControlData) -> CommMessage {
    let values = [msg.x, msg.y, msg.z, msg.f];
    let mut axes = [ControlAxis::default(); NUM_OFFBOARD_AXES];

    for (i, (axis, &value)) in axes.iter_mut().zip(values.iter()).enumerate() {
        *axis = ControlAxis {
            value,
            valid: msg.ignore & (1 << i) == 0,
        };
    }
    // Axes past the wire set stay invalid
    debug_assert!(axes[NUM_WIRE_OFFBOARD_AXES..].iter().all(|axis| !axis.valid));

    CommMessage::OffboardControl(OffboardControl {
        mode: OffboardControlMode::from_wire(msg.mode),
        axes,
    })
}

fn decode_external_attitude(msg: &ExternalAttitudeData) -> CommMessage {
    CommMessage::ExternalAttitudeQuaternion {
        q: [msg.qw, msg.qx, msg.qy, msg.qz],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::mavlink::common::MavType;

    fn dispatch_msg<D: MessageData>(msg: &D) -> (CommMessage, bool) {
        let mut payload = [0u8; 255];
        let len = msg.ser(MavlinkVersion::V2, &mut payload);
        dispatch(D::ID, &payload[..len])
    }

    #[test]
    fn test_heartbeat_is_handled() {
        let (msg, handled) = dispatch_msg(&HEARTBEAT_DATA {
            mavtype: MavType::MAV_TYPE_GCS,
            ..HEARTBEAT_DATA::default()
        });
        assert!(handled);
        assert_eq!(msg, CommMessage::Heartbeat);
    }

    #[test]
    fn test_heartbeat_with_unknown_vehicle_type() {
        let mut payload = [0u8; 9];
        payload[4] = 0xEE;
        assert_eq!(dispatch(0, &payload), (CommMessage::Heartbeat, true));
    }

    #[test]
    fn test_param_request_list_ignores_payload() {
        assert_eq!(dispatch(21, &[]), (CommMessage::ParamRequestList, true));
        assert_eq!(dispatch(21, &[1, 2, 3]), (CommMessage::ParamRequestList, true));
    }

    #[test]
    fn test_unsupported_id_is_unhandled() {
        // ATTITUDE_QUATERNION is outbound only
        assert_eq!(dispatch(31, &[0; 32]), (CommMessage::None, false));
        assert_eq!(dispatch(70_000, &[]), (CommMessage::None, false));
    }

    #[test]
    fn test_param_request_read_copies_name_and_index() {
        let mut param_id = [0u8; 16];
        param_id[..7].copy_from_slice(b"RC_TYPE");
        let msg = PARAM_REQUEST_READ_DATA {
            param_index: -1,
            target_system: 1,
            target_component: 1,
            param_id,
        };

        let (decoded, handled) = dispatch_msg(&msg);
        assert!(handled);
        match decoded {
            CommMessage::ParamRequestRead { index, name } => {
                assert_eq!(index, -1);
                assert_eq!(name.as_str(), Some("RC_TYPE"));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_param_request_read_full_length_name() {
        let msg = PARAM_REQUEST_READ_DATA {
            param_id: *b"ABCDEFGHIJKLMNOP",
            ..PARAM_REQUEST_READ_DATA::default()
        };
        match dispatch_msg(&msg).0 {
            CommMessage::ParamRequestRead { name, .. } => {
                assert_eq!(name.as_bytes(), b"ABCDEFGHIJKLMNOP");
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    fn param_set(param_value: f32, param_type: MavParamType) -> PARAM_SET_DATA {
        let mut param_id = [0u8; 16];
        param_id[..4].copy_from_slice(b"GAIN");
        PARAM_SET_DATA {
            param_value,
            target_system: 1,
            target_component: 1,
            param_id,
            param_type,
        }
    }

    #[test]
    fn test_param_set_int32() {
        // Integer parameters travel bit-cast in the float field
        let msg = param_set(f32::from_bits((-42i32) as u32), MavParamType::MAV_PARAM_TYPE_INT32);
        match dispatch_msg(&msg).0 {
            CommMessage::ParamSet { name, value } => {
                assert_eq!(name.as_str(), Some("GAIN"));
                assert_eq!(value, ParamValue::Int(-42));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_param_set_real32() {
        let msg = param_set(0.25, MavParamType::MAV_PARAM_TYPE_REAL32);
        match dispatch_msg(&msg).0 {
            CommMessage::ParamSet { value, .. } => assert_eq!(value, ParamValue::Float(0.25)),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_param_set_unsupported_type_carries_no_value() {
        let (decoded, handled) = dispatch_msg(&param_set(7.0, MavParamType::MAV_PARAM_TYPE_UINT8));
        assert!(handled);
        match decoded {
            CommMessage::ParamSet { name, value } => {
                assert_eq!(name.as_str(), Some("GAIN"));
                assert_eq!(value, ParamValue::default());
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_param_set_unknown_type_tag_keeps_name() {
        let msg = param_set(1.0, MavParamType::MAV_PARAM_TYPE_REAL32);
        let mut payload = [0u8; PARAM_SET_DATA::ENCODED_LEN];
        msg.ser(MavlinkVersion::V1, &mut payload);
        payload[PARAM_SET_DATA::ENCODED_LEN - 1] = 200;

        let (decoded, handled) = dispatch(PARAM_SET_DATA::ID, &payload);
        assert!(handled);
        match decoded {
            CommMessage::ParamSet { name, value } => {
                assert_eq!(name.as_str(), Some("GAIN"));
                assert_eq!(value, ParamValue::default());
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_command_clamps_unknown_values() {
        let (decoded, _) = dispatch_msg(&RosflightCmdData { command: 4 });
        assert_eq!(
            decoded,
            CommMessage::RosflightCommand {
                command: Command::GyroCalibration
            }
        );

        let (decoded, _) = dispatch_msg(&RosflightCmdData { command: 250 });
        assert_eq!(
            decoded,
            CommMessage::RosflightCommand {
                command: Command::Unknown
            }
        );
    }

    #[test]
    fn test_aux_command_disabled_channel_is_zeroed() {
        let mut msg = RosflightAuxCmdData::default();
        msg.aux_cmd_array[0] = 500.0;
        msg.type_array[0] = OutputKind::WIRE_MOTOR;
        msg.aux_cmd_array[1] = 999.0;
        msg.type_array[1] = OutputKind::WIRE_DISABLED;

        match dispatch_msg(&msg).0 {
            CommMessage::RosflightAuxCommand(cmd) => {
                assert_eq!(
                    cmd.channels[0],
                    AuxChannel {
                        value: 500.0,
                        kind: OutputKind::Motor
                    }
                );
                assert_eq!(
                    cmd.channels[1],
                    AuxChannel {
                        value: 0.0,
                        kind: OutputKind::None
                    }
                );
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_aux_command_unknown_tag_maps_to_none() {
        let mut msg = RosflightAuxCmdData::default();
        msg.aux_cmd_array = [1500.0; NUM_AUX_CHANNELS];
        msg.type_array = [OutputKind::WIRE_SERVO; NUM_AUX_CHANNELS];
        msg.type_array[13] = 9;

        match dispatch_msg(&msg).0 {
            CommMessage::RosflightAuxCommand(cmd) => {
                assert!(cmd.channels[..13]
                    .iter()
                    .all(|c| c.kind == OutputKind::Servo && c.value == 1500.0));
                assert_eq!(cmd.channels[13].kind, OutputKind::None);
                assert_eq!(cmd.channels[13].value, 0.0);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_timesync_mapping() {
        let (decoded, _) = dispatch_msg(&TIMESYNC_DATA { tc1: 0, ts1: 123_456 });
        assert_eq!(decoded, CommMessage::TimeSync { local: 0, remote: 123_456 });
    }

    #[test]
    fn test_offboard_ignore_mask() {
        let msg = OffboardControlData {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            f: 4.0,
            mode: 1,
            ignore: 0b0001,
        };

        match dispatch_msg(&msg).0 {
            CommMessage::OffboardControl(control) => {
                assert_eq!(control.mode, OffboardControlMode::RollRatePitchRateYawRateThrottle);
                let valid: [bool; NUM_OFFBOARD_AXES] = ::core::array::from_fn(|i| control.axes[i].valid);
                assert_eq!(valid, [false, true, true, true, false, false]);
                let values: [f32; 4] = ::core::array::from_fn(|i| control.axes[i].value);
                assert_eq!(values, [1.0, 2.0, 3.0, 4.0]);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_offboard_ignore_mask_law() {
        for ignore in 0..=u8::MAX {
            let msg = OffboardControlData {
                ignore,
                ..OffboardControlData::default()
            };
            match dispatch_msg(&msg).0 {
                CommMessage::OffboardControl(control) => {
                    for i in 0..NUM_WIRE_OFFBOARD_AXES {
                        assert_eq!(control.axes[i].valid, ignore & (1 << i) == 0);
                    }
                    assert!(!control.axes[4].valid);
                    assert!(!control.axes[5].valid);
                }
                other => panic!("unexpected message {:?}", other),
            }
        }
    }

    #[test]
    fn test_offboard_unknown_mode() {
        let msg = OffboardControlData {
            mode: 17,
            ..OffboardControlData::default()
        };
        match dispatch_msg(&msg).0 {
            CommMessage::OffboardControl(control) => {
                assert_eq!(control.mode, OffboardControlMode::Unknown)
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_external_attitude_order() {
        let msg = ExternalAttitudeData {
            qw: 1.0,
            qx: 0.1,
            qy: 0.2,
            qz: 0.3,
        };
        assert_eq!(
            dispatch_msg(&msg).0,
            CommMessage::ExternalAttitudeQuaternion {
                q: [1.0, 0.1, 0.2, 0.3]
            }
        );
    }

    #[test]
    fn test_dispatch_is_total_for_short_payloads() {
        for id in [0, 20, 21, 23, 111, 180, 188, 193, 202] {
            let (message, handled) = dispatch(id, &[]);
            assert!(handled);
            assert_ne!(message, CommMessage::None);
        }
    }

    #[test]
    fn test_outbound_only_dialect_message_is_unhandled() {
        let status = RosflightMessage::RosflightStatus(Default::default());
        assert_eq!(dispatch_message(&status), (CommMessage::None, false));
    }
}
