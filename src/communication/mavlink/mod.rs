//! MAVLink Communication Link (ROSflight dialect)
//!
//! Translates between the byte stream of a companion computer or ground
//! station and the firmware's internal message types.
//!
//! # Architecture
//!
//! - **Frame**: MAVLink 1/2 frames built and checked by rust-mavlink
//! - **Messages**: the ROSflight dialect layered over `mavlink::common`
//! - **Parser**: incremental frame decoder, one byte at a time
//! - **Dispatcher**: frame to [`CommMessage`] conversion
//! - **Writer**: telemetry encoding, handed to the board transport with a QoS class
//! - **Task**: async reader adapter over `embedded_io_async::Read`
//!
//! # Usage
//!
//! ```ignore
//! use rosflight_comms::{Mavlink, MavlinkConfig};
//!
//! let mut link = Mavlink::new(board_serial, MavlinkConfig::default());
//! link.init(921_600, 0);
//!
//! while let Some(byte) = board_serial.read_byte() {
//!     if let Some((message, true)) = link.parse_char(byte) {
//!         firmware.handle(message);
//!     }
//! }
//! link.writer_mut().send_heartbeat(1, false);
//! ```

pub mod config; // Link configuration
pub mod dispatcher; // Frame to internal message conversion
pub mod frame; // MAVLink framing over rust-mavlink raw frames
pub mod messages; // ROSflight dialect
pub mod parser; // Frame decoding
pub mod task; // Async receive adapter
pub mod transport; // Transport abstraction layer
pub mod types; // Internal message types
pub mod writer; // Telemetry encoding

pub use config::MavlinkConfig;
pub use dispatcher::{dispatch, dispatch_frame, dispatch_message, InboundKind};
pub use frame::{Frame, ProtocolVersion};
pub use messages::RosflightMessage;
pub use parser::{MavlinkParser, ParserStats};
pub use transport::{QosClass, SerialTransport};
pub use types::CommMessage;
pub use writer::{MavlinkWriter, WriterStats};

/// Complete MAVLink link: one frame decoder plus one telemetry writer
///
/// Decoder and writer share no state; the caller feeds received bytes to
/// [`parse_char`](Self::parse_char) and sends telemetry through
/// [`writer_mut`](Self::writer_mut).
pub struct Mavlink<T: SerialTransport> {
    parser: MavlinkParser,
    writer: MavlinkWriter<T>,
}

impl<T: SerialTransport> Mavlink<T> {
    pub fn new(transport: T, config: MavlinkConfig) -> Self {
        Self {
            parser: MavlinkParser::new(),
            writer: MavlinkWriter::new(transport, config),
        }
    }

    /// Open the serial device; sends are dropped until this is called
    pub fn init(&mut self, baud_rate: u32, device: u32) {
        self.writer.init(baud_rate, device);
    }

    /// Open the serial device with the configured baud rate and device
    pub fn init_from_config(&mut self) {
        let config = *self.writer.config();
        self.init(config.baud_rate, config.device);
    }

    /// Feed one received byte
    ///
    /// Returns the decoded message and its `handled` flag when this byte
    /// completes a valid frame.
    pub fn parse_char(&mut self, byte: u8) -> Option<(CommMessage, bool)> {
        self.parser
            .parse_byte(byte)
            .map(|frame| dispatch_frame(&frame))
    }

    /// Decode a frame still buffered after a rescan, if any
    ///
    /// A rejected candidate can leave several complete frames behind it;
    /// `parse_char` returns one per byte, this drains the rest.
    pub fn poll(&mut self) -> Option<(CommMessage, bool)> {
        self.parser.poll().map(|frame| dispatch_frame(&frame))
    }

    pub fn writer(&self) -> &MavlinkWriter<T> {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut MavlinkWriter<T> {
        &mut self.writer
    }

    /// Get parser statistics
    pub fn parser_stats(&self) -> ParserStats {
        self.parser.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::messages::OffboardControlData;
    use super::transport::mock::MockTransport;
    use super::*;

    #[test]
    fn test_parse_char_decodes_own_output() {
        let mut sender = Mavlink::new(MockTransport::new(), MavlinkConfig::default());
        sender.init_from_config();
        sender.writer_mut().send_heartbeat(1, true);
        assert_eq!(sender.writer().transport().init_args, Some((921_600, 0)));

        let write = sender.writer().transport().last_write().cloned();
        let write = write.expect("heartbeat not written");

        let mut receiver = Mavlink::new(MockTransport::new(), MavlinkConfig::default());
        let decoded: std::vec::Vec<_> = write
            .data
            .iter()
            .filter_map(|&b| receiver.parse_char(b))
            .collect();

        assert_eq!(decoded, std::vec![(CommMessage::Heartbeat, true)]);
        assert_eq!(receiver.parser_stats().messages_received, 1);
    }

    #[test]
    fn test_parse_char_reports_unhandled() {
        // SMALL_IMU is valid on the wire but only ever sent by the firmware
        let mut sender = Mavlink::new(MockTransport::new(), MavlinkConfig::default());
        sender.init(57_600, 2);
        sender.writer_mut().send_imu(
            1,
            5,
            &nalgebra::Vector3::zeros(),
            &nalgebra::Vector3::zeros(),
            0.0,
        );
        let write = sender.writer().transport().last_write().cloned();
        let write = write.expect("imu not written");

        let mut receiver = Mavlink::new(MockTransport::new(), MavlinkConfig::default());
        let decoded: std::vec::Vec<_> = write
            .data
            .iter()
            .filter_map(|&b| receiver.parse_char(b))
            .collect();
        assert_eq!(decoded, std::vec![(CommMessage::None, false)]);
    }

    #[test]
    fn test_offboard_frame_through_link() {
        let msg = OffboardControlData {
            x: 0.5,
            mode: 2,
            ignore: 0b1110,
            ..OffboardControlData::default()
        };
        let header = ::mavlink::MavHeader {
            system_id: 1,
            component_id: 1,
            sequence: 0,
        };
        let sent = Frame::serialize(ProtocolVersion::V2, header, &msg);

        let mut link = Mavlink::new(MockTransport::new(), MavlinkConfig::default());
        let mut result = None;
        for &b in sent.raw_bytes() {
            if let Some(decoded) = link.parse_char(b) {
                result = Some(decoded);
            }
        }

        match result {
            Some((CommMessage::OffboardControl(control), true)) => {
                assert!(control.axes[0].valid);
                assert!(!control.axes[1].valid);
                assert_eq!(control.axes[0].value, 0.5);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_poll_drains_frames_behind_a_rejected_candidate() {
        let header = ::mavlink::MavHeader {
            system_id: 1,
            component_id: 1,
            sequence: 0,
        };
        let cmd = Frame::serialize(
            ProtocolVersion::V1,
            header,
            &super::messages::RosflightCmdData { command: 0 },
        );
        let timesync = Frame::serialize(
            ProtocolVersion::V1,
            header,
            &::mavlink::common::TIMESYNC_DATA { tc1: 0, ts1: 0 },
        );
        // TIMESYNC header alone: its 16-byte payload claim spans both commands
        let mut stream = timesync.raw_bytes()[..frame::V1_HEADER_LEN].to_vec();
        stream.extend_from_slice(cmd.raw_bytes());
        stream.extend_from_slice(cmd.raw_bytes());

        let mut link = Mavlink::new(MockTransport::new(), MavlinkConfig::default());
        let mut decoded: std::vec::Vec<_> = stream.iter().filter_map(|&b| link.parse_char(b)).collect();
        while let Some(message) = link.poll() {
            decoded.push(message);
        }

        let read_params = (
            CommMessage::RosflightCommand {
                command: types::Command::ReadParams,
            },
            true,
        );
        assert_eq!(decoded, std::vec![read_params, read_params]);
        assert_eq!(link.parser_stats().crc_errors, 1);
        assert_eq!(link.parser_stats().bytes_discarded, frame::V1_HEADER_LEN as u32);
    }
}
