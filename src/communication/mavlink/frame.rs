//! MAVLink Framing
//!
//! Thin layer over rust-mavlink's raw frame types. Outgoing frames are built
//! with `MAVLinkV1MessageRaw` / `MAVLinkV2MessageRaw`; inbound candidates are
//! validated by rust-mavlink's raw readers, which check the X.25 checksum
//! seeded with the dialect's CRC_EXTRA.
//!
//! # Frame Layout
//!
//! ```text
//! MAVLink 1: STX(0xFE) LEN SEQ SYS COMP MSGID            PAYLOAD CRC_LO CRC_HI
//! MAVLink 2: STX(0xFD) LEN INC CMP SEQ SYS COMP MSGID(3) PAYLOAD CRC_LO CRC_HI [SIG(13)]
//! ```

use super::messages::RosflightMessage;
use ::mavlink::error::ParserError;
use ::mavlink::peek_reader::PeekReader;
use ::mavlink::{
    read_v1_raw_message, read_v2_raw_message, MAVLinkV1MessageRaw, MAVLinkV2MessageRaw, MavHeader,
    MavlinkVersion, Message, MessageData,
};

pub use ::mavlink::{MAV_STX, MAV_STX_V2};

/// Maximum payload length for both protocol versions
pub const MAX_PAYLOAD_LEN: usize = 255;

/// MAVLink 1 header length (including STX)
pub const V1_HEADER_LEN: usize = 6;
/// MAVLink 2 header length (including STX)
pub const V2_HEADER_LEN: usize = 10;
/// Checksum length
pub const CHECKSUM_LEN: usize = 2;
/// MAVLink 2 signature block length
pub const SIGNATURE_LEN: usize = 13;

/// MAVLink 2 incompatibility flag: frame carries a signature block
pub const INCOMPAT_FLAG_SIGNED: u8 = 0x01;

/// Largest possible frame on the wire (signed MAVLink 2 with full payload)
pub const MAX_FRAME_LEN: usize = ::mavlink::MAX_FRAME_SIZE;

/// Protocol version of outgoing frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolVersion {
    #[default]
    V1,
    V2,
}

impl From<ProtocolVersion> for MavlinkVersion {
    fn from(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::V1 => MavlinkVersion::V1,
            ProtocolVersion::V2 => MavlinkVersion::V2,
        }
    }
}

/// A complete, checksum-valid frame
///
/// The payload holds exactly the bytes on the wire; MAVLink 2 frames may
/// arrive with trailing zero bytes trimmed, which payload decoding restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    V1(MAVLinkV1MessageRaw),
    V2(MAVLinkV2MessageRaw),
}

impl Frame {
    /// Serialize one message into a frame
    pub fn serialize<D: MessageData>(version: ProtocolVersion, header: MavHeader, data: &D) -> Self {
        match version {
            ProtocolVersion::V1 => {
                let mut raw = MAVLinkV1MessageRaw::new();
                raw.serialize_message_data(header, data);
                Self::V1(raw)
            }
            ProtocolVersion::V2 => {
                let mut raw = MAVLinkV2MessageRaw::new();
                raw.serialize_message_data(header, data);
                Self::V2(raw)
            }
        }
    }

    /// Validate a buffered candidate
    ///
    /// `bytes` must start with a start marker. Returns the frame only if the
    /// whole of `bytes` is one frame with a valid checksum.
    pub fn from_candidate(bytes: &[u8]) -> Option<Self> {
        let mut reader: PeekReader<&[u8]> = PeekReader::new(bytes);
        let frame = match bytes.first()? {
            &MAV_STX => read_v1_raw_message::<RosflightMessage, _>(&mut reader)
                .ok()
                .map(Self::V1)?,
            &MAV_STX_V2 => read_v2_raw_message::<RosflightMessage, _>(&mut reader)
                .ok()
                .map(Self::V2)?,
            _ => return None,
        };

        // The reader skips past a bad checksum to any later frame inside the
        // candidate; only an exact match counts
        (frame.raw_bytes().len() == bytes.len()).then_some(frame)
    }

    pub fn version(&self) -> ProtocolVersion {
        match self {
            Self::V1(_) => ProtocolVersion::V1,
            Self::V2(_) => ProtocolVersion::V2,
        }
    }

    pub fn header(&self) -> MavHeader {
        match self {
            Self::V1(raw) => MavHeader {
                system_id: raw.system_id(),
                component_id: raw.component_id(),
                sequence: raw.sequence(),
            },
            Self::V2(raw) => MavHeader {
                system_id: raw.system_id(),
                component_id: raw.component_id(),
                sequence: raw.sequence(),
            },
        }
    }

    pub fn message_id(&self) -> u32 {
        match self {
            Self::V1(raw) => raw.message_id().into(),
            Self::V2(raw) => raw.message_id(),
        }
    }

    /// Payload bytes as received
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::V1(raw) => raw.payload(),
            Self::V2(raw) => raw.payload(),
        }
    }

    /// Whole frame as it appears on the wire
    pub fn raw_bytes(&self) -> &[u8] {
        match self {
            Self::V1(raw) => raw.raw_bytes(),
            Self::V2(raw) => raw.raw_bytes(),
        }
    }

    /// Decode the payload into a dialect message
    pub fn parse(&self) -> Result<RosflightMessage, ParserError> {
        RosflightMessage::parse(self.version().into(), self.message_id(), self.payload())
    }
}
