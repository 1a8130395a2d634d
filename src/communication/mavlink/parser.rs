//! MAVLink Frame Parser
//!
//! Incremental, byte-at-a-time frame decoder for MAVLink 1 and MAVLink 2.
//!
//! # Architecture
//!
//! - Bytes are pushed into a fixed receive buffer; whenever the buffer starts
//!   with a complete candidate it is handed to rust-mavlink's raw readers,
//!   which validate the checksum against the dialect's CRC_EXTRA
//! - All state lives in the [`MavlinkParser`] instance (no globals, no heap)
//! - Bytes before a start marker are discarded
//! - A candidate whose header is implausible (unknown message id, payload
//!   length the message cannot have, unsupported MAVLink 2 incompat flags) or
//!   whose checksum fails costs only its start marker: scanning resumes at the
//!   next byte, so a frame hidden behind a stray marker is still found
//!
//! Every byte pushed ends up in exactly one of: an accepted frame, the
//! discarded count, or the receive buffer.
//!
//! MAVLink 2 signatures are consumed but not verified.
//!
//! # Buffer Management
//!
//! - Receive buffer: 2x the largest frame, heapless Vec
//! - A candidate never exceeds one frame, so the buffer only fills when the
//!   caller stops draining accepted frames

use super::frame::{
    Frame, ProtocolVersion, CHECKSUM_LEN, INCOMPAT_FLAG_SIGNED, MAX_FRAME_LEN, MAV_STX, MAV_STX_V2,
    SIGNATURE_LEN, V1_HEADER_LEN, V2_HEADER_LEN,
};
use super::messages::payload_len_bounds;
use heapless::Vec;

/// Receive buffer capacity
pub const RX_BUFFER_SIZE: usize = 2 * MAX_FRAME_LEN;

/// Parser statistics for monitoring and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParserStats {
    /// Frames successfully decoded
    pub messages_received: u32,
    /// Complete candidates rejected by checksum
    pub crc_errors: u32,
    /// Candidates rejected by header (unknown id, bad length, unsupported flags)
    pub dropped_frames: u32,
    /// Bytes skipped while searching for a frame, start markers of rejected
    /// candidates included
    pub bytes_discarded: u32,
}

/// What the bytes at the front of the buffer amount to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    /// More bytes needed
    Incomplete,
    /// Header cannot start a frame
    Rejected,
    /// Header is plausible and this many bytes complete the frame
    Complete(usize),
}

/// MAVLink frame parser
///
/// Owns the receive buffer across calls. Exactly one reader may feed a
/// parser instance.
pub struct MavlinkParser {
    buf: Vec<u8, RX_BUFFER_SIZE>,
    stats: ParserStats,
}

impl MavlinkParser {
    /// Create a new MAVLink parser
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            stats: ParserStats::default(),
        }
    }

    /// Get parser statistics
    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Reset parser statistics
    pub fn reset_stats(&mut self) {
        self.stats = ParserStats::default();
    }

    /// Drop any buffered bytes, including a partially received frame
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Process a single byte
    ///
    /// Returns `Some(frame)` when a frame is complete, `None` otherwise.
    /// Never fails: malformed input is absorbed. A byte may complete more
    /// than one frame when earlier bytes are rescanned; the rest are returned
    /// by later calls or by [`poll`](Self::poll).
    pub fn parse_byte(&mut self, byte: u8) -> Option<Frame> {
        if self.buf.push(byte).is_err() {
            crate::log_warn!("MAVLink: receive buffer full, dropping {} bytes", self.buf.len());
            self.stats.bytes_discarded = self.stats.bytes_discarded.wrapping_add(self.buf.len() as u32);
            self.buf.clear();
            // Empty buffer always has room
            let _ = self.buf.push(byte);
        }
        self.poll()
    }

    /// Return the next frame already sitting in the buffer, if any
    pub fn poll(&mut self) -> Option<Frame> {
        loop {
            let skip = self
                .buf
                .iter()
                .position(|&b| b == MAV_STX || b == MAV_STX_V2)
                .unwrap_or(self.buf.len());
            self.discard(skip);

            if self.buf.is_empty() {
                return None;
            }

            match inspect(&self.buf) {
                Candidate::Incomplete => return None,
                Candidate::Rejected => {
                    self.stats.dropped_frames = self.stats.dropped_frames.wrapping_add(1);
                    self.discard(1);
                }
                Candidate::Complete(len) => match Frame::from_candidate(&self.buf[..len]) {
                    Some(frame) => {
                        self.consume(len);
                        self.stats.messages_received = self.stats.messages_received.wrapping_add(1);
                        return Some(frame);
                    }
                    None => {
                        crate::log_trace!("MAVLink: CRC mismatch, rescanning {} bytes", len - 1);
                        self.stats.crc_errors = self.stats.crc_errors.wrapping_add(1);
                        self.discard(1);
                    }
                },
            }
        }
    }

    /// Feed a slice, yielding every frame it completes
    pub fn parse_bytes<'p, 'b>(&'p mut self, bytes: &'b [u8]) -> ParseBytes<'p, 'b> {
        ParseBytes {
            parser: self,
            bytes: bytes.iter(),
        }
    }

    fn discard(&mut self, count: usize) {
        self.stats.bytes_discarded = self.stats.bytes_discarded.wrapping_add(count as u32);
        self.consume(count);
    }

    fn consume(&mut self, count: usize) {
        let count = count.min(self.buf.len());
        let remaining = self.buf.len() - count;
        self.buf.copy_within(count.., 0);
        self.buf.truncate(remaining);
    }
}

impl Default for MavlinkParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify the bytes at the front of `buf`, which starts with a start marker
fn inspect(buf: &[u8]) -> Candidate {
    let (version, header_len) = match buf.first() {
        Some(&MAV_STX) => (ProtocolVersion::V1, V1_HEADER_LEN),
        Some(&MAV_STX_V2) => (ProtocolVersion::V2, V2_HEADER_LEN),
        _ => return Candidate::Rejected,
    };
    if buf.len() < header_len {
        return Candidate::Incomplete;
    }

    let payload_len = buf[1] as usize;
    let (message_id, signature_len) = match version {
        ProtocolVersion::V1 => (buf[5] as u32, 0),
        ProtocolVersion::V2 => {
            let incompat_flags = buf[2];
            if incompat_flags & !INCOMPAT_FLAG_SIGNED != 0 {
                return Candidate::Rejected;
            }
            let signature_len = if incompat_flags & INCOMPAT_FLAG_SIGNED != 0 {
                SIGNATURE_LEN
            } else {
                0
            };
            (u32::from_le_bytes([buf[7], buf[8], buf[9], 0]), signature_len)
        }
    };

    match payload_len_bounds(message_id, version.into()) {
        Some(bounds) if bounds.contains(&payload_len) => {}
        Some(_) => {
            crate::log_trace!("MAVLink: bad length {} for message id {}", payload_len, message_id);
            return Candidate::Rejected;
        }
        None => {
            crate::log_trace!("MAVLink: unknown message id {}", message_id);
            return Candidate::Rejected;
        }
    }

    let frame_len = header_len + payload_len + CHECKSUM_LEN + signature_len;
    if buf.len() < frame_len {
        Candidate::Incomplete
    } else {
        Candidate::Complete(frame_len)
    }
}

/// Iterator returned by [`MavlinkParser::parse_bytes`]
///
/// After the input slice is exhausted, frames still buffered are drained.
pub struct ParseBytes<'p, 'b> {
    parser: &'p mut MavlinkParser,
    bytes: ::core::slice::Iter<'b, u8>,
}

impl Iterator for ParseBytes<'_, '_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        for &byte in self.bytes.by_ref() {
            if let Some(frame) = self.parser.parse_byte(byte) {
                return Some(frame);
            }
        }
        self.parser.poll()
    }
}
