//! MAVLink Receive Task Support
//!
//! Async adapter that pulls bytes from any [`embedded_io_async::Read`] source
//! (buffered UART, USB CDC) and yields decoded messages.
//!
//! # Usage
//!
//! ```ignore
//! use rosflight_comms::communication::mavlink::task::FrameReader;
//!
//! #[embassy_executor::task]
//! async fn mavlink_rx(mut uart_rx: BufferedUartRx) {
//!     let mut reader = FrameReader::new();
//!     loop {
//!         match reader.read_message(&mut uart_rx).await {
//!             Ok((message, true)) => handle(message),
//!             Ok((_, false)) => {}
//!             Err(e) => defmt::warn!("MAVLink RX error: {}", e),
//!         }
//!     }
//! }
//! ```
//!
//! # Cancellation
//!
//! `read_message` may be dropped at its await point (e.g. inside a
//! `select` with a timer). Bytes already read stay in the reader's buffer and
//! the parser keeps its partial frame, so no input is lost.

use super::dispatcher::dispatch_frame;
use super::parser::{MavlinkParser, ParserStats};
use super::types::CommMessage;
use embedded_io_async::{Error, ErrorKind, Read};

/// Size of a single read from the byte source
pub const RX_CHUNK_SIZE: usize = 64;

/// Receive error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    /// The byte source reported end of stream
    EndOfStream,
    /// The byte source failed
    Io(ErrorKind),
}

impl ::core::fmt::Display for ReadError {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        match self {
            ReadError::EndOfStream => write!(f, "End of stream"),
            ReadError::Io(kind) => write!(f, "Read error: {:?}", kind),
        }
    }
}

/// Chunked frame reader
pub struct FrameReader {
    parser: MavlinkParser,
    buf: [u8; RX_CHUNK_SIZE],
    pos: usize,
    len: usize,
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            parser: MavlinkParser::new(),
            buf: [0; RX_CHUNK_SIZE],
            pos: 0,
            len: 0,
        }
    }

    /// Read until one complete frame has been decoded
    ///
    /// Returns the decoded message and whether its identifier is supported.
    pub async fn read_message<R: Read>(
        &mut self,
        reader: &mut R,
    ) -> Result<(CommMessage, bool), ReadError> {
        loop {
            if let Some(frame) = self.parser.poll() {
                return Ok(dispatch_frame(&frame));
            }
            while self.pos < self.len {
                let byte = self.buf[self.pos];
                self.pos += 1;
                if let Some(frame) = self.parser.parse_byte(byte) {
                    return Ok(dispatch_frame(&frame));
                }
            }

            let n = reader
                .read(&mut self.buf)
                .await
                .map_err(|e| ReadError::Io(e.kind()))?;
            if n == 0 {
                return Err(ReadError::EndOfStream);
            }
            self.pos = 0;
            self.len = n;
        }
    }

    /// Get parser statistics
    pub fn stats(&self) -> ParserStats {
        self.parser.stats()
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}
