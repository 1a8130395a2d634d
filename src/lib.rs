#![cfg_attr(not(test), no_std)]

//! rosflight_comms - MAVLink communication layer for flight controller firmware
//!
//! Translates the ROSflight MAVLink dialect into a closed set of internal
//! command messages and packs internal telemetry back into outgoing frames.
//!
//! - Incremental, allocation-free frame decoding (`communication::mavlink::parser`)
//! - Identifier to typed message dispatch with clamping (`communication::mavlink::dispatcher`)
//! - Telemetry encoding with transport QoS tags (`communication::mavlink::writer`)

// Shared helpers and logging macros
pub mod core;

// Communication protocols (MAVLink)
pub mod communication;

pub use communication::mavlink::{
    CommMessage, Frame, Mavlink, MavlinkConfig, MavlinkParser, MavlinkWriter, QosClass,
    SerialTransport,
};

// Note: Logging macros (log_info!, log_warn!, log_error!, log_debug!, log_trace!)
// are exported at crate root via #[macro_export] in core::logging
