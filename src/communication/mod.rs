//! Communication Protocols
//!
//! # Protocols
//!
//! - **MAVLink 1.0 / 2.0** with the ROSflight dialect
//!   - Commands in: offboard control, aux actuator commands, parameter protocol
//!   - Telemetry out: attitude, sensors, GNSS, status, parameter values
//!
//! # Transport Layers
//!
//! - Serial (UART/USB VCP) behind the `SerialTransport` trait

pub mod mavlink;
