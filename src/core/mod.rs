//! Core utilities shared by the communication layer

pub mod bounded;
pub mod logging;
