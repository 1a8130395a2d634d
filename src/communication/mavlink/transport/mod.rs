//! Serial Transport Abstraction
//!
//! The communication layer never touches hardware directly. Outgoing frames are
//! handed to a [`SerialTransport`] implemented by the board support code, in
//! the spirit of ArduPilot's `AP_HAL::UARTDriver`:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │       MavlinkWriter (encoder)        │
//! └──────────┬───────────────────────────┘
//!            │ serial_write(frame, qos)
//!            ▼
//! ┌──────────────────────────────────────┐
//! │   Board: UART / USB VCP / radio      │
//! └──────────────────────────────────────┘
//! ```
//!
//! Writes are synchronous and must not block: the board is expected to queue
//! the bytes (DMA ring, FIFO) and may use the [`QosClass`] to decide what to
//! drop when the link is saturated.

/// Delivery class attached to every outgoing frame
///
/// Interpreted by the transport only; lower values are more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QosClass {
    /// High-rate sensor stream (IMU)
    Realtime = 0,
    /// Time synchronization and actuator/RC echoes
    TimeCritical = 1,
    /// Everything else
    Telemetry = 2,
}

impl Default for QosClass {
    fn default() -> Self {
        Self::Telemetry
    }
}

/// Board serial port used by the MAVLink link
///
/// # Implementation Guidelines
///
/// - `serial_init()` opens the device; it is called once from `MavlinkWriter::init`
/// - `serial_write()` receives one complete frame per call and must not block
/// - A single logical execution context calls these methods; implementations
///   shared across cores must provide their own mutual exclusion
pub trait SerialTransport {
    /// Open the serial device
    fn serial_init(&mut self, baud_rate: u32, device: u32);

    /// Queue one frame for transmission
    fn serial_write(&mut self, data: &[u8], qos: QosClass);
}

impl<T: SerialTransport + ?Sized> SerialTransport for &mut T {
    fn serial_init(&mut self, baud_rate: u32, device: u32) {
        (**self).serial_init(baud_rate, device)
    }

    fn serial_write(&mut self, data: &[u8], qos: QosClass) {
        (**self).serial_write(data, qos)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;

    #[test]
    fn test_mock_transport_records_init() {
        let mut transport = MockTransport::new();
        transport.serial_init(921_600, 1);
        assert_eq!(transport.init_args, Some((921_600, 1)));
    }

    #[test]
    fn test_mock_transport_records_writes() {
        let mut transport = MockTransport::new();
        transport.serial_write(&[1, 2, 3], QosClass::TimeCritical);
        transport.serial_write(&[4], QosClass::Telemetry);

        assert_eq!(transport.writes.len(), 2);
        assert_eq!(&transport.writes[0].data[..], &[1, 2, 3]);
        assert_eq!(transport.writes[0].qos, QosClass::TimeCritical);
        assert_eq!(transport.last_write().map(|w| w.qos), Some(QosClass::Telemetry));

        transport.clear();
        assert!(transport.writes.is_empty());
    }

    #[test]
    fn test_transport_through_mutable_reference() {
        fn write_one<T: SerialTransport>(mut port: T) {
            port.serial_write(&[9], QosClass::Realtime);
        }

        let mut transport = MockTransport::new();
        write_one(&mut transport);
        assert_eq!(transport.writes.len(), 1);
    }

    #[test]
    fn test_qos_ordering() {
        assert!(QosClass::Realtime < QosClass::TimeCritical);
        assert!(QosClass::TimeCritical < QosClass::Telemetry);
        assert_eq!(QosClass::default(), QosClass::Telemetry);
    }
}
