//! Telemetry poll handling
//!
//! Builds the reply for a poll from the sensor registry and writes it back
//! on the shared line after the guard delay.

use ibus_hal::{DelayNs, UartTx};
use ibus_protocol::{Poll, PollKind, TelemetryReply};

use crate::config::DEFAULT_REPLY_GUARD_US;
use crate::sensors::SensorRegistry;

/// Answers telemetry polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryResponder {
    guard_us: u32,
}

impl Default for TelemetryResponder {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_GUARD_US)
    }
}

impl TelemetryResponder {
    /// Create a responder that waits `guard_us` before each reply
    pub const fn new(guard_us: u32) -> Self {
        Self { guard_us }
    }

    /// Guard delay before each reply (µs)
    pub const fn guard_us(&self) -> u32 {
        self.guard_us
    }

    /// Reply owed for `poll`, if any
    ///
    /// Polls for unregistered slots and unknown sub-commands get no reply.
    pub fn reply_for<const N: usize>(
        &self,
        poll: Poll,
        sensors: &SensorRegistry<N>,
    ) -> Option<TelemetryReply> {
        let sensor = sensors.get(poll.address)?;
        let address = sensor.slot;
        match poll.kind {
            PollKind::Discover => Some(TelemetryReply::Discover { address }),
            PollKind::Type => Some(TelemetryReply::Type {
                address,
                sensor_type: sensor.sensor_type,
            }),
            PollKind::Value => Some(TelemetryReply::Value {
                address,
                value: sensor.value,
            }),
            PollKind::Unknown(_) => None,
        }
    }

    /// Answer `poll` on `tx`
    ///
    /// Blocks for the guard delay before writing. Nothing is written and no
    /// delay happens when the poll needs no reply.
    ///
    /// Returns the reply that was sent, if any.
    pub fn respond<T, D, const N: usize>(
        &self,
        poll: Poll,
        sensors: &SensorRegistry<N>,
        tx: &mut T,
        delay: &mut D,
    ) -> Result<Option<TelemetryReply>, T::Error>
    where
        T: UartTx,
        D: DelayNs,
    {
        let Some(reply) = self.reply_for(poll, sensors) else {
            trace!("No reply for poll {:?}", poll);
            return Ok(None);
        };

        delay.delay_us(self.guard_us);
        tx.write_blocking(&reply.to_bytes())?;
        trace!("Sent telemetry reply {:?}", reply);
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDelay, FakeUart};
    use ibus_protocol::SensorType;

    fn registry() -> SensorRegistry<4> {
        let mut sensors = SensorRegistry::new();
        sensors.register(SensorType::Temperature);
        let rpm = sensors.register(SensorType::Rpm);
        sensors.set_value(rpm, 0x1234);
        sensors
    }

    fn poll(byte: u8) -> Poll {
        Poll::from_byte(byte)
    }

    #[test]
    fn test_discover_echo() {
        let responder = TelemetryResponder::default();
        let uart = FakeUart::new();
        let delay = FakeDelay::new();

        let reply = responder
            .respond(poll(0x81), &registry(), &mut uart.clone(), &mut delay.clone())
            .unwrap();

        assert_eq!(reply, Some(TelemetryReply::Discover { address: 1 }));
        assert_eq!(uart.written(), vec![0x04, 0x81, 0x7A, 0xFF]);
    }

    #[test]
    fn test_type_reply() {
        let responder = TelemetryResponder::default();
        let uart = FakeUart::new();

        responder
            .respond(poll(0x91), &registry(), &mut uart.clone(), &mut FakeDelay::new())
            .unwrap();

        assert_eq!(uart.written(), vec![0x06, 0x91, 0x01, 0x02, 0x65, 0xFF]);
    }

    #[test]
    fn test_value_reply() {
        let responder = TelemetryResponder::default();
        let uart = FakeUart::new();

        responder
            .respond(poll(0xA2), &registry(), &mut uart.clone(), &mut FakeDelay::new())
            .unwrap();

        // 0xFFFF - (0x06 + 0xA2 + 0x34 + 0x12)
        assert_eq!(uart.written(), vec![0x06, 0xA2, 0x34, 0x12, 0x11, 0xFF]);
    }

    #[test]
    fn test_guard_delay_precedes_reply() {
        let responder = TelemetryResponder::new(100);
        let uart = FakeUart::new();
        let delay = FakeDelay::new();

        responder
            .respond(poll(0x81), &registry(), &mut uart.clone(), &mut delay.clone())
            .unwrap();

        assert_eq!(delay.calls(), 1);
        assert_eq!(delay.total_ns(), 100_000);
    }

    #[test]
    fn test_unregistered_slot_gets_no_reply() {
        let responder = TelemetryResponder::default();
        let uart = FakeUart::new();
        let delay = FakeDelay::new();

        for byte in [0x80, 0x83, 0x9F, 0xA5] {
            let reply = responder
                .respond(poll(byte), &registry(), &mut uart.clone(), &mut delay.clone())
                .unwrap();
            assert_eq!(reply, None);
        }
        assert!(uart.written().is_empty());
        assert_eq!(delay.calls(), 0);
    }

    #[test]
    fn test_unknown_subcommand_gets_no_reply() {
        let responder = TelemetryResponder::default();
        assert_eq!(responder.reply_for(poll(0xB1), &registry()), None);
        assert_eq!(responder.reply_for(poll(0x71), &registry()), None);

        let uart = FakeUart::new();
        let delay = FakeDelay::new();
        let sent = responder
            .respond(poll(0xB1), &registry(), &mut uart.clone(), &mut delay.clone())
            .unwrap();
        assert_eq!(sent, None);
        assert!(uart.written().is_empty());
        assert_eq!(delay.calls(), 0);
    }

    #[test]
    fn test_write_error_propagates() {
        let responder = TelemetryResponder::default();
        let uart = FakeUart::new();
        uart.fail_writes();

        let result = responder.respond(poll(0x81), &registry(), &mut uart.clone(), &mut FakeDelay::new());
        assert!(result.is_err());
    }
}
