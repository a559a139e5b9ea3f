//! IBus receiver
//!
//! Ties the frame decoder to the channel store and telemetry responder.
//! Everything happens inside [`IbusReceiver::process`]; there is no
//! background work and no internal locking.

use ibus_hal::{Clock, DelayNs, Uart};
use ibus_protocol::{Command, Frame, FrameDecoder, FrameError, SensorType, TelemetryReply};

use crate::channels::{ChannelStore, PROTOCOL_CHANNELS};
use crate::config::ReceiverConfig;
use crate::error::{ProcessError, ReceiverError};
use crate::sensors::{Sensor, SensorRegistry, MAX_SENSORS};
use crate::telemetry::TelemetryResponder;

/// Diagnostic counters
///
/// All counters wrap on overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counters {
    /// Valid channel frames applied
    pub frames_received: u32,
    /// Frames dropped for an out-of-range LENGTH byte
    pub length_errors: u32,
    /// Discover polls answered
    pub polls: u32,
    /// Value polls answered
    pub value_polls: u32,
}

/// Polled IBus receiver
///
/// `CHANNELS` and `SENSORS` size the channel store and sensor registry.
pub struct IbusReceiver<
    U,
    C,
    D,
    const CHANNELS: usize = PROTOCOL_CHANNELS,
    const SENSORS: usize = MAX_SENSORS,
> {
    uart: U,
    clock: C,
    delay: D,
    decoder: FrameDecoder,
    channels: ChannelStore<CHANNELS>,
    sensors: SensorRegistry<SENSORS>,
    responder: TelemetryResponder,
    telemetry_enabled: bool,
    counters: Counters,
}

impl<U, C, D, const CHANNELS: usize, const SENSORS: usize> IbusReceiver<U, C, D, CHANNELS, SENSORS>
where
    U: Uart,
    C: Clock,
    D: DelayNs,
{
    /// Create a receiver on `uart`
    ///
    /// The first frame gap is measured from now, so bytes of a frame already
    /// in flight are skipped.
    pub fn new(uart: U, clock: C, delay: D, config: ReceiverConfig) -> Self {
        let decoder = FrameDecoder::with_frame_gap(clock.now_ms(), config.frame_gap_ms);
        info!(
            "IBus receiver ready (telemetry: {})",
            config.telemetry_enabled
        );
        Self {
            uart,
            clock,
            delay,
            decoder,
            channels: ChannelStore::new(),
            sensors: SensorRegistry::new(),
            responder: TelemetryResponder::new(config.reply_guard_us),
            telemetry_enabled: config.telemetry_enabled,
            counters: Counters::default(),
        }
    }

    /// Drain every byte the UART has ready
    ///
    /// Complete frames are applied as they arrive and telemetry polls are
    /// answered before the next byte is read. Returns the number of bytes
    /// consumed.
    pub fn process(&mut self) -> Result<usize, ProcessError<U>> {
        let mut consumed = 0;

        while self.uart.bytes_available().map_err(ReceiverError::Read)? > 0 {
            let now = self.clock.now_ms();
            let byte = self.uart.read_byte().map_err(ReceiverError::Read)?;
            consumed += 1;

            match self.decoder.feed(byte, now) {
                Ok(Some(frame)) => self.dispatch(&frame)?,
                Ok(None) => {}
                Err(FrameError::InvalidLength(length)) => {
                    self.counters.length_errors = self.counters.length_errors.wrapping_add(1);
                    debug!("Invalid frame length {}", length);
                }
                Err(e) => {
                    // Checksum errors are not counted
                    trace!("Frame dropped: {:?}", e);
                }
            }
        }

        Ok(consumed)
    }

    fn dispatch(&mut self, frame: &Frame) -> Result<(), ProcessError<U>> {
        match Command::from_frame(frame) {
            Command::SetChannels(values) => {
                let written = self.channels.update(values);
                self.counters.frames_received = self.counters.frames_received.wrapping_add(1);
                trace!("Channels updated: {} values", written);
            }
            Command::Poll(poll) if self.telemetry_enabled => {
                let reply = self
                    .responder
                    .respond(poll, &self.sensors, &mut self.uart, &mut self.delay)
                    .map_err(ReceiverError::Write)?;

                match reply {
                    Some(TelemetryReply::Discover { .. }) => {
                        self.counters.polls = self.counters.polls.wrapping_add(1);
                    }
                    Some(TelemetryReply::Value { .. }) => {
                        self.counters.value_polls = self.counters.value_polls.wrapping_add(1);
                    }
                    Some(TelemetryReply::Type { .. }) | None => {}
                }
            }
            Command::Poll(_) => {}
            Command::Other(command) => {
                trace!("Ignoring command {=u8:#x}", command);
            }
        }
        Ok(())
    }

    /// Last value of channel `index`, or 0 if there is no such channel
    pub fn channel(&self, index: usize) -> u16 {
        self.channels.get(index)
    }

    /// All channel values
    pub fn channels(&self) -> &[u16] {
        self.channels.as_slice()
    }

    /// Register a telemetry sensor and return its slot
    ///
    /// Returns the last slot again once the registry is full.
    pub fn register_sensor(&mut self, sensor_type: SensorType) -> u8 {
        let slot = self.sensors.register(sensor_type);
        debug!("Sensor {:?} at slot {}", sensor_type, slot);
        slot
    }

    /// Update the reading reported for `slot`
    ///
    /// Unregistered slots are ignored.
    pub fn set_sensor_value(&mut self, slot: u8, value: u16) {
        if !self.sensors.set_value(slot, value) {
            warn!("No sensor at slot {}", slot);
        }
    }

    /// Sensor registered at `slot`
    pub fn sensor(&self, slot: u8) -> Option<&Sensor> {
        self.sensors.get(slot)
    }

    /// All registered sensors
    pub fn sensors(&self) -> &SensorRegistry<SENSORS> {
        &self.sensors
    }

    /// Diagnostic counters
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Whether telemetry polls are answered
    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry_enabled
    }

    /// Frame decoder, for inspecting its state
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Tear down the receiver and hand back its capabilities
    pub fn release(self) -> (U, C, D) {
        (self.uart, self.clock, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClock, FakeDelay, FakeUart, FakeUartError};
    use crate::MAX_SENSOR_SLOT;
    use ibus_protocol::DecoderState;
    use proptest::prelude::*;

    const SERVO_FRAME: [u8; 32] = [
        0x20, 0x40, 0xDB, 0x05, 0xDC, 0x05, 0x54, 0x05, 0xDC, 0x05, 0xE8, 0x03, 0xD0, 0x07,
        0xD2, 0x05, 0xE8, 0x03, 0xDC, 0x05, 0xDC, 0x05, 0xDC, 0x05, 0xDC, 0x05, 0xDC, 0x05,
        0xDC, 0x05, 0xDA, 0xF3,
    ];

    struct Harness {
        uart: FakeUart,
        clock: FakeClock,
        delay: FakeDelay,
        receiver: IbusReceiver<FakeUart, FakeClock, FakeDelay>,
    }

    impl Harness {
        fn new(config: ReceiverConfig) -> Self {
            let uart = FakeUart::new();
            let clock = FakeClock::new();
            let delay = FakeDelay::new();
            let receiver = IbusReceiver::new(uart.clone(), clock.clone(), delay.clone(), config);
            Self {
                uart,
                clock,
                delay,
                receiver,
            }
        }

        /// Deliver `bytes` after a frame gap and process them
        fn send(&mut self, bytes: &[u8]) -> usize {
            self.clock.advance(10);
            self.uart.push_rx(bytes);
            self.receiver.process().unwrap()
        }
    }

    #[test]
    fn test_servo_frame_updates_channels() {
        let mut h = Harness::new(ReceiverConfig::default());
        assert_eq!(h.send(&SERVO_FRAME), 32);

        assert_eq!(
            h.receiver.channels(),
            &[0x05DB, 0x05DC, 0x0554, 0x05DC, 0x03E8, 0x07D0, 0x05D2, 0x03E8, 0x05DC, 0x05DC]
        );
        assert_eq!(h.receiver.counters().frames_received, 1);
        assert_eq!(h.receiver.counters().length_errors, 0);
    }

    #[test]
    fn test_channel_out_of_range_reads_zero() {
        let mut h = Harness::new(ReceiverConfig::default());
        h.send(&SERVO_FRAME);
        assert_eq!(h.receiver.channel(0), 0x05DB);
        assert_eq!(h.receiver.channel(10), 0);
        assert_eq!(h.receiver.channel(255), 0);
    }

    #[test]
    fn test_bytes_before_first_gap_are_skipped() {
        let mut h = Harness::new(ReceiverConfig::default());
        // No gap since start-up
        h.uart.push_rx(&SERVO_FRAME);
        h.receiver.process().unwrap();

        assert_eq!(h.receiver.counters().frames_received, 0);
        assert_eq!(h.receiver.channel(0), 0);
    }

    #[test]
    fn test_invalid_length_counted_once() {
        let mut h = Harness::new(ReceiverConfig::default());
        h.send(&[0x21, 0x40, 0x00, 0x00]);

        assert_eq!(h.receiver.counters().length_errors, 1);
        assert_eq!(h.receiver.counters().frames_received, 0);
        assert_eq!(h.receiver.decoder().state(), DecoderState::Discarding);
    }

    #[test]
    fn test_checksum_mismatch_not_counted() {
        let mut h = Harness::new(ReceiverConfig::default());
        let mut corrupted = SERVO_FRAME;
        corrupted[31] ^= 0x01;
        h.send(&corrupted);

        assert_eq!(h.receiver.counters(), Counters::default());
        assert_eq!(h.receiver.channel(0), 0);
    }

    #[test]
    fn test_telemetry_disabled_ignores_polls() {
        let mut h = Harness::new(ReceiverConfig::default());
        h.receiver.register_sensor(SensorType::Temperature);
        h.send(&[0x04, 0x81, 0x7A, 0xFF]);

        assert!(h.uart.written().is_empty());
        assert_eq!(h.delay.calls(), 0);
        assert_eq!(h.receiver.counters().polls, 0);
    }

    #[test]
    fn test_discover_poll_answered() {
        let mut h = Harness::new(ReceiverConfig::new().with_telemetry(true));
        assert_eq!(h.receiver.register_sensor(SensorType::Temperature), 1);
        h.send(&[0x04, 0x81, 0x7A, 0xFF]);

        assert_eq!(h.uart.written(), vec![0x04, 0x81, 0x7A, 0xFF]);
        assert_eq!(h.delay.calls(), 1);
        assert_eq!(h.receiver.counters().polls, 1);
        assert_eq!(h.receiver.counters().value_polls, 0);
    }

    #[test]
    fn test_value_poll_answered_and_counted() {
        let mut h = Harness::new(ReceiverConfig::new().with_telemetry(true));
        let slot = h.receiver.register_sensor(SensorType::ExternalVoltage);
        h.receiver.set_sensor_value(slot, 0x1234);

        let poll = ibus_protocol::Poll::from_byte(0xA1)
            .to_frame()
            .unwrap()
            .encode_to_vec()
            .unwrap();
        h.send(&poll);

        assert_eq!(h.uart.written(), vec![0x06, 0xA1, 0x34, 0x12, 0x12, 0xFF]);
        assert_eq!(h.receiver.counters().value_polls, 1);
    }

    #[test]
    fn test_poll_for_unregistered_slot_ignored() {
        let mut h = Harness::new(ReceiverConfig::new().with_telemetry(true));
        h.receiver.register_sensor(SensorType::Rpm);
        // Discover for slot 2
        h.send(&[0x04, 0x82, 0x79, 0xFF]);

        assert!(h.uart.written().is_empty());
        assert_eq!(h.receiver.counters().polls, 0);
    }

    #[test]
    fn test_set_value_for_unknown_slot_ignored() {
        let mut h = Harness::new(ReceiverConfig::default());
        let slot = h.receiver.register_sensor(SensorType::Rpm);
        h.receiver.set_sensor_value(slot + 1, 500);
        h.receiver.set_sensor_value(0, 500);

        assert_eq!(h.receiver.sensor(slot).map(|s| s.value), Some(0));
        assert_eq!(h.receiver.sensors().len(), 1);
    }

    #[test]
    fn test_gap_mid_frame_discards_partial() {
        let mut h = Harness::new(ReceiverConfig::default());
        h.send(&SERVO_FRAME[..12]);
        assert_eq!(h.uart.pending(), 0);

        // Rest of the frame arrives after a gap and is read as garbage
        h.send(&SERVO_FRAME[12..]);
        assert_eq!(h.receiver.counters().frames_received, 0);
        assert_eq!(h.receiver.channel(0), 0);

        // The next complete frame is decoded normally
        h.send(&SERVO_FRAME);
        assert_eq!(h.receiver.counters().frames_received, 1);
    }

    #[test]
    fn test_split_delivery_without_gap() {
        let mut h = Harness::new(ReceiverConfig::default());
        h.send(&SERVO_FRAME[..12]);

        h.clock.advance(1);
        h.uart.push_rx(&SERVO_FRAME[12..]);
        h.receiver.process().unwrap();

        assert_eq!(h.receiver.counters().frames_received, 1);
        assert_eq!(h.receiver.channel(9), 0x05DC);
    }

    #[test]
    fn test_type_poll_answered_but_not_counted() {
        let mut h = Harness::new(ReceiverConfig::new().with_telemetry(true));
        h.receiver.register_sensor(SensorType::Temperature);
        // Type poll for slot 1
        h.send(&[0x04, 0x91, 0x6A, 0xFF]);

        assert_eq!(h.uart.written(), vec![0x06, 0x91, 0x01, 0x02, 0x65, 0xFF]);
        assert_eq!(h.receiver.counters().polls, 0);
        assert_eq!(h.receiver.counters().value_polls, 0);
    }

    #[test]
    fn test_echoed_reply_is_not_a_poll() {
        let mut h = Harness::new(ReceiverConfig::new().with_telemetry(true));
        h.receiver.register_sensor(SensorType::Rpm);
        h.send(&[0x04, 0x81, 0x7A, 0xFF]);
        assert_eq!(h.delay.total_ns(), 100_000);

        // Half-duplex line: our own reply comes straight back
        let echo = h.uart.written();
        h.uart.push_rx(&echo);
        h.receiver.process().unwrap();

        assert_eq!(h.uart.written().len(), 4);
        assert_eq!(h.receiver.counters().polls, 1);
    }

    #[test]
    fn test_registration_saturates_at_capacity() {
        let mut h = Harness::new(ReceiverConfig::new().with_telemetry(true));
        for expected in 1..=MAX_SENSORS as u8 {
            assert_eq!(h.receiver.register_sensor(SensorType::Rpm), expected);
        }
        assert_eq!(
            h.receiver.register_sensor(SensorType::Temperature),
            MAX_SENSORS as u8
        );
        assert_eq!(h.receiver.sensors().len(), MAX_SENSORS);
        assert!(MAX_SENSORS <= MAX_SENSOR_SLOT);
    }

    #[test]
    fn test_wider_channel_store() {
        let uart = FakeUart::new();
        let clock = FakeClock::new();
        let mut receiver: IbusReceiver<_, _, _, 14> = IbusReceiver::new(
            uart.clone(),
            clock.clone(),
            FakeDelay::new(),
            ReceiverConfig::default(),
        );
        clock.advance(10);
        uart.push_rx(&SERVO_FRAME);
        receiver.process().unwrap();

        assert_eq!(receiver.channels().len(), 14);
        assert_eq!(receiver.channel(13), 0x05DC);
    }

    #[test]
    fn test_read_error_propagates() {
        let mut h = Harness::new(ReceiverConfig::default());
        h.uart.fail_reads();
        assert_eq!(h.receiver.process(), Err(ReceiverError::Read(FakeUartError)));
    }

    #[test]
    fn test_write_error_propagates() {
        let mut h = Harness::new(ReceiverConfig::new().with_telemetry(true));
        h.receiver.register_sensor(SensorType::Rpm);
        h.uart.fail_writes();
        h.clock.advance(10);
        h.uart.push_rx(&[0x04, 0x81, 0x7A, 0xFF]);

        assert_eq!(h.receiver.process(), Err(ReceiverError::Write(FakeUartError)));
    }

    #[test]
    fn test_release_returns_capabilities() {
        let h = Harness::new(ReceiverConfig::default());
        let (uart, _clock, _delay) = h.receiver.release();
        assert_eq!(uart.pending(), 0);
    }

    proptest! {
        #[test]
        fn prop_arbitrary_bytes_never_fail(chunks in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..64), 0..8,
        )) {
            let mut h = Harness::new(ReceiverConfig::new().with_telemetry(true));
            h.receiver.register_sensor(SensorType::Temperature);

            let mut total = 0;
            for chunk in &chunks {
                total += chunk.len();
                h.clock.advance(1);
                h.uart.push_rx(chunk);
                prop_assert_eq!(h.receiver.process(), Ok(chunk.len()));
            }
            prop_assert_eq!(h.uart.pending(), 0);
            prop_assert!(h.receiver.counters().length_errors as usize <= total);
        }

        #[test]
        fn prop_channel_frames_apply(values in proptest::collection::vec(any::<u16>(), 1..=14)) {
            let mut payload = std::vec![ibus_protocol::CMD_SET_CHANNELS];
            for value in &values {
                payload.extend_from_slice(&value.to_le_bytes());
            }
            let frame = ibus_protocol::Frame::new(&payload).unwrap();

            let mut h = Harness::new(ReceiverConfig::default());
            h.send(&frame.encode_to_vec().unwrap());

            prop_assert_eq!(h.receiver.counters().frames_received, 1);
            for (index, value) in values.iter().take(PROTOCOL_CHANNELS).enumerate() {
                prop_assert_eq!(h.receiver.channel(index), *value);
            }
            for index in values.len()..PROTOCOL_CHANNELS {
                prop_assert_eq!(h.receiver.channel(index), 0);
            }
        }
    }
}
