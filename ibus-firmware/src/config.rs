//! Receiver configuration generated from receiver.toml

use ibus_protocol::SensorType;
use ibus_receiver::ReceiverConfig;

include!(concat!(env!("OUT_DIR"), "/receiver_config.rs"));

/// Receiver settings from receiver.toml
pub const RECEIVER_CONFIG: ReceiverConfig = ReceiverConfig::new()
    .with_telemetry(TELEMETRY_ENABLED)
    .with_frame_gap_ms(FRAME_GAP_MS)
    .with_reply_guard_us(REPLY_GUARD_US);

/// Sensor types in slot order
pub fn sensor_types() -> impl Iterator<Item = SensorType> {
    SENSOR_CODES.iter().copied().map(SensorType::from_byte)
}
