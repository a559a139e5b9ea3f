//! Telemetry sensor type codes

/// Offset applied to temperature readings on the wire
const TEMPERATURE_OFFSET_X10: i32 = 400;

/// Sensor type reported in reply to a type poll
///
/// The controller uses the type to pick units and a display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorType {
    /// Receiver supply voltage, 0.01 V units
    InternalVoltage,
    /// Temperature, see [`temperature_to_raw`]
    Temperature,
    /// Motor or rotor speed
    Rpm,
    /// External voltage, 0.01 V units
    ExternalVoltage,
    /// Any other code, passed through unchanged
    Other(u8),
}

// Wire format values
const TYPE_INTERNAL_VOLTAGE: u8 = 0x00;
const TYPE_TEMPERATURE: u8 = 0x01;
const TYPE_RPM: u8 = 0x02;
const TYPE_EXTERNAL_VOLTAGE: u8 = 0x03;

impl SensorType {
    /// Parse a sensor type from its wire format byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            TYPE_INTERNAL_VOLTAGE => SensorType::InternalVoltage,
            TYPE_TEMPERATURE => SensorType::Temperature,
            TYPE_RPM => SensorType::Rpm,
            TYPE_EXTERNAL_VOLTAGE => SensorType::ExternalVoltage,
            other => SensorType::Other(other),
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            SensorType::InternalVoltage => TYPE_INTERNAL_VOLTAGE,
            SensorType::Temperature => TYPE_TEMPERATURE,
            SensorType::Rpm => TYPE_RPM,
            SensorType::ExternalVoltage => TYPE_EXTERNAL_VOLTAGE,
            SensorType::Other(code) => code,
        }
    }
}

impl From<u8> for SensorType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<SensorType> for u8 {
    fn from(sensor_type: SensorType) -> Self {
        sensor_type.to_byte()
    }
}

/// Encode a temperature in 0.1°C units as a raw sensor value
///
/// The wire value is offset by 40.0°C so that sub-zero readings stay
/// unsigned. Readings below -40.0°C clamp to zero.
pub fn temperature_to_raw(celsius_x10: i16) -> u16 {
    (celsius_x10 as i32 + TEMPERATURE_OFFSET_X10).clamp(0, u16::MAX as i32) as u16
}

/// Decode a raw temperature value into 0.1°C units
pub fn raw_to_temperature(raw: u16) -> i16 {
    (raw as i32 - TEMPERATURE_OFFSET_X10).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
