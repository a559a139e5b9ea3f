//! Telemetry sensor registry
//!
//! Sensors are registered once at start-up and keep their slot for the life
//! of the receiver. Slots are 1-based because polls address sensors by the
//! low nibble of the command byte and slot 0 means "no sensor".

use heapless::Vec;

use ibus_protocol::SensorType;

/// Sensors kept by a default receiver
pub const MAX_SENSORS: usize = 10;

/// Highest slot a poll can address
pub const MAX_SENSOR_SLOT: usize = 15;

/// A registered telemetry sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sensor {
    /// 1-based slot the controller polls
    pub slot: u8,
    /// Reported type code
    pub sensor_type: SensorType,
    /// Latest reading
    pub value: u16,
}

/// Fixed-capacity, append-only set of sensors
#[derive(Debug, Clone)]
pub struct SensorRegistry<const N: usize = MAX_SENSORS> {
    sensors: Vec<Sensor, N>,
}

impl<const N: usize> Default for SensorRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SensorRegistry<N> {
    const CAPACITY_FITS_ADDRESS: () = assert!(
        N <= MAX_SENSOR_SLOT,
        "sensor capacity exceeds the 4-bit poll address"
    );

    /// Create an empty registry
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_FITS_ADDRESS;
        Self { sensors: Vec::new() }
    }

    /// Register a sensor and return its slot
    ///
    /// Once the registry is full further registrations are ignored and the
    /// last valid slot is returned again. With zero capacity that is 0.
    pub fn register(&mut self, sensor_type: SensorType) -> u8 {
        let slot = self.sensors.len() as u8 + 1;
        if self
            .sensors
            .push(Sensor {
                slot,
                sensor_type,
                value: 0,
            })
            .is_err()
        {
            return self.sensors.len() as u8;
        }
        slot
    }

    /// Update the reading of the sensor at `slot`
    ///
    /// Unregistered slots are ignored. Returns whether a sensor was updated.
    pub fn set_value(&mut self, slot: u8, value: u16) -> bool {
        match self.get_mut(slot) {
            Some(sensor) => {
                sensor.value = value;
                true
            }
            None => false,
        }
    }

    /// Sensor at `slot`, if registered
    pub fn get(&self, slot: u8) -> Option<&Sensor> {
        self.sensors.get((slot as usize).checked_sub(1)?)
    }

    fn get_mut(&mut self, slot: u8) -> Option<&mut Sensor> {
        self.sensors.get_mut((slot as usize).checked_sub(1)?)
    }

    /// Whether `slot` addresses a registered sensor
    pub fn contains(&self, slot: u8) -> bool {
        self.get(slot).is_some()
    }

    /// Number of registered sensors
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// True if no sensors are registered
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// True if no more sensors can be registered
    pub fn is_full(&self) -> bool {
        self.sensors.is_full()
    }

    /// Iterate registered sensors in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.iter()
    }
}
