//! On-board sensor task
//!
//! Samples the RP2040 die temperature sensor and VSYS (GPIO29 through the
//! Pico's 1:3 divider) and hands the readings to the receiver task.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::{Duration, Ticker};

use crate::channels::{TEMP_READING, VSYS_READING};

/// Sample interval in milliseconds
const SAMPLE_INTERVAL_MS: u64 = 500;

/// ADC reference in millivolts
const ADC_VREF_MV: i32 = 3300;

/// ADC full scale (12-bit)
const ADC_MAX: i32 = 4096;

/// Die temperature in 0.1°C from a raw ADC reading
///
/// T = 27 - (V - 0.706) / 0.001721
fn die_temperature_x10(raw: u16) -> i16 {
    let mv = raw as i32 * ADC_VREF_MV / ADC_MAX;
    (270 - (mv - 706) * 10_000 / 1721) as i16
}

/// VSYS in 0.01 V from a raw ADC reading on GPIO29
fn vsys_centivolts(raw: u16) -> u16 {
    (raw as i32 * ADC_VREF_MV * 3 / ADC_MAX / 10) as u16
}

#[embassy_executor::task]
pub async fn sensor_task(
    mut adc: Adc<'static, Async>,
    mut temp_channel: Channel<'static>,
    mut vsys_channel: Channel<'static>,
) {
    info!("Sensor task started");

    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_INTERVAL_MS));

    loop {
        ticker.next().await;

        match adc.read(&mut temp_channel).await {
            Ok(raw) => TEMP_READING.signal(die_temperature_x10(raw)),
            Err(e) => warn!("Temperature ADC read failed: {:?}", e),
        }

        match adc.read(&mut vsys_channel).await {
            Ok(raw) => VSYS_READING.signal(vsys_centivolts(raw)),
            Err(e) => warn!("VSYS ADC read failed: {:?}", e),
        }
    }
}
