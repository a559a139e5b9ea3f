//! IBus receiver task
//!
//! Drives the receiver from a 1 ms ticker. At 115200 baud a full frame
//! takes under 3 ms, so the UART buffer never comes close to overflowing.

use defmt::*;
use embassy_time::{Delay, Duration, Ticker};
use heapless::Vec;

use ibus_hal_rp2040::{BufferedTransport, EmbassyClock};
use ibus_protocol::SensorType;
use ibus_receiver::{IbusReceiver, ReceiverError, MAX_SENSORS, PROTOCOL_CHANNELS};

use crate::channels::{ChannelSnapshot, CHANNELS, TEMP_READING, VSYS_READING};

/// Receiver as wired on this board
pub type Receiver = IbusReceiver<BufferedTransport, EmbassyClock, Delay>;

/// Polling interval in milliseconds
const POLL_INTERVAL_MS: u64 = 1;

/// Slots holding sensors of one type
fn slots_of(receiver: &Receiver, sensor_type: SensorType) -> Vec<u8, MAX_SENSORS> {
    receiver
        .sensors()
        .iter()
        .filter(|s| s.sensor_type == sensor_type)
        .map(|s| s.slot)
        .collect()
}

#[embassy_executor::task]
pub async fn receiver_task(mut receiver: Receiver) {
    info!("Receiver task started");

    let temp_slots = slots_of(&receiver, SensorType::Temperature);
    let vsys_slots = slots_of(&receiver, SensorType::InternalVoltage);

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let mut last_frames = 0;

    loop {
        ticker.next().await;

        if let Some(temp_x10) = TEMP_READING.try_take() {
            let raw = ibus_protocol::temperature_to_raw(temp_x10);
            for &slot in &temp_slots {
                receiver.set_sensor_value(slot, raw);
            }
        }
        if let Some(centivolts) = VSYS_READING.try_take() {
            for &slot in &vsys_slots {
                receiver.set_sensor_value(slot, centivolts);
            }
        }

        match receiver.process() {
            Ok(_) => {}
            Err(ReceiverError::Read(e)) => warn!("UART read failed: {:?}", e),
            Err(ReceiverError::Write(e)) => warn!("UART write failed: {:?}", e),
        }

        let counters = receiver.counters();
        if counters.frames_received != last_frames {
            last_frames = counters.frames_received;
            let mut channels = [0u16; PROTOCOL_CHANNELS];
            channels.copy_from_slice(receiver.channels());
            CHANNELS.signal(ChannelSnapshot { channels, counters });
        }
    }
}
