//! Channel monitor task
//!
//! Prints the latest servo channels over defmt, at most once per second.

use defmt::*;
use embassy_time::Timer;

use crate::channels::CHANNELS;

#[embassy_executor::task]
pub async fn monitor_task() {
    info!("Monitor task started");

    loop {
        let snapshot = CHANNELS.wait().await;
        info!(
            "Channels {} | frames={} bad_len={} polls={} value_polls={}",
            snapshot.channels,
            snapshot.counters.frames_received,
            snapshot.counters.length_errors,
            snapshot.counters.polls,
            snapshot.counters.value_polls,
        );
        Timer::after_secs(1).await;
    }
}
