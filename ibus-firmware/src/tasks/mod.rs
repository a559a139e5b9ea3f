//! Embassy async tasks
//!
//! Each task runs independently and communicates via signals.

pub mod monitor;
pub mod receiver;
pub mod sensors;

pub use monitor::monitor_task;
pub use receiver::{receiver_task, Receiver};
pub use sensors::sensor_task;
