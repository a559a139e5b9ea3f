//! UART transport and configuration
//!
//! IBus telemetry needs both directions on the same peripheral, so the
//! transport wraps a full buffered UART rather than a split half.

use embassy_rp::uart::{self, BufferedUart};
use ibus_hal::uart::{DataBits, Parity, StopBits};
use ibus_hal::{IoUart, UartConfig};

/// Receiver transport over a buffered UART
pub type BufferedTransport = IoUart<BufferedUart>;

/// Wrap a buffered UART as a receiver transport
pub fn transport(uart: BufferedUart) -> BufferedTransport {
    IoUart::new(uart)
}

/// Convert a board-agnostic UART configuration to the embassy one
pub fn embassy_config(config: &UartConfig) -> uart::Config {
    let mut out = uart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    out.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    out
}
