//! IBus receiver demo firmware
//!
//! Runs the IBus receiver on an RP2040 board. The controller's servo line
//! is wired to UART0 (GPIO0 TX, GPIO1 RX, joined through a diode for the
//! half-duplex telemetry line). Sensors listed in receiver.toml are
//! registered at start-up and fed from the on-chip ADC.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Pull;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ibus_hal::UartConfig;
use ibus_hal_rp2040::{embassy_config, transport, EmbassyClock};
use ibus_receiver::IbusReceiver;

use crate::config::{sensor_types, RECEIVER_CONFIG};

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("IBus firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // IBus runs at 115200 8N1
    let uart_config = embassy_config(&UartConfig::default());

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    info!("UART initialized for IBus");

    let mut receiver: tasks::Receiver =
        IbusReceiver::new(transport(uart), EmbassyClock::new(), Delay, RECEIVER_CONFIG);
    for sensor_type in sensor_types() {
        receiver.register_sensor(sensor_type);
    }
    info!(
        "{} telemetry sensors registered (telemetry {})",
        receiver.sensors().len(),
        receiver.telemetry_enabled()
    );

    // Die temperature and VSYS (GPIO29) for telemetry
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let temp_channel = Channel::new_temp_sensor(p.ADC_TEMP_SENSOR);
    let vsys_channel = Channel::new_pin(p.PIN_29, Pull::None);

    spawner.spawn(tasks::receiver_task(receiver)).unwrap();
    spawner
        .spawn(tasks::sensor_task(adc, temp_channel, vsys_channel))
        .unwrap();
    spawner.spawn(tasks::monitor_task()).unwrap();

    info!("All tasks spawned");
}
