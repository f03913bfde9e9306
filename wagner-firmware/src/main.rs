//! Wagner - Wheeled Robot Firmware
//!
//! Main firmware binary for the RP2040-based rover. A phone joypad steers it
//! over an HC-05 Bluetooth bridge; an HC-SR04 stops it in front of obstacles
//! and an ESP-01 modem keeps a WiFi station link alive.
//!
//! Wiring:
//!
//! | function            | pins                            |
//! |---------------------|---------------------------------|
//! | HC-05 (UART0)       | GPIO0 TX, GPIO1 RX              |
//! | ESP-01 (UART1)      | GPIO4 TX, GPIO5 RX              |
//! | left wheel          | GPIO16 PWM, GPIO10/11 IN1/IN2   |
//! | right wheel         | GPIO18 PWM, GPIO12/13 IN1/IN2   |
//! | HC-SR04             | GPIO14 TRIG, GPIO15 ECHO        |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Delay, Instant};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use wagner_core::action::DEFAULT_ACTIONS;
use wagner_core::Wagner;
use wagner_drivers::motor::{HBridgeConfig, HBridgeMotor};
use wagner_drivers::radio::{EspAtConfig, EspAtRadio};
use wagner_drivers::sensor::Hcsr04;

use crate::pwm::SliceOutput;
use crate::tasks::SharedDistance;

mod channels;
mod config;
mod pwm;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

/// HC-05 factory baud rate
const BLUETOOTH_BAUD: u32 = 9600;

/// ESP-AT default baud rate
const MODEM_BAUD: u32 = 115_200;

// Static cells for UART buffers (must live forever)
static BT_TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static BT_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static MODEM_TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static MODEM_RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Wagner firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load_embedded();

    // Bluetooth bridge: receive only, the joypad expects no answers
    let bt_config = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = BLUETOOTH_BAUD;
        cfg
    };
    let bt_uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, bt_config).into_buffered(
        Irqs,
        BT_TX_BUF.init([0u8; 16]),
        BT_RX_BUF.init([0u8; 256]),
    );
    let (_bt_tx, bt_rx) = bt_uart.split();
    info!("UART0 initialized for Bluetooth");

    // WiFi modem
    let modem_config = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = MODEM_BAUD;
        cfg
    };
    let modem_uart = Uart::new_blocking(p.UART1, p.PIN_4, p.PIN_5, modem_config).into_buffered(
        Irqs,
        MODEM_TX_BUF.init([0u8; 256]),
        MODEM_RX_BUF.init([0u8; 512]),
    );
    let mut radio = EspAtRadio::new(modem_uart, Delay, EspAtConfig::default());
    match radio
        .ping()
        .and_then(|()| radio.station_mode())
        .and_then(|()| radio.refresh())
    {
        Ok(()) => info!("WiFi modem ready"),
        Err(e) => warn!("WiFi modem not answering: {:?}", e),
    }

    // Drive motors
    let motor_config = HBridgeConfig {
        max_speed: config.drive.max_speed,
        ..HBridgeConfig::default()
    };
    let left = HBridgeMotor::new(
        SliceOutput::new(Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, PwmConfig::default())),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_11, Level::Low),
        motor_config.clone(),
    );
    let right = HBridgeMotor::new(
        SliceOutput::new(Pwm::new_output_a(p.PWM_SLICE1, p.PIN_18, PwmConfig::default())),
        Output::new(p.PIN_12, Level::Low),
        Output::new(p.PIN_13, Level::Low),
        motor_config,
    );
    info!("Motors initialized");

    // Ultrasonic sensor
    let sensor = Hcsr04::new(
        Output::new(p.PIN_14, Level::Low),
        Input::new(p.PIN_15, Pull::Down),
        Delay,
        tasks::now_us as fn() -> u64,
    );
    info!("HC-SR04 initialized");

    // Boot time varies with the modem's answer latency
    let rng = SmallRng::seed_from_u64(Instant::now().as_ticks());

    let rover = unwrap!(Wagner::new(
        [left, right],
        &DEFAULT_ACTIONS,
        config,
        SharedDistance,
        radio,
        rng,
    ));
    info!("Controller ready");

    // Spawn tasks
    spawner.spawn(tasks::bluetooth_rx_task(bt_rx)).unwrap();
    spawner.spawn(tasks::sensor_task(sensor)).unwrap();
    spawner.spawn(tasks::control_task(rover)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
