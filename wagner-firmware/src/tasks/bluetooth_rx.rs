//! Bluetooth UART receive task
//!
//! Forwards raw bytes from the HC-05 bridge to the control task. Framing is
//! left to the controller so bytes are never split between two parsers.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use crate::channels::COMMAND_BYTES;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Bluetooth RX task
#[embassy_executor::task]
pub async fn bluetooth_rx_task(mut rx: BufferedUartRx) {
    info!("Bluetooth RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    COMMAND_BYTES.send(byte).await;
                }
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
