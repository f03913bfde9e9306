//! Bluetooth Serial Command Protocol
//!
//! This crate defines the text protocol spoken between the phone joypad
//! (through an HC-05 style Bluetooth bridge) and the rover's UART. Frames are
//! short, fixed-length and delimited:
//!
//! ```text
//! ┌───────┬──────────────────────────────┬─────┐
//! │ START │ PAYLOAD                      │ END │
//! │ '<'   │ fields separated by '#'      │ '>' │
//! └───────┴──────────────────────────────┴─────┘
//!
//! basic:     <CR#308>      direction = 308 / 2 - 101
//! extended:  <CR#308#1>    direction as above, directive = 20 - 1
//! joypad:    <19#210>      direction = 210 / 2 - 101, directive = 20 - 19
//! ```
//!
//! Decoding is split in two stages: [`FrameDecoder`] reassembles payloads
//! byte by byte, and [`CommandInterpreter`] turns a payload into a
//! [`SteeringDirective`]. [`ChannelRouter`] maps serial channel ids to
//! decoders so more than one link could be served.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod channel;
pub mod command;
pub mod frame;

pub use channel::{ChannelRouter, RegisterError, BLUETOOTH_CHANNEL, MAX_CHANNELS};
pub use command::{
    CommandInterpreter, ProtocolVariant, SteeringDirective, CURRENT_DIRECTION_TAG,
    FIELD_DELIMITER,
};
pub use frame::{FrameDecoder, Payload, END_MARKER, MAX_FRAME_LEN, MAX_PAYLOAD_LEN, START_MARKER};
