//! Frame reassembly for the Bluetooth serial link.
//!
//! Frame format:
//! - START (1 byte): `'<'`
//! - PAYLOAD (frame length - 1 bytes): ASCII fields separated by `'#'`
//! - END (1 byte): `'>'`
//!
//! The frame length of a protocol variant counts the start marker and the
//! payload, i.e. everything that has been accumulated when the end marker
//! arrives. `<CR#308>` is a 7-byte frame.

use heapless::{String, Vec};

/// Frame start marker
pub const START_MARKER: u8 = b'<';

/// Frame end marker
pub const END_MARKER: u8 = b'>';

/// Largest frame length any decoder accepts (start marker + payload)
pub const MAX_FRAME_LEN: usize = 16;

/// Largest payload a frame can carry
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - 1;

/// A completed frame payload, markers excluded
pub type Payload = String<MAX_PAYLOAD_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum DecodeState {
    /// No frame open, waiting for START
    Idle,
    /// Got START, accumulating payload bytes
    Collecting,
}

/// State machine reassembling fixed-length frames
///
/// Malformed input never surfaces as an error: overlong frames, frames closed
/// at the wrong length and payloads that are not UTF-8 are dropped and the
/// decoder goes back to waiting for a start marker.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecodeState,
    buffer: Vec<u8, MAX_PAYLOAD_LEN>,
    frame_len: usize,
}

impl FrameDecoder {
    /// Create a decoder for frames of `frame_len` bytes
    ///
    /// The length is clamped to `2..=MAX_FRAME_LEN`.
    pub fn new(frame_len: usize) -> Self {
        Self {
            state: DecodeState::Idle,
            buffer: Vec::new(),
            frame_len: frame_len.clamp(2, MAX_FRAME_LEN),
        }
    }

    /// Expected frame length
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Whether a frame is currently open
    pub fn is_collecting(&self) -> bool {
        self.state == DecodeState::Collecting
    }

    /// Bytes accumulated for the open frame, start marker included
    pub fn accumulated_len(&self) -> usize {
        match self.state {
            DecodeState::Idle => 0,
            DecodeState::Collecting => 1 + self.buffer.len(),
        }
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.state = DecodeState::Idle;
        self.buffer.clear();
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns the payload when `byte` closes a frame of the expected length.
    pub fn feed(&mut self, byte: u8) -> Option<Payload> {
        // A start marker always opens a fresh frame, even mid-frame
        if byte == START_MARKER {
            self.buffer.clear();
            self.state = DecodeState::Collecting;
            return None;
        }

        match self.state {
            DecodeState::Idle => None,
            DecodeState::Collecting if byte == END_MARKER => {
                let complete = self.accumulated_len() == self.frame_len;
                let bytes = core::mem::take(&mut self.buffer);
                self.reset();
                if complete {
                    String::from_utf8(bytes).ok()
                } else {
                    None
                }
            }
            DecodeState::Collecting => {
                if self.accumulated_len() >= self.frame_len || self.buffer.push(byte).is_err() {
                    self.reset();
                }
                None
            }
        }
    }

    /// Feed multiple bytes to the decoder
    ///
    /// Returns the first complete payload found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Option<Payload> {
        bytes.iter().find_map(|&byte| self.feed(byte))
    }
}
