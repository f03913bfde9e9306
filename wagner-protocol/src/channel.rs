//! Serial channel routing
//!
//! Each serial link is identified by a small channel number. The router keeps
//! one [`FrameDecoder`] per registered channel; bytes arriving on an
//! unregistered channel are dropped.

use heapless::LinearMap;

use crate::frame::{FrameDecoder, Payload};

/// Channel number of the Bluetooth bridge UART
pub const BLUETOOTH_CHANNEL: u8 = 0;

/// Maximum number of channels a router can serve
pub const MAX_CHANNELS: usize = 4;

/// Channel is already registered or the router is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterError {
    pub channel: u8,
}

/// Map from channel number to frame decoder
#[derive(Debug, Clone, Default)]
pub struct ChannelRouter {
    decoders: LinearMap<u8, FrameDecoder, MAX_CHANNELS>,
}

impl ChannelRouter {
    /// Create a router with no channels
    pub fn new() -> Self {
        Self {
            decoders: LinearMap::new(),
        }
    }

    /// Create a router serving only the Bluetooth channel
    pub fn bluetooth(frame_len: usize) -> Self {
        let mut router = Self::new();
        // An empty router always has room for one channel
        let _ = router.register(BLUETOOTH_CHANNEL, FrameDecoder::new(frame_len));
        router
    }

    /// Register a decoder for a channel
    pub fn register(&mut self, channel: u8, decoder: FrameDecoder) -> Result<(), RegisterError> {
        if self.decoders.contains_key(&channel) {
            return Err(RegisterError { channel });
        }
        self.decoders
            .insert(channel, decoder)
            .map(|_| ())
            .map_err(|_| RegisterError { channel })
    }

    /// Whether a channel has a decoder
    pub fn is_registered(&self, channel: u8) -> bool {
        self.decoders.contains_key(&channel)
    }

    /// Number of registered channels
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether no channel is registered
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Feed one byte received on `channel`
    ///
    /// Returns a payload when the byte completes a frame on that channel.
    pub fn on_byte(&mut self, channel: u8, byte: u8) -> Option<Payload> {
        self.decoders.get_mut(&channel)?.feed(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bluetooth_router_decodes() {
        let mut router = ChannelRouter::bluetooth(7);
        let payload = b"<CR#308>"
            .iter()
            .find_map(|&b| router.on_byte(BLUETOOTH_CHANNEL, b))
            .unwrap();
        assert_eq!(payload.as_str(), "CR#308");
    }

    #[test]
    fn test_unknown_channel_is_ignored() {
        let mut router = ChannelRouter::bluetooth(7);
        for &b in b"<CR#308>" {
            assert!(router.on_byte(3, b).is_none());
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut router = ChannelRouter::new();
        router.register(0, FrameDecoder::new(7)).unwrap();
        router.register(1, FrameDecoder::new(9)).unwrap();

        // Interleave two frames byte by byte
        let a = b"<CR#308>";
        let b = b"<CR#204#1>";
        let mut got_a = None;
        let mut got_b = None;
        for i in 0..b.len() {
            if let Some(&byte) = a.get(i) {
                got_a = got_a.or(router.on_byte(0, byte));
            }
            got_b = got_b.or(router.on_byte(1, b[i]));
        }
        assert_eq!(got_a.unwrap().as_str(), "CR#308");
        assert_eq!(got_b.unwrap().as_str(), "CR#204#1");
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut router = ChannelRouter::bluetooth(7);
        assert_eq!(
            router.register(BLUETOOTH_CHANNEL, FrameDecoder::new(9)),
            Err(RegisterError { channel: 0 })
        );
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_router_capacity() {
        let mut router = ChannelRouter::new();
        for channel in 0..MAX_CHANNELS as u8 {
            router.register(channel, FrameDecoder::new(7)).unwrap();
        }
        assert!(router.register(99, FrameDecoder::new(7)).is_err());
    }
}
