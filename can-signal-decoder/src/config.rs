//! Decoder configuration types
//!
//! This module defines the small set of knobs the decoder exposes. Everything
//! has a default, so an empty config (or an empty JSON/TOML table) is valid.

use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// How many selector hops multiplex resolution may follow before the
    /// signal is treated as absent (guards against selector cycles)
    #[serde(default = "default_max_multiplex_depth")]
    pub max_multiplex_depth: usize,

    /// Decimal places used when formatting numeric values as text
    #[serde(default = "default_text_precision")]
    pub text_precision: usize,

    /// Whether frames without a known message are emitted as raw frames
    #[serde(default = "default_true")]
    pub emit_raw_frames: bool,

    /// Optional: only decode messages from these CAN channels
    #[serde(default)]
    pub channel_filter: Option<Vec<u8>>,

    /// Optional: only decode these specific CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

fn default_max_multiplex_depth() -> usize {
    8
}

fn default_text_precision() -> usize {
    6
}

fn default_true() -> bool {
    true
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_multiplex_depth: default_max_multiplex_depth(),
            text_precision: default_text_precision(),
            emit_raw_frames: true,
            channel_filter: None,
            message_filter: None,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the multiplex recursion limit
    pub fn with_max_multiplex_depth(mut self, depth: usize) -> Self {
        self.max_multiplex_depth = depth;
        self
    }

    /// Builder method: set text formatting precision
    pub fn with_text_precision(mut self, precision: usize) -> Self {
        self.text_precision = precision;
        self
    }

    /// Builder method: enable or disable raw frame emission
    pub fn with_raw_frames(mut self, enabled: bool) -> Self {
        self.emit_raw_frames = enabled;
        self
    }

    /// Builder method: set channel filter
    pub fn with_channel_filter(mut self, channels: Vec<u8>) -> Self {
        self.channel_filter = Some(channels);
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Check if a channel should be processed
    pub fn should_process_channel(&self, channel: u8) -> bool {
        match &self.channel_filter {
            Some(channels) => channels.contains(&channel),
            None => true,
        }
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }

    /// Check if a frame should be processed based on filters
    pub fn should_process_frame(&self, channel: u8, can_id: u32) -> bool {
        self.should_process_channel(channel) && self.should_process_message(can_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_max_multiplex_depth(2)
            .with_text_precision(3)
            .with_raw_frames(false)
            .with_channel_filter(vec![0, 1]);

        assert_eq!(config.max_multiplex_depth, 2);
        assert_eq!(config.text_precision, 3);
        assert!(!config.emit_raw_frames);
        assert_eq!(config.channel_filter, Some(vec![0, 1]));
    }

    #[test]
    fn test_filter_logic() {
        let config = DecoderConfig::new()
            .with_channel_filter(vec![0, 1])
            .with_message_filter(vec![0x123, 0x456]);

        assert!(config.should_process_frame(0, 0x123));
        assert!(config.should_process_frame(1, 0x456));
        assert!(!config.should_process_frame(2, 0x123)); // Wrong channel
        assert!(!config.should_process_frame(0, 0x789)); // Wrong message
    }

    #[test]
    fn test_no_filters() {
        let config = DecoderConfig::new();

        // Without filters, everything should pass
        assert!(config.should_process_frame(0, 0x123));
        assert!(config.should_process_frame(99, 0xFFFFFFFF));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: DecoderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DecoderConfig::default());
        assert_eq!(config.max_multiplex_depth, 8);
        assert_eq!(config.text_precision, 6);
        assert!(config.emit_raw_frames);

        let config: DecoderConfig =
            serde_json::from_str(r#"{"text_precision": 2, "message_filter": [256]}"#).unwrap();
        assert_eq!(config.text_precision, 2);
        assert_eq!(config.message_filter, Some(vec![256]));
        assert_eq!(config.max_multiplex_depth, 8);
    }
}
