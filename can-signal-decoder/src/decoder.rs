//! Main decoder API
//!
//! The [`Decoder`] owns a fully built [`SignalDatabase`] and a
//! [`DecoderConfig`]. It maps frames to messages by CAN ID and hands out
//! [`SignalDecoder`] views for signal-level access.

use crate::config::DecoderConfig;
use crate::signal_decoder::SignalDecoder;
use crate::signals::{DatabaseStats, SignalDatabase, SignalId};
use crate::types::{CanFrame, DecodedEvent, Result};

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    /// Schema graph, read-only once the decoder exists
    signal_db: SignalDatabase,
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder over a built database with default settings
    ///
    /// # Example
    /// ```
    /// use can_signal_decoder::{CanFrame, Decoder, MessageDefinition, SignalDatabase, SignalDefinition};
    ///
    /// let mut db = SignalDatabase::new();
    /// let msg = db.add_message(MessageDefinition::new(0x100, "Status", 8)).unwrap();
    /// let state = db
    ///     .add_signal(msg, SignalDefinition::new("State", 0, 8).with_value(1, "ON"))
    ///     .unwrap();
    ///
    /// let decoder = Decoder::new(db);
    /// let frame = CanFrame::new(0x100, vec![1]);
    /// assert_eq!(decoder.signals().decode_as_text(&frame, state).unwrap(), "State: ON");
    /// ```
    pub fn new(signal_db: SignalDatabase) -> Self {
        Self::with_config(signal_db, DecoderConfig::default())
    }

    /// Create a decoder with an explicit configuration
    pub fn with_config(signal_db: SignalDatabase, config: DecoderConfig) -> Self {
        let stats = signal_db.stats();
        log::info!(
            "Decoder ready: {} messages, {} signals, {} nodes",
            stats.num_messages,
            stats.num_signals,
            stats.num_nodes
        );
        Self { signal_db, config }
    }

    /// Signal-level decoding view
    pub fn signals(&self) -> SignalDecoder<'_> {
        SignalDecoder::new(&self.signal_db, &self.config)
    }

    pub fn database(&self) -> &SignalDatabase {
        &self.signal_db
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Convenience lookup of a signal handle by CAN ID and signal name
    pub fn find_signal(&self, can_id: u32, name: &str) -> Option<SignalId> {
        let message = self.signal_db.find_message(can_id)?;
        self.signal_db.find_signal(message, name)
    }

    /// Decode a single frame
    ///
    /// # Returns
    /// * `Some(DecodedEvent::Message)` if the CAN ID is known and something decoded
    /// * `Some(DecodedEvent::RawFrame)` otherwise, when raw frames are enabled
    /// * `None` if the frame is filtered out, or is raw and raw frames are disabled
    pub fn decode_frame(&self, frame: &CanFrame) -> Option<DecodedEvent> {
        if !self.config.should_process_frame(frame.channel, frame.can_id) {
            log::trace!("Filtered frame 0x{:X} on channel {}", frame.can_id, frame.channel);
            return None;
        }

        if let Some(message_id) = self.signal_db.find_message(frame.can_id) {
            log::debug!("Decoding message ID 0x{:X}", frame.can_id);
            if let Some(event) = self.signals().decode_message(frame, message_id) {
                return Some(event);
            }
            log::warn!("Failed to decode message 0x{:X}, emitting as raw frame", frame.can_id);
        } else {
            log::trace!("Unknown CAN ID: 0x{:X}", frame.can_id);
        }

        self.config.emit_raw_frames.then(|| DecodedEvent::RawFrame {
            timestamp: frame.timestamp(),
            channel: frame.channel,
            can_id: frame.can_id,
            data: frame.data.clone(),
            is_fd: frame.is_fd,
        })
    }

    /// Lazily decode a stream of frames
    ///
    /// Errors from the frame source are passed through untouched.
    pub fn decode_frames<'a, I>(&'a self, frames: I) -> DecodingIterator<'a, I::IntoIter>
    where
        I: IntoIterator<Item = Result<CanFrame>>,
    {
        DecodingIterator {
            frame_iter: frames.into_iter(),
            decoder: self,
        }
    }

    /// Get statistics about the loaded signal database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }
}

/// Iterator that decodes CAN frames into decoded events
///
/// Frames the decoder drops (filtered, or raw with raw frames disabled) are
/// skipped.
pub struct DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<CanFrame>>,
{
    frame_iter: I,
    decoder: &'a Decoder,
}

impl<'a, I> Iterator for DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<CanFrame>>,
{
    type Item = Result<DecodedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.frame_iter.next()? {
                Ok(frame) => {
                    if let Some(event) = self.decoder.decode_frame(&frame) {
                        return Some(Ok(event));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{MessageDefinition, SignalDefinition};
    use crate::types::DecoderError;

    fn decoder_with(config: DecoderConfig) -> Decoder {
        let mut db = SignalDatabase::new();
        let msg = db.add_message(MessageDefinition::new(0x123, "Speed", 8)).unwrap();
        db.add_signal(msg, SignalDefinition::new("Kph", 0, 16).with_scaling(0.01, 0.0))
            .unwrap();
        Decoder::with_config(db, config)
    }

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new(SignalDatabase::new());
        let stats = decoder.database_stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
    }

    #[test]
    fn test_known_frame_decodes() {
        let decoder = decoder_with(DecoderConfig::default());
        let event = decoder
            .decode_frame(&CanFrame::new(0x123, vec![0x10, 0x27]))
            .unwrap();
        assert!(matches!(event, DecodedEvent::Message { .. }));
        assert_eq!(event.can_id(), 0x123);

        let kph = decoder.find_signal(0x123, "Kph").unwrap();
        let value = decoder
            .signals()
            .decode_as_double(&CanFrame::new(0x123, vec![0x10, 0x27]), kph)
            .unwrap();
        assert!((value - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_frame_is_raw() {
        let decoder = decoder_with(DecoderConfig::default());
        let event = decoder.decode_frame(&CanFrame::new(0x7FF, vec![1, 2])).unwrap();
        assert_eq!(
            event,
            DecodedEvent::RawFrame {
                timestamp: CanFrame::new(0, vec![]).timestamp(),
                channel: 0,
                can_id: 0x7FF,
                data: vec![1, 2],
                is_fd: false,
            }
        );

        let quiet = decoder_with(DecoderConfig::default().with_raw_frames(false));
        assert!(quiet.decode_frame(&CanFrame::new(0x7FF, vec![1, 2])).is_none());
    }

    #[test]
    fn test_short_known_frame_falls_back_to_raw() {
        let decoder = decoder_with(DecoderConfig::default());
        let event = decoder.decode_frame(&CanFrame::new(0x123, vec![1])).unwrap();
        assert!(matches!(event, DecodedEvent::RawFrame { .. }));
    }

    #[test]
    fn test_decode_frames_applies_filters() {
        let decoder = decoder_with(
            DecoderConfig::default()
                .with_channel_filter(vec![1])
                .with_raw_frames(false),
        );
        let frames = vec![
            Ok(CanFrame::new(0x123, vec![1, 0]).with_origin(0, 10)),
            Ok(CanFrame::new(0x123, vec![2, 0]).with_origin(1, 20)),
            Err(DecoderError::InvalidSignalDefinition("source failed".into())),
            Ok(CanFrame::new(0x555, vec![3, 0]).with_origin(1, 30)),
        ];

        let events: Vec<_> = decoder.decode_frames(frames).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].as_ref().unwrap().signal("Kph").unwrap().raw_value,
            2
        );
        assert!(events[1].is_err());
    }
}
