//! Multiplex visibility
//!
//! A multiplexed signal exists in a frame only while the selector signal of
//! its message holds the signal's required value. The selector is decoded
//! through the integer path, which resolves the selector's own visibility in
//! turn, so resolution can chain. The chain is cut at
//! [`DecoderConfig::max_multiplex_depth`](crate::DecoderConfig) hops.

use crate::signal_decoder::SignalDecoder;
use crate::signals::SignalDefinition;
use crate::types::{CanFrame, DecoderError, Result};

/// Resolves whether signals are present in a given frame
pub struct MultiplexResolver<'d, 'a> {
    decoder: &'d SignalDecoder<'a>,
}

impl<'d, 'a> MultiplexResolver<'d, 'a> {
    pub fn new(decoder: &'d SignalDecoder<'a>) -> Self {
        Self { decoder }
    }

    /// True if the signal is present in this frame
    pub fn is_visible(&self, frame: &CanFrame, signal: &SignalDefinition) -> bool {
        self.check(frame, signal, 0).is_ok()
    }

    /// Visibility check at a given selector depth
    ///
    /// Returns `Err(NotVisible)` if the signal is multiplexed and its message
    /// has no selector, the selector cannot be decoded, its value differs, or
    /// the depth limit is reached.
    pub(crate) fn check(&self, frame: &CanFrame, signal: &SignalDefinition, depth: usize) -> Result<()> {
        if !signal.multiplexed {
            return Ok(());
        }

        let not_visible = || DecoderError::NotVisible(signal.name.clone());

        let max_depth = self.decoder.config().max_multiplex_depth;
        if depth >= max_depth {
            log::warn!(
                "Multiplexor chain for signal '{}' exceeds {} levels, treating it as absent",
                signal.name,
                max_depth
            );
            return Err(not_visible());
        }

        let selector = signal
            .message()
            .and_then(|id| self.decoder.database().message(id))
            .and_then(|message| message.multiplexor())
            .ok_or_else(|| {
                log::trace!("Signal '{}' is multiplexed but has no selector", signal.name);
                not_visible()
            })?;

        let value = self
            .decoder
            .integer_at_depth(frame, selector, depth + 1)
            .map_err(|e| {
                log::trace!("Selector for '{}' unavailable: {}", signal.name, e);
                not_visible()
            })?;

        if value == signal.multiplex_value {
            Ok(())
        } else {
            log::trace!(
                "Signal '{}' needs selector {} but frame carries {}",
                signal.name,
                signal.multiplex_value,
                value
            );
            Err(not_visible())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;
    use crate::signals::{MessageDefinition, SignalDatabase, SignalDefinition};

    fn mux_database() -> (SignalDatabase, crate::signals::SignalId, crate::signals::SignalId) {
        let mut db = SignalDatabase::new();
        let msg = db.add_message(MessageDefinition::new(0x200, "Mux", 8)).unwrap();
        let mode = db.add_signal(msg, SignalDefinition::new("Mode", 0, 8)).unwrap();
        let page2 = db
            .add_signal(msg, SignalDefinition::new("Page2", 8, 8).multiplexed_on(2))
            .unwrap();
        db.set_multiplexor(msg, mode).unwrap();
        (db, mode, page2)
    }

    #[test]
    fn test_plain_signal_always_visible() {
        let (db, mode, _) = mux_database();
        let config = DecoderConfig::default();
        let decoder = SignalDecoder::new(&db, &config);
        let resolver = MultiplexResolver::new(&decoder);
        let frame = CanFrame::new(0x200, vec![]);
        assert!(resolver.is_visible(&frame, db.signal(mode).unwrap()));
    }

    #[test]
    fn test_selector_value_controls_visibility() {
        let (db, _, page2) = mux_database();
        let config = DecoderConfig::default();
        let decoder = SignalDecoder::new(&db, &config);
        let resolver = MultiplexResolver::new(&decoder);
        let signal = db.signal(page2).unwrap();

        assert!(!resolver.is_visible(&CanFrame::new(0x200, vec![1, 0x55]), signal));
        assert!(resolver.is_visible(&CanFrame::new(0x200, vec![2, 0x55]), signal));
        // Selector cannot be read from an empty frame
        assert!(!resolver.is_visible(&CanFrame::new(0x200, vec![]), signal));
    }

    #[test]
    fn test_missing_selector_means_absent() {
        let mut db = SignalDatabase::new();
        let msg = db.add_message(MessageDefinition::new(0x201, "NoSel", 8)).unwrap();
        let orphan = db
            .add_signal(msg, SignalDefinition::new("Orphan", 0, 8).multiplexed_on(0))
            .unwrap();
        let config = DecoderConfig::default();
        let decoder = SignalDecoder::new(&db, &config);
        let resolver = MultiplexResolver::new(&decoder);

        let err = resolver
            .check(&CanFrame::new(0x201, vec![0; 8]), db.signal(orphan).unwrap(), 0)
            .unwrap_err();
        assert_eq!(err, DecoderError::NotVisible("Orphan".into()));
    }

    #[test]
    fn test_self_selecting_signal_terminates() {
        let mut db = SignalDatabase::new();
        let msg = db.add_message(MessageDefinition::new(0x202, "Loop", 8)).unwrap();
        let looped = db
            .add_signal(msg, SignalDefinition::new("Loop", 0, 8).multiplexed_on(0))
            .unwrap();
        db.set_multiplexor(msg, looped).unwrap();

        let config = DecoderConfig::default().with_max_multiplex_depth(4);
        let decoder = SignalDecoder::new(&db, &config);
        let resolver = MultiplexResolver::new(&decoder);
        assert!(!resolver.is_visible(&CanFrame::new(0x202, vec![0; 8]), db.signal(looped).unwrap()));
    }
}
