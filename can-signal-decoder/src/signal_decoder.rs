//! Signal Decoding Engine
//!
//! Extracts signal values from raw CAN frames based on the definitions in a
//! [`SignalDatabase`]. Every entry point first resolves multiplex visibility,
//! then checks that the frame is long enough, extracts the bits, interprets
//! them and applies scaling.
//!
//! Failures are reported as `Err`; any of [`DecoderError::NotVisible`],
//! [`DecoderError::FrameTooShort`] or [`DecoderError::UnsupportedKind`] means
//! "value unavailable for this frame", not a broken schema.

use crate::config::DecoderConfig;
use crate::multiplex::MultiplexResolver;
use crate::numeric;
use crate::signals::{MessageId, SignalDatabase, SignalDefinition, SignalId, ValueKind};
use crate::types::{CanFrame, DecodedEvent, DecodedSignal, DecoderError, Result, SignalValue};

/// Signal decoder - a read-only view over a database and a config
#[derive(Clone, Copy)]
pub struct SignalDecoder<'a> {
    db: &'a SignalDatabase,
    config: &'a DecoderConfig,
}

impl<'a> SignalDecoder<'a> {
    pub fn new(db: &'a SignalDatabase, config: &'a DecoderConfig) -> Self {
        Self { db, config }
    }

    pub fn database(&self) -> &'a SignalDatabase {
        self.db
    }

    pub fn config(&self) -> &'a DecoderConfig {
        self.config
    }

    /// True if the signal is present in this frame under multiplexing
    pub fn is_visible(&self, frame: &CanFrame, id: SignalId) -> bool {
        self.signal(id)
            .map(|signal| MultiplexResolver::new(self).is_visible(frame, signal))
            .unwrap_or(false)
    }

    /// Decode a signal into display text
    ///
    /// String signals are copied verbatim. Numeric signals are rendered as
    /// `"<name>: <description>"` when the value table has an entry for the
    /// truncated physical value, otherwise as `"<name>: <value><unit>"`.
    pub fn decode_as_text(&self, frame: &CanFrame, id: SignalId) -> Result<String> {
        let signal = self.signal(id)?;

        if signal.value_kind == ValueKind::StringBytes {
            return Ok(copy_string_bytes(frame, signal));
        }

        MultiplexResolver::new(self).check(frame, signal, 0)?;
        let (_, value) = self.numeric_value(frame, signal, "text")?;
        Ok(self.format_text(signal, value))
    }

    /// Decode an integer signal, truncating the physical value toward zero
    ///
    /// Only [`ValueKind::SignedInt`] and [`ValueKind::UnsignedInt`] signals are
    /// accepted. Values outside the `i32` range saturate.
    pub fn decode_as_integer(&self, frame: &CanFrame, id: SignalId) -> Result<i32> {
        self.integer_at_depth(frame, id, 0)
    }

    /// Decode any non-string signal into its physical value
    pub fn decode_as_double(&self, frame: &CanFrame, id: SignalId) -> Result<f64> {
        let signal = self.signal(id)?;

        if signal.value_kind == ValueKind::StringBytes {
            return Err(unsupported(signal, "double"));
        }

        MultiplexResolver::new(self).check(frame, signal, 0)?;
        let (_, value) = self.numeric_value(frame, signal, "double")?;
        Ok(value)
    }

    /// Decode every visible signal of a message
    ///
    /// Signals that are unavailable in this frame are skipped.
    ///
    /// # Returns
    /// * `Some(DecodedEvent::Message)` if at least one signal decoded
    /// * `None` if the message is unknown or no signal could be decoded
    pub fn decode_message(&self, frame: &CanFrame, message_id: MessageId) -> Option<DecodedEvent> {
        let message = self.db.message(message_id)?;

        let multiplexer_value = message
            .multiplexor()
            .and_then(|selector| self.decode_as_integer(frame, selector).ok());

        let mut decoded_signals = Vec::new();
        for (id, signal) in self.db.signals_of(message_id) {
            match self.decode_signal(frame, id, signal) {
                Ok(decoded) => decoded_signals.push(decoded),
                Err(e) => log::debug!("Skipping '{}' in '{}': {}", signal.name, message.name, e),
            }
        }

        // Only emit event if we decoded at least one signal
        if decoded_signals.is_empty() {
            return None;
        }

        Some(DecodedEvent::Message {
            timestamp: frame.timestamp(),
            channel: frame.channel,
            can_id: frame.can_id,
            message_name: message.name.clone(),
            sender: message
                .sender
                .and_then(|node| self.db.node(node))
                .map(|node| node.name.clone()),
            signals: decoded_signals,
            is_multiplexed: message.multiplexor().is_some(),
            multiplexer_value,
        })
    }

    /// Integer decode that knows how deep in a selector chain it is
    pub(crate) fn integer_at_depth(&self, frame: &CanFrame, id: SignalId, depth: usize) -> Result<i32> {
        let signal = self.signal(id)?;

        if !signal.value_kind.is_integer() {
            return Err(unsupported(signal, "integer"));
        }

        MultiplexResolver::new(self).check(frame, signal, depth)?;
        let (_, value) = self.numeric_value(frame, signal, "integer")?;
        Ok(value as i32)
    }

    fn signal(&self, id: SignalId) -> Result<&'a SignalDefinition> {
        self.db
            .signal(id)
            .ok_or_else(|| DecoderError::SignalNotFound(format!("{:?}", id)))
    }

    /// Length check, extraction and interpretation; returns (raw, physical)
    fn numeric_value(
        &self,
        frame: &CanFrame,
        signal: &SignalDefinition,
        operation: &'static str,
    ) -> Result<(u64, f64)> {
        let required_bits =
            numeric::required_bits(signal).ok_or_else(|| unsupported(signal, operation))?;
        let available_bits = frame.available_bits();
        if available_bits < required_bits {
            log::trace!(
                "Signal '{}' requires {} bits but frame 0x{:X} only has {}",
                signal.name,
                required_bits,
                frame.can_id,
                available_bits
            );
            return Err(DecoderError::FrameTooShort {
                signal: signal.name.clone(),
                required_bits,
                available_bits,
            });
        }

        let raw = numeric::extract_raw(frame.payload(), signal)
            .ok_or_else(|| unsupported(signal, operation))?;
        let value = numeric::physical_value(raw, signal)
            .ok_or_else(|| unsupported(signal, operation))?;
        Ok((raw, value))
    }

    fn format_text(&self, signal: &SignalDefinition, value: f64) -> String {
        if let Some(description) = describe(signal, value) {
            return format!("{}: {}", signal.name, description);
        }
        format!(
            "{}: {:.*}{}",
            signal.name, self.config.text_precision, value, signal.unit
        )
    }

    /// Decode a single signal for the message-level API
    fn decode_signal(
        &self,
        frame: &CanFrame,
        id: SignalId,
        signal: &SignalDefinition,
    ) -> Result<DecodedSignal> {
        let unit = (!signal.unit.is_empty()).then(|| signal.unit.clone());
        MultiplexResolver::new(self).check(frame, signal, 0)?;

        if signal.value_kind == ValueKind::StringBytes {
            return Ok(DecodedSignal {
                name: signal.name.clone(),
                value: SignalValue::Text(self.decode_as_text(frame, id)?),
                unit,
                value_description: None,
                raw_value: 0,
            });
        }

        let (raw_value, physical) = self.numeric_value(frame, signal, "message")?;

        let unscaled = signal.factor == 1.0 && signal.offset == 0.0;
        let value = match signal.value_kind {
            ValueKind::UnsignedInt | ValueKind::SignedInt if unscaled && signal.length == 1 => {
                SignalValue::Boolean(raw_value != 0)
            }
            ValueKind::SignedInt if unscaled => {
                SignalValue::Integer(numeric::sign_extend(raw_value, signal.length as usize))
            }
            ValueKind::UnsignedInt if unscaled => SignalValue::Integer(raw_value as i64),
            _ => SignalValue::Float(physical),
        };

        Ok(DecodedSignal {
            name: signal.name.clone(),
            value,
            unit,
            value_description: describe(signal, physical).map(str::to_string),
            raw_value,
        })
    }
}

/// Value table lookup on the truncated physical value
fn describe(signal: &SignalDefinition, value: f64) -> Option<&str> {
    if signal.value_table.is_empty() || !value.is_finite() {
        return None;
    }
    signal.describe(value as i64)
}

/// Verbatim byte copy used by string signals
///
/// This path deliberately skips multiplex and length checks: it copies
/// `length / 8` bytes from byte `start_bit / 8`, one Latin-1 char per byte, and
/// simply stops at the end of the payload.
fn copy_string_bytes(frame: &CanFrame, signal: &SignalDefinition) -> String {
    let start_byte = signal.start_bit as usize / 8;
    let byte_count = signal.length as usize / 8;

    frame
        .data
        .iter()
        .skip(start_byte)
        .take(byte_count)
        .map(|&b| b as char)
        .collect()
}

fn unsupported(signal: &SignalDefinition, operation: &'static str) -> DecoderError {
    DecoderError::UnsupportedKind {
        signal: signal.name.clone(),
        kind: signal.value_kind,
        operation,
    }
}
