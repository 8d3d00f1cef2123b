//! Core types for the CAN signal decoder library
//!
//! This module defines the frame type the decoder reads, the error type every
//! decode path reports, and the decoded values the message-level API emits.
//! The decoder is stateless: it never mutates frames or schema entities.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::signals::ValueKind;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Raw CAN frame handed to the decoder by a capture/transport layer
///
/// Only `data` and `len` take part in signal decoding. The remaining fields are
/// transport metadata carried through to decoded events unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrame {
    /// Timestamp in nanoseconds since epoch
    pub timestamp_ns: u64,
    /// CAN channel number (e.g., 0, 1, 2...)
    pub channel: u8,
    /// CAN message ID (11-bit or 29-bit)
    pub can_id: u32,
    /// Frame data bytes (0-8 bytes for classic CAN, up to 64 for CAN-FD)
    pub data: Vec<u8>,
    /// Declared payload length in bytes (DLC converted to a byte count)
    pub len: usize,
    /// True if this is an extended (29-bit) CAN ID
    pub is_extended: bool,
    /// True if this is a CAN-FD frame
    pub is_fd: bool,
}

impl CanFrame {
    /// Create a frame whose declared length equals the payload size
    pub fn new(can_id: u32, data: Vec<u8>) -> Self {
        Self {
            timestamp_ns: 0,
            channel: 0,
            can_id,
            len: data.len(),
            data,
            is_extended: can_id > 0x7FF,
            is_fd: false,
        }
    }

    /// Builder method: override the declared length
    pub fn with_declared_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    /// Builder method: set channel and timestamp
    pub fn with_origin(mut self, channel: u8, timestamp_ns: u64) -> Self {
        self.channel = channel;
        self.timestamp_ns = timestamp_ns;
        self
    }

    /// Convert timestamp from nanoseconds to DateTime<Utc>
    pub fn timestamp(&self) -> Timestamp {
        let secs = (self.timestamp_ns / 1_000_000_000) as i64;
        let nsecs = (self.timestamp_ns % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs).unwrap_or_default()
    }

    /// Get the data length code (DLC) - declared number of data bytes
    pub fn dlc(&self) -> usize {
        self.len
    }

    /// Number of bytes that are both declared and actually present
    pub fn available_bytes(&self) -> usize {
        self.len.min(self.data.len())
    }

    /// Number of addressable bits, based on [`available_bytes`](Self::available_bytes)
    pub fn available_bits(&self) -> usize {
        self.available_bytes() * 8
    }

    /// The readable part of the payload
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.available_bytes()]
    }
}

/// Errors that can occur during decoding or while building a signal database
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecoderError {
    #[error("Signal '{0}' is not present in this frame (multiplexor mismatch)")]
    NotVisible(String),

    #[error("Signal '{signal}' needs {required_bits} bits but frame only has {available_bits}")]
    FrameTooShort {
        signal: String,
        required_bits: usize,
        available_bits: usize,
    },

    #[error("Signal '{signal}' of kind {kind} cannot be decoded as {operation}")]
    UnsupportedKind {
        signal: String,
        kind: ValueKind,
        operation: &'static str,
    },

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),
}

impl DecoderError {
    /// True for the outcomes that mean "value unavailable for this frame"
    ///
    /// Everything else is a fault in how the schema was built or addressed.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DecoderError::NotVisible(_)
                | DecoderError::FrameTooShort { .. }
                | DecoderError::UnsupportedKind { .. }
        )
    }
}

/// Main decoded event type - the output of the message-level API
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// A decoded CAN message with all of its visible signals
    Message {
        /// Absolute timestamp from the frame
        timestamp: Timestamp,
        /// CAN channel number (e.g., 0, 1, 2...)
        channel: u8,
        /// CAN message ID
        can_id: u32,
        /// Message name from the schema
        message_name: String,
        /// Sender node name (if the schema names one)
        sender: Option<String>,
        /// All signals that decoded successfully for this frame
        signals: Vec<DecodedSignal>,
        /// True if this message has a multiplex selector
        is_multiplexed: bool,
        /// Active selector value (if message is multiplexed and it decoded)
        multiplexer_value: Option<i32>,
    },

    /// A frame that did not match any message (or decoded to nothing)
    RawFrame {
        /// Absolute timestamp from the frame
        timestamp: Timestamp,
        /// CAN channel number
        channel: u8,
        /// CAN message ID
        can_id: u32,
        /// Raw data bytes
        data: Vec<u8>,
        /// True if this is a CAN-FD frame
        is_fd: bool,
    },
}

impl DecodedEvent {
    /// Get the timestamp of this event
    pub fn timestamp(&self) -> Timestamp {
        match self {
            DecodedEvent::Message { timestamp, .. } => *timestamp,
            DecodedEvent::RawFrame { timestamp, .. } => *timestamp,
        }
    }

    /// Get the CAN ID of this event
    pub fn can_id(&self) -> u32 {
        match self {
            DecodedEvent::Message { can_id, .. } => *can_id,
            DecodedEvent::RawFrame { can_id, .. } => *can_id,
        }
    }

    /// Find a decoded signal by name (message events only)
    pub fn signal(&self, name: &str) -> Option<&DecodedSignal> {
        match self {
            DecodedEvent::Message { signals, .. } => signals.iter().find(|s| s.name == name),
            DecodedEvent::RawFrame { .. } => None,
        }
    }
}

/// A decoded signal with its current value
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the schema
    pub name: String,
    /// Decoded value
    pub value: SignalValue,
    /// Engineering unit (e.g., "km/h", "°C", "V")
    pub unit: Option<String>,
    /// Value table description matching the truncated physical value
    pub value_description: Option<String>,
    /// Extracted bits before any interpretation (useful for debugging)
    pub raw_value: u64,
}

/// Signal value types produced by message decoding
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    /// Integer signal without scaling
    Integer(i64),
    /// Floating-point value (after scaling/bias)
    Float(f64),
    /// Single-bit signal without scaling
    Boolean(bool),
    /// Verbatim payload bytes of a string signal
    Text(String),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{:.3}", v),
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            SignalValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl SignalValue {
    /// Convert signal value to f64 (text values have no numeric form)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SignalValue::Integer(v) => Some(*v as f64),
            SignalValue::Float(v) => Some(*v),
            SignalValue::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            SignalValue::Text(_) => None,
        }
    }

    /// Convert signal value to i64 if possible, truncating floats toward zero
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SignalValue::Integer(v) => Some(*v),
            SignalValue::Float(v) => Some(*v as i64),
            SignalValue::Boolean(v) => Some(if *v { 1 } else { 0 }),
            SignalValue::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_value_conversions() {
        let int_val = SignalValue::Integer(42);
        assert_eq!(int_val.as_f64(), Some(42.0));
        assert_eq!(int_val.as_i64(), Some(42));

        let float_val = SignalValue::Float(-3.75);
        assert_eq!(float_val.as_f64(), Some(-3.75));
        assert_eq!(float_val.as_i64(), Some(-3));

        let bool_val = SignalValue::Boolean(true);
        assert_eq!(bool_val.as_f64(), Some(1.0));

        let text_val = SignalValue::Text("VIN".to_string());
        assert_eq!(text_val.as_f64(), None);
        assert_eq!(text_val.as_i64(), None);
    }

    #[test]
    fn test_signal_value_display() {
        assert_eq!(format!("{}", SignalValue::Integer(42)), "42");
        assert_eq!(format!("{}", SignalValue::Float(3.14159)), "3.142");
        assert_eq!(format!("{}", SignalValue::Boolean(true)), "true");
        assert_eq!(format!("{}", SignalValue::Text("AB".into())), "AB");
    }

    #[test]
    fn test_frame_available_length() {
        let frame = CanFrame::new(0x100, vec![1, 2, 3, 4]);
        assert_eq!(frame.dlc(), 4);
        assert_eq!(frame.available_bits(), 32);

        // Declared length shorter than the buffer limits what can be read
        let short = frame.clone().with_declared_len(2);
        assert_eq!(short.available_bytes(), 2);
        assert_eq!(short.payload(), &[1, 2]);

        // Declared length longer than the buffer never exposes missing bytes
        let lying = frame.with_declared_len(8);
        assert_eq!(lying.available_bytes(), 4);
    }

    #[test]
    fn test_frame_timestamp() {
        let frame = CanFrame::new(0x1, vec![]).with_origin(2, 1_500_000_000);
        assert_eq!(frame.channel, 2);
        assert_eq!(frame.timestamp().timestamp(), 1);
        assert_eq!(frame.timestamp().timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_error_classification() {
        assert!(DecoderError::NotVisible("Mode".into()).is_unavailable());
        assert!(DecoderError::FrameTooShort {
            signal: "Speed".into(),
            required_bits: 16,
            available_bits: 8,
        }
        .is_unavailable());
        assert!(!DecoderError::SignalNotFound("x".into()).is_unavailable());
    }
}
