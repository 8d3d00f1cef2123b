//! CAN Signal Decoder Library
//!
//! A stateless library for turning raw CAN frame payloads into typed, scaled
//! signal values using DBC-style signal definitions.
//!
//! # Architecture
//!
//! - [`bits`] extracts Intel or Motorola bit fields from a payload
//! - [`numeric`] sign-extends, reinterprets float bit patterns and scales
//! - [`multiplex`] decides whether a multiplexed signal exists in a frame
//! - [`SignalDecoder`] ties those together behind three entry points:
//!   `decode_as_text`, `decode_as_integer` and `decode_as_double`
//! - [`Decoder`] owns a [`SignalDatabase`] and maps whole frames to events
//!
//! The library does NOT:
//! - Parse DBC/ARXML files (the schema is built in memory by the caller)
//! - Encode values back into frames
//! - Read or capture frames from a bus or log file
//!
//! # Example Usage
//!
//! ```
//! use can_signal_decoder::{
//!     ByteOrder, CanFrame, Decoder, MessageDefinition, SignalDatabase, SignalDefinition,
//!     ValueKind,
//! };
//!
//! let mut db = SignalDatabase::new();
//! let msg = db.add_message(MessageDefinition::new(0x1F0, "Engine", 8)).unwrap();
//! let temp = db
//!     .add_signal(
//!         msg,
//!         SignalDefinition::new("Temperature", 0, 12)
//!             .with_byte_order(ByteOrder::Motorola)
//!             .with_kind(ValueKind::SignedInt)
//!             .with_scaling(0.01, 250.0)
//!             .with_unit("degK"),
//!     )
//!     .unwrap();
//!
//! let decoder = Decoder::new(db);
//! let frame = CanFrame::new(0x1F0, vec![0xA5, 0xB6, 0xD9, 0, 0, 0, 0, 0]);
//! let value = decoder.signals().decode_as_double(&frame, temp).unwrap();
//! assert!((value - 244.14).abs() < 1e-9);
//! ```

// Public modules
pub mod bits;
pub mod config;
pub mod decoder;
pub mod multiplex;
pub mod numeric;
pub mod signal_decoder;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::{Decoder, DecodingIterator};
pub use multiplex::MultiplexResolver;
pub use signal_decoder::SignalDecoder;
pub use signals::{
    AttributeData, AttributeValue, Attributes, ByteOrder, DatabaseStats, HasAttributes,
    MessageDefinition, MessageId, NodeDefinition, NodeId, SignalDatabase, SignalDefinition,
    SignalId, ValueKind,
};
pub use types::{
    CanFrame, DecodedEvent, DecodedSignal, DecoderError, Result, SignalValue, Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
