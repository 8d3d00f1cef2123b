//! Signal database and attribute storage
//!
//! This module contains the in-memory schema graph (messages, signals, nodes)
//! that the decoder reads, and the attribute lists attached to each entity.

pub mod attributes;
pub mod database;

// Re-export key types for convenience
pub use attributes::{AttributeData, AttributeValue, Attributes, HasAttributes};
pub use database::{
    ByteOrder, DatabaseStats, MessageDefinition, MessageId, NodeDefinition, NodeId,
    SignalDatabase, SignalDefinition, SignalId, ValueKind,
};
