//! Signal database
//!
//! Arena that owns every message, signal and node of a schema. Entities refer
//! to each other through the copyable handles [`MessageId`], [`SignalId`] and
//! [`NodeId`], so a signal can point back at its message and a message at its
//! multiplex selector without any ownership cycle.
//!
//! The database is filled once by whoever parses the schema and is read-only
//! while decoding.

use crate::signals::attributes::{AttributeValue, Attributes, HasAttributes};
use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Handle to a message in a [`SignalDatabase`]
///
/// Handles are plain indices and do not remember which database issued them.
/// Only pass a handle to the database it came from: a foreign handle that is
/// in range resolves to an unrelated entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(usize);

/// Handle to a signal in a [`SignalDatabase`]
///
/// Same provenance rule as [`MessageId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(usize);

/// Handle to a node in a [`SignalDatabase`]
///
/// Same provenance rule as [`MessageId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Bit numbering convention of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Little-endian: count upward from the start bit, first bit is the LSB
    Intel,
    /// Big-endian: count downward within a byte, first bit is the MSB
    Motorola,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Intel => write!(f, "Intel"),
            ByteOrder::Motorola => write!(f, "Motorola"),
        }
    }
}

/// How the extracted bits of a signal are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Two's complement integer, sign bit is the top bit of the field
    SignedInt,
    /// Plain unsigned integer
    UnsignedInt,
    /// IEEE-754 single precision bit pattern
    SpFloat,
    /// IEEE-754 double precision bit pattern
    DpFloat,
    /// Raw payload bytes copied verbatim
    StringBytes,
}

impl ValueKind {
    pub fn is_integer(self) -> bool {
        matches!(self, ValueKind::SignedInt | ValueKind::UnsignedInt)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::SignedInt => write!(f, "SignedInt"),
            ValueKind::UnsignedInt => write!(f, "UnsignedInt"),
            ValueKind::SpFloat => write!(f, "SpFloat"),
            ValueKind::DpFloat => write!(f, "DpFloat"),
            ValueKind::StringBytes => write!(f, "StringBytes"),
        }
    }
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Start bit in sawtooth numbering (bit 0 = LSB of byte 0)
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    /// Bit numbering convention
    pub byte_order: ByteOrder,
    /// Interpretation of the extracted bits
    pub value_kind: ValueKind,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Bias added after scaling
    pub offset: f64,
    /// Engineering unit appended to text output (may be empty)
    pub unit: String,
    /// Value table, searched in order (raw key -> description)
    pub value_table: Vec<(i64, String)>,
    /// True if the signal is only present for one selector value
    pub multiplexed: bool,
    /// Selector value under which this signal is present
    pub multiplex_value: i32,
    /// Signal attributes
    pub attributes: Attributes,
    /// Owning message, set when the signal is added to a database
    message: Option<MessageId>,
}

impl SignalDefinition {
    /// Create an unsigned Intel signal with unit scaling
    pub fn new(name: impl Into<String>, start_bit: u16, length: u16) -> Self {
        Self {
            name: name.into(),
            start_bit,
            length,
            byte_order: ByteOrder::Intel,
            value_kind: ValueKind::UnsignedInt,
            factor: 1.0,
            offset: 0.0,
            unit: String::new(),
            value_table: Vec::new(),
            multiplexed: false,
            multiplex_value: 0,
            attributes: Attributes::new(),
            message: None,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }

    pub fn with_scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Append a value table entry
    pub fn with_value(mut self, raw: i64, description: impl Into<String>) -> Self {
        self.value_table.push((raw, description.into()));
        self
    }

    /// Mark the signal as present only when the message selector equals `value`
    pub fn multiplexed_on(mut self, value: i32) -> Self {
        self.multiplexed = true;
        self.multiplex_value = value;
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeValue) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// The message this signal belongs to
    pub fn message(&self) -> Option<MessageId> {
        self.message
    }

    /// Look up a value table description by raw key
    pub fn describe(&self, key: i64) -> Option<&str> {
        self.value_table
            .iter()
            .find(|(raw, _)| *raw == key)
            .map(|(_, description)| description.as_str())
    }
}

impl HasAttributes for SignalDefinition {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// A complete CAN message definition
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    /// CAN message ID
    pub id: u32,
    /// Message name
    pub name: String,
    /// Message size in bytes
    pub size: usize,
    /// Sending node (optional)
    pub sender: Option<NodeId>,
    /// Message attributes
    pub attributes: Attributes,
    signals: Vec<SignalId>,
    multiplexor: Option<SignalId>,
}

impl MessageDefinition {
    pub fn new(id: u32, name: impl Into<String>, size: usize) -> Self {
        Self {
            id,
            name: name.into(),
            size,
            sender: None,
            attributes: Attributes::new(),
            signals: Vec::new(),
            multiplexor: None,
        }
    }

    pub fn with_sender(mut self, sender: NodeId) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeValue) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Signals of this message in definition order
    pub fn signals(&self) -> &[SignalId] {
        &self.signals
    }

    /// The selector signal that drives multiplexing, if any
    pub fn multiplexor(&self) -> Option<SignalId> {
        self.multiplexor
    }
}

impl HasAttributes for MessageDefinition {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// A sender/receiver node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDefinition {
    pub name: String,
    pub attributes: Attributes,
}

impl NodeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeValue) -> Self {
        self.attributes.push(attribute);
        self
    }
}

impl HasAttributes for NodeDefinition {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// The schema graph
#[derive(Debug, Default)]
pub struct SignalDatabase {
    messages: Vec<MessageDefinition>,
    signals: Vec<SignalDefinition>,
    nodes: Vec<NodeDefinition>,

    /// Key: CAN ID, Value: message handle
    message_lookup: HashMap<u32, MessageId>,
}

impl SignalDatabase {
    /// Create a new empty signal database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its handle
    pub fn add_node(&mut self, node: NodeDefinition) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add a message definition; CAN IDs must be unique
    pub fn add_message(&mut self, message: MessageDefinition) -> Result<MessageId> {
        if let Some(existing) = self.message_lookup.get(&message.id) {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "CAN ID 0x{:X} of '{}' is already used by '{}'",
                message.id, message.name, self.messages[existing.0].name
            )));
        }
        if let Some(sender) = message.sender {
            self.node(sender)
                .ok_or_else(|| DecoderError::NodeNotFound(format!("{:?}", sender)))?;
        }

        let id = MessageId(self.messages.len());
        self.message_lookup.insert(message.id, id);
        self.messages.push(MessageDefinition {
            signals: Vec::new(),
            multiplexor: None,
            ..message
        });
        Ok(id)
    }

    /// Add a signal to an existing message and return its handle
    pub fn add_signal(&mut self, message: MessageId, mut signal: SignalDefinition) -> Result<SignalId> {
        let msg = self
            .messages
            .get_mut(message.0)
            .ok_or_else(|| DecoderError::MessageNotFound(format!("{:?}", message)))?;

        if signal.length == 0 || signal.length > 64 {
            log::warn!(
                "Signal '{}' in '{}' has unusual length {}",
                signal.name,
                msg.name,
                signal.length
            );
        }

        let id = SignalId(self.signals.len());
        signal.message = Some(message);
        msg.signals.push(id);
        self.signals.push(signal);
        Ok(id)
    }

    /// Designate the selector signal of a message
    pub fn set_multiplexor(&mut self, message: MessageId, signal: SignalId) -> Result<()> {
        let owner = self
            .signal(signal)
            .ok_or_else(|| DecoderError::SignalNotFound(format!("{:?}", signal)))?
            .message;
        let msg = self
            .messages
            .get_mut(message.0)
            .ok_or_else(|| DecoderError::MessageNotFound(format!("{:?}", message)))?;
        if owner != Some(message) {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "selector {:?} does not belong to message '{}'",
                signal, msg.name
            )));
        }
        msg.multiplexor = Some(signal);
        Ok(())
    }

    pub fn message(&self, id: MessageId) -> Option<&MessageDefinition> {
        self.messages.get(id.0)
    }

    pub fn signal(&self, id: SignalId) -> Option<&SignalDefinition> {
        self.signals.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeDefinition> {
        self.nodes.get(id.0)
    }

    /// Get the message handle for a CAN ID
    pub fn find_message(&self, can_id: u32) -> Option<MessageId> {
        self.message_lookup.get(&can_id).copied()
    }

    /// Get a message handle by name
    pub fn find_message_by_name(&self, name: &str) -> Option<MessageId> {
        self.messages
            .iter()
            .position(|m| m.name == name)
            .map(MessageId)
    }

    /// Find a signal of a message by name
    pub fn find_signal(&self, message: MessageId, name: &str) -> Option<SignalId> {
        self.message(message)?
            .signals
            .iter()
            .copied()
            .find(|&id| self.signals[id.0].name == name)
    }

    /// Get a node handle by name (case-insensitive, as node names are in DBC)
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name.eq_ignore_ascii_case(name))
            .map(NodeId)
    }

    /// Iterate over the signals of a message with their handles
    pub fn signals_of(
        &self,
        message: MessageId,
    ) -> impl Iterator<Item = (SignalId, &SignalDefinition)> + '_ {
        self.message(message)
            .map(|m| m.signals.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&id| (id, &self.signals[id.0]))
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.signals.len(),
            num_nodes: self.nodes.len(),
            num_multiplexed_messages: self
                .messages
                .iter()
                .filter(|m| m.multiplexor.is_some())
                .count(),
        }
    }

    /// Get all CAN IDs in the database, sorted
    pub fn get_all_can_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.message_lookup.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatabaseStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
    /// Total number of nodes
    pub num_nodes: usize,
    /// Messages with a designated multiplex selector
    pub num_multiplexed_messages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_database() {
        let db = SignalDatabase::new();
        let stats = db.stats();
        assert_eq!(stats, DatabaseStats::default());
        assert!(db.get_all_can_ids().is_empty());
    }

    #[test]
    fn test_add_message() {
        let mut db = SignalDatabase::new();
        let ecu = db.add_node(NodeDefinition::new("ECU1"));

        let msg = db
            .add_message(MessageDefinition::new(0x123, "EngineData", 8).with_sender(ecu))
            .unwrap();
        let speed = db
            .add_signal(
                msg,
                SignalDefinition::new("EngineSpeed", 0, 16).with_unit("rpm"),
            )
            .unwrap();

        let stats = db.stats();
        assert_eq!(stats.num_messages, 1);
        assert_eq!(stats.num_signals, 1);
        assert_eq!(stats.num_nodes, 1);

        assert_eq!(db.find_message(0x123), Some(msg));
        assert_eq!(db.find_message_by_name("EngineData"), Some(msg));
        assert_eq!(db.find_signal(msg, "EngineSpeed"), Some(speed));
        assert_eq!(db.find_node("ecu1"), Some(ecu));
        assert_eq!(db.signal(speed).unwrap().message(), Some(msg));
        assert_eq!(db.message(msg).unwrap().signals(), &[speed]);
    }

    #[test]
    fn test_duplicate_can_id_rejected() {
        let mut db = SignalDatabase::new();
        db.add_message(MessageDefinition::new(0x10, "A", 8)).unwrap();
        let err = db.add_message(MessageDefinition::new(0x10, "B", 8)).unwrap_err();
        assert!(matches!(err, DecoderError::InvalidSignalDefinition(_)));
    }

    #[test]
    fn test_unknown_sender_rejected() {
        let mut db = SignalDatabase::new();
        let mut other = SignalDatabase::new();
        let ghost = other.add_node(NodeDefinition::new("Ghost"));
        let err = db
            .add_message(MessageDefinition::new(0x10, "A", 8).with_sender(ghost))
            .unwrap_err();
        assert!(matches!(err, DecoderError::NodeNotFound(_)));
    }

    #[test]
    fn test_multiplexor_must_belong_to_message() {
        let mut db = SignalDatabase::new();
        let a = db.add_message(MessageDefinition::new(0x10, "A", 8)).unwrap();
        let b = db.add_message(MessageDefinition::new(0x11, "B", 8)).unwrap();
        let mode = db.add_signal(a, SignalDefinition::new("Mode", 0, 4)).unwrap();

        assert!(db.set_multiplexor(b, mode).is_err());
        db.set_multiplexor(a, mode).unwrap();
        assert_eq!(db.message(a).unwrap().multiplexor(), Some(mode));
        assert_eq!(db.stats().num_multiplexed_messages, 1);
    }

    #[test]
    fn test_signals_of_preserves_order() {
        let mut db = SignalDatabase::new();
        let msg = db.add_message(MessageDefinition::new(0x20, "Status", 8)).unwrap();
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            db.add_signal(msg, SignalDefinition::new(*name, i as u16 * 8, 8)).unwrap();
        }
        let names: Vec<&str> = db.signals_of(msg).map(|(_, s)| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_value_table_describe() {
        let signal = SignalDefinition::new("Gear", 0, 3)
            .with_value(0, "Park")
            .with_value(1, "Reverse")
            .with_value(1, "Shadowed");
        assert_eq!(signal.describe(1), Some("Reverse"));
        assert_eq!(signal.describe(5), None);
    }

    #[test]
    fn test_entity_attributes() {
        let mut db = SignalDatabase::new();
        let node = db.add_node(
            NodeDefinition::new("Gateway").with_attribute(AttributeValue::new("NodeLayer", 2i64)),
        );
        let msg = db
            .add_message(
                MessageDefinition::new(0x30, "Cycle", 8)
                    .with_attribute(AttributeValue::new("GenMsgCycleTime", 10i64)),
            )
            .unwrap();
        let sig = db
            .add_signal(
                msg,
                SignalDefinition::new("Tick", 0, 8)
                    .with_attribute(AttributeValue::new("GenSigStartValue", 0i64)),
            )
            .unwrap();

        assert!(db.node(node).unwrap().find_attr_by_name("nodelayer").is_some());
        assert!(db.message(msg).unwrap().find_attr_by_index(0).is_some());
        assert!(db.message(msg).unwrap().find_attr_by_index(1).is_none());
        assert_eq!(
            db.signal(sig).unwrap().find_attr_by_name("GENSIGSTARTVALUE").unwrap().name,
            "GenSigStartValue"
        );
    }

    #[test]
    fn test_handles_are_positional() {
        let mut first = SignalDatabase::new();
        let a = first.add_message(MessageDefinition::new(0x10, "A", 8)).unwrap();
        let a_sig = first.add_signal(a, SignalDefinition::new("Alpha", 0, 8)).unwrap();

        let mut second = SignalDatabase::new();
        let b = second.add_message(MessageDefinition::new(0x20, "B", 8)).unwrap();
        second.add_signal(b, SignalDefinition::new("Beta", 0, 8)).unwrap();

        // Same index, different database: resolves to whatever sits there
        assert_eq!(second.signal(a_sig).unwrap().name, "Beta");
        assert_eq!(second.message(a).unwrap().name, "B");
    }
}
