// Packet types: an ordered field list compiled into a shared lookup table

use crate::field::{FieldDefn, FieldError, FormatError};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Packet {packet} has no field '{field}'")]
    FieldNotFound { packet: String, field: String },

    #[error("Packet {packet} is {expected} bytes, got {actual} bytes of data")]
    LengthMismatch {
        packet: String,
        expected: usize,
        actual: usize,
    },

    #[error("Packet {packet} declares field '{field}' more than once")]
    DuplicateField { packet: String, field: String },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

pub type Result<T> = std::result::Result<T, PacketError>;

/// Packet Type
///
/// The schema shared by every instance of one packet kind: the ordered
/// field list, the derived name-to-definition map, and the buffer size
/// (the largest stop offset over all fields).
///
/// The map and size are computed exactly once, here, by a pure function of
/// the field list. A `PacketType` is never mutated after construction, so
/// instances (and threads) share it freely through an `Arc` without any
/// synchronization.
#[derive(Debug)]
pub struct PacketType {
    name: String,
    fields: Vec<FieldDefn>,
    map: HashMap<String, usize>,
    total_size: usize,
}

/// Builds the name-to-position lookup table for a field list.
///
/// Deterministic and side-effect-free: building twice from the same list
/// yields equivalent maps, so redundant concurrent construction is
/// harmless. Duplicate field names are rejected.
fn build_field_map(packet: &str, fields: &[FieldDefn]) -> Result<HashMap<String, usize>> {
    let mut map = HashMap::with_capacity(fields.len());
    for (index, defn) in fields.iter().enumerate() {
        if map.insert(defn.name().to_string(), index).is_some() {
            return Err(PacketError::DuplicateField {
                packet: packet.to_string(),
                field: defn.name().to_string(),
            });
        }
    }
    Ok(map)
}

impl PacketType {
    /// Creates a packet type from its ordered field list. Field order is
    /// declaration order; it does not constrain access order or offsets.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDefn>) -> Result<Self> {
        let name = name.into();
        let map = build_field_map(&name, &fields)?;
        let total_size = fields.iter().map(FieldDefn::stop).max().unwrap_or(0);
        Ok(Self {
            name,
            fields,
            map,
            total_size,
        })
    }

    /// This packet type's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field definitions, in declaration order.
    pub fn fields(&self) -> &[FieldDefn] {
        &self.fields
    }

    /// Looks up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefn> {
        self.map.get(name).map(|&index| &self.fields[index])
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// The size of a packet of this type, in bytes.
    pub fn total_size(&self) -> usize {
        self.total_size
    }
}
