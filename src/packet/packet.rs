// Packet instances: one exact-length byte buffer per packet

use super::ptype::{PacketError, PacketType, Result};
use super::words::WordView;
use crate::field::{FieldError, FieldValue};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Packet
///
/// A packet holds its raw binary data but makes no attempt to encode or
/// decode fields until specifically requested. This lazy evaluation makes
/// specialized packet processors efficient, as time is only spent packing
/// and unpacking the fields that are actually touched.
///
/// Every instance of a type shares that type's field map through an `Arc`;
/// the buffer itself is owned exclusively by the instance.
#[derive(Debug, Clone)]
pub struct Packet {
    ptype: Arc<PacketType>,
    data: Vec<u8>,
    extra: HashMap<String, FieldValue>,
}

impl Packet {
    /// Creates a packet with a zero-filled buffer of the type's size.
    pub fn new(ptype: Arc<PacketType>) -> Self {
        let size = ptype.total_size();
        Self {
            ptype,
            data: vec![0u8; size],
            extra: HashMap::new(),
        }
    }

    /// Creates a packet from existing raw data, copied into an independent
    /// buffer. The data must be exactly the type's size.
    pub fn with_data(ptype: Arc<PacketType>, data: &[u8]) -> Result<Self> {
        if data.len() != ptype.total_size() {
            return Err(PacketError::LengthMismatch {
                packet: ptype.name().to_string(),
                expected: ptype.total_size(),
                actual: data.len(),
            });
        }
        Ok(Self {
            ptype,
            data: data.to_vec(),
            extra: HashMap::new(),
        })
    }

    /// The packet's type.
    pub fn ptype(&self) -> &Arc<PacketType> {
        &self.ptype
    }

    /// The length of the packet in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the value of the given packet field name.
    ///
    /// Names outside the field map fall back to this instance's ad hoc
    /// metadata (see [`set_field`](Packet::set_field)); a name found in
    /// neither place is a field-not-found error.
    pub fn get_field(&self, name: &str) -> Result<FieldValue> {
        if let Some(defn) = self.ptype.field(name) {
            return Ok(defn.get(&self.data)?);
        }
        if let Some(value) = self.extra.get(name) {
            return Ok(value.clone());
        }
        Err(PacketError::FieldNotFound {
            packet: self.ptype.name().to_string(),
            field: name.to_string(),
        })
    }

    /// Returns an integer field's value, or a type-mismatch error for a
    /// field of any other shape.
    pub fn get_int(&self, name: &str) -> Result<i64> {
        let value = self.get_field(name)?;
        value.as_int().ok_or_else(|| {
            PacketError::Field(FieldError::TypeMismatch {
                field: name.to_string(),
                expected: "integer",
                actual: value.kind(),
            })
        })
    }

    /// Sets the given packet field name to a value.
    ///
    /// A name in the field map is encoded into the buffer through its
    /// definition. Any other name is stored as ad hoc instance metadata
    /// rather than an error, so callers can attach bookkeeping to a packet
    /// without colliding with field semantics.
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let value = value.into();
        match self.ptype.field(name) {
            Some(defn) => defn.set(&mut self.data, &value)?,
            None => {
                tracing::trace!(
                    "Packet {} storing '{}' as instance metadata",
                    self.ptype.name(),
                    name
                );
                self.extra.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    /// Packet data as raw bytes. Mutating through
    /// [`bytes_mut`](Packet::bytes_mut) bypasses field-level checks.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Packet data as a read-only sequence of 16-bit big-endian words.
    pub fn as_words(&self) -> WordView<'_> {
        WordView::new(&self.data)
    }

    /// Writes the packet data to a sink, with no framing or length prefix.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(&self.data)
    }

    /// A hex dump of the packet data.
    pub fn printable(&self) -> String {
        hexdump(&self.data)
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet<{}, {} bytes>", self.ptype.name(), self.data.len())
    }
}

/// Hex dump with offsets and an ASCII gutter, 16 bytes per row.
fn hexdump(data: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(16).enumerate() {
        let hex = chunk
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:08x}  {:<47}  |{}|\n", row * 16, hex, ascii));
    }
    out
}
