// Field definitions: named, typed regions of a packet buffer

use super::format::{FieldFormat, FormatError};
use super::value::FieldValue;
use crate::packet::PacketType;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Field '{field}' spans bytes [{start}, {stop}) but the buffer holds {len}")]
    OutOfBounds {
        field: String,
        start: usize,
        stop: usize,
        len: usize,
    },

    #[error("Field '{field}' takes exactly {expected} bytes, got {actual}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Value {value} is outside the range [{min}, {max}] of field '{field}'")]
    ValueOutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Field '{field}' expects {expected} values, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, FieldError>;

/// How a field's bytes are interpreted: a primitive binary format, or a
/// reference to another packet type for composite sub-structure fields.
#[derive(Debug, Clone)]
pub enum FieldEncoding {
    Format(FieldFormat),
    Nested(Arc<PacketType>),
}

/// Field Definition
///
/// Encapsulates everything required to locate and convert one packet field:
/// the field name, its byte offset, its encoding, and an optional bitmask
/// for fields that share bytes with their neighbors. The mask's shift (the
/// number of trailing zero bits) is derived once at construction.
///
/// Use [`get`](FieldDefn::get) and [`set`](FieldDefn::set) to extract and
/// inject the field's value in raw packet data.
#[derive(Debug, Clone)]
pub struct FieldDefn {
    name: String,
    offset: usize,
    encoding: FieldEncoding,
    mask: Option<u64>,
    shift: u32,
}

impl FieldDefn {
    /// Creates a field at `offset` with the given format code (e.g. `"B"`,
    /// `">H"`, `"8s"`). An unparsable code is a construction-time error.
    pub fn new(
        name: impl Into<String>,
        offset: usize,
        format: &str,
    ) -> std::result::Result<Self, FormatError> {
        Ok(Self {
            name: name.into(),
            offset,
            encoding: FieldEncoding::Format(format.parse()?),
            mask: None,
            shift: 0,
        })
    }

    /// Creates an integer field whose value occupies only the bit positions
    /// set in `mask`. Values are shifted down past the mask's trailing
    /// zeros on read and back up on write.
    pub fn with_mask(
        name: impl Into<String>,
        offset: usize,
        format: &str,
        mask: u64,
    ) -> std::result::Result<Self, FormatError> {
        let shift = if mask == 0 { 0 } else { mask.trailing_zeros() };
        Ok(Self {
            name: name.into(),
            offset,
            encoding: FieldEncoding::Format(format.parse()?),
            mask: Some(mask),
            shift,
        })
    }

    /// Creates a field that marks a nested packet sub-structure.
    pub fn nested(name: impl Into<String>, offset: usize, ptype: Arc<PacketType>) -> Self {
        Self {
            name: name.into(),
            offset,
            encoding: FieldEncoding::Nested(ptype),
            mask: None,
            shift: 0,
        }
    }

    /// This field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This field's start byte offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn encoding(&self) -> &FieldEncoding {
        &self.encoding
    }

    pub fn mask(&self) -> Option<u64> {
        self.mask
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// The number of bytes required to represent this field.
    pub fn size(&self) -> usize {
        match &self.encoding {
            FieldEncoding::Format(format) => format.size(),
            FieldEncoding::Nested(ptype) => ptype.total_size(),
        }
    }

    /// This field's start byte offset.
    pub fn start(&self) -> usize {
        self.offset
    }

    /// This field's stop byte offset (exclusive).
    pub fn stop(&self) -> usize {
        self.offset + self.size()
    }

    fn field_bytes<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        if self.stop() > data.len() {
            return Err(FieldError::OutOfBounds {
                field: self.name.clone(),
                start: self.start(),
                stop: self.stop(),
                len: data.len(),
            });
        }
        Ok(&data[self.start()..self.stop()])
    }

    /// Returns this field's value from the underlying raw packet data.
    ///
    /// Nested-packet fields return the referenced packet type itself rather
    /// than anything derived from `data`.
    pub fn get(&self, data: &[u8]) -> Result<FieldValue> {
        let format = match &self.encoding {
            FieldEncoding::Nested(ptype) => return Ok(FieldValue::Type(ptype.clone())),
            FieldEncoding::Format(format) => format,
        };

        let bytes = self.field_bytes(data)?;
        match format {
            FieldFormat::Bytes { .. } => Ok(FieldValue::Bytes(bytes.to_vec())),
            FieldFormat::Int(int) => {
                let value = match self.mask {
                    Some(mask) => ((int.decode_raw(bytes) & mask) >> self.shift) as i64,
                    None => int.decode_int(bytes),
                };
                Ok(FieldValue::Int(value))
            }
        }
    }

    /// Sets this field's value in the underlying raw packet data.
    ///
    /// Masked integer writes read the current bytes and preserve every bit
    /// outside the mask, so fields sharing a byte never clobber each other.
    /// All checks run before any byte is written. Setting a nested-packet
    /// field is a no-op.
    pub fn set(&self, data: &mut [u8], value: &FieldValue) -> Result<()> {
        let format = match &self.encoding {
            FieldEncoding::Nested(_) => return Ok(()),
            FieldEncoding::Format(format) => format,
        };

        match format {
            FieldFormat::Bytes { len } => {
                let bytes = value.as_bytes().ok_or_else(|| FieldError::TypeMismatch {
                    field: self.name.clone(),
                    expected: "bytes",
                    actual: value.kind(),
                })?;
                if bytes.len() != *len {
                    return Err(FieldError::LengthMismatch {
                        field: self.name.clone(),
                        expected: *len,
                        actual: bytes.len(),
                    });
                }
                self.field_bytes(data)?;
                data[self.start()..self.stop()].copy_from_slice(bytes);
            }
            FieldFormat::Int(int) => {
                let int = *int;
                let value = value.as_int().ok_or_else(|| FieldError::TypeMismatch {
                    field: self.name.clone(),
                    expected: "integer",
                    actual: value.kind(),
                })?;
                let encoded = match self.mask {
                    Some(mask) => {
                        let current = int.decode_raw(self.field_bytes(data)?);
                        let incoming = ((value as u64) << self.shift) & mask;
                        int.encode_raw((current & !mask) | incoming)
                    }
                    None => {
                        let (min, max) = int.domain();
                        if value < min || value > max {
                            return Err(FieldError::ValueOutOfRange {
                                field: self.name.clone(),
                                value,
                                min,
                                max,
                            });
                        }
                        self.field_bytes(data)?;
                        int.encode_int(value)
                    }
                };
                data[self.start()..self.stop()].copy_from_slice(&encoded);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let defn = FieldDefn::new("length", 4, ">H").unwrap();
        assert_eq!(defn.name(), "length");
        assert_eq!(defn.offset(), 4);
        assert_eq!(defn.size(), 2);
        assert_eq!(defn.start(), 4);
        assert_eq!(defn.stop(), 6);
        assert_eq!(defn.mask(), None);
        assert_eq!(defn.shift(), 0);

        assert!(FieldDefn::new("bogus", 0, "Z").is_err());
    }

    #[test]
    fn test_shift_derivation() {
        let defn = FieldDefn::with_mask("version", 0, "B", 0b1110_0000).unwrap();
        assert_eq!(defn.shift(), 5);

        let defn = FieldDefn::with_mask("apid", 0, ">H", 0b0000_0111_1111_1111).unwrap();
        assert_eq!(defn.shift(), 0);

        let defn = FieldDefn::with_mask("degenerate", 0, "B", 0).unwrap();
        assert_eq!(defn.shift(), 0);
    }

    #[test]
    fn test_get_unmasked() {
        let data = [0x12, 0x34, 0x56, 0x78];

        let byte = FieldDefn::new("byte", 1, "B").unwrap();
        assert_eq!(byte.get(&data).unwrap(), FieldValue::Int(0x34));

        let word = FieldDefn::new("word", 2, ">H").unwrap();
        assert_eq!(word.get(&data).unwrap(), FieldValue::Int(0x5678));

        let long = FieldDefn::new("long", 0, ">I").unwrap();
        assert_eq!(long.get(&data).unwrap(), FieldValue::Int(0x12345678));
    }

    #[test]
    fn test_get_masked_nibble() {
        // High nibble of 0x12 is 1
        let data = [0x12, 0x34];
        let defn = FieldDefn::with_mask("a", 0, "B", 0b1111_0000).unwrap();
        assert_eq!(defn.get(&data).unwrap(), FieldValue::Int(1));
    }

    #[test]
    fn test_set_masked_preserves_other_bits() {
        // Setting the high nibble to 5 must leave the low nibble alone
        let mut data = [0x12, 0x34];
        let defn = FieldDefn::with_mask("a", 0, "B", 0b1111_0000).unwrap();
        defn.set(&mut data, &FieldValue::Int(5)).unwrap();
        assert_eq!(data[0], 0x52);
        assert_eq!(data[1], 0x34);
        assert_eq!(defn.get(&data).unwrap(), FieldValue::Int(5));
    }

    #[test]
    fn test_masked_round_trip_law() {
        let defn = FieldDefn::with_mask("mid", 0, ">H", 0b0000_0111_1111_0000).unwrap();
        let domain = 0b0111_1111u64;
        let mut data = [0u8; 2];
        for v in 0..=0xFFi64 {
            defn.set(&mut data, &FieldValue::Int(v)).unwrap();
            let got = defn.get(&data).unwrap();
            assert_eq!(got, FieldValue::Int(v & domain as i64));
        }
    }

    #[test]
    fn test_mask_independence() {
        // Disjoint masks over the same byte must not disturb each other
        let hi = FieldDefn::with_mask("hi", 0, "B", 0b1111_0000).unwrap();
        let lo = FieldDefn::with_mask("lo", 0, "B", 0b0000_1111).unwrap();
        let mut data = [0u8];

        hi.set(&mut data, &FieldValue::Int(0xA)).unwrap();
        lo.set(&mut data, &FieldValue::Int(0x5)).unwrap();
        assert_eq!(hi.get(&data).unwrap(), FieldValue::Int(0xA));
        assert_eq!(lo.get(&data).unwrap(), FieldValue::Int(0x5));

        hi.set(&mut data, &FieldValue::Int(0x3)).unwrap();
        assert_eq!(lo.get(&data).unwrap(), FieldValue::Int(0x5));
    }

    #[test]
    fn test_set_unmasked_range_check() {
        let mut data = [0u8; 2];
        let defn = FieldDefn::new("word", 0, ">H").unwrap();

        defn.set(&mut data, &FieldValue::Int(0xFFFF)).unwrap();
        assert_eq!(data, [0xFF, 0xFF]);

        let err = defn.set(&mut data, &FieldValue::Int(0x1_0000)).unwrap_err();
        assert!(matches!(err, FieldError::ValueOutOfRange { .. }));
        // Failed set leaves the buffer untouched
        assert_eq!(data, [0xFF, 0xFF]);

        let signed = FieldDefn::new("sword", 0, ">h").unwrap();
        signed.set(&mut data, &FieldValue::Int(-2)).unwrap();
        assert_eq!(data, [0xFF, 0xFE]);
        assert!(signed.set(&mut data, &FieldValue::Int(-40000)).is_err());
    }

    #[test]
    fn test_string_fields() {
        let mut data = [0u8; 6];
        let defn = FieldDefn::new("tag", 1, "4s").unwrap();

        defn.set(&mut data, &FieldValue::from(b"ABCD")).unwrap();
        assert_eq!(&data, b"\0ABCD\0");
        assert_eq!(defn.get(&data).unwrap(), FieldValue::Bytes(b"ABCD".to_vec()));

        let err = defn.set(&mut data, &FieldValue::from(b"AB")).unwrap_err();
        assert!(matches!(err, FieldError::LengthMismatch { expected: 4, actual: 2, .. }));
        assert_eq!(&data, b"\0ABCD\0");
    }

    #[test]
    fn test_type_mismatch() {
        let mut data = [0u8; 2];
        let word = FieldDefn::new("word", 0, ">H").unwrap();
        let err = word.set(&mut data, &FieldValue::from(b"ab")).unwrap_err();
        assert!(matches!(err, FieldError::TypeMismatch { .. }));

        let tag = FieldDefn::new("tag", 0, "2s").unwrap();
        let err = tag.set(&mut data, &FieldValue::Int(1)).unwrap_err();
        assert!(matches!(err, FieldError::TypeMismatch { .. }));
    }

    #[test]
    fn test_out_of_bounds_access() {
        let data = [0u8; 3];
        let defn = FieldDefn::new("word", 2, ">H").unwrap();
        let err = defn.get(&data).unwrap_err();
        assert!(matches!(err, FieldError::OutOfBounds { stop: 4, len: 3, .. }));
    }
}
