// Primitive binary encodings and the format-code parser

use nom::{
    branch::alt,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, map_res, opt},
    sequence::terminated,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Unparsable format specifier {0:?}")]
    BadSpec(String),
}

/// Endianness for multi-byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    pub fn is_big(&self) -> bool {
        matches!(self, Endianness::Big)
    }

    pub fn is_little(&self) -> bool {
        matches!(self, Endianness::Little)
    }
}

impl Default for Endianness {
    fn default() -> Self {
        Endianness::Big
    }
}

/// A fixed-width integer encoding: 1, 2, or 4 bytes, signed or unsigned,
/// big- or little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntFormat {
    pub width: u8,
    pub signed: bool,
    pub endian: Endianness,
}

impl IntFormat {
    /// Decode the raw encoded bits as an unsigned integer.
    ///
    /// The slice length must equal the format width; callers slice the
    /// buffer to exactly that many bytes before decoding.
    pub fn decode_raw(&self, bytes: &[u8]) -> u64 {
        let mut raw = 0u64;
        match self.endian {
            Endianness::Big => {
                for &b in bytes {
                    raw = (raw << 8) | u64::from(b);
                }
            }
            Endianness::Little => {
                for &b in bytes.iter().rev() {
                    raw = (raw << 8) | u64::from(b);
                }
            }
        }
        raw
    }

    /// Decode the encoded bytes as an integer, sign-extending when the
    /// format is signed.
    pub fn decode_int(&self, bytes: &[u8]) -> i64 {
        let raw = self.decode_raw(bytes);
        let bits = 8 * u32::from(self.width);
        if self.signed && (raw >> (bits - 1)) & 1 == 1 {
            (raw | (!0u64 << bits)) as i64
        } else {
            raw as i64
        }
    }

    /// Encode raw bits into `width` bytes. Bits above the format width are
    /// dropped.
    pub fn encode_raw(&self, raw: u64) -> Vec<u8> {
        let width = usize::from(self.width);
        let mut out = vec![0u8; width];
        match self.endian {
            Endianness::Big => {
                for (i, byte) in out.iter_mut().rev().enumerate() {
                    *byte = (raw >> (8 * i)) as u8;
                }
            }
            Endianness::Little => {
                for (i, byte) in out.iter_mut().enumerate() {
                    *byte = (raw >> (8 * i)) as u8;
                }
            }
        }
        out
    }

    /// Encode an integer value into `width` bytes (two's complement).
    pub fn encode_int(&self, value: i64) -> Vec<u8> {
        self.encode_raw(value as u64)
    }

    /// The inclusive (min, max) range of values this format can represent.
    pub fn domain(&self) -> (i64, i64) {
        let bits = 8 * u32::from(self.width);
        if self.signed {
            (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
        } else {
            (0, ((1u64 << bits) - 1) as i64)
        }
    }
}

/// A primitive field encoding: a fixed-width integer or a fixed-length raw
/// byte string.
///
/// Formats are written as struct-style codes: an optional `>` (big-endian,
/// the default) or `<` (little-endian) prefix, then `B`/`b` for unsigned or
/// signed 8-bit, `H`/`h` for 16-bit, `I`/`i` (or `L`/`l`) for 32-bit, or
/// `<N>s` for an N-byte string. For example `"B"`, `">H"`, `"<i"`, `"8s"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldFormat {
    Int(IntFormat),
    Bytes { len: usize },
}

impl FieldFormat {
    /// The number of bytes a value in this format occupies.
    pub fn size(&self) -> usize {
        match self {
            FieldFormat::Int(int) => usize::from(int.width),
            FieldFormat::Bytes { len } => *len,
        }
    }
}

fn endian_prefix(input: &str) -> IResult<&str, Endianness> {
    map(opt(one_of("<>")), |c| match c {
        Some('<') => Endianness::Little,
        _ => Endianness::Big,
    })
    .parse(input)
}

fn bytes_code(input: &str) -> IResult<&str, FieldFormat> {
    map_res(terminated(digit1, char('s')), |digits: &str| {
        digits.parse::<usize>().map(|len| FieldFormat::Bytes { len })
    })
    .parse(input)
}

fn int_code(input: &str) -> IResult<&str, (u8, bool)> {
    map(one_of("BbHhIiLl"), |c| match c {
        'B' => (1, false),
        'b' => (1, true),
        'H' => (2, false),
        'h' => (2, true),
        'I' | 'L' => (4, false),
        _ => (4, true),
    })
    .parse(input)
}

fn format_spec(input: &str) -> IResult<&str, FieldFormat> {
    let (input, endian) = endian_prefix(input)?;
    alt((
        bytes_code,
        map(int_code, move |(width, signed)| {
            FieldFormat::Int(IntFormat {
                width,
                signed,
                endian,
            })
        }),
    ))
    .parse(input)
}

impl FromStr for FieldFormat {
    type Err = FormatError;

    fn from_str(spec: &str) -> Result<Self, FormatError> {
        match all_consuming(format_spec).parse(spec) {
            Ok((_, format)) => Ok(format),
            Err(_) => Err(FormatError::BadSpec(spec.to_string())),
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFormat::Bytes { len } => write!(f, "{}s", len),
            FieldFormat::Int(int) => {
                if int.endian.is_little() {
                    write!(f, "<")?;
                } else if int.width > 1 {
                    write!(f, ">")?;
                }
                let code = match (int.width, int.signed) {
                    (1, false) => 'B',
                    (1, true) => 'b',
                    (2, false) => 'H',
                    (2, true) => 'h',
                    (4, false) => 'I',
                    _ => 'i',
                };
                write!(f, "{}", code)
            }
        }
    }
}
