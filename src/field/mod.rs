// Declarative field schema for fixed-layout packet buffers

pub mod defn;
pub mod format;
pub mod value;

pub use defn::{FieldDefn, FieldEncoding, FieldError};
pub use format::{Endianness, FieldFormat, FormatError, IntFormat};
pub use value::FieldValue;
