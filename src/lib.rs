// TLMPKT: lazy field access for fixed-layout telemetry and command packets
//
// Packet raw binary data is accessible as bytes, 16-bit words, or named
// fields. No field is encoded or decoded until specifically requested.

pub mod ccsds;
pub mod field;
pub mod gpstime;
pub mod packet;

// Re-export commonly used types
pub use field::{
    Endianness, FieldDefn, FieldEncoding, FieldError, FieldFormat, FieldValue, FormatError,
    IntFormat,
};
pub use packet::{
    get_packet_type, list_packet_types, register_packet_type, Packet, PacketError, PacketType,
    SliceSpec, WordError, WordIndex, WordView,
};

/// TLMPKT version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
