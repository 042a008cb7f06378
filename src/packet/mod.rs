// Packet types, packet instances, and byte/word buffer views

pub mod packet;
pub mod ptype;
pub mod registry;
pub mod words;

pub use packet::Packet;
pub use ptype::{PacketError, PacketType};
pub use registry::{get_packet_type, list_packet_types, register_packet_type};
pub use words::{SliceSpec, WordError, WordIndex, WordView};
