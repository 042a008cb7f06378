// Packet type registry for run-time lookup by name

use super::ptype::PacketType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

lazy_static::lazy_static! {
    static ref PACKET_REGISTRY: Mutex<HashMap<String, Arc<PacketType>>> =
        Mutex::new(HashMap::new());
}

/// Register a packet type in the global registry. Re-registering a name
/// replaces the previous entry.
pub fn register_packet_type(ptype: Arc<PacketType>) {
    tracing::debug!("Registering packet type {}", ptype.name());
    PACKET_REGISTRY
        .lock()
        .unwrap()
        .insert(ptype.name().to_string(), ptype);
}

/// Look up a registered packet type by name.
pub fn get_packet_type(name: &str) -> Option<Arc<PacketType>> {
    PACKET_REGISTRY.lock().unwrap().get(name).cloned()
}

/// Names of all registered packet types, sorted.
pub fn list_packet_types() -> Vec<String> {
    let mut names: Vec<String> = PACKET_REGISTRY.lock().unwrap().keys().cloned().collect();
    names.sort();
    names
}
