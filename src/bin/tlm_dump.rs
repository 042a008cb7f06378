//! Telemetry packet dump utility
//! Decodes a file of fixed-size packets against a named packet type and
//! prints every declared field, as text or JSON.

use std::env;
use std::fs;
use tlmpkt::{ccsds, get_packet_type, list_packet_types, FieldValue, Packet};
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: {} <file> <packet-type> [--json]", args[0]);
        eprintln!(
            "Example: {} downlink.bin IssEthernetHeader",
            args[0]
        );
        std::process::exit(1);
    }

    let path = &args[1];
    let type_name = &args[2];
    let json = args.get(3).map(|s| s == "--json").unwrap_or(false);

    ccsds::init_packet_types();

    let ptype = get_packet_type(type_name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown packet type '{}'; known types: {}",
            type_name,
            list_packet_types().join(", ")
        )
    })?;

    let data = fs::read(path)?;
    let size = ptype.total_size();
    anyhow::ensure!(size > 0, "Packet type {} has no fields", type_name);

    let trailing = data.len() % size;
    if trailing != 0 {
        tracing::warn!(
            "{} trailing bytes do not fill a {}-byte {} packet",
            trailing,
            size,
            type_name
        );
    }

    for (number, chunk) in data.chunks_exact(size).enumerate() {
        let pkt = Packet::with_data(ptype.clone(), chunk)?;
        if json {
            println!("{}", serde_json::Value::Object(to_json(&pkt)?));
        } else {
            println!("Packet #{}", number);
            for defn in ptype.fields() {
                println!("  {:16} {}", defn.name(), pkt.get_field(defn.name())?);
            }
            println!("{}", pkt.printable());
        }
    }

    Ok(())
}

fn to_json(pkt: &Packet) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let mut object = serde_json::Map::new();
    for defn in pkt.ptype().fields() {
        let value = match pkt.get_field(defn.name())? {
            FieldValue::Int(value) => serde_json::Value::from(value),
            FieldValue::Bytes(bytes) => serde_json::Value::from(
                bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>(),
            ),
            FieldValue::Type(ptype) => serde_json::Value::from(ptype.name()),
        };
        object.insert(defn.name().to_string(), value);
    }
    Ok(object)
}
