// ISS CCSDS packet headers built on the generic field machinery

use crate::field::FieldDefn;
use crate::gpstime;
use crate::packet::{register_packet_type, Packet, PacketType};
use chrono::{DateTime, Timelike, Utc};
use std::sync::Arc;

use crate::packet::ptype::Result;

/// Scale between integer microseconds [0, 999999] and the one-byte CCSDS
/// secondary-header fine time [0, 255].
pub const TIME_FINE_FACTOR: f64 = (1e6 - 1.0) / 255.0;

/// Converts microseconds [0, 999999] to fine time [0, 255].
pub fn time_fine(microseconds: u32) -> u8 {
    (f64::from(microseconds) / TIME_FINE_FACTOR).round() as u8
}

/// Converts fine time [0, 255] to integer microseconds [0, 999999].
pub fn time_microseconds(fine: u8) -> u32 {
    (f64::from(fine) * TIME_FINE_FACTOR).round() as u32
}

fn build_primary_header() -> Result<PacketType> {
    Ok(PacketType::new(
        "CcsdsPrimaryHeader",
        vec![
            FieldDefn::with_mask("version", 0, "B", 0b1110_0000)?,
            FieldDefn::with_mask("type", 0, "B", 0b0001_0000)?,
            FieldDefn::with_mask("secondary", 0, "B", 0b0000_1000)?,
            FieldDefn::with_mask("apid", 0, ">H", 0b0000_0111_1111_1111)?,
            FieldDefn::with_mask("seqflags", 2, "B", 0b1100_0000)?,
            FieldDefn::with_mask("seqcount", 2, ">H", 0b0011_1111_1111_1111)?,
            FieldDefn::new("length", 4, ">H")?,
        ],
    )?)
}

fn build_ethernet_header() -> Result<PacketType> {
    Ok(PacketType::new(
        "IssEthernetHeader",
        vec![
            FieldDefn::with_mask("version", 0, "B", 0b1110_0000)?,
            FieldDefn::with_mask("type", 0, "B", 0b0001_0000)?,
            FieldDefn::with_mask("secondary", 0, "B", 0b0000_1000)?,
            FieldDefn::with_mask("apid", 0, ">H", 0b0000_0111_1111_1111)?,
            FieldDefn::with_mask("seqflags", 2, "B", 0b1100_0000)?,
            FieldDefn::with_mask("seqcount", 2, ">H", 0b0011_1111_1111_1111)?,
            FieldDefn::new("length", 4, ">H")?,
            FieldDefn::new("timeCoarseMSB", 6, ">H")?,
            FieldDefn::new("timeCoarseLSB", 8, ">H")?,
            FieldDefn::new("timeFine", 10, "B")?,
            FieldDefn::with_mask("timeID", 11, "B", 0b1100_0000)?,
            FieldDefn::with_mask("checkword", 11, "B", 0b0010_0000)?,
            FieldDefn::with_mask("zoe", 11, "B", 0b0001_0000)?,
            FieldDefn::with_mask("packetType", 11, "B", 0b0000_1111)?,
            FieldDefn::with_mask("elementID", 12, "B", 0b0111_1000)?,
            FieldDefn::new("endpointID", 13, "B")?,
            FieldDefn::with_mask("commandID", 14, "B", 0b1111_1110)?,
            FieldDefn::with_mask("systemCmd", 14, "B", 0b0000_0001)?,
            FieldDefn::new("functionCode", 15, "B")?,
            FieldDefn::new("reserved", 16, ">H")?,
            FieldDefn::new("stationMode", 18, ">H")?,
        ],
    )?)
}

lazy_static::lazy_static! {
    static ref PRIMARY_HEADER: Arc<PacketType> =
        Arc::new(build_primary_header().expect("builtin CCSDS primary header definition"));
    static ref ETHERNET_HEADER: Arc<PacketType> =
        Arc::new(build_ethernet_header().expect("builtin ISS Ethernet header definition"));
}

/// The 6-byte CCSDS primary header packet type, shared by all instances.
pub fn primary_header() -> Arc<PacketType> {
    PRIMARY_HEADER.clone()
}

/// The 20-byte ISS payload Ethernet CCSDS header packet type.
pub fn ethernet_header() -> Arc<PacketType> {
    ETHERNET_HEADER.clone()
}

/// Registers the builtin CCSDS packet types for lookup by name.
///
/// Call once at tool startup before resolving packet types by name.
/// Registration is idempotent.
pub fn init_packet_types() {
    register_packet_type(primary_header());
    register_packet_type(ethernet_header());
}

/// An ISS payload Ethernet CCSDS header.
///
/// A thin typed wrapper over a [`Packet`] of the shared
/// [`ethernet_header`] type, with accessors for the commonly-touched
/// fields and the secondary-header timestamp split across the coarse
/// words and the fine byte.
#[derive(Debug, Clone)]
pub struct EthernetHeader {
    pkt: Packet,
}

impl EthernetHeader {
    pub fn new() -> Self {
        Self {
            pkt: Packet::new(ethernet_header()),
        }
    }

    pub fn with_data(data: &[u8]) -> Result<Self> {
        Ok(Self {
            pkt: Packet::with_data(ethernet_header(), data)?,
        })
    }

    pub fn packet(&self) -> &Packet {
        &self.pkt
    }

    pub fn packet_mut(&mut self) -> &mut Packet {
        &mut self.pkt
    }

    pub fn into_packet(self) -> Packet {
        self.pkt
    }

    /// Initializes the underlying packet data with sensible defaults.
    ///
    /// An optional timestamp seeds the secondary-header coarse and fine
    /// time fields.
    pub fn init(&mut self, timestamp: Option<DateTime<Utc>>) -> Result<()> {
        self.pkt.bytes_mut().fill(0);
        self.pkt.set_field("type", 0b1u8)?; // Payload packet
        self.pkt.set_field("secondary", 0b1u8)?; // Secondary header present
        self.pkt.set_field("seqflags", 0b11u8)?; // Unsegmented data
        self.pkt.set_field("timeID", 0b01u8)?; // Time of data generation
        self.pkt.set_field("checkword", 0b0u8)?; // Only command packets carry checkwords
        self.pkt.set_field("zoe", 0b0u8)?; // Not a ZOE recording
        self.pkt.set_field("packetType", 0b110u8)?; // Payload private science

        if let Some(ts) = timestamp {
            self.set_time(ts)?;
        }

        let length = self.pkt.len().saturating_sub(6 + 1);
        self.pkt.set_field("length", length as u16)?;
        Ok(())
    }

    pub fn apid(&self) -> Result<u16> {
        Ok(self.pkt.get_int("apid")? as u16)
    }

    pub fn set_apid(&mut self, apid: u16) -> Result<()> {
        self.pkt.set_field("apid", apid)
    }

    pub fn seqcount(&self) -> Result<u16> {
        Ok(self.pkt.get_int("seqcount")? as u16)
    }

    pub fn set_seqcount(&mut self, count: u16) -> Result<()> {
        self.pkt.set_field("seqcount", count)
    }

    pub fn length(&self) -> Result<u16> {
        Ok(self.pkt.get_int("length")? as u16)
    }

    /// The secondary-header time as a UTC timestamp.
    pub fn time(&self) -> Result<DateTime<Utc>> {
        let msb = self.pkt.get_int("timeCoarseMSB")?;
        let lsb = self.pkt.get_int("timeCoarseLSB")?;
        let fine = self.pkt.get_int("timeFine")? as u8;
        let seconds = (msb << 16) | lsb;
        Ok(gpstime::to_utc(
            seconds,
            i64::from(time_microseconds(fine)),
        ))
    }

    pub fn set_time(&mut self, timestamp: DateTime<Utc>) -> Result<()> {
        let seconds = gpstime::to_gps_seconds(timestamp);
        self.pkt
            .set_field("timeCoarseMSB", ((seconds >> 16) & 0xFFFF) as u16)?;
        self.pkt.set_field("timeCoarseLSB", (seconds & 0xFFFF) as u16)?;
        self.pkt
            .set_field("timeFine", time_fine(timestamp.nanosecond() / 1000))?;
        Ok(())
    }
}

impl Default for EthernetHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_fine_conversion() {
        assert_eq!(time_fine(0), 0);
        assert_eq!(time_fine(999_999), 255);
        assert_eq!(time_microseconds(0), 0);
        assert_eq!(time_microseconds(255), 999_999);

        // Round trips stay within one fine-time quantum
        for us in [1u32, 125_000, 500_000, 875_000] {
            let back = time_microseconds(time_fine(us));
            assert!((i64::from(back) - i64::from(us)).abs() <= TIME_FINE_FACTOR as i64 / 2 + 1);
        }
    }

    #[test]
    fn test_primary_header_layout() {
        let ptype = primary_header();
        assert_eq!(ptype.total_size(), 6);
        assert_eq!(ptype.fields().len(), 7);
    }

    #[test]
    fn test_ethernet_header_layout() {
        let ptype = ethernet_header();
        assert_eq!(ptype.total_size(), 20);
        assert!(ptype.has_field("stationMode"));
    }

    #[test]
    fn test_shared_type_across_instances() {
        let a = EthernetHeader::new();
        let b = EthernetHeader::new();
        assert!(Arc::ptr_eq(a.packet().ptype(), b.packet().ptype()));
    }

    #[test]
    fn test_packed_primary_fields() {
        // First two bytes 0x08 0x65: version 0, type 0, secondary 1, apid 0x65
        let mut pkt = Packet::new(primary_header());
        pkt.set_field("secondary", 1u8).unwrap();
        pkt.set_field("apid", 0x65u16).unwrap();
        assert_eq!(&pkt.bytes()[..2], &[0x08, 0x65]);
        assert_eq!(pkt.get_int("version").unwrap(), 0);
        assert_eq!(pkt.get_int("apid").unwrap(), 0x65);

        pkt.set_field("version", 0b101u8).unwrap();
        assert_eq!(pkt.get_int("apid").unwrap(), 0x65);
        assert_eq!(&pkt.bytes()[..2], &[0xA8, 0x65]);
    }

    #[test]
    fn test_init_defaults() {
        let mut header = EthernetHeader::new();
        header.init(None).unwrap();

        let pkt = header.packet();
        assert_eq!(pkt.get_int("type").unwrap(), 1);
        assert_eq!(pkt.get_int("secondary").unwrap(), 1);
        assert_eq!(pkt.get_int("seqflags").unwrap(), 0b11);
        assert_eq!(pkt.get_int("timeID").unwrap(), 0b01);
        assert_eq!(pkt.get_int("checkword").unwrap(), 0);
        assert_eq!(pkt.get_int("zoe").unwrap(), 0);
        assert_eq!(pkt.get_int("packetType").unwrap(), 0b110);
        assert_eq!(header.length().unwrap(), 13);
    }

    #[test]
    fn test_time_round_trip() {
        let ts = Utc
            .with_ymd_and_hms(2016, 7, 4, 17, 30, 45)
            .single()
            .unwrap();

        let mut header = EthernetHeader::new();
        header.init(Some(ts)).unwrap();

        let seconds = gpstime::to_gps_seconds(ts);
        assert_eq!(
            header.packet().get_int("timeCoarseMSB").unwrap(),
            seconds >> 16
        );
        assert_eq!(
            header.packet().get_int("timeCoarseLSB").unwrap(),
            seconds & 0xFFFF
        );
        assert_eq!(header.time().unwrap(), ts);
    }

    #[test]
    fn test_init_registry() {
        init_packet_types();
        assert!(crate::packet::get_packet_type("CcsdsPrimaryHeader").is_some());
        assert!(crate::packet::get_packet_type("IssEthernetHeader").is_some());
    }
}
