use rkyv::{rancor, Archive, Deserialize, Serialize};

use crate::character::BODY_PART_COUNT;
use crate::session::SessionRole;

pub const MAX_PACKET_SIZE: usize = 1200;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x53504152;
pub const DEFAULT_PORT: u16 = 27101;
pub const DEFAULT_TICK_RATE: u32 = 60;

// No sequence numbers or timestamps: snapshots are applied in arrival
// order, last write wins. An unordered transport can therefore apply a
// stale snapshot after a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
}

impl PacketHeader {
    pub fn new() -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

impl Default for PacketHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// One character's pose and animation selection at a point in time.
///
/// `animations` carries one resolved clip name per body-part channel, in
/// `BodyPart::ALL` order. The order is a schema constant both ends agree on
/// out of band; it is not carried in the message.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlayerSnapshot {
    pub position: [f32; 3],
    /// Unit quaternion, w-x-y-z order.
    pub orientation: [f32; 4],
    pub animations: Vec<String>,
}

impl PlayerSnapshot {
    pub fn validate(&self) -> Result<(), PacketError> {
        if self.animations.len() != BODY_PART_COUNT {
            return Err(PacketError::ChannelCount {
                expected: BODY_PART_COUNT,
                actual: self.animations.len(),
            });
        }
        let finite = self
            .position
            .iter()
            .chain(self.orientation.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(PacketError::NonFinite);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PacketType {
    Join,
    Welcome { role: SessionRole },
    PeerJoined,
    PlayerUpdate(PlayerSnapshot),
    Leave,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("bad magic or protocol version")]
    Header,
    #[error("expected {expected} animation channels, got {actual}")]
    ChannelCount { expected: usize, actual: usize },
    #[error("non-finite float in position or orientation")]
    NonFinite,
    #[error("packet exceeds {MAX_PACKET_SIZE} bytes")]
    Oversize,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

impl Packet {
    pub fn new(payload: PacketType) -> Self {
        Self {
            header: PacketHeader::new(),
            payload,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let bytes = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)?;
        if bytes.len() > MAX_PACKET_SIZE {
            return Err(PacketError::Oversize);
        }
        Ok(bytes)
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        let packet =
            rkyv::from_bytes::<Self, rancor::Error>(data).map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::Header);
        }
        if let PacketType::PlayerUpdate(ref snapshot) = packet.payload {
            snapshot.validate()?;
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PlayerSnapshot {
        PlayerSnapshot {
            position: [1.5, 0.0, -3.25],
            orientation: [1.0, 0.0, 0.0, 0.0],
            animations: vec![String::from("Idle"); BODY_PART_COUNT],
        }
    }

    #[test]
    fn snapshot_round_trip() {
        let packet = Packet::new(PacketType::PlayerUpdate(snapshot()));
        let bytes = packet.encode().unwrap();
        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(packet, decoded);
    }

    #[test]
    fn welcome_round_trip() {
        let packet = Packet::new(PacketType::Welcome {
            role: SessionRole::FirstJoiner,
        });
        let bytes = packet.encode().unwrap();
        assert_eq!(packet, Packet::decode(&bytes).unwrap());
    }

    #[test]
    fn decode_rejects_wrong_channel_count() {
        let mut short = snapshot();
        short.animations.pop();
        let bytes = Packet::new(PacketType::PlayerUpdate(short)).encode().unwrap();
        assert!(matches!(
            Packet::decode(&bytes),
            Err(PacketError::ChannelCount { .. })
        ));
    }

    #[test]
    fn decode_rejects_non_finite_floats() {
        let mut bad = snapshot();
        bad.position[1] = f32::NAN;
        let bytes = Packet::new(PacketType::PlayerUpdate(bad)).encode().unwrap();
        assert!(matches!(Packet::decode(&bytes), Err(PacketError::NonFinite)));
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let packet = Packet {
            header: PacketHeader {
                magic: 0,
                version: PROTOCOL_VERSION,
            },
            payload: PacketType::Join,
        };
        let bytes = packet.encode().unwrap();
        assert!(matches!(Packet::decode(&bytes), Err(PacketError::Header)));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Packet::decode(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }
}
