mod client;
mod protocol;
mod relay;

pub use client::{
    mailbox, ClientEvent, ClientListener, EventMailbox, MailboxListener, NetError, NetworkClient,
};
pub use protocol::{
    Packet, PacketError, PacketHeader, PacketType, PlayerSnapshot, DEFAULT_PORT, DEFAULT_TICK_RATE,
    MAX_PACKET_SIZE, PROTOCOL_MAGIC, PROTOCOL_VERSION,
};
pub use relay::Relay;
