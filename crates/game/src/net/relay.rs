use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::session::SessionRole;

use super::protocol::{Packet, PacketType, PlayerSnapshot, MAX_PACKET_SIZE};

/// How long `recv_from` blocks before the run loop re-checks the running
/// flag.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Two-slot match relay.
///
/// The first join takes slot 0 and is welcomed as the first joiner; the
/// second takes slot 1, is welcomed as the second joiner, and slot 0 is
/// told its peer arrived. Player updates are forwarded to the opposite
/// slot verbatim. Joins beyond two are logged and dropped; two players is
/// a hard cap.
pub struct Relay {
    socket: UdpSocket,
    slots: Slots,
    running: Arc<AtomicBool>,
}

impl Relay {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(POLL_TIMEOUT))?;

        Ok(Self {
            socket,
            slots: Slots::default(),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Blocks until [`shutdown`](Self::shutdown) flips the running flag.
    pub fn run(&mut self) {
        let mut buf = [0u8; MAX_PACKET_SIZE];

        while self.running.load(Ordering::SeqCst) {
            let (len, from) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::ConnectionReset
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    log::error!("relay socket failed: {e}");
                    break;
                }
            };

            match Packet::decode(&buf[..len]) {
                Ok(packet) => self.handle(packet.payload, from),
                Err(e) => log::warn!("dropping malformed packet from {from}: {e}"),
            }
        }
    }

    fn handle(&mut self, payload: PacketType, from: SocketAddr) {
        match payload {
            PacketType::Join => match self.slots.join(from) {
                JoinOutcome::First => {
                    log::info!("{from} joined as first player");
                    self.send(
                        PacketType::Welcome {
                            role: SessionRole::FirstJoiner,
                        },
                        from,
                    );
                }
                JoinOutcome::Second { peer } => {
                    log::info!("{from} joined as second player");
                    self.send(
                        PacketType::Welcome {
                            role: SessionRole::SecondJoiner,
                        },
                        from,
                    );
                    self.send(PacketType::PeerJoined, peer);
                }
                JoinOutcome::Rejoin(role) => {
                    // Duplicate join datagram; repeat the answer.
                    log::debug!("{from} re-joined, resending welcome");
                    self.send(PacketType::Welcome { role }, from);
                }
                JoinOutcome::Full => {
                    log::warn!("join from {from} ignored, match is full");
                }
            },
            PacketType::PlayerUpdate(snapshot) => self.forward(snapshot, from),
            PacketType::Leave => {
                if self.slots.leave(from) {
                    log::info!("{from} left, slot freed");
                }
            }
            PacketType::Welcome { .. } | PacketType::PeerJoined => {
                log::debug!("ignoring client-bound packet from {from}");
            }
        }
    }

    fn forward(&mut self, snapshot: PlayerSnapshot, from: SocketAddr) {
        let Some(peer) = self.slots.peer_of(from) else {
            log::debug!("dropping update from {from} without a peer");
            return;
        };
        self.send(PacketType::PlayerUpdate(snapshot), peer);
    }

    fn send(&self, payload: PacketType, to: SocketAddr) {
        match Packet::new(payload).encode() {
            Ok(bytes) => {
                if let Err(e) = self.socket.send_to(&bytes, to) {
                    log::warn!("send to {to} failed: {e}");
                }
            }
            Err(e) => log::error!("encode failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinOutcome {
    First,
    Second { peer: SocketAddr },
    Rejoin(SessionRole),
    Full,
}

/// Slot bookkeeping, separate from the socket so it can be tested alone.
/// Slot index is join order: 0 is the first joiner, 1 the second.
#[derive(Debug, Default)]
struct Slots {
    addrs: [Option<SocketAddr>; 2],
}

impl Slots {
    fn join(&mut self, addr: SocketAddr) -> JoinOutcome {
        if let Some(role) = self.role_of(addr) {
            return JoinOutcome::Rejoin(role);
        }

        match self.addrs {
            [None, _] => {
                self.addrs[0] = Some(addr);
                JoinOutcome::First
            }
            [Some(peer), None] => {
                self.addrs[1] = Some(addr);
                JoinOutcome::Second { peer }
            }
            [Some(_), Some(_)] => JoinOutcome::Full,
        }
    }

    fn role_of(&self, addr: SocketAddr) -> Option<SessionRole> {
        match self.addrs {
            [Some(first), _] if first == addr => Some(SessionRole::FirstJoiner),
            [_, Some(second)] if second == addr => Some(SessionRole::SecondJoiner),
            _ => None,
        }
    }

    fn peer_of(&self, addr: SocketAddr) -> Option<SocketAddr> {
        match self.addrs {
            [Some(first), Some(second)] if first == addr => Some(second),
            [Some(first), Some(second)] if second == addr => Some(first),
            _ => None,
        }
    }

    fn leave(&mut self, addr: SocketAddr) -> bool {
        for slot in &mut self.addrs {
            if *slot == Some(addr) {
                *slot = None;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn slots_assign_roles_by_arrival_order() {
        let mut slots = Slots::default();

        assert_eq!(slots.join(addr(1000)), JoinOutcome::First);
        assert_eq!(
            slots.join(addr(1001)),
            JoinOutcome::Second { peer: addr(1000) }
        );
        assert_eq!(slots.join(addr(1002)), JoinOutcome::Full);
    }

    #[test]
    fn duplicate_join_keeps_the_original_role() {
        let mut slots = Slots::default();
        slots.join(addr(1000));
        slots.join(addr(1001));

        assert_eq!(
            slots.join(addr(1000)),
            JoinOutcome::Rejoin(SessionRole::FirstJoiner)
        );
        assert_eq!(
            slots.join(addr(1001)),
            JoinOutcome::Rejoin(SessionRole::SecondJoiner)
        );
    }

    #[test]
    fn peers_resolve_each_other_only_when_both_present() {
        let mut slots = Slots::default();
        slots.join(addr(1000));
        assert_eq!(slots.peer_of(addr(1000)), None);

        slots.join(addr(1001));
        assert_eq!(slots.peer_of(addr(1000)), Some(addr(1001)));
        assert_eq!(slots.peer_of(addr(1001)), Some(addr(1000)));
        assert_eq!(slots.peer_of(addr(1002)), None);
    }

    #[test]
    fn leave_frees_the_slot_for_a_new_join() {
        let mut slots = Slots::default();
        slots.join(addr(1000));
        slots.join(addr(1001));

        assert!(slots.leave(addr(1000)));
        assert!(!slots.leave(addr(1000)));

        assert_eq!(slots.join(addr(1002)), JoinOutcome::First);
    }
}
