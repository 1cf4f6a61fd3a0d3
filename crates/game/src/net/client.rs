use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryIter};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::session::SessionRole;

use super::protocol::{Packet, PacketError, PacketType, PlayerSnapshot, MAX_PACKET_SIZE};

/// How long the reader thread blocks in `recv` before re-checking the
/// running flag. Bounds how long `close()` can stall on the join.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Packet(#[from] PacketError),
    #[error("client is not connected")]
    NotConnected,
    #[error("client is already connected")]
    AlreadyConnected,
}

/// Decoded traffic the reader thread hands to the registered listener.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Welcome { role: SessionRole },
    PeerJoined,
    PlayerUpdate(PlayerSnapshot),
    Closed,
}

/// Receives events on the reader thread. Implementations must not block;
/// the shipped [`MailboxListener`] just enqueues.
pub trait ClientListener: Send {
    fn on_event(&self, event: ClientEvent);
}

type SharedListener = Arc<Mutex<Option<Box<dyn ClientListener>>>>;

/// Creates the channel-backed listener pair: the [`MailboxListener`] goes
/// to [`NetworkClient::register_listener`], the [`EventMailbox`] stays on
/// the simulation thread and is drained once per tick. This is the only
/// path from the receive thread into game state; nothing is written
/// cross-thread directly.
pub fn mailbox() -> (MailboxListener, EventMailbox) {
    let (tx, rx) = mpsc::channel();
    (MailboxListener { tx }, EventMailbox { rx })
}

pub struct MailboxListener {
    tx: Sender<ClientEvent>,
}

impl ClientListener for MailboxListener {
    fn on_event(&self, event: ClientEvent) {
        // The mailbox may already be dropped during shutdown.
        let _ = self.tx.send(event);
    }
}

pub struct EventMailbox {
    rx: Receiver<ClientEvent>,
}

impl EventMailbox {
    pub fn drain(&self) -> TryIter<'_, ClientEvent> {
        self.rx.try_iter()
    }
}

/// UDP transport to the relay. `connect` binds an ephemeral socket, sends
/// the join request and starts a reader thread that decodes datagrams and
/// dispatches [`ClientEvent`]s to the registered listener. Malformed
/// datagrams are logged and skipped.
pub struct NetworkClient {
    socket: Option<UdpSocket>,
    reader: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    listener: SharedListener,
}

impl NetworkClient {
    pub fn new() -> Self {
        Self {
            socket: None,
            reader: None,
            running: Arc::new(AtomicBool::new(false)),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// May be called before or after `connect`. Events arriving while no
    /// listener is registered are dropped.
    pub fn register_listener<L: ClientListener + 'static>(&self, listener: L) {
        let mut guard = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Box::new(listener));
    }

    pub fn connect(&mut self, server_addr: SocketAddr) -> Result<(), NetError> {
        if self.socket.is_some() {
            return Err(NetError::AlreadyConnected);
        }

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(server_addr)?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;

        log::info!("connecting to {server_addr}");
        let join = Packet::new(PacketType::Join).encode()?;
        socket.send(&join)?;

        self.running.store(true, Ordering::SeqCst);

        let reader_socket = socket.try_clone()?;
        let running = Arc::clone(&self.running);
        let listener = Arc::clone(&self.listener);
        self.reader = Some(
            thread::Builder::new()
                .name(String::from("net-reader"))
                .spawn(move || reader_loop(reader_socket, running, listener))?,
        );
        self.socket = Some(socket);

        Ok(())
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        let socket = self.socket.as_ref().ok_or(NetError::NotConnected)?;
        Ok(socket.local_addr()?)
    }

    pub fn send_snapshot(&self, snapshot: &PlayerSnapshot) -> Result<(), NetError> {
        self.send_packet(PacketType::PlayerUpdate(snapshot.clone()))
    }

    fn send_packet(&self, payload: PacketType) -> Result<(), NetError> {
        let socket = self.socket.as_ref().ok_or(NetError::NotConnected)?;
        let bytes = Packet::new(payload).encode()?;
        socket.send(&bytes)?;
        Ok(())
    }

    /// Stops the reader thread and drops the socket. Safe to call when
    /// never connected and safe to call twice.
    pub fn close(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            // Best effort; the relay also frees the slot on silence.
            if let Err(e) = self.send_packet(PacketType::Leave) {
                log::debug!("leave notification not sent: {e}");
            }
        }

        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        self.socket = None;
    }
}

impl Default for NetworkClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NetworkClient {
    fn drop(&mut self) {
        self.close();
    }
}

fn reader_loop(socket: UdpSocket, running: Arc<AtomicBool>, listener: SharedListener) {
    let mut buf = [0u8; MAX_PACKET_SIZE];

    while running.load(Ordering::SeqCst) {
        let len = match socket.recv(&mut buf) {
            Ok(len) => len,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
                ) =>
            {
                // ICMP unreachable bounced off a connected UDP socket; the
                // peer may simply not be up yet.
                log::debug!("peer unreachable: {e}");
                continue;
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    log::warn!("receive failed: {e}");
                }
                break;
            }
        };

        let packet = match Packet::decode(&buf[..len]) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("dropping malformed packet: {e}");
                continue;
            }
        };

        let event = match packet.payload {
            PacketType::Welcome { role } => ClientEvent::Welcome { role },
            PacketType::PeerJoined => ClientEvent::PeerJoined,
            PacketType::PlayerUpdate(snapshot) => ClientEvent::PlayerUpdate(snapshot),
            PacketType::Join | PacketType::Leave => {
                log::debug!("ignoring server-bound packet");
                continue;
            }
        };
        dispatch(&listener, event);
    }

    dispatch(&listener, ClientEvent::Closed);
}

fn dispatch(listener: &SharedListener, event: ClientEvent) {
    let guard = listener.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(listener) = guard.as_ref() {
        listener.on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_idempotent_without_a_connection() {
        let mut client = NetworkClient::new();
        client.close();
        client.close();
        assert!(matches!(
            client.send_snapshot(&PlayerSnapshot {
                position: [0.0; 3],
                orientation: [1.0, 0.0, 0.0, 0.0],
                animations: Vec::new(),
            }),
            Err(NetError::NotConnected)
        ));
    }

    #[test]
    fn mailbox_preserves_event_order() {
        let (listener, mailbox) = mailbox();
        listener.on_event(ClientEvent::Welcome {
            role: SessionRole::FirstJoiner,
        });
        listener.on_event(ClientEvent::PeerJoined);

        let events: Vec<ClientEvent> = mailbox.drain().collect();
        assert_eq!(
            events,
            vec![
                ClientEvent::Welcome {
                    role: SessionRole::FirstJoiner
                },
                ClientEvent::PeerJoined,
            ]
        );
        assert_eq!(mailbox.drain().count(), 0);
    }

    #[test]
    fn listener_send_after_mailbox_dropped_is_harmless() {
        let (listener, mailbox) = mailbox();
        drop(mailbox);
        listener.on_event(ClientEvent::PeerJoined);
    }
}
