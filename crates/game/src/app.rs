use std::net::SocketAddr;

use glam::Vec3;

use crate::character::{CharacterControl, IntentEvent, PoseUpdate, RemoteReplica};
use crate::net::{mailbox, ClientEvent, EventMailbox, NetError, NetworkClient};
use crate::session::{
    phase_object, Advance, Phase, PhaseContext, SessionMachine, SessionPhase, SessionRole,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Net(#[from] NetError),
}

/// The three hooks the host runtime drives. Nothing else of the core is
/// exposed to the host loop.
pub trait Lifecycle {
    fn on_start(&mut self) -> Result<(), AppError>;
    fn on_tick(&mut self, dt: f32);
    fn on_shutdown(&mut self);
}

/// What the core needs from the surrounding engine: camera orientation in,
/// pose integration and replica presentation out. Adapters own all
/// rendering and physics.
pub trait EngineHooks {
    fn camera_forward(&self) -> Vec3;

    fn camera_left(&self) -> Vec3;

    /// Consumes one tick's pose update and returns the character's
    /// resolved position after integration and collision.
    fn step_character(&mut self, pose: &PoseUpdate, dt: f32) -> Vec3;

    /// Called after a received snapshot was applied to the replica.
    fn sync_replica(&mut self, replica: &RemoteReplica);
}

/// Owns the session: one local character, one remote replica, the network
/// client and the phase machine, wired together under the host's
/// [`Lifecycle`] hooks.
///
/// All game state is mutated on the host's tick thread only. The network
/// reader thread never touches it; received events queue in a mailbox the
/// tick drains.
pub struct GameApp<E: EngineHooks> {
    machine: SessionMachine,
    control: CharacterControl,
    replica: RemoteReplica,
    client: NetworkClient,
    mailbox: EventMailbox,
    engine: E,
    phase: Box<dyn Phase>,
    server_addr: SocketAddr,
}

impl<E: EngineHooks> GameApp<E> {
    pub fn new(control: CharacterControl, engine: E, server_addr: SocketAddr) -> Self {
        let client = NetworkClient::new();
        let (listener, mailbox) = mailbox();
        client.register_listener(listener);

        let replica = RemoteReplica::new(control.rig());

        Self {
            machine: SessionMachine::new(),
            control,
            replica,
            client,
            mailbox,
            engine,
            phase: phase_object(SessionPhase::Init),
            server_addr,
        }
    }

    /// Forwards one input edge event to the local character.
    pub fn handle_input(&mut self, event: IntentEvent) {
        self.control.on_intent(event);
    }

    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    pub fn role(&self) -> Option<SessionRole> {
        self.machine.role()
    }

    pub fn control(&self) -> &CharacterControl {
        &self.control
    }

    pub fn replica(&self) -> &RemoteReplica {
        &self.replica
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Welcome { role } => {
                log::info!("welcomed as {role:?}");
                if let Err(e) = self.machine.assign_role(role) {
                    log::error!("role assignment rejected: {e}");
                    return;
                }
                self.advance_phase();
            }
            ClientEvent::PeerJoined => {
                self.advance_phase();
            }
            ClientEvent::PlayerUpdate(snapshot) => {
                if self.machine.phase() != SessionPhase::Play {
                    // The peer's first updates can outrun our own
                    // transition into play.
                    log::debug!("dropping snapshot received outside of play");
                    return;
                }
                match self.replica.apply(&snapshot) {
                    Ok(()) => self.engine.sync_replica(&self.replica),
                    Err(e) => log::warn!("skipping bad snapshot: {e}"),
                }
            }
            ClientEvent::Closed => {
                log::info!("connection closed");
            }
        }
    }

    /// Runs the machine one step and, when a transition applies, swaps
    /// phase objects: the old phase's detach runs to completion before
    /// the next phase attaches, so exactly one phase is ever active.
    fn advance_phase(&mut self) {
        let entered = match self.machine.advance() {
            Ok(Advance::Entered(next)) => next,
            Ok(Advance::Unchanged) => return,
            Err(e) => {
                log::error!("session transition failed: {e}");
                return;
            }
        };

        let Self {
            machine,
            control,
            replica,
            client,
            engine,
            phase,
            ..
        } = self;
        let mut ctx = PhaseContext {
            machine,
            control,
            replica,
            client,
            engine,
        };

        phase.on_detach(&mut ctx);
        let mut next_phase = phase_object(entered);
        next_phase.on_attach(&mut ctx);
        *phase = next_phase;
    }
}

impl<E: EngineHooks> Lifecycle for GameApp<E> {
    fn on_start(&mut self) -> Result<(), AppError> {
        self.client.connect(self.server_addr)?;

        let Self {
            machine,
            control,
            replica,
            client,
            engine,
            phase,
            ..
        } = self;
        let mut ctx = PhaseContext {
            machine,
            control,
            replica,
            client,
            engine,
        };
        phase.on_attach(&mut ctx);

        Ok(())
    }

    fn on_tick(&mut self, dt: f32) {
        let events: Vec<ClientEvent> = self.mailbox.drain().collect();
        for event in events {
            self.handle_event(event);
        }

        let Self {
            machine,
            control,
            replica,
            client,
            engine,
            phase,
            ..
        } = self;
        let mut ctx = PhaseContext {
            machine,
            control,
            replica,
            client,
            engine,
        };
        phase.on_tick(&mut ctx, dt);
    }

    fn on_shutdown(&mut self) {
        {
            let Self {
                machine,
                control,
                replica,
                client,
                engine,
                phase,
                ..
            } = self;
            let mut ctx = PhaseContext {
                machine,
                control,
                replica,
                client,
                engine,
            };
            phase.on_detach(&mut ctx);
        }

        self.client.close();
    }
}
