use crate::app::EngineHooks;
use crate::character::{CharacterControl, RemoteReplica};
use crate::net::NetworkClient;

use super::{SessionMachine, SessionPhase};

/// Shared collaborators a phase may touch while it is attached. Built
/// fresh for each callback; phases hold no references of their own.
pub struct PhaseContext<'a> {
    pub machine: &'a mut SessionMachine,
    pub control: &'a mut CharacterControl,
    pub replica: &'a mut RemoteReplica,
    pub client: &'a mut NetworkClient,
    pub engine: &'a mut dyn EngineHooks,
}

/// One stage of the session. Exactly one phase object is attached at any
/// time; the app runs `on_detach` to completion before attaching the next
/// phase, so two phases never overlap on the shared character state.
pub trait Phase {
    fn kind(&self) -> SessionPhase;

    fn on_attach(&mut self, _ctx: &mut PhaseContext) {}

    fn on_tick(&mut self, _ctx: &mut PhaseContext, _dt: f32) {}

    fn on_detach(&mut self, _ctx: &mut PhaseContext) {}
}

pub fn phase_object(kind: SessionPhase) -> Box<dyn Phase> {
    match kind {
        SessionPhase::Init => Box::new(InitPhase),
        SessionPhase::Waiting => Box::new(WaitingPhase),
        SessionPhase::Play => Box::new(PlayPhase),
    }
}

/// Handshake in flight: the join request is out, the Welcome has not
/// arrived yet.
pub struct InitPhase;

impl Phase for InitPhase {
    fn kind(&self) -> SessionPhase {
        SessionPhase::Init
    }

    fn on_attach(&mut self, _ctx: &mut PhaseContext) {
        log::info!("session starting, waiting for the server's welcome");
    }
}

/// First joiner parked until a second player shows up. Nothing ticks
/// here; snapshots received early are dropped by the app.
pub struct WaitingPhase;

impl Phase for WaitingPhase {
    fn kind(&self) -> SessionPhase {
        SessionPhase::Waiting
    }

    fn on_attach(&mut self, _ctx: &mut PhaseContext) {
        log::info!("waiting for a second player");
    }
}

/// The match proper. Each tick: derive the pose from the intent flags,
/// hand it to the engine adapter for integration, read the resolved
/// position back, and send a fresh snapshot to the peer.
pub struct PlayPhase;

impl Phase for PlayPhase {
    fn kind(&self) -> SessionPhase {
        SessionPhase::Play
    }

    fn on_attach(&mut self, _ctx: &mut PhaseContext) {
        log::info!("both players present, match started");
    }

    fn on_tick(&mut self, ctx: &mut PhaseContext, dt: f32) {
        let cam_forward = ctx.engine.camera_forward();
        let cam_left = ctx.engine.camera_left();

        let pose = ctx.control.tick(dt, cam_forward, cam_left);
        let position = ctx.engine.step_character(&pose, dt);
        ctx.control.set_position(position);

        // Fire-and-forget: a lost snapshot is replaced by the next tick's.
        if let Err(e) = ctx.client.send_snapshot(&ctx.control.snapshot()) {
            log::warn!("snapshot send failed: {e}");
        }
    }
}
