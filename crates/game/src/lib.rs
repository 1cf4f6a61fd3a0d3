pub mod app;
pub mod character;
pub mod net;
pub mod session;

pub use app::{AppError, EngineHooks, GameApp, Lifecycle};
pub use character::{
    AnimationChange, AnimationKey, AnimationSet, BodyPart, CharacterConfig, CharacterControl,
    Direction, IntentEvent, MovementIntent, PoseUpdate, RemoteReplica, Rig, RigError,
    BODY_PART_COUNT,
};
pub use net::{
    mailbox, ClientEvent, ClientListener, EventMailbox, NetError, NetworkClient, Packet,
    PacketError, PacketType, PlayerSnapshot, Relay, DEFAULT_PORT, DEFAULT_TICK_RATE,
    MAX_PACKET_SIZE,
};
pub use session::{
    Advance, Phase, PhaseContext, SessionError, SessionMachine, SessionPhase, SessionRole,
};
