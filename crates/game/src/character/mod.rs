mod control;
mod intent;
mod replica;
mod rig;

pub use control::{AnimationChange, CharacterConfig, CharacterControl, PoseUpdate};
pub use intent::{Direction, IntentEvent, MovementIntent};
pub use replica::RemoteReplica;
pub use rig::{AnimationKey, AnimationSet, BodyPart, Rig, RigError, BODY_PART_COUNT};
