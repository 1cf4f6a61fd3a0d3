mod machine;
mod phase;

pub use machine::{Advance, SessionError, SessionMachine, SessionPhase, SessionRole};
pub use phase::{phase_object, InitPhase, Phase, PhaseContext, PlayPhase, WaitingPhase};
