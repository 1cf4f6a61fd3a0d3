use rkyv::{Archive, Deserialize, Serialize};

/// Join-order role the server assigns on connect. Fixed for the lifetime
/// of the connection; only the first joiner ever passes through Waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum SessionRole {
    FirstJoiner,
    SecondJoiner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Init,
    Waiting,
    Play,
}

/// Result of [`SessionMachine::advance`]. `Unchanged` is an explicit
/// "no new phase", not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Entered(SessionPhase),
    Unchanged,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot leave Init before the server has assigned a role")]
    RoleUnknown,
    #[error("role is already assigned for this connection")]
    RoleAlreadyAssigned,
}

/// Sequences the session through Init -> (Waiting) -> Play.
///
/// Transitions are caller-driven: the app calls [`advance`] when the
/// triggering event arrives (handshake completed, peer observed). With no
/// role assigned the Init transition fails closed and the machine stays
/// in Init rather than guessing.
///
/// [`advance`]: SessionMachine::advance
#[derive(Debug)]
pub struct SessionMachine {
    phase: SessionPhase,
    role: Option<SessionRole>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Init,
            role: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn role(&self) -> Option<SessionRole> {
        self.role
    }

    /// Stores the server-assigned role. Write-once: re-assigning the same
    /// role is a no-op, a different role is rejected.
    pub fn assign_role(&mut self, role: SessionRole) -> Result<(), SessionError> {
        match self.role {
            None => {
                self.role = Some(role);
                Ok(())
            }
            Some(existing) if existing == role => Ok(()),
            Some(_) => Err(SessionError::RoleAlreadyAssigned),
        }
    }

    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        let next = match self.phase {
            SessionPhase::Init => match self.role {
                None => return Err(SessionError::RoleUnknown),
                Some(SessionRole::FirstJoiner) => SessionPhase::Waiting,
                Some(SessionRole::SecondJoiner) => SessionPhase::Play,
            },
            SessionPhase::Waiting => SessionPhase::Play,
            SessionPhase::Play => return Ok(Advance::Unchanged),
        };

        self.phase = next;
        Ok(Advance::Entered(next))
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_joiner_goes_through_waiting() {
        let mut machine = SessionMachine::new();
        machine.assign_role(SessionRole::FirstJoiner).unwrap();

        assert_eq!(
            machine.advance().unwrap(),
            Advance::Entered(SessionPhase::Waiting)
        );
        assert_eq!(
            machine.advance().unwrap(),
            Advance::Entered(SessionPhase::Play)
        );
    }

    #[test]
    fn second_joiner_skips_waiting() {
        let mut machine = SessionMachine::new();
        machine.assign_role(SessionRole::SecondJoiner).unwrap();

        assert_eq!(
            machine.advance().unwrap(),
            Advance::Entered(SessionPhase::Play)
        );
    }

    #[test]
    fn play_is_a_no_op() {
        let mut machine = SessionMachine::new();
        machine.assign_role(SessionRole::SecondJoiner).unwrap();
        machine.advance().unwrap();

        assert_eq!(machine.advance().unwrap(), Advance::Unchanged);
        assert_eq!(machine.advance().unwrap(), Advance::Unchanged);
        assert_eq!(machine.phase(), SessionPhase::Play);
    }

    #[test]
    fn unknown_role_fails_closed() {
        let mut machine = SessionMachine::new();

        assert!(matches!(machine.advance(), Err(SessionError::RoleUnknown)));
        assert_eq!(machine.phase(), SessionPhase::Init);

        // Recovers once the role shows up.
        machine.assign_role(SessionRole::FirstJoiner).unwrap();
        assert_eq!(
            machine.advance().unwrap(),
            Advance::Entered(SessionPhase::Waiting)
        );
    }

    #[test]
    fn role_is_write_once() {
        let mut machine = SessionMachine::new();
        machine.assign_role(SessionRole::FirstJoiner).unwrap();
        machine.assign_role(SessionRole::FirstJoiner).unwrap();

        assert!(matches!(
            machine.assign_role(SessionRole::SecondJoiner),
            Err(SessionError::RoleAlreadyAssigned)
        ));
        assert_eq!(machine.role(), Some(SessionRole::FirstJoiner));
    }
}
