use bitflags::bitflags;

bitflags! {
    /// Which way the player currently wants to move. Any subset of the four
    /// flags may be held at once; diagonals are just two flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MovementIntent: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl MovementIntent {
    pub fn set_direction(&mut self, direction: Direction, pressed: bool) {
        self.set(direction.flag(), pressed);
    }

    pub fn is_moving(self) -> bool {
        !self.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    fn flag(self) -> MovementIntent {
        match self {
            Direction::Forward => MovementIntent::FORWARD,
            Direction::Backward => MovementIntent::BACKWARD,
            Direction::Left => MovementIntent::LEFT,
            Direction::Right => MovementIntent::RIGHT,
        }
    }
}

/// Edge events delivered by the host's input layer. Which physical keys map
/// to these is the host's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentEvent {
    Move { direction: Direction, pressed: bool },
    Jump,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_update_flags() {
        let mut intent = MovementIntent::default();
        assert!(!intent.is_moving());

        intent.set_direction(Direction::Forward, true);
        intent.set_direction(Direction::Left, true);
        assert!(intent.contains(MovementIntent::FORWARD | MovementIntent::LEFT));
        assert!(intent.is_moving());

        intent.set_direction(Direction::Forward, false);
        assert!(!intent.contains(MovementIntent::FORWARD));
        assert!(intent.is_moving());

        intent.set_direction(Direction::Left, false);
        assert!(!intent.is_moving());
    }

    #[test]
    fn opposite_directions_may_be_held_together() {
        let mut intent = MovementIntent::default();
        intent.set_direction(Direction::Forward, true);
        intent.set_direction(Direction::Backward, true);
        assert!(intent.contains(MovementIntent::FORWARD | MovementIntent::BACKWARD));
    }
}
