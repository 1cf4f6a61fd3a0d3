use glam::{Quat, Vec3};

use crate::net::{PacketError, PlayerSnapshot};

use super::{BodyPart, Rig, BODY_PART_COUNT};

/// The remote player's last received pose and animation selection.
///
/// The replica is never simulated: no physics, no prediction, no
/// interpolation. Each accepted snapshot overwrites the whole state,
/// last write wins. Animation names are applied with no blend time,
/// unlike the local control's 0.3 s blend; see DESIGN.md for why the
/// asymmetry is kept.
pub struct RemoteReplica {
    position: Vec3,
    orientation: Quat,
    animations: [String; BODY_PART_COUNT],
}

impl RemoteReplica {
    pub fn new(rig: &Rig) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            animations: std::array::from_fn(|_| rig.clip(super::AnimationKey::Idle).to_owned()),
        }
    }

    /// Overwrites the replica with a received snapshot. A snapshot that
    /// fails validation is skipped whole; there is no partial apply.
    pub fn apply(&mut self, snapshot: &PlayerSnapshot) -> Result<(), PacketError> {
        snapshot.validate()?;

        self.position = Vec3::from_array(snapshot.position);
        let [w, x, y, z] = snapshot.orientation;
        self.orientation = Quat::from_xyzw(x, y, z, w);
        for (slot, name) in self.animations.iter_mut().zip(&snapshot.animations) {
            slot.clone_from(name);
        }

        Ok(())
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn animation(&self, part: BodyPart) -> &str {
        let index = BodyPart::ALL
            .iter()
            .position(|p| *p == part)
            .unwrap_or_default();
        &self.animations[index]
    }

    pub fn animations(&self) -> &[String; BODY_PART_COUNT] {
        &self.animations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::AnimationSet;

    fn replica() -> RemoteReplica {
        let channels: Vec<&str> = BodyPart::ALL.iter().map(|p| p.name()).collect();
        let rig = Rig::new(&channels, AnimationSet::default()).unwrap();
        RemoteReplica::new(&rig)
    }

    fn snapshot(x: f32, anim: &str) -> PlayerSnapshot {
        PlayerSnapshot {
            position: [x, 0.0, 0.0],
            orientation: [1.0, 0.0, 0.0, 0.0],
            animations: vec![anim.to_owned(); BODY_PART_COUNT],
        }
    }

    #[test]
    fn starts_idle_at_origin() {
        let replica = replica();
        assert_eq!(replica.position(), Vec3::ZERO);
        assert_eq!(replica.animation(BodyPart::Body), "Idle");
    }

    #[test]
    fn apply_overwrites_everything() {
        let mut replica = replica();
        replica.apply(&snapshot(4.0, "Move")).unwrap();

        assert_eq!(replica.position(), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(replica.orientation(), Quat::IDENTITY);
        assert!(replica.animations().iter().all(|a| a == "Move"));
    }

    #[test]
    fn last_write_wins() {
        let mut replica = replica();
        replica.apply(&snapshot(100.0, "Move")).unwrap();
        replica.apply(&snapshot(-3.0, "Idle")).unwrap();

        assert_eq!(replica.position(), Vec3::new(-3.0, 0.0, 0.0));
        assert!(replica.animations().iter().all(|a| a == "Idle"));
    }

    #[test]
    fn rejected_snapshot_leaves_state_untouched() {
        let mut replica = replica();
        replica.apply(&snapshot(7.0, "Move")).unwrap();

        let mut short = snapshot(50.0, "Idle");
        short.animations.pop();
        assert!(replica.apply(&short).is_err());

        let mut nan = snapshot(50.0, "Idle");
        nan.position[0] = f32::NAN;
        assert!(replica.apply(&nan).is_err());

        assert_eq!(replica.position(), Vec3::new(7.0, 0.0, 0.0));
        assert!(replica.animations().iter().all(|a| a == "Move"));
    }
}
