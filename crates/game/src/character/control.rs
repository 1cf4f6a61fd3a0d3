use glam::{Quat, Vec3};

use crate::net::PlayerSnapshot;

use super::{AnimationKey, BodyPart, Direction, IntentEvent, MovementIntent, Rig};

/// Tuning constants for the local character. The capsule dimensions are
/// surfaced for whatever physics adapter hosts the character; the control
/// itself never simulates.
#[derive(Debug, Clone)]
pub struct CharacterConfig {
    pub move_speed: f32,
    /// Multiplier applied by the physics adapter to its base jump force.
    pub jump_boost: f32,
    /// Blend time for local animation switches. Remote replicas apply
    /// switches instantly; see [`super::RemoteReplica`].
    pub blend_secs: f32,
    pub capsule_radius: f32,
    pub capsule_height: f32,
    pub capsule_mass: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            jump_boost: 2.0,
            blend_secs: 0.3,
            capsule_radius: 0.5,
            capsule_height: 1.0,
            capsule_mass: 1.0,
        }
    }
}

/// An animation switch the physics/render adapter should start this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationChange {
    pub key: AnimationKey,
    pub clip: String,
    pub blend_secs: f32,
}

/// One tick's worth of output from the local control, consumed by the
/// engine adapter. `walk` is a velocity; the adapter owns integration and
/// collision and feeds the resolved position back via
/// [`CharacterControl::set_position`].
#[derive(Debug, Clone, PartialEq)]
pub struct PoseUpdate {
    pub walk: Vec3,
    pub facing: Vec3,
    pub jump: bool,
    pub animation: Option<AnimationChange>,
}

/// Movement, facing and animation state for the locally owned character.
///
/// Intent flags are only ever mutated through [`set_intent`]; the per-tick
/// pose is derived in [`tick`] from whatever the flags say at that moment.
///
/// [`set_intent`]: CharacterControl::set_intent
/// [`tick`]: CharacterControl::tick
pub struct CharacterControl {
    config: CharacterConfig,
    rig: Rig,
    intent: MovementIntent,
    jump_pending: bool,
    position: Vec3,
    facing: Vec3,
    active: AnimationKey,
}

impl CharacterControl {
    pub fn new(rig: Rig, config: CharacterConfig) -> Self {
        Self {
            config,
            rig,
            intent: MovementIntent::default(),
            jump_pending: false,
            position: Vec3::ZERO,
            facing: Vec3::ZERO,
            active: AnimationKey::Idle,
        }
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    /// Updates one movement flag. No recomputation happens here; the next
    /// [`tick`](Self::tick) picks the change up.
    pub fn set_intent(&mut self, direction: Direction, pressed: bool) {
        self.intent.set_direction(direction, pressed);
    }

    pub fn on_intent(&mut self, event: IntentEvent) {
        match event {
            IntentEvent::Move { direction, pressed } => self.set_intent(direction, pressed),
            IntentEvent::Jump => self.jump_pending = true,
        }
    }

    /// `Move` iff any movement flag is held, re-evaluated every call. No
    /// hysteresis: a one-tick flicker of a flag flips the animation that
    /// same tick.
    pub fn active_animation(&self) -> AnimationKey {
        if self.intent.is_moving() {
            AnimationKey::Move
        } else {
            AnimationKey::Idle
        }
    }

    /// Computes this tick's walk vector from the held flags and the camera
    /// orientation.
    ///
    /// Both camera vectors are flattened to the movement plane before use.
    /// The two axes are independent and additive: a diagonal is the plain
    /// vector sum, never renormalized. Within one axis the first flag
    /// wins; forward dominates backward and left dominates right when both
    /// are held.
    ///
    /// `walk` is a velocity in units per second. `_dt` is part of the tick
    /// contract for adapters that need it; the control itself integrates
    /// nothing.
    pub fn tick(&mut self, _dt: f32, cam_forward: Vec3, cam_left: Vec3) -> PoseUpdate {
        let forward_dir = Vec3::new(cam_forward.x, 0.0, cam_forward.z);
        let left_dir = Vec3::new(cam_left.x, 0.0, cam_left.z);
        let speed = self.config.move_speed;

        let mut walk = Vec3::ZERO;

        if self.intent.contains(MovementIntent::FORWARD) {
            walk += forward_dir * speed;
            self.facing = walk;
        } else if self.intent.contains(MovementIntent::BACKWARD) {
            walk -= forward_dir * speed;
            self.facing = walk;
        }

        if self.intent.contains(MovementIntent::LEFT) {
            walk += left_dir * speed;
            self.facing = walk;
        } else if self.intent.contains(MovementIntent::RIGHT) {
            walk -= left_dir * speed;
            self.facing = walk;
        }

        let desired = self.active_animation();
        let animation = if desired != self.active {
            self.active = desired;
            Some(AnimationChange {
                key: desired,
                clip: self.rig.clip(desired).to_owned(),
                blend_secs: self.config.blend_secs,
            })
        } else {
            None
        };

        PoseUpdate {
            walk,
            facing: self.facing,
            jump: std::mem::take(&mut self.jump_pending),
            animation,
        }
    }

    /// Resolved position fed back by the physics adapter after it consumed
    /// the tick's [`PoseUpdate`].
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Yaw-only unit quaternion turning the character toward the last
    /// direction it walked in. Identity until the character first moves.
    pub fn orientation(&self) -> Quat {
        if self.facing.length_squared() <= f32::EPSILON {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_y(self.facing.x.atan2(self.facing.z))
        }
    }

    /// Captures the current pose and per-channel animation selection for
    /// the wire. Snapshots are transient; one is built fresh per send.
    pub fn snapshot(&self) -> PlayerSnapshot {
        let rotation = self.orientation();
        PlayerSnapshot {
            position: self.position.to_array(),
            orientation: [rotation.w, rotation.x, rotation.y, rotation.z],
            animations: BodyPart::ALL
                .iter()
                .map(|_| self.rig.clip(self.active).to_owned())
                .collect(),
        }
    }
}
