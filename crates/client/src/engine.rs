use glam::Vec3;

use spar::{BodyPart, EngineHooks, PoseUpdate, RemoteReplica};

/// Engine adapter for running without a renderer or physics backend:
/// fixed camera, walk vector integrated directly on the ground plane.
/// A real build would put the scene graph and the character's capsule
/// body behind this same interface.
pub struct HeadlessEngine {
    position: Vec3,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
        }
    }

    /// Channel names the stand-in character model exposes.
    pub fn channels() -> Vec<&'static str> {
        BodyPart::ALL.iter().map(|p| p.name()).collect()
    }
}

impl EngineHooks for HeadlessEngine {
    fn camera_forward(&self) -> Vec3 {
        Vec3::Z
    }

    fn camera_left(&self) -> Vec3 {
        Vec3::X
    }

    fn step_character(&mut self, pose: &PoseUpdate, dt: f32) -> Vec3 {
        if pose.jump {
            log::debug!("jump ignored without a physics body");
        }
        if let Some(change) = &pose.animation {
            log::debug!("animation -> {} (blend {}s)", change.clip, change.blend_secs);
        }

        self.position += pose.walk * dt;
        self.position
    }

    fn sync_replica(&mut self, replica: &RemoteReplica) {
        log::trace!(
            "peer at {:?}, {}",
            replica.position(),
            replica.animation(BodyPart::Body)
        );
    }
}
