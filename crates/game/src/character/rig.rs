use serde::{Deserialize, Serialize};

/// Number of independently animated body-part channels on the character
/// model. The wire schema carries exactly one animation name per channel,
/// in [`BodyPart::ALL`] order.
pub const BODY_PART_COUNT: usize = 9;

/// The body-part channels the character model is split into. Each channel
/// runs its own animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    Beards,
    Body,
    Bottoms,
    Eyelashes,
    Eyes,
    Hair,
    Moustaches,
    Shoes,
    Tops,
}

impl BodyPart {
    /// All channels, in wire order. Both ends agree on this order out of
    /// band; it is never carried in a message.
    pub const ALL: [BodyPart; BODY_PART_COUNT] = [
        BodyPart::Beards,
        BodyPart::Body,
        BodyPart::Bottoms,
        BodyPart::Eyelashes,
        BodyPart::Eyes,
        BodyPart::Hair,
        BodyPart::Moustaches,
        BodyPart::Shoes,
        BodyPart::Tops,
    ];

    /// The node name the channel has inside the character model.
    pub fn name(self) -> &'static str {
        match self {
            BodyPart::Beards => "Beards",
            BodyPart::Body => "Body",
            BodyPart::Bottoms => "Bottoms",
            BodyPart::Eyelashes => "Eyelashes",
            BodyPart::Eyes => "Eyes",
            BodyPart::Hair => "Hair",
            BodyPart::Moustaches => "Moustaches",
            BodyPart::Shoes => "Shoes",
            BodyPart::Tops => "Tops",
        }
    }
}

/// Logical animation state of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKey {
    Idle,
    Move,
}

/// Maps logical animation keys to the clip names the character model
/// actually uses. Different models name their clips differently; this is
/// the only place that knows the real names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSet {
    pub idle: String,
    #[serde(rename = "move")]
    pub moving: String,
}

impl Default for AnimationSet {
    fn default() -> Self {
        Self {
            idle: String::from("Idle"),
            moving: String::from("Move"),
        }
    }
}

impl AnimationSet {
    pub fn clip(&self, key: AnimationKey) -> &str {
        match key {
            AnimationKey::Idle => &self.idle,
            AnimationKey::Move => &self.moving,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error("character model has no '{0}' channel")]
    MissingChannel(&'static str),
}

/// The character rig: validated channel list plus the clip-name table.
///
/// Construction fails if the model is missing any expected body-part
/// channel. There is no degraded mode; a partial rig would desync the
/// animation schema both ends rely on.
#[derive(Debug, Clone)]
pub struct Rig {
    animations: AnimationSet,
}

impl Rig {
    pub fn new<S: AsRef<str>>(channels: &[S], animations: AnimationSet) -> Result<Self, RigError> {
        for part in BodyPart::ALL {
            if !channels.iter().any(|c| c.as_ref() == part.name()) {
                return Err(RigError::MissingChannel(part.name()));
            }
        }

        Ok(Self { animations })
    }

    pub fn clip(&self, key: AnimationKey) -> &str {
        self.animations.clip(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_channel_list() -> Vec<&'static str> {
        BodyPart::ALL.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn builds_against_a_complete_model() {
        let rig = Rig::new(&full_channel_list(), AnimationSet::default()).unwrap();
        assert_eq!(rig.clip(AnimationKey::Idle), "Idle");
        assert_eq!(rig.clip(AnimationKey::Move), "Move");
    }

    #[test]
    fn missing_channel_is_fatal() {
        let mut channels = full_channel_list();
        channels.retain(|c| *c != "Hair");

        let err = Rig::new(&channels, AnimationSet::default()).unwrap_err();
        assert!(matches!(err, RigError::MissingChannel("Hair")));
    }

    #[test]
    fn extra_channels_are_fine() {
        let mut channels = full_channel_list();
        channels.push("Hat");
        assert!(Rig::new(&channels, AnimationSet::default()).is_ok());
    }

    #[test]
    fn clip_names_follow_the_set() {
        let set = AnimationSet {
            idle: String::from("breathing_idle"),
            moving: String::from("walk_cycle"),
        };
        let rig = Rig::new(&full_channel_list(), set).unwrap();
        assert_eq!(rig.clip(AnimationKey::Move), "walk_cycle");
    }

    #[test]
    fn channel_order_matches_the_schema_constant() {
        assert_eq!(BodyPart::ALL.len(), BODY_PART_COUNT);
        assert_eq!(BodyPart::ALL[0], BodyPart::Beards);
        assert_eq!(BodyPart::ALL[BODY_PART_COUNT - 1], BodyPart::Tops);
    }
}
