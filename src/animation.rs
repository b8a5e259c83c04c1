use std::f32::consts::TAU;

use glam::Vec3;

use crate::motion::MotionFlag;
use crate::scene_graph::{CharacterScene, NodeId, PoseOffset, Scene};

/// `amplitude * sin(frequency * t + phase)`, frequency in radians per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

impl Wave {
    pub const fn new(amplitude: f32, frequency: f32, phase: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase,
        }
    }

    pub fn sample(&self, t: f32) -> f32 {
        self.amplitude * (self.frequency * t + self.phase).sin()
    }

    pub fn period(&self) -> f32 {
        TAU / self.frequency.abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    TranslateX,
    TranslateY,
    TranslateZ,
    RotateX,
    RotateY,
    RotateZ,
}

impl Channel {
    fn offset(self, value: f32) -> PoseOffset {
        let mut offset = PoseOffset::default();
        match self {
            Channel::TranslateX => offset.translation = Vec3::X * value,
            Channel::TranslateY => offset.translation = Vec3::Y * value,
            Channel::TranslateZ => offset.translation = Vec3::Z * value,
            Channel::RotateX => offset.rotation = Vec3::X * value,
            Channel::RotateY => offset.rotation = Vec3::Y * value,
            Channel::RotateZ => offset.rotation = Vec3::Z * value,
        }
        offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleTrack {
    pub node: NodeId,
    pub channel: Channel,
    pub wave: Wave,
}

/// Breathing, bobbing and swaying. Every frame starts from the rest pose, so
/// the motion stays bounded however long the scene runs.
pub struct IdleAnimator {
    tracks: Vec<IdleTrack>,
    motion: MotionFlag,
}

impl IdleAnimator {
    pub fn new(motion: MotionFlag) -> Self {
        Self {
            tracks: Vec::new(),
            motion,
        }
    }

    pub fn for_character(character: &CharacterScene, motion: MotionFlag) -> Self {
        let mut animator = Self::new(motion);

        // Breathing bob and a slow sway of the whole bear
        animator.add_track(character.character, Channel::TranslateY, Wave::new(0.08, 0.8, 0.0));
        animator.add_track(character.character, Channel::RotateZ, Wave::new(0.03, 0.5, 0.0));

        // The envelope wobbles on its own rhythm
        animator.add_track(character.envelope, Channel::RotateZ, Wave::new(0.05, 1.2, 0.7));
        animator.add_track(character.envelope, Channel::TranslateY, Wave::new(0.02, 1.5, 1.3));

        animator
    }

    pub fn add_track(&mut self, node: NodeId, channel: Channel, wave: Wave) {
        self.tracks.push(IdleTrack {
            node,
            channel,
            wave,
        });
    }

    pub fn tracks(&self) -> &[IdleTrack] {
        &self.tracks
    }

    /// Combined offset for `node` at time `t`.
    pub fn offset(&self, node: NodeId, t: f32) -> PoseOffset {
        self.tracks
            .iter()
            .filter(|track| track.node == node)
            .fold(PoseOffset::default(), |mut acc, track| {
                let offset = track.channel.offset(track.wave.sample(t));
                acc.translation += offset.translation;
                acc.rotation += offset.rotation;
                acc
            })
    }

    /// Adds this frame's offsets to the scene. No-op when motion is reduced.
    pub fn apply(&self, scene: &mut Scene, t: f32) {
        if self.motion.is_reduced() {
            return;
        }

        for track in &self.tracks {
            scene.offset_node(track.node, track.channel.offset(track.wave.sample(t)));
        }
    }
}
