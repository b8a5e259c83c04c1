use std::path::PathBuf;
use std::time::Duration;

use glam::Vec2;

use crate::reveal::RevealStage;

#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Uniform scale of the whole character
    pub scale: f32,
    pub fur_color: u32,
    pub fur_dark_color: u32,
    pub nose_color: u32,
    pub eye_color: u32,
    pub envelope_color: u32,
    pub envelope_flap_color: u32,
    pub heart_color: u32,
    /// Seconds for the envelope flap to swing open
    pub flap_open_secs: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            fur_color: 0xC4A484,
            fur_dark_color: 0xA67B5B,
            nose_color: 0x3D2914,
            eye_color: 0x1A1A1A,
            envelope_color: 0xFFF8E7,
            envelope_flap_color: 0xE8D5C4,
            heart_color: 0xE74C3C,
            flap_open_secs: 0.6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PointerConfig {
    /// Pitch reached with the pointer at the top or bottom edge, radians
    pub max_pitch: f32,
    /// Yaw reached with the pointer at the left or right edge, radians
    pub max_yaw: f32,
    /// Fraction of the remaining distance covered per 60 Hz frame while hovering
    pub follow_rate: f32,
    /// Same, while drifting on its own
    pub drift_rate: f32,
    pub drift_amplitude: Vec2,
    /// Angular frequencies of the (pitch, yaw) drift, radians per second
    pub drift_frequency: Vec2,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            max_pitch: 15f32.to_radians(),
            max_yaw: 20f32.to_radians(),
            follow_rate: 0.1,
            drift_rate: 0.05,
            drift_amplitude: Vec2::new(0.05, 0.2),
            drift_frequency: Vec2::new(0.15, 0.3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealStep {
    /// Measured from `start()`
    pub delay: Duration,
    pub stage: RevealStage,
}

#[derive(Debug, Clone)]
pub struct RevealConfig {
    pub timeline: Vec<RevealStep>,
    /// Gap between `start()` and completion when motion is reduced
    pub reduced_motion_delay: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            timeline: vec![
                RevealStep {
                    delay: Duration::ZERO,
                    stage: RevealStage::Opening,
                },
                RevealStep {
                    delay: Duration::from_millis(800),
                    stage: RevealStage::Transitioning,
                },
                RevealStep {
                    delay: Duration::from_millis(2200),
                    stage: RevealStage::Revealed,
                },
            ],
            reduced_motion_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DodgeConfig {
    /// Usable interior of the area the button may wander in, pixels
    pub container_size: Vec2,
    pub element_size: Vec2,
    pub caption_duration: Duration,
    pub easter_egg_threshold: u32,
}

impl Default for DodgeConfig {
    fn default() -> Self {
        Self {
            container_size: Vec2::new(336.0, 144.0),
            element_size: Vec2::new(96.0, 44.0),
            caption_duration: Duration::from_millis(1500),
            easter_egg_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExperienceConfig {
    pub scene: SceneConfig,
    pub pointer: PointerConfig,
    pub reveal: RevealConfig,
    pub dodge: DodgeConfig,
    pub reduced_motion: bool,
    pub prop_image: Option<PathBuf>,
}

pub const REDUCED_MOTION_ENV: &str = "TEDDY_REDUCED_MOTION";
pub const PROP_IMAGE_ENV: &str = "TEDDY_PROP_IMAGE";

impl ExperienceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(REDUCED_MOTION_ENV) {
            config.reduced_motion = parse_flag(&value);
        }

        config.prop_image = lookup(PROP_IMAGE_ENV)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "reduce"
    )
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub clear_color: wgpu::Color,
    pub ambient: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color {
                r: 0.010,
                g: 0.010,
                b: 0.010,
                a: 1.0,
            },
            ambient: 0.5,
        }
    }
}
