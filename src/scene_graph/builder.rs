use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::config::SceneConfig;
use crate::scene_graph::node::{NodeId, SceneNode};
use crate::scene_graph::primitive::{Material, Primitive, Shape};
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Pose;

pub const CHARACTER_NODE: &str = "Teddy";
pub const ENVELOPE_NODE: &str = "Envelope";
pub const ENVELOPE_FLAP_NODE: &str = "Envelope Flap";
pub const HEART_SEAL_NODE: &str = "Heart Seal";
pub const PICTURE_CARD_NODE: &str = "Picture Card";

/// The built scene plus the handles the animators and the reveal need.
pub struct CharacterScene {
    pub scene: Scene,
    pub character: NodeId,
    pub envelope: NodeId,
    pub envelope_flap: NodeId,
    pub heart_seal: NodeId,
    pub picture_card: NodeId,
}

struct Palette {
    fur: Material,
    fur_dark: Material,
    nose: Material,
    eye: Material,
    eye_highlight: Material,
    envelope: Material,
    envelope_flap: Material,
    heart: Material,
    card: Material,
}

impl Palette {
    fn from_config(config: &SceneConfig) -> Self {
        Self {
            fur: Material::from_hex(config.fur_color),
            fur_dark: Material::from_hex(config.fur_dark_color),
            nose: Material::from_hex(config.nose_color),
            eye: Material::from_hex(config.eye_color),
            eye_highlight: Material::from_hex(0xFFFFFF).with_emissive(0.3),
            envelope: Material::from_hex(config.envelope_color),
            envelope_flap: Material::from_hex(config.envelope_flap_color),
            heart: Material::from_hex(config.heart_color).with_emissive(0.2),
            card: Material::from_hex(0xFFFFFF).textured(),
        }
    }
}

fn sphere(radius: f32, material: Material) -> Primitive {
    Primitive::new(Shape::Sphere { radius }, material)
}

fn capsule(radius: f32, length: f32, material: Material) -> Primitive {
    Primitive::new(Shape::Capsule { radius, length }, material)
}

fn at(x: f32, y: f32, z: f32) -> Pose {
    Pose::at(Vec3::new(x, y, z))
}

/// Builds the teddy bear holding an envelope. Topology never depends on
/// config; only colours and the overall scale do.
pub fn build(config: &SceneConfig) -> CharacterScene {
    let palette = Palette::from_config(config);
    let mut scene = Scene::new();

    let character = scene.add_node(SceneNode::group(
        CHARACTER_NODE,
        at(0.0, -0.2, 0.0).with_scale(Vec3::splat(config.scale)),
    ));

    let parts = [
        ("Body", sphere(1.0, palette.fur), at(0.0, 0.0, 0.0)),
        ("Belly", sphere(0.55, palette.fur_dark), at(0.0, 0.0, 0.85)),
        ("Head", sphere(0.75, palette.fur), at(0.0, 1.35, 0.3)),
        ("Snout", sphere(0.32, palette.fur_dark), at(0.0, 1.15, 0.95)),
        ("Nose", sphere(0.12, palette.nose), at(0.0, 1.22, 1.22)),
        ("Left Ear", sphere(0.28, palette.fur), at(-0.55, 1.95, 0.15)),
        (
            "Left Inner Ear",
            sphere(0.15, palette.fur_dark),
            at(-0.55, 1.95, 0.25),
        ),
        ("Right Ear", sphere(0.28, palette.fur), at(0.55, 1.95, 0.15)),
        (
            "Right Inner Ear",
            sphere(0.15, palette.fur_dark),
            at(0.55, 1.95, 0.25),
        ),
        ("Left Eye", sphere(0.12, palette.eye), at(-0.25, 1.45, 0.85)),
        (
            "Left Eye Highlight",
            sphere(0.04, palette.eye_highlight),
            at(-0.22, 1.48, 0.95),
        ),
        ("Right Eye", sphere(0.12, palette.eye), at(0.25, 1.45, 0.85)),
        (
            "Right Eye Highlight",
            sphere(0.04, palette.eye_highlight),
            at(0.28, 1.48, 0.95),
        ),
        (
            "Left Arm",
            capsule(0.22, 0.5, palette.fur),
            at(-0.95, 0.3, 0.4).with_rotation(Vec3::new(0.4, 0.3, 0.6)),
        ),
        (
            "Right Arm",
            capsule(0.22, 0.5, palette.fur),
            at(0.95, 0.3, 0.4).with_rotation(Vec3::new(0.4, -0.3, -0.6)),
        ),
        ("Left Leg", capsule(0.28, 0.35, palette.fur), at(-0.45, -0.9, 0.3)),
        (
            "Left Foot",
            sphere(0.2, palette.fur_dark),
            at(-0.45, -1.1, 0.5),
        ),
        ("Right Leg", capsule(0.28, 0.35, palette.fur), at(0.45, -0.9, 0.3)),
        (
            "Right Foot",
            sphere(0.2, palette.fur_dark),
            at(0.45, -1.1, 0.5),
        ),
    ];

    for (name, primitive, pose) in parts {
        scene.add_child(character, SceneNode::primitive(name, primitive, pose));
    }

    let envelope = scene.add_child(
        character,
        SceneNode::group(ENVELOPE_NODE, at(0.0, -0.3, 1.3)),
    );

    scene.add_child(
        envelope,
        SceneNode::primitive(
            "Envelope Body",
            Primitive::new(
                Shape::Cuboid {
                    size: Vec3::new(0.9, 0.6, 0.04),
                },
                palette.envelope,
            ),
            Pose::IDENTITY,
        ),
    );

    let envelope_flap = scene.add_child(
        envelope,
        SceneNode::primitive(
            ENVELOPE_FLAP_NODE,
            Primitive::new(
                Shape::Cone {
                    radius: 0.45,
                    height: 0.32,
                    segments: 4,
                },
                palette.envelope_flap,
            ),
            at(0.0, 0.3, 0.02).with_rotation(Vec3::new(0.0, 0.0, PI)),
        ),
    );

    let heart_seal = scene.add_child(
        envelope,
        SceneNode::primitive(
            HEART_SEAL_NODE,
            sphere(0.09, palette.heart),
            at(0.0, 0.03, 0.04),
        ),
    );

    let picture_card = scene.add_child(
        envelope,
        SceneNode::primitive(
            PICTURE_CARD_NODE,
            Primitive::new(
                Shape::Plane {
                    size: Vec2::new(0.8, 0.55),
                },
                palette.card,
            ),
            at(0.0, 0.18, -0.03),
        ),
    );
    // Shown once a prop image is attached
    scene.set_visible(picture_card, false);

    scene.late_update();

    CharacterScene {
        scene,
        character,
        envelope,
        envelope_flap,
        heart_seal,
        picture_card,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_is_fixed_and_acyclic() {
        let built = build(&SceneConfig::default());
        let scene = &built.scene;

        let reachable = scene.walk(built.character);
        assert_eq!(reachable.len(), scene.len());
        assert_eq!(scene.roots().collect::<Vec<_>>(), vec![built.character]);

        for id in reachable.iter().skip(1) {
            let parent = scene.get_node(*id).unwrap().parent_id.unwrap();
            assert!(scene.get_node(parent).unwrap().child_ids.contains(id));
        }
    }

    #[test]
    fn config_changes_colours_not_topology() {
        let plain = build(&SceneConfig::default());
        let tinted = build(&SceneConfig {
            fur_color: 0x334455,
            scale: 1.5,
            ..SceneConfig::default()
        });

        let names = |built: &CharacterScene| {
            built
                .scene
                .walk(built.character)
                .into_iter()
                .map(|id| built.scene.get_node(id).unwrap().name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&plain), names(&tinted));
    }

    #[test]
    fn envelope_is_owned_by_character_and_moves_with_it() {
        let mut built = build(&SceneConfig::default());
        let scene = &mut built.scene;

        assert_eq!(
            scene.get_node(built.envelope).unwrap().parent_id,
            Some(built.character)
        );
        assert_eq!(scene.get_node_by_name(ENVELOPE_FLAP_NODE), Some(built.envelope_flap));

        let before = scene.get_node_transform(built.heart_seal).unwrap().world_position();
        scene.early_update();
        scene.offset_node(
            built.character,
            crate::scene_graph::transform::PoseOffset {
                translation: Vec3::new(0.5, 0.0, 0.0),
                ..Default::default()
            },
        );
        scene.late_update();
        let after = scene.get_node_transform(built.heart_seal).unwrap().world_position();
        assert!((after - before - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn picture_card_starts_hidden() {
        let built = build(&SceneConfig::default());
        assert!(!built.scene.get_node(built.picture_card).unwrap().visible);
    }
}
