use std::f32::consts::PI;
use std::time::Duration;

use glam::{Vec2, Vec3};

use crate::animation::IdleAnimator;
use crate::camera::Camera;
use crate::config::{PointerConfig, SceneConfig};
use crate::interaction::{hit_test, ContainerRect, PointerResolver};
use crate::motion::MotionFlag;
use crate::prop_image::PropImage;
use crate::reveal::RevealStage;
use crate::scene_graph::{builder, CharacterScene, Hit, PoseOffset, Shape};

const FLAP_OPEN_ANGLE: f32 = PI * 0.9;
const CARD_RISE: f32 = 0.3;

pub type InteractListener = Box<dyn FnMut()>;

/// Eased 0..1 progress of an animation started at `started`.
fn progress(started: Option<Duration>, now: Duration, duration_secs: f32, instant: bool) -> f32 {
    let Some(started) = started else {
        return 0.0;
    };
    if instant || duration_secs <= 0.0 {
        return 1.0;
    }

    let x = (now.saturating_sub(started).as_secs_f32() / duration_secs).clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// The character scene as mounted in a container: owns the graph, the camera
/// and the per-frame animators.
pub struct LandingScene {
    character: CharacterScene,
    camera: Camera,
    idle: IdleAnimator,
    pointer: PointerResolver,
    motion: MotionFlag,
    config: SceneConfig,

    mounted: bool,
    origin: Duration,
    last_frame: Option<f32>,

    flap_hinge: f32,
    flap_opened_at: Option<Duration>,
    card_raised_at: Option<Duration>,
    has_prop_image: bool,

    interact_listeners: Vec<InteractListener>,
}

impl LandingScene {
    pub fn new(config: SceneConfig, pointer: PointerConfig, motion: MotionFlag) -> Self {
        let character = builder::build(&config);
        let idle = IdleAnimator::for_character(&character, motion.clone());

        let flap_hinge = character
            .scene
            .get_node(character.envelope_flap)
            .and_then(|node| node.as_primitive())
            .map(|primitive| match primitive.shape {
                Shape::Cone { height, .. } => height * 0.5,
                _ => 0.0,
            })
            .unwrap_or_default();

        Self {
            character,
            camera: Camera::character_view(),
            idle,
            pointer: PointerResolver::new(pointer, motion.clone()),
            motion,
            config,
            mounted: false,
            origin: Duration::ZERO,
            last_frame: None,
            flap_hinge,
            flap_opened_at: None,
            card_raised_at: None,
            has_prop_image: false,
            interact_listeners: Vec::new(),
        }
    }

    pub fn character(&self) -> &CharacterScene {
        &self.character
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn pointer(&self) -> &PointerResolver {
        &self.pointer
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn on_interact(&mut self, listener: impl FnMut() + 'static) {
        self.interact_listeners.push(Box::new(listener));
    }

    /// Returns `false` while the container has no size yet; the caller retries
    /// on the next frame.
    pub fn try_mount(&mut self, rect: &ContainerRect, now: Duration) -> bool {
        if self.mounted {
            return true;
        }

        if rect.is_empty() {
            log::debug!(
                "Container is {}x{}, deferring mount",
                rect.width,
                rect.height
            );
            return false;
        }

        self.camera.set_viewport(rect.size());
        self.origin = now;
        self.last_frame = None;
        self.mounted = true;
        log::info!("Scene mounted at {}x{}", rect.width, rect.height);

        true
    }

    pub fn resize(&mut self, rect: &ContainerRect) {
        self.camera.set_viewport(rect.size());
    }

    /// Seconds since mount.
    pub fn elapsed(&self, now: Duration) -> f32 {
        now.saturating_sub(self.origin).as_secs_f32()
    }

    pub fn frame(&mut self, now: Duration) {
        if !self.mounted {
            return;
        }

        let t = self.elapsed(now);
        let dt = self.last_frame.map_or(0.0, |last| (t - last).max(0.0));
        self.last_frame = Some(t);

        let scene = &mut self.character.scene;
        scene.early_update();

        self.idle.apply(scene, t);

        self.pointer.update(t, dt);
        scene.offset_node(self.character.character, self.pointer.rotation_offset());

        self.apply_reveal(now);

        self.character.scene.late_update();
    }

    fn apply_reveal(&mut self, now: Duration) {
        let instant = self.motion.is_reduced();

        let open = progress(
            self.flap_opened_at,
            now,
            self.config.flap_open_secs,
            instant,
        );
        if open > 0.0 {
            // Swing around the top edge, outwards first
            let angle = open * FLAP_OPEN_ANGLE;
            self.character.scene.offset_node(
                self.character.envelope_flap,
                PoseOffset {
                    translation: Vec3::new(
                        0.0,
                        self.flap_hinge * (1.0 - angle.cos()),
                        self.flap_hinge * angle.sin(),
                    ),
                    rotation: Vec3::new(-angle, 0.0, 0.0),
                },
            );
        }

        let rise = progress(
            self.card_raised_at,
            now,
            self.config.flap_open_secs,
            instant,
        );
        if rise > 0.0 {
            self.character.scene.offset_node(
                self.character.picture_card,
                PoseOffset {
                    translation: Vec3::Y * rise * CARD_RISE,
                    ..Default::default()
                },
            );
        }
    }

    /// Presentation of the reveal on the prop. Logic never depends on it.
    pub fn show_reveal_stage(&mut self, stage: RevealStage, now: Duration) {
        if stage == RevealStage::Idle {
            self.flap_opened_at = None;
            self.card_raised_at = None;
            return;
        }

        if stage >= RevealStage::Opening && self.flap_opened_at.is_none() {
            self.flap_opened_at = Some(now);
        }
        if stage >= RevealStage::Transitioning && self.card_raised_at.is_none() {
            self.card_raised_at = Some(now);
        }
    }

    pub fn flap_progress(&self, now: Duration) -> f32 {
        progress(
            self.flap_opened_at,
            now,
            self.config.flap_open_secs,
            self.motion.is_reduced(),
        )
    }

    pub fn attach_prop_image(&mut self, image: Option<&PropImage>) {
        self.has_prop_image = image.is_some();
        self.character
            .scene
            .set_visible(self.character.picture_card, self.has_prop_image);

        if !self.has_prop_image {
            log::warn!("No prop image, the picture card stays hidden");
        }
    }

    pub fn has_prop_image(&self) -> bool {
        self.has_prop_image
    }

    pub fn pointer_moved(&mut self, client: Vec2, rect: &ContainerRect) {
        if self.mounted {
            self.pointer.on_pointer_move(client, rect);
        }
    }

    pub fn pointer_left(&mut self) {
        self.pointer.on_pointer_leave();
    }

    pub fn pick(&self, client: Vec2, rect: &ContainerRect) -> Option<Hit> {
        if !self.mounted {
            return None;
        }

        let ndc = rect.client_to_ndc(client)?;
        hit_test(
            &self.character.scene,
            self.character.character,
            &self.camera,
            ndc,
        )
    }

    /// Fires `on_interact` once if the click lands on the character or its prop.
    pub fn click(&mut self, client: Vec2, rect: &ContainerRect) -> bool {
        let Some(hit) = self.pick(client, rect) else {
            return false;
        };

        log::debug!(
            "Clicked {}",
            self.character
                .scene
                .get_node(hit.node)
                .map_or("?", |node| node.name.as_str())
        );

        for listener in &mut self.interact_listeners {
            listener();
        }

        true
    }

    /// Deactivates the scene. Listeners stay registered for the next mount;
    /// nothing reaches them while unmounted.
    pub fn teardown(&mut self) {
        if self.mounted {
            log::info!("Scene torn down");
        }
        self.mounted = false;
        self.pointer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn millis(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn landing(reduced: bool) -> LandingScene {
        LandingScene::new(
            SceneConfig::default(),
            PointerConfig::default(),
            MotionFlag::new(reduced),
        )
    }

    fn rect() -> ContainerRect {
        ContainerRect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn client_of(scene: &LandingScene, point: Vec3, rect: &ContainerRect) -> Vec2 {
        let ndc = scene.camera().project(point);
        Vec2::new(
            rect.left + (ndc.x + 1.0) * 0.5 * rect.width,
            rect.top + (1.0 - ndc.y) * 0.5 * rect.height,
        )
    }

    #[test]
    fn zero_size_container_defers_mount() {
        let mut scene = landing(false);
        assert!(!scene.try_mount(&ContainerRect::default(), millis(0)));
        assert!(!scene.is_mounted());

        scene.frame(millis(16));
        assert!(scene.try_mount(&rect(), millis(32)));
        assert!((scene.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(scene.elapsed(millis(1032)), 1.0);
    }

    #[test]
    fn click_on_body_fires_interact_once() {
        let mut scene = landing(false);
        let interactions = Rc::new(Cell::new(0));
        let counter = interactions.clone();
        scene.on_interact(move || counter.set(counter.get() + 1));

        let rect = rect();
        assert!(scene.try_mount(&rect, millis(0)));
        scene.frame(millis(0));

        let body = client_of(&scene, Vec3::new(0.0, -0.2, 0.0), &rect);
        assert!(scene.click(body, &rect));
        assert_eq!(interactions.get(), 1);

        assert!(!scene.click(Vec2::new(5.0, 5.0), &rect));
        assert_eq!(interactions.get(), 1);
    }

    #[test]
    fn click_before_mount_or_after_teardown_is_ignored() {
        let mut scene = landing(false);
        let interactions = Rc::new(Cell::new(0));
        let counter = interactions.clone();
        scene.on_interact(move || counter.set(counter.get() + 1));

        let rect = rect();
        let center = Vec2::new(400.0, 300.0);
        assert!(!scene.click(center, &rect));

        scene.try_mount(&rect, millis(0));
        scene.teardown();
        assert!(!scene.click(center, &rect));
        assert_eq!(interactions.get(), 0);
    }

    #[test]
    fn remounted_scene_still_reports_clicks() {
        let mut scene = landing(false);
        let interactions = Rc::new(Cell::new(0));
        let counter = interactions.clone();
        scene.on_interact(move || counter.set(counter.get() + 1));

        let rect = rect();
        assert!(scene.try_mount(&rect, millis(0)));
        scene.teardown();
        assert!(!scene.is_mounted());

        assert!(scene.try_mount(&rect, millis(500)));
        scene.frame(millis(500));

        let body = client_of(&scene, Vec3::new(0.0, -0.2, 0.0), &rect);
        assert!(scene.click(body, &rect));
        assert_eq!(interactions.get(), 1);
    }

    #[test]
    fn flap_opens_over_configured_time() {
        let mut scene = landing(false);
        scene.try_mount(&rect(), millis(0));

        let flap = scene.character().envelope_flap;
        let rest = scene
            .character()
            .scene
            .get_node(flap)
            .unwrap()
            .rest
            .rotation;

        scene.show_reveal_stage(RevealStage::Opening, millis(1000));
        assert_eq!(scene.flap_progress(millis(1000)), 0.0);
        assert!(scene.flap_progress(millis(1300)) > 0.0);
        assert_eq!(scene.flap_progress(millis(1600)), 1.0);

        scene.frame(millis(1600));
        let opened = scene.character().scene.get_node(flap).unwrap();
        assert!((opened.offset.rotation.x + FLAP_OPEN_ANGLE).abs() < 1e-5);
        assert_ne!(opened.transform.rotation(), crate::scene_graph::transform::euler_to_quat(rest));
    }

    #[test]
    fn reduced_motion_opens_flap_instantly() {
        let mut scene = landing(true);
        scene.try_mount(&rect(), millis(0));
        scene.show_reveal_stage(RevealStage::Revealed, millis(500));
        assert_eq!(scene.flap_progress(millis(500)), 1.0);
    }

    #[test]
    fn missing_prop_image_keeps_card_hidden() {
        let mut scene = landing(false);
        scene.attach_prop_image(None);
        let card = scene.character().picture_card;
        assert!(!scene.character().scene.get_node(card).unwrap().visible);

        let image = PropImage::from_rgba("bear", 1, 1, vec![255; 4]).unwrap();
        scene.attach_prop_image(Some(&image));
        assert!(scene.character().scene.get_node(card).unwrap().visible);
    }

    #[test]
    fn hovering_turns_the_character() {
        let mut scene = landing(true);
        let rect = rect();
        scene.try_mount(&rect, millis(0));

        scene.pointer_moved(Vec2::new(800.0, 300.0), &rect);
        for frame in 0..120 {
            scene.frame(millis(frame * 16));
        }

        let root = scene.character().character;
        let offset = scene.character().scene.get_node(root).unwrap().offset;
        assert!(offset.rotation.y > 0.3);
    }
}
