use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use glam::{Vec2, Vec4};

use crate::config::ExperienceConfig;
use crate::dodge::DodgeController;
use crate::interaction::ContainerRect;
use crate::landing::LandingScene;
use crate::motion::{MotionFlag, MotionGate, MotionSignal};
use crate::prop_image::PropImage;
use crate::reveal::{RevealSequencer, RevealStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    Question,
    Accepted,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    SkipButton,
    Card,
    YesButton,
    NoButton,
    Caption,
    EasterEgg,
    AcceptedCard,
}

/// Screen-space rectangle in pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayQuad {
    pub kind: OverlayKind,
    pub min: Vec2,
    pub max: Vec2,
    /// Linear RGBA
    pub color: Vec4,
}

impl OverlayQuad {
    fn centered(kind: OverlayKind, center: Vec2, size: Vec2, color: Vec4) -> Self {
        Self {
            kind,
            min: center - size * 0.5,
            max: center + size * 0.5,
            color,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

const CARD_SIZE: Vec2 = Vec2::new(480.0, 320.0);
const SKIP_SIZE: Vec2 = Vec2::new(72.0, 32.0);
const CARD_GROW_SECS: f32 = 0.8;

const CARD_COLOR: Vec4 = Vec4::new(1.0, 0.94, 0.86, 0.96);
const ACCEPTED_COLOR: Vec4 = Vec4::new(1.0, 0.62, 0.66, 0.96);
const YES_COLOR: Vec4 = Vec4::new(0.80, 0.10, 0.12, 1.0);
const NO_COLOR: Vec4 = Vec4::new(0.55, 0.55, 0.58, 1.0);
const CAPTION_COLOR: Vec4 = Vec4::new(0.0, 0.0, 0.0, 0.5);
const EASTER_EGG_COLOR: Vec4 = Vec4::new(0.92, 0.20, 0.20, 1.0);
const SKIP_COLOR: Vec4 = Vec4::new(1.0, 1.0, 1.0, 0.15);

/// Landing, reveal, question and acceptance in one place. Callbacks from the
/// components only raise flags; the flags are handled here, in order, on the
/// caller's turn.
pub struct Experience {
    view: View,
    viewport: ContainerRect,

    gate: MotionGate,
    motion: MotionFlag,
    landing: LandingScene,
    sequencer: RevealSequencer,
    dodge: DodgeController,
    prop_image: Option<PropImage>,

    interacted: Rc<Cell<bool>>,
    completed: Rc<Cell<bool>>,
    stage_changes: Rc<RefCell<Vec<RevealStage>>>,
    card_started_at: Option<Duration>,
    hovering_no: bool,
}

impl Experience {
    pub fn new(config: ExperienceConfig, signal: Rc<dyn MotionSignal>) -> anyhow::Result<Self> {
        let prop_image = PropImage::load_optional(config.prop_image.as_deref());
        Self::with_prop_image(config, signal, prop_image, DodgeController::new)
    }

    /// Seeded dodge randomness and an already loaded image.
    pub fn with_seed(
        config: ExperienceConfig,
        signal: Rc<dyn MotionSignal>,
        prop_image: Option<PropImage>,
        seed: u64,
    ) -> anyhow::Result<Self> {
        Self::with_prop_image(config, signal, prop_image, |dodge| {
            DodgeController::with_seed(dodge, seed)
        })
    }

    fn with_prop_image(
        config: ExperienceConfig,
        signal: Rc<dyn MotionSignal>,
        prop_image: Option<PropImage>,
        make_dodge: impl FnOnce(crate::config::DodgeConfig) -> DodgeController,
    ) -> anyhow::Result<Self> {
        let gate = MotionGate::activate(signal);
        let motion = gate.flag();

        let mut landing = LandingScene::new(config.scene, config.pointer, motion.clone());
        landing.attach_prop_image(prop_image.as_ref());

        let mut sequencer = RevealSequencer::new(config.reveal, motion.clone())?;

        let interacted = Rc::new(Cell::new(false));
        let completed = Rc::new(Cell::new(false));
        let stage_changes = Rc::new(RefCell::new(Vec::new()));

        let flag = interacted.clone();
        landing.on_interact(move || flag.set(true));

        let changes = stage_changes.clone();
        sequencer.on_stage_change(move |stage| changes.borrow_mut().push(stage));
        let flag = completed.clone();
        sequencer.on_complete(move || flag.set(true));

        Ok(Self {
            view: View::Landing,
            viewport: ContainerRect::default(),
            gate,
            motion,
            landing,
            sequencer,
            dodge: make_dodge(config.dodge),
            prop_image,
            interacted,
            completed,
            stage_changes,
            card_started_at: None,
            hovering_no: false,
        })
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn stage(&self) -> RevealStage {
        self.sequencer.stage()
    }

    pub fn landing(&self) -> &LandingScene {
        &self.landing
    }

    pub fn dodge(&self) -> &DodgeController {
        &self.dodge
    }

    pub fn prop_image(&self) -> Option<&PropImage> {
        self.prop_image.as_ref()
    }

    pub fn is_reduced_motion(&self) -> bool {
        self.motion.is_reduced()
    }

    pub fn viewport(&self) -> ContainerRect {
        self.viewport
    }

    pub fn resize(&mut self, viewport: ContainerRect) {
        self.viewport = viewport;
        if self.landing.is_mounted() {
            self.landing.resize(&viewport);
        }
    }

    pub fn frame(&mut self, now: Duration) {
        if self.view == View::Exited {
            return;
        }

        if !self.landing.is_mounted() && self.landing.try_mount(&self.viewport, now) {
            self.sequencer.mount();
        }

        self.sequencer.update(now);
        self.dodge.update(now);
        self.process(now);

        self.landing.frame(now);
    }

    fn process(&mut self, now: Duration) {
        if self.interacted.take() {
            self.sequencer.start(now);
        }

        let changes: Vec<_> = self.stage_changes.borrow_mut().drain(..).collect();
        for stage in changes {
            self.landing.show_reveal_stage(stage, now);
            if stage >= RevealStage::Transitioning && self.card_started_at.is_none() {
                self.card_started_at = Some(now);
            }
        }

        if self.completed.take() && self.view == View::Landing {
            log::info!("Showing the question");
            self.view = View::Question;
        }
    }

    pub fn pointer_moved(&mut self, client: Vec2, now: Duration) {
        match self.view {
            View::Landing => self.landing.pointer_moved(client, &self.viewport),
            View::Question => {
                let over_no = self
                    .find_quad(OverlayKind::NoButton, now)
                    .is_some_and(|quad| quad.contains(client));

                if over_no && !self.hovering_no {
                    self.dodge.trigger_dodge(now);
                }
                self.hovering_no = over_no;
            }
            View::Accepted | View::Exited => {}
        }
    }

    pub fn pointer_left(&mut self) {
        self.landing.pointer_left();
        self.hovering_no = false;
    }

    pub fn click(&mut self, client: Vec2, now: Duration) {
        match self.view {
            View::Landing => {
                let on_skip = self
                    .find_quad(OverlayKind::SkipButton, now)
                    .is_some_and(|quad| quad.contains(client));

                if on_skip {
                    self.skip(now);
                } else if self.sequencer.stage() == RevealStage::Idle {
                    self.landing.click(client, &self.viewport);
                    self.process(now);
                }
            }
            View::Question => {
                let overlay = self.overlay(now);
                let hit = |kind| {
                    overlay
                        .iter()
                        .any(|quad| quad.kind == kind && quad.contains(client))
                };
                let (on_yes, on_no) = (hit(OverlayKind::YesButton), hit(OverlayKind::NoButton));

                if on_yes {
                    self.accept();
                } else if on_no {
                    self.dodge.trigger_dodge(now);
                }
            }
            View::Accepted | View::Exited => {}
        }
    }

    /// Forces the reveal to finish right away.
    pub fn skip(&mut self, now: Duration) {
        if self.view != View::Landing {
            return;
        }

        self.sequencer.skip(now);
        self.process(now);
    }

    pub fn accept(&mut self) {
        if self.view == View::Question {
            log::info!("Accepted");
            self.view = View::Accepted;
            self.dodge.teardown();
        }
    }

    /// Tears everything down. Nothing fires afterwards.
    pub fn exit(&mut self) {
        if self.view == View::Exited {
            return;
        }

        self.view = View::Exited;
        self.landing.teardown();
        self.sequencer.teardown();
        self.dodge.teardown();
        self.gate.teardown();
        log::info!("Exited");
    }

    fn find_quad(&self, kind: OverlayKind, now: Duration) -> Option<OverlayQuad> {
        self.overlay(now).into_iter().find(|quad| quad.kind == kind)
    }

    fn card_scale(&self, now: Duration) -> f32 {
        if self.motion.is_reduced() || self.view != View::Landing {
            return 1.0;
        }

        match self.card_started_at {
            Some(started) => {
                let elapsed = now.saturating_sub(started).as_secs_f32();
                let x = (elapsed / CARD_GROW_SECS).clamp(0.0, 1.0);
                1.0 - (1.0 - x).powi(3)
            }
            None => 0.0,
        }
    }

    /// The 2D layer drawn over the scene.
    pub fn overlay(&self, now: Duration) -> Vec<OverlayQuad> {
        let size = self.viewport.size();
        if self.viewport.is_empty() {
            return Vec::new();
        }

        let center = size * 0.5;
        let card_size = CARD_SIZE.min(size * 0.9);
        let mut quads = Vec::new();

        match self.view {
            View::Landing => {
                let skip_center =
                    Vec2::new(size.x - 16.0 - SKIP_SIZE.x * 0.5, 16.0 + SKIP_SIZE.y * 0.5);
                quads.push(OverlayQuad::centered(
                    OverlayKind::SkipButton,
                    skip_center,
                    SKIP_SIZE,
                    SKIP_COLOR,
                ));

                let scale = self.card_scale(now);
                if scale > 0.0 {
                    quads.push(OverlayQuad::centered(
                        OverlayKind::Card,
                        center,
                        card_size * scale,
                        CARD_COLOR,
                    ));
                }
            }
            View::Question => {
                quads.push(OverlayQuad::centered(
                    OverlayKind::Card,
                    center,
                    card_size,
                    CARD_COLOR,
                ));

                let buttons = center + Vec2::new(0.0, card_size.y * 0.2);
                let element = self.dodge.element_size();
                quads.push(OverlayQuad::centered(
                    OverlayKind::YesButton,
                    buttons - Vec2::new(0.0, element.y * 1.5),
                    element,
                    YES_COLOR,
                ));
                quads.push(OverlayQuad::centered(
                    OverlayKind::NoButton,
                    buttons + self.dodge.offset(),
                    element,
                    NO_COLOR,
                ));

                if self.dodge.caption_visible() {
                    quads.push(OverlayQuad::centered(
                        OverlayKind::Caption,
                        center + Vec2::new(0.0, card_size.y * 0.5 + 24.0),
                        Vec2::new(card_size.x * 0.6, 28.0),
                        CAPTION_COLOR,
                    ));
                }

                if self.dodge.shows_easter_egg() {
                    quads.push(OverlayQuad::centered(
                        OverlayKind::EasterEgg,
                        center - Vec2::new(0.0, card_size.y * 0.35),
                        Vec2::splat(28.0),
                        EASTER_EGG_COLOR,
                    ));
                }
            }
            View::Accepted => {
                quads.push(OverlayQuad::centered(
                    OverlayKind::AcceptedCard,
                    center,
                    card_size,
                    ACCEPTED_COLOR,
                ));
            }
            View::Exited => {}
        }

        quads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::MotionSubject;
    use glam::Vec3;

    fn millis(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn experience(reduced: bool) -> (Experience, MotionSubject) {
        let subject = MotionSubject::new(reduced);
        let mut experience = Experience::with_seed(
            ExperienceConfig::default(),
            Rc::new(subject.clone()),
            None,
            1,
        )
        .unwrap();
        experience.resize(ContainerRect::new(0.0, 0.0, 1024.0, 768.0));
        (experience, subject)
    }

    fn body_client(experience: &Experience) -> Vec2 {
        let ndc = experience
            .landing()
            .camera()
            .project(Vec3::new(0.0, -0.2, 0.0));
        let size = experience.viewport().size();
        Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y)
    }

    fn quad(experience: &Experience, kind: OverlayKind, now: Duration) -> OverlayQuad {
        experience
            .overlay(now)
            .into_iter()
            .find(|quad| quad.kind == kind)
            .unwrap()
    }

    #[test]
    fn clicking_the_bear_plays_the_reveal() {
        let (mut experience, _subject) = experience(false);
        experience.frame(millis(0));

        experience.click(body_client(&experience), millis(100));
        assert_eq!(experience.stage(), RevealStage::Opening);

        let mut now = 100;
        while now < 2400 {
            now += 16;
            experience.frame(millis(now));
        }
        assert_eq!(experience.stage(), RevealStage::Revealed);
        assert_eq!(experience.view(), View::Question);
    }

    #[test]
    fn click_before_mount_does_nothing() {
        let (mut experience, _subject) = experience(false);
        experience.click(Vec2::new(512.0, 384.0), millis(0));
        assert_eq!(experience.stage(), RevealStage::Idle);
    }

    #[test]
    fn skip_goes_straight_to_the_question() {
        let (mut experience, _subject) = experience(false);
        experience.frame(millis(0));

        let skip = quad(&experience, OverlayKind::SkipButton, millis(0));
        experience.click(skip.center(), millis(10));
        assert_eq!(experience.view(), View::Question);
        assert_eq!(experience.stage(), RevealStage::Revealed);
    }

    #[test]
    fn reduced_motion_reaches_question_quickly() {
        let (mut experience, _subject) = experience(true);
        experience.frame(millis(0));
        experience.click(body_client(&experience), millis(0));

        experience.frame(millis(150));
        assert_eq!(experience.view(), View::Question);
    }

    #[test]
    fn motion_toggle_reaches_components() {
        let (experience, subject) = experience(false);
        assert!(!experience.is_reduced_motion());
        subject.set(true);
        assert!(experience.is_reduced_motion());
    }

    #[test]
    fn no_button_dodges_and_yes_accepts() {
        let (mut experience, _subject) = experience(false);
        experience.frame(millis(0));
        experience.skip(millis(0));

        let no = quad(&experience, OverlayKind::NoButton, millis(0));
        experience.pointer_moved(no.center(), millis(20));
        assert_eq!(experience.dodge().dodge_count(), 1);
        assert!(quad(&experience, OverlayKind::Caption, millis(20)).size().x > 0.0);

        // Staying over the old spot is not a new entry
        experience.pointer_moved(no.center() + Vec2::ONE, millis(30));
        assert_eq!(experience.dodge().dodge_count(), 1);

        experience.pointer_moved(Vec2::new(-50.0, -50.0), millis(32));
        let moved = quad(&experience, OverlayKind::NoButton, millis(34));
        experience.pointer_moved(moved.center(), millis(34));
        assert_eq!(experience.dodge().dodge_count(), 2);

        let yes = quad(&experience, OverlayKind::YesButton, millis(40));
        experience.click(yes.center(), millis(40));
        assert_eq!(experience.view(), View::Accepted);
        assert!(experience
            .overlay(millis(40))
            .iter()
            .any(|quad| quad.kind == OverlayKind::AcceptedCard));
    }

    #[test]
    fn card_grows_in_during_transition() {
        let (mut experience, _subject) = experience(false);
        experience.frame(millis(0));
        experience.click(body_client(&experience), millis(0));

        experience.frame(millis(500));
        assert!(experience
            .overlay(millis(500))
            .iter()
            .all(|quad| quad.kind != OverlayKind::Card));

        experience.frame(millis(800));
        experience.frame(millis(1200));
        let growing = quad(&experience, OverlayKind::Card, millis(1200));
        experience.frame(millis(1700));
        let grown = quad(&experience, OverlayKind::Card, millis(1700));
        assert!(growing.size().x < grown.size().x);
    }

    #[test]
    fn exit_unsubscribes_and_stops_everything() {
        let (mut experience, subject) = experience(false);
        experience.frame(millis(0));
        experience.click(body_client(&experience), millis(0));
        assert_eq!(subject.subscriber_count(), 1);

        experience.exit();
        assert_eq!(subject.subscriber_count(), 0);
        assert_eq!(experience.view(), View::Exited);

        experience.frame(millis(5000));
        assert_eq!(experience.view(), View::Exited);
        assert_eq!(experience.stage(), RevealStage::Opening);
        assert!(experience.overlay(millis(5000)).is_empty());
    }
}
