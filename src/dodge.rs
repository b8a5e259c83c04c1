use std::time::Duration;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DodgeConfig;
use crate::scheduler::{Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DodgeEvent {
    HideCaption,
}

/// Moves the "no" button somewhere random inside its container whenever the
/// pointer gets close.
pub struct DodgeController {
    config: DodgeConfig,
    rng: StdRng,
    offset: Vec2,
    dodge_count: u32,
    caption_visible: bool,
    caption_timer: Option<TimerId>,
    scheduler: Scheduler<DodgeEvent>,
}

impl DodgeController {
    pub fn new(config: DodgeConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: DodgeConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: DodgeConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            offset: Vec2::ZERO,
            dodge_count: 0,
            caption_visible: false,
            caption_timer: None,
            scheduler: Scheduler::new(),
        }
    }

    /// Largest offset on each axis that keeps the element inside the container.
    pub fn bounds(&self) -> Vec2 {
        ((self.config.container_size - self.config.element_size) / 2.0).max(Vec2::ZERO)
    }

    pub fn element_size(&self) -> Vec2 {
        self.config.element_size
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn dodge_count(&self) -> u32 {
        self.dodge_count
    }

    pub fn caption_visible(&self) -> bool {
        self.caption_visible
    }

    pub fn shows_easter_egg(&self) -> bool {
        self.dodge_count >= self.config.easter_egg_threshold
    }

    pub fn trigger_dodge(&mut self, now: Duration) -> Vec2 {
        let max = self.bounds();
        self.offset = Vec2::new(
            self.rng.gen_range(-max.x..=max.x),
            self.rng.gen_range(-max.y..=max.y),
        );
        self.dodge_count += 1;
        self.caption_visible = true;

        if let Some(timer) = self.caption_timer.take() {
            self.scheduler.cancel(timer);
        }
        self.caption_timer = Some(self.scheduler.schedule_after(
            now,
            self.config.caption_duration,
            DodgeEvent::HideCaption,
        ));

        log::debug!("Dodge #{} to {}", self.dodge_count, self.offset);
        self.offset
    }

    pub fn update(&mut self, now: Duration) {
        for event in self.scheduler.poll(now) {
            match event {
                DodgeEvent::HideCaption => {
                    self.caption_visible = false;
                    self.caption_timer = None;
                }
            }
        }
    }

    /// New container or element size. The current offset is pulled back inside.
    pub fn resize(&mut self, container_size: Vec2, element_size: Vec2) {
        self.config.container_size = container_size;
        self.config.element_size = element_size;

        let max = self.bounds();
        self.offset = self.offset.clamp(-max, max);
    }

    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.caption_timer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn offsets_stay_inside_bounds() {
        let mut controller = DodgeController::with_seed(DodgeConfig::default(), 7);
        let bounds = controller.bounds();
        assert_eq!(bounds, Vec2::new(120.0, 50.0));

        let mut largest = Vec2::ZERO;
        for step in 0..1000 {
            let offset = controller.trigger_dodge(millis(step));
            assert!(offset.x.abs() <= bounds.x && offset.y.abs() <= bounds.y);
            largest = largest.max(offset.abs());
        }

        // Samples spread over the whole area, not just near the center
        assert!(largest.x > bounds.x * 0.9 && largest.y > bounds.y * 0.9);
        assert_eq!(controller.dodge_count(), 1000);
    }

    #[test]
    fn element_larger_than_container_stays_centered() {
        let config = DodgeConfig {
            container_size: Vec2::new(80.0, 30.0),
            ..DodgeConfig::default()
        };
        let mut controller = DodgeController::with_seed(config, 1);
        assert_eq!(controller.bounds(), Vec2::ZERO);
        assert_eq!(controller.trigger_dodge(millis(0)), Vec2::ZERO);
    }

    #[test]
    fn caption_timer_restarts_on_each_dodge() {
        let mut controller = DodgeController::with_seed(DodgeConfig::default(), 3);

        controller.trigger_dodge(millis(0));
        assert!(controller.caption_visible());

        controller.trigger_dodge(millis(1000));
        controller.update(millis(1600));
        assert!(controller.caption_visible());

        controller.update(millis(2499));
        assert!(controller.caption_visible());
        controller.update(millis(2500));
        assert!(!controller.caption_visible());
    }

    #[test]
    fn easter_egg_after_threshold() {
        let mut controller = DodgeController::with_seed(DodgeConfig::default(), 11);
        for step in 0..4 {
            controller.trigger_dodge(millis(step * 10));
            assert!(!controller.shows_easter_egg());
        }
        controller.trigger_dodge(millis(50));
        assert!(controller.shows_easter_egg());
    }

    #[test]
    fn same_seed_same_path() {
        let mut a = DodgeController::with_seed(DodgeConfig::default(), 42);
        let mut b = DodgeController::with_seed(DodgeConfig::default(), 42);
        for step in 0..10 {
            assert_eq!(a.trigger_dodge(millis(step)), b.trigger_dodge(millis(step)));
        }
    }

    #[test]
    fn resize_clamps_current_offset() {
        let mut controller = DodgeController::with_seed(DodgeConfig::default(), 5);
        for step in 0..20 {
            controller.trigger_dodge(millis(step));
        }

        controller.resize(Vec2::new(120.0, 60.0), Vec2::new(100.0, 40.0));
        let bounds = controller.bounds();
        assert_eq!(bounds, Vec2::new(10.0, 10.0));
        assert!(controller.offset().abs().cmple(bounds).all());
    }

    #[test]
    fn teardown_cancels_caption_timer() {
        let mut controller = DodgeController::with_seed(DodgeConfig::default(), 9);
        controller.trigger_dodge(millis(0));
        controller.teardown();
        controller.update(millis(5000));
        // The caption is left as it was; no timer fires after teardown
        assert!(controller.caption_visible());
    }
}
