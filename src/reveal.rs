use std::time::Duration;

use anyhow::{bail, ensure};

use crate::config::{RevealConfig, RevealStep};
use crate::motion::MotionFlag;
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RevealStage {
    Idle,
    Opening,
    Transitioning,
    Revealed,
}

impl RevealStage {
    pub fn is_terminal(self) -> bool {
        self == RevealStage::Revealed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealEvent {
    Stage(RevealStage),
    Complete,
}

pub type StageListener = Box<dyn FnMut(RevealStage)>;
pub type CompleteListener = Box<dyn FnMut()>;

/// Drives `Idle -> Opening -> Transitioning -> Revealed` from a timer table.
/// Time is passed in by the owner; nothing happens between calls.
pub struct RevealSequencer {
    timeline: Vec<RevealStep>,
    reduced_motion_delay: Duration,
    motion: MotionFlag,
    scheduler: Scheduler<RevealEvent>,
    stage: RevealStage,
    mounted: bool,
    running: bool,
    completed: bool,
    stage_listeners: Vec<StageListener>,
    complete_listeners: Vec<CompleteListener>,
}

fn validate(config: &RevealConfig) -> anyhow::Result<()> {
    let Some(last) = config.timeline.last() else {
        bail!("reveal timeline is empty");
    };
    ensure!(
        last.stage.is_terminal(),
        "reveal timeline ends in {:?} instead of {:?}",
        last.stage,
        RevealStage::Revealed
    );

    let mut previous = RevealStep {
        delay: Duration::ZERO,
        stage: RevealStage::Idle,
    };
    for step in &config.timeline {
        ensure!(
            step.stage > previous.stage,
            "reveal stage {:?} does not follow {:?}",
            step.stage,
            previous.stage
        );
        ensure!(
            step.delay >= previous.delay,
            "reveal stage {:?} is scheduled before {:?}",
            step.stage,
            previous.stage
        );
        previous = *step;
    }

    Ok(())
}

impl RevealSequencer {
    pub fn new(config: RevealConfig, motion: MotionFlag) -> anyhow::Result<Self> {
        validate(&config)?;

        Ok(Self {
            timeline: config.timeline,
            reduced_motion_delay: config.reduced_motion_delay,
            motion,
            scheduler: Scheduler::new(),
            stage: RevealStage::Idle,
            mounted: false,
            running: false,
            completed: false,
            stage_listeners: Vec::new(),
            complete_listeners: Vec::new(),
        })
    }

    pub fn stage(&self) -> RevealStage {
        self.stage
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// The listener is called right away with the current stage.
    pub fn on_stage_change(&mut self, mut listener: impl FnMut(RevealStage) + 'static) {
        listener(self.stage);
        self.stage_listeners.push(Box::new(listener));
    }

    pub fn on_complete(&mut self, listener: impl FnMut() + 'static) {
        self.complete_listeners.push(Box::new(listener));
    }

    /// Starts a fresh lifecycle. A sequence left behind by an earlier
    /// `teardown()` goes back to `Idle` so it can run again.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }

        self.mounted = true;
        if self.stage != RevealStage::Idle || self.completed {
            log::debug!("Re-mounted in {:?}, resetting", self.stage);
            self.reset();
        }
    }

    /// Cancels every timer. Nothing is delivered until the next `mount()`.
    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
        self.running = false;
        self.mounted = false;
    }

    pub fn start(&mut self, now: Duration) {
        if !self.mounted {
            log::debug!("Reveal start ignored, sequencer is not mounted");
            return;
        }

        if self.running || self.stage != RevealStage::Idle {
            log::debug!("Reveal start ignored in {:?}", self.stage);
            return;
        }

        self.running = true;

        if self.motion.is_reduced() {
            self.set_stage(RevealStage::Revealed);
            self.scheduler
                .schedule_after(now, self.reduced_motion_delay, RevealEvent::Complete);
            return;
        }

        let steps = self.timeline.clone();
        for step in steps {
            if step.delay.is_zero() {
                self.apply(RevealEvent::Stage(step.stage));
            } else {
                self.scheduler
                    .schedule_after(now, step.delay, RevealEvent::Stage(step.stage));
            }
        }
    }

    /// Jumps straight to the final stage from wherever the sequence is.
    pub fn skip(&mut self, _now: Duration) {
        if !self.mounted {
            log::debug!("Reveal skip ignored, sequencer is not mounted");
            return;
        }

        self.scheduler.cancel_all();
        self.set_stage(RevealStage::Revealed);
        self.complete();
    }

    pub fn update(&mut self, now: Duration) {
        if !self.mounted {
            return;
        }

        if self.running && self.motion.is_reduced() && !self.stage.is_terminal() {
            self.shorten(now);
        }

        for event in self.scheduler.poll(now) {
            self.apply(event);
        }
    }

    /// Back to `Idle` with completion re-armed.
    pub fn reset(&mut self) {
        self.scheduler.cancel_all();
        self.running = false;
        self.completed = false;
        self.set_stage(RevealStage::Idle);
    }

    /// Reduced motion was switched on mid-sequence: jump to the end and
    /// complete after the short delay, as `start()` would have.
    fn shorten(&mut self, now: Duration) {
        log::debug!("Reduced motion during {:?}, shortening the reveal", self.stage);
        self.scheduler.cancel_all();
        self.set_stage(RevealStage::Revealed);
        self.scheduler
            .schedule_after(now, self.reduced_motion_delay, RevealEvent::Complete);
    }

    fn apply(&mut self, event: RevealEvent) {
        match event {
            RevealEvent::Stage(stage) => {
                self.set_stage(stage);
                if stage.is_terminal() {
                    self.complete();
                }
            }
            RevealEvent::Complete => self.complete(),
        }
    }

    fn set_stage(&mut self, stage: RevealStage) {
        if stage == self.stage {
            return;
        }

        log::info!("Reveal stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
        for listener in &mut self.stage_listeners {
            listener(stage);
        }
    }

    fn complete(&mut self) {
        self.running = false;
        if self.completed {
            return;
        }

        self.completed = true;
        log::info!("Reveal sequence complete");
        for listener in &mut self.complete_listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{MotionGate, MotionSubject};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn millis(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    struct Recorder {
        stages: Rc<RefCell<Vec<RevealStage>>>,
        completions: Rc<Cell<u32>>,
    }

    fn sequencer(reduced: bool) -> (RevealSequencer, Recorder) {
        let mut sequencer =
            RevealSequencer::new(RevealConfig::default(), MotionFlag::new(reduced)).unwrap();
        let recorder = Recorder {
            stages: Rc::new(RefCell::new(Vec::new())),
            completions: Rc::new(Cell::new(0)),
        };

        let stages = recorder.stages.clone();
        sequencer.on_stage_change(move |stage| stages.borrow_mut().push(stage));
        let completions = recorder.completions.clone();
        sequencer.on_complete(move || completions.set(completions.get() + 1));

        sequencer.mount();
        (sequencer, recorder)
    }

    #[test]
    fn full_sequence_runs_in_order() {
        let (mut sequencer, recorder) = sequencer(false);

        sequencer.start(millis(0));
        assert_eq!(sequencer.stage(), RevealStage::Opening);

        sequencer.update(millis(799));
        assert_eq!(sequencer.stage(), RevealStage::Opening);
        sequencer.update(millis(800));
        assert_eq!(sequencer.stage(), RevealStage::Transitioning);
        assert_eq!(recorder.completions.get(), 0);

        sequencer.update(millis(2200));
        assert_eq!(
            *recorder.stages.borrow(),
            vec![
                RevealStage::Idle,
                RevealStage::Opening,
                RevealStage::Transitioning,
                RevealStage::Revealed
            ]
        );
        assert_eq!(recorder.completions.get(), 1);
        assert!(!sequencer.is_running());

        sequencer.update(millis(10_000));
        assert_eq!(recorder.completions.get(), 1);
    }

    #[test]
    fn late_poll_delivers_stages_in_table_order() {
        let (mut sequencer, recorder) = sequencer(false);
        sequencer.start(millis(100));
        sequencer.update(millis(5000));

        assert_eq!(recorder.stages.borrow().len(), 4);
        assert!(recorder.stages.borrow().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(recorder.completions.get(), 1);
    }

    #[test]
    fn reduced_motion_completes_quickly() {
        let (mut sequencer, recorder) = sequencer(true);

        sequencer.start(millis(0));
        assert_eq!(sequencer.stage(), RevealStage::Revealed);
        // Completion is deferred, never synchronous with start
        assert_eq!(recorder.completions.get(), 0);

        sequencer.update(millis(199));
        assert_eq!(recorder.completions.get(), 1);
        assert_eq!(
            *recorder.stages.borrow(),
            vec![RevealStage::Idle, RevealStage::Revealed]
        );
    }

    #[test]
    fn reentrant_start_is_ignored() {
        let (mut sequencer, recorder) = sequencer(false);
        sequencer.start(millis(0));
        sequencer.update(millis(500));
        sequencer.start(millis(500));
        assert_eq!(sequencer.pending_timers(), 2);

        sequencer.update(millis(3000));
        assert_eq!(recorder.completions.get(), 1);

        sequencer.start(millis(3000));
        assert_eq!(sequencer.pending_timers(), 0);
        assert_eq!(recorder.completions.get(), 1);
    }

    #[test]
    fn skip_completes_once_from_any_stage() {
        for advance in [None, Some(0), Some(900), Some(2500)] {
            let (mut sequencer, recorder) = sequencer(false);
            if let Some(advance) = advance {
                sequencer.start(millis(0));
                sequencer.update(millis(advance));
            }

            sequencer.skip(millis(2600));
            sequencer.skip(millis(2700));
            sequencer.update(millis(10_000));

            assert_eq!(sequencer.stage(), RevealStage::Revealed);
            assert_eq!(recorder.completions.get(), 1, "skip after {:?}", advance);
            assert_eq!(sequencer.pending_timers(), 0);
        }
    }

    #[test]
    fn unmounted_sequencer_does_nothing() {
        let mut sequencer =
            RevealSequencer::new(RevealConfig::default(), MotionFlag::new(false)).unwrap();
        let completions = Rc::new(Cell::new(0));
        let counter = completions.clone();
        sequencer.on_complete(move || counter.set(counter.get() + 1));

        sequencer.start(millis(0));
        sequencer.skip(millis(0));
        assert_eq!(sequencer.stage(), RevealStage::Idle);
        assert_eq!(completions.get(), 0);
    }

    #[test]
    fn no_callbacks_after_teardown() {
        let (mut sequencer, recorder) = sequencer(false);
        sequencer.start(millis(0));
        sequencer.teardown();

        sequencer.update(millis(5000));
        sequencer.skip(millis(5000));
        assert_eq!(recorder.completions.get(), 0);
        assert_eq!(sequencer.stage(), RevealStage::Opening);
        assert_eq!(sequencer.pending_timers(), 0);
    }

    #[test]
    fn remount_after_teardown_runs_again() {
        let (mut sequencer, recorder) = sequencer(false);
        sequencer.start(millis(0));
        sequencer.teardown();
        assert_eq!(sequencer.stage(), RevealStage::Opening);

        sequencer.mount();
        assert_eq!(sequencer.stage(), RevealStage::Idle);

        sequencer.start(millis(1000));
        sequencer.update(millis(10_000));
        assert_eq!(sequencer.stage(), RevealStage::Revealed);
        assert!(!sequencer.is_running());
        assert_eq!(recorder.completions.get(), 1);
    }

    #[test]
    fn mount_twice_keeps_the_running_sequence() {
        let (mut sequencer, recorder) = sequencer(false);
        sequencer.start(millis(0));
        sequencer.mount();

        assert_eq!(sequencer.stage(), RevealStage::Opening);
        sequencer.update(millis(2200));
        assert_eq!(recorder.completions.get(), 1);
    }

    #[test]
    fn reducing_motion_mid_sequence_finishes_early() {
        let subject = MotionSubject::new(false);
        let gate = MotionGate::activate(Rc::new(subject.clone()));
        let mut sequencer = RevealSequencer::new(RevealConfig::default(), gate.flag()).unwrap();
        let completions = Rc::new(Cell::new(0));
        let counter = completions.clone();
        sequencer.on_complete(move || counter.set(counter.get() + 1));
        sequencer.mount();

        sequencer.start(millis(0));
        sequencer.update(millis(300));
        assert_eq!(sequencer.stage(), RevealStage::Opening);

        subject.set(true);
        sequencer.update(millis(316));
        assert_eq!(sequencer.stage(), RevealStage::Revealed);
        assert_eq!(completions.get(), 0);

        sequencer.update(millis(420));
        assert_eq!(completions.get(), 1);
        assert_eq!(sequencer.pending_timers(), 0);

        sequencer.update(millis(5000));
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn reset_rearms_completion() {
        let (mut sequencer, recorder) = sequencer(true);
        sequencer.start(millis(0));
        sequencer.update(millis(100));
        sequencer.reset();
        assert_eq!(sequencer.stage(), RevealStage::Idle);

        sequencer.start(millis(1000));
        sequencer.update(millis(1100));
        assert_eq!(recorder.completions.get(), 2);
    }

    #[test]
    fn invalid_timelines_are_rejected() {
        let motion = MotionFlag::new(false);
        let empty = RevealConfig {
            timeline: Vec::new(),
            ..RevealConfig::default()
        };
        assert!(RevealSequencer::new(empty, motion.clone()).is_err());

        let mut backwards = RevealConfig::default();
        backwards.timeline.swap(0, 1);
        assert!(RevealSequencer::new(backwards, motion.clone()).is_err());

        let mut unfinished = RevealConfig::default();
        unfinished.timeline.pop();
        assert!(RevealSequencer::new(unfinished, motion.clone()).is_err());

        let mut early = RevealConfig::default();
        early.timeline[2].delay = millis(100);
        assert!(RevealSequencer::new(early, motion).is_err());
    }
}
