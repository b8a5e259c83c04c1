use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type MotionListener = Box<dyn FnMut(bool)>;

/// Host-provided "prefers reduced motion" signal.
pub trait MotionSignal {
    fn prefers_reduced_motion(&self) -> bool;
    fn subscribe(&self, listener: MotionListener) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

struct SubjectState {
    reduced: bool,
    listeners: Vec<(SubscriptionId, MotionListener)>,
    next_id: u64,
}

/// In-process [`MotionSignal`]. Clones share the same state, so the host can
/// keep one handle to push changes while the gate holds another.
#[derive(Clone)]
pub struct MotionSubject {
    state: Rc<RefCell<SubjectState>>,
}

impl MotionSubject {
    pub fn new(reduced: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(SubjectState {
                reduced,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Updates the preference and notifies subscribers if it changed.
    pub fn set(&self, reduced: bool) {
        let mut listeners = {
            let mut state = self.state.borrow_mut();
            if state.reduced == reduced {
                return;
            }
            state.reduced = reduced;
            std::mem::take(&mut state.listeners)
        };

        for (_, listener) in listeners.iter_mut() {
            listener(reduced);
        }

        // Listeners may have subscribed or unsubscribed while we were calling out.
        let mut state = self.state.borrow_mut();
        let added = std::mem::take(&mut state.listeners);
        listeners.extend(added);
        state.listeners = listeners;
    }

    pub fn toggle(&self) -> bool {
        let reduced = !self.prefers_reduced_motion();
        self.set(reduced);
        reduced
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

impl MotionSignal for MotionSubject {
    fn prefers_reduced_motion(&self) -> bool {
        self.state.borrow().reduced
    }

    fn subscribe(&self, listener: MotionListener) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(listener_id, _)| *listener_id != id);
    }
}

/// Shared read handle to the current preference.
#[derive(Clone, Default)]
pub struct MotionFlag(Rc<Cell<bool>>);

impl MotionFlag {
    pub fn new(reduced: bool) -> Self {
        Self(Rc::new(Cell::new(reduced)))
    }

    pub fn is_reduced(&self) -> bool {
        self.0.get()
    }

    fn set(&self, reduced: bool) {
        self.0.set(reduced);
    }
}

pub struct MotionGate {
    signal: Rc<dyn MotionSignal>,
    subscription: Option<SubscriptionId>,
    flag: MotionFlag,
}

impl MotionGate {
    pub fn activate(signal: Rc<dyn MotionSignal>) -> Self {
        let flag = MotionFlag::new(signal.prefers_reduced_motion());

        let listener_flag = flag.clone();
        let subscription = signal.subscribe(Box::new(move |reduced| {
            log::info!("Reduced motion preference changed: {}", reduced);
            listener_flag.set(reduced);
        }));

        Self {
            signal,
            subscription: Some(subscription),
            flag,
        }
    }

    pub fn flag(&self) -> MotionFlag {
        self.flag.clone()
    }

    pub fn is_reduced(&self) -> bool {
        self.flag.is_reduced()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn teardown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.signal.unsubscribe(id);
        }
    }
}

impl Drop for MotionGate {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_reads_initial_value_and_follows_changes() {
        let subject = MotionSubject::new(true);
        let gate = MotionGate::activate(Rc::new(subject.clone()));
        let flag = gate.flag();

        assert!(flag.is_reduced());
        subject.set(false);
        assert!(!flag.is_reduced());
        assert!(!gate.is_reduced());
    }

    #[test]
    fn teardown_unsubscribes() {
        let subject = MotionSubject::new(false);
        let mut gate = MotionGate::activate(Rc::new(subject.clone()));
        let flag = gate.flag();
        assert_eq!(subject.subscriber_count(), 1);

        gate.teardown();
        assert_eq!(subject.subscriber_count(), 0);
        assert!(!gate.is_active());

        subject.set(true);
        assert!(!flag.is_reduced());
    }

    #[test]
    fn dropping_gate_unsubscribes() {
        let subject = MotionSubject::new(false);
        {
            let _gate = MotionGate::activate(Rc::new(subject.clone()));
            assert_eq!(subject.subscriber_count(), 1);
        }
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn unchanged_value_is_not_broadcast() {
        let subject = MotionSubject::new(false);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        subject.subscribe(Box::new(move |_| counter.set(counter.get() + 1)));

        subject.set(false);
        subject.set(true);
        subject.set(true);
        assert_eq!(calls.get(), 1);
        assert!(!subject.toggle());
        assert_eq!(calls.get(), 2);
    }
}
