use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::fault;
use crate::services::Release;

use super::priority::{TickId, TickPriority};

type TickFn = dyn FnMut() -> anyhow::Result<()>;

struct TickEntry {
    id: TickId,
    callback: Rc<RefCell<TickFn>>,
}

#[derive(Default)]
struct Tiers {
    tiers: [Vec<TickEntry>; TickPriority::COUNT],
    next_id: u64,
}

/// A per-frame callback that returned an error or panicked during
/// [`TickScheduler::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackFault {
    pub id: TickId,
    pub priority: TickPriority,
    pub message: String,
}

impl fmt::Display for CallbackFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick #{} ({:?}) failed: {}",
            self.id.sequence(),
            self.priority,
            self.message
        )
    }
}

impl std::error::Error for CallbackFault {}

/// Outcome of one scheduler pass.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Frame counter value for this pass (0-based).
    pub frame: u64,
    /// Callbacks invoked, faulted ones included.
    pub invoked: usize,
    pub faults: Vec<CallbackFault>,
}

/// Ordered per-frame callback list driven by a single external pulse.
///
/// Ordering contract:
/// - tiers run in [`TickPriority`] order (`Normal` before `Late`)
/// - within a tier, callbacks run in insertion order
///
/// The scheduler is shared as `Rc<TickScheduler>` and every operation takes
/// `&self`, so callbacks may add or remove ticks while a pass is running. A pass
/// iterates a snapshot taken when it starts: additions and removals made during
/// the pass only apply from the next [`update`](Self::update).
///
/// Registrations are not deduplicated. Adding the same logic twice yields two
/// ids and two invocations per frame.
#[derive(Default)]
pub struct TickScheduler {
    inner: RefCell<Tiers>,
    updating: Cell<bool>,
    frame: Cell<u64>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to the end of `priority`'s tier.
    pub fn add_tick<F>(&self, priority: TickPriority, callback: F) -> TickId
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = TickId(inner.next_id);
        inner.next_id += 1;

        let callback: Rc<RefCell<TickFn>> = Rc::new(RefCell::new(callback));
        inner.tiers[priority.index()].push(TickEntry { id, callback });
        id
    }

    /// Removes the registration `id`. Returns `false` (and does nothing) if it is
    /// not registered.
    pub fn remove_tick(&self, id: TickId) -> bool {
        let mut inner = self.inner.borrow_mut();
        for tier in inner.tiers.iter_mut() {
            if let Some(pos) = tier.iter().position(|e| e.id == id) {
                tier.remove(pos);
                return true;
            }
        }
        false
    }

    /// Returns `true` if `id` is currently registered.
    pub fn contains(&self, id: TickId) -> bool {
        self.inner
            .borrow()
            .tiers
            .iter()
            .any(|tier| tier.iter().any(|e| e.id == id))
    }

    /// Runs one frame: every registered callback, tier by tier.
    ///
    /// Each callback runs inside its own failure boundary. A returned error or a
    /// panic is logged and recorded in the report; the remaining callbacks of
    /// this and later tiers still run.
    ///
    /// Calling `update` from inside a callback is rejected and returns an empty
    /// report.
    pub fn update(&self) -> FrameReport {
        if self.updating.replace(true) {
            log::error!("TickScheduler::update called re-entrantly; nested pass skipped");
            return FrameReport { frame: self.frame.get(), ..FrameReport::default() };
        }

        let snapshot = self.snapshot();
        let mut report = FrameReport { frame: self.frame.get(), ..FrameReport::default() };

        for (priority, id, callback) in snapshot {
            report.invoked += 1;
            let result = match callback.try_borrow_mut() {
                Ok(mut f) => fault::isolate(|| (&mut *f)()),
                // Only reachable if a callback is somehow still borrowed.
                Err(_) => Err("callback already running".to_string()),
            };
            if let Err(message) = result {
                let fault = CallbackFault { id, priority, message };
                log::error!("{fault}");
                report.faults.push(fault);
            }
        }

        self.frame.set(self.frame.get().wrapping_add(1));
        self.updating.set(false);
        report
    }

    /// Removes every registration from every tier.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        for tier in inner.tiers.iter_mut() {
            tier.clear();
        }
    }

    /// Number of registrations across all tiers.
    pub fn len(&self) -> usize {
        self.inner.borrow().tiers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registrations in one tier.
    pub fn tier_len(&self, priority: TickPriority) -> usize {
        self.inner.borrow().tiers[priority.index()].len()
    }

    /// Number of completed passes.
    pub fn frame_count(&self) -> u64 {
        self.frame.get()
    }

    fn snapshot(&self) -> Vec<(TickPriority, TickId, Rc<RefCell<TickFn>>)> {
        let inner = self.inner.borrow();
        let mut out = Vec::with_capacity(inner.tiers.iter().map(Vec::len).sum());
        for priority in TickPriority::ALL {
            for entry in &inner.tiers[priority.index()] {
                out.push((priority, entry.id, Rc::clone(&entry.callback)));
            }
        }
        out
    }
}

impl Release for TickScheduler {
    fn release(&self) -> anyhow::Result<()> {
        let n = self.len();
        self.clear();
        log::debug!("tick scheduler released ({n} registrations dropped)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn push(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> impl FnMut() -> anyhow::Result<()> + 'static {
        let log = Rc::clone(log);
        move || {
            log.borrow_mut().push(tag);
            Ok(())
        }
    }

    #[test]
    fn normal_runs_before_late_regardless_of_add_order() {
        let log = recorder();
        let s = TickScheduler::new();
        s.add_tick(TickPriority::Late, push(&log, "late"));
        s.add_tick(TickPriority::Normal, push(&log, "normal"));

        s.update();
        assert_eq!(*log.borrow(), vec!["normal", "late"]);
    }

    #[test]
    fn insertion_order_within_tier() {
        let log = recorder();
        let s = TickScheduler::new();
        s.add_tick(TickPriority::Normal, push(&log, "a1"));
        s.add_tick(TickPriority::Normal, push(&log, "a2"));
        s.add_tick(TickPriority::Late, push(&log, "b1"));
        s.add_tick(TickPriority::Normal, push(&log, "a3"));

        s.update();
        assert_eq!(*log.borrow(), vec!["a1", "a2", "a3", "b1"]);
    }

    #[test]
    fn duplicates_are_not_collapsed() {
        let log = recorder();
        let s = TickScheduler::new();
        let a = s.add_tick(TickPriority::Normal, push(&log, "x"));
        let b = s.add_tick(TickPriority::Normal, push(&log, "x"));
        assert_ne!(a, b);

        s.update();
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let s = TickScheduler::new();
        let id = s.add_tick(TickPriority::Normal, || Ok(()));
        assert!(s.remove_tick(id));
        assert!(!s.remove_tick(id));
        assert!(!s.remove_tick(TickId(999)));
        assert!(s.is_empty());
    }

    #[test]
    fn removed_tick_never_runs_again() {
        let log = recorder();
        let s = TickScheduler::new();
        let a = s.add_tick(TickPriority::Normal, push(&log, "a"));
        s.add_tick(TickPriority::Late, push(&log, "b"));

        s.update();
        s.remove_tick(a);
        s.update();
        s.update();
        assert_eq!(*log.borrow(), vec!["a", "b", "b", "b"]);
    }

    #[test]
    fn faults_are_isolated() {
        let log = recorder();
        let s = TickScheduler::new();
        s.add_tick(TickPriority::Normal, || anyhow::bail!("bad state"));
        s.add_tick(TickPriority::Normal, push(&log, "after-error"));
        s.add_tick(TickPriority::Normal, || panic!("tick exploded"));
        s.add_tick(TickPriority::Late, push(&log, "late"));

        let report = s.update();
        assert_eq!(*log.borrow(), vec!["after-error", "late"]);
        assert_eq!(report.invoked, 4);
        assert_eq!(report.faults.len(), 2);
        assert_eq!(report.faults[0].message, "bad state");
        assert!(report.faults[1].message.contains("tick exploded"));

        // A panicking callback stays registered and runs again next frame.
        let report = s.update();
        assert_eq!(report.faults.len(), 2);
    }

    #[test]
    fn additions_during_pass_apply_next_frame() {
        let log = recorder();
        let s = Rc::new(TickScheduler::new());

        let weak = Rc::downgrade(&s);
        let inner_log = Rc::clone(&log);
        let mut added = false;
        s.add_tick(TickPriority::Normal, move || {
            if !added {
                added = true;
                if let Some(s) = weak.upgrade() {
                    s.add_tick(TickPriority::Normal, push(&inner_log, "spawned"));
                }
            }
            inner_log.borrow_mut().push("spawner");
            Ok(())
        });

        s.update();
        assert_eq!(*log.borrow(), vec!["spawner"]);
        s.update();
        assert_eq!(*log.borrow(), vec!["spawner", "spawner", "spawned"]);
    }

    #[test]
    fn removal_during_pass_applies_next_frame() {
        let log = recorder();
        let s = Rc::new(TickScheduler::new());
        let victim = Rc::new(Cell::new(None::<TickId>));

        let weak = Rc::downgrade(&s);
        let target = Rc::clone(&victim);
        s.add_tick(TickPriority::Normal, move || {
            if let (Some(s), Some(id)) = (weak.upgrade(), target.get()) {
                s.remove_tick(id);
            }
            Ok(())
        });
        victim.set(Some(s.add_tick(TickPriority::Late, push(&log, "victim"))));

        s.update();
        assert_eq!(*log.borrow(), vec!["victim"]);
        s.update();
        assert_eq!(*log.borrow(), vec!["victim"]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn self_removal_is_safe() {
        let s = Rc::new(TickScheduler::new());
        let me = Rc::new(Cell::new(None::<TickId>));
        let runs = Rc::new(Cell::new(0));

        let (weak, my_id, counter) = (Rc::downgrade(&s), Rc::clone(&me), Rc::clone(&runs));
        me.set(Some(s.add_tick(TickPriority::Normal, move || {
            counter.set(counter.get() + 1);
            if let (Some(s), Some(id)) = (weak.upgrade(), my_id.get()) {
                s.remove_tick(id);
            }
            Ok(())
        })));

        s.update();
        s.update();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn nested_update_is_rejected() {
        let s = Rc::new(TickScheduler::new());
        let weak = Rc::downgrade(&s);
        let nested_invoked = Rc::new(Cell::new(usize::MAX));
        let out = Rc::clone(&nested_invoked);
        s.add_tick(TickPriority::Normal, move || {
            if let Some(s) = weak.upgrade() {
                out.set(s.update().invoked);
            }
            Ok(())
        });

        let report = s.update();
        assert_eq!(report.invoked, 1);
        assert_eq!(nested_invoked.get(), 0);
        assert_eq!(s.frame_count(), 1);
    }

    #[test]
    fn clear_and_release_empty_all_tiers() {
        let s = TickScheduler::new();
        s.add_tick(TickPriority::Normal, || Ok(()));
        s.add_tick(TickPriority::Late, || Ok(()));
        assert_eq!(s.tier_len(TickPriority::Late), 1);

        s.clear();
        assert!(s.is_empty());

        s.add_tick(TickPriority::Late, || Ok(()));
        s.release().unwrap();
        assert_eq!(s.update().invoked, 0);
    }
}
