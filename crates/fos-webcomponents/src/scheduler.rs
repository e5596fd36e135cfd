//! Delivery Scheduler
//!
//! Single-flight "next tick" batching. Queued observers and deferred
//! lifecycle jobs share one wake-up task on the realm's task queue; however
//! many times work is scheduled before the tick fires, only one wake-up
//! exists.

use std::collections::{BTreeSet, VecDeque};

use crate::config::HostCapabilities;
use crate::error::CallbackSource;
use crate::observer::{MutationObserver, ObserverId};
use crate::Realm;

/// Cooperative unit of work run by the realm's event loop
pub type Task = Box<dyn FnOnce(&mut Realm)>;

/// Work deferred to the next delivery pass
pub type Deferred = Box<dyn FnOnce(&mut Realm)>;

/// Host primitive used to wake up after the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStrategy {
    /// Host-provided immediate-callback facility
    Immediate,
    /// Zero-delay timer
    Timer,
    /// Same-process message round-trip, for hosts whose timers coalesce
    MessageChannel,
}

impl TickStrategy {
    /// Best available strategy for the host
    pub fn detect(capabilities: &HostCapabilities) -> Self {
        if capabilities.immediate_callbacks {
            Self::Immediate
        } else if capabilities.reliable_timers {
            Self::Timer
        } else {
            Self::MessageChannel
        }
    }
}

/// Identifier of a queued task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

pub(crate) struct QueuedTask {
    pub(crate) id: TaskId,
    pub(crate) source: TickStrategy,
    pub(crate) label: &'static str,
    pub(crate) run: Task,
}

/// FIFO task queue drained by the realm's event loop
#[derive(Default)]
pub struct TaskQueue {
    next_id: u64,
    queue: VecDeque<QueuedTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task behind everything already pending
    pub fn push(&mut self, source: TickStrategy, label: &'static str, run: Task) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.queue.push_back(QueuedTask { id, source, label, run });
        id
    }

    /// Remove a pending task; `false` if it already ran or never existed
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.queue.iter().position(|t| t.id == id) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn pop(&mut self) -> Option<QueuedTask> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.queue.iter().map(|t| (t.id, t.source, t.label)))
            .finish()
    }
}

/// Batches deliveries into one wake-up per cycle
pub struct DeliveryScheduler {
    strategy: TickStrategy,
    /// Observers with pending records, ordered by creation id
    queued: BTreeSet<ObserverId>,
    deferred: VecDeque<Deferred>,
    pending_tick: Option<TaskId>,
    flushing: bool,
}

impl DeliveryScheduler {
    pub fn new(strategy: TickStrategy) -> Self {
        Self {
            strategy,
            queued: BTreeSet::new(),
            deferred: VecDeque::new(),
            pending_tick: None,
            flushing: false,
        }
    }

    pub fn strategy(&self) -> TickStrategy {
        self.strategy
    }

    /// Whether a wake-up task is currently queued
    pub fn is_tick_pending(&self) -> bool {
        self.pending_tick.is_some()
    }

    /// Whether a delivery pass is running right now
    pub fn is_flushing(&self) -> bool {
        self.flushing
    }

    /// Whether anything waits for the next pass
    pub fn has_work(&self) -> bool {
        !self.queued.is_empty() || !self.deferred.is_empty()
    }

    /// Queue an observer; returns true when a wake-up must be requested
    pub(crate) fn enqueue(&mut self, observer: ObserverId) -> bool {
        self.queued.insert(observer);
        self.needs_wakeup()
    }

    /// Queue a deferred job; returns true when a wake-up must be requested
    pub(crate) fn defer(&mut self, job: Deferred) -> bool {
        self.deferred.push_back(job);
        self.needs_wakeup()
    }

    fn needs_wakeup(&self) -> bool {
        self.pending_tick.is_none() && !self.flushing
    }

    fn take_queued(&mut self) -> Vec<ObserverId> {
        std::mem::take(&mut self.queued).into_iter().collect()
    }

    fn take_deferred(&mut self) -> Vec<Deferred> {
        self.deferred.drain(..).collect()
    }
}

impl std::fmt::Debug for DeliveryScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryScheduler")
            .field("strategy", &self.strategy)
            .field("queued", &self.queued)
            .field("deferred", &self.deferred.len())
            .field("pending_tick", &self.pending_tick)
            .field("flushing", &self.flushing)
            .finish()
    }
}

impl Realm {
    /// Deliver everything queued right now.
    ///
    /// Observers run in creation order, then deferred jobs. Work produced by
    /// those callbacks triggers another full pass before returning; there is
    /// no pass limit. A flush requested from inside a running pass is a no-op,
    /// the outer pass picks the work up.
    pub fn flush(&mut self) {
        if self.scheduler.is_flushing() {
            return;
        }
        self.scheduler.flushing = true;

        let mut passes = 0usize;
        loop {
            let observers = self.scheduler.take_queued();
            let deferred = self.scheduler.take_deferred();
            if observers.is_empty() && deferred.is_empty() {
                break;
            }
            passes += 1;
            tracing::trace!(
                "delivery pass {}: {} observers, {} deferred",
                passes,
                observers.len(),
                deferred.len()
            );
            for observer in observers {
                self.deliver_to(observer);
            }
            for job in deferred {
                job(self);
            }
        }

        self.scheduler.flushing = false;
        if let Some(task) = self.scheduler.pending_tick.take() {
            self.tasks.cancel(task);
        }
    }

    fn deliver_to(&mut self, id: ObserverId) {
        let Some((records, callback)) = self.observers.take_for_delivery(id) else {
            return;
        };
        tracing::debug!("delivering {} records to observer {:?}", records.len(), id);
        if let Err(error) = callback(self, records, MutationObserver::from_id(id)) {
            self.report_error(CallbackSource::Observer(id), error);
        }
    }

    /// Run deferred jobs now, including any they defer in turn
    pub(crate) fn run_deferred(&mut self) {
        loop {
            let jobs = self.scheduler.take_deferred();
            if jobs.is_empty() {
                break;
            }
            for job in jobs {
                job(self);
            }
        }
    }

    pub(crate) fn schedule_delivery(&mut self, observer: ObserverId) {
        if self.scheduler.enqueue(observer) {
            self.request_tick();
        }
    }

    /// Run `job` during the next delivery pass
    pub(crate) fn defer(&mut self, job: Deferred) {
        if self.scheduler.defer(job) {
            self.request_tick();
        }
    }

    fn request_tick(&mut self) {
        let strategy = self.scheduler.strategy;
        let id = self.tasks.push(
            strategy,
            "deliver-mutations",
            Box::new(|realm: &mut Realm| {
                realm.scheduler.pending_tick = None;
                realm.flush();
            }),
        );
        self.scheduler.pending_tick = Some(id);
        tracing::trace!("requested {:?} wake-up {:?}", strategy, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_strategy() {
        let mut caps = HostCapabilities::default();
        assert_eq!(TickStrategy::detect(&caps), TickStrategy::Timer);

        caps.immediate_callbacks = true;
        assert_eq!(TickStrategy::detect(&caps), TickStrategy::Immediate);

        caps.immediate_callbacks = false;
        caps.reliable_timers = false;
        assert_eq!(TickStrategy::detect(&caps), TickStrategy::MessageChannel);
    }

    #[test]
    fn test_task_queue_cancel() {
        let mut queue = TaskQueue::new();
        let a = queue.push(TickStrategy::Timer, "a", Box::new(|_| {}));
        let b = queue.push(TickStrategy::Timer, "b", Box::new(|_| {}));
        assert_eq!(queue.len(), 2);

        assert!(queue.cancel(a));
        assert!(!queue.cancel(a));
        assert_eq!(queue.pop().map(|t| t.id), Some(b));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_single_flight_wakeup() {
        let mut scheduler = DeliveryScheduler::new(TickStrategy::Timer);
        assert!(scheduler.enqueue(ObserverId::from_raw(2)));
        scheduler.pending_tick = Some(TaskId(1));
        assert!(!scheduler.enqueue(ObserverId::from_raw(1)));
        assert!(!scheduler.defer(Box::new(|_| {})));

        assert_eq!(
            scheduler.take_queued(),
            vec![ObserverId::from_raw(1), ObserverId::from_raw(2)]
        );
        assert_eq!(scheduler.take_deferred().len(), 1);
        assert!(!scheduler.has_work());
    }
}
