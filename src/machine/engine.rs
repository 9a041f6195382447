//! The dispatch engine: event queue, single-flight scheduling, and the
//! evaluation cycle.
//!
//! Two locks, always taken in this order:
//! 1. `guarded` (read/write): current state, event shelf, property bag.
//!    Held exclusively for a whole evaluation cycle.
//! 2. `queue` (mutex): live event queue and the `scheduled` flag. Held only
//!    for O(1) pushes and pops, never across evaluation.
//!
//! Producers only ever take the queue lock, so enqueueing never waits on a
//! slow cycle, and actions can fire events while the cycle holds `guarded`.

use crate::core::{Event, Slot, State};
use crate::error::FsmError;
use crate::executor::{panic_message, Executor};
use crate::logging::{InstanceId, Level, Logger};
use crate::machine::action::{ActionError, ActionProxy, TransitionAction};
use crate::machine::context::{ActionContext, FsmContext};
use crate::machine::transition::Transition;
use crossbeam::channel::RecvTimeoutError;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

type StateCallback<S> = Box<dyn FnOnce(S) + Send>;

/// An event waiting in the live queue.
pub(crate) struct PendingEvent<S, E> {
    event: E,
    callback: Option<StateCallback<S>>,
}

impl<S, E> PendingEvent<S, E> {
    pub(crate) fn new(event: E, callback: Option<StateCallback<S>>) -> Self {
        Self { event, callback }
    }
}

/// Data guarded by the exclusive state lock.
///
/// Shelved events never carry a callback, which keeps this `Sync`.
pub(crate) struct Guarded<S, E> {
    pub(crate) state: S,
    pub(crate) shelf: VecDeque<E>,
    pub(crate) values: HashMap<Slot, Box<dyn Any + Send + Sync>>,
}

struct EventQueue<S, E> {
    pending: VecDeque<PendingEvent<S, E>>,
    scheduled: bool,
}

impl<S, E> EventQueue<S, E> {
    /// Mark an evaluation unit as scheduled if one is needed and none is
    /// outstanding. Returns whether the caller must submit it.
    fn claim(&mut self) -> bool {
        if !self.scheduled && !self.pending.is_empty() {
            self.scheduled = true;
            true
        } else {
            false
        }
    }
}

/// Runs the hand-off step of an evaluation unit when dropped, so the
/// scheduled flag is released even if the unit unwinds.
struct ScheduleNext<'a, S: State, E: Event>(&'a Arc<Shared<S, E>>);

impl<S: State, E: Event> Drop for ScheduleNext<'_, S, E> {
    fn drop(&mut self) {
        self.0.schedule_next();
    }
}

/// Everything in a machine that outlives a single evaluation cycle.
pub(crate) struct Shared<S, E> {
    guarded: RwLock<Guarded<S, E>>,
    queue: Mutex<EventQueue<S, E>>,
    transitions: Vec<Box<dyn Transition<S, E>>>,
    actions: Vec<Box<dyn TransitionAction<S, E>>>,
    executor: Arc<dyn Executor>,
    proxy: Option<Arc<dyn ActionProxy<S, E>>>,
    logger: Logger,
    log_padding: usize,
}

/// Construction parts for a machine with a custom logger.
pub(crate) struct MachineParts<S, E> {
    pub(crate) initial: S,
    pub(crate) transitions: Vec<Box<dyn Transition<S, E>>>,
    pub(crate) actions: Vec<Box<dyn TransitionAction<S, E>>>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) proxy: Option<Arc<dyn ActionProxy<S, E>>>,
    pub(crate) logger: Logger,
    pub(crate) log_padding: usize,
}

impl<S: State, E: Event> Shared<S, E> {
    pub(crate) fn instance_id(&self) -> InstanceId {
        self.logger.instance()
    }

    /// Append to the live queue and schedule if needed.
    pub(crate) fn enqueue(self: &Arc<Self>, pending: PendingEvent<S, E>) {
        let submit = {
            let mut queue = self.queue.lock();
            queue.pending.push_back(pending);
            queue.claim()
        };
        if submit {
            self.submit();
        }
    }

    /// Put `shelved` ahead of everything in the live queue, preserving its
    /// order, and schedule if needed.
    pub(crate) fn requeue_front(self: &Arc<Self>, mut shelved: VecDeque<E>) {
        let count = shelved.len();
        let submit = {
            let mut queue = self.queue.lock();
            while let Some(event) = shelved.pop_back() {
                queue.pending.push_front(PendingEvent::new(event, None));
            }
            queue.claim()
        };
        if count > 0 {
            self.logger.trace(format_args!("requeued {count} shelved event(s)"));
        }
        if submit {
            self.submit();
        }
    }

    fn submit(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        self.executor.execute(Box::new(move || shared.poll_and_evaluate()));
    }

    /// One evaluation unit: evaluate exactly one queued event, then hand
    /// off to the next unit or clear the scheduled flag.
    fn poll_and_evaluate(self: &Arc<Self>) {
        let pending = {
            let mut queue = self.queue.lock();
            match queue.pending.pop_front() {
                Some(pending) => pending,
                None => {
                    queue.scheduled = false;
                    return;
                }
            }
        };
        let _next = ScheduleNext(self);
        let PendingEvent { event, callback } = pending;

        // A panicking guard aborts this event only. Dropping the callback
        // wakes any blocked producer with `WaitInterrupted`.
        let mut committed = false;
        let evaluate = AssertUnwindSafe(|| self.evaluate(&event, &mut committed));
        match panic::catch_unwind(evaluate) {
            Ok(next_state) => {
                if let Some(callback) = callback {
                    let deliver = AssertUnwindSafe(|| callback(next_state));
                    if let Err(payload) = panic::catch_unwind(deliver) {
                        self.logger.warn(format_args!(
                            "state callback for E({event:?}) panicked: {}",
                            panic_message(payload.as_ref())
                        ));
                    }
                }
            }
            Err(payload) => {
                drop(callback);
                let outcome = if committed {
                    "after the state was committed"
                } else {
                    "state left unchanged"
                };
                self.logger.log(
                    Level::Error,
                    format_args!(
                        "evaluation of E({event:?}) panicked, {outcome}: {}",
                        panic_message(payload.as_ref())
                    ),
                );
            }
        }
    }

    /// Submit the next unit if events are waiting, otherwise clear the
    /// scheduled flag.
    fn schedule_next(self: &Arc<Self>) {
        let submit = {
            let mut queue = self.queue.lock();
            if queue.pending.is_empty() {
                queue.scheduled = false;
                false
            } else {
                true
            }
        };
        if submit {
            self.submit();
        }
    }

    /// Run the transition and action tables for `event` under the
    /// exclusive lock and return the committed state.
    ///
    /// `committed` is set once the new state is visible, so a caller that
    /// catches a later panic knows the state already moved.
    fn evaluate(self: &Arc<Self>, event: &E, committed: &mut bool) -> S {
        let mut guarded = self.guarded.write();
        let from = guarded.state.clone();

        let to = {
            let ctx = FsmContext::new(self, &mut guarded);
            self.transitions
                .iter()
                .find(|transition| transition.matches(&ctx, &from, event))
                .map(|transition| transition.target().clone())
                .unwrap_or_else(|| from.clone())
        };

        guarded.state = to.clone();
        *committed = true;

        if self.logger.is_enabled(Level::Debug) {
            self.logger.debug(format_args!(
                "{} x {} = {}",
                self.pad(format_args!("S({})", from.name())),
                self.pad(format_args!("E({event:?})")),
                self.pad(format_args!("S'({})", to.name())),
            ));
        }

        let matching: Vec<(usize, &dyn TransitionAction<S, E>)> = self
            .actions
            .iter()
            .enumerate()
            .filter(|(_, action)| action.matches(&from, &to, event))
            .map(|(index, action)| (index, &**action))
            .collect();

        self.logger.trace(format_args!(
            "found {} matching TransitionActions",
            matching.len()
        ));

        let inner = FsmContext::new(self, &mut guarded);
        let mut ctx = ActionContext::new(inner, &from, &to, event);
        for (index, action) in matching {
            self.run_action(&mut ctx, index, action);
        }

        to
    }

    /// Execute one action, containing any failure to this action.
    fn run_action(
        &self,
        ctx: &mut ActionContext<'_, S, E>,
        index: usize,
        action: &dyn TransitionAction<S, E>,
    ) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &self.proxy {
            Some(proxy) => {
                self.logger.trace(format_args!(
                    "executing (via proxy) TransitionAction #{index}"
                ));
                proxy.execute(&mut *ctx, action)
            }
            None => {
                self.logger.trace(format_args!("executing TransitionAction #{index}"));
                action.execute(&mut *ctx)
            }
        }));

        let result = outcome.unwrap_or_else(|payload| {
            Err(ActionError::Panicked(panic_message(payload.as_ref())))
        });

        if let Err(err) = result {
            self.logger.warn(format_args!(
                "TransitionAction #{index} failed on S({}) x E({:?}) = S'({}): {err}",
                ctx.from().name(),
                ctx.event(),
                ctx.to().name(),
            ));
        }
    }

    fn pad(&self, text: fmt::Arguments<'_>) -> String {
        format!("{:<width$}", text.to_string(), width = self.log_padding)
    }
}

/// A finite state machine that evaluates events strictly one at a time.
///
/// Handles are cheap to clone and can be shared across threads. Any number
/// of producers may fire events concurrently; evaluation happens on the
/// configured [`Executor`], one event at a time, in queue order.
///
/// Usually built with [`FsmBuilder`](crate::builder::FsmBuilder).
pub struct StrictMachine<S, E> {
    shared: Arc<Shared<S, E>>,
}

impl<S, E> Clone for StrictMachine<S, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: State, E: Event> StrictMachine<S, E> {
    /// Create a machine from ordered rule tables.
    ///
    /// Logs go to [`TracingSink`](crate::logging::TracingSink) under a fresh
    /// [`InstanceId`].
    pub fn new(
        initial: S,
        transitions: Vec<Box<dyn Transition<S, E>>>,
        actions: Vec<Box<dyn TransitionAction<S, E>>>,
        executor: Arc<dyn Executor>,
        proxy: Option<Arc<dyn ActionProxy<S, E>>>,
    ) -> Self {
        Self::from_parts(MachineParts {
            initial,
            transitions,
            actions,
            executor,
            proxy,
            logger: Logger::new(
                InstanceId::next(),
                Arc::new(crate::logging::TracingSink),
                Level::Trace,
            ),
            log_padding: crate::config::DEFAULT_LOG_PADDING,
        })
    }

    pub(crate) fn from_parts(parts: MachineParts<S, E>) -> Self {
        let shared = Shared {
            guarded: RwLock::new(Guarded {
                state: parts.initial,
                shelf: VecDeque::new(),
                values: HashMap::new(),
            }),
            queue: Mutex::new(EventQueue {
                pending: VecDeque::new(),
                scheduled: false,
            }),
            transitions: parts.transitions,
            actions: parts.actions,
            executor: parts.executor,
            proxy: parts.proxy,
            logger: parts.logger,
            log_padding: parts.log_padding,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.shared.instance_id()
    }

    /// The current state.
    ///
    /// Takes the shared lock: concurrent readers never block each other but
    /// wait for an in-progress evaluation cycle to finish.
    pub fn state(&self) -> S {
        self.shared.guarded.read().state.clone()
    }

    /// Queue `event` for evaluation. Never blocks.
    pub fn fire_event(&self, event: E) {
        self.shared.enqueue(PendingEvent::new(event, None));
    }

    /// Queue `event`; `callback` receives the state that results from
    /// evaluating exactly this event.
    ///
    /// The callback runs on the executor after the exclusive lock has been
    /// released.
    pub fn fire_event_with<F>(&self, event: E, callback: F)
    where
        F: FnOnce(S) + Send + 'static,
    {
        self.shared.enqueue(PendingEvent::new(event, Some(Box::new(callback))));
    }

    /// Queue `event` and wait for the state that results from evaluating it.
    ///
    /// Must not be called from inside a guard or action of the same machine.
    pub fn fire_event_blocking(&self, event: E) -> Result<S, FsmError> {
        let (tx, rx) = crossbeam::channel::bounded(1);
        self.fire_event_with(event, move |state| {
            let _ = tx.send(state);
        });
        rx.recv().map_err(|_| FsmError::WaitInterrupted)
    }

    /// Like [`fire_event_blocking`](Self::fire_event_blocking) but gives up
    /// waiting after `timeout`. The event is still evaluated.
    pub fn fire_event_timeout(&self, event: E, timeout: Duration) -> Result<S, FsmError> {
        let (tx, rx) = crossbeam::channel::bounded(1);
        self.fire_event_with(event, move |state| {
            let _ = tx.send(state);
        });
        rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => FsmError::Timeout(timeout),
            RecvTimeoutError::Disconnected => FsmError::WaitInterrupted,
        })
    }

    /// Queue `event` and await the resulting state.
    ///
    /// Dropping the future abandons the wait, not the evaluation.
    #[cfg(feature = "tokio")]
    pub async fn fire_event_async(&self, event: E) -> Result<S, FsmError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.fire_event_with(event, move |state| {
            let _ = tx.send(state);
        });
        rx.await.map_err(|_| FsmError::WaitInterrupted)
    }

    /// Run `f` with exclusive access to the context.
    pub fn with_context<F>(&self, f: F)
    where
        F: FnOnce(&mut FsmContext<'_, S, E>),
    {
        self.get_from_context(f)
    }

    /// Run `f` with exclusive access to the context and return its result.
    pub fn get_from_context<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut FsmContext<'_, S, E>) -> T,
    {
        let mut guarded = self.shared.guarded.write();
        let mut ctx = FsmContext::new(&self.shared, &mut guarded);
        f(&mut ctx)
    }

    /// Number of events waiting in the live queue (excluding shelved ones).
    pub fn queued_events(&self) -> usize {
        self.shared.queue.lock().pending.len()
    }
}

impl<S: State, E: Event> fmt::Debug for StrictMachine<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrictMachine")
            .field("instance_id", &self.instance_id())
            .field("transitions", &self.shared.transitions.len())
            .field("actions", &self.shared.actions.len())
            .finish()
    }
}
