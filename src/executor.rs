//! Executors that run the machine's evaluation units.
//!
//! The engine hands an executor one unit at a time; an executor only has to
//! run each task exactly once, eventually, on some thread other than the
//! submitting one.

use crossbeam::channel::{Receiver, Sender};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// A unit of work submitted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks asynchronously.
///
/// Implementations must not run the task inline on the caller's thread:
/// the engine submits follow-up units from inside a running unit.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

impl<F> Executor for F
where
    F: Fn(Task) + Send + Sync,
{
    fn execute(&self, task: Task) {
        self(task)
    }
}

/// Executor backed by one dedicated, named worker thread.
///
/// Tasks run in submission order. The worker exits once every handle has
/// been dropped and the queued tasks have run. A panicking task is logged
/// and does not take the worker down.
pub struct ThreadExecutor {
    name: String,
    tx: Sender<Task>,
}

impl ThreadExecutor {
    /// Spawn the worker thread.
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (tx, rx) = crossbeam::channel::unbounded::<Task>();
        let worker_name = name.clone();
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_worker(&worker_name, rx))?;
        Ok(Self { name, tx })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, task: Task) {
        if self.tx.send(task).is_err() {
            tracing::error!(worker = %self.name, "Executor worker has stopped; task dropped");
        }
    }
}

fn run_worker(name: &str, rx: Receiver<Task>) {
    while let Ok(task) = rx.recv() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            tracing::error!(
                worker = %name,
                panic = %panic_message(payload.as_ref()),
                "Task panicked on executor worker"
            );
        }
    }
    tracing::trace!(worker = %name, "Executor worker exiting");
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Executor that runs tasks on a tokio runtime's blocking pool.
///
/// Evaluation units take a blocking lock, so they never run on the async
/// worker threads.
#[cfg(feature = "tokio")]
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Executor bound to the runtime the caller is running in, if any.
    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

#[cfg(feature = "tokio")]
impl Executor for TokioExecutor {
    fn execute(&self, task: Task) {
        drop(self.handle.spawn_blocking(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tasks_run_in_submission_order() {
        let executor = ThreadExecutor::spawn("order-test").unwrap();
        let (tx, rx) = crossbeam::channel::unbounded();

        for i in 0..10 {
            let tx = tx.clone();
            executor.execute(Box::new(move || {
                tx.send(i).unwrap();
            }));
        }

        let seen: Vec<i32> = (0..10)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn tasks_run_on_the_named_worker() {
        let executor = ThreadExecutor::spawn("named-worker").unwrap();
        let (tx, rx) = crossbeam::channel::bounded(1);

        executor.execute(Box::new(move || {
            let name = thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        }));

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("named-worker"));
        assert_eq!(executor.name(), "named-worker");
    }

    #[test]
    fn worker_survives_a_panicking_task() {
        let executor = ThreadExecutor::spawn("panic-test").unwrap();
        let (tx, rx) = crossbeam::channel::bounded(1);

        executor.execute(Box::new(|| panic!("boom")));
        executor.execute(Box::new(move || tx.send("still alive").unwrap()));

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            "still alive"
        );
    }

    #[test]
    fn closures_are_executors() {
        let worker = ThreadExecutor::spawn("closure-backing").unwrap();
        let executor = move |task: Task| worker.execute(task);
        let (tx, rx) = crossbeam::channel::bounded(1);

        executor.execute(Box::new(move || tx.send(3).unwrap()));

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 3);
    }

    #[test]
    fn panic_message_extracts_text() {
        let payload: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(panic_message(payload.as_ref()), "static text");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned text"));
        assert_eq!(panic_message(payload.as_ref()), "owned text");

        let payload: Box<dyn Any + Send> = Box::new(17u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(flavor = "multi_thread")]
    async fn tokio_executor_runs_tasks() {
        let executor = TokioExecutor::try_current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        executor.execute(Box::new(move || {
            let _ = tx.send(5);
        }));

        assert_eq!(rx.await.unwrap(), 5);
    }
}
