//! Document worker
//!
//! The host is owned by one dedicated OS thread. Callers enqueue closures and
//! await their reply, so operations never overlap and run in the order they
//! were queued, regardless of how many connection tasks submit them.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::host::{HostError, ModelingHost};

type Job = Box<dyn FnOnce(&mut dyn ModelingHost) + Send>;

/// Handle to the thread that owns the modeling host
///
/// Cloning is cheap. The thread exits once every handle has been dropped
/// and the queue is drained.
#[derive(Debug, Clone)]
pub struct DocumentWorker {
    tx: mpsc::UnboundedSender<Job>,
}

impl DocumentWorker {
    /// Move `host` onto a new worker thread
    pub fn spawn<H: ModelingHost>(host: H) -> std::io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        thread::Builder::new()
            .name("document-worker".into())
            .spawn(move || {
                let mut host = host;
                info!("Document worker started");
                while let Some(job) = rx.blocking_recv() {
                    job(&mut host);
                }
                info!("Document worker stopped");
            })?;

        Ok(Self { tx })
    }

    /// Run `f` against the host on the worker thread and wait for its result
    ///
    /// A panic inside `f` is caught on the worker thread and reported as
    /// [`HostError::Fault`]; the worker keeps serving later jobs.
    pub async fn run<F, R>(&self, f: F) -> Result<R, HostError>
    where
        F: FnOnce(&mut dyn ModelingHost) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let job: Job = Box::new(move |host: &mut dyn ModelingHost| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(host)));
            let outcome = outcome.map_err(|payload| {
                let message = panic_message(payload.as_ref());
                error!(error = %message, "Host panicked while executing command");
                HostError::Fault(message)
            });
            if reply_tx.send(outcome).is_err() {
                debug!("Caller went away before the job finished");
            }
        });

        self.tx.send(job).map_err(|_| HostError::WorkerGone)?;
        reply_rx.await.map_err(|_| HostError::WorkerGone)?
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostCommand;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct StubHost;

    impl ModelingHost for StubHost {
        fn has_active_document(&self) -> bool {
            true
        }

        fn execute(&mut self, _command: HostCommand) -> Result<Value, HostError> {
            Ok(json!(null))
        }
    }

    #[tokio::test]
    async fn test_jobs_run_in_arrival_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let worker = DocumentWorker::spawn(StubHost).unwrap();

        let jobs = (0..20u64).map(|i| {
            let log = log.clone();
            worker.run(move |_host| {
                // Slow early jobs must still finish before later ones start
                if i % 5 == 0 {
                    std::thread::sleep(Duration::from_millis(5));
                }
                log.lock().unwrap().push(i);
            })
        });
        // join_all polls each future once in order, which enqueues in order
        for result in futures::future::join_all(jobs).await {
            result.unwrap();
        }

        assert_eq!(*log.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_panic_becomes_fault_and_worker_survives() {
        let worker = DocumentWorker::spawn(StubHost).unwrap();

        let result: Result<(), HostError> = worker.run(|_host| panic!("kernel exploded")).await;
        assert_eq!(result, Err(HostError::Fault("kernel exploded".into())));

        let ok = worker.run(|host| host.has_active_document()).await;
        assert_eq!(ok, Ok(true));
    }

    #[tokio::test]
    async fn test_runs_off_the_async_runtime() {
        let worker = DocumentWorker::spawn(StubHost).unwrap();

        let name = worker
            .run(|_host| thread::current().name().map(String::from))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("document-worker"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
