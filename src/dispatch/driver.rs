//! Scheduler backends for suspendable handlers.
//!
//! A driver takes a boxed task and runs it to completion on the calling
//! thread, or reports that it could not.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::task::{Context, Poll, Wake, Waker};
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use futures_util::task::noop_waker_ref;
use tokio::runtime::{Builder, Runtime};

use crate::error::DispatchError;
use crate::handler::Reply;

/// A unit of work handed to a driver.
pub type Task = BoxFuture<'static, Result<Reply, DispatchError>>;

/// Runs suspendable tasks to completion.
pub trait Driver: Send + Sync {
    /// Short name used in logs and stall errors.
    fn name(&self) -> &'static str;

    /// Drive `task` until it completes. Errors raised by the task are returned
    /// unchanged.
    fn run(&self, task: Task) -> Result<Reply, DispatchError>;
}

/// Polls a task exactly once.
///
/// Enough for handlers that never suspend. A handler that does suspend fails
/// with [`DispatchError::DispatchStalled`].
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDriver;

impl Driver for InlineDriver {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn run(&self, mut task: Task) -> Result<Reply, DispatchError> {
        let mut cx = Context::from_waker(noop_waker_ref());
        match task.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => Err(DispatchError::DispatchStalled {
                driver: self.name(),
                reason: "handler suspended but the inline driver cannot resume it".into(),
            }),
        }
    }
}

/// Resumes a task each time it is woken, on the calling thread.
///
/// There is no reactor: the thread sleeps until the task's waker fires, then
/// polls again. Each wake counts against `max_resumes`. A task that is not
/// woken within `idle_timeout` is considered stalled.
#[derive(Debug, Clone, Copy)]
pub struct CooperativeDriver {
    max_resumes: u64,
    idle_timeout: Duration,
}

impl CooperativeDriver {
    pub fn new(max_resumes: u64) -> Self {
        Self {
            max_resumes,
            idle_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn max_resumes(&self) -> u64 {
        self.max_resumes
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

impl Default for CooperativeDriver {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl Driver for CooperativeDriver {
    fn name(&self) -> &'static str {
        "cooperative"
    }

    fn run(&self, mut task: Task) -> Result<Reply, DispatchError> {
        let signal = Arc::new(WakeSignal::default());
        let waker = Waker::from(signal.clone());
        let mut cx = Context::from_waker(&waker);
        let mut resumes = 0u64;
        loop {
            if let Poll::Ready(result) = task.as_mut().poll(&mut cx) {
                if resumes > 0 {
                    tracing::trace!(resumes, "Suspendable handler completed");
                }
                return result;
            }
            if !signal.wait(self.idle_timeout) {
                return Err(DispatchError::DispatchStalled {
                    driver: self.name(),
                    reason: format!("not woken within {:?}", self.idle_timeout),
                });
            }
            if resumes >= self.max_resumes {
                return Err(DispatchError::DispatchStalled {
                    driver: self.name(),
                    reason: format!("no completion after {resumes} resumes"),
                });
            }
            resumes += 1;
        }
    }
}

/// Wake flag the cooperative driver sleeps on.
#[derive(Debug, Default)]
struct WakeSignal {
    woken: Mutex<bool>,
    cvar: Condvar,
}

impl WakeSignal {
    /// Block until woken or `timeout` elapses. Returns whether a wake arrived,
    /// and clears it.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut woken = self.woken.lock().unwrap_or_else(PoisonError::into_inner);
        while !*woken {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            woken = self
                .cvar
                .wait_timeout(woken, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *woken = false;
        true
    }

    fn notify(&self) {
        *self.woken.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cvar.notify_one();
    }
}

impl Wake for WakeSignal {
    fn wake(self: Arc<Self>) {
        self.notify();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.notify();
    }
}

/// Runs tasks on a private current-thread tokio runtime.
///
/// Handlers may use tokio timers and I/O. Each run is bounded by `timeout`;
/// on expiry the task is dropped and the dispatch reported as stalled.
/// Must not be called from inside an async context.
pub struct TokioDriver {
    runtime: Option<Runtime>,
    timeout: Duration,
}

impl TokioDriver {
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .thread_name("easyroute-dispatch")
            .build()
            .map_err(|e| DispatchError::DriverUnavailable(format!("tokio runtime: {e}")))?;

        Ok(Self {
            runtime: Some(runtime),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Driver for TokioDriver {
    fn name(&self) -> &'static str {
        "tokio"
    }

    fn run(&self, task: Task) -> Result<Reply, DispatchError> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| DispatchError::DriverUnavailable("tokio runtime already shut down".into()))?;

        match runtime.block_on(tokio::time::timeout(self.timeout, task)) {
            Ok(result) => result,
            Err(_) => Err(DispatchError::DispatchStalled {
                driver: self.name(),
                reason: format!("deadline of {:?} elapsed", self.timeout),
            }),
        }
    }
}

impl Drop for TokioDriver {
    fn drop(&mut self) {
        // Dropping a runtime from async context panics; shutdown_background does not.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for TokioDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioDriver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Suspension point for suspendable handlers.
///
/// Returns `Pending` once, waking itself, then completes. Works under every
/// driver that resumes tasks.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
