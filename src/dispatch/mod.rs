//! Dispatch gate: synchronous vs. suspendable execution.
//!
//! # Data Flow
//! ```text
//! RouteHandler::invocation(args) → Invocation
//!     → DispatchGate::dispatch(invocation, is_async)
//!         sync:  call the thunk on this thread
//!         async: driver.run(task)   (inline | cooperative | tokio)
//!     → Reply (or the handler's error, unchanged)
//! ```
//!
//! # Design Decisions
//! - The driver is chosen by configuration handed to the gate, resolved on
//!   first async dispatch and reused afterwards
//! - No retries and no recovery; the gate only selects an execution mode
//! - Timeouts belong to the transport, except for the driver deadline
//!   (`timeout_ms`: tokio run deadline, cooperative idle wait)

pub mod driver;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures_util::future::{self, FutureExt};

use crate::config::schema::{DispatchConfig, DriverKind};
use crate::error::DispatchError;
use crate::handler::Reply;

pub use driver::{yield_now, CooperativeDriver, Driver, InlineDriver, Task, TokioDriver, YieldNow};

/// A handler bound to its arguments, ready to run.
pub enum Invocation {
    Blocking(Box<dyn FnOnce() -> Result<Reply, DispatchError> + Send>),
    Suspendable(Task),
}

impl Invocation {
    /// View the invocation as a task, for the async path.
    pub fn into_task(self) -> Task {
        match self {
            Invocation::Blocking(thunk) => future::lazy(move |_| thunk()).boxed(),
            Invocation::Suspendable(task) => task,
        }
    }

    pub fn is_suspendable(&self) -> bool {
        matches!(self, Invocation::Suspendable(_))
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invocation::Blocking(_) => f.write_str("Invocation::Blocking"),
            Invocation::Suspendable(_) => f.write_str("Invocation::Suspendable"),
        }
    }
}

/// Build the driver named by `config`.
pub fn build_driver(config: &DispatchConfig) -> Result<Arc<dyn Driver>, DispatchError> {
    let driver: Arc<dyn Driver> = match config.driver {
        DriverKind::Inline => Arc::new(InlineDriver),
        DriverKind::Cooperative => Arc::new(
            CooperativeDriver::new(config.max_resumes)
                .with_idle_timeout(Duration::from_millis(config.timeout_ms)),
        ),
        DriverKind::Tokio => Arc::new(TokioDriver::new(Duration::from_millis(config.timeout_ms))?),
    };
    Ok(driver)
}

/// Chooses between direct execution and driver-backed execution.
pub struct DispatchGate {
    config: DispatchConfig,
    driver: OnceLock<Arc<dyn Driver>>,
}

impl DispatchGate {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            driver: OnceLock::new(),
        }
    }

    /// Gate with an already chosen driver.
    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        let gate = Self::new(DispatchConfig::default());
        let _ = gate.driver.set(driver);
        gate
    }

    /// Override the driver. Only allowed before the first async dispatch.
    pub fn use_driver(&self, driver: Arc<dyn Driver>) -> Result<(), DispatchError> {
        self.driver
            .set(driver)
            .map_err(|_| DispatchError::DriverLocked)
    }

    /// The active driver, building it from configuration on first use.
    pub fn driver(&self) -> Result<Arc<dyn Driver>, DispatchError> {
        if let Some(driver) = self.driver.get() {
            return Ok(driver.clone());
        }

        let built = build_driver(&self.config)?;
        // A concurrent caller may have won; whichever was stored is used.
        let _ = self.driver.set(built);
        let driver = self
            .driver
            .get()
            .cloned()
            .ok_or_else(|| DispatchError::DriverUnavailable("driver was not retained".into()))?;

        tracing::debug!(driver = driver.name(), "Dispatch driver resolved");
        Ok(driver)
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run the thunk on the current thread.
    pub fn dispatch_sync<F>(&self, thunk: F) -> Result<Reply, DispatchError>
    where
        F: FnOnce() -> Result<Reply, DispatchError>,
    {
        thunk()
    }

    /// Run the task on the driver until it completes.
    pub fn dispatch_async(&self, task: Task) -> Result<Reply, DispatchError> {
        let driver = self.driver()?;
        tracing::debug!(driver = driver.name(), "Async dispatch");
        driver.run(task)
    }

    /// Dispatch an invocation in the requested mode.
    ///
    /// Suspendable invocations always need a driver, whatever `is_async` says.
    pub fn dispatch(&self, invocation: Invocation, is_async: bool) -> Result<Reply, DispatchError> {
        match invocation {
            Invocation::Blocking(thunk) if !is_async => self.dispatch_sync(thunk),
            other => self.dispatch_async(other.into_task()),
        }
    }
}

impl std::fmt::Debug for DispatchGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchGate")
            .field("config", &self.config)
            .field("driver", &self.driver.get().map(|d| d.name()))
            .finish()
    }
}
