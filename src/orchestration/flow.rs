//! Flow runner: bounded retries, then notify and re-raise

use crate::error::ForestError;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::notify::{FailureNotice, Notifier};

/// A flow run that gave up
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Flow run '{flow_run_name}' failed after {attempts} attempt(s): {source}")]
    Failed {
        flow_run_name: String,
        attempts: u32,
        #[source]
        source: ForestError,
    },
}

impl FlowError {
    /// The error returned by the last attempt
    pub fn cause(&self) -> &ForestError {
        match self {
            FlowError::Failed { source, .. } => source,
        }
    }

    pub fn into_cause(self) -> ForestError {
        match self {
            FlowError::Failed { source, .. } => source,
        }
    }
}

/// Identity of the flow run handed to each attempt
#[derive(Debug, Clone)]
pub struct FlowContext {
    /// Unique name of this flow run
    pub flow_run_name: String,
    /// 1-based attempt number
    pub attempt: u32,
}

/// Runs a task as a named flow.
///
/// Retryable failures are attempted again up to `retries` times. When the
/// flow gives up the notifier receives one [`FailureNotice`] and the last
/// error is returned to the caller.
pub struct FlowRunner {
    flow_name: String,
    notifier: Box<dyn Notifier + Send + Sync>,
    retries: u32,
    retry_delay: Duration,
}

impl FlowRunner {
    pub fn new(flow_name: impl Into<String>, notifier: Box<dyn Notifier + Send + Sync>) -> Self {
        Self {
            flow_name: flow_name.into(),
            notifier,
            retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// Set the number of retries after the first attempt
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the pause between attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn new_run_name(&self) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.flow_name, &id[..8])
    }

    /// Execute `task` under a fresh flow-run name
    pub fn run<T, F>(&self, mut task: F) -> Result<T, FlowError>
    where
        F: FnMut(&FlowContext) -> crate::error::Result<T>,
    {
        let flow_run_name = self.new_run_name();
        let max_attempts = self.retries.saturating_add(1);
        let mut attempt = 1;

        info!(flow = %self.flow_name, flow_run = %flow_run_name, "Starting flow run");

        loop {
            let ctx = FlowContext {
                flow_run_name: flow_run_name.clone(),
                attempt,
            };

            let err = match task(&ctx) {
                Ok(value) => {
                    info!(flow_run = %flow_run_name, attempt, "Flow run completed");
                    return Ok(value);
                }
                Err(err) => err,
            };

            if attempt < max_attempts && err.is_retryable() {
                warn!(flow_run = %flow_run_name, attempt, error = %err, "Attempt failed, retrying");
                if !self.retry_delay.is_zero() {
                    thread::sleep(self.retry_delay);
                }
                attempt += 1;
                continue;
            }

            let notice = FailureNotice::new(&flow_run_name, err.to_string(), attempt);
            if let Err(notify_err) = self.notifier.notify(&notice) {
                // The original failure is what the caller gets back
                warn!(flow_run = %flow_run_name, error = %notify_err, "Failure notification not delivered");
            }

            return Err(FlowError::Failed {
                flow_run_name,
                attempts: attempt,
                source: err,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CollectingNotifier {
        notices: Arc<Mutex<Vec<FailureNotice>>>,
    }

    impl Notifier for CollectingNotifier {
        fn notify(&self, notice: &FailureNotice) -> Result<()> {
            self.notices.lock().push(notice.clone());
            Ok(())
        }
    }

    struct BrokenNotifier;

    impl Notifier for BrokenNotifier {
        fn notify(&self, _notice: &FailureNotice) -> Result<()> {
            Err(ForestError::NotificationError("smtp down".into()))
        }
    }

    #[test]
    fn test_success_does_not_notify() {
        let notifier = CollectingNotifier::default();
        let runner = FlowRunner::new("train", Box::new(notifier.clone()));

        let value = runner.run(|ctx| {
            assert!(ctx.flow_run_name.starts_with("train-"));
            Ok(42)
        });

        assert_eq!(value.unwrap(), 42);
        assert!(notifier.notices.lock().is_empty());
    }

    #[test]
    fn test_failure_notifies_once_and_reraises() {
        let notifier = CollectingNotifier::default();
        let runner = FlowRunner::new("train", Box::new(notifier.clone())).with_retries(2);

        let mut calls = 0;
        let result: std::result::Result<(), _> = runner.run(|_| {
            calls += 1;
            Err(ForestError::data_load("/data/train", "split file not found"))
        });

        assert_eq!(calls, 3);
        let err = result.unwrap_err();
        assert!(matches!(err.cause(), ForestError::DataLoad { .. }));

        let notices = notifier.notices.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].attempts, 3);
        assert!(notices[0].message().contains("split file not found"));
    }

    #[test]
    fn test_retry_then_succeed() {
        let notifier = CollectingNotifier::default();
        let runner = FlowRunner::new("train", Box::new(notifier.clone())).with_retries(1);

        let value = runner.run(|ctx| {
            if ctx.attempt == 1 {
                Err(ForestError::TrackingError("store busy".into()))
            } else {
                Ok(ctx.attempt)
            }
        });

        assert_eq!(value.unwrap(), 2);
        assert!(notifier.notices.lock().is_empty());
    }

    #[test]
    fn test_invalid_config_not_retried() {
        let notifier = CollectingNotifier::default();
        let runner = FlowRunner::new("train", Box::new(notifier.clone())).with_retries(5);

        let mut calls = 0;
        let result: std::result::Result<(), _> = runner.run(|_| {
            calls += 1;
            Err(ForestError::InvalidConfig("max_depth must be greater than 0".into()))
        });

        assert_eq!(calls, 1);
        assert!(matches!(result.unwrap_err().into_cause(), ForestError::InvalidConfig(_)));
        assert_eq!(notifier.notices.lock().len(), 1);
    }

    #[test]
    fn test_notifier_failure_keeps_original_error() {
        let runner = FlowRunner::new("train", Box::new(BrokenNotifier));

        let result: std::result::Result<(), _> =
            runner.run(|_| Err(ForestError::data_load("/data/val", "corrupt JSON")));

        let err = result.unwrap_err();
        assert!(matches!(err.cause(), ForestError::DataLoad { .. }));
        assert!(err.to_string().contains("corrupt JSON"));
    }
}
