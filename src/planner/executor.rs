//! Action executor for replaying plans against the live tree.
//!
//! Actions are processed strictly in order. The first failed mutation
//! aborts the run; already applied actions are not rolled back.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::CoordinationClient;
use crate::error::{ExecuteError, RemoteError, Result, ZkTreeError};
use crate::live::LiveTree;

use super::handler::{ActionHandler, Confirmation};
use super::plan::{Action, ActionKind};

/// Whether the executor mutates the live tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Invoke handlers only; no remote mutation.
    ReportOnly,
    /// Invoke handlers and perform the mutations.
    Apply,
}

/// Executor for action sequences.
#[derive(Debug)]
pub struct ActionExecutor<'a, C> {
    /// Live tree the mutations go to.
    live: &'a LiveTree<C>,
    /// Operator cancellation, observed between actions.
    cancel: Option<CancellationToken>,
}

/// Outcome of a run that was not aborted by a failure.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// Mode the run executed in.
    pub mode: ExecutionMode,
    /// Actions whose mutation succeeded.
    pub applied: Vec<Action>,
    /// Actions the handler declined.
    pub skipped: Vec<Action>,
    /// Actions only reported (report-only mode).
    pub reported: Vec<Action>,
    /// Whether the run stopped early on operator request.
    pub cancelled: bool,
}

impl<'a, C: CoordinationClient> ActionExecutor<'a, C> {
    /// Creates a new executor.
    #[must_use]
    pub const fn new(live: &'a LiveTree<C>) -> Self {
        Self { live, cancel: None }
    }

    /// Sets a token that stops the run between actions once cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Executes actions in order.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError::ActionFailed`] on the first failed mutation and
    /// [`ExecuteError::InputFailed`] if the handler fails; both carry the
    /// actions applied so far.
    pub async fn execute(
        &self,
        actions: &[Action],
        handler: &mut dyn ActionHandler,
        mode: ExecutionMode,
    ) -> Result<ExecutionReport> {
        info!("Executing {} actions ({mode:?})", actions.len());

        let mut report = ExecutionReport::new(mode);

        for action in actions {
            if self.is_cancelled() {
                warn!("Run cancelled before {action}");
                report.cancelled = true;
                break;
            }

            handler
                .handle(action)
                .map_err(|e| input_failed(action, &e, &mut report))?;

            if mode == ExecutionMode::ReportOnly {
                report.reported.push(action.clone());
                continue;
            }

            match handler
                .confirm(action)
                .map_err(|e| input_failed(action, &e, &mut report))?
            {
                Confirmation::Approved => {}
                Confirmation::Declined => {
                    info!("Skipping {action}: declined");
                    report.skipped.push(action.clone());
                    continue;
                }
                Confirmation::Quit => {
                    warn!("Run stopped by operator at {action}");
                    report.cancelled = true;
                    break;
                }
            }

            if self.is_cancelled() {
                warn!("Run cancelled before applying {action}");
                report.cancelled = true;
                break;
            }

            if let Err(source) = self.apply(action).await {
                error!("Failed to apply {action}: {source}");
                return Err(ZkTreeError::Execute(ExecuteError::ActionFailed {
                    applied: report.applied,
                    failed: Box::new(action.clone()),
                    source,
                }));
            }

            debug!("Applied {action}");
            report.applied.push(action.clone());
        }

        info!("{report}");
        Ok(report)
    }

    /// Performs the remote mutation for one action.
    async fn apply(&self, action: &Action) -> std::result::Result<(), RemoteError> {
        let value = action.new_value().unwrap_or_default();
        match action.kind() {
            ActionKind::Create => self.live.create(action.key(), value).await,
            ActionKind::Delete => self.live.delete(action.key()).await,
            ActionKind::SetValue => self.live.set_value(action.key(), value).await,
        }
    }
}

fn input_failed(action: &Action, err: &std::io::Error, report: &mut ExecutionReport) -> ZkTreeError {
    error!("Handler failed on {action}: {err}");
    ZkTreeError::Execute(ExecuteError::InputFailed {
        key: action.key().to_string(),
        message: err.to_string(),
        applied: std::mem::take(&mut report.applied),
    })
}

impl ExecutionReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            applied: Vec::new(),
            skipped: Vec::new(),
            reported: Vec::new(),
            cancelled: false,
        }
    }

    /// Returns true if every action went through without skips or
    /// cancellation.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        !self.cancelled && self.skipped.is_empty()
    }
}

impl std::fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            ExecutionMode::ReportOnly => write!(f, "Reported {} actions", self.reported.len())?,
            ExecutionMode::Apply => write!(
                f,
                "Applied {} actions, {} skipped",
                self.applied.len(),
                self.skipped.len()
            )?,
        }
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}
