//! Reconciler for converging the live tree on the desired tree.
//!
//! One reconciliation run validates the desired tree, fetches a fresh live
//! snapshot, diffs the two and executes the resulting actions. Nothing is
//! cached between runs.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::client::CoordinationClient;
use crate::error::Result;
use crate::live::LiveTree;
use crate::planner::{
    ActionExecutor, ActionHandler, DiffEngine, ExecutionMode, ExecutionReport, ReconcilePlan,
};
use crate::tree::{Node, TreeValidator};

/// Reconciler for one live tree.
#[derive(Debug)]
pub struct Reconciler<'a, C> {
    /// Live tree accessor.
    live: &'a LiveTree<C>,
    /// Desired-tree validator.
    validator: TreeValidator,
    /// Diff engine.
    diff_engine: DiffEngine,
    /// Operator cancellation.
    cancel: Option<CancellationToken>,
}

/// Result of a reconciliation run.
#[derive(Debug, Serialize)]
pub struct ReconciliationResult {
    /// Identifier of the run, also attached to its log span.
    pub run_id: Uuid,
    /// Whether every planned action was applied or reported.
    pub success: bool,
    /// The plan that was executed.
    pub plan: ReconcilePlan,
    /// What the executor did with it.
    pub report: ExecutionReport,
}

/// Report of drift detection.
#[derive(Debug, Serialize)]
pub struct DriftReport {
    /// Whether drift was detected.
    pub has_drift: bool,
    /// Keys that would be touched by a reconciliation.
    pub drifted_keys: Vec<String>,
    /// Number of nodes in the desired tree.
    pub desired_nodes: usize,
    /// Number of nodes in the live tree.
    pub live_nodes: usize,
}

impl<'a, C: CoordinationClient> Reconciler<'a, C> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(live: &'a LiveTree<C>) -> Self {
        Self {
            live,
            validator: TreeValidator::new(),
            diff_engine: DiffEngine::new(),
            cancel: None,
        }
    }

    /// Sets a token that stops execution between actions once cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validates `desired`, fetches the live tree and computes the plan.
    ///
    /// # Errors
    ///
    /// Returns a tree error if `desired` is malformed (before any remote
    /// call), or a remote error if the live tree cannot be fetched.
    pub async fn plan(&self, desired: &Node) -> Result<ReconcilePlan> {
        self.validator.validate(desired)?;
        self.plan_validated(desired).await
    }

    async fn plan_validated(&self, desired: &Node) -> Result<ReconcilePlan> {
        let live = self.live.fetch_root().await?;
        info!(
            "Comparing {} desired nodes against {} live nodes ({})",
            desired.node_count(),
            live.node_count(),
            self.live.client().backend_type()
        );

        Ok(self.diff_engine.plan(desired, &live))
    }

    /// Performs a full reconciliation run.
    ///
    /// In apply mode the client's root is created first, once `desired`
    /// has passed validation.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or planning fails, or execution aborts.
    pub async fn reconcile(
        &self,
        desired: &Node,
        handler: &mut dyn ActionHandler,
        mode: ExecutionMode,
    ) -> Result<ReconciliationResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("reconcile", %run_id);

        async move {
            info!("Starting reconciliation ({mode:?})");

            self.validator.validate(desired)?;
            if mode == ExecutionMode::Apply {
                self.live.prepare().await?;
            }

            let plan = self.plan_validated(desired).await?;

            if plan.is_empty() {
                info!("No changes required - live tree is converged");
                return Ok(ReconciliationResult {
                    run_id,
                    success: true,
                    report: ExecutionReport::new(mode),
                    plan,
                });
            }

            let mut executor = ActionExecutor::new(self.live);
            if let Some(token) = &self.cancel {
                executor = executor.with_cancellation(token.clone());
            }

            let report = executor.execute(&plan.actions, handler, mode).await?;

            Ok(ReconciliationResult {
                run_id,
                success: report.is_complete(),
                plan,
                report,
            })
        }
        .instrument(span)
        .await
    }

    /// Checks for drift without applying changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the drift check fails.
    pub async fn check_drift(&self, desired: &Node) -> Result<DriftReport> {
        self.validator.validate(desired)?;

        let live = self.live.fetch_root().await?;
        let actions = self.diff_engine.diff(desired, &live);

        Ok(DriftReport {
            has_drift: !actions.is_empty(),
            drifted_keys: actions.iter().map(|a| a.key().to_string()).collect(),
            desired_nodes: desired.node_count(),
            live_nodes: live.node_count(),
        })
    }
}

impl DriftReport {
    /// Returns true if the live tree matches (no drift).
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        !self.has_drift
    }
}

impl std::fmt::Display for DriftReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_drift {
            writeln!(f, "Drift detected:")?;
            for key in &self.drifted_keys {
                writeln!(f, "  - {key}")?;
            }
        } else {
            write!(f, "No drift detected - live tree is converged")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.success { "successful" } else { "incomplete" };
        writeln!(f, "Reconciliation {status} (run {}):", self.run_id)?;
        writeln!(f, "  Created: {}", self.plan.create_count())?;
        writeln!(f, "  Updated: {}", self.plan.update_count())?;
        writeln!(f, "  Deleted: {}", self.plan.delete_count())?;
        write!(f, "  {}", self.report)
    }
}
