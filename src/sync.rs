//! Reconciliation: drive the platform toward the declared state.
//!
//! All work is sequential. Declared codes are resolved one at a time by
//! their unique `code` string; nothing is remembered between runs. A
//! failure on one code is recorded and the run continues with the next.

use std::collections::HashSet;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::DesiredDiscountCode;
use crate::contract::DiscountCodesApi;
use crate::error::ApiResult;
use crate::models::DiscountCode;
use crate::plan::{compute_plan, Plan};
use crate::resource::{self, UpdateOutcome};
use crate::retry::RetryPolicy;

/// Options shared by plan and apply.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Delete remote codes that are not declared in the configuration.
    pub prune: bool,
}

/// What happened to one code during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeOutcome {
    Created,
    Updated { actions: usize },
    Unchanged,
    Deleted,
    /// A delete that did not happen (already absent, or failed and was
    /// swallowed). Details are in the logs.
    Skipped,
    Failed { error: String },
}

/// Per-code record of a run.
#[derive(Debug, Clone)]
pub struct CodeReport {
    pub code: String,
    pub outcome: CodeOutcome,
}

/// Outcome of a whole apply or destroy run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub outcomes: Vec<CodeReport>,
}

impl SyncReport {
    fn record(&mut self, code: &str, outcome: CodeOutcome) {
        self.outcomes.push(CodeReport {
            code: code.to_string(),
            outcome,
        });
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, CodeOutcome::Created))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, CodeOutcome::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, CodeOutcome::Unchanged))
    }

    pub fn deleted(&self) -> usize {
        self.count(|o| matches!(o, CodeOutcome::Deleted))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CodeOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CodeOutcome::Failed { .. }))
    }

    /// A run succeeds when no code ended in `Failed`. Skipped deletes do
    /// not fail a run.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} created, {} updated, {} unchanged, {} deleted, {} skipped, {} failed",
            self.created(),
            self.updated(),
            self.unchanged(),
            self.deleted(),
            self.skipped(),
            self.failed()
        )
    }

    fn count(&self, pred: impl Fn(&CodeOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Compute the plan for the declared codes without touching anything.
pub async fn plan(
    api: &dyn DiscountCodesApi,
    desired: &[DesiredDiscountCode],
    options: &SyncOptions,
) -> ApiResult<Plan> {
    info!(
        declared = desired.len(),
        prune = options.prune,
        "[PLAN] Listing current discount codes"
    );
    let observed = api.list_all().await?;
    info!(observed = observed.len(), "[PLAN] Listed current discount codes");
    compute_plan(desired, &observed, options.prune)
}

/// Apply the declared state: create missing codes, update drifted ones and,
/// with `prune`, delete undeclared ones.
pub async fn apply(
    api: &dyn DiscountCodesApi,
    policy: &RetryPolicy,
    desired: &[DesiredDiscountCode],
    options: &SyncOptions,
) -> ApiResult<SyncReport> {
    // Correlates all log lines of one run.
    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        declared = desired.len(),
        prune = options.prune,
        "[APPLY] Starting apply run"
    );

    if desired.is_empty() && options.prune {
        warn!("[APPLY] No codes declared and prune is on; every remote discount code will be deleted");
    }

    let mut report = SyncReport::default();

    for declared in desired {
        match api.find_by_code(&declared.code).await {
            Ok(None) => {
                info!(code = %declared.code, "[APPLY] Creating missing discount code");
                match resource::create(api, policy, declared).await {
                    Ok(_) => report.record(&declared.code, CodeOutcome::Created),
                    Err(e) => {
                        error!(code = %declared.code, error = %e, "[APPLY][ERROR] Create failed");
                        report.record(
                            &declared.code,
                            CodeOutcome::Failed {
                                error: e.to_string(),
                            },
                        );
                    }
                }
            }
            Ok(Some(remote)) => match resource::update(api, declared, &remote.id).await {
                Ok(UpdateOutcome::Changed { actions, .. }) => {
                    report.record(&declared.code, CodeOutcome::Updated { actions });
                }
                Ok(UpdateOutcome::InSync(_)) => {
                    report.record(&declared.code, CodeOutcome::Unchanged);
                }
                Err(e) => {
                    error!(code = %declared.code, error = %e, "[APPLY][ERROR] Update failed");
                    report.record(
                        &declared.code,
                        CodeOutcome::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            },
            Err(e) => {
                error!(code = %declared.code, error = %e, "[APPLY][ERROR] Lookup failed");
                report.record(
                    &declared.code,
                    CodeOutcome::Failed {
                        error: e.to_string(),
                    },
                );
            }
        }
    }

    if options.prune {
        let observed = api.list_all().await.map_err(|e| {
            error!(error = %e, "[APPLY][ERROR] Could not list discount codes for pruning");
            e
        })?;
        let declared_codes: HashSet<&str> = desired.iter().map(|d| d.code.as_str()).collect();
        let mut undeclared: Vec<&DiscountCode> = observed
            .iter()
            .filter(|remote| !declared_codes.contains(remote.code.as_str()))
            .collect();
        undeclared.sort_by(|a, b| a.code.cmp(&b.code));

        for remote in undeclared {
            info!(code = %remote.code, "[APPLY] Pruning undeclared discount code");
            match resource::delete(api, &remote.id).await {
                Some(_) => report.record(&remote.code, CodeOutcome::Deleted),
                None => report.record(&remote.code, CodeOutcome::Skipped),
            }
        }
    }

    info!(%run_id, summary = %report.summary_line(), "[APPLY] Apply run finished");
    Ok(report)
}

/// Delete every declared code from the platform.
pub async fn destroy(
    api: &dyn DiscountCodesApi,
    desired: &[DesiredDiscountCode],
) -> ApiResult<SyncReport> {
    let run_id = Uuid::new_v4();
    info!(%run_id, declared = desired.len(), "[DESTROY] Starting destroy run");

    let mut report = SyncReport::default();

    for declared in desired {
        match api.find_by_code(&declared.code).await {
            Ok(Some(remote)) => {
                info!(code = %declared.code, "[DESTROY] Deleting discount code");
                match resource::delete(api, &remote.id).await {
                    Some(_) => report.record(&declared.code, CodeOutcome::Deleted),
                    None => report.record(&declared.code, CodeOutcome::Skipped),
                }
            }
            Ok(None) => {
                info!(code = %declared.code, "[DESTROY] Discount code already absent");
                report.record(&declared.code, CodeOutcome::Skipped);
            }
            Err(e) => {
                error!(code = %declared.code, error = %e, "[DESTROY][ERROR] Lookup failed");
                report.record(
                    &declared.code,
                    CodeOutcome::Failed {
                        error: e.to_string(),
                    },
                );
            }
        }
    }

    info!(%run_id, summary = %report.summary_line(), "[DESTROY] Destroy run finished");
    Ok(report)
}
