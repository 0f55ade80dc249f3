//! Plan computation: declared codes against the platform's current state.
//!
//! A plan is computed with the same diff the apply path uses, so the action
//! list shown for an update is exactly what apply would send.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::actions::build_update_actions;
use crate::config::DesiredDiscountCode;
use crate::error::ApiError;
use crate::models::{DiscountCode, UpdateAction};

/// One planned step for a single discount code.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedChange {
    /// Declared but absent remotely.
    Create { code: String },
    /// Present on both sides with field drift.
    Update {
        code: String,
        id: String,
        actions: Vec<UpdateAction>,
    },
    /// Present on both sides and already in sync.
    Unchanged { code: String },
    /// Present remotely but not declared. Only planned when pruning.
    Delete { code: String, id: String },
}

impl PlannedChange {
    pub fn code(&self) -> &str {
        match self {
            PlannedChange::Create { code }
            | PlannedChange::Update { code, .. }
            | PlannedChange::Unchanged { code }
            | PlannedChange::Delete { code, .. } => code,
        }
    }
}

/// The full set of steps one apply would perform.
#[derive(Debug, Clone)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    pub fn summary(&self) -> PlanSummary {
        PlanSummary::from_changes(&self.changes)
    }

    pub fn has_changes(&self) -> bool {
        self.summary().has_changes()
    }

    /// Human-readable plan listing, one line per code plus a closing total.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for change in &self.changes {
            match change {
                PlannedChange::Create { code } => {
                    let _ = writeln!(out, "+ {code} (create)");
                }
                PlannedChange::Update { code, actions, .. } => {
                    let names: Vec<_> = actions.iter().map(UpdateAction::name).collect();
                    let _ = writeln!(out, "~ {code} ({})", names.join(", "));
                }
                PlannedChange::Unchanged { code } => {
                    let _ = writeln!(out, "= {code} (in sync)");
                }
                PlannedChange::Delete { code, .. } => {
                    let _ = writeln!(out, "- {code} (delete)");
                }
            }
        }
        let summary = self.summary();
        let _ = writeln!(
            out,
            "Plan: {} to create, {} to update, {} to delete, {} in sync.",
            summary.creations, summary.updates, summary.deletions, summary.unchanged
        );
        out
    }
}

/// Compute the plan for a set of declared codes against the observed remote
/// state. With `prune`, remote codes that are not declared are planned for
/// deletion; without it they are left alone.
pub fn compute_plan(
    desired: &[DesiredDiscountCode],
    observed: &[DiscountCode],
    prune: bool,
) -> Result<Plan, ApiError> {
    let observed_by_code: HashMap<&str, &DiscountCode> =
        observed.iter().map(|c| (c.code.as_str(), c)).collect();

    let mut changes = Vec::new();
    for declared in desired {
        match observed_by_code.get(declared.code.as_str()) {
            None => changes.push(PlannedChange::Create {
                code: declared.code.clone(),
            }),
            Some(remote) => {
                let actions = build_update_actions(declared, remote)?;
                if actions.is_empty() {
                    changes.push(PlannedChange::Unchanged {
                        code: declared.code.clone(),
                    });
                } else {
                    changes.push(PlannedChange::Update {
                        code: declared.code.clone(),
                        id: remote.id.clone(),
                        actions,
                    });
                }
            }
        }
    }

    if prune {
        let declared_codes: HashSet<&str> = desired.iter().map(|d| d.code.as_str()).collect();
        let mut undeclared: Vec<_> = observed
            .iter()
            .filter(|remote| !declared_codes.contains(remote.code.as_str()))
            .collect();
        undeclared.sort_by(|a, b| a.code.cmp(&b.code));
        for remote in undeclared {
            changes.push(PlannedChange::Delete {
                code: remote.code.clone(),
                id: remote.id.clone(),
            });
        }
    }

    Ok(Plan { changes })
}

/// Plan summary statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub creations: usize,
    pub updates: usize,
    pub deletions: usize,
    pub unchanged: usize,
}

impl PlanSummary {
    pub fn from_changes(changes: &[PlannedChange]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change {
                PlannedChange::Create { .. } => summary.creations += 1,
                PlannedChange::Update { .. } => summary.updates += 1,
                PlannedChange::Delete { .. } => summary.deletions += 1,
                PlannedChange::Unchanged { .. } => summary.unchanged += 1,
            }
        }
        summary
    }

    /// Number of steps that would touch the platform.
    pub fn total(&self) -> usize {
        self.creations + self.updates + self.deletions
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CartDiscountReference;

    fn declared(code: &str) -> DesiredDiscountCode {
        DesiredDiscountCode {
            code: code.into(),
            name: None,
            description: None,
            cart_discounts: vec!["cd-1".into()],
            predicate: None,
            is_active: true,
            valid_from: None,
            valid_until: None,
            max_applications: None,
            max_applications_per_customer: None,
            groups: vec![],
        }
    }

    fn remote(code: &str, id: &str) -> DiscountCode {
        DiscountCode {
            id: id.into(),
            version: 1,
            code: code.into(),
            name: None,
            description: None,
            cart_discounts: vec![CartDiscountReference {
                type_id: "cart-discount".into(),
                id: "cd-1".into(),
            }],
            cart_predicate: None,
            is_active: true,
            valid_from: None,
            valid_until: None,
            max_applications: None,
            max_applications_per_customer: None,
            groups: vec![],
            created_at: None,
            last_modified_at: None,
        }
    }

    #[test]
    fn classifies_create_update_unchanged() {
        let desired = vec![declared("NEW"), declared("DRIFTED"), declared("SAME")];
        let mut drifted = remote("DRIFTED", "id-d");
        drifted.is_active = false;
        let observed = vec![drifted, remote("SAME", "id-s")];

        let plan = compute_plan(&desired, &observed, false).unwrap();
        assert_eq!(plan.changes.len(), 3);
        assert_eq!(
            plan.changes[0],
            PlannedChange::Create { code: "NEW".into() }
        );
        match &plan.changes[1] {
            PlannedChange::Update { code, id, actions } => {
                assert_eq!(code, "DRIFTED");
                assert_eq!(id, "id-d");
                assert_eq!(actions.len(), 1);
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert_eq!(
            plan.changes[2],
            PlannedChange::Unchanged { code: "SAME".into() }
        );

        let summary = plan.summary();
        assert_eq!(summary.creations, 1);
        assert_eq!(summary.updates, 1);
        assert_eq!(summary.deletions, 0);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn undeclared_codes_survive_without_prune() {
        let plan = compute_plan(&[], &[remote("LEGACY", "id-l")], false).unwrap();
        assert!(plan.changes.is_empty());
        assert!(!plan.has_changes());
    }

    #[test]
    fn prune_plans_deletes_sorted_by_code() {
        let observed = vec![remote("ZULU", "id-z"), remote("ALPHA", "id-a")];
        let plan = compute_plan(&[], &observed, true).unwrap();
        assert_eq!(
            plan.changes,
            vec![
                PlannedChange::Delete {
                    code: "ALPHA".into(),
                    id: "id-a".into()
                },
                PlannedChange::Delete {
                    code: "ZULU".into(),
                    id: "id-z".into()
                },
            ]
        );
    }

    #[test]
    fn render_lists_each_code_and_totals() {
        let desired = vec![declared("NEW"), declared("SAME")];
        let observed = vec![remote("SAME", "id-s"), remote("OLD", "id-o")];
        let plan = compute_plan(&desired, &observed, true).unwrap();
        let rendered = plan.render();
        assert!(rendered.contains("+ NEW (create)"));
        assert!(rendered.contains("= SAME (in sync)"));
        assert!(rendered.contains("- OLD (delete)"));
        assert!(rendered.contains("Plan: 1 to create, 0 to update, 1 to delete, 1 in sync."));
    }
}
