//! Lifecycle handlers for a single discount code.
//!
//! Each handler works against the [`DiscountCodesApi`] contract and treats
//! the platform as the source of truth: update and delete both re-fetch the
//! resource first so the version they send is the latest observation.

use tracing::{debug, error, info};

use crate::actions::build_update_actions;
use crate::config::DesiredDiscountCode;
use crate::contract::DiscountCodesApi;
use crate::error::ApiResult;
use crate::marshal;
use crate::models::{DiscountCode, DiscountCodeUpdate};
use crate::retry::RetryPolicy;

/// Create a discount code.
///
/// Retryable failures are retried within the policy's window: a cart
/// discount referenced moments after its own creation can be missing on
/// the platform's side for a short while. The new resource is then read
/// back by its id, so the returned state is what the platform holds.
pub async fn create(
    api: &dyn DiscountCodesApi,
    policy: &RetryPolicy,
    desired: &DesiredDiscountCode,
) -> ApiResult<DiscountCode> {
    let draft = marshal::build_draft(desired)?;
    let created = policy
        .execute("create discount code", || api.create(&draft))
        .await?;
    info!(
        code = %created.code,
        id = %created.id,
        version = created.version,
        "Created discount code"
    );
    api.get_by_id(&created.id).await
}

/// Read the current state of a discount code by platform ID.
///
/// `Ok(None)` when the resource no longer exists remotely.
pub async fn read(api: &dyn DiscountCodesApi, id: &str) -> ApiResult<Option<DiscountCode>> {
    match api.get_by_id(id).await {
        Ok(code) => Ok(Some(code)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Result of reconciling one existing code.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Drift was found; actions were sent and accepted.
    Changed { updated: DiscountCode, actions: usize },
    /// No drift; nothing was sent.
    InSync(DiscountCode),
}

/// Reconcile one declared code against its remote counterpart.
///
/// Re-fetches the resource first, diffs field by field, and sends the
/// resulting action list at the fetched version. No drift means no call.
pub async fn update(
    api: &dyn DiscountCodesApi,
    desired: &DesiredDiscountCode,
    id: &str,
) -> ApiResult<UpdateOutcome> {
    let current = api.get_by_id(id).await?;
    let actions = build_update_actions(desired, &current)?;

    if actions.is_empty() {
        info!(code = %current.code, "Discount code already in sync, no update sent");
        return Ok(UpdateOutcome::InSync(current));
    }

    let action_names: Vec<_> = actions.iter().map(|a| a.name()).collect();
    debug!(code = %current.code, actions = ?action_names, "Computed update actions");
    info!(
        code = %current.code,
        version = current.version,
        actions = actions.len(),
        "Updating discount code"
    );

    let update = DiscountCodeUpdate {
        version: current.version,
        actions,
    };
    let sent = update.actions.len();
    let updated = api.update(id, &update).await?;
    Ok(UpdateOutcome::Changed {
        updated,
        actions: sent,
    })
}

/// Delete a discount code, erasing its redemption data.
///
/// Failures are logged and swallowed so a teardown never wedges on one
/// code; a resource that is already gone counts as done. Returns the
/// deleted resource when the platform confirmed the deletion.
pub async fn delete(api: &dyn DiscountCodesApi, id: &str) -> Option<DiscountCode> {
    let current = match api.get_by_id(id).await {
        Ok(code) => code,
        Err(e) if e.is_not_found() => {
            info!(id = %id, "Discount code already absent, nothing to delete");
            return None;
        }
        Err(e) => {
            error!(id = %id, error = %e, "Could not fetch discount code before delete, skipping");
            return None;
        }
    };

    match api.delete(id, current.version).await {
        Ok(deleted) => {
            info!(code = %deleted.code, id = %id, "Deleted discount code");
            Some(deleted)
        }
        Err(e) => {
            error!(code = %current.code, id = %id, error = %e, "Delete failed, continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockDiscountCodesApi;
    use crate::error::ApiError;
    use crate::models::CartDiscountReference;
    use mockall::predicate::eq;

    fn declared() -> DesiredDiscountCode {
        DesiredDiscountCode {
            code: "TENOFF".into(),
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

    fn remote(version: i64) -> DiscountCode {
        DiscountCode {
            id: "id-1".into(),
            version,
            code: "TENOFF".into(),
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

    #[tokio::test]
    async fn read_maps_not_found_to_none() {
        let mut api = MockDiscountCodesApi::new();
        api.expect_get_by_id()
            .with(eq("gone"))
            .returning(|_| Err(ApiError::NotFound));

        let result = read(&api, "gone").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn read_propagates_other_errors() {
        let mut api = MockDiscountCodesApi::new();
        api.expect_get_by_id().returning(|_| {
            Err(ApiError::Platform {
                status: 500,
                message: "boom".into(),
            })
        });

        let result = read(&api, "id-1").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_without_drift_sends_nothing() {
        let mut api = MockDiscountCodesApi::new();
        api.expect_get_by_id()
            .with(eq("id-1"))
            .returning(|_| Ok(remote(7)));
        api.expect_update().times(0);

        match update(&api, &declared(), "id-1").await.unwrap() {
            UpdateOutcome::InSync(current) => assert_eq!(current.version, 7),
            other => panic!("expected in-sync, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_sends_actions_at_fetched_version() {
        let mut api = MockDiscountCodesApi::new();
        api.expect_get_by_id().returning(|_| Ok(remote(7)));
        api.expect_update()
            .withf(|id, update| {
                id == "id-1"
                    && update.version == 7
                    && update.actions.len() == 1
                    && update.actions[0].name() == "changeIsActive"
            })
            .returning(|_, _| {
                let mut updated = remote(8);
                updated.is_active = false;
                Ok(updated)
            });

        let mut desired = declared();
        desired.is_active = false;
        match update(&api, &desired, "id-1").await.unwrap() {
            UpdateOutcome::Changed { updated, actions } => {
                assert_eq!(updated.version, 8);
                assert!(!updated.is_active);
                assert_eq!(actions, 1);
            }
            other => panic!("expected changed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_swallows_api_failure() {
        let mut api = MockDiscountCodesApi::new();
        api.expect_get_by_id().returning(|_| Ok(remote(3)));
        api.expect_delete()
            .with(eq("id-1"), eq(3))
            .returning(|_, _| {
                Err(ApiError::Platform {
                    status: 500,
                    message: "boom".into(),
                })
            });

        let result = delete(&api, "id-1").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_treats_missing_resource_as_done() {
        let mut api = MockDiscountCodesApi::new();
        api.expect_get_by_id().returning(|_| Err(ApiError::NotFound));
        api.expect_delete().times(0);

        let result = delete(&api, "ghost").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn create_reads_the_resource_back_by_id() {
        let mut api = MockDiscountCodesApi::new();
        api.expect_create()
            .withf(|draft| draft.code == "TENOFF" && draft.is_active == Some(true))
            .returning(|_| Ok(remote(1)));
        api.expect_get_by_id()
            .with(eq("id-1"))
            .returning(|_| Ok(remote(1)));

        let policy = RetryPolicy::new(std::time::Duration::from_secs(1), std::time::Duration::ZERO);
        let created = create(&api, &policy, &declared()).await.unwrap();
        assert_eq!(created.version, 1);
        assert_eq!(created.code, "TENOFF");
    }
}
