//! Builds the update-action list from declared and observed state.
//!
//! Each field is compared independently; a difference appends exactly one
//! action for that field. The order of comparisons is fixed so the same
//! drift always produces the same action list, which keeps plans stable
//! and logs comparable across runs.

use crate::config::DesiredDiscountCode;
use crate::error::ApiError;
use crate::marshal;
use crate::models::{DiscountCode, UpdateAction};

/// Compare a declared code against the platform's current state and return
/// the actions needed to reconcile them. An empty list means no drift.
///
/// Timestamps in the declared state are parsed here, so an unparseable
/// value fails the diff before any call is made.
pub fn build_update_actions(
    desired: &DesiredDiscountCode,
    observed: &DiscountCode,
) -> Result<Vec<UpdateAction>, ApiError> {
    let mut actions = Vec::new();

    if desired.name != observed.name {
        actions.push(UpdateAction::SetName {
            name: desired.name.clone(),
        });
    }

    if desired.description != observed.description {
        actions.push(UpdateAction::SetDescription {
            description: desired.description.clone(),
        });
    }

    if desired.predicate != observed.cart_predicate {
        actions.push(UpdateAction::SetCartPredicate {
            cart_predicate: desired.predicate.clone(),
        });
    }

    if desired.max_applications != observed.max_applications {
        actions.push(UpdateAction::SetMaxApplications {
            max_applications: desired.max_applications,
        });
    }

    if desired.max_applications_per_customer != observed.max_applications_per_customer {
        actions.push(UpdateAction::SetMaxApplicationsPerCustomer {
            max_applications_per_customer: desired.max_applications_per_customer,
        });
    }

    let observed_discounts = marshal::reference_ids(&observed.cart_discounts);
    if desired.cart_discounts != observed_discounts {
        actions.push(UpdateAction::ChangeCartDiscounts {
            cart_discounts: marshal::cart_discount_identifiers(&desired.cart_discounts),
        });
    }

    // The full replacement list is sent even when empty; the platform
    // interprets [] as "remove all groups".
    if desired.groups != observed.groups {
        actions.push(UpdateAction::ChangeGroups {
            groups: desired.groups.clone(),
        });
    }

    if desired.is_active != observed.is_active {
        actions.push(UpdateAction::ChangeIsActive {
            is_active: desired.is_active,
        });
    }

    let desired_valid_from =
        marshal::parse_optional_timestamp("valid_from", desired.valid_from.as_deref())?;
    if desired_valid_from != observed.valid_from {
        actions.push(UpdateAction::SetValidFrom {
            valid_from: desired_valid_from,
        });
    }

    let desired_valid_until =
        marshal::parse_optional_timestamp("valid_until", desired.valid_until.as_deref())?;
    if desired_valid_until != observed.valid_until {
        actions.push(UpdateAction::SetValidUntil {
            valid_until: desired_valid_until,
        });
    }

    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartDiscountReference, LocalizedString};
    use chrono::{TimeZone, Utc};

    fn localized(text: &str) -> LocalizedString {
        let mut map = LocalizedString::new();
        map.insert("en".to_string(), text.to_string());
        map
    }

    fn desired() -> DesiredDiscountCode {
        DesiredDiscountCode {
            code: "SUMMER-2026".into(),
            name: Some(localized("Summer sale")),
            description: None,
            cart_discounts: vec!["cd-1".into()],
            predicate: Some("totalPrice > \"10.00 EUR\"".into()),
            is_active: true,
            valid_from: Some("2026-06-01T00:00:00Z".into()),
            valid_until: None,
            max_applications: Some(100),
            max_applications_per_customer: Some(1),
            groups: vec!["summer".into()],
        }
    }

    fn observed() -> DiscountCode {
        DiscountCode {
            id: "id-1".into(),
            version: 4,
            code: "SUMMER-2026".into(),
            name: Some(localized("Summer sale")),
            description: None,
            cart_discounts: vec![CartDiscountReference {
                type_id: "cart-discount".into(),
                id: "cd-1".into(),
            }],
            cart_predicate: Some("totalPrice > \"10.00 EUR\"".into()),
            is_active: true,
            valid_from: Some(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()),
            valid_until: None,
            max_applications: Some(100),
            max_applications_per_customer: Some(1),
            groups: vec!["summer".into()],
            created_at: None,
            last_modified_at: None,
        }
    }

    #[test]
    fn identical_states_produce_no_actions() {
        let actions = build_update_actions(&desired(), &observed()).unwrap();
        assert!(actions.is_empty(), "unexpected actions: {actions:?}");
    }

    #[test]
    fn changed_name_emits_set_name() {
        let mut want = desired();
        want.name = Some(localized("Late summer sale"));
        let actions = build_update_actions(&want, &observed()).unwrap();
        assert_eq!(
            actions,
            vec![UpdateAction::SetName {
                name: Some(localized("Late summer sale")),
            }]
        );
    }

    #[test]
    fn cleared_name_emits_unset() {
        let mut want = desired();
        want.name = None;
        let actions = build_update_actions(&want, &observed()).unwrap();
        assert_eq!(actions, vec![UpdateAction::SetName { name: None }]);
    }

    #[test]
    fn cleared_groups_send_empty_replacement_list() {
        let mut want = desired();
        want.groups = Vec::new();
        let actions = build_update_actions(&want, &observed()).unwrap();
        assert_eq!(actions, vec![UpdateAction::ChangeGroups { groups: vec![] }]);
        assert_eq!(
            serde_json::to_value(&actions[0]).unwrap(),
            serde_json::json!({ "action": "changeGroups", "groups": [] })
        );
    }

    #[test]
    fn cleared_valid_from_emits_payloadless_action() {
        let mut want = desired();
        want.valid_from = None;
        let actions = build_update_actions(&want, &observed()).unwrap();
        assert_eq!(actions, vec![UpdateAction::SetValidFrom { valid_from: None }]);
        assert_eq!(
            serde_json::to_value(&actions[0]).unwrap(),
            serde_json::json!({ "action": "setValidFrom" })
        );
    }

    #[test]
    fn equal_instants_in_different_zones_do_not_drift() {
        let mut want = desired();
        want.valid_from = Some("2026-06-01T02:00:00+02:00".into());
        let actions = build_update_actions(&want, &observed()).unwrap();
        assert!(actions.is_empty(), "unexpected actions: {actions:?}");
    }

    #[test]
    fn empty_timestamp_string_counts_as_unset() {
        let mut want = desired();
        want.valid_from = Some(String::new());
        let actions = build_update_actions(&want, &observed()).unwrap();
        assert_eq!(actions, vec![UpdateAction::SetValidFrom { valid_from: None }]);
    }

    #[test]
    fn unparseable_timestamp_fails_the_diff() {
        let mut want = desired();
        want.valid_until = Some("soon".into());
        let err = build_update_actions(&want, &observed()).unwrap_err();
        assert!(err.to_string().contains("valid_until"));
    }

    #[test]
    fn every_drifted_field_appends_one_action_in_fixed_order() {
        let mut want = desired();
        want.name = None;
        want.description = Some(localized("now with description"));
        want.predicate = None;
        want.max_applications = Some(500);
        want.max_applications_per_customer = None;
        want.cart_discounts = vec!["cd-2".into()];
        want.groups = vec!["winter".into()];
        want.is_active = false;
        want.valid_from = Some("2026-07-01T00:00:00Z".into());
        want.valid_until = Some("2026-08-01T00:00:00Z".into());

        let actions = build_update_actions(&want, &observed()).unwrap();
        let names: Vec<_> = actions.iter().map(UpdateAction::name).collect();
        assert_eq!(
            names,
            vec![
                "setName",
                "setDescription",
                "setCartPredicate",
                "setMaxApplications",
                "setMaxApplicationsPerCustomer",
                "changeCartDiscounts",
                "changeGroups",
                "changeIsActive",
                "setValidFrom",
                "setValidUntil",
            ]
        );
    }

    #[test]
    fn reordered_cart_discounts_count_as_drift() {
        let mut want = desired();
        want.cart_discounts = vec!["cd-1".into(), "cd-2".into()];
        let mut remote = observed();
        remote.cart_discounts = vec![
            CartDiscountReference {
                type_id: "cart-discount".into(),
                id: "cd-2".into(),
            },
            CartDiscountReference {
                type_id: "cart-discount".into(),
                id: "cd-1".into(),
            },
        ];
        let actions = build_update_actions(&want, &remote).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name(), "changeCartDiscounts");
    }
}
