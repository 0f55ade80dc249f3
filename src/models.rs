//! Wire model of the platform's discount code API.
//!
//! All payloads are camelCase JSON. Update actions use the platform's
//! internally tagged `{"action": "...", ...}` encoding; optional payload
//! fields are omitted entirely when `None`, which the platform reads as
//! "unset this field".

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locale tag (`en`, `de-DE`, ...) to translated text.
pub type LocalizedString = BTreeMap<String, String>;

/// Outbound reference to a cart discount, used in drafts and update actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDiscountResourceIdentifier {
    pub type_id: String,
    pub id: String,
}

impl CartDiscountResourceIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            type_id: "cart-discount".to_string(),
            id: id.into(),
        }
    }
}

/// Inbound reference to a cart discount, as returned on fetched codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDiscountReference {
    pub type_id: String,
    pub id: String,
}

/// A discount code as the platform returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    /// Server-assigned identifier.
    pub id: String,
    /// Optimistic-concurrency version; every update and delete must carry it.
    pub version: i64,
    /// The string customers add to their cart. Unique per project, immutable.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    /// Cart discounts activated when this code is applied.
    #[serde(default)]
    pub cart_discounts: Vec<CartDiscountReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_predicate: Option<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_applications: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_applications_per_customer: Option<i64>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
}

/// Payload for creating a discount code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCodeDraft {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    pub cart_discounts: Vec<CartDiscountResourceIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_predicate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_applications: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_applications_per_customer: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

/// Payload for the update endpoint: current version plus an ordered list of
/// actions. The platform applies the actions atomically or rejects the whole
/// request with a 409 if the version is stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountCodeUpdate {
    pub version: i64,
    pub actions: Vec<UpdateAction>,
}

/// The platform's update-action vocabulary for discount codes.
///
/// `set*` actions carry an optional payload; omitting it unsets the field.
/// `change*` actions always carry the full replacement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UpdateAction {
    SetName {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<LocalizedString>,
    },
    SetDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<LocalizedString>,
    },
    SetCartPredicate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cart_predicate: Option<String>,
    },
    SetMaxApplications {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_applications: Option<i64>,
    },
    SetMaxApplicationsPerCustomer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_applications_per_customer: Option<i64>,
    },
    ChangeCartDiscounts {
        cart_discounts: Vec<CartDiscountResourceIdentifier>,
    },
    ChangeGroups {
        groups: Vec<String>,
    },
    ChangeIsActive {
        is_active: bool,
    },
    SetValidFrom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        valid_from: Option<DateTime<Utc>>,
    },
    SetValidUntil {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        valid_until: Option<DateTime<Utc>>,
    },
}

impl UpdateAction {
    /// The wire name of the action, for plan output and logs.
    pub fn name(&self) -> &'static str {
        match self {
            UpdateAction::SetName { .. } => "setName",
            UpdateAction::SetDescription { .. } => "setDescription",
            UpdateAction::SetCartPredicate { .. } => "setCartPredicate",
            UpdateAction::SetMaxApplications { .. } => "setMaxApplications",
            UpdateAction::SetMaxApplicationsPerCustomer { .. } => {
                "setMaxApplicationsPerCustomer"
            }
            UpdateAction::ChangeCartDiscounts { .. } => "changeCartDiscounts",
            UpdateAction::ChangeGroups { .. } => "changeGroups",
            UpdateAction::ChangeIsActive { .. } => "changeIsActive",
            UpdateAction::SetValidFrom { .. } => "setValidFrom",
            UpdateAction::SetValidUntil { .. } => "setValidUntil",
        }
    }
}

/// One page of a discount code query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCodePage {
    pub limit: i64,
    pub offset: i64,
    pub count: i64,
    #[serde(default)]
    pub total: Option<i64>,
    pub results: Vec<DiscountCode>,
}

/// Error body the platform returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

/// A single platform error entry (e.g. `DuplicateField`, `InvalidOperation`).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
