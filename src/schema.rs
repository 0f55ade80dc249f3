//! Static description of the discount code fields this tool manages.
//!
//! The `schema` command prints this so operators can see which YAML keys
//! exist, which are required, and which are read back from the platform
//! rather than declared. [`validate_definition`] checks a declared code
//! against the same field rules before any remote call is made.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::DesiredDiscountCode;
use crate::marshal;
use crate::models::LocalizedString;

/// Value shape of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Bool,
    Int,
    /// Locale-to-text map, e.g. `{en: "Summer sale"}`.
    LocalizedText,
    StringList,
    /// RFC 3339 timestamp string.
    Timestamp,
}

/// One field of the discount code surface.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Must be present in every declared code.
    pub required: bool,
    /// Assigned by the platform; never declared.
    pub computed: bool,
    /// Changing this field replaces the resource instead of updating it.
    pub immutable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    pub description: &'static str,
}

impl FieldSchema {
    fn declared(name: &'static str, field_type: FieldType, description: &'static str) -> Self {
        FieldSchema {
            name,
            field_type,
            required: false,
            computed: false,
            immutable: false,
            default: None,
            description,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
}

/// The full discount code field schema, in declaration order.
pub fn discount_code_schema() -> Vec<FieldSchema> {
    vec![
        FieldSchema::declared(
            "code",
            FieldType::String,
            "The string customers enter to redeem the discount. Unique per project.",
        )
        .required()
        .immutable(),
        FieldSchema::declared("name", FieldType::LocalizedText, "Display name per locale."),
        FieldSchema::declared(
            "description",
            FieldType::LocalizedText,
            "Longer description per locale.",
        ),
        FieldSchema::declared(
            "cart_discounts",
            FieldType::StringList,
            "IDs of the cart discounts this code activates.",
        )
        .required(),
        FieldSchema::declared(
            "predicate",
            FieldType::String,
            "Cart predicate that must hold for the code to apply.",
        ),
        FieldSchema::declared(
            "is_active",
            FieldType::Bool,
            "Whether the code can currently be redeemed.",
        )
        .with_default("true"),
        FieldSchema::declared(
            "valid_from",
            FieldType::Timestamp,
            "Earliest redemption time. Empty means no lower bound.",
        ),
        FieldSchema::declared(
            "valid_until",
            FieldType::Timestamp,
            "Latest redemption time. Empty means no upper bound.",
        ),
        FieldSchema::declared(
            "max_applications",
            FieldType::Int,
            "Total redemption cap across all customers.",
        ),
        FieldSchema::declared(
            "max_applications_per_customer",
            FieldType::Int,
            "Redemption cap per customer.",
        ),
        FieldSchema::declared(
            "groups",
            FieldType::StringList,
            "Arbitrary group labels used to organise codes.",
        ),
        FieldSchema::declared("id", FieldType::String, "Platform-assigned identifier.").computed(),
        FieldSchema::declared(
            "version",
            FieldType::Int,
            "Optimistic-concurrency version maintained by the platform.",
        )
        .computed(),
    ]
}

/// One field-scoped problem found in a declared definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check one declared definition against the field rules. Returns every
/// problem found, not just the first.
pub fn validate_definition(desired: &DesiredDiscountCode) -> Vec<Problem> {
    let mut problems = Vec::new();

    if desired.code.is_empty() {
        problems.push(Problem {
            field: "code",
            message: "must not be empty".to_string(),
        });
    }
    if desired.cart_discounts.is_empty() {
        problems.push(Problem {
            field: "cart_discounts",
            message: "must reference at least one cart discount".to_string(),
        });
    } else if desired.cart_discounts.iter().any(String::is_empty) {
        problems.push(Problem {
            field: "cart_discounts",
            message: "contains an empty cart discount id".to_string(),
        });
    }

    check_locales("name", desired.name.as_ref(), &mut problems);
    check_locales("description", desired.description.as_ref(), &mut problems);

    for (field, limit) in [
        ("max_applications", desired.max_applications),
        (
            "max_applications_per_customer",
            desired.max_applications_per_customer,
        ),
    ] {
        if let Some(limit) = limit {
            if limit < 1 {
                problems.push(Problem {
                    field,
                    message: format!("must be at least 1, got {limit}"),
                });
            }
        }
    }

    let valid_from = check_timestamp("valid_from", desired.valid_from.as_deref(), &mut problems);
    let valid_until = check_timestamp("valid_until", desired.valid_until.as_deref(), &mut problems);
    if let (Some(from), Some(until)) = (valid_from, valid_until) {
        if from >= until {
            problems.push(Problem {
                field: "valid_from",
                message: "must lie before valid_until".to_string(),
            });
        }
    }

    problems
}

fn check_locales(
    field: &'static str,
    map: Option<&LocalizedString>,
    problems: &mut Vec<Problem>,
) {
    let Some(map) = map else { return };
    for key in map.keys() {
        if !marshal::valid_locale_tag(key) {
            problems.push(Problem {
                field,
                message: format!("locale key {key:?} is not a valid IETF tag"),
            });
        }
    }
}

fn check_timestamp(
    field: &'static str,
    value: Option<&str>,
    problems: &mut Vec<Problem>,
) -> Option<DateTime<Utc>> {
    match marshal::parse_optional_timestamp(field, value) {
        Ok(parsed) => parsed,
        Err(_) => {
            problems.push(Problem {
                field,
                message: format!(
                    "{:?} is not a valid RFC 3339 timestamp",
                    value.unwrap_or_default()
                ),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashSet};

    #[test]
    fn field_names_are_unique() {
        let schema = discount_code_schema();
        let names: HashSet<_> = schema.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), schema.len());
    }

    #[test]
    fn code_is_the_only_required_immutable_field() {
        let schema = discount_code_schema();
        let immutable: Vec<_> = schema
            .iter()
            .filter(|f| f.immutable)
            .map(|f| f.name)
            .collect();
        assert_eq!(immutable, vec!["code"]);

        let required: Vec<_> = schema
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(required, vec!["code", "cart_discounts"]);
    }

    #[test]
    fn computed_fields_are_never_required() {
        for field in discount_code_schema() {
            if field.computed {
                assert!(!field.required, "{} is computed and required", field.name);
            }
        }
    }

    fn well_formed() -> DesiredDiscountCode {
        DesiredDiscountCode {
            code: "SUMMER25".into(),
            name: Some(BTreeMap::from([("en".to_string(), "Summer sale".to_string())])),
            description: None,
            cart_discounts: vec!["cd-1".into()],
            predicate: None,
            is_active: true,
            valid_from: Some("2026-06-01T00:00:00Z".into()),
            valid_until: Some("2026-09-01T00:00:00Z".into()),
            max_applications: Some(1000),
            max_applications_per_customer: Some(1),
            groups: vec![],
        }
    }

    #[test]
    fn well_formed_definition_has_no_problems() {
        assert!(validate_definition(&well_formed()).is_empty());
    }

    #[test]
    fn empty_code_and_missing_cart_discounts_are_flagged() {
        let mut desired = well_formed();
        desired.code = String::new();
        desired.cart_discounts.clear();

        let fields: Vec<_> = validate_definition(&desired)
            .iter()
            .map(|p| p.field)
            .collect();
        assert_eq!(fields, vec!["code", "cart_discounts"]);
    }

    #[test]
    fn limits_below_one_are_flagged() {
        let mut desired = well_formed();
        desired.max_applications = Some(0);
        desired.max_applications_per_customer = Some(-5);

        let fields: Vec<_> = validate_definition(&desired)
            .iter()
            .map(|p| p.field)
            .collect();
        assert_eq!(
            fields,
            vec!["max_applications", "max_applications_per_customer"]
        );
    }

    #[test]
    fn inverted_validity_window_is_flagged() {
        let mut desired = well_formed();
        desired.valid_from = Some("2026-09-01T00:00:00Z".into());
        desired.valid_until = Some("2026-06-01T00:00:00Z".into());

        let problems = validate_definition(&desired);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].field, "valid_from");
        assert!(problems[0].message.contains("before valid_until"));
    }

    #[test]
    fn unparseable_timestamp_is_flagged() {
        let mut desired = well_formed();
        desired.valid_until = Some("someday".into());

        let problems = validate_definition(&desired);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].field, "valid_until");
        assert!(problems[0].message.contains("someday"));
    }

    #[test]
    fn bad_locale_keys_are_flagged_per_field() {
        let mut desired = well_formed();
        desired.description = Some(BTreeMap::from([
            ("EN".to_string(), "shouting".to_string()),
            ("de-DE".to_string(), "passt".to_string()),
        ]));

        let problems = validate_definition(&desired);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].field, "description");
        assert!(problems[0].message.contains("EN"));
    }
}
