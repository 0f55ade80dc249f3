//! Conversions between declared configuration values and wire types.
//!
//! These helpers are pure: no I/O, no clock access. Timestamps in the
//! configuration are RFC 3339 strings; an empty string means "not set" and
//! maps to `None` rather than an error.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::DesiredDiscountCode;
use crate::error::ApiError;
use crate::models::{CartDiscountReference, CartDiscountResourceIdentifier, DiscountCodeDraft};

/// Parse an RFC 3339 timestamp from a configuration value.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ApiError::invalid_config(format!(
                "field '{field}' is not a valid RFC 3339 timestamp ({value:?}): {e}"
            ))
        })
}

/// Parse an optional timestamp. Absent values and empty strings both mean
/// "not set".
pub fn parse_optional_timestamp(
    field: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    match value {
        None => Ok(None),
        Some("") => Ok(None),
        Some(v) => parse_timestamp(field, v).map(Some),
    }
}

/// Render a timestamp the way the platform does: UTC, millisecond precision,
/// trailing `Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Turn a list of cart discount IDs into outbound resource identifiers.
pub fn cart_discount_identifiers(ids: &[String]) -> Vec<CartDiscountResourceIdentifier> {
    ids.iter()
        .map(|id| CartDiscountResourceIdentifier::new(id.clone()))
        .collect()
}

/// Extract the IDs from inbound cart discount references, preserving order.
pub fn reference_ids(refs: &[CartDiscountReference]) -> Vec<String> {
    refs.iter().map(|r| r.id.clone()).collect()
}

/// Expand a declared definition into the platform's creation payload.
pub fn build_draft(desired: &DesiredDiscountCode) -> Result<DiscountCodeDraft, ApiError> {
    Ok(DiscountCodeDraft {
        code: desired.code.clone(),
        name: desired.name.clone(),
        description: desired.description.clone(),
        cart_discounts: cart_discount_identifiers(&desired.cart_discounts),
        cart_predicate: desired.predicate.clone(),
        is_active: Some(desired.is_active),
        valid_from: parse_optional_timestamp("valid_from", desired.valid_from.as_deref())?,
        valid_until: parse_optional_timestamp("valid_until", desired.valid_until.as_deref())?,
        max_applications: desired.max_applications,
        max_applications_per_customer: desired.max_applications_per_customer,
        groups: desired.groups.clone(),
    })
}

/// Whether a locale key has the IETF tag shape the platform accepts
/// (`en`, `en-US`, `de-DE`).
pub fn valid_locale_tag(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let primary = parts.next().unwrap_or_default();
    primary.len() >= 2
        && primary.len() <= 8
        && primary.bytes().all(|b| b.is_ascii_lowercase())
        && parts.all(|p| {
            !p.is_empty() && p.len() <= 8 && p.bytes().all(|b| b.is_ascii_alphanumeric())
        })
}
