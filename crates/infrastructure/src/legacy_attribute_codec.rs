//! Pipe-delimited encoding of legacy bundle grants.
//!
//! Each grant is written as `{bundleId}|EXPIRY={date}` with an empty date for
//! grants that never expire; grants are joined with `|` into one attribute.

use chrono::NaiveDate;
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{BundleGrant, BundleId};

const EXPIRY_PREFIX: &str = "EXPIRY=";
const SEPARATOR: char = '|';

/// Encodes grants into a single attribute value.
pub(crate) fn encode_grants(grants: &[BundleGrant]) -> String {
    grants
        .iter()
        .map(|grant| {
            let expiry = grant
                .expiry()
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            format!("{}{SEPARATOR}{EXPIRY_PREFIX}{expiry}", grant.bundle_id())
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Decodes an attribute value, dropping empty segments.
///
/// A bundle id without a following expiry segment decodes as never expiring.
pub(crate) fn decode_grants(attribute: &str) -> AppResult<Vec<BundleGrant>> {
    let mut grants: Vec<BundleGrant> = Vec::new();
    let mut pending: Option<BundleId> = None;

    for segment in attribute.split(SEPARATOR).filter(|segment| !segment.is_empty()) {
        match segment.strip_prefix(EXPIRY_PREFIX) {
            Some(expiry) => {
                let Some(bundle_id) = pending.take() else {
                    continue;
                };
                grants.push(BundleGrant::new(bundle_id, parse_expiry(expiry)?));
            }
            None => {
                if let Some(bundle_id) = pending.replace(BundleId::new(segment)?) {
                    grants.push(BundleGrant::new(bundle_id, None));
                }
            }
        }
    }

    if let Some(bundle_id) = pending {
        grants.push(BundleGrant::new(bundle_id, None));
    }

    Ok(grants)
}

fn parse_expiry(value: &str) -> AppResult<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|error| {
            AppError::Internal(format!("stored bundle expiry '{value}' is invalid: {error}"))
        })
}
