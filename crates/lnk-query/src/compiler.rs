//! Deterministic criteria-to-query compilation.

use serde::Serialize;

use lnk_core::{AppError, TargetingCriteria};

/// A compiled search query: ordered parameters plus a rendered string.
///
/// Compilation is deterministic and idempotent: identical criteria
/// always produce a byte-identical rendering. Parameter order is fixed
/// (keywords, geoUrn, industry, currentCompany, schoolFilter, network,
/// origin); multi-value dimensions keep their input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalQuery {
    params: Vec<(String, String)>,
}

impl CanonicalQuery {
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Render as a query string. Values are already encoded.
    pub fn render(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl std::fmt::Display for CanonicalQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Compile targeting criteria into a canonical query.
///
/// Malformed codes fail with a validation error naming the offending
/// field; nothing is silently dropped. An empty network filter compiles
/// to the platform default (first + second degree).
pub fn compile(criteria: &TargetingCriteria) -> Result<CanonicalQuery, AppError> {
    let mut params: Vec<(String, String)> = Vec::new();

    if let Some(keywords) = &criteria.keywords {
        let trimmed = keywords.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("keywords", "must not be blank"));
        }
        let encoded: String = url::form_urlencoded::byte_serialize(trimmed.as_bytes()).collect();
        params.push(("keywords".to_string(), encoded));
    }

    if let Some(geo_urn) = &criteria.geo_urn {
        validate_code("geo_urn", geo_urn)?;
        params.push(("geoUrn".to_string(), bracket_list(&[geo_urn.clone()])));
    }

    if !criteria.industry_ids.is_empty() {
        validate_codes("industry_ids", &criteria.industry_ids)?;
        params.push(("industry".to_string(), bracket_list(&criteria.industry_ids)));
    }

    if !criteria.company_ids.is_empty() {
        validate_codes("company_ids", &criteria.company_ids)?;
        params.push((
            "currentCompany".to_string(),
            bracket_list(&criteria.company_ids),
        ));
    }

    if !criteria.school_ids.is_empty() {
        validate_codes("school_ids", &criteria.school_ids)?;
        params.push(("schoolFilter".to_string(), bracket_list(&criteria.school_ids)));
    }

    if params.is_empty() && criteria.network.is_empty() {
        return Err(AppError::validation(
            "criteria",
            "at least one targeting criterion is required",
        ));
    }

    let degrees: Vec<String> = if criteria.network.is_empty() {
        // Platform default: first + second degree.
        vec!["F".to_string(), "S".to_string()]
    } else {
        let mut seen = Vec::new();
        for degree in &criteria.network {
            if seen.contains(degree) {
                return Err(AppError::validation(
                    "network",
                    format!("duplicate connection degree '{}'", degree.as_code()),
                ));
            }
            seen.push(*degree);
        }
        criteria
            .network
            .iter()
            .map(|d| d.as_code().to_string())
            .collect()
    };
    params.push(("network".to_string(), bracket_list(&degrees)));

    params.push(("origin".to_string(), "FACETED_SEARCH".to_string()));

    Ok(CanonicalQuery { params })
}

/// Render ids in the platform's bracketed-list form: `["4","6"]`.
fn bracket_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
    format!("[{}]", quoted.join(","))
}

fn validate_code(field: &str, code: &str) -> Result<(), AppError> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::validation(
            field,
            format!("expected ASCII digits, got '{code}'"),
        ));
    }
    Ok(())
}

fn validate_codes(field: &str, codes: &[String]) -> Result<(), AppError> {
    for code in codes {
        validate_code(field, code)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
