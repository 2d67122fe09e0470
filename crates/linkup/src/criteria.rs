//! Turn CLI flags into targeting criteria, resolving display names to
//! platform codes.

use anyhow::{Result, bail};
use lnk_core::{NetworkDegree, TargetingCriteria};
use lnk_query::mappings;

fn is_code(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn resolve_location(value: &str) -> Result<String> {
    if is_code(value) {
        return Ok(value.to_string());
    }
    match mappings::location_urn(value) {
        Some(urn) => Ok(urn.to_string()),
        None => bail!(
            "unknown location {value:?}; pass a numeric geo urn or a name from `linkup codes locations`"
        ),
    }
}

fn resolve_industry(value: &str) -> Result<String> {
    if is_code(value) {
        return Ok(value.to_string());
    }
    match mappings::industry_id(value) {
        Some(id) => Ok(id.to_string()),
        None => bail!(
            "unknown industry {value:?}; pass a numeric id or a name from `linkup codes industries`"
        ),
    }
}

fn parse_degree(value: &str) -> Result<NetworkDegree> {
    match value.to_ascii_lowercase().as_str() {
        "first" | "1st" => Ok(NetworkDegree::First),
        "second" | "2nd" => Ok(NetworkDegree::Second),
        "third" | "3rd" => Ok(NetworkDegree::Third),
        other => bail!("unknown network degree {other:?}; expected first, second, or third"),
    }
}

pub fn build_criteria(
    keywords: &str,
    location: Option<&str>,
    industries: &[String],
    companies: &[String],
    schools: &[String],
    network: &[String],
) -> Result<TargetingCriteria> {
    Ok(TargetingCriteria {
        keywords: Some(keywords.to_string()),
        geo_urn: location.map(resolve_location).transpose()?,
        industry_ids: industries
            .iter()
            .map(|v| resolve_industry(v))
            .collect::<Result<_>>()?,
        company_ids: companies.to_vec(),
        school_ids: schools.to_vec(),
        network: network
            .iter()
            .map(|v| parse_degree(v))
            .collect::<Result<_>>()?,
    })
}
