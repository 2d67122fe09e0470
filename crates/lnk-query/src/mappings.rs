//! Curated display-name ↔ platform-code tables for search filters.
//!
//! Codes are the platform's opaque identifiers; the tables exist so
//! callers can offer readable choices and echo saved campaigns back in
//! human terms. An unknown code is not an error here — campaigns may
//! carry codes discovered elsewhere.

use lnk_core::NetworkDegree;

/// (display name, geo urn). Ordered for presentation.
pub const LOCATIONS: &[(&str, &str)] = &[
    ("San Francisco Bay Area", "90000084"),
    ("New York City Metropolitan Area", "102571732"),
    ("Greater Los Angeles Area", "102448103"),
    ("Greater Chicago Area", "103112676"),
    ("Austin, Texas Area", "102748797"),
    ("Greater Seattle Area", "103658393"),
    ("Greater Boston Area", "105646813"),
    ("United States", "103644278"),
];

/// (display name, industry id). Ordered by relevance for presentation.
pub const INDUSTRIES: &[(&str, &str)] = &[
    ("Computer Software", "4"),
    ("Information Technology & Services", "96"),
    ("Internet", "6"),
    ("Financial Services", "43"),
    ("Management Consulting", "11"),
    ("Marketing & Advertising", "80"),
    ("Banking", "41"),
    ("Investment Banking", "45"),
    ("Venture Capital & Private Equity", "106"),
    ("E-Learning", "100"),
    ("Higher Education", "69"),
    ("Hospital & Health Care", "14"),
    ("Biotechnology", "12"),
    ("Pharmaceuticals", "15"),
    ("Medical Devices", "54"),
    ("Real Estate", "44"),
    ("Legal Services", "10"),
    ("Accounting", "47"),
    ("Human Resources", "137"),
    ("Staffing & Recruiting", "104"),
    ("Design", "27"),
    ("Entertainment", "28"),
    ("Telecommunications", "8"),
    ("Automotive", "53"),
    ("Aviation & Aerospace", "94"),
    ("Consumer Goods", "25"),
];

pub fn location_urn(display_name: &str) -> Option<&'static str> {
    LOCATIONS
        .iter()
        .find(|(name, _)| *name == display_name)
        .map(|(_, urn)| *urn)
}

pub fn location_name(urn: &str) -> Option<&'static str> {
    LOCATIONS
        .iter()
        .find(|(_, code)| *code == urn)
        .map(|(name, _)| *name)
}

pub fn industry_id(display_name: &str) -> Option<&'static str> {
    INDUSTRIES
        .iter()
        .find(|(name, _)| *name == display_name)
        .map(|(_, id)| *id)
}

pub fn industry_name(id: &str) -> Option<&'static str> {
    INDUSTRIES
        .iter()
        .find(|(_, code)| *code == id)
        .map(|(name, _)| *name)
}

/// Human label for a set of connection degrees.
pub fn network_label(degrees: &[NetworkDegree]) -> &'static str {
    let first = degrees.contains(&NetworkDegree::First);
    let second = degrees.contains(&NetworkDegree::Second);
    let third = degrees.contains(&NetworkDegree::Third);
    match (first, second, third) {
        (true, false, false) => "1st degree connections only",
        (_, true, false) => "1st + 2nd degree connections",
        (_, _, true) => "1st, 2nd + 3rd degree connections",
        _ => "1st + 2nd degree connections",
    }
}
