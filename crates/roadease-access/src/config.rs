//! Access-control policy configuration.

/// Policy knobs for the access service.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Reject overrides without a written justification.
    pub require_override_reason: bool,
    /// Minimum reason length after trimming (default: 5).
    pub min_override_reason_length: usize,
    /// Longest lifetime an expiring override may be given, in days.
    /// `None` removes the cap. Permanent overrides are unaffected.
    pub max_override_lifetime_days: Option<i64>,
    /// Upper bound applied to every list page size (default: 200).
    pub max_page_limit: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            require_override_reason: true,
            min_override_reason_length: 5,
            max_override_lifetime_days: Some(365),
            max_page_limit: 200,
        }
    }
}
