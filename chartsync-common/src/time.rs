//! Chart-date helpers
//!
//! Chart days roll over in the chart source's home timezone (KST,
//! UTC+9), not where this service happens to run. Every date that keys
//! a snapshot row comes from these helpers.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::{Error, Result};

/// Seconds east of UTC for Korea Standard Time
const KST_UTC_OFFSET_SECS: i32 = 9 * 3600;

fn kst_offset() -> FixedOffset {
    // 9 * 3600 is always within the valid offset range
    FixedOffset::east_opt(KST_UTC_OFFSET_SECS).expect("valid KST offset")
}

/// Current timestamp in KST
pub fn kst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst_offset())
}

/// Today's chart date in KST
pub fn kst_today() -> NaiveDate {
    kst_now().date_naive()
}

/// Parse a chart date in `YYYY-MM-DD` form
pub fn parse_chart_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("invalid date '{}': {}", s, e)))
}
