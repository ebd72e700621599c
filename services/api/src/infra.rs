use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use preschool_desk::school::{FeeSchedule, MemoryObjectStore, Money};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) objects: MemoryObjectStore,
    pub(crate) fees: FeeSchedule,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Parse a rupee amount such as `15000` or `15000.50` into paise.
pub(crate) fn parse_money(raw: &str) -> Result<Money, String> {
    let trimmed = raw.trim().trim_start_matches('₹').replace(',', "");
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed.as_str(), ""),
    };

    let invalid = || format!("failed to parse '{raw}' as an amount in rupees");
    let is_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    if whole.is_empty() || fraction.len() > 2 || !is_digits(whole) || !is_digits(fraction) {
        return Err(invalid());
    }
    let rupees: i64 = whole.parse().map_err(|_| invalid())?;
    let paise: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    let amount = rupees
        .checked_mul(100)
        .and_then(|minor| minor.checked_add(paise))
        .map(Money)
        .ok_or_else(invalid)?;
    if amount.exceeds_limit() {
        return Err(format!("'{raw}' exceeds the limit of {}", Money::MAX_AMOUNT));
    }
    Ok(amount)
}

/// Content type for a stored object, guessed from its file extension.
pub(crate) fn content_type_for(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
