//! Guarded arithmetic for derived metrics.
//!
//! Every helper returns `None` instead of a fabricated zero or a non-finite
//! value when an operand is missing or a denominator/base is invalid.

use fundamentals_core::MergedPeriodRecord;

fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// `numerator / denominator`, undefined on a missing or non-finite operand or a zero denominator
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (finite(numerator?)?, finite(denominator?)?);
    if d == 0.0 {
        return None;
    }
    finite(n / d)
}

/// Fractional change `(current - previous) / previous`
pub fn pct_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (cur, prev) = (finite(current?)?, finite(previous?)?);
    if prev == 0.0 {
        return None;
    }
    finite((cur - prev) / prev)
}

/// `a - b` when both are defined
pub fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(a? - b?)
}

/// Compound annual growth rate over `years`.
///
/// Requires a strictly positive base and a strictly positive ratio so the
/// fractional power is always real.
pub fn cagr(current: Option<f64>, past: Option<f64>, years: u32) -> Option<f64> {
    let (cur, past) = (current?, past?);
    if years == 0 || past <= 0.0 {
        return None;
    }
    let ratio = cur / past;
    if ratio <= 0.0 {
        return None;
    }
    finite(ratio.powf(1.0 / f64::from(years)) - 1.0)
}

/// %Δ operating income over %Δ revenue against `previous`.
///
/// Falls back to net income when operating-income growth is undefined.
pub fn operating_leverage(
    current: &MergedPeriodRecord,
    previous: Option<&MergedPeriodRecord>,
) -> Option<f64> {
    let previous = previous?;
    let revenue_growth = pct_change(current.revenue, previous.revenue)?;
    if revenue_growth == 0.0 {
        return None;
    }
    let numerator = pct_change(current.operating_income, previous.operating_income)
        .or_else(|| pct_change(current.net_income, previous.net_income))?;
    finite(numerator / revenue_growth)
}
