//! Derived metrics engine
//!
//! Attaches growth, acceleration, CAGR, margin expansion and operating leverage
//! to a stitched series. Prior periods are matched through [`PeriodKey`]:
//!
//! - annual: fiscal year `Y - 1` (and `Y - 3` for CAGR)
//! - quarterly YoY: same calendar quarter of `Y - 1`
//! - quarterly QoQ: the preceding record by position, whatever its date
//!
//! QoQ follows position, so a missing quarter makes the change
//! span more than one quarter.

use crate::math::{cagr, difference, operating_leverage, pct_change};
use fundamentals_core::{
    AnnualMetrics, Cadence, GrowthMetrics, MergedPeriodRecord, Metric, PeriodKey,
    QuarterlyMetrics,
};
use std::collections::HashMap;

const CAGR_YEARS: u32 = 3;

/// Attach cadence-appropriate derived metrics to a stitched series
pub fn derive_metrics(
    mut rows: Vec<MergedPeriodRecord>,
    cadence: Cadence,
) -> Vec<MergedPeriodRecord> {
    rows.sort_by_key(|r| r.date);
    match cadence {
        Cadence::Annual => derive_annual(&mut rows),
        Cadence::Quarterly => derive_quarterly(&mut rows),
    }
    rows
}

/// Period key -> row position; later rows replace earlier ones on collision
fn period_index(rows: &[MergedPeriodRecord], cadence: Cadence) -> HashMap<PeriodKey, usize> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| (PeriodKey::for_date(r.date, cadence), i))
        .collect()
}

/// Position of the period `years` years before each row, if present
fn lookback(
    rows: &[MergedPeriodRecord],
    index: &HashMap<PeriodKey, usize>,
    cadence: Cadence,
    years: i32,
) -> Vec<Option<usize>> {
    rows.iter()
        .map(|r| {
            let key = PeriodKey::for_date(r.date, cadence).years_back(years);
            index.get(&key).copied()
        })
        .collect()
}

fn growth(cur: &MergedPeriodRecord, prev: Option<&MergedPeriodRecord>, metric: Metric) -> Option<f64> {
    pct_change(cur.level(metric), prev.and_then(|p| p.level(metric)))
}

/// YoY growth and leverage against a matched prior-year record
fn yoy_metrics(cur: &MergedPeriodRecord, prev: Option<&MergedPeriodRecord>) -> GrowthMetrics {
    GrowthMetrics {
        revenue_growth_yoy: growth(cur, prev, Metric::Revenue),
        net_income_growth_yoy: growth(cur, prev, Metric::NetIncome),
        fcf_growth_yoy: growth(cur, prev, Metric::FreeCashFlow),
        operating_leverage_ratio: operating_leverage(cur, prev),
        ..GrowthMetrics::default()
    }
}

/// Current YoY growth minus the matched prior record's own YoY growth
fn yoy_acceleration(cur: &GrowthMetrics, prior: Option<&GrowthMetrics>) -> GrowthMetrics {
    GrowthMetrics {
        revenue_growth_accel_yoy: difference(
            cur.revenue_growth_yoy,
            prior.and_then(|p| p.revenue_growth_yoy),
        ),
        net_income_growth_accel_yoy: difference(
            cur.net_income_growth_yoy,
            prior.and_then(|p| p.net_income_growth_yoy),
        ),
        fcf_growth_accel_yoy: difference(cur.fcf_growth_yoy, prior.and_then(|p| p.fcf_growth_yoy)),
        ..cur.clone()
    }
}

fn margin_expansion(
    cur: Option<f64>,
    prev: Option<&MergedPeriodRecord>,
    margin: fn(&MergedPeriodRecord) -> Option<f64>,
) -> Option<f64> {
    difference(cur, prev.and_then(margin))
}

fn derive_annual(rows: &mut [MergedPeriodRecord]) {
    let index = period_index(rows, Cadence::Annual);
    let prior = lookback(rows, &index, Cadence::Annual, 1);
    let base = lookback(rows, &index, Cadence::Annual, CAGR_YEARS as i32);

    let first_pass: Vec<(GrowthMetrics, AnnualMetrics)> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let prev = prior[i].map(|j| &rows[j]);
            let past = base[i].map(|j| &rows[j]);

            let annual = AnnualMetrics {
                gross_margin_expansion: margin_expansion(r.gross_margin, prev, |p| p.gross_margin),
                operating_margin_expansion: margin_expansion(
                    r.operating_margin,
                    prev,
                    |p| p.operating_margin,
                ),
                net_margin_expansion: margin_expansion(r.net_margin, prev, |p| p.net_margin),
                revenue_cagr_3y: cagr(r.revenue, past.and_then(|p| p.revenue), CAGR_YEARS),
                net_income_cagr_3y: cagr(r.net_income, past.and_then(|p| p.net_income), CAGR_YEARS),
                fcf_cagr_3y: cagr(
                    r.free_cash_flow,
                    past.and_then(|p| p.free_cash_flow),
                    CAGR_YEARS,
                ),
                receivables_growth_yoy: growth(r, prev, Metric::Receivables),
                debt_growth_yoy: growth(r, prev, Metric::TotalDebt),
                assets_growth_yoy: growth(r, prev, Metric::TotalAssets),
            };

            (yoy_metrics(r, prev), annual)
        })
        .collect();

    let accelerated: Vec<GrowthMetrics> = first_pass
        .iter()
        .enumerate()
        .map(|(i, (g, _))| yoy_acceleration(g, prior[i].map(|j| &first_pass[j].0)))
        .collect();

    for ((row, metrics), (_, annual)) in rows.iter_mut().zip(accelerated).zip(first_pass) {
        row.growth = metrics;
        row.annual = Some(annual);
        row.quarterly = None;
    }
}

fn derive_quarterly(rows: &mut [MergedPeriodRecord]) {
    let index = period_index(rows, Cadence::Quarterly);
    let prior_year = lookback(rows, &index, Cadence::Quarterly, 1);

    let first_pass: Vec<(GrowthMetrics, QuarterlyMetrics)> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let prev_year = prior_year[i].map(|j| &rows[j]);
            let prev_quarter = i.checked_sub(1).map(|j| &rows[j]);

            let quarterly = QuarterlyMetrics {
                revenue_growth_qoq: growth(r, prev_quarter, Metric::Revenue),
                net_income_growth_qoq: growth(r, prev_quarter, Metric::NetIncome),
                fcf_growth_qoq: growth(r, prev_quarter, Metric::FreeCashFlow),
                ..QuarterlyMetrics::default()
            };

            (yoy_metrics(r, prev_year), quarterly)
        })
        .collect();

    let finished: Vec<(GrowthMetrics, QuarterlyMetrics)> = first_pass
        .iter()
        .enumerate()
        .map(|(i, (g, q))| {
            let metrics = yoy_acceleration(g, prior_year[i].map(|j| &first_pass[j].0));
            let prev_q = i.checked_sub(1).map(|j| &first_pass[j].1);
            let quarterly = QuarterlyMetrics {
                revenue_growth_accel_qoq: difference(
                    q.revenue_growth_qoq,
                    prev_q.and_then(|p| p.revenue_growth_qoq),
                ),
                net_income_growth_accel_qoq: difference(
                    q.net_income_growth_qoq,
                    prev_q.and_then(|p| p.net_income_growth_qoq),
                ),
                fcf_growth_accel_qoq: difference(
                    q.fcf_growth_qoq,
                    prev_q.and_then(|p| p.fcf_growth_qoq),
                ),
                ..q.clone()
            };
            (metrics, quarterly)
        })
        .collect();

    for (row, (metrics, quarterly)) in rows.iter_mut().zip(finished) {
        row.growth = metrics;
        row.quarterly = Some(quarterly);
        row.annual = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period(d: &str, revenue: f64) -> MergedPeriodRecord {
        let mut r = MergedPeriodRecord::empty(date(d));
        r.revenue = Some(revenue);
        r
    }

    fn find<'a>(rows: &'a [MergedPeriodRecord], d: &str) -> &'a MergedPeriodRecord {
        rows.iter().find(|r| r.date == date(d)).unwrap()
    }

    #[test]
    fn test_annual_revenue_growth() {
        let rows = vec![period("2021-12-31", 80.0), period("2022-12-31", 100.0)];
        let out = derive_metrics(rows, Cadence::Annual);

        assert_eq!(out[0].growth.revenue_growth_yoy, None);
        assert_relative_eq!(out[1].growth.revenue_growth_yoy.unwrap(), 0.25);
        assert!(out[1].quarterly.is_none());
        assert!(out[1].annual.is_some());
    }

    #[test]
    fn test_annual_matches_by_fiscal_year_not_position() {
        // 2020 is missing, so 2021 has no prior year
        let rows = vec![
            period("2019-12-31", 50.0),
            period("2021-12-31", 80.0),
            period("2022-12-31", 100.0),
        ];
        let out = derive_metrics(rows, Cadence::Annual);
        assert_eq!(out[1].growth.revenue_growth_yoy, None);
        assert_eq!(out[1].growth.operating_leverage_ratio, None);
        assert_relative_eq!(out[2].growth.revenue_growth_yoy.unwrap(), 0.25);
    }

    #[test]
    fn test_annual_acceleration_and_zero_denominator() {
        let rows = vec![
            period("2020-12-31", 0.0),
            period("2021-12-31", 80.0),
            period("2022-12-31", 100.0),
            period("2023-12-31", 130.0),
        ];
        let out = derive_metrics(rows, Cadence::Annual);

        // 2021 grows from a zero base: undefined, and so is 2022's acceleration
        assert_eq!(out[1].growth.revenue_growth_yoy, None);
        assert_eq!(out[1].growth.operating_leverage_ratio, None);
        assert_eq!(out[2].growth.revenue_growth_accel_yoy, None);

        // 0.30 - 0.25
        assert_relative_eq!(out[3].growth.revenue_growth_accel_yoy.unwrap(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_annual_margin_expansion() {
        let mut a = period("2022-12-31", 100.0);
        a.gross_margin = Some(0.40);
        a.net_margin = Some(0.10);
        let mut b = period("2023-12-31", 120.0);
        b.gross_margin = Some(0.45);
        b.net_margin = None;

        let out = derive_metrics(vec![b, a], Cadence::Annual);
        let latest = out[1].annual.as_ref().unwrap();
        assert_relative_eq!(latest.gross_margin_expansion.unwrap(), 0.05, epsilon = 1e-12);
        assert_eq!(latest.net_margin_expansion, None);
        assert_eq!(latest.operating_margin_expansion, None);
        assert_eq!(out[0].annual.as_ref().unwrap().gross_margin_expansion, None);
    }

    #[test]
    fn test_annual_cagr_three_years() {
        let mut rows = vec![
            period("2019-12-31", 100.0),
            period("2020-12-31", 110.0),
            period("2021-12-31", 120.0),
            period("2022-12-31", 100.0 * 1.1_f64.powi(3)),
        ];
        rows[0].net_income = Some(-5.0);
        rows[3].net_income = Some(10.0);

        let out = derive_metrics(rows, Cadence::Annual);
        let latest = out[3].annual.as_ref().unwrap();
        assert!((latest.revenue_cagr_3y.unwrap() - 0.1).abs() < 1e-9);
        assert_eq!(latest.net_income_cagr_3y, None);
        assert_eq!(latest.fcf_cagr_3y, None);
        assert_eq!(out[2].annual.as_ref().unwrap().revenue_cagr_3y, None);
    }

    #[test]
    fn test_annual_balance_sheet_helpers() {
        let mut a = period("2022-12-31", 100.0);
        a.receivables = Some(10.0);
        a.total_debt = Some(50.0);
        a.total_assets = Some(0.0);
        let mut b = period("2023-12-31", 105.0);
        b.receivables = Some(13.0);
        b.total_debt = Some(75.0);
        b.total_assets = Some(400.0);

        let out = derive_metrics(vec![a, b], Cadence::Annual);
        let latest = out[1].annual.as_ref().unwrap();
        assert_relative_eq!(latest.receivables_growth_yoy.unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(latest.debt_growth_yoy.unwrap(), 0.5);
        assert_eq!(latest.assets_growth_yoy, None);
    }

    #[test]
    fn test_annual_operating_leverage() {
        let mut a = period("2022-12-31", 100.0);
        a.operating_income = Some(50.0);
        let mut b = period("2023-12-31", 110.0);
        b.operating_income = Some(60.0);

        let out = derive_metrics(vec![a, b], Cadence::Annual);
        assert_relative_eq!(out[1].growth.operating_leverage_ratio.unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_quarterly_yoy_and_positional_qoq() {
        let rows = vec![
            period("2022-03-31", 40.0),
            period("2022-12-31", 45.0),
            period("2023-03-31", 50.0),
        ];
        let out = derive_metrics(rows, Cadence::Quarterly);
        let latest = find(&out, "2023-03-31");

        assert_relative_eq!(latest.growth.revenue_growth_yoy.unwrap(), 0.25);
        let q = latest.quarterly.as_ref().unwrap();
        assert_relative_eq!(q.revenue_growth_qoq.unwrap(), 5.0 / 45.0, epsilon = 1e-12);
        assert!(latest.annual.is_none());

        // 2022-12-31 spans the missing Q2/Q3 back to Q1
        let gap = find(&out, "2022-12-31").quarterly.as_ref().unwrap();
        assert_relative_eq!(gap.revenue_growth_qoq.unwrap(), 0.125);
        assert_eq!(find(&out, "2022-12-31").growth.revenue_growth_yoy, None);
    }

    #[test]
    fn test_quarterly_yoy_acceleration_double_hop() {
        let rows = vec![
            period("2021-06-30", 100.0),
            period("2022-06-30", 110.0),
            period("2023-06-30", 132.0),
        ];
        let out = derive_metrics(rows, Cadence::Quarterly);
        // 0.20 - 0.10
        assert_relative_eq!(out[2].growth.revenue_growth_accel_yoy.unwrap(), 0.1, epsilon = 1e-12);
        assert_eq!(out[1].growth.revenue_growth_accel_yoy, None);
    }

    #[test]
    fn test_quarterly_qoq_acceleration() {
        let rows = vec![
            period("2023-03-31", 100.0),
            period("2023-06-30", 110.0),
            period("2023-09-30", 132.0),
        ];
        let out = derive_metrics(rows, Cadence::Quarterly);
        let q = out[2].quarterly.as_ref().unwrap();
        assert_relative_eq!(q.revenue_growth_accel_qoq.unwrap(), 0.1, epsilon = 1e-12);
        assert_eq!(out[1].quarterly.as_ref().unwrap().revenue_growth_accel_qoq, None);
        assert_eq!(out[0].quarterly.as_ref().unwrap().revenue_growth_qoq, None);
    }

    #[test]
    fn test_quarterly_leverage_is_year_over_year() {
        let mut a = period("2022-06-30", 100.0);
        a.operating_income = Some(10.0);
        let mut b = period("2023-03-31", 500.0);
        b.operating_income = Some(1.0);
        let mut c = period("2023-06-30", 110.0);
        c.operating_income = Some(12.0);

        let out = derive_metrics(vec![a, b, c], Cadence::Quarterly);
        // vs 2022-06-30, not the adjacent 2023-03-31
        assert_relative_eq!(out[2].growth.operating_leverage_ratio.unwrap(), 2.0, epsilon = 1e-9);
        assert_eq!(out[1].growth.operating_leverage_ratio, None);
    }

    #[test]
    fn test_zero_prior_denominator_leaves_everything_undefined() {
        let mut a = period("2022-12-31", 0.0);
        a.net_income = Some(0.0);
        a.free_cash_flow = Some(0.0);
        a.operating_income = Some(0.0);
        let mut b = period("2023-12-31", 100.0);
        b.net_income = Some(10.0);
        b.free_cash_flow = Some(5.0);
        b.operating_income = Some(20.0);
        b.gross_margin = Some(0.5);

        let out = derive_metrics(vec![a, b], Cadence::Annual);
        let g = &out[1].growth;
        assert_eq!(g.revenue_growth_yoy, None);
        assert_eq!(g.net_income_growth_yoy, None);
        assert_eq!(g.fcf_growth_yoy, None);
        assert_eq!(g.operating_leverage_ratio, None);
        assert_eq!(out[1].annual.as_ref().unwrap().gross_margin_expansion, None);
    }
}
