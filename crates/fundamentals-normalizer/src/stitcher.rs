//! Date stitching
//!
//! Aligns the four statement feeds of one cadence on their statement date and
//! merges them into a single record per date.

use crate::math::{difference, safe_div};
use chrono::NaiveDate;
use fundamentals_core::{MergedPeriodRecord, RawStatementRecord, RawStatements};
use std::collections::BTreeMap;

/// At most one row per feed for a given date
#[derive(Debug, Default, Clone, Copy)]
struct SourceRows<'a> {
    income: Option<&'a RawStatementRecord>,
    balance: Option<&'a RawStatementRecord>,
    cash_flow: Option<&'a RawStatementRecord>,
    ratios: Option<&'a RawStatementRecord>,
}

/// Merge one date's source rows into a period record with margins and FCF
fn merge_sources(date: NaiveDate, rows: SourceRows<'_>) -> MergedPeriodRecord {
    let mut out = MergedPeriodRecord::empty(date);

    if let Some(is) = rows.income {
        out.revenue = is.revenue;
        out.net_income = is.net_income;
        out.gross_profit = is.gross_profit;
        out.operating_income = is.operating_income;
        out.ebitda = is.ebitda;
    }

    out.gross_margin = safe_div(out.gross_profit, out.revenue);
    out.operating_margin = safe_div(out.operating_income, out.revenue);
    out.net_margin = safe_div(out.net_income, out.revenue);

    // Prefer the reported FCF; otherwise OCF - CapEx
    if let Some(cf) = rows.cash_flow {
        out.free_cash_flow = cf
            .free_cash_flow
            .or_else(|| difference(cf.operating_cash_flow, cf.capital_expenditure));
    }

    if let Some(ra) = rows.ratios {
        out.roe = ra.return_on_equity;
        out.roa = ra.return_on_assets;
    }

    out.receivables = rows
        .income
        .and_then(|is| is.net_receivables)
        .or_else(|| rows.balance.and_then(|bs| bs.net_receivables));

    if let Some(bs) = rows.balance {
        out.total_debt = bs.total_debt.or(bs.total_debt_in_million);
        out.total_assets = bs.total_assets;
    }

    out
}

/// Stitch four single-cadence feeds into a date-ordered series.
///
/// Produces exactly one record per date present in any feed. If a feed repeats
/// a date, its last row for that date wins.
pub fn stitch_by_date(
    income: &[RawStatementRecord],
    balance: &[RawStatementRecord],
    cash_flow: &[RawStatementRecord],
    ratios: &[RawStatementRecord],
) -> Vec<MergedPeriodRecord> {
    let mut by_date: BTreeMap<NaiveDate, SourceRows<'_>> = BTreeMap::new();

    for r in income {
        by_date.entry(r.date).or_default().income = Some(r);
    }
    for r in balance {
        by_date.entry(r.date).or_default().balance = Some(r);
    }
    for r in cash_flow {
        by_date.entry(r.date).or_default().cash_flow = Some(r);
    }
    for r in ratios {
        by_date.entry(r.date).or_default().ratios = Some(r);
    }

    by_date
        .into_iter()
        .map(|(date, rows)| merge_sources(date, rows))
        .collect()
}

/// Stitch all four slots of a single-cadence statement set
pub fn stitch(raw: &RawStatements) -> Vec<MergedPeriodRecord> {
    stitch_by_date(&raw.income, &raw.balance, &raw.cash_flow, &raw.ratios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(d: &str) -> RawStatementRecord {
        RawStatementRecord::new(date(d), "FY")
    }

    #[test]
    fn test_one_record_per_date_across_sources() {
        let income = vec![row("2021-12-31"), row("2022-12-31")];
        let balance = vec![row("2022-12-31"), row("2023-12-31")];
        let cash_flow = vec![row("2020-12-31")];
        let ratios = vec![row("2023-12-31"), row("2021-12-31")];

        let merged = stitch_by_date(&income, &balance, &cash_flow, &ratios);
        let dates: Vec<String> = merged.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2020-12-31", "2021-12-31", "2022-12-31", "2023-12-31"]
        );
    }

    #[test]
    fn test_chronological_not_lexicographic_order() {
        // Years before 1000 would sort wrongly as unpadded strings
        let income = vec![row("2023-12-31"), RawStatementRecord::new(NaiveDate::from_ymd_opt(999, 12, 31).unwrap(), "FY")];
        let merged = stitch_by_date(&income, &[], &[], &[]);
        assert!(merged[0].date < merged[1].date);
        assert_eq!(merged[1].date, date("2023-12-31"));
    }

    #[test]
    fn test_duplicate_date_last_row_wins() {
        let mut first = row("2023-12-31");
        first.revenue = Some(1.0);
        let mut second = row("2023-12-31");
        second.revenue = Some(2.0);

        let merged = stitch_by_date(&[first, second], &[], &[], &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].revenue, Some(2.0));
    }

    #[test]
    fn test_field_routing_and_margins() {
        let mut is = row("2023-12-31");
        is.revenue = Some(200.0);
        is.gross_profit = Some(80.0);
        is.operating_income = Some(40.0);
        is.net_income = Some(20.0);
        is.ebitda = Some(55.0);
        is.net_receivables = Some(30.0);

        let mut bs = row("2023-12-31");
        bs.net_receivables = Some(999.0);
        bs.total_debt = Some(70.0);
        bs.total_assets = Some(500.0);

        let mut ra = row("2023-12-31");
        ra.return_on_equity = Some(0.18);
        ra.return_on_assets = Some(0.07);
        // ratios rows never feed levels
        ra.revenue = Some(1.0);

        let merged = stitch_by_date(&[is], &[bs], &[], &[ra]);
        let r = &merged[0];
        assert_eq!(r.revenue, Some(200.0));
        assert_eq!(r.ebitda, Some(55.0));
        assert_relative_eq!(r.gross_margin.unwrap(), 0.4);
        assert_relative_eq!(r.operating_margin.unwrap(), 0.2);
        assert_relative_eq!(r.net_margin.unwrap(), 0.1);
        assert_eq!(r.roe, Some(0.18));
        assert_eq!(r.roa, Some(0.07));
        assert_eq!(r.receivables, Some(30.0));
        assert_eq!(r.total_debt, Some(70.0));
        assert_eq!(r.total_assets, Some(500.0));
        assert_eq!(r.free_cash_flow, None);
    }

    #[test]
    fn test_receivables_fall_back_to_balance_sheet() {
        let is = row("2023-12-31");
        let mut bs = row("2023-12-31");
        bs.net_receivables = Some(12.0);
        bs.total_debt_in_million = Some(3.0);

        let merged = stitch_by_date(&[is], &[bs], &[], &[]);
        assert_eq!(merged[0].receivables, Some(12.0));
        assert_eq!(merged[0].total_debt, Some(3.0));
    }

    #[test]
    fn test_margins_undefined_without_revenue() {
        let mut zero = row("2022-12-31");
        zero.revenue = Some(0.0);
        zero.gross_profit = Some(10.0);
        let mut missing = row("2023-12-31");
        missing.net_income = Some(10.0);
        let mut no_numerator = row("2024-12-31");
        no_numerator.revenue = Some(100.0);

        let merged = stitch_by_date(&[zero, missing, no_numerator], &[], &[], &[]);
        for r in &merged {
            assert_eq!(r.gross_margin, None);
            assert_eq!(r.operating_margin, None);
            assert_eq!(r.net_margin, None);
        }
    }

    #[test]
    fn test_free_cash_flow_direct_and_derived() {
        let mut direct = row("2022-12-31");
        direct.free_cash_flow = Some(42.0);
        direct.operating_cash_flow = Some(100.0);
        direct.capital_expenditure = Some(-30.0);

        let mut derived = row("2023-12-31");
        derived.operating_cash_flow = Some(100.0);
        derived.capital_expenditure = Some(30.0);

        let mut partial = row("2024-12-31");
        partial.operating_cash_flow = Some(100.0);

        let merged = stitch_by_date(&[], &[], &[direct, derived, partial], &[]);
        assert_eq!(merged[0].free_cash_flow, Some(42.0));
        assert_eq!(merged[1].free_cash_flow, Some(70.0));
        assert_eq!(merged[2].free_cash_flow, None);
    }

    #[test]
    fn test_non_finite_levels_never_yield_margins() {
        let mut is = row("2023-12-31");
        is.revenue = Some(f64::INFINITY);
        is.gross_profit = Some(10.0);
        is.net_income = Some(f64::NAN);

        let mut cf = row("2023-12-31");
        cf.operating_cash_flow = Some(f64::INFINITY);
        cf.capital_expenditure = Some(f64::INFINITY);

        let merged = stitch_by_date(&[is], &[], &[cf], &[]);
        assert_eq!(merged[0].gross_margin, None);
        assert_eq!(merged[0].net_margin, None);
        assert_eq!(merged[0].free_cash_flow, None);
    }
}
