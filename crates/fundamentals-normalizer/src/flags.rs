//! Anomaly flags evaluated on the latest annual record

use fundamentals_core::{AnomalyFlags, MergedPeriodRecord};
use statrs::statistics::Statistics;

/// Thresholds for the three anomaly flags
#[derive(Debug, Clone)]
pub struct FlagThresholds {
    /// Receivables growth minus revenue growth above which the flag trips
    pub receivables_excess: f64,
    /// Debt growth minus asset growth above which the flag trips
    pub debt_excess: f64,
    /// Population std-dev of quarterly revenue YoY considered volatile
    pub quarterly_volatility: f64,
    /// |annual revenue YoY| below which the year looks flat
    pub annual_flatness: f64,
    /// Quarterly YoY observations required before judging volatility
    pub min_quarters: usize,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            receivables_excess: 0.10,
            debt_excess: 0.10,
            quarterly_volatility: 0.25,
            annual_flatness: 0.05,
            min_quarters: 4,
        }
    }
}

fn excess(a: Option<f64>, b: Option<f64>, threshold: f64) -> Option<bool> {
    Some(a? - b? > threshold)
}

pub fn evaluate_flags(
    annual: &[MergedPeriodRecord],
    quarterly: &[MergedPeriodRecord],
    thresholds: &FlagThresholds,
) -> AnomalyFlags {
    let latest = match annual.iter().max_by_key(|r| r.date) {
        Some(latest) => latest,
        None => return AnomalyFlags::default(),
    };
    let helpers = latest.annual.as_ref();
    let revenue_growth = latest.growth.revenue_growth_yoy;

    let receivables_vs_sales_flag = excess(
        helpers.and_then(|h| h.receivables_growth_yoy),
        revenue_growth,
        thresholds.receivables_excess,
    );
    let debt_up_without_asset_growth_flag = excess(
        helpers.and_then(|h| h.debt_growth_yoy),
        helpers.and_then(|h| h.assets_growth_yoy),
        thresholds.debt_excess,
    );

    let quarterly_growth: Vec<f64> = quarterly
        .iter()
        .filter_map(|r| r.growth.revenue_growth_yoy)
        .collect();

    let quarterly_volatility_masks_annual_flag = match revenue_growth {
        Some(annual_growth) if quarterly_growth.len() >= thresholds.min_quarters => {
            let volatility = quarterly_growth.iter().population_std_dev();
            Some(
                volatility > thresholds.quarterly_volatility
                    && annual_growth.abs() < thresholds.annual_flatness,
            )
        }
        _ => None,
    };

    AnomalyFlags {
        receivables_vs_sales_flag,
        debt_up_without_asset_growth_flag,
        quarterly_volatility_masks_annual_flag,
    }
}
