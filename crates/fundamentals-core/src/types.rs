use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// The four raw statement feeds a symbol is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatementKind {
    Income,
    Balance,
    CashFlow,
    Ratios,
}

impl StatementKind {
    pub const ALL: [StatementKind; 4] = [
        StatementKind::Income,
        StatementKind::Balance,
        StatementKind::CashFlow,
        StatementKind::Ratios,
    ];

    /// Category name used by raw dumps (`<raw>/<category>/<SYMBOL>.jsonl`)
    pub fn dir_name(&self) -> &'static str {
        match self {
            StatementKind::Income => "income_statement",
            StatementKind::Balance => "balance_sheet",
            StatementKind::CashFlow => "cash_flow",
            StatementKind::Ratios => "ratios",
        }
    }
}

/// One raw statement row as delivered by a source.
///
/// Every numeric field is optional; absence means "not reported", never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatementRecord {
    pub date: NaiveDate,
    /// First non-empty of the source's `period` / `periodType` keys
    pub period: Option<String>,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub ebitda: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub net_receivables: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_debt_in_million: Option<f64>,
    pub total_assets: Option<f64>,
}

impl RawStatementRecord {
    pub fn new(date: NaiveDate, period: impl Into<String>) -> Self {
        Self {
            date,
            period: Some(period.into()),
            revenue: None,
            net_income: None,
            gross_profit: None,
            operating_income: None,
            ebitda: None,
            operating_cash_flow: None,
            capital_expenditure: None,
            free_cash_flow: None,
            return_on_equity: None,
            return_on_assets: None,
            net_receivables: None,
            total_debt: None,
            total_debt_in_million: None,
            total_assets: None,
        }
    }
}

/// Raw sequences for one symbol, one slot per statement kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStatements {
    pub income: Vec<RawStatementRecord>,
    pub balance: Vec<RawStatementRecord>,
    pub cash_flow: Vec<RawStatementRecord>,
    pub ratios: Vec<RawStatementRecord>,
}

impl RawStatements {
    pub fn get(&self, kind: StatementKind) -> &[RawStatementRecord] {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Balance => &self.balance,
            StatementKind::CashFlow => &self.cash_flow,
            StatementKind::Ratios => &self.ratios,
        }
    }

    pub fn set(&mut self, kind: StatementKind, records: Vec<RawStatementRecord>) {
        match kind {
            StatementKind::Income => self.income = records,
            StatementKind::Balance => self.balance = records,
            StatementKind::CashFlow => self.cash_flow = records,
            StatementKind::Ratios => self.ratios = records,
        }
    }

    pub fn is_empty(&self) -> bool {
        StatementKind::ALL.iter().all(|k| self.get(*k).is_empty())
    }

    pub fn total_len(&self) -> usize {
        StatementKind::ALL.iter().map(|k| self.get(*k).len()).sum()
    }
}

/// Reporting cadence of a derived series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cadence {
    Annual,
    Quarterly,
}

impl Cadence {
    pub fn label(&self) -> &'static str {
        match self {
            Cadence::Annual => "FY",
            Cadence::Quarterly => "Q",
        }
    }
}

/// Map key for prior-period lookups.
///
/// Annual records are keyed by fiscal year, quarterly ones by calendar
/// (year, quarter) derived from the statement date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeriodKey {
    Year(i32),
    Quarter { year: i32, quarter: u32 },
}

impl PeriodKey {
    pub fn for_date(date: NaiveDate, cadence: Cadence) -> Self {
        match cadence {
            Cadence::Annual => PeriodKey::Year(date.year()),
            Cadence::Quarterly => PeriodKey::Quarter {
                year: date.year(),
                quarter: 1 + (date.month() - 1) / 3,
            },
        }
    }

    /// Same period `n` years earlier
    pub fn years_back(&self, n: i32) -> Self {
        match *self {
            PeriodKey::Year(year) => PeriodKey::Year(year - n),
            PeriodKey::Quarter { year, quarter } => PeriodKey::Quarter {
                year: year - n,
                quarter,
            },
        }
    }
}

/// Named level a growth rate can be taken over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Revenue,
    NetIncome,
    OperatingIncome,
    FreeCashFlow,
    Receivables,
    TotalDebt,
    TotalAssets,
}

/// Growth, acceleration and leverage fields shared by both cadences
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrowthMetrics {
    pub revenue_growth_yoy: Option<f64>,
    pub net_income_growth_yoy: Option<f64>,
    pub fcf_growth_yoy: Option<f64>,
    pub revenue_growth_accel_yoy: Option<f64>,
    pub net_income_growth_accel_yoy: Option<f64>,
    pub fcf_growth_accel_yoy: Option<f64>,
    pub operating_leverage_ratio: Option<f64>,
}

/// Annual-only fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnualMetrics {
    pub gross_margin_expansion: Option<f64>,
    pub operating_margin_expansion: Option<f64>,
    pub net_margin_expansion: Option<f64>,
    pub revenue_cagr_3y: Option<f64>,
    pub net_income_cagr_3y: Option<f64>,
    pub fcf_cagr_3y: Option<f64>,
    #[serde(rename = "_ar_growth_yoy")]
    pub receivables_growth_yoy: Option<f64>,
    #[serde(rename = "_debt_growth_yoy")]
    pub debt_growth_yoy: Option<f64>,
    #[serde(rename = "_assets_growth_yoy")]
    pub assets_growth_yoy: Option<f64>,
}

/// Quarterly-only fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuarterlyMetrics {
    pub revenue_growth_qoq: Option<f64>,
    pub net_income_growth_qoq: Option<f64>,
    pub fcf_growth_qoq: Option<f64>,
    pub revenue_growth_accel_qoq: Option<f64>,
    pub net_income_growth_accel_qoq: Option<f64>,
    pub fcf_growth_accel_qoq: Option<f64>,
}

/// Anomaly flags carried by the latest annual record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnomalyFlags {
    pub receivables_vs_sales_flag: Option<bool>,
    pub debt_up_without_asset_growth_flag: Option<bool>,
    pub quarterly_volatility_masks_annual_flag: Option<bool>,
}

/// One stitched period: source levels, margins, and derived metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedPeriodRecord {
    pub date: NaiveDate,
    pub revenue: Option<f64>,
    #[serde(rename = "netIncome")]
    pub net_income: Option<f64>,
    #[serde(rename = "grossProfit")]
    pub gross_profit: Option<f64>,
    #[serde(rename = "operatingIncome")]
    pub operating_income: Option<f64>,
    #[serde(rename = "EBITDA")]
    pub ebitda: Option<f64>,
    #[serde(rename = "grossMargin")]
    pub gross_margin: Option<f64>,
    #[serde(rename = "operatingMargin")]
    pub operating_margin: Option<f64>,
    #[serde(rename = "netMargin")]
    pub net_margin: Option<f64>,
    #[serde(rename = "freeCashFlow")]
    pub free_cash_flow: Option<f64>,
    #[serde(rename = "ROE")]
    pub roe: Option<f64>,
    #[serde(rename = "ROA")]
    pub roa: Option<f64>,
    #[serde(rename = "_accountsReceivable")]
    pub receivables: Option<f64>,
    #[serde(rename = "_totalDebt")]
    pub total_debt: Option<f64>,
    #[serde(rename = "_totalAssets")]
    pub total_assets: Option<f64>,
    #[serde(flatten)]
    pub growth: GrowthMetrics,
    #[serde(flatten)]
    pub annual: Option<AnnualMetrics>,
    #[serde(flatten)]
    pub quarterly: Option<QuarterlyMetrics>,
    #[serde(flatten)]
    pub flags: Option<AnomalyFlags>,
}

impl MergedPeriodRecord {
    /// Record with only a date; every level and metric undefined
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            revenue: None,
            net_income: None,
            gross_profit: None,
            operating_income: None,
            ebitda: None,
            gross_margin: None,
            operating_margin: None,
            net_margin: None,
            free_cash_flow: None,
            roe: None,
            roa: None,
            receivables: None,
            total_debt: None,
            total_assets: None,
            growth: GrowthMetrics::default(),
            annual: None,
            quarterly: None,
            flags: None,
        }
    }

    pub fn level(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Revenue => self.revenue,
            Metric::NetIncome => self.net_income,
            Metric::OperatingIncome => self.operating_income,
            Metric::FreeCashFlow => self.free_cash_flow,
            Metric::Receivables => self.receivables,
            Metric::TotalDebt => self.total_debt,
            Metric::TotalAssets => self.total_assets,
        }
    }
}

/// Per-symbol output artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolBundle {
    pub symbol: String,
    #[serde(rename = "FY")]
    pub annual: Vec<MergedPeriodRecord>,
    #[serde(rename = "Q")]
    pub quarterly: Vec<MergedPeriodRecord>,
}

impl SymbolBundle {
    /// Flags attached to the latest annual record, if any
    pub fn flags(&self) -> Option<&AnomalyFlags> {
        self.annual.last().and_then(|r| r.flags.as_ref())
    }
}
