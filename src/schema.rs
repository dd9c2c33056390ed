//! Canonical metric vocabulary
//!
//! Every field the consolidated record can carry is declared here once, with
//! its expected kind and group. The table order is the output key order.

use crate::models::SourceTag;
use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Integer,
    /// Integer constrained to 1..=5
    Score,
    Text,
    Boolean,
    Sentiment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricGroup {
    Identity,
    Financial,
    Operational,
    Qualitative,
    Risk,
}

/// Who produces the final value of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricOrigin {
    /// Picked from source candidates by the precedence resolver
    Resolved,
    /// Written by the risk/sentiment classifier only
    Classifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSpec {
    pub name: &'static str,
    pub kind: MetricKind,
    pub group: MetricGroup,
    pub founder_scoped: bool,
    pub origin: MetricOrigin,
}

impl MetricSpec {
    const fn resolved(name: &'static str, kind: MetricKind, group: MetricGroup) -> Self {
        Self {
            name,
            kind,
            group,
            founder_scoped: false,
            origin: MetricOrigin::Resolved,
        }
    }

    const fn founder(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            group: MetricGroup::Qualitative,
            founder_scoped: true,
            origin: MetricOrigin::Resolved,
        }
    }

    const fn classified(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            group: MetricGroup::Risk,
            founder_scoped: false,
            origin: MetricOrigin::Classifier,
        }
    }

    /// Whether `source` is allowed to have an opinion on this metric.
    ///
    /// SEC data only counts for financial facts, LinkedIn only for founder
    /// fields and news only for risk fields.
    pub fn accepts(&self, source: SourceTag) -> bool {
        match source {
            SourceTag::PdfExtraction | SourceTag::WebSearch => true,
            SourceTag::FinancialSec => self.group == MetricGroup::Financial,
            SourceTag::Linkedin => self.founder_scoped,
            SourceTag::News => self.group == MetricGroup::Risk,
        }
    }
}

use MetricGroup::{Financial, Identity, Operational, Qualitative, Risk};
use MetricKind::{Boolean, Integer, Score, Sentiment, Text};

pub const METRICS: &[MetricSpec] = &[
    // Identity
    MetricSpec::resolved("company_name", Text, Identity),
    MetricSpec::resolved("official_company_name", Text, Identity),
    MetricSpec::resolved("year_of_founding", Integer, Identity),
    MetricSpec::resolved("location_of_headquarters", Text, Identity),
    MetricSpec::resolved("country_of_headquarters", Text, Identity),
    MetricSpec::resolved("industry", Text, Identity),
    MetricSpec::resolved("business_model", Text, Identity),
    MetricSpec::resolved("employees", Text, Identity),
    MetricSpec::resolved("website_link", Text, Identity),
    MetricSpec::resolved("one_sentence_pitch", Text, Identity),
    MetricSpec::resolved("pitch_deck_summary", Text, Identity),
    // Financial
    MetricSpec::resolved("annual_recurring_revenue", Integer, Financial),
    MetricSpec::resolved("monthly_recurring_revenue", Integer, Financial),
    MetricSpec::resolved("customer_acquisition_cost", Integer, Financial),
    MetricSpec::resolved("customer_lifetime_value", Integer, Financial),
    MetricSpec::resolved("cltv_cac_ratio", Integer, Financial),
    MetricSpec::resolved("gross_margin", Integer, Financial),
    MetricSpec::resolved("revenue_growth_rate_yoy", Integer, Financial),
    MetricSpec::resolved("revenue_growth_rate_mom", Integer, Financial),
    MetricSpec::resolved("burn_rate", Integer, Financial),
    MetricSpec::resolved("runway", Integer, Financial),
    MetricSpec::resolved("required_funding_amount", Integer, Financial),
    MetricSpec::resolved("net_income", Integer, Financial),
    MetricSpec::resolved("total_assets", Integer, Financial),
    MetricSpec::resolved("total_liabilities", Integer, Financial),
    MetricSpec::resolved("fiscal_year", Integer, Financial),
    // Operational
    MetricSpec::resolved("monthly_active_users", Integer, Operational),
    MetricSpec::resolved("user_growth_rate_yoy", Integer, Operational),
    MetricSpec::resolved("user_growth_rate_mom", Integer, Operational),
    MetricSpec::resolved("conversion_rate", Integer, Operational),
    MetricSpec::resolved("sales_cycle_length", Integer, Operational),
    MetricSpec::resolved("churn_rate", Integer, Operational),
    MetricSpec::resolved("net_revenue_retention", Integer, Operational),
    MetricSpec::resolved("customer_payback_period", Integer, Operational),
    MetricSpec::resolved("dau_mau_ratio", Integer, Operational),
    // Founder
    MetricSpec::founder("ceo_name", Text),
    MetricSpec::founder("ceo_title", Text),
    MetricSpec::founder("linkedin_profile_ceo", Text),
    MetricSpec::founder("founder_summary", Text),
    MetricSpec::founder("founder_skills", Text),
    MetricSpec::founder("founder_current_company", Text),
    MetricSpec::founder("founder_industry_experience", Integer),
    MetricSpec::founder("founder_past_exits", Integer),
    MetricSpec::founder("founder_background", Score),
    // Qualitative / scored
    MetricSpec::resolved("market_competitiveness", Score, Qualitative),
    MetricSpec::resolved("market_timing", Score, Qualitative),
    MetricSpec::resolved("pricing_strategy_maturity", Score, Qualitative),
    MetricSpec::resolved("cap_table_cleanliness", Score, Qualitative),
    MetricSpec::resolved("product_stickiness", Score, Qualitative),
    MetricSpec::resolved("business_model_scalability", Score, Qualitative),
    MetricSpec::resolved("hiring_plan_alignment", Score, Qualitative),
    MetricSpec::resolved("ip_protection", Boolean, Qualitative),
    // Risk
    MetricSpec::classified("regulatory_risks", Boolean),
    MetricSpec::classified("trend_risks", Boolean),
    MetricSpec::classified("news_sentiment", Sentiment),
    MetricSpec::classified("news_summary", Text),
    MetricSpec::resolved("litigation_ip_disputes", Boolean, Risk),
    MetricSpec::resolved("founder_sanction_free", Boolean, Risk),
    MetricSpec::resolved("company_sanction_free", Boolean, Risk),
];

lazy_static! {
    static ref METRIC_INDEX: HashMap<&'static str, usize> = METRICS
        .iter()
        .enumerate()
        .map(|(i, spec)| (spec.name, i))
        .collect();
}

/// Position of `name` in [`METRICS`], if it is a canonical metric.
pub fn index_of(name: &str) -> Option<usize> {
    METRIC_INDEX.get(name).copied()
}

pub fn lookup(name: &str) -> Option<&'static MetricSpec> {
    index_of(name).map(|i| &METRICS[i])
}

/// Lookup for names that come from code, not data.
///
/// # Panics
/// On a name outside the vocabulary: that is a schema bug, not bad input.
pub fn expect_metric(name: &str) -> &'static MetricSpec {
    match lookup(name) {
        Some(spec) => spec,
        None => panic!("unknown canonical metric `{}`", name),
    }
}
