//! Per-source field tables
//!
//! Each table maps a canonical metric to the keys a source uses for it. Keys
//! are looked up under every scope prefix in order and every present key is a
//! candidate; the resolver takes the first populated one.

use crate::models::SourceTag;

pub struct FieldTable {
    /// Dotted object paths to search under, most specific first. "" is the root.
    pub scopes: &'static [&'static str],
    /// (canonical metric, source keys in preference order)
    pub fields: &'static [(&'static str, &'static [&'static str])],
}

pub fn table_for(source: SourceTag) -> &'static FieldTable {
    match source {
        SourceTag::PdfExtraction => &PDF_EXTRACTION,
        SourceTag::FinancialSec => &FINANCIAL_SEC,
        SourceTag::WebSearch => &WEB_SEARCH,
        SourceTag::Linkedin => &LINKEDIN,
        SourceTag::News => &NEWS,
    }
}

/// Flat output, the `{company_info, financial_information}` agent shape and
/// the `{main_category, search_category}` executor shape.
const PDF_SCOPES: &[&str] = &[
    "",
    "company_info",
    "financial_information",
    "financial_metrics",
    "operational_metrics",
    "strategic_metrics",
    "founder_metrics",
    "main_category.company_info",
    "main_category",
    "search_category",
    "metrics",
];

const PDF_EXTRACTION: FieldTable = FieldTable {
    scopes: PDF_SCOPES,
    fields: &[
        ("company_name", &["company_name", "business_name"]),
        ("official_company_name", &["official_company_name"]),
        ("year_of_founding", &["year_of_founding", "founded"]),
        ("location_of_headquarters", &["location_of_headquarters", "headquarters"]),
        ("country_of_headquarters", &["country_of_headquarters"]),
        ("industry", &["industry"]),
        ("business_model", &["business_model"]),
        ("employees", &["employees", "employee_count", "number_of_employees"]),
        ("website_link", &["website_link", "website"]),
        ("one_sentence_pitch", &["one_sentence_pitch", "pitch"]),
        ("pitch_deck_summary", &["pitch_deck_summary", "summary"]),
        ("annual_recurring_revenue", &["annual_recurring_revenue", "arr"]),
        ("monthly_recurring_revenue", &["monthly_recurring_revenue", "mrr"]),
        ("customer_acquisition_cost", &["customer_acquisition_cost", "cac"]),
        ("customer_lifetime_value", &["customer_lifetime_value", "cltv", "ltv"]),
        ("cltv_cac_ratio", &["cltv_cac_ratio", "ltv_cac_ratio"]),
        ("gross_margin", &["gross_margin", "margins"]),
        ("revenue_growth_rate_yoy", &["revenue_growth_rate_yoy"]),
        ("revenue_growth_rate_mom", &["revenue_growth_rate_mom"]),
        ("burn_rate", &["burn_rate", "monthly_cash_burn"]),
        ("runway", &["runway"]),
        ("required_funding_amount", &["required_funding_amount"]),
        ("net_income", &["net_income", "earnings"]),
        ("total_assets", &["total_assets"]),
        ("total_liabilities", &["total_liabilities"]),
        ("fiscal_year", &["fiscal_year"]),
        ("monthly_active_users", &["monthly_active_users", "mau"]),
        ("user_growth_rate_yoy", &["user_growth_rate_yoy"]),
        ("user_growth_rate_mom", &["user_growth_rate_mom"]),
        ("conversion_rate", &["conversion_rate"]),
        ("sales_cycle_length", &["sales_cycle_length"]),
        ("churn_rate", &["churn_rate"]),
        ("net_revenue_retention", &["net_revenue_retention"]),
        ("customer_payback_period", &["customer_payback_period"]),
        ("dau_mau_ratio", &["dau_mau_ratio"]),
        ("ceo_name", &["ceo_name", "ceo"]),
        ("ceo_title", &["ceo_title"]),
        ("linkedin_profile_ceo", &["linkedin_profile_ceo"]),
        ("founder_summary", &["founder_summary"]),
        ("founder_skills", &["founder_skills"]),
        ("founder_current_company", &["founder_current_company"]),
        ("founder_industry_experience", &["founder_industry_experience"]),
        ("founder_past_exits", &["founder_past_exits"]),
        ("founder_background", &["founder_background"]),
        ("market_competitiveness", &["market_competitiveness"]),
        ("market_timing", &["market_timing"]),
        ("pricing_strategy_maturity", &["pricing_strategy_maturity"]),
        ("cap_table_cleanliness", &["cap_table_cleanliness"]),
        ("product_stickiness", &["product_stickiness"]),
        ("business_model_scalability", &["business_model_scalability"]),
        ("hiring_plan_alignment", &["hiring_plan_alignment"]),
        ("ip_protection", &["ip_protection"]),
        ("litigation_ip_disputes", &["litigation_ip_disputes"]),
        ("founder_sanction_free", &["founder_sanction_free"]),
        ("company_sanction_free", &["company_sanction_free"]),
    ],
};

/// SEC EDGAR financial model: string amounts, no identity fields.
const FINANCIAL_SEC: FieldTable = FieldTable {
    scopes: &["", "financials"],
    fields: &[
        ("annual_recurring_revenue", &["revenue", "revenues"]),
        ("net_income", &["net_income"]),
        ("total_assets", &["total_assets"]),
        ("total_liabilities", &["total_liabilities"]),
        ("fiscal_year", &["fiscal_year"]),
    ],
};

const WEB_SEARCH: FieldTable = FieldTable {
    scopes: &[
        "",
        "company_info",
        "financial_data",
        "main_category.company_info",
        "main_category",
        "search_category",
    ],
    fields: &[
        ("company_name", &["company_name", "business_name"]),
        ("year_of_founding", &["year_of_founding"]),
        ("location_of_headquarters", &["location_of_headquarters"]),
        ("industry", &["industry"]),
        ("business_model", &["business_model"]),
        ("employees", &["employees", "employee_count"]),
        ("website_link", &["website_link"]),
        ("one_sentence_pitch", &["one_sentence_pitch"]),
        ("annual_recurring_revenue", &["annual_recurring_revenue"]),
        ("monthly_recurring_revenue", &["monthly_recurring_revenue"]),
        ("customer_acquisition_cost", &["customer_acquisition_cost"]),
        ("customer_lifetime_value", &["customer_lifetime_value"]),
        ("cltv_cac_ratio", &["cltv_cac_ratio"]),
        ("gross_margin", &["gross_margin"]),
        ("revenue_growth_rate_yoy", &["revenue_growth_rate_yoy"]),
        ("revenue_growth_rate_mom", &["revenue_growth_rate_mom"]),
        ("burn_rate", &["burn_rate"]),
        ("runway", &["runway"]),
        ("monthly_active_users", &["monthly_active_users"]),
        ("sales_cycle_length", &["sales_cycle_length"]),
        ("churn_rate", &["churn_rate"]),
        ("net_revenue_retention", &["net_revenue_retention"]),
        ("customer_payback_period", &["customer_payback_period"]),
        ("dau_mau_ratio", &["dau_mau_ratio"]),
        ("linkedin_profile_ceo", &["linkedin_profile_ceo", "ceo_linkedin"]),
        ("product_stickiness", &["product_stickiness"]),
        ("business_model_scalability", &["business_model_scalability"]),
        ("hiring_plan_alignment", &["hiring_plan_alignment"]),
        ("litigation_ip_disputes", &["litigation_ip_disputes"]),
        ("founder_sanction_free", &["founder_sanction_free"]),
        ("company_sanction_free", &["company_sanction_free"]),
    ],
};

/// Owner profile model plus the raw Bright Data profile keys.
const LINKEDIN: FieldTable = FieldTable {
    scopes: &["", "profile"],
    fields: &[
        ("ceo_name", &["name", "full_name"]),
        ("ceo_title", &["title", "position", "headline"]),
        ("linkedin_profile_ceo", &["url", "profile_url"]),
        ("founder_summary", &["summary", "about"]),
        ("founder_skills", &["skills"]),
        (
            "founder_current_company",
            &["current_company_name", "current_company.name", "current_company"],
        ),
        ("founder_past_exits", &["past_exits"]),
        ("founder_industry_experience", &["industry_experience_years"]),
    ],
};

/// Risk flags a news agent may report directly. Sentiment and the
/// regulatory/trend flags come from the classifier instead.
const NEWS: FieldTable = FieldTable {
    scopes: &[""],
    fields: &[
        ("litigation_ip_disputes", &["litigation_ip_disputes", "litigation"]),
        ("founder_sanction_free", &["founder_sanction_free"]),
        ("company_sanction_free", &["company_sanction_free"]),
    ],
};
