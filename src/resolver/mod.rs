//! Precedence resolver
//!
//! Picks one value per canonical metric from every source's candidates.
//! The override policy is data: source priority plus per-metric eligibility,
//! never the order candidates happen to arrive in.

use crate::models::{CandidateValue, MetricValue, SourceTag};
use crate::schema;
use tracing::debug;

pub mod coerce;

pub use coerce::{coerce, is_absent, parse_amount};

/// A winning value and the source it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: MetricValue,
    pub source: SourceTag,
}

pub struct PrecedenceResolver;

impl PrecedenceResolver {
    /// Resolve `metric` from `candidates`, or `None` if no source had a usable opinion.
    ///
    /// # Panics
    /// If `metric` is not a canonical metric name.
    pub fn resolve(metric: &str, candidates: &[CandidateValue]) -> Option<MetricValue> {
        Self::resolve_with_source(metric, candidates).map(|r| r.value)
    }

    pub fn resolve_with_source(metric: &str, candidates: &[CandidateValue]) -> Option<Resolution> {
        let spec = schema::expect_metric(metric);

        let mut ranked: Vec<&CandidateValue> = candidates
            .iter()
            .filter(|c| c.metric == spec.name && spec.accepts(c.source))
            .collect();

        // stable: same-source duplicates keep their input order
        ranked.sort_by_key(|c| c.source.priority());

        for candidate in ranked {
            if is_absent(&candidate.value) {
                continue;
            }

            match coerce(spec.kind, &candidate.value) {
                Ok(value) => {
                    return Some(Resolution {
                        value,
                        source: candidate.source,
                    })
                }
                Err(e) => {
                    debug!(
                        metric = spec.name,
                        source = %candidate.source,
                        error = %e,
                        "Candidate demoted to absent"
                    );
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn candidate(metric: &'static str, source: SourceTag, value: Value) -> CandidateValue {
        CandidateValue::new(metric, value, source)
    }

    #[test]
    fn test_empty_string_does_not_suppress_lower_priority() {
        let candidates = vec![
            candidate("monthly_active_users", SourceTag::PdfExtraction, json!("")),
            candidate("monthly_active_users", SourceTag::WebSearch, json!(42)),
        ];
        assert_eq!(
            PrecedenceResolver::resolve("monthly_active_users", &candidates),
            Some(MetricValue::Integer(42))
        );
    }

    #[test]
    fn test_null_does_not_suppress_lower_priority() {
        let candidates = vec![
            candidate("industry", SourceTag::PdfExtraction, Value::Null),
            candidate("industry", SourceTag::WebSearch, json!("Fintech")),
        ];
        assert_eq!(
            PrecedenceResolver::resolve("industry", &candidates),
            Some(MetricValue::Text("Fintech".into()))
        );
    }

    #[test]
    fn test_priority_independent_of_input_order() {
        let forward = vec![
            candidate("runway", SourceTag::WebSearch, json!(10)),
            candidate("runway", SourceTag::PdfExtraction, json!(20)),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(
            PrecedenceResolver::resolve("runway", &forward),
            Some(MetricValue::Integer(20))
        );
        assert_eq!(
            PrecedenceResolver::resolve("runway", &backward),
            Some(MetricValue::Integer(20))
        );
    }

    #[test]
    fn test_sec_beats_web_for_financial_metrics() {
        let candidates = vec![
            candidate("annual_recurring_revenue", SourceTag::WebSearch, json!(900_000)),
            candidate("annual_recurring_revenue", SourceTag::FinancialSec, json!("$1.2M")),
        ];
        let resolution =
            PrecedenceResolver::resolve_with_source("annual_recurring_revenue", &candidates).unwrap();
        assert_eq!(resolution.value, MetricValue::Integer(1_200_000));
        assert_eq!(resolution.source, SourceTag::FinancialSec);
    }

    #[test]
    fn test_ineligible_sources_are_ignored() {
        // LinkedIn has no say on revenue, news none on industry
        let candidates = vec![
            candidate("annual_recurring_revenue", SourceTag::Linkedin, json!(5)),
            candidate("industry", SourceTag::News, json!("Media")),
        ];
        assert_eq!(PrecedenceResolver::resolve("annual_recurring_revenue", &candidates), None);
        assert_eq!(PrecedenceResolver::resolve("industry", &candidates), None);
    }

    #[test]
    fn test_conversion_failure_falls_through() {
        let candidates = vec![
            candidate("burn_rate", SourceTag::PdfExtraction, json!("abc")),
            candidate("burn_rate", SourceTag::WebSearch, json!("$80k")),
        ];
        assert_eq!(
            PrecedenceResolver::resolve("burn_rate", &candidates),
            Some(MetricValue::Integer(80_000))
        );

        let only_bad = vec![candidate("burn_rate", SourceTag::PdfExtraction, json!("abc"))];
        assert_eq!(PrecedenceResolver::resolve("burn_rate", &only_bad), None);
    }

    #[test]
    fn test_out_of_range_score_falls_through() {
        let candidates = vec![
            candidate("founder_background", SourceTag::PdfExtraction, json!(8)),
            candidate("founder_background", SourceTag::Linkedin, json!(4)),
        ];
        let resolution =
            PrecedenceResolver::resolve_with_source("founder_background", &candidates).unwrap();
        assert_eq!(resolution.value, MetricValue::Integer(4));
        assert_eq!(resolution.source, SourceTag::Linkedin);
    }

    #[test]
    fn test_candidates_for_other_metrics_are_ignored() {
        let candidates = vec![candidate("runway", SourceTag::PdfExtraction, json!(12))];
        assert_eq!(PrecedenceResolver::resolve("burn_rate", &candidates), None);
        assert_eq!(PrecedenceResolver::resolve("runway", &[]), None);
    }

    #[test]
    #[should_panic(expected = "unknown canonical metric")]
    fn test_unknown_metric_is_a_programming_error() {
        PrecedenceResolver::resolve("valuation", &[]);
    }
}
