//! Consolidator - one pass from source bundles to the canonical record
//!
//! ADAPT → GROUP → RESOLVE → CLASSIFY → ANALYZE → ASSEMBLE

use crate::adapter::FieldSourceAdapter;
use crate::analysis::{GeminiInvestmentAnalyzer, InvestmentAnalyzer};
use crate::classifier::{GeminiRiskFallback, RiskClassifier};
use crate::config::ConsolidatorConfig;
use crate::gemini::GeminiClient;
use crate::models::{
    CandidateValue, CanonicalRecord, Consolidation, InvestmentAnalysis, MetricValue,
    RiskAssessment, SourceBundles, SourceTag,
};
use crate::resolver::PrecedenceResolver;
use crate::schema::{MetricOrigin, METRICS};
use crate::Result;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Record fields owned by the classifier
pub const REGULATORY_RISKS: &str = "regulatory_risks";
pub const TREND_RISKS: &str = "trend_risks";
pub const NEWS_SENTIMENT: &str = "news_sentiment";
pub const NEWS_SUMMARY: &str = "news_summary";

pub struct Consolidator {
    classifier: RiskClassifier,
    analyzer: Option<Arc<dyn InvestmentAnalyzer>>,
}

impl Consolidator {
    pub fn new(classifier: RiskClassifier) -> Self {
        Self {
            classifier,
            analyzer: None,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn InvestmentAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Wire the classifier fallback and the analyzer from configuration.
    /// Both share one pooled Gemini client.
    pub fn from_config(config: &ConsolidatorConfig) -> Result<Self> {
        let client = match &config.gemini_api_key {
            Some(key) if config.fallback_enabled() || config.analysis_enabled() => Some(Arc::new(
                GeminiClient::with_base_url(key.clone(), config.gemini_model_url.clone())?,
            )),
            _ => None,
        };

        let classifier = match &client {
            Some(client) if config.fallback_enabled() => {
                RiskClassifier::new(Arc::new(GeminiRiskFallback::new(client.clone())))
            }
            _ => RiskClassifier::keyword_only(),
        };

        let consolidator = Self::new(classifier);
        Ok(match client {
            Some(client) if config.analysis_enabled() => {
                consolidator.with_analyzer(Arc::new(GeminiInvestmentAnalyzer::new(client)))
            }
            _ => consolidator,
        })
    }

    pub fn has_analyzer(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Consolidate whatever bundles are present. Missing or malformed sources
    /// only leave fields unresolved; this never fails.
    pub async fn consolidate(&self, bundles: &SourceBundles) -> Consolidation {
        let start_time = Instant::now();
        let request_id = Uuid::new_v4();

        info!(
            request_id = %request_id,
            sources = ?bundles.keys().collect::<Vec<_>>(),
            "Consolidator: starting"
        );

        // === ADAPT + GROUP ===
        let mut by_metric: HashMap<&'static str, Vec<CandidateValue>> = HashMap::new();
        for (source, raw) in bundles {
            for candidate in FieldSourceAdapter::adapt(*source, raw) {
                by_metric.entry(candidate.metric).or_default().push(candidate);
            }
        }

        // === RESOLVE ===
        let mut record = CanonicalRecord::empty();
        let mut provenance = BTreeMap::new();

        for spec in METRICS.iter().filter(|m| m.origin == MetricOrigin::Resolved) {
            let candidates = by_metric.get(spec.name).map(Vec::as_slice).unwrap_or_default();
            if let Some(resolution) = PrecedenceResolver::resolve_with_source(spec.name, candidates) {
                provenance.insert(spec.name, resolution.source);
                record.set(spec.name, Some(resolution.value));
            }
        }

        // === CLASSIFY ===
        let risk_assessment = match bundles.get(&SourceTag::News) {
            Some(news) => self.classifier.assess(news).await,
            None => None,
        };
        match &risk_assessment {
            Some(assessment) => merge_risk_assessment(&mut record, &mut provenance, assessment),
            None => debug!(request_id = %request_id, "No news text, risk fields stay unresolved"),
        }

        // === ANALYZE ===
        let analysis = self.analyze(request_id, &record).await;

        // === ASSEMBLE ===
        let unresolved_fields: Vec<&'static str> = record
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();

        info!(
            request_id = %request_id,
            resolved = record.resolved_count(),
            unresolved = unresolved_fields.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Consolidation complete"
        );

        Consolidation {
            request_id,
            consolidated_at: Utc::now(),
            record,
            unresolved_fields,
            provenance,
            sources_present: bundles.keys().copied().collect(),
            risk_assessment,
            analysis,
        }
    }

    /// Run the analyzer, if any. A failure is logged and leaves no analysis.
    async fn analyze(
        &self,
        request_id: Uuid,
        record: &CanonicalRecord,
    ) -> Option<InvestmentAnalysis> {
        let analyzer = self.analyzer.as_ref()?;

        if record.resolved_count() == 0 {
            debug!(request_id = %request_id, "Empty record, skipping investment analysis");
            return None;
        }

        match analyzer.analyze(record).await {
            Ok(analysis) => {
                info!(
                    request_id = %request_id,
                    analyzer = analyzer.name(),
                    investment_score = analysis.investment_score,
                    "Investment analysis complete"
                );
                Some(analysis)
            }
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    analyzer = analyzer.name(),
                    error = %e,
                    "Investment analysis failed, omitting it"
                );
                None
            }
        }
    }
}

fn merge_risk_assessment(
    record: &mut CanonicalRecord,
    provenance: &mut BTreeMap<&'static str, SourceTag>,
    assessment: &RiskAssessment,
) {
    let summary = Some(assessment.news_summary.trim())
        .filter(|s| !s.is_empty())
        .map(|s| MetricValue::Text(s.to_string()));

    let fields = [
        (REGULATORY_RISKS, Some(MetricValue::Boolean(assessment.regulatory_risk))),
        (TREND_RISKS, Some(MetricValue::Boolean(assessment.trend_risk))),
        (NEWS_SENTIMENT, Some(MetricValue::from(assessment.sentiment))),
        (NEWS_SUMMARY, summary),
    ];

    for (name, value) in fields {
        if value.is_some() {
            provenance.insert(name, SourceTag::News);
        }
        record.set(name, value);
    }
}
