//! Risk / Sentiment Classifier
//!
//! Derives the four news-owned record fields from the news bundle:
//! - Keyword pass: regulatory and disruption vocabularies over the article text
//! - LLM fallback: consulted once, and only when the keyword pass flagged nothing
//!
//! The keyword pass is authoritative when it fires. The fallback fails open.

use crate::adapter::decode_once;
use crate::models::{RiskAssessment, Sentiment};
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod gemini;

pub use gemini::GeminiRiskFallback;

/// Static keyword lists, matched as lower-case word prefixes
const REGULATORY_TERMS: &[&str] = &[
    // Oversight
    "regulation", "regulatory", "regulator", "compliance", "gdpr",
    // Legal action
    "lawsuit", "sued", "litigation", "class action", "indictment", "subpoena",
    // Enforcement
    "antitrust", "investigation", "inquiry", "penalty", "fined", "sanction",
    // Incidents
    "data breach",
];

const TREND_TERMS: &[&str] = &[
    // Market shifts
    "disrupt", "obsolete", "outdated", "losing market share", "saturat",
    // Contraction
    "decline", "downturn", "slowdown", "shrinking", "layoff",
];

lazy_static! {
    // A term must start a word: "sued" is not in "issued", "fined" not in "defined"
    static ref REGULATORY_REGEX: Regex = term_regex(REGULATORY_TERMS);
    static ref TREND_REGEX: Regex = term_regex(TREND_TERMS);
}

fn term_regex(terms: &[&str]) -> Regex {
    let alternatives: Vec<String> = terms.iter().map(|t| regex::escape(t)).collect();
    Regex::new(&format!(r"\b(?:{})", alternatives.join("|"))).unwrap()
}

/// Flags reported by an LLM fallback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackFlags {
    pub regulatory_risk: bool,
    pub trend_risk: bool,
}

/// Second-tier risk detector consulted when no keyword matched
#[async_trait]
pub trait RiskFallback: Send + Sync {
    fn name(&self) -> &'static str;

    /// A disabled fallback is never called
    fn is_enabled(&self) -> bool {
        true
    }

    async fn detect(&self, search_text: &str) -> Result<FallbackFlags>;
}

/// Fallback that never flags anything (keyword pass only)
pub struct NoFallback;

#[async_trait]
impl RiskFallback for NoFallback {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn detect(&self, _search_text: &str) -> Result<FallbackFlags> {
        Ok(FallbackFlags::default())
    }
}

/// Risk classifier
pub struct RiskClassifier {
    fallback: Arc<dyn RiskFallback>,
}

impl RiskClassifier {
    pub fn new(fallback: Arc<dyn RiskFallback>) -> Self {
        Self { fallback }
    }

    pub fn keyword_only() -> Self {
        Self::new(Arc::new(NoFallback))
    }

    /// Classify a news bundle. Never fails: a bundle with no article text
    /// yields neutral sentiment, no flags and an empty summary.
    pub async fn classify(&self, news_bundle: &Value) -> RiskAssessment {
        self.assess(news_bundle)
            .await
            .unwrap_or_else(|| RiskAssessment {
                regulatory_risk: false,
                trend_risk: false,
                sentiment: Sentiment::Neutral,
                news_summary: String::new(),
                fallback_invoked: false,
            })
    }

    /// Like [`classify`](Self::classify), but `None` when the bundle carries
    /// no article text to judge (undecodable, empty, or not articles).
    pub async fn assess(&self, news_bundle: &Value) -> Option<RiskAssessment> {
        let articles = articles_of(news_bundle);
        let search_text = search_text(&articles);

        if search_text.trim().is_empty() {
            debug!(article_count = articles.len(), "News bundle has no text to judge");
            return None;
        }

        let mut assessment = RiskAssessment {
            regulatory_risk: REGULATORY_REGEX.is_match(&search_text),
            trend_risk: TREND_REGEX.is_match(&search_text),
            sentiment: sentiment_from_tone(first_text(&articles, &["tone"])),
            news_summary: first_text(&articles, &["summary", "description", "title"])
                .unwrap_or_default()
                .to_string(),
            fallback_invoked: false,
        };

        debug!(
            article_count = articles.len(),
            regulatory_risk = assessment.regulatory_risk,
            trend_risk = assessment.trend_risk,
            "Keyword pass complete"
        );

        if assessment.regulatory_risk || assessment.trend_risk || !self.fallback.is_enabled() {
            return Some(assessment);
        }

        assessment.fallback_invoked = true;
        match self.fallback.detect(&search_text).await {
            Ok(flags) => {
                info!(
                    fallback = self.fallback.name(),
                    regulatory_risk = flags.regulatory_risk,
                    trend_risk = flags.trend_risk,
                    "Risk fallback answered"
                );
                assessment.regulatory_risk = flags.regulatory_risk;
                assessment.trend_risk = flags.trend_risk;
            }
            Err(e) => {
                warn!(
                    fallback = self.fallback.name(),
                    error = %e,
                    "Risk fallback failed, keeping keyword result"
                );
            }
        }

        Some(assessment)
    }
}

/// Article objects carried by a news bundle: a single flat article, an
/// `{articles: [...]}` listing, or a bare array.
fn articles_of(bundle: &Value) -> Vec<Value> {
    let decoded = match decode_once(bundle) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!(error = %e, "News bundle dropped");
            return Vec::new();
        }
    };

    let items = match decoded {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("articles") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(map)],
        },
        _ => Vec::new(),
    };

    items.into_iter().filter(Value::is_object).collect()
}

fn search_text(articles: &[Value]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for article in articles {
        for key in ["title", "description", "summary"] {
            if let Some(text) = article.get(key).and_then(Value::as_str) {
                parts.push(text.to_string());
            }
        }
        match article.get("keywords") {
            Some(Value::String(s)) => parts.push(s.clone()),
            Some(Value::Array(items)) => {
                parts.extend(items.iter().filter_map(Value::as_str).map(str::to_string))
            }
            _ => {}
        }
    }
    parts.join(" ").to_lowercase()
}

/// First non-blank string found, trying each article in turn and each key
/// within an article in order.
fn first_text<'a>(articles: &'a [Value], keys: &[&str]) -> Option<&'a str> {
    articles.iter().find_map(|article| {
        keys.iter()
            .filter_map(|key| article.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
    })
}

fn sentiment_from_tone(tone: Option<&str>) -> Sentiment {
    let tone = tone.unwrap_or_default().to_lowercase();
    if tone.contains("positive") {
        Sentiment::Positive
    } else if tone.contains("negative") {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CountingFallback;
    use super::*;
    use serde_json::json;

    fn classifier_with(fallback: &Arc<CountingFallback>) -> RiskClassifier {
        RiskClassifier::new(fallback.clone())
    }

    #[tokio::test]
    async fn test_keyword_hit_skips_fallback() {
        let fallback = Arc::new(CountingFallback::answering(FallbackFlags::default()));
        let bundle = json!({"title": "SEC investigation into Acme", "tone": "negative"});

        let assessment = classifier_with(&fallback).classify(&bundle).await;

        assert!(assessment.regulatory_risk);
        assert!(!assessment.trend_risk);
        assert_eq!(assessment.sentiment, Sentiment::Negative);
        assert!(!assessment.fallback_invoked);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_neutral_text_calls_fallback_once() {
        let fallback = Arc::new(CountingFallback::answering(FallbackFlags {
            regulatory_risk: false,
            trend_risk: true,
        }));
        let bundle = json!({"title": "Acme opens a new office", "description": "Hiring in Berlin"});

        let assessment = classifier_with(&fallback).classify(&bundle).await;

        assert_eq!(fallback.call_count(), 1);
        assert!(assessment.fallback_invoked);
        assert!(assessment.trend_risk);
        assert!(!assessment.regulatory_risk);
        let prompts = fallback.prompts.lock().unwrap();
        assert!(prompts[0].contains("acme opens a new office"));
    }

    #[tokio::test]
    async fn test_terms_match_on_word_start() {
        let fallback = Arc::new(CountingFallback::answering(FallbackFlags::default()));
        let bundle = json!({
            "title": "Acme issued its annual report",
            "description": "A well defined roadmap"
        });

        let assessment = classifier_with(&fallback).classify(&bundle).await;

        assert!(!assessment.regulatory_risk);
        assert!(!assessment.trend_risk);
        assert_eq!(fallback.call_count(), 1);

        let classifier = RiskClassifier::keyword_only();
        let sued = json!({"title": "Acme sued by former partner"});
        let fined = json!({"title": "Acme fined for late filings"});
        assert!(classifier.classify(&sued).await.regulatory_risk);
        assert!(classifier.classify(&fined).await.regulatory_risk);
    }

    #[tokio::test]
    async fn test_disabled_fallback_is_not_invoked() {
        let classifier = RiskClassifier::keyword_only();
        let bundle = json!({"title": "Acme opens a new office"});

        let assessment = classifier.classify(&bundle).await;

        assert!(!assessment.fallback_invoked);
        assert!(!assessment.regulatory_risk);
        assert!(!assessment.trend_risk);
        assert!(!NoFallback.is_enabled());
    }

    #[tokio::test]
    async fn test_assess_without_text_is_none() {
        let classifier = RiskClassifier::keyword_only();

        for bundle in [json!("{broken"), json!({}), json!([]), json!({"articles": []})] {
            assert!(classifier.assess(&bundle).await.is_none());
        }
        assert!(classifier.assess(&json!({"title": "Acme"})).await.is_some());
    }

    #[tokio::test]
    async fn test_fallback_failure_fails_open() {
        let fallback = Arc::new(CountingFallback::failing());
        let bundle = json!({"title": "Acme ships version 2"});

        let assessment = classifier_with(&fallback).classify(&bundle).await;

        assert_eq!(fallback.call_count(), 1);
        assert!(!assessment.regulatory_risk);
        assert!(!assessment.trend_risk);
    }

    #[tokio::test]
    async fn test_trend_terms() {
        let classifier = RiskClassifier::keyword_only();
        let bundle = json!({"description": "Market saturation and layoffs hit the sector"});

        let assessment = classifier.classify(&bundle).await;
        assert!(assessment.trend_risk);
        assert!(!assessment.regulatory_risk);
    }

    #[tokio::test]
    async fn test_keywords_field_is_searched() {
        let classifier = RiskClassifier::keyword_only();
        let listed = json!({"title": "Acme update", "keywords": ["GDPR", "privacy"]});
        let joined = json!({"title": "Acme update", "keywords": "funding, antitrust"});

        assert!(classifier.classify(&listed).await.regulatory_risk);
        assert!(classifier.classify(&joined).await.regulatory_risk);
    }

    #[tokio::test]
    async fn test_articles_listing_shape() {
        let classifier = RiskClassifier::keyword_only();
        let bundle = json!({
            "query": "Acme",
            "totalResults": 2,
            "articles": [
                {"title": "Acme raises Series A", "description": null},
                {"title": "Acme faces class action", "description": "Investors sue"}
            ]
        });

        let assessment = classifier.classify(&bundle).await;
        assert!(assessment.regulatory_risk);
        assert_eq!(assessment.news_summary, "Acme raises Series A");
        assert_eq!(assessment.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_bare_array_and_encoded_string_shapes() {
        let classifier = RiskClassifier::keyword_only();

        let array = json!([{"title": "Regulator fines Acme"}]);
        let assessment = tokio_test::block_on(classifier.classify(&array));
        assert!(assessment.regulatory_risk);

        let encoded = json!(r#"{"title": "Acme", "summary": "Steady quarter", "tone": "Positive"}"#);
        let assessment = tokio_test::block_on(classifier.classify(&encoded));
        assert_eq!(assessment.sentiment, Sentiment::Positive);
        assert_eq!(assessment.news_summary, "Steady quarter");
    }

    #[tokio::test]
    async fn test_summary_prefers_summary_then_description_then_title() {
        let classifier = RiskClassifier::keyword_only();

        let described = json!({"title": "T", "description": "D", "summary": "  "});
        assert_eq!(classifier.classify(&described).await.news_summary, "D");

        let titled = json!({"title": "T"});
        assert_eq!(classifier.classify(&titled).await.news_summary, "T");
    }

    #[tokio::test]
    async fn test_empty_or_malformed_bundle() {
        let fallback = Arc::new(CountingFallback::answering(FallbackFlags {
            regulatory_risk: true,
            trend_risk: true,
        }));
        let classifier = classifier_with(&fallback);

        for bundle in [json!("{broken"), json!({}), json!(42)] {
            let assessment = classifier.classify(&bundle).await;
            assert!(!assessment.regulatory_risk);
            assert_eq!(assessment.sentiment, Sentiment::Neutral);
            assert!(assessment.news_summary.is_empty());
        }
        // nothing to judge, so the model is never asked
        assert_eq!(fallback.call_count(), 0);
    }

    #[test]
    fn test_sentiment_first_match_wins() {
        assert_eq!(sentiment_from_tone(Some("Very POSITIVE")), Sentiment::Positive);
        assert_eq!(sentiment_from_tone(Some("negative")), Sentiment::Negative);
        assert_eq!(sentiment_from_tone(Some("positive but negative")), Sentiment::Positive);
        assert_eq!(sentiment_from_tone(Some("mixed")), Sentiment::Neutral);
        assert_eq!(sentiment_from_tone(None), Sentiment::Neutral);
    }
}
