//! Source fetcher trait and registry
//!
//! Fetchers wrap the upstream extraction agents (PDF, web search, LinkedIn,
//! news, SEC). Gathering runs them concurrently and turns every failure into
//! an absent bundle: the consolidator only ever sees what arrived.
//!
//! `gather_staged` runs the PDF extraction first and feeds the company name
//! and CEO profile it reports to the remaining fetchers.

use crate::adapter::{decode_once, lookup_path};
use crate::error::ConsolidationError;
use crate::models::{SourceBundles, SourceTag};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// What the fetchers are asked about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchQuery {
    pub company_name: Option<String>,
    pub linkedin_profile: Option<String>,
    pub cik: Option<String>,
    /// Pitch deck text for the PDF extraction agent
    pub document_text: Option<String>,
}

impl FetchQuery {
    pub fn for_company(name: impl Into<String>) -> Self {
        Self {
            company_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Fill the company name and CEO profile from a PDF extraction bundle
    /// where the query does not already carry them.
    pub fn with_pdf_hints(mut self, pdf_bundle: &Value) -> Self {
        if self.company_name.is_none() {
            self.company_name = company_name_hint(pdf_bundle);
        }
        if self.linkedin_profile.is_none() {
            self.linkedin_profile = linkedin_profile_hint(pdf_bundle);
        }
        self
    }
}

/// Trait for a single upstream source
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn source(&self) -> SourceTag;

    /// False for fetchers that ignore the query (replays, fixtures); those
    /// are never skipped for a missing hint.
    fn uses_query(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Value>;
}

/// Registry of fetchers, at most one per source
pub struct FetcherRegistry {
    fetchers: HashMap<SourceTag, Arc<dyn SourceFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self {
            fetchers: HashMap::new(),
        }
    }

    /// Register a fetcher, replacing any previous one for the same source.
    pub fn register(&mut self, fetcher: Arc<dyn SourceFetcher>) {
        self.fetchers.insert(fetcher.source(), fetcher);
    }

    pub fn get(&self, source: SourceTag) -> Option<Arc<dyn SourceFetcher>> {
        self.fetchers.get(&source).cloned()
    }

    /// Registered sources in precedence order
    pub fn list(&self) -> Vec<SourceTag> {
        let mut sources: Vec<SourceTag> = self.fetchers.keys().copied().collect();
        sources.sort();
        sources
    }

    /// One `JsonFileFetcher` per `<source_tag>.json` found in `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        let mut registry = Self::new();
        for source in SourceTag::ALL {
            let path = dir.join(format!("{}.json", source));
            if path.is_file() {
                registry.register(Arc::new(JsonFileFetcher::new(source, path)));
            }
        }
        registry
    }
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run every registered fetcher concurrently, each bounded by `timeout`.
///
/// Errors, timeouts and panics leave that source out of the result.
pub async fn gather_bundles(
    registry: &FetcherRegistry,
    query: &FetchQuery,
    timeout: Duration,
) -> SourceBundles {
    let start_time = Instant::now();
    let sources = registry.list();
    let bundles = fetch_all(registry, &sources, query, timeout).await;

    info!(
        requested = sources.len(),
        received = bundles.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Source bundles gathered"
    );

    bundles
}

/// Gather in two stages: the PDF extraction alone, then every other
/// fetcher concurrently with the query completed from the PDF bundle.
///
/// A query-driven LinkedIn fetcher is skipped without a CEO profile, and a
/// query-driven news fetcher without a company name.
pub async fn gather_staged(
    registry: &FetcherRegistry,
    query: &FetchQuery,
    timeout: Duration,
) -> SourceBundles {
    let start_time = Instant::now();
    let mut query = query.clone();

    // === STAGE 1: PDF ===
    let mut bundles = fetch_all(registry, &[SourceTag::PdfExtraction], &query, timeout).await;
    if let Some(pdf) = bundles.get(&SourceTag::PdfExtraction) {
        query = query.with_pdf_hints(pdf);
        debug!(
            company_name = ?query.company_name,
            linkedin_profile = ?query.linkedin_profile,
            "Query completed from pitch deck"
        );
    }

    // === STAGE 2: everything else ===
    let rest: Vec<SourceTag> = registry
        .list()
        .into_iter()
        .filter(|source| *source != SourceTag::PdfExtraction)
        .filter(|source| {
            let Some(missing) = missing_hint(registry, *source, &query) else {
                return true;
            };
            info!(source = %source, missing, "Skipping source, query lacks a hint");
            false
        })
        .collect();

    bundles.extend(fetch_all(registry, &rest, &query, timeout).await);

    info!(
        requested = registry.list().len(),
        received = bundles.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Source bundles gathered in stages"
    );

    bundles
}

/// The hint a query-driven fetcher for `source` needs but lacks
fn missing_hint(registry: &FetcherRegistry, source: SourceTag, query: &FetchQuery) -> Option<&'static str> {
    let uses_query = registry.get(source).is_some_and(|fetcher| fetcher.uses_query());
    match source {
        SourceTag::Linkedin if uses_query && query.linkedin_profile.is_none() => Some("linkedin_profile"),
        SourceTag::News if uses_query && query.company_name.is_none() => Some("company_name"),
        _ => None,
    }
}

async fn fetch_all(
    registry: &FetcherRegistry,
    sources: &[SourceTag],
    query: &FetchQuery,
    timeout: Duration,
) -> SourceBundles {
    let query = Arc::new(query.clone());
    let mut tasks = JoinSet::new();

    for &source in sources {
        let Some(fetcher) = registry.get(source) else {
            continue;
        };
        let query = Arc::clone(&query);
        tasks.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, fetcher.fetch(&query)).await {
                Ok(result) => result,
                Err(_) => Err(ConsolidationError::SourceUnavailable {
                    source_tag: source,
                    reason: format!("timed out after {:?}", timeout),
                }),
            };
            (source, outcome)
        });
    }

    let mut bundles = SourceBundles::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((source, Ok(payload))) => {
                debug!(source = %source, "Source bundle received");
                bundles.insert(source, payload);
            }
            Ok((source, Err(e))) => {
                warn!(source = %source, error = %e, "Source unavailable, treating as absent");
            }
            Err(e) => {
                warn!(error = %e, "Source fetcher task aborted, treating as absent");
            }
        }
    }

    bundles
}

/// Replays a captured bundle from disk
pub struct JsonFileFetcher {
    source: SourceTag,
    path: PathBuf,
}

impl JsonFileFetcher {
    pub fn new(source: SourceTag, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }
}

#[async_trait]
impl SourceFetcher for JsonFileFetcher {
    fn source(&self) -> SourceTag {
        self.source
    }

    fn uses_query(&self) -> bool {
        false
    }

    async fn fetch(&self, _query: &FetchQuery) -> Result<Value> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&text).map_err(|e| ConsolidationError::SourceUnavailable {
            source_tag: self.source,
            reason: format!("{} is not valid JSON: {}", self.path.display(), e),
        })
    }
}

/// In-memory bundle
pub struct StaticFetcher {
    source: SourceTag,
    payload: Value,
}

impl StaticFetcher {
    pub fn new(source: SourceTag, payload: Value) -> Self {
        Self { source, payload }
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    fn source(&self) -> SourceTag {
        self.source
    }

    fn uses_query(&self) -> bool {
        false
    }

    async fn fetch(&self, _query: &FetchQuery) -> Result<Value> {
        Ok(self.payload.clone())
    }
}

const COMPANY_NAME_PATHS: &[&str] = &[
    "main_category.company_info.company_name",
    "company_info.company_name",
    "company_name",
    "metrics.company_name",
];

const LINKEDIN_PROFILE_PATHS: &[&str] = &[
    "main_category.company_info.linkedin_profile_ceo",
    "company_info.linkedin_profile_ceo",
    "linkedin_profile_ceo",
];

/// Company name reported by a PDF extraction bundle
pub fn company_name_hint(pdf_bundle: &Value) -> Option<String> {
    first_string(pdf_bundle, COMPANY_NAME_PATHS)
}

/// CEO LinkedIn URL reported by a PDF extraction bundle
pub fn linkedin_profile_hint(pdf_bundle: &Value) -> Option<String> {
    first_string(pdf_bundle, LINKEDIN_PROFILE_PATHS)
}

fn first_string(bundle: &Value, paths: &[&str]) -> Option<String> {
    let decoded = decode_once(bundle).ok()?;
    paths
        .iter()
        .filter_map(|path| lookup_path(&decoded, path))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct FailingFetcher(SourceTag);

    #[async_trait]
    impl SourceFetcher for FailingFetcher {
        fn source(&self) -> SourceTag {
            self.0
        }

        async fn fetch(&self, _query: &FetchQuery) -> Result<Value> {
            Err(ConsolidationError::SourceUnavailable {
                source_tag: self.0,
                reason: "quota exceeded".to_string(),
            })
        }
    }

    struct SlowFetcher;

    #[async_trait]
    impl SourceFetcher for SlowFetcher {
        fn source(&self) -> SourceTag {
            SourceTag::Linkedin
        }

        async fn fetch(&self, _query: &FetchQuery) -> Result<Value> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(json!({"name": "too late"}))
        }
    }

    struct PanickingFetcher;

    #[async_trait]
    impl SourceFetcher for PanickingFetcher {
        fn source(&self) -> SourceTag {
            SourceTag::News
        }

        async fn fetch(&self, _query: &FetchQuery) -> Result<Value> {
            panic!("news agent crashed");
        }
    }

    struct EchoQueryFetcher;

    #[async_trait]
    impl SourceFetcher for EchoQueryFetcher {
        fn source(&self) -> SourceTag {
            SourceTag::WebSearch
        }

        async fn fetch(&self, query: &FetchQuery) -> Result<Value> {
            Ok(json!({"company_name": query.company_name}))
        }
    }

    /// Live-style fetcher that remembers every query it was given
    struct RecordingFetcher {
        source: SourceTag,
        seen: Mutex<Vec<FetchQuery>>,
    }

    impl RecordingFetcher {
        fn new(source: SourceTag) -> Arc<Self> {
            Arc::new(Self {
                source,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<FetchQuery> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SourceFetcher for RecordingFetcher {
        fn source(&self) -> SourceTag {
            self.source
        }

        async fn fetch(&self, query: &FetchQuery) -> Result<Value> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(json!({"company_name": query.company_name}))
        }
    }

    #[test]
    fn test_registry_register_and_list() {
        let mut registry = FetcherRegistry::new();
        registry.register(Arc::new(StaticFetcher::new(SourceTag::News, json!({}))));
        registry.register(Arc::new(StaticFetcher::new(SourceTag::PdfExtraction, json!({}))));
        registry.register(Arc::new(StaticFetcher::new(SourceTag::News, json!({"title": "x"}))));

        assert_eq!(registry.list(), vec![SourceTag::PdfExtraction, SourceTag::News]);
        assert!(registry.get(SourceTag::Linkedin).is_none());
    }

    #[tokio::test]
    async fn test_failures_become_absent_bundles() {
        let mut registry = FetcherRegistry::new();
        registry.register(Arc::new(StaticFetcher::new(
            SourceTag::PdfExtraction,
            json!({"company_name": "Acme"}),
        )));
        registry.register(Arc::new(FailingFetcher(SourceTag::FinancialSec)));
        registry.register(Arc::new(SlowFetcher));
        registry.register(Arc::new(PanickingFetcher));

        let bundles = gather_bundles(&registry, &FetchQuery::default(), Duration::from_millis(50)).await;

        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[&SourceTag::PdfExtraction], json!({"company_name": "Acme"}));
    }

    #[tokio::test]
    async fn test_query_reaches_fetchers() {
        let mut registry = FetcherRegistry::new();
        registry.register(Arc::new(EchoQueryFetcher));

        let query = FetchQuery::for_company("Acme");
        let bundles = gather_bundles(&registry, &query, Duration::from_secs(1)).await;

        assert_eq!(bundles[&SourceTag::WebSearch], json!({"company_name": "Acme"}));
    }

    #[tokio::test]
    async fn test_staged_gather_feeds_pdf_hints() {
        let web = RecordingFetcher::new(SourceTag::WebSearch);
        let linkedin = RecordingFetcher::new(SourceTag::Linkedin);
        let news = RecordingFetcher::new(SourceTag::News);

        let mut registry = FetcherRegistry::new();
        registry.register(Arc::new(StaticFetcher::new(
            SourceTag::PdfExtraction,
            json!({"company_info": {
                "company_name": "Acme",
                "linkedin_profile_ceo": "https://linkedin.com/in/jane"
            }}),
        )));
        registry.register(web.clone());
        registry.register(linkedin.clone());
        registry.register(news.clone());

        let bundles = gather_staged(&registry, &FetchQuery::default(), Duration::from_secs(1)).await;

        assert_eq!(bundles.len(), 4);
        assert_eq!(web.seen()[0].company_name.as_deref(), Some("Acme"));
        assert_eq!(
            linkedin.seen()[0].linkedin_profile.as_deref(),
            Some("https://linkedin.com/in/jane")
        );
        assert_eq!(bundles[&SourceTag::News], json!({"company_name": "Acme"}));
    }

    #[tokio::test]
    async fn test_staged_gather_skips_sources_missing_hints() {
        let web = RecordingFetcher::new(SourceTag::WebSearch);
        let linkedin = RecordingFetcher::new(SourceTag::Linkedin);
        let news = RecordingFetcher::new(SourceTag::News);

        let mut registry = FetcherRegistry::new();
        registry.register(Arc::new(StaticFetcher::new(
            SourceTag::PdfExtraction,
            json!({"industry": "Fintech"}),
        )));
        registry.register(web.clone());
        registry.register(linkedin.clone());
        registry.register(news.clone());

        let bundles = gather_staged(&registry, &FetchQuery::default(), Duration::from_secs(1)).await;

        let received: Vec<SourceTag> = bundles.keys().copied().collect();
        assert_eq!(received, vec![SourceTag::PdfExtraction, SourceTag::WebSearch]);
        assert_eq!(web.seen().len(), 1);
        assert!(linkedin.seen().is_empty());
        assert!(news.seen().is_empty());
    }

    #[tokio::test]
    async fn test_staged_gather_keeps_replayed_sources() {
        let mut registry = FetcherRegistry::new();
        registry.register(Arc::new(StaticFetcher::new(SourceTag::Linkedin, json!({"name": "Jane"}))));
        registry.register(Arc::new(StaticFetcher::new(SourceTag::News, json!({"title": "Acme"}))));

        let bundles = gather_staged(&registry, &FetchQuery::default(), Duration::from_secs(1)).await;

        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[&SourceTag::Linkedin], json!({"name": "Jane"}));
    }

    #[tokio::test]
    async fn test_json_file_fetcher() {
        let dir = std::env::temp_dir().join(format!("consolidate-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("news.json"), r#"{"title": "Acme faces lawsuit"}"#).unwrap();
        std::fs::write(dir.join("linkedin.json"), "not json").unwrap();
        std::fs::write(dir.join("notes.json"), "{}").unwrap();

        let registry = FetcherRegistry::from_dir(&dir);
        assert_eq!(registry.list(), vec![SourceTag::Linkedin, SourceTag::News]);

        let bundles = gather_bundles(&registry, &FetchQuery::default(), Duration::from_secs(5)).await;
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[&SourceTag::News]["title"], json!("Acme faces lawsuit"));

        let missing = JsonFileFetcher::new(SourceTag::WebSearch, dir.join("web_search.json"));
        assert!(matches!(
            missing.fetch(&FetchQuery::default()).await,
            Err(ConsolidationError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_pdf_hints() {
        let executor_shape = json!({
            "main_category": {
                "company_info": {
                    "company_name": "Acme",
                    "linkedin_profile_ceo": "https://linkedin.com/in/jane"
                }
            }
        });
        assert_eq!(company_name_hint(&executor_shape).as_deref(), Some("Acme"));
        assert_eq!(
            linkedin_profile_hint(&executor_shape).as_deref(),
            Some("https://linkedin.com/in/jane")
        );

        let flat = json!(r#"{"company_name": "  ", "metrics": {"company_name": "Beta"}}"#);
        assert_eq!(company_name_hint(&flat).as_deref(), Some("Beta"));
        assert_eq!(linkedin_profile_hint(&flat), None);
    }

    #[test]
    fn test_query_keeps_explicit_values_over_hints() {
        let pdf = json!({"company_name": "FromDeck", "linkedin_profile_ceo": "https://linkedin.com/in/ceo"});
        let query = FetchQuery::for_company("Explicit").with_pdf_hints(&pdf);

        assert_eq!(query.company_name.as_deref(), Some("Explicit"));
        assert_eq!(query.linkedin_profile.as_deref(), Some("https://linkedin.com/in/ceo"));
    }
}
