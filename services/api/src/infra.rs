use district_match::config::RecommendationConfig;
use district_match::recommend::{
    FactorSchema, InfluenceTableCache, PriceTier, RecommendationError, RecommendationService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) services: Arc<ServiceProvider>,
    pub(crate) defaults: RequestDefaults,
}

/// Values applied when a request leaves the tier or diagnostic depth unspecified.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestDefaults {
    pub(crate) tier: PriceTier,
    pub(crate) max_top_k: usize,
}

impl From<&RecommendationConfig> for RequestDefaults {
    fn from(config: &RecommendationConfig) -> Self {
        Self {
            tier: config.default_tier,
            max_top_k: config.max_top_k,
        }
    }
}

/// Hands out a recommendation service over the current influence table.
///
/// The table itself is cached by file fingerprint, so an edited CSV is picked up on the
/// next request while an unchanged one keeps serving the same service instance.
pub(crate) struct ServiceProvider {
    path: PathBuf,
    cache: InfluenceTableCache,
    current: Mutex<Option<Arc<RecommendationService>>>,
}

impl ServiceProvider {
    pub(crate) fn new(path: impl Into<PathBuf>, schema: Arc<FactorSchema>) -> Self {
        Self {
            path: path.into(),
            cache: InfluenceTableCache::new(schema),
            current: Mutex::new(None),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn schema(&self) -> &Arc<FactorSchema> {
        self.cache.schema()
    }

    pub(crate) fn service(&self) -> Result<Arc<RecommendationService>, RecommendationError> {
        let table = self.cache.get_or_load(&self.path)?;

        let mut guard = self.current.lock().expect("service mutex poisoned");
        if let Some(service) = guard.as_ref() {
            if Arc::ptr_eq(service.table(), &table) {
                return Ok(service.clone());
            }
        }

        let service = Arc::new(RecommendationService::seoul(table));
        *guard = Some(service.clone());
        Ok(service)
    }
}

/// Candidate restriction chosen by a caller: one price tier or every district.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TierSelection {
    All,
    Only(PriceTier),
}

impl TierSelection {
    pub(crate) fn tier(self) -> Option<PriceTier> {
        match self {
            TierSelection::All => None,
            TierSelection::Only(tier) => Some(tier),
        }
    }
}

impl fmt::Display for TierSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierSelection::All => f.write_str("all"),
            TierSelection::Only(tier) => write!(f, "{tier}"),
        }
    }
}

pub(crate) fn parse_tier_selection(raw: &str) -> Result<TierSelection, String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("all") || trimmed == "전체" {
        return Ok(TierSelection::All);
    }
    trimmed
        .parse::<PriceTier>()
        .map(TierSelection::Only)
        .map_err(|_| format!("unknown price tier '{raw}' (expected high, mid, low, or all)"))
}

pub(crate) fn deserialize_optional_tier<'de, D>(
    deserializer: D,
) -> Result<Option<TierSelection>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_tier_selection(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Diagnostic depth used when a caller does not ask for one.
pub(crate) const DEFAULT_DIAGNOSTIC_TOP_K: usize = 5;

/// Rejects diagnostic depths outside `1..=max`.
pub(crate) fn validate_top_k(top_k: usize, max: usize) -> Result<usize, RecommendationError> {
    if top_k == 0 || top_k > max {
        return Err(RecommendationError::Range {
            detail: format!("top_k must be between 1 and {max}, got {top_k}"),
        });
    }
    Ok(top_k)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) const SEOUL_TABLE: &str = include_str!("../../../data/influence_normalized.csv");

    /// Writes the bundled table to a temp dir and builds state around it.
    pub(crate) fn state_with_table(dir: &Path) -> AppState {
        let path = dir.join("influence.csv");
        std::fs::write(&path, SEOUL_TABLE).expect("write influence table");
        state_for_path(path)
    }

    pub(crate) fn state_for_path(path: PathBuf) -> AppState {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(recorder.handle()),
            services: Arc::new(ServiceProvider::new(
                path,
                FactorSchema::standard().shared(),
            )),
            defaults: RequestDefaults {
                tier: PriceTier::Mid,
                max_top_k: 10,
            },
        }
    }
}
