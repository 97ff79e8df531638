use std::sync::Arc;

use super::diagnostics::{negative_report, top_negative, DistrictNegativeReport};
use super::directory::{filter_by_tier, DistrictDirectory, PriceTier, TierMap};
use super::error::RecommendationError;
use super::schema::FactorSchema;
use super::scoring::{RankedResult, ScoringEngine};
use super::table::InfluenceTable;
use super::views::{DistrictView, RecommendedDistrictView, WeightView};
use super::weights::{SurveyAnswers, WeightVector};

/// Number of districts surfaced when a request does not say otherwise.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;

/// Survey answers plus the candidate restriction for one recommendation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub answers: SurveyAnswers,
    pub tier: Option<PriceTier>,
    pub limit: usize,
}

impl RecommendationRequest {
    pub fn new(answers: SurveyAnswers) -> Self {
        Self {
            answers,
            tier: None,
            limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }

    pub fn with_tier(mut self, tier: Option<PriceTier>) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Full ranking for one request along with the surfaced top districts.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub tier: Option<PriceTier>,
    pub weights: WeightVector,
    pub ranking: RankedResult,
    pub top: Vec<RecommendedDistrictView>,
}

impl Recommendation {
    pub fn weight_views(&self) -> Vec<WeightView> {
        self.weights
            .iter()
            .map(|(factor, weight)| WeightView {
                factor: factor.to_string(),
                weight,
            })
            .collect()
    }
}

/// Service composing tier filtering, scoring, and diagnostics over one shared table.
pub struct RecommendationService {
    table: Arc<InfluenceTable>,
    tiers: TierMap,
    directory: DistrictDirectory,
}

impl RecommendationService {
    pub fn new(table: Arc<InfluenceTable>, tiers: TierMap, directory: DistrictDirectory) -> Self {
        let untiered: Vec<&str> = table
            .districts()
            .filter(|district| tiers.tier_of(district).is_none())
            .collect();
        if !untiered.is_empty() {
            tracing::warn!(
                districts = ?untiered,
                "districts without a price tier are excluded from tier-filtered rankings"
            );
        }

        Self {
            table,
            tiers,
            directory,
        }
    }

    /// Service backed by the Seoul tier assignments and district profiles.
    pub fn seoul(table: Arc<InfluenceTable>) -> Self {
        Self::new(table, TierMap::seoul(), DistrictDirectory::seoul())
    }

    pub fn table(&self) -> &Arc<InfluenceTable> {
        &self.table
    }

    pub fn schema(&self) -> &Arc<FactorSchema> {
        self.table.schema()
    }

    pub fn tiers(&self) -> &TierMap {
        &self.tiers
    }

    /// Scores the (optionally tier-filtered) table against the request's answers.
    pub fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Recommendation, RecommendationError> {
        if request.limit == 0 {
            return Err(RecommendationError::range(
                "recommendation limit must be at least 1",
            ));
        }

        let weights = WeightVector::from_answers(self.schema(), &request.answers)?;
        let engine = ScoringEngine::new(self.schema(), weights)?;

        let ranking = match request.tier {
            Some(tier) => engine.rank(&filter_by_tier(&self.table, &self.tiers, tier))?,
            None => engine.rank(&self.table)?,
        };

        let top = ranking
            .top(request.limit)
            .iter()
            .map(|entry| {
                let tier = self.tiers.tier_of(&entry.district);
                let profile = self.directory.profile(&entry.district);
                RecommendedDistrictView {
                    rank: entry.rank,
                    district: entry.district.clone(),
                    score: entry.score,
                    tier,
                    tier_label: tier.map(PriceTier::label),
                    homepage: profile.homepage,
                    summary: profile.summary,
                }
            })
            .collect();

        tracing::debug!(
            tier = ?request.tier,
            candidates = ranking.len(),
            zero_weights = engine.weights().is_zero(),
            "recommendation computed"
        );

        Ok(Recommendation {
            tier: request.tier,
            weights: engine.weights().clone(),
            ranking,
            top,
        })
    }

    pub fn diagnose(
        &self,
        district: &str,
        k: usize,
    ) -> Result<DistrictNegativeReport, RecommendationError> {
        let contributions = top_negative(&self.table, district, k)?;
        Ok(DistrictNegativeReport {
            district: district.trim().to_string(),
            contributions,
        })
    }

    pub fn diagnose_all(&self, k: usize) -> Result<Vec<DistrictNegativeReport>, RecommendationError> {
        negative_report(&self.table, k)
    }

    /// Districts in lexical order with their tier, for selectors.
    pub fn districts(&self) -> Vec<DistrictView> {
        self.table
            .sorted_districts()
            .into_iter()
            .map(|district| {
                let tier = self.tiers.tier_of(&district);
                DistrictView {
                    district,
                    tier,
                    tier_label: tier.map(PriceTier::label),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::directory::DistrictProfile;

    fn service() -> RecommendationService {
        let schema = FactorSchema::from_columns(["f1", "f2"]).shared();
        let table = InfluenceTable::from_rows(
            &schema,
            [
                ("A", vec![0.8, -0.3]),
                ("B", vec![-0.5, 0.9]),
                ("C", vec![0.1, 0.1]),
                ("D", vec![0.3, 0.3]),
            ],
        )
        .expect("valid table");
        let tiers = TierMap::new([
            ("A", PriceTier::High),
            ("B", PriceTier::High),
            ("C", PriceTier::Low),
        ]);
        let directory = DistrictDirectory::new([(
            "A",
            DistrictProfile {
                homepage: "https://a.example".to_string(),
                summary: "district a".to_string(),
            },
        )]);
        RecommendationService::new(Arc::new(table), tiers, directory)
    }

    fn answers(service: &RecommendationService, values: &[u8]) -> SurveyAnswers {
        SurveyAnswers::from_ordered(service.schema(), values).expect("answers")
    }

    #[test]
    fn recommends_across_all_districts_by_default() {
        let service = service();
        let request = RecommendationRequest::new(answers(&service, &[5, 5]));

        let recommendation = service.recommend(&request).expect("recommendation");

        let order: Vec<&str> = recommendation
            .ranking
            .entries()
            .iter()
            .map(|entry| entry.district.as_str())
            .collect();
        assert_eq!(order, vec!["D", "A", "B", "C"]);
        assert_eq!(recommendation.top.len(), DEFAULT_RECOMMENDATION_LIMIT);
        assert_eq!(recommendation.top[1].homepage, "https://a.example");
        assert_eq!(recommendation.top[0].homepage, "#");
        assert_eq!(recommendation.top[0].tier, None);
    }

    #[test]
    fn tier_restricts_candidates() {
        let service = service();
        let request = RecommendationRequest::new(answers(&service, &[5, 5]))
            .with_tier(Some(PriceTier::High))
            .with_limit(5);

        let recommendation = service.recommend(&request).expect("recommendation");

        assert_eq!(recommendation.ranking.len(), 2);
        assert_eq!(recommendation.top.len(), 2);
        assert_eq!(recommendation.top[0].district, "A");
        assert_eq!(recommendation.top[0].tier_label, Some("상"));
    }

    #[test]
    fn empty_tier_yields_empty_recommendation() {
        let service = service();
        let request = RecommendationRequest::new(answers(&service, &[3, 4]))
            .with_tier(Some(PriceTier::Mid));

        let recommendation = service.recommend(&request).expect("recommendation");
        assert!(recommendation.ranking.is_empty());
        assert!(recommendation.top.is_empty());
    }

    #[test]
    fn invalid_inputs_abort_the_pass() {
        let service = service();
        let zero_limit = RecommendationRequest::new(answers(&service, &[3, 3])).with_limit(0);
        assert!(matches!(
            service.recommend(&zero_limit),
            Err(RecommendationError::Range { .. })
        ));

        let out_of_range = RecommendationRequest::new(answers(&service, &[3, 9]));
        assert!(matches!(
            service.recommend(&out_of_range),
            Err(RecommendationError::Range { .. })
        ));
    }

    #[test]
    fn weight_views_follow_schema_order() {
        let service = service();
        let recommendation = service
            .recommend(&RecommendationRequest::new(answers(&service, &[5, 3])))
            .expect("recommendation");
        let views = recommendation.weight_views();
        assert_eq!(views[0].factor, "f1");
        assert!((views[0].weight - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn diagnostics_delegate_to_the_shared_table() {
        let service = service();
        let report = service.diagnose("A", 5).expect("diagnose");
        assert_eq!(report.district, "A");
        assert_eq!(report.contributions.len(), 1);
        assert_eq!(report.contributions[0].factor, "f2");

        let all = service.diagnose_all(1).expect("bulk");
        assert_eq!(all.len(), 4);
        assert!(matches!(
            service.diagnose("Z", 1),
            Err(RecommendationError::UnknownDistrict { .. })
        ));
    }

    #[test]
    fn districts_are_sorted_with_tiers() {
        let districts = service().districts();
        assert_eq!(districts[0].district, "A");
        assert_eq!(districts[0].tier, Some(PriceTier::High));
        assert_eq!(districts[3].district, "D");
        assert_eq!(districts[3].tier, None);
    }
}
