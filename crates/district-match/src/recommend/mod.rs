//! Preference-weighted district scoring, tier filtering, and adverse-factor diagnostics.
//!
//! Everything here operates on an immutable [`InfluenceTable`] shared by `Arc`. The table is
//! loaded once per file identity through [`InfluenceTableCache`] and every operation afterwards
//! is a pure function of its inputs.

mod diagnostics;
mod directory;
pub mod error;
mod schema;
mod scoring;
mod service;
pub mod table;
pub mod views;
mod weights;

pub use diagnostics::{negative_report, top_negative, DistrictNegativeReport, NegativeContribution};
pub use directory::{filter_by_tier, DistrictDirectory, DistrictProfile, PriceTier, TierMap};
pub use error::RecommendationError;
pub use schema::{FactorSchema, FactorSpec};
pub use scoring::{RankedDistrict, RankedResult, ScoringEngine};
pub use service::{
    Recommendation, RecommendationRequest, RecommendationService, DEFAULT_RECOMMENDATION_LIMIT,
};
pub use table::{DistrictRow, InfluenceTable, InfluenceTableCache};
pub use views::{DistrictView, RecommendedDistrictView, WeightView};
pub use weights::{SurveyAnswers, WeightVector, DEFAULT_ANSWER, MAX_ANSWER, MIN_ANSWER};
