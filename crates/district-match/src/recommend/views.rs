use super::directory::PriceTier;
use serde::Serialize;

/// Normalized weight assigned to one factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightView {
    pub factor: String,
    pub weight: f64,
}

/// A surfaced recommendation with the district's public profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedDistrictView {
    pub rank: usize,
    pub district: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<PriceTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_label: Option<&'static str>,
    pub homepage: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictView {
    pub district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<PriceTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_label: Option<&'static str>,
}
