use super::error::RecommendationError;
use super::schema::FactorSchema;
use super::table::InfluenceTable;
use super::weights::WeightVector;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// One district's position in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDistrict {
    pub rank: usize,
    pub district: String,
    pub score: f64,
}

/// Districts ordered by descending weighted score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedResult {
    entries: Vec<RankedDistrict>,
}

impl RankedResult {
    pub fn entries(&self) -> &[RankedDistrict] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self, limit: usize) -> &[RankedDistrict] {
        &self.entries[..limit.min(self.entries.len())]
    }
}

/// Stateless scorer binding one weight vector to a factor domain.
///
/// The factor domain is checked when the engine is built and again once per ranked table,
/// never per row.
#[derive(Debug)]
pub struct ScoringEngine {
    weights: WeightVector,
}

impl ScoringEngine {
    pub fn new(
        table_schema: &FactorSchema,
        weights: WeightVector,
    ) -> Result<Self, RecommendationError> {
        ensure_same_domain(table_schema, weights.schema())?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn score_row(&self, values: &[f64]) -> f64 {
        values
            .iter()
            .zip(self.weights.weights())
            .fold(0.0, |total, (value, weight)| total + value * weight)
    }

    pub fn rank(&self, table: &InfluenceTable) -> Result<RankedResult, RecommendationError> {
        if !Arc::ptr_eq(table.schema(), self.weights.schema()) {
            ensure_same_domain(table.schema(), self.weights.schema())?;
        }

        let mut scored: Vec<(String, f64)> = table
            .rows()
            .iter()
            .map(|row| (row.district().to_string(), self.score_row(row.values())))
            .collect();

        // Vec::sort_by is stable, so equal scores keep table order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let entries = scored
            .into_iter()
            .enumerate()
            .map(|(index, (district, score))| RankedDistrict {
                rank: index + 1,
                district,
                score,
            })
            .collect();

        Ok(RankedResult { entries })
    }
}

fn ensure_same_domain(
    table_schema: &FactorSchema,
    weight_schema: &FactorSchema,
) -> Result<(), RecommendationError> {
    if table_schema.columns().eq(weight_schema.columns()) {
        return Ok(());
    }

    let expected = table_schema.column_names();
    let actual = weight_schema.column_names();
    tracing::error!(
        ?expected,
        ?actual,
        "weight vector and influence table disagree on factor domain"
    );
    Err(RecommendationError::SchemaMismatch { expected, actual })
}
