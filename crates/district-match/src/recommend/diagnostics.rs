use super::error::RecommendationError;
use super::table::{DistrictRow, InfluenceTable};
use serde::Serialize;
use std::cmp::Ordering;

/// A factor pulling a district's satisfaction down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegativeContribution {
    pub factor: String,
    pub value: f64,
}

/// Strongest adverse factors for one district.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictNegativeReport {
    pub district: String,
    pub contributions: Vec<NegativeContribution>,
}

/// Up to `k` factors of `district` with negative influence, strongest first.
pub fn top_negative(
    table: &InfluenceTable,
    district: &str,
    k: usize,
) -> Result<Vec<NegativeContribution>, RecommendationError> {
    ensure_positive(k)?;
    let row = table
        .row(district)
        .ok_or_else(|| RecommendationError::UnknownDistrict {
            district: district.trim().to_string(),
        })?;
    Ok(extract(table, row, k))
}

/// [`top_negative`] for every district, in table order.
pub fn negative_report(
    table: &InfluenceTable,
    k: usize,
) -> Result<Vec<DistrictNegativeReport>, RecommendationError> {
    ensure_positive(k)?;
    Ok(table
        .rows()
        .iter()
        .map(|row| DistrictNegativeReport {
            district: row.district().to_string(),
            contributions: extract(table, row, k),
        })
        .collect())
}

fn ensure_positive(k: usize) -> Result<(), RecommendationError> {
    if k == 0 {
        return Err(RecommendationError::range("top-k must be at least 1"));
    }
    Ok(())
}

fn extract(table: &InfluenceTable, row: &DistrictRow, k: usize) -> Vec<NegativeContribution> {
    let mut negatives: Vec<NegativeContribution> = table
        .schema()
        .columns()
        .zip(row.values())
        .filter(|(_, value)| **value < 0.0)
        .map(|(factor, value)| NegativeContribution {
            factor: factor.to_string(),
            value: *value,
        })
        .collect();

    negatives.sort_by(|a, b| {
        b.value
            .abs()
            .partial_cmp(&a.value.abs())
            .unwrap_or(Ordering::Equal)
    });
    negatives.truncate(k);
    negatives
}
