use super::error::RecommendationError;
use super::schema::FactorSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const MIN_ANSWER: u8 = 1;
pub const MAX_ANSWER: u8 = 5;
/// Slider position a survey starts from before the user touches it.
pub const DEFAULT_ANSWER: u8 = 3;

/// Raw 1–5 importance answers keyed by factor column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyAnswers(BTreeMap<String, u8>);

impl SurveyAnswers {
    /// Every schema factor answered with the same value.
    pub fn uniform(schema: &FactorSchema, answer: u8) -> Self {
        Self(
            schema
                .columns()
                .map(|column| (column.to_string(), answer))
                .collect(),
        )
    }

    pub fn with_defaults(schema: &FactorSchema) -> Self {
        Self::uniform(schema, DEFAULT_ANSWER)
    }

    /// Answers given positionally, one per schema factor in schema order.
    pub fn from_ordered(schema: &FactorSchema, answers: &[u8]) -> Result<Self, RecommendationError> {
        if answers.len() != schema.len() {
            return Err(RecommendationError::range(format!(
                "expected {} survey answers, got {}",
                schema.len(),
                answers.len()
            )));
        }

        Ok(Self(
            schema
                .columns()
                .zip(answers)
                .map(|(column, answer)| (column.to_string(), *answer))
                .collect(),
        ))
    }

    /// Answers keyed by factor name; keys outside the schema are rejected.
    ///
    /// Values arrive as raw numbers so that negative, fractional, or oversized answers
    /// surface as range errors naming the factor.
    pub fn from_map(
        schema: &FactorSchema,
        answers: BTreeMap<String, f64>,
    ) -> Result<Self, RecommendationError> {
        let mut validated = BTreeMap::new();
        for (factor, answer) in answers {
            let factor = factor.trim().to_string();
            if schema.position(&factor).is_none() {
                return Err(RecommendationError::UnknownFactor { factor });
            }
            if validated.contains_key(&factor) {
                return Err(RecommendationError::range(format!(
                    "factor '{factor}' is answered more than once"
                )));
            }
            let in_scale = answer.fract() == 0.0
                && (f64::from(MIN_ANSWER)..=f64::from(MAX_ANSWER)).contains(&answer);
            if !in_scale {
                return Err(RecommendationError::range(format!(
                    "answer {answer} for '{factor}' must be a whole number between {MIN_ANSWER} and {MAX_ANSWER}"
                )));
            }
            validated.insert(factor, answer as u8);
        }
        Ok(Self(validated))
    }

    /// Fills unanswered schema factors with `answer`, leaving given answers untouched.
    pub fn fill_missing(mut self, schema: &FactorSchema, answer: u8) -> Self {
        for column in schema.columns() {
            self.0.entry(column.to_string()).or_insert(answer);
        }
        self
    }

    pub fn get(&self, factor: &str) -> Option<u8> {
        self.0.get(factor).copied()
    }

    pub fn insert(&mut self, factor: impl Into<String>, answer: u8) -> Option<u8> {
        self.0.insert(factor.into(), answer)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Preference weights over the schema factors, non-negative and summing to one.
///
/// When every answer is the minimum the vector is all zero rather than uniform, so every
/// district scores zero and ranking falls back to table order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    schema: Arc<FactorSchema>,
    weights: Vec<f64>,
}

impl WeightVector {
    pub fn from_answers(
        schema: &Arc<FactorSchema>,
        answers: &SurveyAnswers,
    ) -> Result<Self, RecommendationError> {
        let mut weights = Vec::with_capacity(schema.len());

        for column in schema.columns() {
            let answer = answers
                .get(column)
                .ok_or_else(|| RecommendationError::MissingAnswer {
                    factor: column.to_string(),
                })?;
            if !(MIN_ANSWER..=MAX_ANSWER).contains(&answer) {
                return Err(RecommendationError::range(format!(
                    "answer {answer} for '{column}' must be between {MIN_ANSWER} and {MAX_ANSWER}"
                )));
            }
            weights.push(f64::from(answer - MIN_ANSWER) / f64::from(MAX_ANSWER - MIN_ANSWER));
        }

        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for weight in &mut weights {
                *weight /= total;
            }
        }

        Ok(Self {
            schema: Arc::clone(schema),
            weights,
        })
    }

    pub fn schema(&self) -> &Arc<FactorSchema> {
        &self.schema
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weight(&self, factor: &str) -> Option<f64> {
        self.schema.position(factor).map(|index| self.weights[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema.columns().zip(self.weights.iter().copied())
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.weights.iter().all(|weight| *weight == 0.0)
    }
}
