use super::DistrictRow;
use crate::recommend::error::RecommendationError;
use crate::recommend::schema::FactorSchema;
use std::collections::HashSet;
use std::io::Read;

pub(crate) fn parse_rows<R: Read>(
    reader: R,
    schema: &FactorSchema,
) -> Result<Vec<DistrictRow>, RecommendationError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(clean_cell).collect();
    let columns = project_columns(&headers, schema)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let district = clean_cell(record.get(0).unwrap_or_default());
        if district.is_empty() {
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            return Err(RecommendationError::DataFormat {
                district: format!("<row at line {line}>"),
                factor: district_header(&headers),
                value: String::new(),
            });
        }

        if !seen.insert(district.clone()) {
            return Err(RecommendationError::DuplicateDistrict { district });
        }

        let mut values = Vec::with_capacity(columns.len());
        for (spec, &index) in schema.factors().iter().zip(&columns) {
            let raw = record.get(index).unwrap_or_default();
            values.push(parse_coefficient(raw).ok_or_else(|| {
                RecommendationError::DataFormat {
                    district: district.clone(),
                    factor: spec.column.clone(),
                    value: raw.to_string(),
                }
            })?);
        }

        rows.push(DistrictRow { district, values });
    }

    Ok(rows)
}

/// Maps each schema factor to its column index; the first column is the district key.
fn project_columns(
    headers: &[String],
    schema: &FactorSchema,
) -> Result<Vec<usize>, RecommendationError> {
    schema
        .columns()
        .map(|column| {
            headers
                .iter()
                .skip(1)
                .position(|header| header == column)
                .map(|offset| offset + 1)
                .ok_or_else(|| RecommendationError::Schema {
                    factor: column.to_string(),
                })
        })
        .collect()
}

fn district_header(headers: &[String]) -> String {
    match headers.first() {
        Some(header) if !header.is_empty() => header.clone(),
        _ => "district".to_string(),
    }
}

pub(crate) fn clean_cell(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}

fn parse_coefficient(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
pub(crate) fn parse_coefficient_for_tests(raw: &str) -> Option<f64> {
    parse_coefficient(raw)
}
