mod cache;
mod parser;

pub use cache::InfluenceTableCache;

use super::error::RecommendationError;
use super::schema::FactorSchema;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::Arc;

/// Influence coefficients for one district, aligned to the owning table's schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictRow {
    district: String,
    values: Vec<f64>,
}

impl DistrictRow {
    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Immutable district × factor matrix of precomputed influence coefficients.
#[derive(Debug, Clone)]
pub struct InfluenceTable {
    schema: Arc<FactorSchema>,
    rows: Vec<DistrictRow>,
}

impl InfluenceTable {
    /// Reads and validates a CSV influence table from disk.
    pub fn load<P: AsRef<Path>>(
        path: P,
        schema: &Arc<FactorSchema>,
    ) -> Result<Self, RecommendationError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => RecommendationError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => RecommendationError::Io(err),
        })?;

        let table = Self::from_reader(file, schema)?;
        tracing::info!(
            path = %path.display(),
            districts = table.len(),
            factors = table.schema.len(),
            "influence table loaded"
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        schema: &Arc<FactorSchema>,
    ) -> Result<Self, RecommendationError> {
        let rows = parser::parse_rows(reader, schema)?;
        Ok(Self {
            schema: Arc::clone(schema),
            rows,
        })
    }

    /// Builds a table from in-memory rows, enforcing the same invariants as the CSV loader.
    pub fn from_rows<I, S>(schema: &Arc<FactorSchema>, rows: I) -> Result<Self, RecommendationError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut validated: Vec<DistrictRow> = Vec::new();

        for (district, values) in rows {
            let district: String = district.into();
            let district = parser::clean_cell(&district);
            if district.is_empty() {
                return Err(RecommendationError::DataFormat {
                    district: "<empty>".to_string(),
                    factor: "district".to_string(),
                    value: String::new(),
                });
            }
            if validated.iter().any(|row| row.district == district) {
                return Err(RecommendationError::DuplicateDistrict { district });
            }
            if values.len() < schema.len() {
                let factor = schema.factors()[values.len()].column.clone();
                return Err(RecommendationError::Schema { factor });
            }
            if values.len() > schema.len() {
                return Err(RecommendationError::range(format!(
                    "district '{district}' has {} values, expected {}",
                    values.len(),
                    schema.len()
                )));
            }
            if let Some((spec, value)) = schema
                .factors()
                .iter()
                .zip(&values)
                .find(|(_, value)| !value.is_finite())
            {
                return Err(RecommendationError::DataFormat {
                    district,
                    factor: spec.column.clone(),
                    value: value.to_string(),
                });
            }

            validated.push(DistrictRow { district, values });
        }

        Ok(Self {
            schema: Arc::clone(schema),
            rows: validated,
        })
    }

    pub fn schema(&self) -> &Arc<FactorSchema> {
        &self.schema
    }

    pub fn rows(&self) -> &[DistrictRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, district: &str) -> Option<&DistrictRow> {
        let district = district.trim();
        self.rows.iter().find(|row| row.district == district)
    }

    pub fn contains(&self, district: &str) -> bool {
        self.row(district).is_some()
    }

    pub fn value(&self, district: &str, factor: &str) -> Option<f64> {
        let index = self.schema.position(factor)?;
        self.row(district).map(|row| row.values[index])
    }

    /// District names in table order.
    pub fn districts(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.district.as_str())
    }

    /// District names in lexical order, as offered by a district selector.
    pub fn sorted_districts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.districts().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Keeps rows matching `keep`, preserving order and sharing the schema.
    pub(crate) fn retain_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&DistrictRow) -> bool,
    {
        Self {
            schema: Arc::clone(&self.schema),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn schema() -> Arc<FactorSchema> {
        FactorSchema::from_columns(["f1", "f2"]).shared()
    }

    #[test]
    fn projects_required_columns_in_schema_order() {
        let csv = "구,extra,f2,f1\n A ,x,-0.3,0.8\nB,y,0.9,-0.5\n";
        let table = InfluenceTable::from_reader(Cursor::new(csv), &schema()).expect("loads");

        assert_eq!(table.schema().column_names(), vec!["f1", "f2"]);
        assert_eq!(table.districts().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(table.row("A").expect("row").values(), &[0.8, -0.3]);
        assert_eq!(table.value("B", "f1"), Some(-0.5));
        assert_eq!(table.value("B", "extra"), None);
    }

    #[test]
    fn accepts_blank_index_header_and_byte_order_mark() {
        let csv = "\u{feff},f1,f2\nA,1,2\n";
        let table = InfluenceTable::from_reader(Cursor::new(csv), &schema()).expect("loads");
        assert_eq!(table.len(), 1);
        assert_eq!(table.value("A", "f2"), Some(2.0));
    }

    #[test]
    fn missing_factor_column_names_the_factor() {
        let csv = "district,f1\nA,0.1\n";
        let error = InfluenceTable::from_reader(Cursor::new(csv), &schema())
            .expect_err("missing column");
        match error {
            RecommendationError::Schema { factor } => assert_eq!(factor, "f2"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn first_column_is_never_treated_as_a_factor() {
        let csv = "f1,f2\nA,0.1\n";
        let error = InfluenceTable::from_reader(Cursor::new(csv), &schema())
            .expect_err("f1 is the index column");
        assert!(matches!(error, RecommendationError::Schema { factor } if factor == "f1"));
    }

    #[test]
    fn unparseable_cell_reports_district_factor_and_value() {
        let csv = "district,f1,f2\nA,0.1,abc\n";
        let error =
            InfluenceTable::from_reader(Cursor::new(csv), &schema()).expect_err("bad value");
        match error {
            RecommendationError::DataFormat {
                district,
                factor,
                value,
            } => {
                assert_eq!(district, "A");
                assert_eq!(factor, "f2");
                assert_eq!(value, "abc");
            }
            other => panic!("expected data format error, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_and_empty_cells_are_rejected() {
        for cell in ["NaN", "inf", ""] {
            let csv = format!("district,f1,f2\nA,0.1,{cell}\n");
            let error = InfluenceTable::from_reader(Cursor::new(csv), &schema())
                .expect_err("non-finite value");
            assert!(matches!(error, RecommendationError::DataFormat { .. }));
        }
        assert_eq!(parser::parse_coefficient_for_tests(" -1.5e-2 "), Some(-0.015));
    }

    #[test]
    fn extra_columns_may_hold_non_numeric_data() {
        let csv = "district,note,f1,f2\nA,hello world,0.1,0.2\n";
        let table = InfluenceTable::from_reader(Cursor::new(csv), &schema()).expect("loads");
        assert_eq!(table.row("A").expect("row").values(), &[0.1, 0.2]);
    }

    #[test]
    fn duplicate_and_empty_districts_are_rejected() {
        let csv = "district,f1,f2\nA,0.1,0.2\n A,0.3,0.4\n";
        let error = InfluenceTable::from_reader(Cursor::new(csv), &schema())
            .expect_err("duplicate district");
        assert!(matches!(error, RecommendationError::DuplicateDistrict { district } if district == "A"));

        let csv = "district,f1,f2\n,0.1,0.2\n";
        let error =
            InfluenceTable::from_reader(Cursor::new(csv), &schema()).expect_err("empty district");
        assert!(matches!(error, RecommendationError::DataFormat { .. }));
    }

    #[test]
    fn short_row_names_the_missing_factor() {
        let csv = "district,f1,f2\nA,0.1\n";
        let error =
            InfluenceTable::from_reader(Cursor::new(csv), &schema()).expect_err("short row");
        match error {
            RecommendationError::DataFormat {
                district,
                factor,
                value,
            } => {
                assert_eq!(district, "A");
                assert_eq!(factor, "f2");
                assert!(value.is_empty());
            }
            other => panic!("expected data format error, got {other:?}"),
        }
    }

    #[test]
    fn rows_short_only_in_extra_columns_still_load() {
        let csv = "district,f1,f2,note\nA,0.8,-0.3,x\nB,-0.5,0.9\n";
        let table = InfluenceTable::from_reader(Cursor::new(csv), &schema()).expect("loads");
        assert_eq!(table.len(), 2);
        assert_eq!(table.row("B").expect("row").values(), &[-0.5, 0.9]);
    }

    #[test]
    fn load_reports_missing_file_path() {
        let error = InfluenceTable::load("./does-not-exist.csv", &schema())
            .expect_err("expected missing file");
        match error {
            RecommendationError::FileNotFound { path } => {
                assert!(path.ends_with("does-not-exist.csv"))
            }
            other => panic!("expected file-not-found, got {other:?}"),
        }
    }

    #[test]
    fn from_rows_validates_shape_and_values() {
        let schema = schema();
        let table = InfluenceTable::from_rows(&schema, [("A", vec![0.8, -0.3])]).expect("valid");
        assert_eq!(table.len(), 1);

        let short = InfluenceTable::from_rows(&schema, [("A", vec![0.8])]).expect_err("short");
        assert!(matches!(short, RecommendationError::Schema { factor } if factor == "f2"));

        let long = InfluenceTable::from_rows(&schema, [("A", vec![0.1, 0.2, 0.3])])
            .expect_err("long");
        assert!(matches!(long, RecommendationError::Range { .. }));

        let nan = InfluenceTable::from_rows(&schema, [("A", vec![0.1, f64::NAN])])
            .expect_err("nan");
        assert!(matches!(nan, RecommendationError::DataFormat { .. }));
    }

    #[test]
    fn sorted_districts_are_lexical() {
        let table = InfluenceTable::from_rows(
            &schema(),
            [("중구", vec![0.0, 0.0]), ("강남구", vec![0.0, 0.0]), ("마포구", vec![0.0, 0.0])],
        )
        .expect("valid");
        assert_eq!(table.sorted_districts(), vec!["강남구", "마포구", "중구"]);
    }
}
