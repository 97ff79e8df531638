use serde::Serialize;
use std::sync::Arc;

/// One required influence column together with the survey question that weights it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorSpec {
    pub column: String,
    pub question: String,
}

impl FactorSpec {
    pub fn new(column: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            question: question.into(),
        }
    }
}

/// Ordered set of factor columns every influence table and weight vector must agree on.
///
/// Order matters for display only; scores are computed column by column regardless of order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorSchema {
    factors: Vec<FactorSpec>,
}

const STANDARD_FACTORS: [(&str, &str); 14] = [
    ("교통이용만족도_평균", "교통 이용 편의성(대중교통 접근/정시성)"),
    ("보행환경만족도_주거지역", "보행환경(보도 안전/쾌적성)"),
    ("녹지현황(개소)", "공원/녹지 접근성"),
    ("상수도요금평단", "상수도 요금 부담"),
    ("구별 의료기관 수", "의료 접근성(병원/의원 수)"),
    ("노인여가복지시설 개수", "노인 여가/복지 인프라"),
    ("도시 위험도", "도시 안전(위험 낮음)"),
    ("구별 지방세 징수액", "재정 여력(세수/서비스)"),
    ("구별 주택매매지수", "주택시장 안정성(가격 수준/변동)"),
    ("보육시설이용률", "보육 인프라 충족도"),
    ("구별 초등학교 교원 1인당 학생 수", "초등학교 학급 밀도"),
    ("구별 중학교 교원 1인당 학생 수", "중학교 학급 밀도"),
    ("구별 고등학교 교원 1인당 학생수", "고등학교 학급 밀도"),
    ("구별 유치원 교원 1인당 학생 수", "유치원 학급 밀도"),
];

impl FactorSchema {
    /// Builds a schema, keeping the first occurrence of any repeated column.
    pub fn new(factors: Vec<FactorSpec>) -> Self {
        let mut unique: Vec<FactorSpec> = Vec::with_capacity(factors.len());
        for spec in factors {
            if unique.iter().any(|existing| existing.column == spec.column) {
                tracing::warn!(column = %spec.column, "ignoring duplicate factor column");
                continue;
            }
            unique.push(spec);
        }
        Self { factors: unique }
    }

    /// Schema whose survey questions are simply the column names.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            columns
                .into_iter()
                .map(|column| {
                    let column = column.into();
                    FactorSpec::new(column.clone(), column)
                })
                .collect(),
        )
    }

    /// The fourteen-question Seoul livability survey.
    pub fn standard() -> Self {
        Self::new(
            STANDARD_FACTORS
                .iter()
                .map(|(column, question)| FactorSpec::new(*column, *question))
                .collect(),
        )
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn factors(&self) -> &[FactorSpec] {
        &self.factors
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.factors.iter().map(|spec| spec.column.as_str())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().map(str::to_string).collect()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.factors.iter().position(|spec| spec.column == column)
    }
}
