use crate::infra::{validate_top_k, TierSelection, DEFAULT_DIAGNOSTIC_TOP_K};
use chrono::{Local, NaiveDate};
use clap::Args;
use district_match::config::AppConfig;
use district_match::error::AppError;
use district_match::recommend::{
    DistrictNegativeReport, FactorSchema, InfluenceTable, Recommendation, RecommendationRequest,
    RecommendationService, SurveyAnswers, DEFAULT_RECOMMENDATION_LIMIT, MAX_ANSWER, MIN_ANSWER,
};
use district_match::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// Comma-separated answers (1-5), one per factor in `factors` order. Omit to answer 3 everywhere.
    #[arg(long, value_delimiter = ',')]
    pub(crate) answers: Vec<u8>,
    /// Price tier to search: high, mid, low, or all. Defaults to APP_DEFAULT_TIER.
    #[arg(long, value_parser = crate::infra::parse_tier_selection)]
    pub(crate) tier: Option<TierSelection>,
    /// Number of districts to show
    #[arg(long, default_value_t = DEFAULT_RECOMMENDATION_LIMIT)]
    pub(crate) limit: usize,
    /// Override the configured influence table path
    #[arg(long)]
    pub(crate) influence_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DiagnoseArgs {
    /// District to inspect. Every district is reported when omitted.
    #[arg(long)]
    pub(crate) district: Option<String>,
    /// Number of adverse factors listed per district
    #[arg(long, default_value_t = DEFAULT_DIAGNOSTIC_TOP_K)]
    pub(crate) top_k: usize,
    /// Override the configured influence table path
    #[arg(long)]
    pub(crate) influence_csv: Option<PathBuf>,
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let RecommendArgs {
        answers,
        tier,
        limit,
        influence_csv,
    } = args;

    let (config, service) = prepare(influence_csv)?;
    let schema = service.schema();
    let answers = if answers.is_empty() {
        SurveyAnswers::with_defaults(schema)
    } else {
        SurveyAnswers::from_ordered(schema, &answers)?
    };
    let tier = tier
        .unwrap_or(TierSelection::Only(config.recommendation.default_tier))
        .tier();

    let request = RecommendationRequest::new(answers)
        .with_tier(tier)
        .with_limit(limit);
    let recommendation = service.recommend(&request)?;

    println!(
        "{}",
        render_recommendation(&recommendation, Local::now().date_naive())
    );
    Ok(())
}

pub(crate) fn run_diagnose(args: DiagnoseArgs) -> Result<(), AppError> {
    let DiagnoseArgs {
        district,
        top_k,
        influence_csv,
    } = args;

    let (config, service) = prepare(influence_csv)?;
    let top_k = validate_top_k(top_k, config.recommendation.max_top_k)?;

    let reports = match district {
        Some(district) => vec![service.diagnose(&district, top_k)?],
        None => service.diagnose_all(top_k)?,
    };

    println!("{}", render_diagnostics(&reports, top_k));
    Ok(())
}

pub(crate) fn print_factors() {
    println!("{}", render_factors(&FactorSchema::standard()));
}

fn prepare(influence_csv: Option<PathBuf>) -> Result<(AppConfig, RecommendationService), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = influence_csv {
        config.recommendation.influence_csv = path;
    }
    telemetry::init(&config.telemetry)?;

    let schema = FactorSchema::standard().shared();
    let table = InfluenceTable::load(&config.recommendation.influence_csv, &schema)?;
    let service = RecommendationService::seoul(Arc::new(table));
    Ok((config, service))
}

pub(crate) fn render_recommendation(recommendation: &Recommendation, today: NaiveDate) -> String {
    let mut lines = Vec::new();
    let scope = match recommendation.tier {
        Some(tier) => format!("price tier {} ({tier})", tier.label()),
        None => "all districts".to_string(),
    };
    lines.push(format!("District recommendations for {today} | {scope}"));

    lines.push("Preference weights:".to_string());
    for view in recommendation.weight_views() {
        lines.push(format!("  - {}: {:.3}", view.factor, view.weight));
    }
    if recommendation.weights.is_zero() {
        lines.push(
            "  (every answer is the minimum, so all districts tie and keep table order)"
                .to_string(),
        );
    }

    if recommendation.top.is_empty() {
        lines.push("No districts match the selected tier.".to_string());
        return lines.join("\n");
    }

    lines.push(format!(
        "Top {} of {} candidates:",
        recommendation.top.len(),
        recommendation.ranking.len()
    ));
    for view in &recommendation.top {
        let tier = view
            .tier_label
            .map(|label| format!(" [{label}]"))
            .unwrap_or_default();
        lines.push(format!(
            "  {}. {} (score {:.4}){tier}",
            view.rank, view.district, view.score
        ));
        lines.push(format!("     {}", view.summary));
        lines.push(format!("     {}", view.homepage));
    }

    lines.join("\n")
}

pub(crate) fn render_diagnostics(reports: &[DistrictNegativeReport], top_k: usize) -> String {
    let mut lines = vec![format!("Adverse factors (up to {top_k} per district)")];
    for report in reports {
        lines.push(format!("{}:", report.district));
        if report.contributions.is_empty() {
            lines.push("  (no negative influences)".to_string());
        }
        for contribution in &report.contributions {
            lines.push(format!(
                "  - {}: {:.4}",
                contribution.factor, contribution.value
            ));
        }
    }
    lines.join("\n")
}

pub(crate) fn render_factors(schema: &FactorSchema) -> String {
    let mut lines = vec![format!(
        "Answer each question from {MIN_ANSWER} (not important) to {MAX_ANSWER} (very important):"
    )];
    for (index, factor) in schema.factors().iter().enumerate() {
        lines.push(format!("{:>2}. {}: {}", index + 1, factor.column, factor.question));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use district_match::recommend::{NegativeContribution, PriceTier};

    fn service() -> RecommendationService {
        let schema = FactorSchema::standard().shared();
        let table = InfluenceTable::from_reader(
            crate::infra::fixtures::SEOUL_TABLE.as_bytes(),
            &schema,
        )
        .expect("table loads");
        RecommendationService::seoul(Arc::new(table))
    }

    fn report_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
    }

    #[test]
    fn recommendation_report_lists_top_districts() {
        let service = service();
        let request = RecommendationRequest::new(SurveyAnswers::with_defaults(service.schema()))
            .with_tier(Some(PriceTier::Low));
        let recommendation = service.recommend(&request).expect("recommendation");

        let rendered = render_recommendation(&recommendation, report_date());

        assert!(rendered.starts_with("District recommendations for 2025-03-14 | price tier 하 (low)"));
        assert!(rendered.contains("Top 3 of 8 candidates:"));
        assert!(rendered.contains(&format!("1. {}", recommendation.top[0].district)));
        assert!(rendered.contains(&recommendation.top[0].homepage));
        assert!(!rendered.contains("keep table order"));
    }

    #[test]
    fn recommendation_report_flags_zero_weights() {
        let service = service();
        let request = RecommendationRequest::new(SurveyAnswers::uniform(service.schema(), 1));
        let recommendation = service.recommend(&request).expect("recommendation");

        let rendered = render_recommendation(&recommendation, report_date());
        assert!(rendered.starts_with("District recommendations for 2025-03-14 | all districts"));
        assert!(rendered.contains("keep table order"));
    }

    #[test]
    fn diagnostics_report_notes_districts_without_negatives() {
        let reports = vec![
            DistrictNegativeReport {
                district: "마포구".to_string(),
                contributions: vec![NegativeContribution {
                    factor: "도시 위험도".to_string(),
                    value: -0.4125,
                }],
            },
            DistrictNegativeReport {
                district: "서초구".to_string(),
                contributions: Vec::new(),
            },
        ];

        let rendered = render_diagnostics(&reports, 3);
        assert!(rendered.contains("마포구:\n  - 도시 위험도: -0.4125"));
        assert!(rendered.contains("서초구:\n  (no negative influences)"));
    }

    #[test]
    fn factor_listing_is_numbered_in_answer_order() {
        let schema = FactorSchema::standard();
        let rendered = render_factors(&schema);
        let first = &schema.factors()[0];
        assert!(rendered.contains(&format!(" 1. {}: {}", first.column, first.question)));
        assert_eq!(rendered.lines().count(), schema.len() + 1);
    }
}
