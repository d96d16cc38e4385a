//! Human-readable summary of an accepted analysis (popup statistics panel)

use serde::Serialize;

use crate::highlight::score::AnalysisResult;
use crate::highlight::span::MAX_SEVERITY;

/// Severity at or above which an instance counts as high severity.
pub const HIGH_SEVERITY: u8 = 3;

/// Number of categories listed as dominant.
const TOP_CATEGORIES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Minimal,
    Mild,
    Moderate,
    Significant,
}

impl SeverityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Minimal => "minimal",
            SeverityLevel::Mild => "mild",
            SeverityLevel::Moderate => "moderate",
            SeverityLevel::Significant => "significant",
        }
    }

    fn classify(instances: usize, high: usize) -> Self {
        if instances > 10 || high > 0 {
            SeverityLevel::Significant
        } else if instances > 5 {
            SeverityLevel::Moderate
        } else if instances > 0 {
            SeverityLevel::Mild
        } else {
            SeverityLevel::Minimal
        }
    }
}

/// Display label for a single span's severity.
pub fn severity_label(severity: u8) -> &'static str {
    match severity {
        0 | 1 => "Low",
        2 | 3 => "Medium",
        _ => "High",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub instance_count: usize,
    pub high_severity_count: usize,
    pub mean_severity: f64,
    pub overall_score: f64,
    pub level: SeverityLevel,
    /// Most frequent categories, count descending then name ascending
    pub dominant_categories: Vec<(String, usize)>,
    pub severity_distribution: [usize; MAX_SEVERITY as usize + 1],
    pub text: String,
}

pub fn summarize(result: &AnalysisResult) -> AnalysisSummary {
    let instance_count = result.spans().len();
    let high_severity_count = result
        .spans()
        .iter()
        .filter(|s| s.severity >= HIGH_SEVERITY)
        .count();
    let level = SeverityLevel::classify(instance_count, high_severity_count);

    let mut dominant: Vec<(String, usize)> = result
        .by_category()
        .iter()
        .map(|(category, count)| (category.clone(), *count))
        .collect();
    dominant.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    dominant.truncate(TOP_CATEGORIES);

    let text = describe(instance_count, high_severity_count, level, &dominant);

    AnalysisSummary {
        instance_count,
        high_severity_count,
        mean_severity: result.mean_severity(),
        overall_score: result.overall_score(),
        level,
        dominant_categories: dominant,
        severity_distribution: result.severity_distribution(),
        text,
    }
}

fn describe(instances: usize, high: usize, level: SeverityLevel, dominant: &[(String, usize)]) -> String {
    if instances == 0 {
        return "No significant bias detected in the initial analysis.".to_string();
    }

    let mut text = format!("The text contains {} bias, primarily in the form of ", level.as_str());
    match dominant {
        [first, second, ..] => text.push_str(&format!("{} and {}.", first.0, second.0)),
        [only] => text.push_str(&format!("{}.", only.0)),
        [] => text.push_str("various bias types."),
    }
    text.push_str(&format!(
        " {} instances of potentially biased language were identified.",
        instances
    ));
    if high > 0 {
        text.push_str(&format!(
            " {} of these are high severity instances that may significantly impact reader perception.",
            high
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::span::{validate_batch, RawSpan};
    use pretty_assertions::assert_eq;

    fn result(items: &[(&str, i64)]) -> AnalysisResult {
        let raw: Vec<RawSpan> = items
            .iter()
            .map(|(category, severity)| RawSpan::new(0, 1, *category, *severity))
            .collect();
        let (spans, _) = validate_batch(&raw, 10, 1);
        AnalysisResult::new(spans, 1)
    }

    #[test]
    fn test_clean_summary() {
        let summary = summarize(&result(&[]));
        assert_eq!(summary.level, SeverityLevel::Minimal);
        assert_eq!(summary.text, "No significant bias detected in the initial analysis.");
        assert_eq!(summary.overall_score, 10.0);
    }

    #[test]
    fn test_mild_summary_text() {
        let summary = summarize(&result(&[("gender", 1), ("political", 2), ("gender", 1)]));
        assert_eq!(summary.level, SeverityLevel::Mild);
        assert_eq!(
            summary.dominant_categories,
            vec![("gender".to_string(), 2), ("political".to_string(), 1)]
        );
        assert_eq!(
            summary.text,
            "The text contains mild bias, primarily in the form of gender and political. \
             3 instances of potentially biased language were identified."
        );
    }

    #[test]
    fn test_high_severity_is_significant() {
        let summary = summarize(&result(&[("racial", 4)]));
        assert_eq!(summary.level, SeverityLevel::Significant);
        assert_eq!(summary.high_severity_count, 1);
        assert!(summary.text.ends_with(
            "1 of these are high severity instances that may significantly impact reader perception."
        ));
    }

    #[test]
    fn test_many_instances_moderate() {
        let items: Vec<(&str, i64)> = (0..6).map(|_| ("framing", 1)).collect();
        assert_eq!(summarize(&result(&items)).level, SeverityLevel::Moderate);
        let items: Vec<(&str, i64)> = (0..11).map(|_| ("framing", 1)).collect();
        assert_eq!(summarize(&result(&items)).level, SeverityLevel::Significant);
    }

    #[test]
    fn test_top_three_categories() {
        let summary = summarize(&result(&[
            ("a", 1),
            ("b", 1),
            ("b", 1),
            ("c", 1),
            ("d", 1),
            ("d", 1),
        ]));
        let names: Vec<&str> = summary.dominant_categories.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a"]);
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(severity_label(0), "Low");
        assert_eq!(severity_label(3), "Medium");
        assert_eq!(severity_label(5), "High");
    }
}
