//! Integration Quality Analysis
//!
//! Summarizes how well each repository is wired into the ecosystem and
//! reports gaps in its documentation and context files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{ContextCoverage, DocumentationCompleteness, RepositoryRecord};
use crate::registry::Registry;

/// Thresholds behind the ecosystem-wide recommendations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisThresholds {
    /// Minimum share of records expected to have excellent documentation
    pub excellent_docs_ratio: f64,
    /// Minimum share of records expected to have comprehensive context files
    pub comprehensive_coverage_ratio: f64,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            excellent_docs_ratio: 0.5,
            comprehensive_coverage_ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    Documentation,
    ContextFiles,
    ContextStructure,
}

/// One integration shortfall of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gap {
    pub repository: String,
    pub kind: GapKind,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}

/// Per-repository findings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryAnalysis {
    pub name: String,
    #[serde(rename = "type")]
    pub type_label: &'static str,
    pub documentation_completeness: Option<DocumentationCompleteness>,
    pub context_file_coverage: Option<ContextCoverage>,
    pub documentation_files: usize,
    pub context_files: usize,
    pub missing_elements: Vec<&'static str>,
}

/// Ecosystem-wide grade histograms
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_repositories: usize,
    pub documentation_completeness: BTreeMap<String, usize>,
    pub bom_integration: BTreeMap<String, usize>,
    pub context_file_coverage: BTreeMap<String, usize>,
}

/// Full integration report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationReport {
    pub summary: Summary,
    pub repositories: Vec<RepositoryAnalysis>,
    pub gaps: Vec<Gap>,
    pub recommendations: Vec<String>,
}

impl IntegrationReport {
    pub fn gaps_for<'a>(&'a self, repository: &'a str) -> impl Iterator<Item = &'a Gap> + 'a {
        self.gaps.iter().filter(move |g| g.repository == repository)
    }
}

/// Analyze every record of the registry
pub fn analyze(registry: &Registry, thresholds: &AnalysisThresholds) -> IntegrationReport {
    let mut summary = Summary {
        total_repositories: registry.len(),
        ..Default::default()
    };
    let mut repositories = Vec::with_capacity(registry.len());
    let mut gaps = Vec::new();

    for record in registry {
        if let Some(quality) = &record.integration_quality {
            if let Some(grade) = quality.documentation_completeness {
                *summary.documentation_completeness.entry(grade.to_string()).or_insert(0) += 1;
            }
            if let Some(grade) = quality.bom_integration {
                *summary.bom_integration.entry(grade.to_string()).or_insert(0) += 1;
            }
            if let Some(grade) = quality.context_file_coverage {
                *summary.context_file_coverage.entry(grade.to_string()).or_insert(0) += 1;
            }
        }

        repositories.push(analyze_repository(record));
        gaps.extend(identify_gaps(record));
    }

    let recommendations = recommend(&summary, thresholds);
    tracing::debug!(
        repositories = repositories.len(),
        gaps = gaps.len(),
        "integration analysis complete"
    );

    IntegrationReport {
        summary,
        repositories,
        gaps,
        recommendations,
    }
}

pub fn analyze_repository(record: &RepositoryRecord) -> RepositoryAnalysis {
    let quality = record.integration_quality.as_ref();
    let documentation_files = record.documentation.as_ref().map_or(0, |d| d.file_count());
    let context_files = record.context_files.as_ref().map_or(0, |c| c.file_count());

    let mut missing_elements = Vec::new();
    if record.documentation.as_ref().and_then(|d| d.readme.as_ref()).is_none() {
        missing_elements.push("README file");
    }
    if record.context_files.is_none() {
        missing_elements.push("context files");
    }
    if quality.is_none() {
        missing_elements.push("integration quality metadata");
    }

    RepositoryAnalysis {
        name: record.name.clone(),
        type_label: record.type_label(),
        documentation_completeness: quality.and_then(|q| q.documentation_completeness),
        context_file_coverage: quality.and_then(|q| q.context_file_coverage),
        documentation_files,
        context_files,
        missing_elements,
    }
}

/// Gaps of a single record. An absent grade counts as the worst grade.
pub fn identify_gaps(record: &RepositoryRecord) -> Vec<Gap> {
    let quality = record.integration_quality.as_ref();
    let mut gaps = Vec::new();

    let completeness = quality
        .and_then(|q| q.documentation_completeness)
        .unwrap_or(DocumentationCompleteness::Missing);
    if matches!(
        completeness,
        DocumentationCompleteness::Minimal | DocumentationCompleteness::Missing
    ) {
        gaps.push(Gap {
            repository: record.name.clone(),
            kind: GapKind::Documentation,
            severity: if completeness == DocumentationCompleteness::Missing {
                Severity::High
            } else {
                Severity::Medium
            },
            description: format!("Repository has {} documentation", completeness),
            recommendation: "Add comprehensive README, architecture docs, and usage guides".into(),
        });
    }

    let coverage = quality
        .and_then(|q| q.context_file_coverage)
        .unwrap_or(ContextCoverage::None);
    if matches!(coverage, ContextCoverage::Minimal | ContextCoverage::None) {
        gaps.push(Gap {
            repository: record.name.clone(),
            kind: GapKind::ContextFiles,
            severity: if coverage == ContextCoverage::None {
                Severity::High
            } else {
                Severity::Medium
            },
            description: format!("Repository has {} context file coverage", coverage),
            recommendation: "Add key config files, source code, and examples for AI tools".into(),
        });
    }

    let context = record.context_files.clone().unwrap_or_default();
    let missing: Vec<&str> = [
        (context.config.is_empty(), "configuration files"),
        (context.code.is_empty(), "key source code"),
        (context.examples.is_empty(), "examples and usage patterns"),
    ]
    .into_iter()
    .filter_map(|(absent, label)| absent.then_some(label))
    .collect();

    if !missing.is_empty() {
        let listed = missing.join(", ");
        gaps.push(Gap {
            repository: record.name.clone(),
            kind: GapKind::ContextStructure,
            severity: Severity::Medium,
            description: format!("Missing context file categories: {}", listed),
            recommendation: format!("Add {} to context_files section", listed),
        });
    }

    gaps
}

fn recommend(summary: &Summary, thresholds: &AnalysisThresholds) -> Vec<String> {
    let count = |map: &BTreeMap<String, usize>, key: &str| map.get(key).copied().unwrap_or(0);
    let mut recommendations = Vec::new();

    let minimal_docs = count(&summary.documentation_completeness, "minimal");
    if minimal_docs > 0 {
        recommendations.push(format!(
            "{} repositories have minimal documentation. Consider adding comprehensive README files and architecture documentation.",
            minimal_docs
        ));
    }

    let missing_docs = count(&summary.documentation_completeness, "missing");
    if missing_docs > 0 {
        recommendations.push(format!(
            "{} repositories are missing documentation. This is a critical gap that should be addressed immediately.",
            missing_docs
        ));
    }

    let minimal_coverage = count(&summary.context_file_coverage, "minimal");
    if minimal_coverage > 0 {
        recommendations.push(format!(
            "{} repositories have minimal context file coverage. Add key configuration files, source code, and examples for better AI tool integration.",
            minimal_coverage
        ));
    }

    let no_coverage = count(&summary.context_file_coverage, "none");
    if no_coverage > 0 {
        recommendations.push(format!(
            "{} repositories have no context file coverage. This severely limits AI tool effectiveness.",
            no_coverage
        ));
    }

    let total = summary.total_repositories as f64;
    let excellent_docs = count(&summary.documentation_completeness, "excellent") as f64;
    if excellent_docs < total * thresholds.excellent_docs_ratio {
        recommendations.push(format!(
            "Less than {:.0}% of repositories have excellent documentation. Consider establishing documentation standards and review processes.",
            thresholds.excellent_docs_ratio * 100.0
        ));
    }

    let comprehensive = count(&summary.context_file_coverage, "comprehensive") as f64;
    if comprehensive < total * thresholds.comprehensive_coverage_ratio {
        recommendations.push(format!(
            "Less than {:.0}% of repositories have comprehensive context file coverage. This limits AI tool effectiveness across the ecosystem.",
            thresholds.comprehensive_coverage_ratio * 100.0
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ContextFiles, Documentation, IntegrationQuality};

    fn well_integrated() -> RepositoryRecord {
        let mut record =
            RepositoryRecord::new("loom", "~/src/loom", "orchestrator", "https://github.com/x/loom.git");
        record.documentation = Some(Documentation {
            readme: Some("README.md".into()),
            architecture: vec!["docs/ARCHITECTURE.md".into()],
            ..Default::default()
        });
        record.context_files = Some(ContextFiles {
            config: vec!["Cargo.toml".into()],
            code: vec!["src/lib.rs".into()],
            examples: vec!["examples/basic.rs".into()],
            ..Default::default()
        });
        record.integration_quality = Some(IntegrationQuality {
            documentation_completeness: Some(DocumentationCompleteness::Excellent),
            context_file_coverage: Some(ContextCoverage::Comprehensive),
            ..Default::default()
        });
        record
    }

    #[test]
    fn test_well_integrated_has_no_gaps() {
        let record = well_integrated();
        assert!(identify_gaps(&record).is_empty());

        let analysis = analyze_repository(&record);
        assert_eq!(analysis.documentation_files, 2);
        assert_eq!(analysis.context_files, 3);
        assert!(analysis.missing_elements.is_empty());
    }

    #[test]
    fn test_bare_record_gaps() {
        let record =
            RepositoryRecord::new("vault", "~/src/vault", "d", "https://github.com/x/vault.git");
        let gaps = identify_gaps(&record);

        assert_eq!(gaps.len(), 3);
        assert_eq!(gaps[0].kind, GapKind::Documentation);
        assert_eq!(gaps[0].severity, Severity::High);
        assert_eq!(gaps[1].kind, GapKind::ContextFiles);
        assert_eq!(gaps[1].severity, Severity::High);
        assert_eq!(gaps[2].kind, GapKind::ContextStructure);
        assert!(gaps[2].description.contains("key source code"));

        let analysis = analyze_repository(&record);
        assert_eq!(analysis.type_label, "unknown");
        assert_eq!(
            analysis.missing_elements,
            vec!["README file", "context files", "integration quality metadata"]
        );
    }

    #[test]
    fn test_declared_but_empty_context_is_not_missing() {
        let mut record = well_integrated();
        record.context_files = Some(ContextFiles::default());

        let analysis = analyze_repository(&record);
        assert_eq!(analysis.context_files, 0);
        assert!(!analysis.missing_elements.contains(&"context files"));
    }

    #[test]
    fn test_minimal_grades_are_medium() {
        let mut record = well_integrated();
        record.integration_quality = Some(IntegrationQuality {
            documentation_completeness: Some(DocumentationCompleteness::Minimal),
            context_file_coverage: Some(ContextCoverage::Minimal),
            ..Default::default()
        });

        let gaps = identify_gaps(&record);
        assert_eq!(gaps.len(), 2);
        assert!(gaps.iter().all(|g| g.severity == Severity::Medium));
    }

    #[test]
    fn test_report_summary_and_recommendations() {
        let registry = Registry::from_records(vec![
            well_integrated(),
            RepositoryRecord::new("vault", "~/src/vault", "d", "https://github.com/x/vault.git"),
        ]);
        let report = analyze(&registry, &AnalysisThresholds::default());

        assert_eq!(report.summary.total_repositories, 2);
        assert_eq!(report.summary.documentation_completeness.get("excellent"), Some(&1));
        assert_eq!(report.gaps_for("vault").count(), 3);
        assert_eq!(report.gaps_for("loom").count(), 0);
        // One of two excellent meets the 50% bar, and 1/2 comprehensive meets 30%
        assert!(report.recommendations.is_empty());

        let strict = AnalysisThresholds {
            excellent_docs_ratio: 0.9,
            comprehensive_coverage_ratio: 0.9,
        };
        assert_eq!(analyze(&registry, &strict).recommendations.len(), 2);
    }
}
