//! Repository record types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category of a repository in the ecosystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoType {
    /// Coordinates other components (e.g. loom)
    Orchestrator,
    /// Persists data (e.g. vault, ledger)
    Storage,
    /// Developer tools and CLIs
    Tooling,
    /// Reusable code consumed by other repositories
    Library,
    /// Long-running network service
    Service,
    /// End-user application
    Application,
    /// Deployment and platform configuration
    Infrastructure,
    /// Documentation-only repository
    Documentation,
}

impl RepoType {
    pub const ALL: [RepoType; 8] = [
        RepoType::Orchestrator,
        RepoType::Storage,
        RepoType::Tooling,
        RepoType::Library,
        RepoType::Service,
        RepoType::Application,
        RepoType::Infrastructure,
        RepoType::Documentation,
    ];

    /// Label used in the manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoType::Orchestrator => "orchestrator",
            RepoType::Storage => "storage",
            RepoType::Tooling => "tooling",
            RepoType::Library => "library",
            RepoType::Service => "service",
            RepoType::Application => "application",
            RepoType::Infrastructure => "infrastructure",
            RepoType::Documentation => "documentation",
        }
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepoType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let labels: Vec<_> = RepoType::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown repository type '{}' (expected one of: {})", s, labels.join(", "))
            })
    }
}

/// Git remotes of a repository. `origin` is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remotes {
    pub origin: String,
    /// Any additional remotes (upstream, mirror, ...)
    #[serde(flatten)]
    pub others: BTreeMap<String, String>,
}

impl Remotes {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            others: BTreeMap::new(),
        }
    }

    /// Look up a remote URL by name
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == "origin" {
            Some(&self.origin)
        } else {
            self.others.get(name).map(String::as_str)
        }
    }
}

/// Documentation files shipped by a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub architecture: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guides: Vec<String>,
}

impl Documentation {
    /// Number of referenced files. The readme counts as one.
    pub fn file_count(&self) -> usize {
        usize::from(self.readme.is_some())
            + self.architecture.len()
            + self.api_docs.len()
            + self.guides.len()
    }
}

/// Files worth loading as context when working on a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFiles {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<String>,
}

impl ContextFiles {
    pub fn file_count(&self) -> usize {
        self.config.len()
            + self.code.len()
            + self.tests.len()
            + self.examples.len()
            + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }

    /// All files paired with their category, in category order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("config", &self.config),
            ("code", &self.code),
            ("tests", &self.tests),
            ("examples", &self.examples),
            ("data", &self.data),
        ]
        .into_iter()
        .flat_map(|(category, files)| files.iter().map(move |f| (category, f.as_str())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentationCompleteness {
    Excellent,
    Good,
    Minimal,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCoverage {
    Comprehensive,
    Good,
    Minimal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BomIntegration {
    Excellent,
    Good,
    Basic,
    None,
}

macro_rules! impl_label {
    ($ty:ty { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_label!(DocumentationCompleteness {
    Excellent => "excellent",
    Good => "good",
    Minimal => "minimal",
    Missing => "missing",
});

impl_label!(ContextCoverage {
    Comprehensive => "comprehensive",
    Good => "good",
    Minimal => "minimal",
    None => "none",
});

impl_label!(BomIntegration {
    Excellent => "excellent",
    Good => "good",
    Basic => "basic",
    None => "none",
});

impl_label!(ProjectStatus {
    Active => "active",
    Maintenance => "maintenance",
    Experimental => "experimental",
    Deprecated => "deprecated",
    Archived => "archived",
});

/// Self-assessment of how well a repository is wired into the ecosystem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationQuality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_completeness: Option<DocumentationCompleteness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_file_coverage: Option<ContextCoverage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom_integration: Option<BomIntegration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assessed: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Maintenance,
    Experimental,
    Deprecated,
    Archived,
}

/// Open-ended metadata bag.
///
/// Only `created`, `maintainer` and `status` have a fixed shape; any other
/// key is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    /// Look up any key, including the typed ones, as a JSON value
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        match key {
            "created" => self.created.map(|d| serde_json::Value::String(d.to_string())),
            "maintainer" => self.maintainer.clone().map(serde_json::Value::String),
            "status" => self.status.map(|s| serde_json::Value::String(s.to_string())),
            other => self.extra.get(other).cloned(),
        }
    }
}

/// One repository entry of the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    /// Local checkout location, `~`-relative or absolute
    pub path: String,
    pub description: String,
    pub remotes: Remotes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Documentation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_files: Option<ContextFiles>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<RepoType>,
    /// Names of other records. Not required to resolve.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_quality: Option<IntegrationQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl RepositoryRecord {
    /// Create a record with only the required fields set
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: description.into(),
            remotes: Remotes::new(origin),
            documentation: None,
            context_files: None,
            repo_type: None,
            dependencies: Vec::new(),
            tags: Vec::new(),
            integration_quality: None,
            metadata: None,
        }
    }

    pub fn origin(&self) -> &str {
        &self.remotes.origin
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Type label, `unknown` when the record has none
    pub fn type_label(&self) -> &'static str {
        self.repo_type.map(|t| t.as_str()).unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_type_parse() {
        assert_eq!("tooling".parse::<RepoType>().unwrap(), RepoType::Tooling);
        let err = "toolz".parse::<RepoType>().unwrap_err();
        assert!(err.contains("toolz"));
        assert!(err.contains("orchestrator"));
    }

    #[test]
    fn test_metadata_keeps_unknown_keys() {
        let metadata: Metadata = serde_json::from_value(serde_json::json!({
            "created": "2024-03-01",
            "status": "active",
            "owner_team": "platform",
            "priority": 2
        }))
        .unwrap();

        assert_eq!(metadata.created, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(metadata.status, Some(ProjectStatus::Active));
        assert_eq!(metadata.get("owner_team"), Some(serde_json::json!("platform")));
        assert_eq!(metadata.get("priority"), Some(serde_json::json!(2)));
        assert_eq!(metadata.get("status"), Some(serde_json::json!("active")));
    }

    #[test]
    fn test_remotes_flatten() {
        let remotes: Remotes = serde_json::from_value(serde_json::json!({
            "origin": "https://github.com/x/loom.git",
            "upstream": "git@github.com:y/loom.git"
        }))
        .unwrap();

        assert_eq!(remotes.get("origin"), Some("https://github.com/x/loom.git"));
        assert_eq!(remotes.get("upstream"), Some("git@github.com:y/loom.git"));
        assert_eq!(remotes.get("mirror"), None);
    }

    #[test]
    fn test_file_counts() {
        let docs = Documentation {
            readme: Some("README.md".into()),
            architecture: vec!["docs/arch.md".into()],
            api_docs: vec![],
            guides: vec!["docs/a.md".into(), "docs/b.md".into()],
        };
        assert_eq!(docs.file_count(), 4);

        let context = ContextFiles {
            config: vec!["Cargo.toml".into()],
            code: vec!["src/lib.rs".into()],
            ..Default::default()
        };
        assert_eq!(context.file_count(), 2);
        let listed: Vec<_> = context.iter().collect();
        assert_eq!(listed, vec![("config", "Cargo.toml"), ("code", "src/lib.rs")]);
    }
}
