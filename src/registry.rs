//! Repository Registry
//!
//! Loads a `repos.yaml` manifest, validates it, and answers read-only queries
//! over the resulting records. A registry is immutable once loaded.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::checksum::Checksum;
use crate::deps::DependencyGraph;
use crate::error::{BomError, Result};
use crate::record::{RepoType, RepositoryRecord};
use crate::validate::{ManifestValidator, RecordRef, ValidationError, ViolationKind};

/// Knobs for [`Registry::load_with`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Require every dependency to name an existing record and reject
    /// dependency cycles.
    pub strict_dependencies: bool,
}

/// Outcome of loading a well-formed manifest.
///
/// `registry` holds every record that could be decoded, even when
/// `errors` is not empty, so tooling can work best-effort.
#[derive(Debug)]
pub struct LoadReport {
    pub registry: Registry,
    pub errors: Vec<ValidationError>,
}

impl LoadReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The registry, or every violation if there were any
    pub fn into_registry(self) -> Result<Registry> {
        if self.errors.is_empty() {
            Ok(self.registry)
        } else {
            Err(BomError::Validation(self.errors))
        }
    }
}

/// Bucket of [`Registry::count_by_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeBucket {
    Typed(RepoType),
    /// Records without a `type`
    Unspecified,
}

impl TypeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeBucket::Typed(t) => t.as_str(),
            TypeBucket::Unspecified => "unspecified",
        }
    }
}

impl From<Option<RepoType>> for TypeBucket {
    fn from(repo_type: Option<RepoType>) -> Self {
        repo_type.map_or(TypeBucket::Unspecified, TypeBucket::Typed)
    }
}

impl fmt::Display for TypeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TypeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The in-memory collection of records produced by one load
#[derive(Debug, Clone)]
pub struct Registry {
    records: Vec<RepositoryRecord>,
    /// First occurrence of each name
    by_name: HashMap<String, usize>,
    checksum: Option<Checksum>,
}

impl Registry {
    /// Parse and validate a manifest with default options
    pub fn load(source: &str) -> Result<LoadReport> {
        Self::load_with(source, &LoadOptions::default())
    }

    /// Parse and validate a manifest.
    ///
    /// Fails only when the text is not well-formed YAML. Schema violations
    /// are collected into the returned report.
    pub fn load_with(source: &str, options: &LoadOptions) -> Result<LoadReport> {
        let document: Value = serde_yaml::from_str(source)?;

        let validator = ManifestValidator::new()?;
        let mut errors = validator.validate(&document);

        let raw_repos: &[Value] = document
            .get("repos")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut records = Vec::new();
        for (index, raw) in raw_repos.iter().enumerate() {
            match serde_json::from_value::<RepositoryRecord>(raw.clone()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::debug!(index, error = %e, "skipping undecodable record");
                    errors.push(ValidationError::new(
                        record_ref(raw, index),
                        "",
                        ViolationKind::Undecodable,
                        format!("left out of the registry: {}", e),
                    ));
                }
            }
        }

        let mut registry = Self::from_records(records);
        registry.checksum = Some(Checksum::of_source(source));

        if options.strict_dependencies {
            errors.extend(registry.dependency_violations(&DeclaredNames::collect(raw_repos)));
        }

        tracing::debug!(
            records = registry.len(),
            errors = errors.len(),
            "loaded manifest"
        );

        Ok(LoadReport { registry, errors })
    }

    /// Read and load a manifest file
    pub fn load_file(path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadReport> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "reading manifest");
        let source = fs::read_to_string(path)?;
        Self::load_with(&source, options)
    }

    /// Build a registry directly from records, skipping validation
    pub fn from_records(records: Vec<RepositoryRecord>) -> Self {
        let mut by_name = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            by_name.entry(record.name.clone()).or_insert(i);
        }
        Self {
            records,
            by_name,
            checksum: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in manifest order
    pub fn iter(&self) -> std::slice::Iter<'_, RepositoryRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[RepositoryRecord] {
        &self.records
    }

    /// Fingerprint of the source text, if loaded from one
    pub fn checksum(&self) -> Option<&Checksum> {
        self.checksum.as_ref()
    }

    /// Exact-match lookup. With duplicate names the first record wins.
    pub fn find_by_name(&self, name: &str) -> Option<&RepositoryRecord> {
        self.by_name.get(name).map(|&i| &self.records[i])
    }

    /// Like [`find_by_name`](Self::find_by_name) but an error when absent
    pub fn get(&self, name: &str) -> Result<&RepositoryRecord> {
        self.find_by_name(name)
            .ok_or_else(|| BomError::NotFound(name.to_string()))
    }

    /// Records of the given type, in manifest order. The iterator is lazy
    /// and can be cloned to walk the sequence again.
    pub fn filter_by_type(
        &self,
        repo_type: RepoType,
    ) -> impl Iterator<Item = &RepositoryRecord> + Clone + '_ {
        self.records
            .iter()
            .filter(move |r| r.repo_type == Some(repo_type))
    }

    /// Records carrying `tag`, in manifest order
    pub fn filter_by_tag<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a RepositoryRecord> + Clone + 'a {
        self.records.iter().filter(move |r| r.has_tag(tag))
    }

    /// Number of records per type. Every record lands in exactly one
    /// bucket, so the counts sum to [`len`](Self::len).
    pub fn count_by_type(&self) -> BTreeMap<TypeBucket, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(TypeBucket::from(record.repo_type)).or_insert(0) += 1;
        }
        counts
    }

    /// All distinct tags with the number of records carrying each
    pub fn tags(&self) -> BTreeMap<&str, usize> {
        let mut tags = BTreeMap::new();
        for tag in self.records.iter().flat_map(|r| r.tags.iter()) {
            *tags.entry(tag.as_str()).or_insert(0) += 1;
        }
        tags
    }

    /// Closest record names to `query`, best first
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&str> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, &str)> = self
            .by_name
            .keys()
            .filter_map(|name| {
                matcher
                    .fuzzy_match(name, query)
                    .map(|score| (score, name.as_str()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().take(limit).map(|(_, name)| name).collect()
    }

    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(self)
    }

    /// Strict-mode checks. Names are resolved against every record the
    /// manifest declares, including ones that failed to decode.
    fn dependency_violations(&self, declared: &DeclaredNames) -> Vec<ValidationError> {
        let graph = self.dependency_graph();
        let reference = |name: &str| RecordRef::record(declared.index_of(name), Some(name));

        let mut errors = Vec::new();
        for missing in graph.unresolved() {
            if declared.contains(&missing.dependency) {
                continue;
            }
            tracing::warn!(
                record = %missing.record,
                dependency = %missing.dependency,
                "unresolved dependency"
            );
            errors.push(ValidationError::new(
                reference(&missing.record),
                format!("dependencies[{}]", missing.position),
                ViolationKind::UnresolvedDependency,
                format!("'{}' does not name a repository in this manifest", missing.dependency),
            ));
        }

        for cycle in graph.cycles() {
            tracing::warn!(members = ?cycle, "dependency cycle");
            errors.push(ValidationError::new(
                reference(&cycle[0]),
                "dependencies",
                ViolationKind::DependencyCycle,
                format!("dependency cycle: {}", cycle.join(" -> ")),
            ));
        }

        errors
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a RepositoryRecord;
    type IntoIter = std::slice::Iter<'a, RepositoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Names of the raw manifest entries, first occurrence wins
struct DeclaredNames<'a> {
    first_index: HashMap<&'a str, usize>,
}

impl<'a> DeclaredNames<'a> {
    fn collect(repos: &'a [Value]) -> Self {
        let mut first_index = HashMap::new();
        for (index, raw) in repos.iter().enumerate() {
            if let Some(name) = raw.get("name").and_then(Value::as_str) {
                first_index.entry(name).or_insert(index);
            }
        }
        Self { first_index }
    }

    fn contains(&self, name: &str) -> bool {
        self.first_index.contains_key(name)
    }

    fn index_of(&self, name: &str) -> usize {
        self.first_index.get(name).copied().unwrap_or_default()
    }
}

fn record_ref(raw: &Value, index: usize) -> RecordRef {
    RecordRef::record(index, raw.get("name").and_then(Value::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_RECORDS: &str = r#"
repos:
  - name: loom
    type: orchestrator
    remotes:
      origin: https://github.com/x/loom.git
    path: ~/x/loom
    description: d
  - name: vault
    type: storage
    remotes:
      origin: https://github.com/x/vault.git
    path: ~/x/vault
    description: d2
"#;

    #[test]
    fn test_load_two_records() {
        let report = Registry::load(TWO_RECORDS).unwrap();
        assert!(report.is_valid(), "{:?}", report.errors);

        let registry = report.into_registry().unwrap();
        let storage: Vec<_> = registry.filter_by_type(RepoType::Storage).collect();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage[0].name, "vault");
        assert_eq!(registry.find_by_name("loom").unwrap().path, "~/x/loom");
        assert!(registry.find_by_name("Loom").is_none());
    }

    #[test]
    fn test_unparsable_document_is_fatal() {
        let result = Registry::load("repos: [unclosed");
        assert!(matches!(result, Err(BomError::Parse(_))));
    }

    #[test]
    fn test_filter_is_restartable() {
        let registry = Registry::load(TWO_RECORDS).unwrap().registry;
        let orchestrators = registry.filter_by_type(RepoType::Orchestrator);
        let again = orchestrators.clone();
        assert_eq!(orchestrators.count(), 1);
        assert_eq!(again.map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["loom"]);
    }

    #[test]
    fn test_count_by_type_includes_unspecified() {
        let registry = Registry::from_records(vec![
            RepositoryRecord::new("a", "/a", "a", "https://github.com/x/a.git"),
            RepositoryRecord::new("b", "/b", "b", "https://github.com/x/b.git"),
        ]);
        let counts = registry.count_by_type();
        assert_eq!(counts.get(&TypeBucket::Unspecified), Some(&2));
        assert_eq!(counts.values().sum::<usize>(), registry.len());
    }

    #[test]
    fn test_suggest() {
        let registry = Registry::load(TWO_RECORDS).unwrap().registry;
        assert_eq!(registry.suggest("vlt", 3), vec!["vault"]);
        assert!(registry.suggest("zzz", 3).is_empty());
    }

    #[test]
    fn test_get_reports_unknown_names() {
        let registry = Registry::load(TWO_RECORDS).unwrap().registry;
        assert_eq!(registry.get("vault").unwrap().name, "vault");

        let err = registry.get("vaults").unwrap_err();
        assert!(matches!(&err, BomError::NotFound(name) if name == "vaults"));
        assert_eq!(err.to_string(), "Repository not found: vaults");
    }

    #[test]
    fn test_every_undecodable_record_is_reported() {
        let source = r#"
repos:
  - name: loom
    path: ~/x/loom
    description: d
    remotes:
      origin: https://github.com/x/loom.git
    tags: [a, a]
    metadata:
      created: "2024-02-30"
"#;
        let report = Registry::load(source).unwrap();
        assert!(report.registry.is_empty());

        let kinds: Vec<_> = report.errors.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&ViolationKind::DuplicateItem), "{:?}", report.errors);
        assert!(kinds.contains(&ViolationKind::InvalidDate), "{:?}", report.errors);

        let dropped: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.kind == ViolationKind::Undecodable)
            .collect();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].record, RecordRef::record(0, Some("loom")));
        assert!(dropped[0].reason.starts_with("left out of the registry"));
    }

    #[test]
    fn test_strict_mode_resolves_undecodable_dependencies() {
        let source = r#"
repos:
  - name: loom
    path: ~/x/loom
    description: d
    remotes:
      origin: https://github.com/x/loom.git
    dependencies: [vault, scribe]
  - name: vault
    path: ~/x/vault
    description: d2
    remotes: {}
"#;
        let strict = LoadOptions {
            strict_dependencies: true,
        };
        let report = Registry::load_with(source, &strict).unwrap();

        let unresolved: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.kind == ViolationKind::UnresolvedDependency)
            .collect();
        assert_eq!(unresolved.len(), 1, "{:?}", report.errors);
        assert_eq!(unresolved[0].record, RecordRef::record(0, Some("loom")));
        assert_eq!(unresolved[0].field, "dependencies[1]");
        assert!(unresolved[0].reason.contains("scribe"));

        assert!(report
            .errors
            .iter()
            .any(|e| e.record.name() == Some("vault") && e.field == "remotes.origin"));
    }

    #[test]
    fn test_checksum_tracks_source() {
        let registry = Registry::load(TWO_RECORDS).unwrap().registry;
        assert!(registry.checksum().unwrap().matches(TWO_RECORDS));
    }
}
