//! Manifest validation
//!
//! Checks a parsed manifest against the embedded JSON Schema
//! (`schemas/repos.schema.json`, Draft 7) and the cross-record rules the
//! schema language cannot express. Every violation is collected; nothing
//! short-circuits.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use serde::Serialize;
use serde_json::Value;

use crate::error::{BomError, Result};

/// The manifest schema, embedded at compile time
pub const MANIFEST_SCHEMA: &str = include_str!("../schemas/repos.schema.json");

/// Which record a violation belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum RecordRef {
    /// The document as a whole (missing `repos`, unknown top-level keys)
    Document,
    /// One entry of `repos`, by position and name when it has one
    Record { index: usize, name: Option<String> },
}

impl RecordRef {
    pub fn record(index: usize, name: Option<&str>) -> Self {
        RecordRef::Record {
            index,
            name: name.map(String::from),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RecordRef::Record { name, .. } => name.as_deref(),
            RecordRef::Document => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            RecordRef::Record { index, .. } => Some(*index),
            RecordRef::Document => None,
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Document => write!(f, "document"),
            RecordRef::Record { name: Some(name), .. } => write!(f, "'{}'", name),
            RecordRef::Record { index, name: None } => write!(f, "repos[{}]", index),
        }
    }
}

/// Broad class of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingField,
    UnknownField,
    WrongType,
    Pattern,
    Enum,
    Length,
    /// `YYYY-MM-DD` shaped but not a calendar date
    InvalidDate,
    DuplicateItem,
    DuplicateName,
    UnresolvedDependency,
    DependencyCycle,
    /// The record could not be read into the typed model
    Undecodable,
    Other,
}

impl ViolationKind {
    fn from_schema(kind: &ValidationErrorKind) -> Self {
        match kind {
            ValidationErrorKind::Required { .. } => ViolationKind::MissingField,
            ValidationErrorKind::AdditionalProperties { .. } => ViolationKind::UnknownField,
            ValidationErrorKind::Type { .. } => ViolationKind::WrongType,
            ValidationErrorKind::Pattern { .. } => ViolationKind::Pattern,
            ValidationErrorKind::Enum { .. } => ViolationKind::Enum,
            ValidationErrorKind::MinLength { .. } | ValidationErrorKind::MaxLength { .. } => {
                ViolationKind::Length
            }
            ValidationErrorKind::UniqueItems { .. } => ViolationKind::DuplicateItem,
            _ => ViolationKind::Other,
        }
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub record: RecordRef,
    /// Path of the failing field inside the record, e.g. `remotes.origin`
    /// or `tags[2]`. Empty when the record itself is at fault.
    pub field: String,
    pub reason: String,
    pub kind: ViolationKind,
}

impl ValidationError {
    pub fn new(
        record: RecordRef,
        field: impl Into<String>,
        kind: ViolationKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            record,
            field: field.into(),
            reason: reason.into(),
            kind,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}: {}", self.record, self.reason)
        } else {
            write!(f, "{} at {}: {}", self.record, self.field, self.reason)
        }
    }
}

/// Compiled manifest schema
pub struct ManifestValidator {
    compiled: JSONSchema,
}

impl ManifestValidator {
    /// Compile the embedded schema
    pub fn new() -> Result<Self> {
        let schema: Value = serde_json::from_str(MANIFEST_SCHEMA)?;
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .map_err(|e| BomError::SchemaCompile(e.to_string()))?;

        Ok(Self { compiled })
    }

    /// Validate a whole manifest document, returning every violation found
    pub fn validate(&self, document: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Err(schema_errors) = self.compiled.validate(document) {
            for error in schema_errors {
                let mut segments = error.instance_path.clone().into_vec();
                if let ValidationErrorKind::Required { property } = &error.kind {
                    if let Some(property) = property.as_str() {
                        segments.push(property.to_string());
                    }
                }
                let (record, field) = locate(document, &segments);
                errors.push(ValidationError::new(
                    record,
                    field,
                    ViolationKind::from_schema(&error.kind),
                    error.to_string(),
                ));
            }
        }

        errors.extend(check_unique_names(document));
        errors.extend(check_calendar_dates(document));

        tracing::debug!(violations = errors.len(), "validated manifest");
        errors
    }
}

/// Records reusing a name already taken by an earlier record
fn check_unique_names(document: &Value) -> Vec<ValidationError> {
    let Some(repos) = document.get("repos").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut errors = Vec::new();

    for (index, repo) in repos.iter().enumerate() {
        let Some(name) = repo.get("name").and_then(Value::as_str) else {
            continue;
        };
        match first_seen.get(name) {
            Some(&first) => errors.push(ValidationError::new(
                RecordRef::record(index, Some(name)),
                "name",
                ViolationKind::DuplicateName,
                format!(
                    "name '{}' is not unique (already used by repos[{}])",
                    name, first
                ),
            )),
            None => {
                first_seen.insert(name, index);
            }
        }
    }

    errors
}

/// Date fields whose `YYYY-MM-DD` shape the schema checks but whose
/// calendar validity it cannot
const DATE_FIELDS: [(&str, &str); 2] = [
    ("integration_quality", "last_assessed"),
    ("metadata", "created"),
];

/// Dates such as `2024-02-30` that pass the schema pattern
fn check_calendar_dates(document: &Value) -> Vec<ValidationError> {
    let Some(repos) = document.get("repos").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    for (index, repo) in repos.iter().enumerate() {
        for (section, key) in DATE_FIELDS {
            let Some(text) = repo.get(section).and_then(|s| s.get(key)).and_then(Value::as_str)
            else {
                continue;
            };
            // Anything else is already a pattern violation
            if !is_date_shaped(text) || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() {
                continue;
            }
            let name = repo.get("name").and_then(Value::as_str);
            errors.push(ValidationError::new(
                RecordRef::record(index, name),
                format!("{}.{}", section, key),
                ViolationKind::InvalidDate,
                format!("\"{}\" is not a valid calendar date", text),
            ));
        }
    }

    errors
}

fn is_date_shaped(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Split a JSON pointer into the record it falls in and a dotted field path
/// relative to that record.
fn locate(document: &Value, segments: &[String]) -> (RecordRef, String) {
    match segments {
        [repos, index, rest @ ..] if repos == "repos" => match index.parse::<usize>() {
            Ok(index) => {
                let record = document.get("repos").and_then(|r| r.get(index));
                let name = record.and_then(|r| r.get("name")).and_then(Value::as_str);
                (
                    RecordRef::record(index, name),
                    field_path(record.unwrap_or(&Value::Null), rest),
                )
            }
            Err(_) => (RecordRef::Document, field_path(document, segments)),
        },
        _ => (RecordRef::Document, field_path(document, segments)),
    }
}

/// Render pointer segments as `a.b[2].c`, using the instance to tell array
/// indices from object keys that happen to be numeric.
fn field_path(root: &Value, segments: &[String]) -> String {
    let mut path = String::new();
    let mut current = Some(root);

    for segment in segments {
        match current {
            Some(Value::Array(items)) => {
                path.push_str(&format!("[{}]", segment));
                current = segment.parse::<usize>().ok().and_then(|i| items.get(i));
            }
            other => {
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(segment);
                current = other.and_then(|v| v.get(segment.as_str()));
            }
        }
    }

    path
}
