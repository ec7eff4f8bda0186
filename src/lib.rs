//! Foundry Bill of Materials
//!
//! A schema-validated registry of the repositories that make up the Foundry
//! ecosystem. The registry is a single hand-maintained YAML manifest:
//!
//! ```yaml
//! repos:
//!   - name: loom
//!     path: ~/foundry/loom
//!     description: Workflow orchestrator
//!     type: orchestrator
//!     remotes:
//!       origin: https://github.com/foundry/loom.git
//!     dependencies: [vault]
//!     tags: [core, rust]
//! ```
//!
//! ## Features
//!
//! - **Schema Validation**: Every record is checked against an embedded JSON
//!   Schema; all violations are reported together
//! - **Typed Queries**: Lookup by name, filtering by type or tag, counts per type
//! - **Dependency Graph**: Optional strict resolution of `dependencies`, cycle
//!   detection and dependency ordering
//! - **Integration Analysis**: Documentation and context-file gap reports
//! - **Checkout Status**: Compares local clones against the manifest remotes

pub mod analysis;
pub mod checksum;
pub mod config;
pub mod deps;
pub mod error;
pub mod record;
pub mod registry;
pub mod status;
pub mod validate;

pub use analysis::{analyze, AnalysisThresholds, IntegrationReport};
pub use checksum::Checksum;
pub use config::BomConfig;
pub use deps::DependencyGraph;
pub use error::{BomError, Result};
pub use record::{RepoType, RepositoryRecord};
pub use registry::{LoadOptions, LoadReport, Registry, TypeBucket};
pub use status::{checkout_status, expand_path, CheckoutStatus};
pub use validate::{RecordRef, ValidationError, ViolationKind};
