//! Bill of Materials CLI
//!
//! Validates the manifest and answers queries about its repositories.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use bom::config::OutputFormat;
use bom::{
    checkout_status, expand_path, BomConfig, BomError, CheckoutStatus, LoadOptions, LoadReport,
    Registry, RepoType, RepositoryRecord,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bom")]
#[command(about = "Query the repository bill of materials")]
struct Cli {
    /// Path to repos.yaml (overrides configuration)
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Require dependencies to name repositories in the manifest
    #[arg(long)]
    strict: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest and report every violation
    Validate,

    /// List all repositories
    List,

    /// Show one repository
    Show { name: String },

    /// Print the local path of a repository
    Path { name: String },

    /// List repositories of a type
    Type {
        #[arg(value_parser = parse_repo_type)]
        repo_type: RepoType,
    },

    /// List repositories carrying a tag
    Tag { tag: String },

    /// Count repositories per type
    Count,

    /// List the context files of a repository
    Context { name: String },

    /// Show the dependency graph in dependency order
    Deps,

    /// Check local checkouts against the manifest
    Status,
}

fn parse_repo_type(s: &str) -> Result<RepoType, String> {
    s.parse()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = BomConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let manifest = cli.manifest.clone().unwrap_or_else(|| config.manifest_path());
    let options = LoadOptions {
        strict_dependencies: cli.strict || config.manifest.strict_dependencies,
    };
    let format = config.output.format;

    let report = Registry::load_file(&manifest, &options)
        .with_context(|| format!("loading {}", manifest.display()))?;

    match cli.command {
        Commands::Validate => validate(&manifest, &report, cli.json, format),
        command => query(&report.into_registry()?, command, cli.json, format),
    }
}

fn validate(
    manifest: &Path,
    report: &LoadReport,
    json: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if json {
        println!("{}", format.to_json(&report.errors)?);
    } else if report.is_valid() {
        println!(
            "✅ {} - {} repositories, no violations",
            manifest.display(),
            report.registry.len()
        );
    } else {
        println!("❌ {} - {} violation(s):", manifest.display(), report.errors.len());
        for error in &report.errors {
            println!("   └─ {}", error);
        }
    }

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn query(
    registry: &Registry,
    command: Commands,
    json: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        Commands::Validate => {}

        Commands::List => {
            let records: Vec<_> = registry.iter().collect();
            print_records(&records, json, format)?;
        }

        Commands::Show { name } => {
            let record = lookup(registry, &name)?;
            if json {
                println!("{}", format.to_json(record)?);
            } else {
                print_record(record);
            }
        }

        Commands::Path { name } => {
            let record = lookup(registry, &name)?;
            println!("{}", expand_path(&record.path).display());
        }

        Commands::Type { repo_type } => {
            let records: Vec<_> = registry.filter_by_type(repo_type).collect();
            print_records(&records, json, format)?;
        }

        Commands::Tag { tag } => {
            let records: Vec<_> = registry.filter_by_tag(&tag).collect();
            print_records(&records, json, format)?;
        }

        Commands::Count => {
            let counts = registry.count_by_type();
            if json {
                println!("{}", format.to_json(&counts)?);
            } else {
                println!("📊 {} repositories", registry.len());
                for (bucket, count) in &counts {
                    println!("   {:<16} {}", bucket, count);
                }
            }
        }

        Commands::Context { name } => {
            let record = lookup(registry, &name)?;
            let files: Vec<_> = record
                .context_files
                .iter()
                .flat_map(|c| c.iter())
                .collect();
            if json {
                println!("{}", format.to_json(&files)?);
            } else {
                println!("📄 {} context files:", record.name);
                for (category, file) in files {
                    println!("   - [{}] {}", category, file);
                }
            }
        }

        Commands::Deps => {
            let graph = registry.dependency_graph();
            let cycles = graph.cycles();
            if json {
                let value = serde_json::json!({
                    "order": graph.topological_order(),
                    "cycles": cycles,
                    "unresolved": graph.unresolved(),
                });
                println!("{}", format.to_json(&value)?);
                return Ok(());
            }

            match graph.topological_order() {
                Some(order) => {
                    println!("🔗 Dependency order:");
                    for name in order {
                        let deps = graph.dependencies_of(&name);
                        if deps.is_empty() {
                            println!("   {}", name);
                        } else {
                            println!("   {} <- {}", name, deps.join(", "));
                        }
                    }
                }
                None => {
                    println!("❌ Dependency cycles:");
                    for cycle in &cycles {
                        println!("   └─ {}", cycle.join(" -> "));
                    }
                }
            }
            for missing in graph.unresolved() {
                println!("⚠️  {} depends on unknown '{}'", missing.record, missing.dependency);
            }
        }

        Commands::Status => {
            let statuses: Vec<(&RepositoryRecord, CheckoutStatus)> =
                registry.iter().map(|r| (r, checkout_status(r))).collect();

            if json {
                let value = statuses
                    .iter()
                    .map(|(r, s)| serde_json::to_value(s).map(|v| (r.name.clone(), v)))
                    .collect::<serde_json::Result<serde_json::Map<String, serde_json::Value>>>()?;
                println!("{}", format.to_json(&value)?);
                return Ok(());
            }

            println!("🔍 Repository Status:");
            for (record, status) in &statuses {
                let path = expand_path(&record.path);
                match status {
                    CheckoutStatus::Missing => {
                        println!("   ❌ {}: {} (missing)", record.name, path.display())
                    }
                    CheckoutStatus::NotARepository => println!(
                        "   ❌ {}: {} (not a git repository)",
                        record.name,
                        path.display()
                    ),
                    CheckoutStatus::Present { origin_matches: true, .. } => {
                        println!("   ✅ {}: {}", record.name, path.display())
                    }
                    CheckoutStatus::Present { origin, .. } => println!(
                        "   ⚠️  {}: {} (origin is {})",
                        record.name,
                        path.display(),
                        origin.as_deref().unwrap_or("unset")
                    ),
                }
            }
        }
    }

    Ok(())
}

/// `Registry::get`, with close names attached when the lookup misses
fn lookup<'a>(registry: &'a Registry, name: &str) -> anyhow::Result<&'a RepositoryRecord> {
    registry.get(name).map_err(|e| match e {
        BomError::NotFound(_) => {
            let suggestions = registry.suggest(name, 3);
            if suggestions.is_empty() {
                anyhow!(e)
            } else {
                anyhow!("{} (did you mean: {}?)", e, suggestions.join(", "))
            }
        }
        other => anyhow!(other),
    })
}

fn print_records(
    records: &[&RepositoryRecord],
    json: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if json {
        println!("{}", format.to_json(&records)?);
        return Ok(());
    }

    for record in records {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &RepositoryRecord) {
    println!("📁 {}", record.name);
    println!("   Type: {}", record.type_label());
    println!("   Path: {}", record.path);
    println!("   Description: {}", record.description);
    println!("   Remote: {}", record.origin());
    if !record.tags.is_empty() {
        println!("   Tags: {}", record.tags.join(", "));
    }
    if !record.dependencies.is_empty() {
        println!("   Dependencies: {}", record.dependencies.join(", "));
    }
    if let Some(context) = record.context_files.as_ref().filter(|c| !c.is_empty()) {
        let files: Vec<_> = context.iter().map(|(_, f)| f).collect();
        println!("   Context Files: {}", files.join(", "));
    }
    println!();
}
