//! Integration Quality Analyzer CLI
//!
//! Reports documentation and context-file gaps across the ecosystem.

use std::path::PathBuf;

use anyhow::Context;
use bom::analysis::{IntegrationReport, Severity};
use bom::{analyze, BomConfig, Registry};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bom-analyze")]
#[command(about = "Analyze integration quality of the repositories in the bill of materials")]
struct Cli {
    /// Path to repos.yaml (overrides configuration)
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the report to a file instead of stdout (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = BomConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let manifest = cli.manifest.unwrap_or_else(|| config.manifest_path());

    let registry = Registry::load_file(&manifest, &config.load_options())
        .with_context(|| format!("loading {}", manifest.display()))?
        .into_registry()?;

    let report = analyze(&registry, &config.thresholds());

    if let Some(path) = cli.output {
        std::fs::write(&path, config.output.format.to_json(&report)?)?;
        println!("✅ Report written to {:?}", path);
    } else if cli.json {
        println!("{}", config.output.format.to_json(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &IntegrationReport) {
    println!("🔍 Foundry Ecosystem Integration Quality Analysis");
    println!("{}", "=".repeat(60));

    let summary = &report.summary;
    println!("\n📊 Summary ({} repositories):", summary.total_repositories);
    println!("   Documentation Completeness: {:?}", summary.documentation_completeness);
    println!("   BOM Integration: {:?}", summary.bom_integration);
    println!("   Context File Coverage: {:?}", summary.context_file_coverage);

    println!("\n📁 Repository Details:");
    for repo in &report.repositories {
        println!("   {} ({}):", repo.name, repo.type_label);
        println!(
            "     Documentation: {}",
            repo.documentation_completeness
                .map_or("unknown".to_string(), |g| g.to_string())
        );
        println!(
            "     Context Coverage: {}",
            repo.context_file_coverage
                .map_or("unknown".to_string(), |g| g.to_string())
        );
        println!(
            "     Files: {} docs, {} context",
            repo.documentation_files, repo.context_files
        );
        if !repo.missing_elements.is_empty() {
            println!("     Missing: {}", repo.missing_elements.join(", "));
        }
    }

    if !report.gaps.is_empty() {
        println!("\n🚨 Identified Gaps ({}):", report.gaps.len());
        for gap in &report.gaps {
            let icon = match gap.severity {
                Severity::High => "🔴",
                Severity::Medium => "🟡",
                Severity::Low => "🟢",
            };
            println!("   {} {}: {}", icon, gap.repository, gap.description);
            println!("      → {}", gap.recommendation);
        }
    }

    if !report.recommendations.is_empty() {
        println!("\n💡 Recommendations:");
        for recommendation in &report.recommendations {
            println!("   {}", recommendation);
        }
    }

    println!("\n🎉 Analysis complete!");
}
