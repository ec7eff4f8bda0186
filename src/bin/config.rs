//! Bill of Materials Config CLI
//!
//! Prints the effective configuration after every source has been layered,
//! writes a starter `bom.toml`, and checks a configuration for errors.

use std::path::Path;

use anyhow::{bail, Context};
use bom::BomConfig;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bom-config")]
#[command(about = "View and manage bill-of-materials configuration")]
struct Cli {
    /// Extra config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration
    Show {
        #[arg(long, value_enum, default_value_t = Rendering::Text)]
        format: Rendering,
    },

    /// Write the default configuration to a file
    Init {
        #[arg(default_value = "bom.toml")]
        path: String,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Load the configuration and report whether it is usable
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
enum Rendering {
    Text,
    Toml,
    /// JSON in the configured output format
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let load = || BomConfig::load_from(cli.config.as_deref()).context("loading configuration");

    match cli.command {
        Commands::Show { format } => {
            let config = load()?;
            match format {
                Rendering::Text => print!("{}", describe(&config)),
                Rendering::Toml => print!("{}", toml::to_string_pretty(&config)?),
                Rendering::Json => println!("{}", config.output.format.to_json(&config)?),
            }
        }

        Commands::Init { path, force } => {
            if Path::new(&path).exists() && !force {
                bail!("{} already exists (use --force to replace it)", path);
            }
            BomConfig::default()
                .save(&path)
                .with_context(|| format!("writing {}", path))?;
            println!("✅ Wrote default configuration to {}", path);
        }

        Commands::Validate => {
            let config = load()?;
            println!("✅ Configuration is valid");
            println!("   Manifest: {}", config.manifest_path().display());
        }
    }

    Ok(())
}

/// Human-readable summary of the effective settings
fn describe(config: &BomConfig) -> String {
    let rows = [
        ("manifest.path", config.manifest.path.display().to_string()),
        ("manifest.resolved", config.manifest_path().display().to_string()),
        (
            "manifest.strict_dependencies",
            config.manifest.strict_dependencies.to_string(),
        ),
        (
            "analysis.excellent_docs_ratio",
            config.analysis.excellent_docs_ratio.to_string(),
        ),
        (
            "analysis.comprehensive_coverage_ratio",
            config.analysis.comprehensive_coverage_ratio.to_string(),
        ),
        ("output.format", format!("{:?}", config.output.format).to_lowercase()),
    ];

    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut out = String::from("📋 Bill of Materials Configuration\n");
    for (key, value) in rows {
        out.push_str(&format!("   {:<width$}  {}\n", key, value, width = width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bom::config::OutputFormat;

    #[test]
    fn test_describe_lists_every_setting() {
        let mut config = BomConfig::default();
        config.manifest.strict_dependencies = true;
        config.output.format = OutputFormat::Compact;

        let text = describe(&config);
        let row = |key: &str| text.lines().find(|l| l.contains(key)).unwrap_or_default();
        assert!(row("manifest.strict_dependencies").ends_with("true"));
        assert!(row("output.format").ends_with("compact"));
        assert!(text.contains("analysis.comprehensive_coverage_ratio"));
        assert_eq!(text.lines().count(), 7);
    }
}
