//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};

pub mod discover;
pub mod families;

/// azimport - discover Azure resources and generate Terraform import plans
#[derive(Parser, Debug)]
#[command(name = "azimport")]
#[command(version, about = "Discover Azure resources and generate Terraform import plans")]
#[command(long_about = r#"
azimport enumerates live Azure resources of selected families and emits an
import plan: one record per resource with its normalized ID, a sanitized
Terraform local name and the azurerm resource type.

COMMANDS:
  discover  → List resources and write the import plan
  families  → Show the supported resource families

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Discovery partially failed
  4 - Cancelled
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover resources and write an import plan
    Discover(discover::DiscoverArgs),

    /// List supported resource families
    Families(families::FamiliesArgs),
}

/// Serialization format for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}
