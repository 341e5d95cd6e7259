//! Families command - list supported resource families.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use azimport_core::ResourceFamily;

use super::OutputFormat;

#[derive(Args, Debug)]
pub struct FamiliesArgs {
    /// Print as JSON or YAML instead of a plain listing
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Debug, Serialize)]
struct FamilySummary {
    family: ResourceFamily,
    provider_types: Vec<&'static str>,
    resource_types: Vec<&'static str>,
}

fn summaries() -> Vec<FamilySummary> {
    ResourceFamily::ALL
        .iter()
        .map(|family| {
            let definition = family.definition();
            FamilySummary {
                family: *family,
                provider_types: definition.primaries.iter().map(|p| p.provider_type).collect(),
                resource_types: definition.resource_types(),
            }
        })
        .collect()
}

pub fn execute(args: FamiliesArgs) -> Result<()> {
    let summaries = summaries();
    match args.format {
        Some(OutputFormat::Json) => println!("{}", serde_json::to_string_pretty(&summaries)?),
        Some(OutputFormat::Yaml) => print!("{}", serde_yaml::to_string(&summaries)?),
        None => {
            for summary in &summaries {
                println!("{}", summary.family);
                for resource_type in &summary.resource_types {
                    println!("   - {}", resource_type);
                }
            }
        }
    }
    Ok(())
}
