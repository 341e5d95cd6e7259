//! Import plan output.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use azimport_core::{AssociationRecord, ResourceFamily, ResourceRecord};

use crate::commands::OutputFormat;

/// A family whose discovery ended with an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyFailure {
    pub family: ResourceFamily,
    pub error: String,
}

/// Everything one run discovered, in family selection order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPlan {
    pub generated_at: DateTime<Utc>,
    pub subscription_id: String,
    pub scope: String,
    pub resources: Vec<ResourceRecord>,
    pub associations: Vec<AssociationRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FamilyFailure>,
}

impl ImportPlan {
    pub fn new(subscription_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            subscription_id: subscription_id.into(),
            scope: scope.into(),
            resources: Vec::new(),
            associations: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn extend(&mut self, resources: Vec<ResourceRecord>, associations: Vec<AssociationRecord>) {
        self.resources.extend(resources);
        self.associations.extend(associations);
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        let rendered = match format {
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
            OutputFormat::Yaml => serde_yaml::to_string(self)?,
        };
        Ok(rendered)
    }

    /// Write to `path`, or to stdout when no path is given.
    pub fn write(&self, format: OutputFormat, path: Option<&Path>) -> Result<()> {
        let rendered = self.render(format)?;
        match path {
            Some(path) => fs::write(path, rendered)
                .with_context(|| format!("Failed to write plan to {}", path.display())),
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", rendered)?;
                Ok(())
            }
        }
    }
}
