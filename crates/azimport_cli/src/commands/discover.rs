//! Discover command - enumerate resource families and write an import plan.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::Args;
use futures::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use azimport_arm::ArmClient;
use azimport_core::{
    DiscoveryConfig, DiscoveryError, DiscoveryResult, Generator, ResourceClient, ResourceFamily,
    Scope,
};

use super::OutputFormat;
use crate::plan::{FamilyFailure, ImportPlan};

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Subscription to enumerate
    #[arg(short, long, env = "ARM_SUBSCRIPTION_ID")]
    subscription: Option<String>,

    /// Resource Manager endpoint
    #[arg(long, env = "ARM_RESOURCE_MANAGER_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token for the Resource Manager API
    #[arg(long, env = "ARM_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Comma-separated resource groups; omit for the whole subscription
    #[arg(short = 'g', long, env = "AZIMPORT_RESOURCE_GROUPS")]
    resource_groups: Option<String>,

    /// Resource families to discover (repeatable or comma-separated); default all
    #[arg(short, long = "family", value_delimiter = ',')]
    families: Vec<String>,

    /// YAML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write the plan to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the selected families concurrently
    #[arg(long)]
    concurrent: bool,
}

/// One or more families stopped with an error.
#[derive(Debug, Error)]
#[error("{failed} of {total} resource families failed")]
pub struct RunFailure {
    pub failed: usize,
    pub total: usize,
    pub cancelled: bool,
}

pub async fn execute(args: DiscoverArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let client = ArmClient::new(
        config.resource_manager_endpoint.clone(),
        args.token.clone().unwrap_or_default(),
    )?;

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling discovery");
            watcher.cancel();
        }
    });

    let (plan, failure) = run(&client, &config, args.concurrent, &cancel).await;
    signal_task.abort();

    plan.write(args.format, args.output.as_deref())?;
    if let Some(path) = &args.output {
        info!(
            "Wrote {} resource(s) and {} association(s) to {}",
            plan.resources.len(),
            plan.associations.len(),
            path.display()
        );
    }

    match failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}

/// Merge the optional config file with command-line flags.
pub fn resolve_config(args: &DiscoverArgs) -> DiscoveryResult<DiscoveryConfig> {
    let mut config = match (&args.config, &args.subscription) {
        (Some(path), _) => DiscoveryConfig::from_file(path)?,
        (None, Some(subscription)) => DiscoveryConfig::new(subscription.clone()),
        (None, None) => {
            return Err(DiscoveryError::InvalidConfig(
                "no subscription given (use --subscription or ARM_SUBSCRIPTION_ID)".to_string(),
            ))
        }
    };

    if let Some(subscription) = &args.subscription {
        config.subscription_id = subscription.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if let Some(groups) = &args.resource_groups {
        config = config.with_scope(Scope::parse(groups));
    }
    if !args.families.is_empty() {
        let families = args
            .families
            .iter()
            .map(|name| ResourceFamily::from_str(name))
            .collect::<DiscoveryResult<Vec<_>>>()?;
        config = config.with_families(families);
    }

    config.validate()?;
    Ok(config)
}

/// Run every selected family and collect the plan.
///
/// A failing family does not stop the others; its partial records are kept
/// and the failure is listed in the plan.
pub async fn run(
    client: &dyn ResourceClient,
    config: &DiscoveryConfig,
    concurrent: bool,
    cancel: &CancellationToken,
) -> (ImportPlan, Option<RunFailure>) {
    let families = config.selected_families();
    info!(
        "Discovering {} famil{} in subscription {} (scope: {})",
        families.len(),
        if families.len() == 1 { "y" } else { "ies" },
        config.subscription_id,
        config.scope
    );

    let outcomes = if concurrent {
        join_all(
            families
                .iter()
                .map(|family| run_family(client, config, *family, cancel)),
        )
        .await
    } else {
        let mut outcomes = Vec::with_capacity(families.len());
        for family in &families {
            outcomes.push(run_family(client, config, *family, cancel).await);
        }
        outcomes
    };

    let mut plan = ImportPlan::new(config.subscription_id.clone(), config.scope.to_string());
    let mut cancelled = false;
    for (generator, result) in outcomes {
        let family = generator.family();
        if let Err(e) = result {
            error!("{}", e);
            cancelled |= e.is_cancelled();
            plan.failures.push(FamilyFailure {
                family,
                error: e.to_string(),
            });
        }
        let (resources, associations) = generator.into_parts();
        plan.extend(resources, associations);
    }

    let failure = (!plan.failures.is_empty()).then(|| RunFailure {
        failed: plan.failures.len(),
        total: families.len(),
        cancelled,
    });
    (plan, failure)
}

async fn run_family(
    client: &dyn ResourceClient,
    config: &DiscoveryConfig,
    family: ResourceFamily,
    cancel: &CancellationToken,
) -> (Generator, DiscoveryResult<()>) {
    let mut generator = Generator::new(family, config.subscription_id.clone());
    let result = generator.init_resources(client, &config.scope, cancel).await;
    (generator, result)
}
