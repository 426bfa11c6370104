//! aws-scrub: delete every AWS resource carrying a given tag, in
//! dependency order.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use aws_scrub::aws::{self, AwsContext};
use aws_scrub::config::{Settings, TagFilter, DEFAULT_GLOBAL_REGIONS};
use aws_scrub::provider::{Action, DeleteAction, DryRunAction, ProviderRegistry};
use aws_scrub::providers::all_providers;
use aws_scrub::schedule::{Plan, DEFAULT_CONCURRENCY};

#[derive(Parser, Debug)]
#[command(name = "aws-scrub")]
#[command(about = "Dependency-aware teardown of tagged AWS resources")]
#[command(version)]
struct Args {
    /// AWS region to scrub
    #[arg(long)]
    region: String,

    /// Expected AWS account id; the run aborts if credentials resolve to a
    /// different account
    #[arg(long)]
    account: String,

    /// Tag key selecting resources for deletion
    #[arg(long)]
    tag_key: String,

    /// Tag value selecting resources for deletion
    #[arg(long)]
    tag_value: String,

    /// Actually delete; without this flag resources are only listed
    #[arg(long)]
    execute: bool,

    /// Maximum concurrently processed resources
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    if args.tag_key.is_empty() || args.tag_value.is_empty() {
        bail!("--tag-key and --tag-value must not be empty");
    }

    let aws = AwsContext::new(&args.region).await;
    let identity = aws::get_caller_identity(&aws).await?;
    if identity.account != args.account {
        bail!(
            "credentials resolve to account {} but --account is {}",
            identity.account,
            args.account
        );
    }

    let filter = TagFilter {
        key: args.tag_key,
        value: args.tag_value,
    };
    let settings = Settings {
        aws,
        region: args.region,
        partition: identity.partition,
        account: identity.account,
        filter: filter.clone(),
        global_regions: DEFAULT_GLOBAL_REGIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };

    let registry = ProviderRegistry::new(all_providers())?;
    let action: Arc<dyn Action> = if args.execute {
        Arc::new(DeleteAction)
    } else {
        info!("dry run: listing what would be deleted; pass --execute to delete");
        Arc::new(DryRunAction)
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, canceling run");
                cancel.cancel();
            }
        });
    }

    info!(
        region = %settings.region,
        account = %settings.account,
        tag = %format!("{}={}", filter.key, filter.value),
        execute = args.execute,
        "starting scrub"
    );

    let plan = Plan::new(registry, settings, move |e| filter.matches(&e.tags), action)
        .with_concurrency(args.concurrency);
    plan.run(cancel).await
}
