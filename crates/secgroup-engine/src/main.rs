//! secgroup-draft: inspect security-group draft resolution against a snapshot
//!
//! Runs the engine's resolution stages, or a full controller session, over a
//! JSON snapshot of VPCs, accounts and security groups.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use secgroup_common::defaults::DEFAULT_PROVIDER;
use secgroup_common::{Availability, AvailabilityIndex, NamePattern, VpcId};
use secgroup_engine::config::{SessionFile, load_settings};
use secgroup_engine::reference::{ReferenceCache, SnapshotSource};
use secgroup_engine::resolve::{self, IndexQuery};
use secgroup_engine::{DraftController, DraftEvent};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "secgroup-draft")]
#[command(about = "Resolve security-group draft fields against a reference snapshot")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List VPCs available in every requested region
    Resolve {
        /// Snapshot file with VPCs, accounts and security groups
        #[arg(long, env = "SECGROUP_SNAPSHOT")]
        snapshot: PathBuf,

        /// Account to resolve for
        #[arg(short, long)]
        account: String,

        /// Region to include (repeatable)
        #[arg(short, long = "region", required = true)]
        regions: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List security-group names existing in and available across regions
    Index {
        /// Snapshot file with VPCs, accounts and security groups
        #[arg(long, env = "SECGROUP_SNAPSHOT")]
        snapshot: PathBuf,

        /// Account to index
        #[arg(short, long)]
        account: String,

        /// Region to include (repeatable)
        #[arg(short, long = "region", required = true)]
        regions: Vec<String>,

        /// VPC to index under (classic when omitted)
        #[arg(long)]
        vpc_id: Option<String>,

        /// Provider key in the security-group catalog
        #[arg(long, default_value = DEFAULT_PROVIDER)]
        provider: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Check a name against the pattern for VPC or classic groups
    CheckName {
        /// Name to check
        #[arg(short, long)]
        name: String,

        /// VPC the group would live in (classic when omitted)
        #[arg(long)]
        vpc_id: Option<String>,
    },

    /// Run a full draft session and print the settled draft
    Cascade {
        /// Snapshot file with VPCs, accounts and security groups
        #[arg(long, env = "SECGROUP_SNAPSHOT")]
        snapshot: PathBuf,

        /// Session file with the application and the draft
        #[arg(long)]
        session: PathBuf,

        /// Provider settings file
        #[arg(long, env = "SECGROUP_SETTINGS")]
        settings: Option<PathBuf>,
    },
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
    eprint!("{}", error_report(e));
}

/// The error followed by one `Caused by` line per source
fn error_report(e: &anyhow::Error) -> String {
    let mut report = format!("\n\x1b[1;31mError:\x1b[0m {e}\n");
    for cause in e.chain().skip(1) {
        report.push_str(&format!("  \x1b[33mCaused by:\x1b[0m {cause}\n"));
    }
    report
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Resolve {
            snapshot,
            account,
            regions,
            format,
        } => handle_resolve(snapshot, account, regions, format).await,

        Command::Index {
            snapshot,
            account,
            regions,
            vpc_id,
            provider,
            format,
        } => handle_index(snapshot, account, regions, vpc_id, provider, format).await,

        Command::CheckName { name, vpc_id } => handle_check_name(&name, vpc_id),

        Command::Cascade {
            snapshot,
            session,
            settings,
        } => handle_cascade(snapshot, session, settings).await,
    }
}

/// Handle the resolve command
async fn handle_resolve(
    snapshot: PathBuf,
    account: String,
    regions: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    info!(account = %account, regions = ?regions, "Resolving VPC availability");

    let source = SnapshotSource::new(snapshot);
    let vpcs = source.list_vpcs().await?;
    let availability = resolve::resolve(&vpcs, &account, &regions);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&availability)?),
        OutputFormat::Table => print_availability(&availability),
    }
    Ok(())
}

fn print_availability(availability: &Availability) {
    if availability.is_empty() {
        println!("No VPC is available in every requested region");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Label"),
            Cell::new("Status"),
            Cell::new("VPC IDs"),
        ]);

    for set in &availability.all {
        let ids: Vec<&str> = set.ids.iter().map(VpcId::as_str).collect();
        table.add_row(vec![
            Cell::new(&set.label),
            Cell::new(if set.deprecated { "deprecated" } else { "active" }),
            Cell::new(ids.join(", ")),
        ]);
    }

    println!("{table}");
}

/// Handle the index command
async fn handle_index(
    snapshot: PathBuf,
    account: String,
    regions: Vec<String>,
    vpc_id: Option<String>,
    provider: String,
    format: OutputFormat,
) -> Result<()> {
    let vpc_id = vpc_id.map(VpcId::from);
    info!(account = %account, regions = ?regions, vpc_id = ?vpc_id, "Indexing security groups");

    let source = SnapshotSource::new(snapshot);
    let vpcs = source.list_vpcs().await?;
    let catalog = source.all_security_groups().await?;

    let index = resolve::index(
        &vpcs,
        &catalog,
        IndexQuery {
            provider: &provider,
            account: &account,
            regions: &regions,
            vpc_id: vpc_id.as_ref(),
        },
    )
    .context("Failed to index security groups")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&index)?),
        OutputFormat::Table => print_index(&index),
    }
    Ok(())
}

fn print_index(index: &AvailabilityIndex) {
    if index.existing_names.is_empty() {
        println!("No security groups found");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Name"), Cell::new("Available in all regions")]);

    for name in &index.existing_names {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(if index.is_available(name) { "yes" } else { "no" }),
        ]);
    }

    println!("{table}");
    println!(
        "\nTotal: {} existing, {} available",
        index.existing_names.len(),
        index.available_names.len()
    );
}

/// Handle the check-name command
fn handle_check_name(name: &str, vpc_id: Option<String>) -> Result<()> {
    let vpc_id = vpc_id.map(VpcId::from);
    let pattern = NamePattern::for_vpc(vpc_id.as_ref());

    if !pattern.matches(name) {
        anyhow::bail!("Name '{name}' does not match pattern {}", pattern.as_str());
    }
    println!("'{name}' is a valid name ({pattern:?})");
    Ok(())
}

/// Handle the cascade command
async fn handle_cascade(
    snapshot: PathBuf,
    session: PathBuf,
    settings: Option<PathBuf>,
) -> Result<()> {
    let settings = load_settings(settings.as_deref())?;
    let SessionFile { application, draft } = SessionFile::load(&session)?;
    info!(
        application = %application.name,
        account = %draft.account_name,
        regions = ?draft.regions,
        "Opening draft session"
    );

    let controller = DraftController::new(
        SnapshotSource::new(&snapshot),
        SnapshotSource::new(&snapshot),
        settings,
        application,
        draft,
    );
    let mut events = controller.subscribe();

    controller
        .initialize_security_groups()
        .await
        .context("Failed to load security groups")?;
    let status = controller
        .initialize_accounts()
        .await
        .context("Failed to resolve draft")?;

    let mut cascades = 0usize;
    while let Ok(event) = events.try_recv() {
        match event {
            DraftEvent::CoordinatesChanged => cascades += 1,
            other => debug!(event = ?other, "Session event"),
        }
    }
    debug!(cascades, "Session settled");

    let state = controller.session().await;
    let output = serde_json::json!({
        "committed": status.is_committed(),
        "draft": state.draft,
        "hide_classic": state.hide_classic,
        "availability": state.availability,
        "index": state.index,
        "removed_rules": state.removed_rules,
        "name_valid": controller.is_name_valid(&state.draft.name).await,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
