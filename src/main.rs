//! parkledger - Single-site vehicle parking ledger

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use parkledger::{
    aggregation::Aggregator,
    cli::{
        Cli, Command, DeleteArgs, DeleteTarget, ListArgs, parse_date_filter, parse_until_filter,
    },
    filters::SessionFilter,
    lifecycle::SessionManager,
    output::{OutputFormatter, get_formatter},
};
use parkledger_core::aggregation_types::{GroupBy, Totals};
use parkledger_core::timezone::TimezoneConfig;
use parkledger_core::{Plate, SessionStatus};
use parkledger_store::SqliteSessionStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Number of latest records shown when no command is given
const DEFAULT_RECENT: usize = 5;

fn init_logging(quiet: bool) {
    // The --quiet flag should override RUST_LOG.
    let filter = if quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("parkledger=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the date filter shared by listings and reports
fn build_filter(cli: &Cli, tz_config: &TimezoneConfig) -> parkledger::Result<SessionFilter> {
    let mut filter = SessionFilter::new().with_timezone(tz_config.tz);

    if let Some(since_str) = &cli.since {
        filter = filter.with_since(parse_date_filter(since_str)?);
    }
    if let Some(until_str) = &cli.until {
        filter = filter.with_until(parse_until_filter(until_str)?);
    }

    Ok(filter)
}

fn print_report(
    manager: &SessionManager<SqliteSessionStore>,
    formatter: &dyn OutputFormatter,
    aggregator: &Aggregator,
    filter: &SessionFilter,
    group_by: GroupBy,
) -> anyhow::Result<()> {
    info!("Running {} revenue report", group_by);

    let sessions = manager.list_all()?;
    let rows = aggregator.aggregate_filtered(&sessions, group_by, filter);
    let totals = Totals::from_rows(&rows);
    println!("{}", formatter.format_report(group_by, &rows, &totals));
    Ok(())
}

fn run_list(
    manager: &SessionManager<SqliteSessionStore>,
    formatter: &dyn OutputFormatter,
    mut filter: SessionFilter,
    args: &ListArgs,
) -> anyhow::Result<()> {
    if args.active {
        filter = filter.with_status(SessionStatus::Active);
    } else if args.closed {
        filter = filter.with_status(SessionStatus::Closed);
    }
    if let Some(plate) = &args.plate {
        filter = filter.with_plate(Plate::parse(plate)?);
    }

    let sessions = filter.apply(manager.list_all()?);
    println!("{}", formatter.format_sessions(&sessions));
    Ok(())
}

fn run_delete(
    manager: &SessionManager<SqliteSessionStore>,
    formatter: &dyn OutputFormatter,
    args: &DeleteArgs,
) -> anyhow::Result<()> {
    let removed = match args.confirmed_target()? {
        DeleteTarget::Id(id) => manager.delete_session_by_id(id)?,
        DeleteTarget::Plate(plate) => manager.delete_session(&plate)?,
    };
    println!("{}", formatter.format_deleted(&removed));
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first to check for quiet flag
    let cli = Cli::parse();
    init_logging(cli.quiet);

    if cli.json || !is_terminal::is_terminal(std::io::stdout()) {
        colored::control::set_override(false);
    }

    let tz_config = TimezoneConfig::from_cli(cli.timezone.as_deref(), cli.utc)?;
    info!("Using timezone: {}", tz_config.display_name());

    let db_path = cli.db_path();
    let store = SqliteSessionStore::open(&db_path)
        .with_context(|| format!("failed to open ledger at {}", db_path.display()))?;
    let manager = SessionManager::new(store);
    let formatter = get_formatter(cli.json, tz_config.tz);
    let filter = build_filter(&cli, &tz_config)?;
    let aggregator = Aggregator::new(tz_config.clone());

    let command = cli.command.clone().unwrap_or(Command::Summary {
        recent: DEFAULT_RECENT,
    });

    match command {
        Command::Entry { plate, class } => {
            let session = manager.record_entry(&plate, class, tz_config.now())?;
            println!("{}", formatter.format_entry(&session));
            if !cli.json {
                eprintln!("{}", format!("{} is now parked", session.plate).green());
            }
        }
        Command::Exit { plate, rates } => {
            let rates = rates.rate_table()?;
            let (session, receipt) = manager.record_exit(&plate, tz_config.now(), &rates)?;
            println!("{}", formatter.format_receipt(&receipt));
            if !cli.json {
                eprintln!("{}", format!("{} has left the lot", session.plate).green());
            }
        }
        Command::Delete(args) => run_delete(&manager, formatter.as_ref(), &args)?,
        Command::List(args) => run_list(&manager, formatter.as_ref(), filter, &args)?,
        Command::Summary { recent } => {
            let summary = manager.summary(recent)?;
            println!("{}", formatter.format_summary(&summary));
            if !cli.json && summary.currently_parked > 0 {
                eprintln!(
                    "{}",
                    format!("{} vehicle(s) still parked", summary.currently_parked).yellow()
                );
            }
        }
        Command::Daily => print_report(
            &manager,
            formatter.as_ref(),
            &aggregator,
            &filter,
            GroupBy::Day,
        )?,
        Command::Weekly => print_report(
            &manager,
            formatter.as_ref(),
            &aggregator,
            &filter,
            GroupBy::IsoWeek,
        )?,
        Command::Monthly => print_report(
            &manager,
            formatter.as_ref(),
            &aggregator,
            &filter,
            GroupBy::Month,
        )?,
    }

    Ok(())
}
