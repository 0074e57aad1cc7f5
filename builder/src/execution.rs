//! Execution orchestrator: universe → holdings → normalize → confirm → create.
//!
//! This is the main workflow that ties together all components.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use fundpie::{Allocation, Resolution, normalize};
use fundpie_broker::t212::T212Broker;
use fundpie_broker::{Broker, PieCreated, PieRequest};
use log::{error, info};

use crate::audit;
use crate::config::Config;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::holdings;
use crate::universe;

/// Options for a pie build.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub force: bool,
    /// Overrides `holdings.file` from the config.
    pub holdings_file: Option<PathBuf>,
}

/// How a run ended, short of an error.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The holdings file had no rows.
    NoHoldings,
    /// The request that would have been sent.
    DryRun(PieRequest),
    /// The user said no at the prompt.
    Declined,
    Created(PieCreated),
}

/// Connect to Trading 212 using the configured key and environment.
pub fn connect(config: &Config) -> Result<T212Broker> {
    Ok(T212Broker::new(
        config.api_key()?,
        config.environment(),
        config.api.version,
        config.timeout(),
    )?)
}

/// Pie request for `allocation` with the configured settings.
pub fn pie_request(
    config: &Config,
    allocation: Allocation,
    now: DateTime<Utc>,
) -> Result<PieRequest> {
    let days = config.pie.duration_days;
    let end_date = TimeDelta::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| Error::Config(format!("pie duration_days {days} is out of range")))?;
    Ok(PieRequest::new(config.pie.name.clone(), allocation, now)
        .with_icon(config.pie.icon.clone())
        .with_goal(config.pie.goal)
        .with_dividend_cash_action(config.pie.dividend_cash_action.into())
        .with_end_date(end_date))
}

/// Execute a full pie build.
pub fn run(
    config: &Config,
    broker: &dyn Broker,
    ctx: &mut RunContext,
    opts: &RunOptions,
) -> Result<RunOutcome> {
    let holdings_path = opts
        .holdings_file
        .as_deref()
        .unwrap_or(config.holdings.file.as_path());
    audit::log_run_started(
        &mut ctx.audit,
        &holdings_path.display().to_string(),
        &config.pie.name,
    )?;

    // 1. Tradable universe (cached)
    let universe = universe::load_universe(&*ctx.cache, broker, &config.universe)?;

    // 2. Fund holdings
    let raw = holdings::load_holdings(holdings_path, &config.holdings)?;
    audit::log_holdings_loaded(&mut ctx.audit, raw.len(), universe.len())?;

    if raw.is_empty() {
        println!("No holdings in {}; nothing to submit.", holdings_path.display());
        ctx.audit.log_simple("no_holdings")?;
        return Ok(RunOutcome::NoHoldings);
    }

    // 3. Normalize
    let normalized = normalize(&raw, &universe, &config.normalize)?;
    print!("{}", normalized.report);
    audit::log_coverage(&mut ctx.audit, &normalized.report)?;

    println!();
    print!("{}", normalized.allocation);
    audit::log_allocation(&mut ctx.audit, &normalized.allocation)?;

    let request = pie_request(config, normalized.allocation, Utc::now())?;
    println!("\n{}", request.to_json_pretty()?);

    // 4. Dry run stops here
    if opts.dry_run {
        println!("\n[DRY RUN] No pie created.");
        return Ok(RunOutcome::DryRun(request));
    }

    // 5. Confirm
    if !opts.force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Create pie {:?}?", request.name))
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;

        audit::log_user_confirmed(&mut ctx.audit, confirmed)?;
        if !confirmed {
            println!("Aborted.");
            return Ok(RunOutcome::Declined);
        }
    }

    // 6. Create
    match broker.create_pie(&request) {
        Ok(created) => {
            audit::log_pie_created(&mut ctx.audit, &created)?;
            match created.id {
                Some(id) => println!("Created pie {:?} (id {id})", request.name),
                None => println!("Created pie {:?}", request.name),
            }
            info!("Broker response: {}", created.raw);
            Ok(RunOutcome::Created(created))
        }
        Err(e) => {
            error!("Pie creation failed: {e}");
            audit::log_pie_failed(&mut ctx.audit, &e.to_string(), e.status())?;
            Err(e.into())
        }
    }
}

/// Show the universe size and how each symbol resolves.
pub fn show_instruments(
    config: &Config,
    broker: &dyn Broker,
    ctx: &RunContext,
    symbols: &[String],
) -> Result<()> {
    let universe = universe::load_universe(&*ctx.cache, broker, &config.universe)?;
    println!("{} tradable instruments", universe.len());

    for symbol in symbols {
        match universe.resolve(symbol) {
            Ok(id) => println!("  {symbol:10} → {id}"),
            Err(Resolution::Missing) => println!("  {symbol:10}   not tradable"),
            Err(reason @ Resolution::Ambiguous(_)) => println!("  {symbol:10}   {reason}"),
        }
    }
    Ok(())
}

/// Check the API connection.
pub fn check_status(config: &Config, broker: &dyn Broker) -> Result<()> {
    print!("Connecting to {}... ", config.base_url());
    let account = broker.account()?;
    println!("OK");
    println!("Account {} ({})", account.id, account.currency_code);
    Ok(())
}

/// Download the holdings CSV. Returns where it was written.
pub fn fetch(
    config: &Config,
    ctx: &RunContext,
    url: Option<&str>,
    out: Option<&Path>,
) -> Result<PathBuf> {
    let url = url
        .or(config.holdings.source_url.as_deref())
        .ok_or_else(|| Error::Config("no holdings source_url configured; pass --url".into()))?;
    let out = out.unwrap_or(config.holdings.file.as_path());

    let rows = holdings::fetch_holdings(url, &*ctx.selector, out, config.timeout())?;
    println!("Saved {rows} holdings to {}", out.display());
    Ok(out.to_path_buf())
}
