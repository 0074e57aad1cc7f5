//! Integration tests for a full pie build against the mock broker.

use std::path::{Path, PathBuf};

use fundpie::{FirstMatch, MemoryCache, NormalizeError};
use fundpie_broker::BrokerError;
use fundpie_broker::mock::{MockBroker, PieMode};
use fundpie_builder::audit::AuditLog;
use fundpie_builder::config::Config;
use fundpie_builder::context::RunContext;
use fundpie_builder::error::Error;
use fundpie_builder::execution::{self, RunOptions, RunOutcome};
use rust_decimal_macros::dec;
use tempfile::TempDir;

const HOLDINGS: &str = "\
Symbol,Description,Percent of Assets
AVGO,BROADCOM INC,4.25%
KO,COCA-COLA CO,4.10%
--,CASH & CASH INVESTMENTS,1.00%
PEP,PEPSICO INC,4.00%

Data as of 10/15/2026
";

struct Fixture {
    _dir: TempDir,
    holdings: PathBuf,
    audit: PathBuf,
}

fn fixture(csv: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let holdings = dir.path().join("holdings.csv");
    std::fs::write(&holdings, csv).unwrap();
    let audit = dir.path().join("logs").join("audit.jsonl");
    Fixture {
        _dir: dir,
        holdings,
        audit,
    }
}

fn broker(mode: PieMode) -> MockBroker {
    MockBroker::builder()
        .with_instruments(["AVGO_US_EQ", "KO_US_EQ", "PEP_US_EQ", "MSFT_US_EQ"])
        .pie_mode(mode)
        .build()
}

fn context(audit: &Path) -> RunContext {
    RunContext::new(
        Box::new(MemoryCache::new()),
        Box::new(FirstMatch),
        AuditLog::open(audit).unwrap(),
    )
}

fn options(f: &Fixture, dry_run: bool) -> RunOptions {
    RunOptions {
        dry_run,
        force: true,
        holdings_file: Some(f.holdings.clone()),
    }
}

fn events(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["event"].as_str().unwrap().to_string()
        })
        .collect()
}

// ============================================================================
// Successful runs
// ============================================================================

#[test]
fn creates_pie_from_holdings() {
    let f = fixture(HOLDINGS);
    let broker = broker(PieMode::Accept);
    let mut ctx = context(&f.audit);

    let outcome = execution::run(&Config::default(), &broker, &mut ctx, &options(&f, false)).unwrap();
    assert!(matches!(outcome, RunOutcome::Created(ref c) if c.id == Some(1)));

    let pies = broker.created_pies();
    assert_eq!(pies.len(), 1);
    let shares = &pies[0].instrument_shares;
    assert_eq!(shares.len(), 3);
    assert_eq!(shares.total(), dec!(1));
    assert_eq!(shares.ids().collect::<Vec<_>>(), ["AVGO_US_EQ", "KO_US_EQ", "PEP_US_EQ"]);
    assert_eq!(pies[0].name, "SCHD");

    assert_eq!(
        events(&f.audit),
        [
            "run_started",
            "holdings_loaded",
            "coverage_computed",
            "allocation_computed",
            "pie_created"
        ]
    );
}

#[test]
fn dry_run_submits_nothing() {
    let f = fixture(HOLDINGS);
    let broker = broker(PieMode::Accept);
    let mut ctx = context(&f.audit);

    let outcome = execution::run(&Config::default(), &broker, &mut ctx, &options(&f, true)).unwrap();
    let request = match outcome {
        RunOutcome::DryRun(request) => request,
        other => panic!("expected a dry run, got {other:?}"),
    };
    assert_eq!(request.instrument_shares.total(), dec!(1));
    assert!(broker.created_pies().is_empty());
    assert!(!events(&f.audit).contains(&"pie_created".to_string()));
}

#[test]
fn universe_is_fetched_once_per_cache() {
    let f = fixture(HOLDINGS);
    let broker = broker(PieMode::Accept);
    let mut ctx = context(&f.audit);
    let config = Config::default();

    execution::run(&config, &broker, &mut ctx, &options(&f, true)).unwrap();
    execution::run(&config, &broker, &mut ctx, &options(&f, true)).unwrap();

    assert_eq!(broker.instrument_calls(), 1);
}

#[test]
fn cap_from_config_applies() {
    let f = fixture(HOLDINGS);
    let broker = broker(PieMode::Accept);
    let mut ctx = context(&f.audit);
    let mut config = Config::default();
    config.normalize.max_holdings = 2;

    execution::run(&config, &broker, &mut ctx, &options(&f, false)).unwrap();

    let shares = &broker.created_pies()[0].instrument_shares;
    assert_eq!(shares.len(), 2);
    assert_eq!(shares.get("PEP_US_EQ"), None);
    assert_eq!(shares.total(), dec!(1));
}

// ============================================================================
// Failures and no-ops
// ============================================================================

#[test]
fn rejected_pie_is_an_error() {
    let f = fixture(HOLDINGS);
    let broker = broker(PieMode::Reject(400));
    let mut ctx = context(&f.audit);

    let err = execution::run(&Config::default(), &broker, &mut ctx, &options(&f, false)).unwrap_err();
    assert!(matches!(
        err,
        Error::Broker(BrokerError::Http { status: 400, .. })
    ));
    assert_eq!(events(&f.audit).last().map(String::as_str), Some("pie_failed"));
}

#[test]
fn empty_holdings_submit_nothing() {
    let f = fixture("Symbol,Percent of Assets\n\nfootnote\n");
    let broker = broker(PieMode::Accept);
    let mut ctx = context(&f.audit);

    let outcome = execution::run(&Config::default(), &broker, &mut ctx, &options(&f, false)).unwrap();
    assert!(matches!(outcome, RunOutcome::NoHoldings));
    assert!(broker.created_pies().is_empty());
    assert_eq!(events(&f.audit).last().map(String::as_str), Some("no_holdings"));
}

#[test]
fn nothing_tradable_fails_normalization() {
    let f = fixture("Symbol,Percent of Assets\nNESN,5.0\nROG,4.0\n");
    let broker = broker(PieMode::Accept);
    let mut ctx = context(&f.audit);

    let err = execution::run(&Config::default(), &broker, &mut ctx, &options(&f, false)).unwrap_err();
    assert!(matches!(err, Error::Normalize(NormalizeError::ZeroWeightSum)));
    assert!(broker.created_pies().is_empty());
}

#[test]
fn missing_holdings_file() {
    let f = fixture(HOLDINGS);
    let broker = broker(PieMode::Accept);
    let mut ctx = context(&f.audit);
    let opts = RunOptions {
        holdings_file: Some(f.holdings.with_file_name("absent.csv")),
        ..options(&f, false)
    };

    let err = execution::run(&Config::default(), &broker, &mut ctx, &opts).unwrap_err();
    assert!(matches!(err, Error::HoldingsRead { .. }));
}
