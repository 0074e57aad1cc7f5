//! Fund holdings: reading the issuer CSV and downloading it from the
//! product page.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use fundpie::{RawHolding, Selector};
use log::{debug, info, warn};
use regex::RegexBuilder;
use reqwest::Url;
use reqwest::blocking::Client;
use rust_decimal::Decimal;

use crate::config::HoldingsConfig;
use crate::error::{Error, Result};

/// Issuer sites refuse requests without a browser-looking agent.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Marker for holdings rows that carry no ticker (cash, futures).
const NO_SYMBOL: &str = "--";

/// Read holdings from a CSV file on disk.
pub fn load_holdings(path: &Path, config: &HoldingsConfig) -> Result<Vec<RawHolding>> {
    let text = fs::read_to_string(path).map_err(|e| Error::HoldingsRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let holdings = parse_holdings_csv(&text, config)?;
    info!("Read {} holdings from {}", holdings.len(), path.display());
    Ok(holdings)
}

/// Parse issuer CSV text into holdings, in file order.
///
/// Only the block before the first blank line is read; issuers append
/// disclaimers after it. Weights are percentages.
pub fn parse_holdings_csv(text: &str, config: &HoldingsConfig) -> Result<Vec<RawHolding>> {
    let body = truncate_at_blank(text.trim_start_matches('\u{feff}'));
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let symbol_idx = column_index(&headers, &config.symbol_column)?;
    let weight_idx = column_index(&headers, &config.weight_column)?;

    let mut holdings = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let symbol = record.get(symbol_idx).unwrap_or_default();
        let raw_weight = record.get(weight_idx).unwrap_or_default();
        let percent = parse_percent(raw_weight).ok_or_else(|| {
            Error::Holdings(format!(
                "row {row}: cannot parse {:?} value {raw_weight:?}",
                config.weight_column
            ))
        })?;
        if symbol.is_empty() || symbol == NO_SYMBOL {
            debug!("Row {row} has no symbol; counted as missing");
        }
        holdings.push(RawHolding::from_percent(symbol, percent));
    }
    Ok(holdings)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| {
            let found: Vec<&str> = headers.iter().collect();
            Error::Holdings(format!("no {name:?} column; found {found:?}"))
        })
}

/// "4,250.5 %" → 4250.5
fn parse_percent(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(cleaned.trim()).ok()
}

/// Everything before the first blank line, newline-terminated.
pub fn truncate_at_blank(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Trimmed page lines that look like a holdings download link.
pub fn extract_candidate_lines(page: &str) -> Vec<String> {
    page.lines()
        .filter(|l| l.contains("product_files") && l.to_lowercase().contains("holdings"))
        .map(|l| l.trim().to_string())
        .collect()
}

/// The `.csv` target of an `href` attribute in `line`.
pub fn extract_csv_href(line: &str) -> Result<Option<String>> {
    let re = RegexBuilder::new(r#"href="(.*\.csv)""#)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Download(e.to_string()))?;
    Ok(re
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string()))
}

/// Resolve a (possibly relative) link against the page it appeared on.
pub fn resolve_link(page: &Url, href: &str) -> Result<Url> {
    page.join(href)
        .map_err(|e| Error::Download(format!("bad link {href:?} on {page}: {e}")))
}

/// Download the holdings CSV linked from `page_url` into `out`.
///
/// When the page links several holdings files, `selector` picks one.
/// Returns the number of data rows written.
pub fn fetch_holdings(
    page_url: &str,
    selector: &dyn Selector,
    out: &Path,
    timeout: Duration,
) -> Result<usize> {
    let page_url = Url::parse(page_url)
        .map_err(|e| Error::Download(format!("invalid URL {page_url:?}: {e}")))?;
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Download(e.to_string()))?;

    let page = get_text(&client, &page_url)?;
    let candidates = extract_candidate_lines(&page);
    if candidates.len() > 1 {
        warn!("{} holdings links on {page_url}", candidates.len());
    }
    let line = selector
        .select_one("Which holdings file?", &candidates)?
        .and_then(|i| candidates.get(i))
        .ok_or_else(|| Error::Download(format!("no holdings link on {page_url}")))?;
    let href = extract_csv_href(line)?
        .ok_or_else(|| Error::Download(format!("no .csv link in {line:?}")))?;
    let csv_url = resolve_link(&page_url, &href)?;
    info!("Downloading holdings from {csv_url}");

    let kept = truncate_at_blank(&get_text(&client, &csv_url)?);
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::HoldingsWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(out, &kept).map_err(|e| Error::HoldingsWrite {
        path: out.to_path_buf(),
        source: e,
    })?;

    let rows = kept.lines().count().saturating_sub(1);
    info!("Wrote {rows} holdings rows to {}", out.display());
    Ok(rows)
}

fn get_text(client: &Client, url: &Url) -> Result<String> {
    let resp = client
        .get(url.clone())
        .send()
        .map_err(|e| Error::Download(format!("GET {url}: {e}")))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Download(format!("GET {url}: HTTP {status}")));
    }
    resp.text()
        .map_err(|e| Error::Download(format!("GET {url}: {e}")))
}
