//! `get_azure_costs`: daily actual cost for a subscription as a markdown table

use crate::azure::auth::acquire_credential;
use crate::azure::client::ManagementSession;
use crate::azure::costs::{CostQuery, CostQueryResponse};
use crate::config::Config;
use crate::error::ToolError;
use anyhow::Context;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;

pub const DEFAULT_TIMEFRAME: &str = "MonthToDate";

/// Arguments of `get_azure_costs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostParams {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
}

impl CostParams {
    pub fn timeframe(&self) -> &str {
        self.timeframe
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TIMEFRAME)
    }
}

/// One parsed row of the cost table
#[derive(Debug, Clone, PartialEq)]
pub struct CostRow {
    pub cost: f64,
    pub date: String,
    pub currency: String,
}

/// Why a row was skipped
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RowError {
    #[error("row is not an array")]
    NotAnArray,
    #[error("row has no column {0}")]
    MissingColumn(usize),
    #[error("cost is not numeric: {0}")]
    InvalidCost(String),
}

impl CostRow {
    /// Parse a `[cost, date, currency, ...]` row
    pub fn parse(row: &Value) -> Result<Self, RowError> {
        let columns = row.as_array().ok_or(RowError::NotAnArray)?;
        let column = |i: usize| columns.get(i).ok_or(RowError::MissingColumn(i));

        let cost = parse_cost(column(0)?)?;
        let date = normalize_date(column(1)?);
        let currency = match column(2)? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        Ok(Self { cost, date, currency })
    }
}

fn parse_cost(value: &Value) -> Result<f64, RowError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| RowError::InvalidCost(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RowError::InvalidCost(s.clone())),
        other => Err(RowError::InvalidCost(other.to_string())),
    }
}

/// `20240105` (number or string) becomes `2024-01-05`; anything else is
/// rendered as-is
pub fn normalize_date(value: &Value) -> String {
    match value {
        Value::Number(n) => {
            let digits = match (n.as_u64(), n.as_f64()) {
                (Some(i), _) => i.to_string(),
                (None, Some(f)) if f.fract() == 0.0 && f >= 0.0 && f < 1e15 => {
                    format!("{}", f as u64)
                }
                _ => return n.to_string(),
            };
            format_yyyymmdd(&digits).unwrap_or_else(|| n.to_string())
        }
        Value::String(s) => format_yyyymmdd(s).unwrap_or_else(|| s.clone()),
        other => other.to_string(),
    }
}

fn format_yyyymmdd(digits: &str) -> Option<String> {
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year = digits[..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Parsed cost table with its running total
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostReport {
    pub rows: Vec<CostRow>,
    pub total: f64,
    /// Currency of the last parsed row
    pub currency: String,
}

impl CostReport {
    /// Parse every row, skipping (and logging) the ones that don't fit
    pub fn from_rows(rows: &[Value]) -> Self {
        let mut report = Self::default();

        for row in rows {
            let parsed = match CostRow::parse(row) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Skipping cost row {}: {}", row, e);
                    continue;
                }
            };

            if !report.currency.is_empty() && report.currency != parsed.currency {
                tracing::warn!(
                    "Mixed currencies in cost rows ({} and {}); total uses the last one",
                    report.currency,
                    parsed.currency
                );
            }

            report.total += parsed.cost;
            report.currency = parsed.currency.clone();
            report.rows.push(parsed);
        }

        report
    }
}

/// Query daily actual cost for the resolved subscription
pub async fn get_azure_costs(config: &Config, params: &CostParams) -> Result<String, ToolError> {
    let credential = acquire_credential(config)?;
    let subscription_id = config
        .resolve_subscription(params.subscription_id.as_deref())
        .ok_or(ToolError::MissingSubscription)?;
    let timeframe = params.timeframe();

    let session = ManagementSession::open(config, &credential, &subscription_id)
        .await
        .map_err(ToolError::Azure)?;

    let query = CostQuery::daily_actual_cost(timeframe);
    let (status, body) = session.query_costs(&query).await?;

    if status != StatusCode::OK {
        return Err(ToolError::CostApi {
            status: status.as_u16(),
            body,
        });
    }

    let response: CostQueryResponse =
        serde_json::from_str(&body).context("Failed to parse cost query response")?;
    let report = CostReport::from_rows(&response.into_rows());

    tracing::info!(
        "Parsed {} cost rows for subscription {}",
        report.rows.len(),
        subscription_id
    );

    Ok(render_cost_report(&subscription_id, timeframe, &report))
}

/// Render the cost table
pub fn render_cost_report(subscription_id: &str, timeframe: &str, report: &CostReport) -> String {
    let mut out = format!("## Azure Cost Analysis for Subscription '{}'\n\n", subscription_id);
    let _ = write!(out, "**Timeframe**: {}\n\n", timeframe);
    out.push_str("| Date | Cost | Currency |\n");
    out.push_str("|------|------|----------|\n");

    if report.rows.is_empty() {
        out.push_str("| No data | - | - |\n");
        out.push_str("\nNo cost data available for the specified parameters.\n");
        return out;
    }

    for row in &report.rows {
        let _ = writeln!(out, "| {} | {:.1} | {} |", row.date, row.cost, row.currency);
    }

    let _ = write!(
        out,
        "\n**Total Cost**: {:.1} {}\n",
        report.total, report.currency
    );

    out
}
