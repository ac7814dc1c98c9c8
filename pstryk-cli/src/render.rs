//! Human-friendly and JSON output for API responses.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::ValueEnum;
use pstryk_core::{
    MeterCarbonFootprintResponse, MeterEnergyCostResponse, MeterEnergyUsageResponse,
    PricingResponse, metric,
};
use serde::Serialize;
use serde_json::Number;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns, one row per frame, totals below.
    #[default]
    Table,
    /// The response as pretty-printed JSON.
    Json,
}

/// A response that can be shown as a table.
pub trait Report: Serialize {
    fn columns(&self) -> &'static [&'static str];
    fn rows(&self) -> Vec<Vec<String>>;
    fn totals(&self) -> Vec<(&'static str, Option<Number>)>;
}

pub fn write<W: Write, R: Report>(out: &mut W, report: &R, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)
                .context("Failed to serialize response as JSON")?;
            writeln!(out)?;
        }
        OutputFormat::Table => write_table(out, report)?,
    }
    Ok(())
}

fn write_table<W: Write, R: Report>(out: &mut W, report: &R) -> Result<()> {
    let columns = report.columns();
    let rows = report.rows();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter().filter_map(|row| row.get(i)).map(String::len).fold(name.len(), usize::max)
        })
        .collect();

    let header: Vec<String> =
        columns.iter().zip(&widths).map(|(name, &w)| format!("{name:<w$}")).collect();
    writeln!(out, "{}", header.join("  ").trim_end())?;

    for row in &rows {
        let cells: Vec<String> =
            row.iter().zip(&widths).map(|(cell, &w)| format!("{cell:<w$}")).collect();
        writeln!(out, "{}", cells.join("  ").trim_end())?;
    }

    if rows.is_empty() {
        writeln!(out, "(no frames)")?;
    }

    writeln!(out)?;
    for (label, value) in report.totals() {
        writeln!(out, "{label}: {}", number(&value))?;
    }

    Ok(())
}

/// Shortens RFC 3339 timestamps in the server's own offset; anything else is shown as sent.
fn time(at: &str) -> String {
    DateTime::parse_from_rfc3339(at)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| at.to_string())
}

fn number(value: &Option<Number>) -> String {
    metric(value).map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string())
}

fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "yes".to_string(),
        Some(false) => String::new(),
        None => "-".to_string(),
    }
}

impl Report for MeterCarbonFootprintResponse {
    fn columns(&self) -> &'static [&'static str] {
        &["start", "end", "co2 [g]", "live"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.frames
            .iter()
            .map(|f| {
                vec![
                    time(&f.start),
                    time(&f.end),
                    number(&f.carbon_footprint),
                    flag(Some(f.is_live)),
                ]
            })
            .collect()
    }

    fn totals(&self) -> Vec<(&'static str, Option<Number>)> {
        vec![("total co2 [g]", self.total_carbon_footprint.clone())]
    }
}

impl Report for MeterEnergyCostResponse {
    fn columns(&self) -> &'static [&'static str] {
        &["start", "end", "bought", "sold", "balance", "vat", "live"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.frames
            .iter()
            .map(|f| {
                vec![
                    time(&f.start),
                    time(&f.end),
                    number(&f.fae_cost),
                    number(&f.energy_sold_value),
                    number(&f.energy_balance_value),
                    number(&f.vat),
                    flag(Some(f.is_live)),
                ]
            })
            .collect()
    }

    fn totals(&self) -> Vec<(&'static str, Option<Number>)> {
        vec![
            ("total bought", self.fae_total_cost.clone()),
            ("total sold", self.total_energy_sold_value.clone()),
            ("total balance", self.total_energy_balance_value.clone()),
        ]
    }
}

impl Report for MeterEnergyUsageResponse {
    fn columns(&self) -> &'static [&'static str] {
        &["start", "end", "bought [kWh]", "returned [kWh]", "balance [kWh]", "live"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.frames
            .iter()
            .map(|f| {
                vec![
                    time(&f.start),
                    time(&f.end),
                    number(&f.fae_usage),
                    number(&f.rae),
                    number(&f.energy_balance),
                    flag(Some(f.is_live)),
                ]
            })
            .collect()
    }

    fn totals(&self) -> Vec<(&'static str, Option<Number>)> {
        vec![
            ("total bought [kWh]", self.fae_total_usage.clone()),
            ("total returned [kWh]", self.rae_total.clone()),
            ("balance [kWh]", self.energy_balance.clone()),
        ]
    }
}

impl Report for PricingResponse {
    fn columns(&self) -> &'static [&'static str] {
        &["start", "end", "net", "gross", "cheap", "expensive", "live"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.frames
            .iter()
            .map(|f| {
                vec![
                    time(&f.start),
                    time(&f.end),
                    number(&f.price_net),
                    number(&f.price_gross),
                    flag(f.is_cheap),
                    flag(f.is_expensive),
                    flag(Some(f.is_live)),
                ]
            })
            .collect()
    }

    fn totals(&self) -> Vec<(&'static str, Option<Number>)> {
        vec![
            ("average net", self.price_net_avg.clone()),
            ("average gross", self.price_gross_avg.clone()),
        ]
    }
}
