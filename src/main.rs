//! PEPM billing CLI
//!
//! Loads client and rate CSV snapshots and prints cash vs. revenue recognition
//! schedules for a single client or a whole portfolio.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pepm_billing::client::{load_active_months, load_clients, load_rate_schedules};
use pepm_billing::{
    bill_year, Client, ClientYearBilling, PortfolioAggregator, PortfolioBillingReport, RateSchedule,
    RateSchedules, ReportConfig,
};

#[derive(Debug, Parser)]
#[command(name = "pepm-billing", version, about = "Cash and RevRec schedules for PEPM contracts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the twelve-month schedule for one client
    Client {
        #[command(flatten)]
        input: InputArgs,

        /// Client to bill
        #[arg(long)]
        client_id: String,

        /// Calendar year to bill
        #[arg(long)]
        year: i32,
    },
    /// Aggregate the whole portfolio for one or more years
    Portfolio {
        #[command(flatten)]
        input: InputArgs,

        /// JSON run configuration (command-line flags override it)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Calendar year to bill
        #[arg(long, conflicts_with = "years")]
        year: Option<i32>,

        /// Inclusive year range, e.g. 2024..2026
        #[arg(long)]
        years: Option<String>,

        /// Bill clients on a single thread
        #[arg(long)]
        sequential: bool,

        /// Include per-client schedules in JSON output
        #[arg(long)]
        detail: bool,

        /// Print the report(s) as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Write monthly totals to this CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Clients CSV
    #[arg(long)]
    clients: PathBuf,

    /// Rates CSV
    #[arg(long)]
    rates: PathBuf,

    /// Optional active-months CSV
    #[arg(long)]
    active: Option<PathBuf>,
}

impl InputArgs {
    fn load(&self) -> Result<(Vec<Client>, RateSchedules)> {
        let mut clients = load_clients(&self.clients)
            .with_context(|| format!("loading clients from {}", self.clients.display()))?;
        let schedules = load_rate_schedules(&self.rates)
            .with_context(|| format!("loading rates from {}", self.rates.display()))?;
        if let Some(path) = &self.active {
            load_active_months(path, &mut clients)
                .with_context(|| format!("loading active months from {}", path.display()))?;
        }
        Ok((clients, schedules))
    }
}

/// Row of the monthly totals CSV
#[derive(Debug, serde::Serialize)]
struct MonthlyTotalsRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: u32,
    #[serde(rename = "Cash")]
    cash: String,
    #[serde(rename = "RevRec")]
    revrec: String,
    #[serde(rename = "Variance")]
    variance: String,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Client { input, client_id, year } => {
            let (clients, schedules) = input.load()?;
            let client = clients
                .iter()
                .find(|c| c.id == client_id)
                .with_context(|| format!("client {} not found", client_id))?;
            let empty = RateSchedule::new();
            let schedule = schedules.get(&client.id).unwrap_or(&empty);

            let billing = bill_year(client, schedule, year)
                .with_context(|| format!("billing client {} for {}", client.id, year))?;
            print_client(client, &billing);
        }
        Command::Portfolio {
            input,
            config,
            year,
            years,
            sequential,
            detail,
            json,
            output,
        } => {
            let mut run_config = match &config {
                Some(path) => ReportConfig::from_json_path(path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => ReportConfig::default(),
            };
            if let Some(y) = year {
                run_config.year = y;
            }
            if sequential {
                run_config.parallel = false;
            }
            if detail {
                run_config.include_client_detail = true;
            }

            let year_range = match years.as_deref() {
                Some(text) => parse_year_range(text)?,
                None => vec![run_config.year],
            };

            let (clients, schedules) = input.load()?;
            let aggregator = PortfolioAggregator::new(run_config);
            let reports = aggregator.summarize_years(&clients, &schedules, year_range);

            if json {
                let reports: Vec<&PortfolioBillingReport> = reports.values().collect();
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in reports.values() {
                    print_report(report);
                }
            }

            if let Some(path) = output {
                write_monthly_totals(&path, reports.values())?;
                println!("\nMonthly totals written to: {}", path.display());
            }
        }
    }

    Ok(())
}

/// Parse `A..B` or `A..=B` (both inclusive) or a single year
fn parse_year_range(text: &str) -> Result<Vec<i32>> {
    let (start, end) = match text.split_once("..") {
        Some((a, b)) => (a.trim(), b.trim().trim_start_matches('=')),
        None => (text.trim(), text.trim()),
    };
    let start: i32 = start.parse().with_context(|| format!("bad start year in {:?}", text))?;
    let end: i32 = end.parse().with_context(|| format!("bad end year in {:?}", text))?;
    if end < start {
        bail!("year range {:?} is empty", text);
    }
    Ok((start..=end).collect())
}

fn print_client(client: &Client, billing: &ClientYearBilling) {
    println!("Client: {} ({})", client.billing_name, client.id);
    println!("  Frequency: {}", client.billing_frequency);
    println!("  Year: {}", billing.year);
    println!();
    println!("{:>5} {:>7} {:>12} {:>14} {:>14}", "Month", "Active", "PEPM", "Cash", "RevRec");
    println!("{}", "-".repeat(56));

    for record in &billing.months {
        println!(
            "{:>5} {:>7} {:>12} {:>14} {:>14}",
            record.month,
            if record.active { "yes" } else { "no" },
            record.pepm_applied,
            record.cash_amount.round_dp(2),
            record.revrec_amount.round_dp(2),
        );
    }

    println!("{}", "-".repeat(56));
    println!(
        "{:>5} {:>7} {:>12} {:>14} {:>14}",
        "Total",
        "",
        "",
        billing.total_cash.round_dp(2),
        billing.total_revrec.round_dp(2)
    );
}

fn print_report(report: &PortfolioBillingReport) {
    println!("Portfolio {} ({} clients, population {})", report.year, report.client_count(), report.population());
    println!("{:>5} {:>16} {:>16}", "Month", "Cash", "RevRec");
    println!("{}", "-".repeat(39));
    for month in 1..=12 {
        println!(
            "{:>5} {:>16} {:>16}",
            month,
            report.cash_in(month).round_dp(2),
            report.revrec_in(month).round_dp(2)
        );
    }
    println!("{}", "-".repeat(39));
    println!(
        "{:>5} {:>16} {:>16}",
        "Total",
        report.total_cash().round_dp(2),
        report.total_revrec().round_dp(2)
    );

    for (label, groups) in [
        ("Tier", &report.by_tier),
        ("Industry", &report.by_industry),
        ("Product", &report.by_product),
    ] {
        println!("\nBy {}:", label);
        for (key, totals) in groups {
            println!(
                "  {:<20} clients={:<4} population={:<8} cash={} revrec={}",
                key,
                totals.client_count,
                totals.population,
                totals.cash.round_dp(2),
                totals.revrec.round_dp(2)
            );
        }
    }

    if report.has_failures() {
        println!("\nFailures ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  {} [{:?}] {}", failure.client_id, failure.error_kind, failure.message);
        }
    }
    println!();
}

fn write_monthly_totals<'a>(
    path: &Path,
    reports: impl Iterator<Item = &'a PortfolioBillingReport>,
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    for report in reports {
        let variance = report.monthly_variance();
        for month in 1..=12u32 {
            writer.serialize(MonthlyTotalsRow {
                year: report.year,
                month,
                cash: report.cash_in(month).to_string(),
                revrec: report.revrec_in(month).to_string(),
                variance: variance[(month - 1) as usize].to_string(),
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}
