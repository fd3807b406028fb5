use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use tally_core::{Config, Directive, Projector, Store};
use tally_reports::{BalanceSheet, IncomeStatement, ReportEngine, ReportLine};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Tally starting...");

    // Load configuration: file if given on the command line, env otherwise
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("loading config file {}", path))?,
        None => Config::from_env().context("loading config from environment")?,
    };

    info!(
        "Configuration loaded - db: {}, node: {}",
        config.db_path.display(),
        config.node_id
    );

    let store = Arc::new(Store::open(&config.db_path)?);
    let projector = Projector::new(store.clone());

    // Rebuild the snapshot from the directive journal when one is configured
    if let Some(journal_path) = &config.journal_path {
        let raw = std::fs::read_to_string(journal_path)
            .with_context(|| format!("reading journal {}", journal_path.display()))?;
        let directives: Vec<Directive> =
            serde_json::from_str(&raw).context("parsing journal")?;
        let summary = projector.replay(&directives)?;
        info!("Replayed {} directives", summary.applied);
    }

    let engine = ReportEngine::new(store);
    let today = Utc::now().date_naive();
    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1)
        .context("computing start of year")?;

    print_balance_sheet(&engine.balance_sheet(today)?);
    print_income_statement(&engine.income_statement(year_start, today)?);

    Ok(())
}

fn print_section(title: &str, lines: &[ReportLine]) {
    println!("  {}", title);
    for line in lines {
        println!("    {:<32} {:>16}", line.account, line.amount.to_string());
    }
}

fn print_balance_sheet(sheet: &BalanceSheet) {
    println!("Balance Sheet as of {}", sheet.as_of);
    print_section("Assets", &sheet.assets);
    println!("    {:<32} {:>16}", "Total Assets", sheet.total_assets.to_string());
    print_section("Liabilities", &sheet.liabilities);
    println!(
        "    {:<32} {:>16}",
        "Total Liabilities",
        sheet.total_liabilities.to_string()
    );
    print_section("Equity", &sheet.equity);
    println!("    {:<32} {:>16}", "Total Equity", sheet.total_equity.to_string());
    println!();
}

fn print_income_statement(statement: &IncomeStatement) {
    println!(
        "Income Statement {} through {}",
        statement.start, statement.end
    );
    print_section("Income", &statement.income);
    println!(
        "    {:<32} {:>16}",
        "Total Income",
        statement.total_income.to_string()
    );
    print_section("Expenses", &statement.expenses);
    println!(
        "    {:<32} {:>16}",
        "Total Expenses",
        statement.total_expenses.to_string()
    );
    println!(
        "    {:<32} {:>16}",
        "Net Income",
        statement.net_income.to_string()
    );
}
