use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stepgen::config::{load_config, Config};
use stepgen::{
    AsyncDriver, Counter, Driver, GeneratorState, InMemoryPages, PageSource, Paginated, Value,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive stepgen generators and print what they produce", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, default_value_t = false, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive an infinite counter and stop after `limit` values
    Count {
        #[arg(long, default_value_t = 0)]
        start: i64,

        #[arg(long, default_value_t = 1)]
        step: i64,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Drive a paginated source through the async generator engine
    Paginate {
        /// Overrides source.total_items
        #[arg(long)]
        total_items: Option<usize>,

        /// Overrides source.page_size
        #[arg(long)]
        page_size: Option<usize>,

        /// Overrides driver.limit
        #[arg(long)]
        limit: Option<usize>,

        /// Overrides driver.step_timeout_ms
        #[arg(long)]
        step_timeout_ms: Option<u64>,
    },
}

#[derive(Serialize, Debug)]
struct Report {
    generator: String,
    values: Vec<Value>,
    completion: Option<Value>,
    state: GeneratorState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages_fetched: Option<usize>,
}

fn run_count(start: i64, step: i64, limit: usize) -> Result<Report> {
    let mut generator = Counter::definition("counter", start, step).create();
    let mut values = Vec::with_capacity(limit);
    {
        let mut driver = Driver::new(&mut generator);
        for item in driver.by_ref().take(limit) {
            values.push(item?);
        }
        driver.close()?;
    }
    Ok(Report {
        generator: generator.name().to_string(),
        values,
        completion: generator.completion_value().cloned(),
        state: generator.state(),
        pages_fetched: None,
    })
}

async fn run_paginate(config: &Config) -> Result<Report> {
    let source = Arc::new(
        InMemoryPages::from_range(config.source.total_items, config.source.page_size)
            .with_latency(config.source.latency()),
    );
    let start = source.start_token();
    let definition = Paginated::definition(
        "paginated",
        Arc::clone(&source) as Arc<dyn PageSource>,
        start,
    );

    let mut driver = AsyncDriver::new(definition.create());
    if let Some(after) = config.driver.step_timeout() {
        driver = driver.with_step_timeout(after);
    }

    let mut values = Vec::new();
    let limit = config.driver.limit.unwrap_or(usize::MAX);
    while values.len() < limit {
        match driver.next().await {
            Some(item) => values.push(item.context("paginated generator failed")?),
            None => break,
        }
    }
    driver.close().await?;

    Ok(Report {
        generator: driver.generator().name().to_string(),
        values,
        completion: driver.completion().cloned(),
        state: driver.generator().state(),
        pages_fetched: Some(source.fetch_count()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Count { start, step, limit } => run_count(start, step, limit)?,
        Commands::Paginate {
            total_items,
            page_size,
            limit,
            step_timeout_ms,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(total_items) = total_items {
                config.source.total_items = total_items;
            }
            if let Some(page_size) = page_size {
                config.source.page_size = page_size;
            }
            if limit.is_some() {
                config.driver.limit = limit;
            }
            if step_timeout_ms.is_some() {
                config.driver.step_timeout_ms = step_timeout_ms;
            }
            config.validate()?;
            run_paginate(&config).await?
        }
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
