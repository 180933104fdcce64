use crate::args::{Cli, Command, DashboardArgs};
use crate::config::ClientConfig;
use crate::market::{IndexSnapshot, MarketClient, MarketIndex, Range, StockSummary};
use crate::ui::render::{INDEX_UNAVAILABLE, TRENDING_UNAVAILABLE};
use crate::ui::{hot_stocks, index_board, index_card, with_spinner};
use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::console::style;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

pub struct Application {
    client: MarketClient,
    cmd: Command,
}

impl Application {
    pub async fn init() -> Result<Application> {
        // Preload environment variables from .env file if it exists before parsing CLI args
        dotenvy::dotenv().ok();

        let cli = Cli::parse();
        let config = ClientConfig::setup(&cli.global)?;
        let client = MarketClient::from_config(&config).context("Failed to build market client")?;

        Ok(Application {
            client,
            cmd: cli.cmd,
        })
    }

    pub async fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Index(args) => self.show_index(args.name, args.range.range).await,
            Command::Indices(args) => {
                let range = args.range;
                let board = with_spinner(
                    "Loading market indices...",
                    self.client.fetch_all_market_indices(range),
                )
                .await;
                info!(target: "plain", "{}", index_board(&board, range));
                Ok(())
            }
            Command::Trending(args) => {
                let stocks = with_spinner(
                    "Loading stocks...",
                    self.client.fetch_trending_with_prices(args.limit),
                )
                .await
                .context(TRENDING_UNAVAILABLE)?;
                info!(target: "plain", "{}", hot_stocks(&stocks));
                Ok(())
            }
            Command::Dashboard(args) => self.dashboard(args).await,
            Command::Cache => self.print_cache_report(),
        }
    }

    async fn show_index(&self, index: MarketIndex, range: Range) -> Result<()> {
        let snapshot = with_spinner(
            format!("Loading {index}..."),
            self.client.fetch_index(index, range),
        )
        .await
        .with_context(|| format!("{INDEX_UNAVAILABLE}: {index}"))?;

        info!(target: "plain", "{}", index_card(index, Some(&snapshot), range));
        Ok(())
    }

    /// Hot stocks plus one index card. In watch mode a failed refresh keeps
    /// showing the last values that loaded.
    async fn dashboard(&self, args: &DashboardArgs) -> Result<()> {
        let range = args.range.range;
        let interval = Duration::from_secs(args.interval_secs.max(1));
        let mut last_stocks: Option<Vec<StockSummary>> = None;
        let mut last_snapshot: Option<IndexSnapshot> = None;

        loop {
            let refresh = with_spinner(
                "Loading market data...",
                futures::future::join(
                    self.client.fetch_trending_with_prices(args.limit),
                    self.client.fetch_index(args.index, range),
                ),
            );
            // Retry backoff can hold a refresh for seconds; Ctrl-C cuts it short.
            let Some((stocks, snapshot)) = until_interrupted(refresh, tokio::signal::ctrl_c()).await
            else {
                info!("stopping dashboard");
                return Ok(());
            };

            match stocks {
                Ok(stocks) => last_stocks = Some(stocks),
                Err(e) => warn!("{TRENDING_UNAVAILABLE}: {e}"),
            }
            match snapshot {
                Ok(snapshot) => last_snapshot = Some(snapshot),
                Err(e) => warn!(index = args.index.name(), "{INDEX_UNAVAILABLE}: {e}"),
            }

            match &last_stocks {
                Some(stocks) => info!(target: "plain", "{}", hot_stocks(stocks)),
                None => info!(target: "plain", "{}", style(TRENDING_UNAVAILABLE).red()),
            }
            info!(
                target: "plain",
                "{}\n",
                index_card(args.index, last_snapshot.as_ref(), range)
            );

            if args.cache_report {
                self.print_cache_report()?;
            }
            if !args.watch {
                return Ok(());
            }

            if until_interrupted(tokio::time::sleep(interval), tokio::signal::ctrl_c())
                .await
                .is_none()
            {
                info!("stopping dashboard");
                return Ok(());
            }
        }
    }

    fn print_cache_report(&self) -> Result<()> {
        let report = self.client.cache().report();
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize cache report")?;
        info!(target: "plain", "{json}");
        Ok(())
    }
}

/// Runs `fut` unless `interrupt` resolves first, in which case `fut` is dropped.
async fn until_interrupted<F: Future, I: Future>(fut: F, interrupt: I) -> Option<F::Output> {
    tokio::select! {
        out = fut => Some(out),
        _ = interrupt => None,
    }
}
