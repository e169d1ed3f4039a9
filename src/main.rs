use anyhow::Result;
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liquidity_watch::config::Config;
use liquidity_watch::format::NumberLocale;
use liquidity_watch::news::{NewsClient, NewsPager};
use liquidity_watch::panel::LiquidityPanel;
use liquidity_watch::pool::{AccountReader, PoolAccountRef, PoolAccounts, RpcBalanceReader};
use liquidity_watch::simulation::SimulatedReader;
use liquidity_watch::{LivePoolBalancePoller, PoolWatcher};

// Stand-in pool used when SIMULATION_MODE is on and no accounts are configured
const DEMO_ACCOUNT_A: &str = "So11111111111111111111111111111111111111112";
const DEMO_ACCOUNT_B: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const DEMO_LP_ACCOUNT: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liquidity_watch=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let locale = config.display.locale.parse::<NumberLocale>().unwrap_or_else(|e| {
        warn!("⚠️ {}, falling back to en-US", e);
        NumberLocale::default()
    });

    let accounts = match config.poller.pool_accounts()? {
        Some(accounts) => accounts,
        None if config.agent.simulation_mode => PoolAccounts::new(
            DEMO_ACCOUNT_A.parse()?,
            DEMO_ACCOUNT_B.parse()?,
            DEMO_LP_ACCOUNT.parse()?,
        ),
        None => anyhow::bail!(
            "No pool configured: set POOL_ACCOUNT_A, POOL_ACCOUNT_B and POOL_LP_ACCOUNT (or SIMULATION_MODE=true)"
        ),
    };

    print_banner(&config, &accounts);

    let reader: Arc<dyn AccountReader> = if config.agent.simulation_mode {
        info!("🎞️  Initializing Account Simulator");
        let sim = SimulatedReader::seeded(&accounts);
        sim.set_drift(0.02);
        Arc::new(sim)
    } else {
        info!("🌐 Initializing Solana RPC reader ({})", config.rpc.url);
        Arc::new(RpcBalanceReader::new(&config.rpc)?)
    };

    let mut panel = LiquidityPanel::new(accounts.clone(), locale)
        .with_explorer_cluster(config.display.explorer_cluster.clone())
        .with_slippage_pct(config.display.slippage_pct);
    if let Some(program) = &config.poller.amm_program_id {
        match program.parse::<PoolAccountRef>() {
            Ok(program) => panel = panel.with_amm_program(program),
            Err(e) => warn!("⚠️ Ignoring AMM_PROGRAM_ID: {}", e),
        }
    }
    for row in panel.address_rows() {
        info!("🔗 {} {} {}", row.label, row.short, row.explorer_url);
    }
    let panel = Arc::new(Mutex::new(panel));

    let poller = LivePoolBalancePoller::new(
        reader,
        Duration::from_millis(config.poller.interval_ms),
    )?
    .with_locale(locale);

    let update_panel = panel.clone();
    let error_panel = panel.clone();
    let mut watcher = PoolWatcher::new(
        poller,
        move |snapshot| {
            let mut panel = update_panel.lock().unwrap_or_else(PoisonError::into_inner);
            panel.apply_snapshot(snapshot);
            info!("💧 {}", panel.render_line());
        },
        move |err| {
            let mut panel = error_panel.lock().unwrap_or_else(PoisonError::into_inner);
            panel.apply_error(&err);
            warn!("⚠️ Keeping last balances: {}", err);
        },
    );
    watcher.retarget(accounts);

    if let (Some(_), Some(term)) = (&config.news.api_key, &config.news.search_term) {
        let term = term.clone();
        match NewsClient::new(&config.news) {
            Ok(client) => {
                tokio::spawn(async move {
                    print_news(&client, &term).await;
                });
            }
            Err(e) => warn!("⚠️ News disabled: {}", e),
        }
    }

    // Run until Ctrl+C
    tokio::signal::ctrl_c().await?;
    info!("👋 Shutting down");
    watcher.stop();

    Ok(())
}

async fn print_news(client: &NewsClient, term: &str) {
    let mut pager = NewsPager::new();
    match client.fetch_page(term, pager.page_index()).await {
        Ok(page) => {
            pager.set_total_results(page.total_results);
            let now = Utc::now();
            println!("\n📰 In the news: {}", term);
            for item in &page.items {
                println!(
                    "   • {} ({}) {}\n     {}",
                    item.publication,
                    item.age_label(now),
                    item.title,
                    item.url
                );
            }
            println!("   {}", pager.summary());
        }
        Err(e) => error!("❌ Failed to load the news feed: {}", e),
    }
}

fn print_banner(config: &Config, accounts: &PoolAccounts) {
    println!("\n╔═══════════════════════════════════════════════════════════╗");
    println!("║              Prediction Market Liquidity Watch            ║");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "📊 Mode: {}",
        if config.agent.simulation_mode {
            "SIMULATION (no RPC calls)"
        } else {
            "LIVE RPC"
        }
    );
    println!("🌐 RPC: {} ({})", config.rpc.url, config.rpc.commitment);
    println!("🏊 Pool:");
    println!("   • YES: {}", accounts.side_a);
    println!("   • NO:  {}", accounts.side_b);
    println!("   • LP:  {}", accounts.lp_supply);
    println!(
        "⏱️  Poll Interval: {} ms",
        config.poller.interval_ms
    );
    println!("🔤 Locale: {}", config.display.locale);
    println!();
    println!("Press Ctrl+C to stop");
    println!("═══════════════════════════════════════════════════════════");
    println!();
}
