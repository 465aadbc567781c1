use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use wd_dashboard::{CatalogView, Dashboard, DashboardConfig, DashboardSnapshot, HistoryTarget, NoticeKind};
use wd_types::{Account, AssetStandard, ChainType, short_address};
use wd_wallet_http::HttpWalletService;

/// Prints the home dashboard of one wallet address.
#[derive(Parser, Debug, PartialEq)]
#[command(name = "dashboard-cli")]
#[command(long_about = None)]
struct Cli {
    /// Address to show
    address: String,

    /// Asset tab: ordinals, brc20, atomicals or runes
    #[arg(long, value_parser = parse_standard)]
    tab: Option<AssetStandard>,

    /// 1-based page of the asset list
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page: Option<u32>,

    /// Chain to query, e.g. bitcoin_mainnet or fractal_testnet (default: DASHBOARD_CHAIN)
    #[arg(long, value_parser = parse_chain)]
    chain: Option<ChainType>,

    /// Browser tab whose connected site is reported
    #[arg(long)]
    tab_id: Option<i64>,

    /// Print the snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn parse_standard(raw: &str) -> Result<AssetStandard, String> {
    AssetStandard::parse(raw).ok_or_else(|| format!("unknown asset tab: {raw}"))
}

fn parse_chain(raw: &str) -> Result<ChainType, String> {
    ChainType::parse(raw).ok_or_else(|| format!("unknown chain: {raw}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let mut config = DashboardConfig::from_env();
    if let Some(chain) = args.chain {
        config.chain = chain;
    }

    let service = HttpWalletService::new(Some(config.wallet_service_url.clone()), config.request_timeout())?;
    info!(endpoint = service.endpoint(), chain = ?config.chain, "dashboard-cli starting");
    let dashboard = Dashboard::new(Arc::new(service), &config);

    dashboard.load_home_status(args.tab_id).await;
    dashboard.switch_account(Account::new(args.address.as_str(), "cli")).await;
    if let Some(tab) = args.tab {
        dashboard.select_tab(tab).await;
    }
    if let Some(page) = args.page {
        dashboard.set_page(page, config.page_size()).await?;
    }
    dashboard.request_utxo_refresh().await?;

    let snapshot = dashboard.snapshot().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render(&snapshot));
    }

    for notice in dashboard.drain_notices().await {
        match notice.kind {
            NoticeKind::Error => eprintln!("error: {}", notice.message),
            NoticeKind::ConfirmedModeEnabled => eprintln!("notice: {}", notice.message),
        }
    }

    Ok(())
}

fn render(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    if let Some(account) = &snapshot.account {
        let keyring = snapshot
            .home
            .keyring_name
            .as_deref()
            .map(|name| format!("{name} / "))
            .unwrap_or_default();
        out.push_str(&format!(
            "{keyring}{} ({})  {:?}\n",
            account.display_name,
            short_address(account.address.as_str(), 6),
            snapshot.chain
        ));
    }
    let config = &snapshot.home.wallet_config;
    if !config.chain_tip.trim().is_empty() {
        out.push_str(&format!("! {}\n", config.chain_tip.trim()));
    }
    if !config.status_message.trim().is_empty() {
        out.push_str(&format!("! {}\n", config.status_message.trim()));
    }
    if let Some(version) = &snapshot.home.upgrade_available {
        out.push_str(&format!("version {version} is available\n"));
    }
    if snapshot.home.site_connected {
        out.push_str("site connected\n");
    }
    if snapshot.home.show_safe_notice {
        out.push_str("keep your recovery phrase offline\n");
    }

    out.push_str(&format!("\n{}\n", snapshot.headline));
    if let Some(fiat) = &snapshot.fiat {
        out.push_str(&format!("{fiat}\n"));
    }
    if let Some(balance) = &snapshot.balance {
        out.push_str(&format!("  Available    {}\n", balance.available));
        out.push_str(&format!("  Unavailable  {}\n", balance.unavailable));
        out.push_str(&format!("  Total        {}\n", balance.total));
    }

    let tabs: Vec<String> = snapshot
        .tabs
        .iter()
        .map(|tab| {
            if *tab == snapshot.active_tab {
                format!("[{}]", tab.label())
            } else {
                tab.label().to_owned()
            }
        })
        .collect();
    out.push_str(&format!("\n{}\n", tabs.join("  ")));

    match snapshot.page.view() {
        CatalogView::Loading => out.push_str("loading...\n"),
        CatalogView::Empty => out.push_str("no assets\n"),
        CatalogView::Populated { items, total } => {
            for item in items {
                let price = snapshot
                    .prices
                    .as_ref()
                    .and_then(|prices| prices.get(&item.ticker))
                    .map(|price| format!("  {} ({:+.2}%)", price.cur_price, price.change_percent))
                    .unwrap_or_default();
                out.push_str(&format!("  {:<12} {}{}\n", item.ticker, item.amount, price));
            }
            out.push_str(&format!(
                "page {} of {} items ({} per page)\n",
                snapshot.page.page, total, snapshot.page.page_size
            ));
        }
    }

    match &snapshot.history {
        Some(HistoryTarget::InApp) => out.push_str("\nhistory: in app\n"),
        Some(HistoryTarget::External(url)) => out.push_str(&format!("\nhistory: {url}\n")),
        None => {}
    }
    if !snapshot.buy_enabled {
        out.push_str("buy: unavailable on this chain\n");
    }

    out
}
