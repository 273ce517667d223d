use dotenvy::dotenv;
use floyds_orders::{
    config::{self, database, menu},
    core::{ledger, report},
    errors::Result,
    persistence::{LocalStore, gateway_from_config},
    session::Session,
    timers,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Open the local store
    let db = database::create_connection(&app_config.storage.database_url)
        .await
        .inspect_err(|e| error!("Failed to open local store: {e}"))?;
    database::create_tables(&db).await?;
    info!("Local store ready at {}", app_config.storage.database_url);
    let store = LocalStore::new(db, app_config.storage.state_key.clone());
    info!("Session state is kept under key {}", store.key());

    // 5. Seed the session
    let gateway = gateway_from_config(&app_config.api)?;
    let default_menu = match std::env::var("MENU_PATH") {
        Ok(path) => menu::load_catalog(&path)?,
        Err(_) => menu::builtin_catalog()?,
    };
    let session = Session::start(gateway, store, default_menu).await;
    {
        let state = session.state();
        let totals = report::profit_totals(&report::daily_profit_local(&state.transactions));
        info!(
            "Session ready: {} menu items, {} transactions, {} customers, profit {}",
            state.menu_items.len(),
            state.transactions.len(),
            ledger::user_ledgers(&state.transactions).len(),
            report::format_rupees(totals.profit)
        );
    }
    let session = session.into_shared();

    // 6. Background loops
    let shutdown = CancellationToken::new();
    let progression = app_config.order_progression.enabled.then(|| {
        timers::spawn_order_progression(
            Arc::clone(&session),
            app_config.order_progression,
            shutdown.clone(),
        )
    });
    let (mut open_rx, hours_task) = timers::spawn_open_hours_watch(app_config.hours, shutdown.clone());
    info!(
        "Restaurant is {}",
        if *open_rx.borrow_and_update() { "open" } else { "closed" }
    );

    // 7. Run until interrupted
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    shutdown.cancel();
    if let Some(task) = progression
        && let Err(e) = task.await
    {
        error!("Order progression task failed: {e}");
    }
    if let Err(e) = hours_task.await {
        error!("Opening-hours task failed: {e}");
    }

    let mut session = session.lock().await;
    let pending = session.pending_syncs();
    if pending > 0 {
        info!("Waiting for {pending} remote syncs");
    }
    session.settle_syncs().await;
    Ok(())
}
