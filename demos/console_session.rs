//! Console session example
//!
//! Walks through a short admin session against the simulated backend:
//! log in, browse tables, navigate, switch mode.
//!
//! Run with: cargo run --example console_session
//! Set RUST_LOG=console_client=debug to see the client's logs.

use console_client::client::{ApiClient, ClientConfig, LogQuery};
use console_client::router::{MemoryLocation, RouteParams, Router};
use console_client::state::{AppState, MemoryStorage};
use console_client::types::LogLevel;
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Console Session Example");
    println!("=======================\n");

    let state = AppState::load(Arc::new(MemoryStorage::new())).await;
    println!("Mode: {}", state.mode());

    let config = ClientConfig {
        simulated_latency_min_ms: 50,
        simulated_latency_max_ms: 100,
        ..Default::default()
    };

    // The credential exchange needs no token.
    let anonymous = ApiClient::builder("").mode(state.mode()).config(config.clone()).build();
    let auth = anonymous.login_with_password("admin@example.com", "password").await?;
    println!("Logged in as {}", auth.user.email);

    let client = ApiClient::builder(auth.token)
        .mode(state.mode())
        .config(config)
        .store(anonymous.simulated_store().clone())
        .on_unauthorized(|| println!("  -> session expired"))
        .on_error(|message, severity| println!("  -> [{}] {}", severity.as_str(), message))
        .build();

    println!("\nTables:");
    for table in client.list_tables().await? {
        println!("  {:>2} {:<20} {:?}", table.id, table.name, table.table_type);
    }

    println!("\nError logs:");
    let query = LogQuery {
        level: Some(LogLevel::Error),
        search: None,
    };
    for entry in client.list_logs(&query).await? {
        println!("  {} {}", entry.timestamp, entry.message);
    }

    println!("\nA missing table:");
    if let Err(e) = client.get_table("404").await {
        println!("  {}", e);
    }

    let router = Router::new(Arc::new(MemoryLocation::new("")));
    let mut routes = router.subscribe();
    if let Some(route) = routes.next().await {
        println!("\nStarting route: {}", route.path);
    }

    let mut params = RouteParams::new();
    params.insert("table".to_string(), "users".to_string());
    router.navigate("/records", Some(&params));
    if let Some(route) = routes.next().await {
        println!("Navigated to {} {:?}", route.path, route.params);
    }

    state.set_mode(console_client::AppMode::Prod).await;
    client.update_mode(state.mode(), Some("https://api.example.com"));
    println!("\nSwitched to {} using the {} transport", client.mode(), client.transport_name());

    Ok(())
}
