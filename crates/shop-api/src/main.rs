//! # Storefront RS
//!
//! Storefront backend: accounts, catalog, carts and checkout over a
//! PostgREST record store.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export JWT_SECRET_KEY=change-me-at-least-16-bytes
//! export SUPABASE_URL=https://xxxx.supabase.co
//! export SUPABASE_KEY=...
//!
//! # Run the server
//! storefront
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Record store: {}", state.backend);
    info!(
        "Token TTL: {}s, hash cost: {}",
        state.config.auth.token_ttl.num_seconds(),
        state.config.auth.hash_cost
    );

    let app = routes::create_router(state);

    info!("Storefront starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Sign up: POST http://{}/users/sign/up", addr);
        info!("Checkout: POST http://{}/orders", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Storefront RS
  ━━━━━━━━━━━━━━━━━━━━━━━
  Accounts, carts & checkout
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
