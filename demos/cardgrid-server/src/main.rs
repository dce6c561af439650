//! Cardgrid server binary.
//!
//! Configuration comes from the environment (see
//! [`ServerConfig::from_env`]); log filtering from `RUST_LOG`.
//!
//! ```text
//! CARDGRID_BIND=0.0.0.0:8080 RUST_LOG=cardgrid=debug cargo run -p cardgrid-server
//! ```

use cardgrid::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("info");

    let config = ServerConfig::from_env()?;
    tracing::info!(bind = %config.bind_addr, "starting cardgrid server");

    let server = CardgridServerBuilder::from_config(config).build().await?;
    server.run().await?;
    Ok(())
}
