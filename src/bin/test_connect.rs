use tracing::error;
use warehouse_export::commands::connect;
use warehouse_export::{logging, ConnectionConfig};

#[tokio::main]
async fn main() {
    logging::init();

    let config = match ConnectionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Connection settings incomplete: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = connect::run(&config).await {
        error!("Connection test failed: {:#}", e);
        std::process::exit(1);
    }
}
