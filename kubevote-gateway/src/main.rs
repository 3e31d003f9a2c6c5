//! `votifier`: the public Votifier vote gateway (spec §4.5).

use kubevote_gateway::GatewayConfig;

#[tokio::main]
async fn main() {
    kubevote_utils::config::load_dotenv();

    let config = match GatewayConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    kubevote_utils::logging::init(config.debug);

    if let Err(err) = kubevote_gateway::run(config).await {
        tracing::error!(%err, "votifier exited with a fatal error");
        std::process::exit(1);
    }
}
