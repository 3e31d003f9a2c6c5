//! `bridge`: the chat-channel <-> game relay engine (spec §4.6/§4.7).

use kubevote_bridge::config::BridgeConfig;

#[tokio::main]
async fn main() {
    kubevote_utils::config::load_dotenv();

    let config = match BridgeConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    kubevote_utils::logging::init(config.debug);

    if let Err(err) = kubevote_bridge::run(config).await {
        tracing::error!(%err, "bridge exited with a fatal error");
        std::process::exit(1);
    }
}
