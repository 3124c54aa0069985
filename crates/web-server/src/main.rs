use configuration::LogFormat;
use std::path::Path;
use tracing_subscriber::EnvFilter;

// This main function is the entry point when running `cargo run -p web-server`.
// It is a bare development entry point: it reads `.env` and `config.toml` and
// honours `logging.level` and `logging.format`, but does not set up the rolling
// log file from `logging.directory`. Deployments use `viewtrends serve`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = configuration::load_config(Path::new("config.toml"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format {
        LogFormat::Full => subscriber.init(),
        LogFormat::Compact => subscriber.compact().init(),
    }

    web_server::run_server(&config).await
}
