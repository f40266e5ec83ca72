use sneakers_server::{config::ServerConfig, run::run};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match ServerConfig::load() {
        Ok(args) => args,
        Err(sneakers_server::Error::Arguments(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };
    run(args).await?;
    Ok(())
}
