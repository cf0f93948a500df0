use task_pool::config::ServiceConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    eprintln!("⚙️  Task Pool v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}/tasks", config.bind_addr());
    eprintln!(
        "   Workers: {} (poll every {}ms)\n",
        config.worker_count,
        config.poll_interval.as_millis()
    );

    task_pool::server::run(config, CancellationToken::new()).await?;

    Ok(())
}
