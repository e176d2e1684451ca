use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Fails if a subscriber is already
/// installed.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filedock=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!("Tracing initialized");
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_telemetry_installs_once() {
        assert!(init_telemetry().is_ok());
        assert!(init_telemetry().is_err());
        shutdown_telemetry().await;
    }
}
