use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the process-wide tracing subscriber.
///
/// Host applications embedding the engine call this once at startup;
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ess_sizer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
