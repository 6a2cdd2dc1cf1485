//! Opt-in tracing setup for applications embedding `mdrich`.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the host unless
//! it calls `init_default_tracing`.

/// Installs a compact `tracing` subscriber honouring `RUST_LOG` when the `telemetry` feature is
/// enabled.
///
/// Returns `false` when the feature is disabled or a global subscriber is already set.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_target(true)
            .compact();

        return builder.try_init().is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
