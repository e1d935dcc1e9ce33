use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose logs are only noise at `info`.
const SILENCED_TARGETS: [&str; 5] = [
    "hyper_util=off",
    "reqwest=off",
    "sqlx=warn",
    "sea_orm=warn",
    "tower_http=warn",
];

fn env_filter() -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in SILENCED_TARGETS {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Installs the global subscriber. `LOG_FORMAT=compact` switches from the
/// default JSON lines to human readable output.
pub fn setup_tracing() {
    let compact = env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("compact"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter());

    if compact {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_line_number(true)
                    .with_writer(std::io::stdout),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true),
            )
            .init();
    }
}
