use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const ENV_VAR: &str = "TYPIST_LOG";

/// Directives from `TYPIST_LOG` (e.g. `debug` or `typist.engine=trace`); off when unset or invalid.
fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new("off"))
}

/// Install a stderr subscriber. `log` records from the library crates are bridged into it,
/// and stdout stays free for the animation frame.
pub fn init_from_env() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(filter_from_env())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .without_time(),
        )
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_accept_dotted_targets() {
        let filter = EnvFilter::try_new("typist.engine=debug,typist.markup=trace");
        assert!(filter.is_ok());
    }

    #[test]
    fn env_var_name_is_documented_in_help() {
        assert!(crate::cli::HELP_TEXT.contains(ENV_VAR));
    }
}
