use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, MAX_TOP_N, ProviderConfig, ResolverConfig, UniverseConfig};

/// Prefix of the environment variables that override file settings,
/// e.g. `NUMERAIRE__RESOLVER__TOLERANCE_SECS=900`.
pub const ENV_PREFIX: &str = "NUMERAIRE";

/// Loads the application configuration.
///
/// Sources are layered in this order, later ones winning: built-in defaults,
/// the TOML file (`path`, or an optional `config.toml` in the working
/// directory), then `NUMERAIRE__*` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        // Tells the builder to look for a file named `config.toml`, if there is one.
        None => config::File::with_name("config.toml").required(false),
    };

    let builder = with_defaults(config::Config::builder())?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let config = finish(builder)?;
    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}

/// Registers the built-in defaults, which reproduce the reference behavior:
/// hourly CoinGecko data in USD, a half-hour tolerance on each side, and the
/// top 20 assets by market cap.
fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("provider.base_url", "https://api.coingecko.com/api/v3")?
        .set_default("provider.vs_currency", "usd")?
        .set_default("provider.request_timeout_secs", 20_i64)?
        .set_default("resolver.tolerance_secs", 1800_i64)?
        .set_default("resolver.cache_ttl_secs", 3600_i64)?
        .set_default("resolver.max_concurrent_requests", 4_i64)?
        .set_default("universe.top_n", 20_i64)?
        .set_default("universe.default_target", "bitcoin")?)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

/// Builds a configuration from defaults plus an in-memory TOML document.
pub fn config_from_toml(toml: &str) -> Result<Config, ConfigError> {
    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::from_str(toml, config::FileFormat::Toml));
    finish(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = config_from_toml("").unwrap();
        assert_eq!(config.provider.base_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.provider.vs_currency, "usd");
        assert_eq!(config.provider.request_timeout_secs, 20);
        assert_eq!(config.resolver.tolerance_secs, 1800);
        assert_eq!(config.resolver.cache_ttl_secs, 3600);
        assert_eq!(config.resolver.max_concurrent_requests, 4);
        assert_eq!(config.universe.top_n, 20);
        assert_eq!(config.universe.default_target.as_deref(), Some("bitcoin"));
        assert!(config.universe.pivot_pair().is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = config_from_toml(
            r#"
            [resolver]
            tolerance_secs = 900
            cache_ttl_secs = 0

            [universe]
            top_n = 5
            pivots = ["bitcoin", "tether"]
            "#,
        )
        .unwrap();

        assert_eq!(config.resolver.tolerance().as_secs(), 900);
        assert!(config.resolver.cache_ttl().is_zero());
        assert_eq!(config.universe.top_n, 5);
        assert_eq!(config.universe.pivot_pair(), Some(("bitcoin", "tether")));
        // Untouched sections keep their defaults.
        assert_eq!(config.provider.vs_currency, "usd");
    }

    #[test]
    fn rejects_zero_tolerance() {
        let err = config_from_toml("[resolver]\ntolerance_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rejects_top_n_out_of_range() {
        assert!(config_from_toml("[universe]\ntop_n = 0\n").is_err());
        assert!(config_from_toml("[universe]\ntop_n = 251\n").is_err());
    }

    #[test]
    fn rejects_wrong_pivot_count() {
        let err = config_from_toml("[universe]\npivots = [\"bitcoin\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn single_asset_listing_needs_explicit_pivots() {
        assert!(config_from_toml("[universe]\ntop_n = 1\n").is_err());
        assert!(
            config_from_toml("[universe]\ntop_n = 1\npivots = [\"bitcoin\", \"ethereum\"]\n")
                .is_ok()
        );
    }
}
