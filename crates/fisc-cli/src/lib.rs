//! # fisc-cli — Command Line for the fisc Tax Engine
//!
//! ## Subcommands
//!
//! - `fisc calculate` — compute a liability through the authority chain,
//!   falling back to local rules.
//! - `fisc validate` — check input locally and against every configured
//!   authority.
//! - `fisc rules list` — show the registered rules.
//!
//! ```bash
//! fisc calculate --type wealth --year 2024 --data '{"net_worth": "1500000"}'
//! fisc --config fisc.yaml validate --type vat --year 2024 --data @invoice.json
//! fisc rules list --category capital_gains
//! ```
//!
//! Without `--config`, the engine runs with the standard rules and no
//! authorities, so every calculation is local.

pub mod calculate;
pub mod rules;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use fisc_core::{TaxCategory, TaxInput};
use fisc_engine::{Engine, EngineConfig};

/// Build the engine from `config`, or from defaults plus `FISC_*`
/// environment overrides when no file is given.
pub fn load_engine(config: Option<&Path>) -> Result<Engine> {
    let config = match config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let mut config = EngineConfig::default();
            config
                .apply_overrides(|var| std::env::var(var).ok())
                .context("applying environment overrides")?;
            config
        }
    };
    Engine::from_config(&config).context("building engine")
}

/// Parse a `--data` argument: inline JSON, or `@path` to read JSON from a file.
pub fn read_data(arg: &str) -> Result<serde_json::Value> {
    let (text, origin) = match arg.strip_prefix('@') {
        Some(path) => (
            std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
            path,
        ),
        None => (arg.to_string(), "--data"),
    };
    serde_json::from_str(&text).with_context(|| format!("parsing JSON from {origin}"))
}

/// Typed input for `category` from a `--data` argument.
pub fn parse_input(category: TaxCategory, data: &str) -> Result<TaxInput> {
    let value = read_data(data)?;
    TaxInput::from_parts(category, value)
        .with_context(|| format!("data does not match the {category} input shape"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn inline_data_parses() {
        let input = parse_input(TaxCategory::Wealth, r#"{"net_worth": "1500000"}"#).unwrap();
        assert_eq!(input.category(), TaxCategory::Wealth);
    }

    #[test]
    fn file_data_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"net_amount": 1000}"#).unwrap();
        let arg = format!("@{}", file.path().display());
        let input = parse_input(TaxCategory::Vat, &arg).unwrap();
        assert_eq!(input.category(), TaxCategory::Vat);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let err = parse_input(TaxCategory::Wealth, r#"{"net_amount": "1"}"#).unwrap_err();
        assert!(format!("{err:#}").contains("wealth input shape"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_data("@/nonexistent/input.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/input.json"));
    }

    #[test]
    fn engine_without_config_has_no_authorities() {
        let engine = load_engine(None).unwrap();
        assert!(engine.orchestrator().adapter_names().is_empty());
        assert_eq!(engine.rules(None).len(), 4);
    }

    #[test]
    fn engine_from_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"orchestrator:\n  fallback_enabled: true\n").unwrap();
        let engine = load_engine(Some(file.path())).unwrap();
        assert!(engine.orchestrator().adapter_names().is_empty());
    }
}
