//! # Validate CLI — Check input locally and against every authority.
//!
//! Exit codes: `0` when the local check passes and, if authorities are
//! configured, at least one of them accepts the data; `2` otherwise.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use fisc_core::{TaxCalculationRequest, TaxCategory};
use fisc_engine::ValidationReport;
use serde::Serialize;

use crate::{load_engine, parse_input};

/// Validate subcommand arguments.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Tax category (e.g. wealth, vat, capital_gains, recurring_property).
    #[arg(long = "type", value_name = "CATEGORY")]
    pub category: TaxCategory,

    /// Fiscal year whose rules apply.
    #[arg(long)]
    pub year: i32,

    /// Input payload: inline JSON, or @path to a JSON file.
    #[arg(long)]
    pub data: String,
}

#[derive(Debug, Serialize)]
struct Outcome {
    valid: bool,
    local_error: Option<String>,
    #[serde(flatten)]
    authorities: ValidationReport,
}

/// Execute the validate subcommand.
pub async fn run_validate(args: &ValidateArgs, config: Option<&Path>, json: bool) -> Result<u8> {
    let input = parse_input(args.category, &args.data)?;
    let request = TaxCalculationRequest::new(input, args.year);
    let engine = load_engine(config)?;

    let local_error = engine.validate_locally(&request).err().map(|e| e.to_string());
    let authorities = engine.validate(&request.input).await;
    let valid = local_error.is_none()
        && (authorities.sources.is_empty() || authorities.is_valid);

    let outcome = Outcome {
        valid,
        local_error,
        authorities,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(if valid { 0 } else { 2 })
}

fn print_outcome(outcome: &Outcome) {
    match &outcome.local_error {
        None => println!("  OK    local rules"),
        Some(e) => println!("  FAIL  local rules: {e}"),
    }
    for source in &outcome.authorities.sources {
        match (&source.error, source.valid) {
            (Some(e), _) => println!("  ERROR {}: {e}", source.source),
            (None, true) => println!("  OK    {}", source.source),
            (None, false) => println!("  FAIL  {}", source.source),
        }
    }
    println!();
    println!("{}", if outcome.valid { "Valid" } else { "Invalid" });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(data: &str) -> ValidateArgs {
        ValidateArgs {
            category: TaxCategory::CapitalGains,
            year: 2024,
            data: data.to_string(),
        }
    }

    const SALE: &str = r#"{
        "sale_price": "300000",
        "purchase_price": "200000",
        "acquisition_costs": "0",
        "disposal_costs": "0",
        "improvement_costs": "0",
        "holding_years": 10
    }"#;

    #[tokio::test]
    async fn valid_input_without_authorities_exits_zero() {
        assert_eq!(run_validate(&args(SALE), None, false).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn locally_rejected_input_exits_two() {
        let bad = SALE.replace(r#""sale_price": "300000""#, r#""sale_price": "0""#);
        assert_eq!(run_validate(&args(&bad), None, true).await.unwrap(), 2);
    }
}
