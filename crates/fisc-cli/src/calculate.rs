//! # Calculate CLI — Compute a tax liability.
//!
//! ```bash
//! fisc calculate --type wealth --year 2024 --data '{"net_worth": "1500000"}'
//! fisc calculate --type vat --year 2024 --data @invoice.json --no-fallback
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use fisc_core::{TaxCalculationRequest, TaxCalculationResponse, TaxCategory};

use crate::{load_engine, parse_input};

/// Calculate subcommand arguments.
#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Tax category (e.g. wealth, vat, capital_gains, recurring_property).
    #[arg(long = "type", value_name = "CATEGORY")]
    pub category: TaxCategory,

    /// Fiscal year being assessed.
    #[arg(long)]
    pub year: i32,

    /// Input payload: inline JSON, or @path to a JSON file.
    #[arg(long)]
    pub data: String,

    /// Fail instead of computing locally when every authority fails.
    #[arg(long)]
    pub no_fallback: bool,
}

/// Execute the calculate subcommand.
pub async fn run_calculate(args: &CalculateArgs, config: Option<&Path>, json: bool) -> Result<u8> {
    let input = parse_input(args.category, &args.data)?;
    let request = TaxCalculationRequest::new(input, args.year);

    let mut engine = load_engine(config)?;
    if args.no_fallback {
        engine.set_fallback_enabled(false);
    }

    let response = engine
        .calculate(&request)
        .await
        .with_context(|| format!("calculating {} for {}", args.category, args.year))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&request, &response);
    }
    Ok(0)
}

fn print_response(request: &TaxCalculationRequest, response: &TaxCalculationResponse) {
    println!("Category:  {}", request.category());
    println!("Year:      {}", request.year);
    println!("Amount:    {}", response.amount);
    println!("Source:    {}", response.source);
    println!("Computed:  {}", response.timestamp);
}
