//! # Rules CLI — Inspect the rule registry.
//!
//! ```bash
//! fisc rules list
//! fisc rules list --category wealth
//! fisc rules history wealth_tax
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use fisc_core::TaxCategory;
use fisc_engine::Engine;
use fisc_rules::RuleSummary;

/// Rules subcommand arguments.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

/// Available rules subcommands.
#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// List the current rules in registration order.
    List {
        /// Only rules of this category.
        #[arg(long)]
        category: Option<TaxCategory>,
    },

    /// Show the superseded versions of a rule, oldest first.
    History {
        /// Rule identifier.
        rule_id: String,
    },
}

/// Execute the rules subcommand.
pub fn run_rules(args: &RulesArgs, engine: &Engine, json: bool) -> Result<u8> {
    match &args.command {
        RulesCommand::List { category } => {
            let rules = engine.rules(*category);
            print_rules(&rules, json)?;
            Ok(0)
        }
        RulesCommand::History { rule_id } => {
            let registry = engine.registry().read();
            if registry.resolve(rule_id, None).is_none() {
                anyhow::bail!("unknown rule: {rule_id}");
            }
            let history: Vec<RuleSummary> =
                registry.history(rule_id).iter().map(|r| r.summary()).collect();
            drop(registry);
            print_rules(&history, json)?;
            Ok(0)
        }
    }
}

fn print_rules(rules: &[RuleSummary], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rules)?);
        return Ok(());
    }
    for rule in rules {
        let from = rule
            .metadata
            .effective_from
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        let until = rule
            .metadata
            .effective_until
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<26} {:<20} {from:>10} .. {until:<10} {}",
            rule.id,
            rule.category.as_str(),
            rule.name
        );
    }
    println!();
    println!("Total: {} rules", rules.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_and_history_succeed() {
        let engine = Engine::standard();
        let list = RulesArgs {
            command: RulesCommand::List { category: None },
        };
        assert_eq!(run_rules(&list, &engine, false).unwrap(), 0);

        let history = RulesArgs {
            command: RulesCommand::History {
                rule_id: "wealth_tax".into(),
            },
        };
        assert_eq!(run_rules(&history, &engine, true).unwrap(), 0);
    }

    #[test]
    fn history_of_unknown_rule_fails() {
        let engine = Engine::standard();
        let args = RulesArgs {
            command: RulesCommand::History {
                rule_id: "poll_tax".into(),
            },
        };
        assert!(run_rules(&args, &engine, false).is_err());
    }
}
