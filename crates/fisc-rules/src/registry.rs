//! # Rule Registry
//!
//! One active [`Rule`] per id, plus every superseded version of it.
//!
//! ## Design
//!
//! - `register` archives the previous definition (if any) at the end of that
//!   id's history, oldest first, then installs the new one. History is never
//!   reordered or pruned.
//! - A re-registered id keeps its original position in [`RuleRegistry::list`].
//! - Date-bounded resolution checks only the *current* rule's window; an
//!   archived version that applied at that date is not returned. Callers that
//!   need it can inspect [`RuleRegistry::history`].
//! - "Unknown id" and "not applicable at that date" both resolve to `None`.
//!
//! The registry performs no I/O and no locking; callers that share one
//! across tasks wrap it themselves.

use std::collections::HashMap;

use chrono::NaiveDate;
use fisc_core::{Amount, TaxCategory, TaxInput};

use crate::error::RuleError;
use crate::rule::Rule;

/// Versioned rule store.
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    order: Vec<String>,
    current: HashMap<String, Rule>,
    history: HashMap<String, Vec<Rule>>,
}

impl RuleRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `rules`, registered in iteration order.
    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut registry = Self::new();
        for rule in rules {
            registry.register(rule);
        }
        registry
    }

    /// Install `rule` as current for its id, archiving any prior definition.
    pub fn register(&mut self, rule: Rule) {
        let id = rule.id().to_string();
        match self.current.insert(id.clone(), rule) {
            Some(previous) => {
                tracing::debug!(rule_id = %id, "rule superseded; previous version archived");
                self.history.entry(id).or_default().push(previous);
            }
            None => {
                tracing::debug!(rule_id = %id, "rule registered");
                self.order.push(id);
            }
        }
    }

    /// Current rule for `rule_id`, restricted to its window when `as_of` is given.
    pub fn resolve(&self, rule_id: &str, as_of: Option<NaiveDate>) -> Option<&Rule> {
        let rule = self.current.get(rule_id)?;
        match as_of {
            Some(date) if !rule.is_applicable_at(date) => {
                tracing::debug!(rule_id, %date, "current rule outside its effective window");
                None
            }
            _ => Some(rule),
        }
    }

    /// First current rule, in registration order, of `category` and applicable at `as_of`.
    pub fn resolve_for(&self, category: TaxCategory, as_of: Option<NaiveDate>) -> Option<&Rule> {
        self.iter_current()
            .filter(|r| r.category() == category)
            .find(|r| as_of.map_or(true, |d| r.is_applicable_at(d)))
    }

    /// Current rules in registration order, optionally filtered by category.
    pub fn list(&self, category: Option<TaxCategory>) -> Vec<&Rule> {
        self.iter_current()
            .filter(|r| category.map_or(true, |c| r.category() == c))
            .collect()
    }

    /// Superseded versions of `rule_id`, oldest first. Empty for unknown ids.
    pub fn history(&self, rule_id: &str) -> &[Rule] {
        self.history.get(rule_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve, validate, then calculate.
    ///
    /// # Errors
    ///
    /// [`RuleError::NotFound`] when resolution yields nothing,
    /// [`RuleError::Validation`] when the input is rejected.
    pub fn evaluate(
        &self,
        rule_id: &str,
        input: &TaxInput,
        as_of: Option<NaiveDate>,
    ) -> Result<Amount, RuleError> {
        let rule = self.resolve(rule_id, as_of).ok_or_else(|| RuleError::NotFound {
            rule_id: rule_id.to_string(),
            as_of,
        })?;
        rule.evaluate(input).map_err(|source| RuleError::Validation {
            rule_id: rule_id.to_string(),
            source,
        })
    }

    /// Number of distinct rule ids.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn iter_current(&self) -> impl Iterator<Item = &Rule> {
        self.order.iter().filter_map(|id| self.current.get(id))
    }
}
