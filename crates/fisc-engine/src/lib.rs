//! # fisc-engine — Calculation Orchestration
//!
//! Ties the rule registry and the external authorities together:
//!
//! - [`CalculationCache`]: TTL store keyed by request fingerprint.
//! - [`LocalCalculator`]: registry rules, then simplified flat formulas.
//! - [`AdapterOrchestrator`]: sequential fallback across authorities with
//!   per-adapter timeouts and an overall deadline, then local fallback;
//!   concurrent quorum validation.
//! - [`EngineConfig`]: YAML configuration with environment overrides.
//! - [`Engine`]: all of the above built from one configuration.
//!
//! ## Failure Policy
//!
//! A single authority failing is never an error for the caller. Only
//! invalid input, bad configuration, or exhaustion of every computation
//! path surfaces as an [`EngineError`], and the exhaustion errors list
//! every authority's failure.
//!
//! ## Concurrency
//!
//! The orchestrator is the only component that awaits. Lock guards on the
//! registry, cache and credential store are never held across an await.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod local;
pub mod orchestrator;

pub use cache::{CalculationCache, DEFAULT_TTL, MAX_TTL};
pub use config::{
    AuthEntry, AuthorityEntry, CacheConfig, ConfigError, EngineConfig, OrchestratorConfig,
};
pub use engine::Engine;
pub use error::{AdapterFailure, EngineError};
pub use local::{simplified_liability, LocalCalculator, SIMPLIFIED_CORPORATE_RATE, SIMPLIFIED_VAT_RATE};
pub use orchestrator::{AdapterOrchestrator, OrchestratorSettings, SourceVerdict, ValidationReport};
