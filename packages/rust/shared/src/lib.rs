//! Shared types, error model, and configuration for auditbook.
//!
//! This crate is the foundation depended on by the core crate and both apps.
//! It provides:
//! - [`AuditBookError`], the unified error type
//! - Domain types ([`Score`], [`Grade`], [`Verdict`], [`Phase`], [`ModelTier`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrowserConfig, DashboardConfig, ModelsConfig, ReportConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{AuditBookError, Result};
pub use types::{AgentStatus, Badge, Grade, ModelTier, Phase, ReviewEntry, Score, Verdict};
