//! # Pure Data Module / 纯数据模块 - Data Transfer Objects Only
//!
//! Defines configuration data structures and the TOML → DTO mapping.
//!
//! No validation and no default-value calculation happen here: a missing
//! key maps to an empty/zero value, and the application layer decides what
//! an empty value means.

mod app_config;

pub use app_config::AppConfig;
