//! Workbasket Engine Library
//!
//! Workbaskets, their distribution-target graph and per-basket access
//! control, persisted under a caller-controlled connection mode. Start from
//! [`engine::Engine`].

pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod types;
