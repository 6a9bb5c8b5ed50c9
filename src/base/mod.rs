//! Core components, types, and utilities for the interaction router.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The error taxonomy of the routing core.
//! - Common types and result handling.

pub mod config;
pub mod error;
pub mod types;
