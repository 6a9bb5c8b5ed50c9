//! Services shared by the dispatcher and the handlers.
//!
//! This module contains:
//! - The identity store (owner and trusted users)
//! - The handler registries
//! - Permission checks
//! - The reply sink abstraction and the console adapter
//!
//! The reply sink is a trait with a console implementation, allowing other
//! platform adapters to be plugged in and mocks to be used in tests.

pub mod console;
pub mod identity;
pub mod permission;
pub mod registry;
pub mod reply;
