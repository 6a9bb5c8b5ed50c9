//! Interaction handling for the router.
//!
//! This module provides the inbound side of the router:
//! - The interaction model and its reply channels
//! - Handler traits for commands, buttons, modals and select menus
//! - The dispatcher, failure reporting and sub-command dispatch
//! - Built-in commands

pub mod builtin;
pub mod dispatcher;
pub mod event;
pub mod failure;
pub mod handler;
pub mod sub_command;
