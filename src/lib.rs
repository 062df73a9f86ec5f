//! Collapsible tree diagrams from flat parent-linked records.
//!
//! Layers, innermost first:
//! - [`domain`]: hierarchy model and tidy layout
//! - [`application`]: interaction engine and data services
//! - [`infrastructure`]: filesystem and HTTP boundaries, service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
