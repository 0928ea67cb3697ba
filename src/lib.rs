//! Operator-supervised migration of public folders to a cloud destination.
//!
//! The pipeline collects an inventory from the source, shows a summary, asks the operator
//! to confirm, connects to the destination, migrates folders one at a time and writes a
//! self-contained HTML report of everything that happened.

pub mod adapters;
pub mod config;
pub mod context;
pub mod core;
pub mod logging;
