//! Common types and utilities for ledger populators.
//!
//! This crate provides the argument types shared by every
//! `ledger-populate-*` command and the driver that turns them into a
//! generation run against any [`Store`](ledger_core::Store).

pub mod args;
pub mod run;

pub use args::CommonPopulateArgs;
pub use run::{dry_run, populate};
