// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # zktree
//!
//! Declarative, idempotent reconciliation of hierarchical key/value trees
//! against a ZooKeeper-like coordination service.
//!
//! ## Overview
//!
//! An operator describes the tree they want in a YAML (or JSON) document.
//! zktree fetches the live tree, computes the minimal ordered set of edits
//! and either reports or applies them:
//!
//! - Creates are emitted parent-before-child
//! - Deletes are emitted child-before-parent
//! - Subtrees marked `ignore` are never touched
//! - The first failed edit stops the run and reports what was applied
//!
//! ## Modules
//!
//! - [`tree`]: Node model, tree documents, validation and fingerprints
//! - [`client`]: Coordination client trait and backends
//! - [`live`]: Live tree fetching and mutation
//! - [`planner`]: Diff engine, actions, executor and handlers
//! - [`reconciler`]: One-shot reconciliation runs and drift checks
//! - [`config`]: Settings parsing and validation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! children:
//!   - name: app
//!     value: v2
//!     children:
//!       - name: db
//!         value: postgres://db:5432
//!       - name: runtime
//!         ignore: true
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod live;
pub mod planner;
pub mod reconciler;
pub mod tree;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{CoordinationClient, LocalClient, MemoryClient, NamespacedClient, RetryingClient};
pub use config::{Settings, SettingsParser, SettingsValidator};
pub use error::{Result, ZkTreeError};
pub use live::LiveTree;
pub use planner::{Action, ActionExecutor, ActionKind, DiffEngine, ExecutionMode, ReconcilePlan};
pub use reconciler::{DriftReport, ReconciliationResult, Reconciler};
pub use tree::{Node, TreeParser, TreeValidator};
