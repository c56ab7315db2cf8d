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

//! # apigw-sync
//!
//! Declarative, idempotent synchronization of an API Gateway REST API.
//!
//! ## Overview
//!
//! A YAML definition describes resources, methods, integrations,
//! authorizers, alarms and API keys. Each run re-fetches the live API,
//! computes field-level patches against it and applies only what differs:
//!
//! - Missing path segments are created parents first
//! - Methods, integrations and responses are put when absent, patched otherwise
//! - Authorizers, alarms and API keys are created once and never updated
//! - Undeclared resources are pruned, unless they still have children
//!
//! Running twice against an unchanged definition issues no mutating call.
//!
//! ## Modules
//!
//! - [`config`]: Definition loading, validation, run options and credentials
//! - [`model`]: Normalized resource, method and integration model
//! - [`planner`]: Patch generation, call sequencing and the change journal
//! - [`gateway`]: Remote service traits, AWS clients and the state mirror
//! - [`reconciler`]: The reconciliation engine
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! resources:
//!   - path: /users
//!     description: Users
//!     methods:
//!       GET:
//!         integrationType: http
//!         url: http://backend.internal/users
//!         responses:
//!           "200":
//!             headers:
//!               Access-Control-Allow-Origin: "'*'"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod planner;
pub mod reconciler;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{Definition, DefinitionParser, DefinitionValidator, SyncOptions};
pub use error::{Result, SyncError};
pub use planner::{Change, ChangeSet, compute_patch};
pub use reconciler::Reconciler;
