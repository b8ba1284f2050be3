//! filterbot core primitives.
//!
//! Pure, allocation-light building blocks shared by the `filterbot` plugin:
//!
//! - [`WhitelistPattern`]: a glob pattern paired with its literal dot count.
//! - [`AllowedFilterSet`]: the reload-scoped set of filter names that may run.
//! - [`FilterRequest`] / [`FilterResult`]: the request and outcome values
//!   exchanged between a dispatcher and the whitelist engine.
//!
//! Nothing in this crate performs I/O or holds shared state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod allowed;
pub mod pattern;
pub mod request;

pub use allowed::AllowedFilterSet;
pub use pattern::{dot_count, parse_whitelist, WhitelistPattern, DEFAULT_WHITELIST};
pub use request::{FilterRequest, FilterResult};
