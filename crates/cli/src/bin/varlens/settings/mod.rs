//! Configuration loading and resolution.
//!
//! Settings are layered: default config files, then `--config` files, then
//! `VARLENS__*` environment variables, then command-line flags. [`load`]
//! returns the validated [`ResolvedConfig`] the workflow runs with.

mod loader;
mod raw;
mod resolved;
mod sources;

pub(crate) use loader::load;
pub(crate) use resolved::ResolvedConfig;
