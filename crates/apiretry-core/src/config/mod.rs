//! Retry configuration.
//!
//! # Key Types
//!
//! - [`ConfigRegistry`] - process-wide defaults and per-key overrides
//! - [`ConfigurationTable`] - the immutable-per-call table produced from a registry
//! - [`CallOverride`] - options supplied with a single call
//! - [`RegistrySettings`] - registry configuration loaded from TOML or the environment
//!
//! A table is created fresh for every call:
//!
//! ```rust
//! use apiretry_core::config::{CallOverride, ConfigRegistry, HandlerOptions};
//!
//! let mut registry = ConfigRegistry::new();
//! registry.on("5XX", HandlerOptions::new().tries(3).wait(1.0));
//!
//! let call = CallOverride::table().on(429u16, HandlerOptions::new().tries(5).wait(0.0));
//! let table = registry.snapshot().merge(Some(&call), "429").unwrap();
//!
//! assert_eq!(table.get("429").unwrap().tries, 5);
//! assert_eq!(table.get("5XX").unwrap().tries, 3);
//! ```

mod call_override;
mod registry;
mod settings;
mod table;

pub use call_override::{CallOverride, HandlerOptions, OverrideTable};
pub use registry::ConfigRegistry;
pub use settings::{ENV_DEFAULT_TRIES, ENV_DEFAULT_WAIT, RegistrySettings};
pub use table::{ConfigurationTable, HandlerSpec};
