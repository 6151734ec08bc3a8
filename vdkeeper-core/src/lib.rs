//! vdkeeper core library: domain types, the desired-state file and its errors.
//!
//! - [`types`]: newtypes and domain structs
//! - [`error`]: [`ConfigError`]
//! - [`config`]: [`ConfigStore`] load / read / save

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigStore, LoadOutcome};
pub use error::ConfigError;
pub use types::{
    ChangeKind, DesiredState, DisplayMode, DisplayName, DisplaySpec, OutputId, Reconfiguration,
    Resolution,
};
