//! Domain types shared by the daemon and its cooperating tools.
//!
//! [`DisplaySpec`] is the on-disk record; its serde names follow the JSON the
//! controlling application writes (`refreshRate`, `hiDPI`, `connectOnStartup`).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identity key of a virtual display. Unique within a desired state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName(pub String);

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DisplayName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DisplayName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Stable, handle-independent identifier the platform assigns to an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputId(pub u32);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Pixel dimensions of a mode, without refresh rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One virtual display the controlling application wants to exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySpec {
    pub name: DisplayName,
    pub width: u32,
    pub height: u32,
    pub refresh_rate: f64,
    #[serde(rename = "hiDPI")]
    pub hidpi: bool,
    pub connect_on_startup: bool,
}

impl DisplaySpec {
    /// Target resolution the guard defends for this display.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// A mode an output can be switched to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: f64,
}

impl DisplayMode {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.refresh_rate)
    }
}

/// What a platform reconfiguration notification reports about an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    ModeChanged,
    Connected,
    Disconnected,
}

/// One entry of the platform's "display reconfigured" stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconfiguration {
    pub output: OutputId,
    pub kind: ChangeKind,
}

/// The ordered list of displays that should be active.
///
/// Built from the config file with entries whose `connectOnStartup` is false
/// already dropped; order is creation order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DesiredState {
    specs: Vec<DisplaySpec>,
}

impl DesiredState {
    pub fn from_specs(specs: Vec<DisplaySpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .filter(|spec| spec.connect_on_startup)
                .collect(),
        }
    }

    pub fn specs(&self) -> &[DisplaySpec] {
        &self.specs
    }

    pub fn get(&self, name: &DisplayName) -> Option<&DisplaySpec> {
        self.specs.iter().find(|spec| &spec.name == name)
    }

    pub fn contains(&self, name: &DisplayName) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
