//! Capability surface of the host display system.
//!
//! Every call is synchronous and made from the daemon's event loop. The only
//! thing that flows the other way is the reconfiguration callback, which may
//! be invoked from any thread and must only forward into the event queue.

use vdkeeper_core::{DisplayMode, DisplaySpec, OutputId, Reconfiguration};

use crate::error::PlatformError;

/// Callback registered with [`DisplayPlatform::subscribe_reconfiguration`].
pub type ReconfigurationCallback = Box<dyn Fn(Reconfiguration) + Send + Sync + 'static>;

pub trait DisplayPlatform {
    /// Owned token keeping one virtual display alive.
    type Handle;

    fn create(&self, spec: &DisplaySpec) -> Result<Self::Handle, PlatformError>;

    /// `None` until the platform has assigned an output id to the display.
    fn resolve_id(&self, handle: &Self::Handle) -> Option<OutputId>;

    fn current_mode(&self, output: OutputId) -> Option<DisplayMode>;

    fn list_modes(&self, output: OutputId) -> Vec<DisplayMode>;

    /// Apply `mode` inside a display-configuration transaction.
    ///
    /// Must not be called from within a reconfiguration callback.
    fn set_mode(&self, output: OutputId, mode: &DisplayMode) -> Result<(), PlatformError>;

    fn destroy(&self, handle: Self::Handle);

    fn subscribe_reconfiguration(
        &self,
        callback: ReconfigurationCallback,
    ) -> Result<(), PlatformError>;
}
