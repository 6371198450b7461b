//! Browser-surface seam.
//!
//! The shell never owns the embedded content view directly — the host
//! framework creates it before the controller runs and tears it down on exit.
//! Everything the controller does to the view goes through [`BrowserSurface`],
//! and the view is always fetched fresh through a [`SurfaceProvider`] because
//! the handle can be null early in the create phase (the configuration retry
//! ladder exists for exactly that window).
//!
//! Keeping both as traits lets the whole state machine run off-device against
//! the [`crate::headless`] backend.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::settings::ResolvedSettings;

/// Failure applying configuration to the surface.
///
/// Any field failing fails the whole settings application; the caller retries
/// through the ladder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The view exists but is not yet attached to a window.
    #[error("surface not attached to a window yet")]
    NotAttached,

    /// The surface rejected one of the settings fields.
    #[error("surface rejected setting `{setting}`: {reason}")]
    Rejected {
        setting: &'static str,
        reason: String,
    },
}

/// The embedded content view, as the controller sees it.
///
/// One instance per host; all calls happen on the main dispatch queue. After
/// `destroy()` the handle must not be used again — the lifecycle coordinator
/// enforces that, implementations only have to tolerate it.
pub trait BrowserSurface {
    /// Applies the full resolved settings bundle. Atomic: an error means the
    /// surface is unconfigured and the whole bundle will be re-applied.
    fn apply_settings(&mut self, settings: &ResolvedSettings) -> Result<(), SurfaceError>;

    /// Starts loading `url` in-surface.
    fn load(&mut self, url: &str);

    /// Reloads the current page.
    fn reload(&mut self);

    /// Whether the surface has navigation history behind the current page.
    fn can_go_back(&self) -> bool;

    /// Navigates one step back in the surface history.
    fn go_back(&mut self);

    /// Brings the surface back to the foreground.
    fn resume(&mut self);

    /// Resumes layout/JavaScript timers after `pause_timers`.
    fn resume_timers(&mut self);

    /// Sends the surface to the background.
    fn pause(&mut self);

    /// Pauses layout/JavaScript timers while backgrounded.
    fn pause_timers(&mut self);

    /// Drops cached resources. `include_disk` also clears the persistent cache.
    fn clear_cache(&mut self, include_disk: bool);

    /// Forgets the navigation history.
    fn clear_history(&mut self);

    /// Detaches any child views the surface attached to itself.
    fn remove_child_views(&mut self);

    /// Releases the surface. Terminal: no further operation may reach it.
    fn destroy(&mut self);

    /// Asks the surface to shed memory under pressure.
    fn free_memory(&mut self);
}

/// Source of the single surface handle (the host framework's bridge).
///
/// Returns `None` while the view has not been created yet or after teardown.
pub trait SurfaceProvider {
    fn surface(&self) -> Option<Rc<RefCell<dyn BrowserSurface>>>;
}
