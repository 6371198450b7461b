//! Surface settings profile for remote-application hosting.
//!
//! A static, named bundle of browser-surface configuration tuned for loading
//! the remotely hosted dynamIT web application:
//! - Scripting, DOM storage and database storage enabled (the app is a PWA)
//! - Overview + wide viewport so desktop-sized pages scale down
//! - Cache-else-network policy to survive flaky mobile links
//! - High render priority, smooth transitions, zoom controls off
//! - Mixed content never allowed, hardware layers where supported
//! - User-agent suffix so the server can recognize the shell
//!
//! The profile is resolved against the platform [`ApiLevel`] before it is
//! pushed to the surface: knobs the platform predates are simply omitted,
//! which is not a failure.

use tracing::{error, info, warn};

use crate::platform::ApiLevel;
use crate::surface::SurfaceProvider;

/// Appended to the platform default user-agent string.
pub const USER_AGENT_SUFFIX: &str = " dynamIT-App/1.0";

/// Cache strategy for page resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Platform default validation behavior.
    Default,
    /// Serve from cache when present, hit the network otherwise.
    CacheElseNetwork,
}

/// Rendering priority hint for the surface compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPriority {
    Normal,
    High,
}

/// Policy for HTTP subresources on HTTPS pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixedContentPolicy {
    AlwaysAllow,
    CompatibilityMode,
    NeverAllow,
}

/// Compositing layer backing the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Software,
    Hardware,
}

/// The static settings bundle. One named profile per shell flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsProfile {
    pub scripting_enabled: bool,
    pub dom_storage_enabled: bool,
    pub database_enabled: bool,
    pub load_with_overview_mode: bool,
    pub use_wide_viewport: bool,
    pub cache_policy: CachePolicy,
    pub render_priority: RenderPriority,
    pub smooth_transitions: bool,
    pub zoom_controls_enabled: bool,
    pub mixed_content: MixedContentPolicy,
    pub hardware_layer: bool,
    pub user_agent_suffix: &'static str,
}

/// Profile applied to the single surface hosting the remote application.
pub const REMOTE_APP_PROFILE: SettingsProfile = SettingsProfile {
    scripting_enabled: true,
    dom_storage_enabled: true,
    database_enabled: true,
    load_with_overview_mode: true,
    use_wide_viewport: true,
    cache_policy: CachePolicy::CacheElseNetwork,
    render_priority: RenderPriority::High,
    smooth_transitions: true,
    zoom_controls_enabled: false,
    mixed_content: MixedContentPolicy::NeverAllow,
    hardware_layer: true,
    user_agent_suffix: USER_AGENT_SUFFIX,
};

/// The profile after platform-version gating, ready to push to the surface.
///
/// `mixed_content` and `layer_type` are `None` on platforms without the knob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub scripting_enabled: bool,
    pub dom_storage_enabled: bool,
    pub database_enabled: bool,
    pub load_with_overview_mode: bool,
    pub use_wide_viewport: bool,
    pub cache_policy: CachePolicy,
    pub render_priority: RenderPriority,
    pub smooth_transitions: bool,
    pub zoom_controls_enabled: bool,
    pub mixed_content: Option<MixedContentPolicy>,
    pub layer_type: Option<LayerType>,
    pub user_agent_suffix: &'static str,
}

impl SettingsProfile {
    /// Gates the profile on the platform version.
    pub fn resolve(&self, api: ApiLevel) -> ResolvedSettings {
        ResolvedSettings {
            scripting_enabled: self.scripting_enabled,
            dom_storage_enabled: self.dom_storage_enabled,
            database_enabled: self.database_enabled,
            load_with_overview_mode: self.load_with_overview_mode,
            use_wide_viewport: self.use_wide_viewport,
            cache_policy: self.cache_policy,
            render_priority: self.render_priority,
            smooth_transitions: self.smooth_transitions,
            zoom_controls_enabled: self.zoom_controls_enabled,
            mixed_content: api
                .at_least(ApiLevel::LOLLIPOP)
                .then_some(self.mixed_content),
            layer_type: (self.hardware_layer && api.at_least(ApiLevel::KITKAT))
                .then_some(LayerType::Hardware),
            user_agent_suffix: self.user_agent_suffix,
        }
    }
}

/// One configuration attempt. This is the predicate the retry ladder drives:
/// `true` means the surface now carries the full profile.
pub fn configure_surface(
    provider: &dyn SurfaceProvider,
    profile: &SettingsProfile,
    api: ApiLevel,
) -> bool {
    let Some(surface) = provider.surface() else {
        warn!(target: "WebView", "surface is null, cannot configure yet");
        return false;
    };

    let resolved = profile.resolve(api);
    match surface.borrow_mut().apply_settings(&resolved) {
        Ok(()) => {
            info!(target: "WebView", %api, "surface configured successfully");
            true
        }
        Err(e) => {
            error!(target: "WebView", error = %e, "error configuring surface");
            false
        }
    }
}
