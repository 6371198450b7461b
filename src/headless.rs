//! Off-device backend.
//!
//! In-process implementations of every platform seam — surface, provider,
//! display frame, permission facade — that record what the controller does to
//! them instead of touching a device. The harness binary runs the full shell
//! against this backend, and the test suites use it to observe operation
//! order, scripted configuration failures and permission outcomes.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::host::HostFrame;
use crate::permissions::{AllFilesPanel, PanelUnavailable, PermissionsHost, RuntimePermission};
use crate::settings::ResolvedSettings;
use crate::surface::{BrowserSurface, SurfaceError, SurfaceProvider};

/// One operation the controller issued to the surface, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    ApplySettings,
    Load(String),
    Reload,
    GoBack,
    Resume,
    ResumeTimers,
    Pause,
    PauseTimers,
    ClearCache { include_disk: bool },
    ClearHistory,
    RemoveChildViews,
    Destroy,
    FreeMemory,
}

/// Recording surface. Settings application can be scripted to fail a number
/// of times, mirroring a view that is not attached yet during create.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    ops: Vec<SurfaceOp>,
    applied: Option<ResolvedSettings>,
    can_go_back: bool,
    fail_applies: u32,
    destroyed: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shape the rest of the crate consumes: a shared, mutable handle.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Operations issued so far, oldest first.
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.clone()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// The settings bundle last applied successfully.
    pub fn applied_settings(&self) -> Option<ResolvedSettings> {
        self.applied.clone()
    }

    /// Makes the next `n` settings applications fail.
    pub fn fail_next_applies(&mut self, n: u32) {
        self.fail_applies = n;
    }

    pub fn set_can_go_back(&mut self, can_go_back: bool) {
        self.can_go_back = can_go_back;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl BrowserSurface for HeadlessSurface {
    fn apply_settings(&mut self, settings: &ResolvedSettings) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::ApplySettings);
        if self.fail_applies > 0 {
            self.fail_applies -= 1;
            return Err(SurfaceError::NotAttached);
        }
        self.applied = Some(settings.clone());
        Ok(())
    }

    fn load(&mut self, url: &str) {
        self.ops.push(SurfaceOp::Load(url.to_string()));
    }

    fn reload(&mut self) {
        self.ops.push(SurfaceOp::Reload);
    }

    fn can_go_back(&self) -> bool {
        self.can_go_back
    }

    fn go_back(&mut self) {
        self.ops.push(SurfaceOp::GoBack);
    }

    fn resume(&mut self) {
        self.ops.push(SurfaceOp::Resume);
    }

    fn resume_timers(&mut self) {
        self.ops.push(SurfaceOp::ResumeTimers);
    }

    fn pause(&mut self) {
        self.ops.push(SurfaceOp::Pause);
    }

    fn pause_timers(&mut self) {
        self.ops.push(SurfaceOp::PauseTimers);
    }

    fn clear_cache(&mut self, include_disk: bool) {
        self.ops.push(SurfaceOp::ClearCache { include_disk });
    }

    fn clear_history(&mut self) {
        self.ops.push(SurfaceOp::ClearHistory);
    }

    fn remove_child_views(&mut self) {
        self.ops.push(SurfaceOp::RemoveChildViews);
    }

    fn destroy(&mut self) {
        self.ops.push(SurfaceOp::Destroy);
        self.destroyed = true;
    }

    fn free_memory(&mut self) {
        self.ops.push(SurfaceOp::FreeMemory);
    }
}

/// Provider over an attachable surface slot, like the host bridge: `None`
/// before the view exists and after teardown.
#[derive(Default)]
pub struct HeadlessProvider {
    surface: RefCell<Option<Rc<RefCell<HeadlessSurface>>>>,
}

impl HeadlessProvider {
    /// Provider with no surface, as during early create.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_surface(surface: Rc<RefCell<HeadlessSurface>>) -> Self {
        let provider = Self::default();
        provider.attach(surface);
        provider
    }

    pub fn attach(&self, surface: Rc<RefCell<HeadlessSurface>>) {
        *self.surface.borrow_mut() = Some(surface);
    }

    pub fn detach(&self) {
        *self.surface.borrow_mut() = None;
    }
}

impl SurfaceProvider for HeadlessProvider {
    fn surface(&self) -> Option<Rc<RefCell<dyn BrowserSurface>>> {
        self.surface
            .borrow()
            .clone()
            .map(|surface| surface as Rc<RefCell<dyn BrowserSurface>>)
    }
}

/// Recording display frame.
#[derive(Debug, Default)]
pub struct HeadlessFrame {
    registered: Vec<&'static str>,
    portrait_locked: bool,
    cutout_short_edges: bool,
    status_bar_color: Option<String>,
    dark_status_icons: bool,
    memory_trims: u32,
}

impl HeadlessFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capability providers registered so far, in order.
    pub fn registered(&self) -> Vec<&'static str> {
        self.registered.clone()
    }

    pub fn portrait_locked(&self) -> bool {
        self.portrait_locked
    }

    pub fn cutout_short_edges(&self) -> bool {
        self.cutout_short_edges
    }

    pub fn status_bar_color(&self) -> Option<String> {
        self.status_bar_color.clone()
    }

    pub fn dark_status_icons(&self) -> bool {
        self.dark_status_icons
    }

    pub fn memory_trims(&self) -> u32 {
        self.memory_trims
    }
}

impl HostFrame for HeadlessFrame {
    fn register_capability(&mut self, name: &'static str) {
        self.registered.push(name);
    }

    fn lock_portrait(&mut self) {
        self.portrait_locked = true;
    }

    fn layout_into_cutout_short_edges(&mut self) {
        self.cutout_short_edges = true;
    }

    fn set_status_bar_color(&mut self, color: &str) {
        self.status_bar_color = Some(color.to_string());
    }

    fn set_status_bar_dark_icons(&mut self, dark: bool) {
        self.dark_status_icons = dark;
    }

    fn advise_memory_trim(&mut self) {
        self.memory_trims += 1;
    }
}

/// Scriptable permission facade: grants, manager flag and panel availability
/// are all settable; requests and panel launches are recorded.
#[derive(Debug, Default)]
pub struct HeadlessPermissions {
    all_files_granted: Cell<bool>,
    granted: RefCell<HashSet<RuntimePermission>>,
    unavailable_panels: RefCell<Vec<AllFilesPanel>>,
    permission_requests: RefCell<Vec<(Vec<RuntimePermission>, i32)>>,
    opened_panels: RefCell<Vec<(AllFilesPanel, i32)>>,
}

impl HeadlessPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_all_files_access_granted(&self, granted: bool) {
        self.all_files_granted.set(granted);
    }

    pub fn grant(&self, permission: RuntimePermission) {
        self.granted.borrow_mut().insert(permission);
    }

    /// Removes a settings panel from the device, as on builds without it.
    pub fn disable_panel(&self, panel: AllFilesPanel) {
        self.unavailable_panels.borrow_mut().push(panel);
    }

    /// Panels opened so far, in order.
    pub fn opened_panels(&self) -> Vec<AllFilesPanel> {
        self.opened_panels
            .borrow()
            .iter()
            .map(|(panel, _)| *panel)
            .collect()
    }

    /// Runtime-permission requests issued so far: `(permissions, request_code)`.
    pub fn permission_requests(&self) -> Vec<(Vec<RuntimePermission>, i32)> {
        self.permission_requests.borrow().clone()
    }
}

impl PermissionsHost for HeadlessPermissions {
    fn is_all_files_access_granted(&self) -> bool {
        self.all_files_granted.get()
    }

    fn is_granted(&self, permission: RuntimePermission) -> bool {
        self.granted.borrow().contains(&permission)
    }

    fn request_permissions(&self, permissions: &[RuntimePermission], request_code: i32) {
        self.permission_requests
            .borrow_mut()
            .push((permissions.to_vec(), request_code));
    }

    fn open_all_files_panel(
        &self,
        panel: AllFilesPanel,
        request_code: i32,
    ) -> Result<(), PanelUnavailable> {
        if self.unavailable_panels.borrow().contains(&panel) {
            return Err(PanelUnavailable(panel));
        }
        self.opened_panels.borrow_mut().push((panel, request_code));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_records_operations_in_order() {
        let mut surface = HeadlessSurface::new();
        surface.load("https://avsec-it.vercel.app");
        surface.reload();
        surface.destroy();
        assert_eq!(
            surface.ops(),
            vec![
                SurfaceOp::Load("https://avsec-it.vercel.app".to_string()),
                SurfaceOp::Reload,
                SurfaceOp::Destroy,
            ]
        );
        assert!(surface.is_destroyed());
    }

    #[test]
    fn test_provider_attach_detach() {
        let provider = HeadlessProvider::empty();
        assert!(provider.surface().is_none());

        provider.attach(HeadlessSurface::shared());
        assert!(provider.surface().is_some());

        provider.detach();
        assert!(provider.surface().is_none());
    }

    #[test]
    fn test_scripted_apply_failures_run_out() {
        let mut surface = HeadlessSurface::new();
        surface.fail_next_applies(1);
        let settings = crate::settings::REMOTE_APP_PROFILE.resolve(crate::platform::ApiLevel::R);
        assert!(surface.apply_settings(&settings).is_err());
        assert!(surface.apply_settings(&settings).is_ok());
        assert_eq!(surface.applied_settings(), Some(settings));
    }
}
