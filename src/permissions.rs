//! External-storage permission brokering.
//!
//! The shell wants storage access so the filesystem capability can serve the
//! embedded app, but it never blocks on it: the request is fired during the
//! create phase and the answer arrives later through the host's callback
//! plumbing, routed back here by request code. A denied grant is logged and
//! never retried; the rest of the shell keeps working without it.
//!
//! Three platform regimes:
//! - **≥ R**: scoped storage. All-files access is a settings-panel grant, not
//!   a runtime permission. The app-scoped panel is tried first, the global
//!   panel as fallback; both missing is logged and ignored.
//! - **M–Q**: read and write external-storage runtime permissions, requested
//!   together when either is missing.
//! - **< M**: permissions are granted at install time, nothing to do.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::platform::ApiLevel;

/// Correlation id for the M–Q runtime-permission request.
pub const STORAGE_PERMISSION_REQUEST_CODE: i32 = 1001;
/// Correlation id for the ≥ R all-files settings-panel round trip.
pub const MANAGE_STORAGE_REQUEST_CODE: i32 = 1002;

/// Runtime permissions the shell requests on M–Q.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimePermission {
    ReadExternalStorage,
    WriteExternalStorage,
}

/// Which all-files settings panel to open on ≥ R.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllFilesPanel {
    /// Panel scoped to this application.
    AppSpecific,
    /// The global all-files access list.
    Global,
}

/// The requested settings panel does not exist on this device.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("settings panel unavailable: {0:?}")]
pub struct PanelUnavailable(pub AllFilesPanel);

/// Platform facade for permission state and elicitation.
///
/// Requests are fire-and-forget; answers come back through
/// [`PermissionBroker::on_permissions_result`] and
/// [`PermissionBroker::on_panel_result`].
pub trait PermissionsHost {
    /// The ≥ R manager flag: whether all-files access is already granted.
    fn is_all_files_access_granted(&self) -> bool;

    /// Whether a runtime permission is currently granted.
    fn is_granted(&self, permission: RuntimePermission) -> bool;

    /// Launches the system runtime-permission dialog.
    fn request_permissions(&self, permissions: &[RuntimePermission], request_code: i32);

    /// Opens an all-files access settings panel.
    fn open_all_files_panel(
        &self,
        panel: AllFilesPanel,
        request_code: i32,
    ) -> Result<(), PanelUnavailable>;
}

/// Which storage-access grant was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageAccess {
    /// M–Q read/write external-storage pair.
    LegacyReadWrite,
    /// ≥ R all-files management grant.
    ManageAllFiles,
}

/// Where an elicitation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    Pending,
}

/// One storage-access elicitation and its recorded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionRequest {
    pub access: StorageAccess,
    pub request_code: i32,
    pub outcome: PermissionOutcome,
}

/// Elicits the storage grant appropriate to the platform version and records
/// the asynchronous answer.
#[derive(Debug)]
pub struct PermissionBroker {
    api: ApiLevel,
    request: Option<PermissionRequest>,
}

impl PermissionBroker {
    pub fn new(api: ApiLevel) -> Self {
        Self { api, request: None }
    }

    /// The elicitation issued so far, if any.
    pub fn request(&self) -> Option<PermissionRequest> {
        self.request
    }

    /// Fires the platform-appropriate storage elicitation. Never blocks.
    pub fn elicit_storage_access(&mut self, host: &dyn PermissionsHost) {
        if self.api.at_least(ApiLevel::R) {
            self.elicit_all_files_access(host);
        } else if self.api.at_least(ApiLevel::M) {
            self.elicit_runtime_permissions(host);
        } else {
            // Install-time grants; nothing to elicit.
            debug!(target: "Permissions", api = %self.api, "storage granted at install time");
        }
    }

    fn elicit_all_files_access(&mut self, host: &dyn PermissionsHost) {
        if host.is_all_files_access_granted() {
            info!(target: "Permissions", "all-files access already granted");
            self.request = Some(PermissionRequest {
                access: StorageAccess::ManageAllFiles,
                request_code: MANAGE_STORAGE_REQUEST_CODE,
                outcome: PermissionOutcome::Granted,
            });
            return;
        }

        let opened = host
            .open_all_files_panel(AllFilesPanel::AppSpecific, MANAGE_STORAGE_REQUEST_CODE)
            .or_else(|e| {
                warn!(target: "Permissions", error = %e, "falling back to the global panel");
                host.open_all_files_panel(AllFilesPanel::Global, MANAGE_STORAGE_REQUEST_CODE)
            });

        match opened {
            Ok(()) => {
                self.request = Some(PermissionRequest {
                    access: StorageAccess::ManageAllFiles,
                    request_code: MANAGE_STORAGE_REQUEST_CODE,
                    outcome: PermissionOutcome::Pending,
                });
            }
            Err(e) => {
                // No panel on this device. Continue without the grant.
                warn!(target: "Permissions", error = %e, "cannot open any all-files panel");
            }
        }
    }

    fn elicit_runtime_permissions(&mut self, host: &dyn PermissionsHost) {
        let missing = !host.is_granted(RuntimePermission::WriteExternalStorage)
            || !host.is_granted(RuntimePermission::ReadExternalStorage);
        if !missing {
            info!(target: "Permissions", "storage permissions already granted");
            self.request = Some(PermissionRequest {
                access: StorageAccess::LegacyReadWrite,
                request_code: STORAGE_PERMISSION_REQUEST_CODE,
                outcome: PermissionOutcome::Granted,
            });
            return;
        }

        host.request_permissions(
            &[
                RuntimePermission::WriteExternalStorage,
                RuntimePermission::ReadExternalStorage,
            ],
            STORAGE_PERMISSION_REQUEST_CODE,
        );
        self.request = Some(PermissionRequest {
            access: StorageAccess::LegacyReadWrite,
            request_code: STORAGE_PERMISSION_REQUEST_CODE,
            outcome: PermissionOutcome::Pending,
        });
    }

    /// Routes the runtime-permission dialog answer. `grants` holds one flag
    /// per requested permission, in request order.
    pub fn on_permissions_result(&mut self, request_code: i32, grants: &[bool]) {
        if request_code != STORAGE_PERMISSION_REQUEST_CODE {
            debug!(target: "Permissions", request_code, "ignoring unrelated permission result");
            return;
        }

        let granted = grants.first().copied().unwrap_or(false);
        self.record(StorageAccess::LegacyReadWrite, granted);
        if granted {
            info!(target: "Permissions", "storage permissions granted");
        } else {
            warn!(target: "Permissions", "storage permissions denied");
        }
    }

    /// Routes the settings-panel round trip. The panel reports no result of
    /// its own; the manager flag is re-read instead.
    pub fn on_panel_result(&mut self, request_code: i32, host: &dyn PermissionsHost) {
        if request_code != MANAGE_STORAGE_REQUEST_CODE || !self.api.at_least(ApiLevel::R) {
            debug!(target: "Permissions", request_code, "ignoring unrelated panel result");
            return;
        }

        let granted = host.is_all_files_access_granted();
        self.record(StorageAccess::ManageAllFiles, granted);
        if granted {
            info!(target: "Permissions", "all-files access granted");
        } else {
            warn!(target: "Permissions", "all-files access denied");
        }
    }

    fn record(&mut self, access: StorageAccess, granted: bool) {
        let outcome = if granted {
            PermissionOutcome::Granted
        } else {
            PermissionOutcome::Denied
        };
        match &mut self.request {
            Some(request) if request.access == access => request.outcome = outcome,
            // A result with no live request (e.g. after teardown) is recorded
            // fresh so the answer is still observable in diagnostics.
            _ => {
                self.request = Some(PermissionRequest {
                    access,
                    request_code: match access {
                        StorageAccess::LegacyReadWrite => STORAGE_PERMISSION_REQUEST_CODE,
                        StorageAccess::ManageAllFiles => MANAGE_STORAGE_REQUEST_CODE,
                    },
                    outcome,
                });
            }
        }
    }
}
