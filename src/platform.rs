//! Platform API level model.
//!
//! The host platform exposes its version as a monotonically increasing API
//! level. Several shell behaviors are gated on it: mixed-content policy and
//! hardware layers in the settings profile, display-cutout layout, status-bar
//! icon style, and the storage-access regime. The named constants below are
//! the levels the shell actually branches on.

/// Host platform API level. Ordered so gates read as `api.at_least(ApiLevel::R)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiLevel(pub u32);

impl ApiLevel {
    /// Android 4.4 — first level with reliable hardware-layer rendering.
    pub const KITKAT: ApiLevel = ApiLevel(19);
    /// Android 5.0 — status-bar coloring, mixed-content policy knob.
    pub const LOLLIPOP: ApiLevel = ApiLevel(21);
    /// Android 6.0 — runtime permissions, dark status-bar icons.
    pub const M: ApiLevel = ApiLevel(23);
    /// Android 9 — display-cutout layout modes.
    pub const P: ApiLevel = ApiLevel(28);
    /// Android 10 — last level of the legacy external-storage regime.
    pub const Q: ApiLevel = ApiLevel(29);
    /// Android 11 — scoped storage; all-files access goes through a settings panel.
    pub const R: ApiLevel = ApiLevel(30);

    /// Returns `true` when the platform is at or above `other`.
    pub fn at_least(self, other: ApiLevel) -> bool {
        self >= other
    }
}

impl std::fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_levels_are_ordered() {
        assert!(ApiLevel::KITKAT < ApiLevel::LOLLIPOP);
        assert!(ApiLevel::LOLLIPOP < ApiLevel::M);
        assert!(ApiLevel::M < ApiLevel::P);
        assert!(ApiLevel::P < ApiLevel::Q);
        assert!(ApiLevel::Q < ApiLevel::R);
    }

    #[test]
    fn test_at_least_is_inclusive() {
        assert!(ApiLevel::R.at_least(ApiLevel::R));
        assert!(ApiLevel::R.at_least(ApiLevel::M));
        assert!(!ApiLevel::Q.at_least(ApiLevel::R));
    }

    #[test]
    fn test_display() {
        assert_eq!(ApiLevel::R.to_string(), "API 30");
    }
}
