//! Device class detection.
//!
//! A [`DeviceProfile`] is computed once at startup and handed to everything
//! that needs it. Nothing in the crate caches it globally.

use serde::{Deserialize, Serialize};

/// Environment variable consulted by [`DeviceProfile::detect`] for a user-agent string.
pub const USER_AGENT_ENV: &str = "LIGHT_PILLAR_USER_AGENT";

/// User-agent fragments that mark a handheld device (matched case-insensitively).
const MOBILE_MARKERS: &[&str] = &[
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Machines with this many logical processors or fewer count as low-end.
pub const LOW_END_MAX_PROCESSORS: usize = 4;

/// Immutable description of the device the renderer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub is_mobile: bool,
    pub is_low_end: bool,
    /// Reported logical processor count, if known.
    pub logical_processors: Option<usize>,
    /// Physical pixels per logical pixel of the output surface.
    pub device_pixel_ratio: f32,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

impl DeviceProfile {
    /// A capable desktop: not mobile, not low-end, 1:1 pixel ratio.
    pub fn desktop() -> Self {
        Self {
            is_mobile: false,
            is_low_end: false,
            logical_processors: None,
            device_pixel_ratio: 1.0,
        }
    }

    /// Build a profile from a user-agent string and processor count.
    ///
    /// Mobile devices are always low-end. An unknown processor count never
    /// marks a desktop as low-end.
    pub fn from_user_agent(
        user_agent: &str,
        logical_processors: Option<usize>,
        device_pixel_ratio: f32,
    ) -> Self {
        let is_mobile = user_agent_is_mobile(user_agent);
        Self::from_parts(is_mobile, logical_processors, device_pixel_ratio)
    }

    /// Build a profile from an already-known mobile flag.
    pub fn from_parts(
        is_mobile: bool,
        logical_processors: Option<usize>,
        device_pixel_ratio: f32,
    ) -> Self {
        let is_low_end =
            is_mobile || logical_processors.is_some_and(|n| n <= LOW_END_MAX_PROCESSORS);
        Self {
            is_mobile,
            is_low_end,
            logical_processors,
            device_pixel_ratio: sanitize_pixel_ratio(device_pixel_ratio),
        }
    }

    /// Detect the profile of the current process.
    ///
    /// Uses `LIGHT_PILLAR_USER_AGENT` when set, otherwise the target OS.
    pub fn detect() -> Self {
        let processors = std::thread::available_parallelism()
            .ok()
            .map(|n| n.get());

        let profile = match std::env::var(USER_AGENT_ENV) {
            Ok(ua) if !ua.trim().is_empty() => Self::from_user_agent(&ua, processors, 1.0),
            _ => Self::from_parts(
                cfg!(any(target_os = "android", target_os = "ios")),
                processors,
                1.0,
            ),
        };

        log::debug!(
            "device profile: mobile={}, low_end={}, processors={:?}",
            profile.is_mobile,
            profile.is_low_end,
            profile.logical_processors
        );
        profile
    }

    /// Same profile with a different device pixel ratio.
    pub fn with_pixel_ratio(mut self, device_pixel_ratio: f32) -> Self {
        self.device_pixel_ratio = sanitize_pixel_ratio(device_pixel_ratio);
        self
    }
}

/// Whether a user-agent string names a handheld device.
pub fn user_agent_is_mobile(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_MARKERS.iter().any(|marker| ua.contains(marker))
}

fn sanitize_pixel_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}
