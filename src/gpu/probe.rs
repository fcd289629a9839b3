//! One-time graphics capability detection.

use super::context::default_backends;
use std::fmt;
use std::sync::OnceLock;

type Acquire = Box<dyn Fn() -> bool + Send + Sync>;

static PROCESS_SUPPORT: OnceLock<bool> = OnceLock::new();

/// Memoized answer to "can this process render at all?".
///
/// The acquisition function runs at most once per probe.
pub struct CapabilityProbe {
    acquire: Acquire,
    result: OnceLock<bool>,
}

impl CapabilityProbe {
    /// Probe with a custom acquisition function.
    pub fn new<F>(acquire: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            acquire: Box::new(acquire),
            result: OnceLock::new(),
        }
    }

    /// Probe backed by the process-wide answer from [`is_graphics_supported`].
    ///
    /// Only the first wgpu probe in a process acquires an adapter; later ones
    /// start out resolved.
    pub fn wgpu() -> Self {
        let probe = Self::new(is_graphics_supported);
        if let Some(&supported) = PROCESS_SUPPORT.get() {
            let _ = probe.result.set(supported);
        }
        probe
    }

    /// Probe with a fixed answer.
    pub fn fixed(supported: bool) -> Self {
        Self::new(move || supported)
    }

    pub fn is_supported(&self) -> bool {
        *self.result.get_or_init(|| (self.acquire)())
    }

    /// Whether the acquisition function has already run.
    pub fn is_resolved(&self) -> bool {
        self.result.get().is_some()
    }
}

impl Default for CapabilityProbe {
    fn default() -> Self {
        Self::wgpu()
    }
}

impl fmt::Debug for CapabilityProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityProbe")
            .field("result", &self.result.get())
            .finish()
    }
}

fn acquire_wgpu_adapter() -> bool {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: default_backends(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        force_fallback_adapter: false,
        compatible_surface: None,
    }));
    match adapter {
        Ok(adapter) => {
            let info = adapter.get_info();
            log::debug!("graphics probe found {} ({:?})", info.name, info.backend);
            true
        }
        Err(e) => {
            log::debug!("graphics probe found no adapter: {e}");
            false
        }
    }
}

/// Process-wide probe, evaluated on first call.
///
/// Asks wgpu for any adapter and throws it away.
pub fn is_graphics_supported() -> bool {
    *PROCESS_SUPPORT.get_or_init(acquire_wgpu_adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_probe_runs_acquire_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let probe = CapabilityProbe::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        assert!(!probe.is_resolved());
        for _ in 0..5 {
            assert!(probe.is_supported());
        }
        assert!(probe.is_resolved());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_probe_memoizes_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let probe = CapabilityProbe::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });

        assert!(!probe.is_supported());
        assert!(!probe.is_supported());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_process_probe_is_stable() {
        // Whatever the machine has, asking twice gives the same answer.
        assert_eq!(is_graphics_supported(), is_graphics_supported());
    }

    #[test]
    fn test_wgpu_probes_share_process_answer() {
        let first = CapabilityProbe::wgpu();
        let supported = first.is_supported();

        let second = CapabilityProbe::wgpu();
        assert!(second.is_resolved());
        assert_eq!(second.is_supported(), supported);
        assert_eq!(supported, is_graphics_supported());
    }
}
