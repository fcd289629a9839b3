//! Frame loop, input handling and teardown for one mounted pillar.

use super::host::{FrameHandle, Host, Listener, PointerEvent};
use super::session::{RenderSession, SessionFactory, SessionSpec};
use super::timing::{next_frame_anchor, Debounce, Throttle, POINTER_THROTTLE, RESIZE_DEBOUNCE};
use crate::config::PillarConfig;
use crate::device::DeviceProfile;
use crate::gpu::{GpuError, PillarUniforms};
use crate::params::MixBlendMode;
use crate::quality::{lookup_settings, resolve_quality, RenderSettings};
use std::time::Instant;

/// Simulation time added per drawn frame, before the rotation-speed factor.
pub const TIME_STEP: f32 = 0.016;

/// Spin angle per unit of simulation time.
pub const SPIN_RATE: f32 = 0.3;

/// Text shown in place of the animation when graphics are unavailable.
pub const PLACEHOLDER_MESSAGE: &str = "WebGL not supported";

/// Why the pillar shows the placeholder instead of animating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// The capability probe found no usable graphics API.
    CapabilityAbsent,
    /// Adapter or device creation failed.
    ContextCreation,
    /// The generated program failed validation.
    ShaderCompile,
}

impl FallbackReason {
    fn from_error(err: &GpuError) -> Self {
        match err {
            GpuError::ShaderCompile(_) => FallbackReason::ShaderCompile,
            _ => FallbackReason::ContextCreation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PillarState {
    Uninitialized,
    Active,
    Fallback(FallbackReason),
    Disposed,
}

/// Result of one frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not mounted, fallen back or disposed. No new frame was requested.
    Inactive,
    /// Document hidden; the loop keeps ticking without drawing.
    Hidden,
    /// Too soon after the previous draw.
    Throttled,
    Drawn,
    /// The draw call failed; the loop continues.
    DrawFailed,
}

/// What the host should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PillarView {
    Animated {
        blend_mode: MixBlendMode,
    },
    Placeholder {
        message: &'static str,
        blend_mode: MixBlendMode,
    },
}

impl PillarView {
    pub fn blend_mode(&self) -> MixBlendMode {
        match self {
            PillarView::Animated { blend_mode } | PillarView::Placeholder { blend_mode, .. } => {
                *blend_mode
            }
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, PillarView::Placeholder { .. })
    }
}

/// Lifecycle controller for one pillar.
///
/// Owns at most one session at a time. Every host callback takes the current
/// instant, so the controller itself never reads a clock.
pub struct LightPillar<F: SessionFactory, H: Host> {
    factory: F,
    host: H,
    profile: DeviceProfile,
    config: PillarConfig,
    state: PillarState,
    session: Option<F::Session>,
    settings: Option<RenderSettings>,
    uniforms: PillarUniforms,
    pointer: [f32; 2],
    frame: Option<FrameHandle>,
    listeners: Vec<Listener>,
    tab_visible: bool,
    last_frame: Option<Instant>,
    time: f32,
    resize: Debounce,
    pointer_throttle: Throttle,
    frames_drawn: u64,
}

impl<F: SessionFactory, H: Host> LightPillar<F, H> {
    pub fn new(factory: F, host: H, profile: DeviceProfile, mut config: PillarConfig) -> Self {
        config.hard = config.hard.sanitized();
        let (width, height) = host.container_size();
        let uniforms = PillarUniforms::new(&config.soft, width, height);
        Self {
            factory,
            host,
            profile,
            config,
            state: PillarState::Uninitialized,
            session: None,
            settings: None,
            uniforms,
            pointer: [0.0, 0.0],
            frame: None,
            listeners: Vec::new(),
            tab_visible: true,
            last_frame: None,
            time: 0.0,
            resize: Debounce::new(RESIZE_DEBOUNCE),
            pointer_throttle: Throttle::new(POINTER_THROTTLE),
            frames_drawn: 0,
        }
    }

    /// Probe, build the session and start the frame loop.
    pub fn mount(&mut self, now: Instant) {
        if self.state != PillarState::Uninitialized {
            return;
        }
        if !self.factory.is_supported() {
            log::warn!("graphics not supported, showing placeholder");
            self.state = PillarState::Fallback(FallbackReason::CapabilityAbsent);
            return;
        }
        self.build(now);
    }

    fn build(&mut self, now: Instant) {
        let quality = resolve_quality(self.config.hard.quality, &self.profile);
        let settings = lookup_settings(quality, &self.profile);
        let (width, height) = self.host.container_size();

        self.time = 0.0;
        self.uniforms = PillarUniforms::new(&self.config.soft, width, height);
        self.uniforms.mouse = self.pointer;

        let spec = SessionSpec {
            quality,
            settings,
            pillar_rotation: self.config.hard.pillar_rotation,
            width,
            height,
        };

        let session = match self.factory.create_session(&spec, &self.uniforms) {
            Ok(session) => session,
            Err(err) => {
                let reason = FallbackReason::from_error(&err);
                match reason {
                    FallbackReason::ShaderCompile => {
                        log::error!("pillar program failed to compile: {err}")
                    }
                    _ => log::warn!("could not create graphics session: {err}"),
                }
                self.state = PillarState::Fallback(reason);
                return;
            }
        };

        log::debug!(
            "mounted {} tier at {width}x{height} ({} fps target)",
            quality.tier().name(),
            settings.target_fps
        );

        self.session = Some(session);
        self.settings = Some(settings);
        self.host.attach_surface(width, height);

        self.subscribe(Listener::Visibility);
        self.subscribe(Listener::Resize);
        if self.config.soft.interactive {
            self.subscribe(Listener::Pointer);
        }

        self.tab_visible = !self.host.is_hidden();
        self.last_frame = Some(now);
        self.frame = Some(self.host.request_frame());
        self.state = PillarState::Active;
    }

    fn subscribe(&mut self, listener: Listener) {
        if !self.listeners.contains(&listener) {
            self.host.listen(listener);
            self.listeners.push(listener);
        }
    }

    fn unsubscribe(&mut self, listener: Listener) {
        if let Some(idx) = self.listeners.iter().position(|l| *l == listener) {
            self.listeners.remove(idx);
            self.host.unlisten(listener);
        }
    }

    /// Release everything the active session holds. Safe to call repeatedly.
    fn teardown(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.host.cancel_frame(handle);
        }
        for listener in std::mem::take(&mut self.listeners) {
            self.host.unlisten(listener);
        }
        self.resize.cancel();
        self.pointer_throttle.reset();
        if let Some(mut session) = self.session.take() {
            session.release();
            self.host.detach_surface();
        }
        self.settings = None;
    }

    /// Frame callback from the host.
    pub fn on_frame(&mut self, now: Instant) -> FrameOutcome {
        if self.state != PillarState::Active {
            return FrameOutcome::Inactive;
        }
        self.frame = Some(self.host.request_frame());

        if !self.tab_visible {
            return FrameOutcome::Hidden;
        }

        let (Some(settings), Some(session)) = (self.settings, self.session.as_mut()) else {
            return FrameOutcome::Inactive;
        };
        let interval = settings.frame_interval();
        let last = self.last_frame.unwrap_or(now);
        let elapsed = now.saturating_duration_since(last);
        if elapsed < interval {
            return FrameOutcome::Throttled;
        }

        self.time += TIME_STEP * self.config.soft.rotation_speed;
        self.uniforms.set_time(self.time, SPIN_RATE);
        session.write_uniforms(&self.uniforms);
        let outcome = match session.draw() {
            Ok(()) => {
                self.frames_drawn += 1;
                FrameOutcome::Drawn
            }
            Err(err) => {
                log::error!("pillar draw failed: {err}");
                FrameOutcome::DrawFailed
            }
        };
        self.last_frame = Some(next_frame_anchor(now, elapsed, interval));
        outcome
    }

    pub fn on_visibility_change(&mut self, hidden: bool) {
        if self.listeners.contains(&Listener::Visibility) {
            self.tab_visible = !hidden;
        }
    }

    /// Container resized; applied after the debounce settles.
    pub fn on_resize(&mut self, now: Instant) {
        if self.listeners.contains(&Listener::Resize) {
            self.resize.trigger(now);
        }
    }

    /// Flush timers that are due.
    pub fn poll_timers(&mut self, now: Instant) {
        if !self.resize.poll(now) || self.state != PillarState::Active {
            return;
        }
        let (width, height) = self.host.container_size();
        if let Some(session) = self.session.as_mut() {
            log::debug!("container resized to {width}x{height}");
            session.resize(width, height);
            self.uniforms.resolution = [width, height];
            session.write_uniforms(&self.uniforms);
        }
    }

    /// Pointer moved over the container. Returns whether it was applied.
    pub fn on_pointer_move(&mut self, event: PointerEvent, now: Instant) -> bool {
        if !self.listeners.contains(&Listener::Pointer) || !self.config.soft.interactive {
            return false;
        }
        if !self.pointer_throttle.ready(now) {
            return false;
        }
        let Some(pointer) = self.host.container_rect().normalize(event) else {
            return false;
        };
        self.pointer = pointer;
        self.uniforms.mouse = pointer;
        true
    }

    /// Apply a new configuration.
    ///
    /// Quality or tilt changes rebuild the session; everything else is
    /// written into the live uniforms.
    pub fn update(&mut self, mut config: PillarConfig, now: Instant) {
        if self.state == PillarState::Disposed {
            return;
        }
        config.hard = config.hard.sanitized();
        let previous = std::mem::replace(&mut self.config, config);
        if self.state == PillarState::Uninitialized {
            return;
        }

        if previous.hard != self.config.hard {
            log::debug!(
                "rebuilding pillar: quality {} -> {}, rotation {} -> {}",
                previous.hard.quality.name(),
                self.config.hard.quality.name(),
                previous.hard.pillar_rotation,
                self.config.hard.pillar_rotation
            );
            self.teardown();
            self.state = PillarState::Uninitialized;
            self.mount(now);
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let change = previous.soft.diff(&self.config.soft);
        if change.uniforms {
            self.uniforms.apply_soft(&self.config.soft);
            session.write_uniforms(&self.uniforms);
        }
        if change.interactive {
            if self.config.soft.interactive {
                self.subscribe(Listener::Pointer);
            } else {
                self.unsubscribe(Listener::Pointer);
            }
        }
    }

    /// Stop the loop and free every resource. Safe to call more than once.
    pub fn unmount(&mut self) {
        if self.state == PillarState::Disposed {
            return;
        }
        self.teardown();
        self.state = PillarState::Disposed;
        log::debug!("pillar unmounted after {} frames", self.frames_drawn);
    }

    pub fn view(&self) -> PillarView {
        let blend_mode = self.config.mix_blend_mode;
        match self.state {
            PillarState::Fallback(_) => PillarView::Placeholder {
                message: PLACEHOLDER_MESSAGE,
                blend_mode,
            },
            _ => PillarView::Animated { blend_mode },
        }
    }

    pub fn state(&self) -> PillarState {
        self.state
    }

    pub fn config(&self) -> &PillarConfig {
        &self.config
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Settings of the live session, if any.
    pub fn settings(&self) -> Option<&RenderSettings> {
        self.settings.as_ref()
    }

    pub fn uniforms(&self) -> &PillarUniforms {
        &self.uniforms
    }

    pub fn session(&self) -> Option<&F::Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut F::Session> {
        self.session.as_mut()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn is_listening(&self, listener: Listener) -> bool {
        self.listeners.contains(&listener)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: SessionFactory, H: Host> Drop for LightPillar<F, H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::headless::HeadlessHost;
    use std::time::Duration;

    #[derive(Default)]
    struct NullSession {
        writes: usize,
        draws: usize,
        released: bool,
    }

    impl RenderSession for NullSession {
        fn write_uniforms(&mut self, _uniforms: &PillarUniforms) {
            self.writes += 1;
        }

        fn draw(&mut self) -> Result<(), GpuError> {
            if self.released {
                return Err(GpuError::Released);
            }
            self.draws += 1;
            Ok(())
        }

        fn resize(&mut self, _width: f32, _height: f32) {}

        fn release(&mut self) {
            self.released = true;
        }
    }

    struct NullFactory {
        supported: bool,
        fail_with: Option<fn() -> GpuError>,
    }

    impl SessionFactory for NullFactory {
        type Session = NullSession;

        fn is_supported(&self) -> bool {
            self.supported
        }

        fn create_session(
            &mut self,
            _spec: &SessionSpec,
            _uniforms: &PillarUniforms,
        ) -> Result<NullSession, GpuError> {
            match self.fail_with {
                Some(make) => Err(make()),
                None => Ok(NullSession::default()),
            }
        }
    }

    fn pillar(factory: NullFactory) -> LightPillar<NullFactory, HeadlessHost> {
        LightPillar::new(
            factory,
            HeadlessHost::new(800.0, 600.0, 60),
            DeviceProfile::desktop(),
            PillarConfig::default(),
        )
    }

    fn working() -> NullFactory {
        NullFactory {
            supported: true,
            fail_with: None,
        }
    }

    #[test]
    fn test_mount_activates_and_requests_frame() {
        let mut p = pillar(working());
        assert_eq!(p.state(), PillarState::Uninitialized);
        p.mount(Instant::now());
        assert_eq!(p.state(), PillarState::Active);
        assert!(p.pending_frame().is_some());
        assert!(p.is_listening(Listener::Visibility));
        assert!(p.is_listening(Listener::Resize));
        assert!(!p.is_listening(Listener::Pointer));
        assert!(!p.view().is_placeholder());
    }

    #[test]
    fn test_unsupported_falls_back() {
        let mut p = pillar(NullFactory {
            supported: false,
            fail_with: None,
        });
        p.mount(Instant::now());
        assert_eq!(
            p.state(),
            PillarState::Fallback(FallbackReason::CapabilityAbsent)
        );
        assert_eq!(
            p.view(),
            PillarView::Placeholder {
                message: PLACEHOLDER_MESSAGE,
                blend_mode: MixBlendMode::Screen
            }
        );
        assert_eq!(p.on_frame(Instant::now()), FrameOutcome::Inactive);
    }

    #[test]
    fn test_shader_failure_is_distinct_fallback() {
        let mut p = pillar(NullFactory {
            supported: true,
            fail_with: Some(|| GpuError::ShaderCompile("bad".into())),
        });
        p.mount(Instant::now());
        assert_eq!(p.state(), PillarState::Fallback(FallbackReason::ShaderCompile));
        assert!(p.host().surface().is_none());

        let mut p = pillar(NullFactory {
            supported: true,
            fail_with: Some(|| GpuError::NoAdapter),
        });
        p.mount(Instant::now());
        assert_eq!(p.state(), PillarState::Fallback(FallbackReason::ContextCreation));
        assert!(p.view().is_placeholder());
    }

    #[test]
    fn test_frame_advances_time() {
        let t0 = Instant::now();
        let mut p = pillar(working());
        p.mount(t0);

        assert_eq!(p.on_frame(t0 + Duration::from_millis(5)), FrameOutcome::Throttled);
        assert_eq!(p.on_frame(t0 + Duration::from_millis(20)), FrameOutcome::Drawn);
        assert!((p.time() - TIME_STEP * 0.3).abs() < 1e-7);
        let angle = p.time() * SPIN_RATE;
        assert!((p.uniforms().rot_cos - angle.cos()).abs() < 1e-6);
        assert_eq!(p.session().map(|s| s.draws), Some(1));
    }

    #[test]
    fn test_pointer_ignored_unless_interactive() {
        let t0 = Instant::now();
        let mut p = pillar(working());
        p.mount(t0);
        assert!(!p.on_pointer_move(PointerEvent::new(400.0, 300.0), t0));

        let mut config = p.config().clone();
        config.soft.interactive = true;
        p.update(config, t0);
        assert!(p.is_listening(Listener::Pointer));
        assert!(p.on_pointer_move(PointerEvent::new(800.0, 0.0), t0));
        assert_eq!(p.uniforms().mouse, [1.0, 1.0]);
        // Inside the throttle window.
        assert!(!p.on_pointer_move(PointerEvent::new(0.0, 0.0), t0 + Duration::from_millis(10)));
        assert!(p.on_pointer_move(PointerEvent::new(0.0, 600.0), t0 + Duration::from_millis(16)));
        assert_eq!(p.uniforms().mouse, [-1.0, -1.0]);
    }

    #[test]
    fn test_unmount_twice() {
        let mut p = pillar(working());
        p.mount(Instant::now());
        p.unmount();
        p.unmount();
        assert_eq!(p.state(), PillarState::Disposed);
        assert!(p.session().is_none());
        assert_eq!(p.host().cancelled_frames(), 1);
        assert_eq!(p.on_frame(Instant::now()), FrameOutcome::Inactive);
    }
}
