//! Deterministic host for offscreen runs and tests.

use super::controller::{FrameOutcome, LightPillar};
use super::host::{ContainerRect, FrameHandle, Host, Listener};
use super::session::SessionFactory;
use std::time::{Duration, Instant};

/// Host with a fixed refresh rate and settable visibility and size.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    refresh_rate: u32,
    rect: ContainerRect,
    hidden: bool,
    next_handle: u64,
    pending: Option<FrameHandle>,
    listeners: Vec<Listener>,
    surface: Option<(f32, f32)>,
    requested_frames: usize,
    cancelled_frames: usize,
    attach_count: usize,
    detach_count: usize,
}

impl HeadlessHost {
    pub fn new(width: f32, height: f32, refresh_rate: u32) -> Self {
        Self {
            refresh_rate: refresh_rate.max(1),
            rect: ContainerRect::sized(width, height),
            hidden: false,
            next_handle: 1,
            pending: None,
            listeners: Vec::new(),
            surface: None,
            requested_frames: 0,
            cancelled_frames: 0,
            attach_count: 0,
            detach_count: 0,
        }
    }

    /// Time between refreshes.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_rate as f64)
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.rect.width = width;
        self.rect.height = height;
    }

    pub fn set_rect(&mut self, rect: ContainerRect) {
        self.rect = rect;
    }

    /// Consume the pending frame request, if any.
    pub fn take_pending_frame(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    pub fn surface(&self) -> Option<(f32, f32)> {
        self.surface
    }

    pub fn requested_frames(&self) -> usize {
        self.requested_frames
    }

    pub fn cancelled_frames(&self) -> usize {
        self.cancelled_frames
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count
    }
}

impl Host for HeadlessHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle);
        self.next_handle += 1;
        self.pending = Some(handle);
        self.requested_frames += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled_frames += 1;
        }
    }

    fn listen(&mut self, listener: Listener) {
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    fn unlisten(&mut self, listener: Listener) {
        self.listeners.retain(|l| *l != listener);
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn container_rect(&self) -> ContainerRect {
        self.rect
    }

    fn attach_surface(&mut self, width: f32, height: f32) {
        self.surface = Some((width, height));
        self.attach_count += 1;
    }

    fn detach_surface(&mut self) {
        if self.surface.take().is_some() {
            self.detach_count += 1;
        }
    }
}

/// Outcome counts over a simulated run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTally {
    pub ticks: usize,
    pub drawn: usize,
    pub throttled: usize,
    pub hidden: usize,
    pub failed: usize,
    pub inactive: usize,
}

impl FrameTally {
    fn record(&mut self, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Drawn => self.drawn += 1,
            FrameOutcome::Throttled => self.throttled += 1,
            FrameOutcome::Hidden => self.hidden += 1,
            FrameOutcome::DrawFailed => self.failed += 1,
            FrameOutcome::Inactive => self.inactive += 1,
        }
    }
}

impl<F: SessionFactory> LightPillar<F, HeadlessHost> {
    /// Deliver `ticks` refreshes starting one interval after `start`.
    ///
    /// Each refresh runs the pending frame callback, if one was requested,
    /// then flushes due timers. Returns the tally and the last tick instant.
    pub fn run_ticks(&mut self, start: Instant, ticks: u32) -> (FrameTally, Instant) {
        let interval = self.host().refresh_interval();
        let mut tally = FrameTally::default();
        let mut now = start;
        for i in 1..=ticks {
            now = start + interval * i;
            tally.ticks += 1;
            if self.host_mut().take_pending_frame().is_some() {
                tally.record(self.on_frame(now));
            }
            self.poll_timers(now);
        }
        (tally, now)
    }

    /// Run for a simulated duration at the host's refresh rate.
    pub fn run_for(&mut self, start: Instant, duration: Duration) -> (FrameTally, Instant) {
        let ticks = (duration.as_secs_f64() * self.host().refresh_rate as f64).round() as u32;
        self.run_ticks(start, ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_requests_replace_pending() {
        let mut host = HeadlessHost::new(100.0, 100.0, 60);
        let a = host.request_frame();
        let b = host.request_frame();
        assert_ne!(a, b);
        assert_eq!(host.pending_frame(), Some(b));

        // Stale handles do nothing.
        host.cancel_frame(a);
        assert_eq!(host.cancelled_frames(), 0);
        host.cancel_frame(b);
        assert_eq!(host.cancelled_frames(), 1);
        assert!(host.take_pending_frame().is_none());
    }

    #[test]
    fn test_surface_attach_detach() {
        let mut host = HeadlessHost::new(100.0, 50.0, 60);
        host.attach_surface(100.0, 50.0);
        host.detach_surface();
        host.detach_surface();
        assert_eq!(host.attach_count(), 1);
        assert_eq!(host.detach_count(), 1);
        assert_eq!(host.container_size(), (100.0, 50.0));
    }
}
