//! What the controller needs from the environment it is mounted in.

/// Token for one pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Event sources the controller subscribes to while mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    Visibility,
    Resize,
    Pointer,
}

/// Pointer position in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn new(client_x: f32, client_y: f32) -> Self {
        Self { client_x, client_y }
    }
}

/// Container bounds in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ContainerRect {
    /// Rect anchored at the client origin.
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Map a pointer into [-1, 1] on both axes, y up.
    ///
    /// Returns `None` for an empty rect.
    pub fn normalize(&self, event: PointerEvent) -> Option<[f32; 2]> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let x = (event.client_x - self.left) / self.width * 2.0 - 1.0;
        let y = -((event.client_y - self.top) / self.height) * 2.0 + 1.0;
        Some([x, y])
    }
}

/// Host environment: frame scheduling, event subscriptions and the surface slot.
pub trait Host {
    /// Ask for one frame callback.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a pending frame request.
    fn cancel_frame(&mut self, handle: FrameHandle);

    fn listen(&mut self, listener: Listener);

    fn unlisten(&mut self, listener: Listener);

    fn is_hidden(&self) -> bool;

    fn container_rect(&self) -> ContainerRect;

    /// Logical container size.
    fn container_size(&self) -> (f32, f32) {
        let rect = self.container_rect();
        (rect.width, rect.height)
    }

    /// Place the render surface into the container.
    fn attach_surface(&mut self, width: f32, height: f32);

    /// Remove the render surface, if present.
    fn detach_surface(&mut self);
}
