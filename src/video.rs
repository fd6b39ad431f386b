//! The drawing boundary. The framework never talks to a graphics API
//! itself; states and objects emit draw calls through the `Renderer` trait
//! and the host application decides what becomes of them.

use cgmath::Vector2;

/// A single sprite submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Host-defined sprite identifier.
    pub sprite: u64,
    pub position: Vector2<f32>,
    /// Rotation in radians.
    pub rotation: f32,
    pub scale: Vector2<f32>,
    /// Larger depths draw behind smaller ones.
    pub depth: f32,
}

impl DrawCall {
    pub fn new(sprite: u64, position: Vector2<f32>) -> Self {
        DrawCall {
            sprite,
            position,
            rotation: 0.0,
            scale: Vector2::new(1.0, 1.0),
            depth: 0.0,
        }
    }
}

/// Receives one frame's worth of draw calls.
pub trait Renderer {
    fn begin_frame(&mut self);
    fn submit(&mut self, call: &DrawCall);
    fn end_frame(&mut self);
}

/// A renderer that swallows everything it receives, keeping counters for
/// tests and headless runs.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: u32,
    submissions: usize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        HeadlessRenderer::default()
    }

    /// The number of completed frames.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// The number of draw calls received over the renderer's lifetime.
    pub fn submissions(&self) -> usize {
        self.submissions
    }
}

impl Renderer for HeadlessRenderer {
    fn begin_frame(&mut self) {}

    fn submit(&mut self, _: &DrawCall) {
        self.submissions += 1;
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}
