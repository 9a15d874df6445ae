//! The drawing collaborator.
//!
//! Draw hooks never talk to a GPU directly; they issue commands through a
//! [`DrawBackend`] supplied by the host. Matrix, surface and blend commands
//! come in push/pop pairs that nodes must balance within a single draw
//! traversal.
//!
//! [`RecordingBackend`] keeps every command in order. Tests use it to check
//! nesting, and the CLI uses it to run graphs headless.

use crate::value::{Color, ImageHandle, SurfaceId};

/// Primitive shapes `draw_primitive` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    /// Axis-aligned square.
    #[default]
    Rect,
    /// Circle.
    Circle,
    /// Upward-pointing triangle.
    Triangle,
}

impl Shape {
    /// Maps an integer socket value to a shape; out-of-range values are `Rect`.
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Self::Circle,
            2 => Self::Triangle,
            _ => Self::Rect,
        }
    }
}

/// Blend modes for `push_blend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source over destination.
    #[default]
    Alpha,
    /// Additive.
    Add,
    /// Overwrite.
    Opaque,
}

/// Rendering operations available to draw hooks.
pub trait DrawBackend {
    /// Saves the transform.
    fn push_matrix(&mut self);
    /// Restores the last saved transform.
    fn pop_matrix(&mut self);
    /// Translates the current transform.
    fn translate(&mut self, x: f32, y: f32);
    /// Scales the current transform.
    fn scale(&mut self, x: f32, y: f32);
    /// Rotates the current transform by `degrees`.
    fn rotate(&mut self, degrees: f32);

    /// Redirects drawing into surface `id`, sized `width`×`height`.
    fn push_surface(&mut self, id: SurfaceId, width: u32, height: u32);
    /// Restores the previous render target.
    fn pop_surface(&mut self);

    /// Sets the blend mode until the matching `pop_blend`.
    fn push_blend(&mut self, mode: BlendMode);
    /// Restores the previous blend mode.
    fn pop_blend(&mut self);

    /// Draws a filled shape centered at the origin.
    fn draw_primitive(&mut self, shape: Shape, size: f32, color: Color);
    /// Draws a polyline.
    fn draw_lines(&mut self, points: &[(f32, f32)], color: Color);
    /// Shows `image` on the output.
    fn present(&mut self, image: ImageHandle);
}

/// A command issued to a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// `push_matrix`.
    PushMatrix,
    /// `pop_matrix`.
    PopMatrix,
    /// `translate(x, y)`.
    Translate(f32, f32),
    /// `scale(x, y)`.
    Scale(f32, f32),
    /// `rotate(degrees)`.
    Rotate(f32),
    /// `push_surface(id, width, height)`.
    PushSurface(SurfaceId, u32, u32),
    /// `pop_surface`.
    PopSurface,
    /// `push_blend(mode)`.
    PushBlend(BlendMode),
    /// `pop_blend`.
    PopBlend,
    /// `draw_primitive(shape, size, color)`.
    Primitive(Shape, f32, Color),
    /// `draw_lines(points, color)`.
    Lines(Vec<(f32, f32)>, Color),
    /// `present(image)`.
    Present(ImageHandle),
}

/// Backend that records commands instead of rendering.
#[derive(Debug, Default, Clone)]
pub struct RecordingBackend {
    commands: Vec<DrawCommand>,
}

impl RecordingBackend {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands in issue order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Forgets recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Whether every push has a matching pop of the same kind, properly nested.
    pub fn is_balanced(&self) -> bool {
        let mut stack = Vec::new();
        for command in &self.commands {
            match command {
                DrawCommand::PushMatrix => stack.push(0u8),
                DrawCommand::PushSurface(..) => stack.push(1),
                DrawCommand::PushBlend(_) => stack.push(2),
                DrawCommand::PopMatrix if stack.pop() != Some(0) => return false,
                DrawCommand::PopSurface if stack.pop() != Some(1) => return false,
                DrawCommand::PopBlend if stack.pop() != Some(2) => return false,
                _ => {}
            }
        }
        stack.is_empty()
    }
}

impl DrawBackend for RecordingBackend {
    fn push_matrix(&mut self) {
        self.commands.push(DrawCommand::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        self.commands.push(DrawCommand::PopMatrix);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::Translate(x, y));
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.commands.push(DrawCommand::Scale(x, y));
    }

    fn rotate(&mut self, degrees: f32) {
        self.commands.push(DrawCommand::Rotate(degrees));
    }

    fn push_surface(&mut self, id: SurfaceId, width: u32, height: u32) {
        self.commands.push(DrawCommand::PushSurface(id, width, height));
    }

    fn pop_surface(&mut self) {
        self.commands.push(DrawCommand::PopSurface);
    }

    fn push_blend(&mut self, mode: BlendMode) {
        self.commands.push(DrawCommand::PushBlend(mode));
    }

    fn pop_blend(&mut self) {
        self.commands.push(DrawCommand::PopBlend);
    }

    fn draw_primitive(&mut self, shape: Shape, size: f32, color: Color) {
        self.commands.push(DrawCommand::Primitive(shape, size, color));
    }

    fn draw_lines(&mut self, points: &[(f32, f32)], color: Color) {
        self.commands.push(DrawCommand::Lines(points.to_vec(), color));
    }

    fn present(&mut self, image: ImageHandle) {
        self.commands.push(DrawCommand::Present(image));
    }
}
