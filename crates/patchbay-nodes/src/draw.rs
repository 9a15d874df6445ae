//! Draw nodes.
//!
//! These nodes do their work in the draw hooks. Nesting comes from the draw
//! traversal: a consumer's `before_draw` runs before its producers are drawn
//! and its `after_draw` after, so a camera's transform or a surface's render
//! target wraps everything upstream of it.

use std::sync::atomic::{AtomicU32, Ordering};

use patchbay_core::{
    Color, DrawContext, ImageHandle, Node, NodeContext, NodeFlags, NodeReport,
    NodeTypeDescriptor, Shape, SocketType, SubDraw, SurfaceId,
};

/// Largest accepted surface edge in pixels.
pub const MAX_SURFACE_SIZE: i32 = 16384;

static NEXT_SURFACE: AtomicU32 = AtomicU32::new(SurfaceId::FIRST_FREE);

fn allocate_surface() -> SurfaceId {
    SurfaceId(NEXT_SURFACE.fetch_add(1, Ordering::Relaxed))
}

/// `draw.camera`: wraps its upstream in a view transform.
///
/// Applies `translate(x, y)`, `rotate(angle)` and `scale(scale)` in that
/// order inside a pushed matrix.
#[derive(Debug, Clone, Default)]
pub struct CameraNode;

impl CameraNode {
    /// Input `draw`.
    pub const INPUT_DRAW: usize = 0;
    /// Input `x`.
    pub const INPUT_X: usize = 1;
    /// Input `y`.
    pub const INPUT_Y: usize = 2;
    /// Input `scale`.
    pub const INPUT_SCALE: usize = 3;
    /// Input `angle` (degrees).
    pub const INPUT_ANGLE: usize = 4;

    /// Creates a camera.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `draw.camera`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("draw.camera")
            .description("Transforms everything drawn upstream")
            .input("draw", SocketType::Draw)
            .input_with_default("x", SocketType::Float, "0")
            .input_with_default("y", SocketType::Float, "0")
            .input_with_default("scale", SocketType::Float, "1")
            .input_with_default("angle", SocketType::Float, "0")
            .output("draw", SocketType::Draw)
    }
}

impl Node for CameraNode {
    fn tick(&mut self, _ctx: &mut NodeContext<'_>, _dt: f32) {}

    fn before_draw(&self, ctx: &mut DrawContext<'_>) {
        let inputs = ctx.inputs();
        let (x, y) = (inputs.float(Self::INPUT_X, 0.0), inputs.float(Self::INPUT_Y, 0.0));
        let scale = inputs.float(Self::INPUT_SCALE, 1.0);
        let angle = inputs.float(Self::INPUT_ANGLE, 0.0);

        let backend = ctx.backend();
        backend.push_matrix();
        backend.translate(x, y);
        backend.rotate(angle);
        backend.scale(scale, scale);
    }

    fn after_draw(&self, ctx: &mut DrawContext<'_>) {
        ctx.backend().pop_matrix();
    }
}

/// `draw.surface`: renders its upstream into an offscreen image.
///
/// Sizes outside `1..=MAX_SURFACE_SIZE` draw nothing and output the 2×2 black
/// image.
#[derive(Debug, Clone)]
pub struct SurfaceNode {
    surface: SurfaceId,
}

impl Default for SurfaceNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceNode {
    /// Input `draw`.
    pub const INPUT_DRAW: usize = 0;
    /// Input `width`.
    pub const INPUT_WIDTH: usize = 1;
    /// Input `height`.
    pub const INPUT_HEIGHT: usize = 2;
    /// Output `image`.
    pub const OUTPUT_IMAGE: usize = 0;

    /// Creates a surface node with a process-unique surface id.
    pub fn new() -> Self {
        Self {
            surface: allocate_surface(),
        }
    }

    /// Sockets of `draw.surface`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("draw.surface")
            .description("Renders everything drawn upstream into an image")
            .input("draw", SocketType::Draw)
            .input_with_default("width", SocketType::Int, "256")
            .input_with_default("height", SocketType::Int, "256")
            .output("image", SocketType::Image)
    }

    fn size(width: i32, height: i32) -> Option<(u32, u32)> {
        let valid = 1..=MAX_SURFACE_SIZE;
        (valid.contains(&width) && valid.contains(&height)).then(|| (width as u32, height as u32))
    }

    fn image(&self, width: i32, height: i32) -> ImageHandle {
        match Self::size(width, height) {
            Some((width, height)) => ImageHandle {
                surface: self.surface,
                width,
                height,
            },
            None => ImageHandle::black(),
        }
    }
}

impl Node for SurfaceNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let (inputs, mut outputs) = ctx.io();
        let image = self.image(
            inputs.int(Self::INPUT_WIDTH, 256),
            inputs.int(Self::INPUT_HEIGHT, 256),
        );
        outputs.set_image(Self::OUTPUT_IMAGE, image);
    }

    fn before_draw(&self, ctx: &mut DrawContext<'_>) {
        let inputs = ctx.inputs();
        let size = Self::size(
            inputs.int(Self::INPUT_WIDTH, 256),
            inputs.int(Self::INPUT_HEIGHT, 256),
        );
        // Invalid sizes still push, so after_draw can pop unconditionally.
        let (width, height) = size.unwrap_or((0, 0));
        let surface = if size.is_some() {
            self.surface
        } else {
            SurfaceId::SCRATCH
        };
        ctx.backend().push_surface(surface, width, height);
    }

    fn after_draw(&self, ctx: &mut DrawContext<'_>) {
        ctx.backend().pop_surface();
    }

    fn describe(&self, report: &mut NodeReport) {
        report.add("surface", self.surface.0);
    }
}

/// `draw.primitive`: draws one shape at the current transform.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveNode;

impl PrimitiveNode {
    /// Input `shape` (0 rect, 1 circle, 2 triangle).
    pub const INPUT_SHAPE: usize = 0;
    /// Input `size`.
    pub const INPUT_SIZE: usize = 1;
    /// Input `color`.
    pub const INPUT_COLOR: usize = 2;

    /// Creates a primitive node.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `draw.primitive`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("draw.primitive")
            .description("Draws a rect, circle or triangle")
            .input_with_default("shape", SocketType::Int, "0")
            .input_with_default("size", SocketType::Float, "1")
            .input_with_default("color", SocketType::Color, "ffffffff")
            .output("draw", SocketType::Draw)
    }
}

impl Node for PrimitiveNode {
    fn tick(&mut self, _ctx: &mut NodeContext<'_>, _dt: f32) {}

    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let inputs = ctx.inputs();
        let shape = Shape::from_index(inputs.int(Self::INPUT_SHAPE, 0));
        let size = inputs.float(Self::INPUT_SIZE, 1.0);
        let color = inputs.color(Self::INPUT_COLOR, Color::WHITE);
        ctx.backend().draw_primitive(shape, size, color);
    }
}

/// `draw.sequence`: draws its inputs strictly in socket order `a`..`d`.
#[derive(Debug, Clone, Default)]
pub struct SequenceNode;

impl SequenceNode {
    /// Creates a sequence node.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `draw.sequence`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("draw.sequence")
            .description("Draws its inputs in socket order")
            .input("a", SocketType::Draw)
            .input("b", SocketType::Draw)
            .input("c", SocketType::Draw)
            .input("d", SocketType::Draw)
            .output("draw", SocketType::Draw)
    }
}

impl Node for SequenceNode {
    fn tick(&mut self, _ctx: &mut NodeContext<'_>, _dt: f32) {}

    fn custom_traverse_draw(&self, traversal: &mut SubDraw<'_>) {
        for i in 0..traversal.input_count() {
            traversal.draw_input(i);
        }
    }

    fn flags(&self) -> NodeFlags {
        NodeFlags::CUSTOM_TRAVERSE_DRAW
    }
}

/// `display`: draw root presenting an image.
#[derive(Debug, Clone, Default)]
pub struct DisplayNode;

impl DisplayNode {
    /// Input `image`.
    pub const INPUT_IMAGE: usize = 0;
    /// Input `draw`.
    pub const INPUT_DRAW: usize = 1;

    /// Creates a display.
    pub fn new() -> Self {
        Self
    }

    /// Sockets of `display`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("display")
            .description("Presents an image")
            .input("image", SocketType::Image)
            .input("draw", SocketType::Draw)
    }
}

impl Node for DisplayNode {
    fn tick(&mut self, _ctx: &mut NodeContext<'_>, _dt: f32) {}

    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let image = ctx.inputs().image(Self::INPUT_IMAGE);
        ctx.backend().present(image);
    }

    fn flags(&self) -> NodeFlags {
        NodeFlags::ROOT
    }
}
