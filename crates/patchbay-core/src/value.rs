//! Socket types and the values that flow through them.

use std::fmt;

use crate::signal::SignalFloat;

/// The type of an input or output socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SocketType {
    /// Boolean flag.
    Bool,
    /// 32-bit integer.
    Int,
    /// Control-rate float.
    Float,
    /// UTF-8 text.
    String,
    /// Block of audio samples ([`SignalFloat`]).
    Signal,
    /// Buffer of floats with optional 2D shape ([`Channel`]).
    Channel,
    /// RGBA color.
    Color,
    /// Image handle produced by a surface.
    Image,
    /// Edge-driven event.
    Trigger,
    /// Draw dependency: the producer is drawn before the consumer.
    Draw,
}

impl SocketType {
    /// Every socket type, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::String,
        Self::Signal,
        Self::Channel,
        Self::Color,
        Self::Image,
        Self::Trigger,
        Self::Draw,
    ];

    /// Name used in graph files and type listings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Signal => "audioValue",
            Self::Channel => "channel",
            Self::Color => "color",
            Self::Image => "image",
            Self::Trigger => "trigger",
            Self::Draw => "draw",
        }
    }

    /// Looks a type up by its file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Bool, int, float and signal coerce into each other on read.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::Signal)
    }

    /// Whether an input of this type may be wired to an output of `producer`.
    pub fn accepts(self, producer: SocketType) -> bool {
        self == producer || (self.is_numeric() && producer.is_numeric())
    }

    /// Initial value of an output socket of this type.
    pub fn initial_value(self, block_size: usize) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::Signal => Value::Signal(SignalFloat::new(block_size)),
            Self::Channel => Value::Channel(Channel::default()),
            Self::Color => Value::Color(Color::BLACK),
            Self::Image => Value::Image(ImageHandle::black()),
            Self::Trigger => Value::Trigger(TriggerData::None),
            Self::Draw => Value::Draw,
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A socket value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i32),
    /// Float. Also stores signal literals, which are always scalar.
    Float(f32),
    /// Text.
    String(String),
    /// Audio block.
    Signal(SignalFloat),
    /// Channel buffer.
    Channel(Channel),
    /// Color.
    Color(Color),
    /// Image handle.
    Image(ImageHandle),
    /// Payload of the most recent trigger.
    Trigger(TriggerData),
    /// Draw dependency marker.
    Draw,
}

impl Value {
    /// Numeric view of the value, with bool/int/signal coercion.
    ///
    /// Signals read as their block mean.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f32),
            Self::Float(f) => Some(*f),
            Self::Signal(s) => Some(s.mean()),
            Self::Trigger(t) => Some(t.as_float()),
            _ => None,
        }
    }

    /// Integer view of the value. Floats truncate toward zero.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            other => other.as_float().map(|f| f as i32),
        }
    }

    /// Boolean view of the value. Numbers are true when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            other => other.as_float().map(|f| f != 0.0),
        }
    }

    /// Parses an editor literal for an input of type `ty`.
    ///
    /// Signal literals become scalar [`Value::Float`]s. Images, triggers and
    /// draw sockets have no literal form.
    pub fn parse_literal(ty: SocketType, text: &str) -> Result<Value, LiteralError> {
        let trimmed = text.trim();
        let invalid = || LiteralError {
            ty,
            text: text.to_string(),
        };
        match ty {
            SocketType::Bool => match trimmed {
                "1" | "true" => Ok(Value::Bool(true)),
                "0" | "false" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            SocketType::Int => trimmed
                .parse::<i32>()
                .or_else(|_| trimmed.parse::<f32>().map(|f| f as i32))
                .map(Value::Int)
                .map_err(|_| invalid()),
            SocketType::Float | SocketType::Signal => trimmed
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|_| invalid()),
            SocketType::String => Ok(Value::String(text.to_string())),
            SocketType::Channel => trimmed
                .split_whitespace()
                .map(str::parse::<f32>)
                .collect::<Result<Vec<_>, _>>()
                .map(|data| Value::Channel(Channel::from_samples(data)))
                .map_err(|_| invalid()),
            SocketType::Color => Color::from_hex(trimmed).map(Value::Color).ok_or_else(invalid),
            SocketType::Image | SocketType::Trigger | SocketType::Draw => Err(invalid()),
        }
    }
}

/// A literal that does not parse for its socket type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid {ty} literal '{text}'")]
pub struct LiteralError {
    /// Socket type the literal was meant for.
    pub ty: SocketType,
    /// The offending text.
    pub text: String,
}

/// Buffer of floats, optionally shaped as `sx * sy`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Channel {
    /// Sample data, row-major when two-dimensional.
    pub data: Vec<f32>,
    /// Width.
    pub sx: usize,
    /// Height.
    pub sy: usize,
    /// Whether the data is a continuous curve (draw as lines) rather than points.
    pub continuous: bool,
}

impl Channel {
    /// One-dimensional channel over `data`.
    pub fn from_samples(data: Vec<f32>) -> Self {
        let sx = data.len();
        Self {
            data,
            sx,
            sy: 1,
            continuous: false,
        }
    }

    /// Replaces the contents, reusing the allocation.
    pub fn set_samples(&mut self, samples: impl IntoIterator<Item = f32>, continuous: bool) {
        self.data.clear();
        self.data.extend(samples);
        self.sx = self.data.len();
        self.sy = 1;
        self.continuous = continuous;
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the channel holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Straight-alpha RGBA color with components in `0..=1`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Builds a color from components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `rrggbb` or `rrggbbaa`, with or without a leading `#`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return None;
        }
        let component = |i: usize| {
            u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        let a = if hex.len() == 8 { component(3)? } else { 1.0 };
        Some(Self::rgba(component(0)?, component(1)?, component(2)?, a))
    }

    /// Formats as `rrggbbaa`.
    pub fn to_hex(self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "{:02x}{:02x}{:02x}{:02x}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }
}

/// Identifier of an offscreen surface owned by the draw backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl SurfaceId {
    /// Reserved id of the 2×2 black fallback image.
    pub const BLACK: Self = Self(0);
    /// Reserved id of the scratch surface unreachable nodes draw into.
    pub const SCRATCH: Self = Self(1);
    /// First id free for nodes to allocate.
    pub const FIRST_FREE: u32 = 2;
}

/// Handle to the contents of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHandle {
    /// Surface holding the pixels.
    pub surface: SurfaceId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageHandle {
    /// The 2×2 black image used whenever no valid image exists.
    pub const fn black() -> Self {
        Self {
            surface: SurfaceId::BLACK,
            width: 2,
            height: 2,
        }
    }

    /// Whether this is the black fallback.
    pub fn is_fallback(&self) -> bool {
        self.surface == SurfaceId::BLACK
    }
}

impl Default for ImageHandle {
    fn default() -> Self {
        Self::black()
    }
}

/// Optional payload carried by a trigger.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TriggerData {
    /// Plain event.
    #[default]
    None,
    /// Integer payload.
    Int(i32),
    /// Float payload.
    Float(f32),
}

impl TriggerData {
    /// Payload as a float; plain events read as `0`.
    pub fn as_float(&self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Int(i) => *i as f32,
            Self::Float(f) => *f,
        }
    }
}
