//! Input and output sockets.

use crate::value::{SocketType, Value};

use super::edge::EdgeId;

/// Declaration of a socket on a node type or a dynamic socket.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketDecl {
    /// Socket name, unique per direction on a node.
    pub name: String,
    /// Socket type.
    pub ty: SocketType,
    /// Literal used while the input is unconnected and has no editor literal.
    pub default: Option<String>,
}

impl SocketDecl {
    /// Declares a socket without a default.
    pub fn new(name: impl Into<String>, ty: SocketType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Sets the default literal.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A socket a node adds or removes at runtime, after its static ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSocket {
    /// Socket name. Edges to dynamic sockets are matched by this name.
    pub name: String,
    /// Socket type.
    pub ty: SocketType,
}

impl DynamicSocket {
    /// Creates a dynamic socket declaration.
    pub fn new(name: impl Into<String>, ty: SocketType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Read-only facts about one input, see [`Inputs::info`](super::Inputs::info).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputInfo {
    /// Socket type.
    pub ty: SocketType,
    /// Whether a resolved edge feeds this input.
    pub connected: bool,
    /// Whether an editor literal is set.
    pub has_literal: bool,
}

impl InputInfo {
    /// Whether a resolved edge feeds this input.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InputSocket {
    pub name: String,
    pub ty: SocketType,
    /// Literal from the description or a live edit.
    pub literal: Option<Value>,
    /// Literal from the type registration.
    pub default: Option<Value>,
    /// Edge feeding this input; may be unresolved.
    pub source: Option<EdgeId>,
}

impl InputSocket {
    pub fn new(name: impl Into<String>, ty: SocketType) -> Self {
        Self {
            name: name.into(),
            ty,
            literal: None,
            default: None,
            source: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OutputSocket {
    pub name: String,
    pub ty: SocketType,
    pub value: Value,
}

impl OutputSocket {
    pub fn new(name: impl Into<String>, ty: SocketType, block_size: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            value: ty.initial_value(block_size),
        }
    }
}
