//! Audio-rate oscillators.
//!
//! Both oscillators keep a phase in `[0, 1)` advanced by `frequency /
//! sample_rate` per sample, with the frequency read per sample so a connected
//! signal modulates them at audio rate.

use core::f32::consts::TAU;

use libm::{floorf, sinf};
use patchbay_core::{
    Node, NodeContext, NodeReport, NodeTypeDescriptor, Resource, ResourceError, ResourceHandle,
    SocketType,
};

/// Euclidean remainder into `[0, 1)`.
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let r = phase - floorf(phase);
    if r >= 1.0 { 0.0 } else { r }
}

/// `audio.sine`: sine oscillator.
///
/// ## Sockets
///
/// | Input | Type | Default |
/// |-------|------|---------|
/// | `frequency` | audioValue (Hz) | 440 |
/// | `phase` | float (cycles) | 0 |
///
/// Output `audio` (audioValue).
#[derive(Debug, Clone, Default)]
pub struct SineNode {
    phase: f32,
}

impl SineNode {
    /// Input `frequency`.
    pub const INPUT_FREQUENCY: usize = 0;
    /// Input `phase`, an offset added to the running phase.
    pub const INPUT_PHASE: usize = 1;
    /// Output `audio`.
    pub const OUTPUT_AUDIO: usize = 0;

    /// Creates an oscillator at phase 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sockets of `audio.sine`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.sine")
            .description("Sine oscillator")
            .input_with_default("frequency", SocketType::Signal, "440")
            .input_with_default("phase", SocketType::Float, "0")
            .output("audio", SocketType::Signal)
    }
}

impl Node for SineNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let inv_sr = 1.0 / ctx.sample_rate();
        let (inputs, mut outputs) = ctx.io();
        let frequency = inputs.signal(Self::INPUT_FREQUENCY, 440.0);
        let offset = inputs.float(Self::INPUT_PHASE, 0.0);

        let Some(out) = outputs.signal_mut(Self::OUTPUT_AUDIO) else {
            return;
        };
        for (i, o) in out.samples_mut().iter_mut().enumerate() {
            *o = sinf(TAU * wrap_phase(self.phase + offset));
            self.phase = wrap_phase(self.phase + frequency.sample(i) * inv_sr);
        }
    }
}

/// Resource type name of [`Wavetable`].
pub const WAVETABLE_RESOURCE: &str = "wavetable";

/// Single-cycle waveform shared through the resource registry.
///
/// Serialized as whitespace-separated samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wavetable {
    samples: Vec<f32>,
}

impl Wavetable {
    /// Creates a table from samples.
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// The samples of one cycle.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Linearly interpolated lookup at `phase` in `[0, 1)`.
    pub fn lookup(&self, phase: f32) -> f32 {
        let len = self.samples.len();
        if len == 0 {
            return 0.0;
        }
        let position = wrap_phase(phase) * len as f32;
        let index = position as usize % len;
        let frac = position - floorf(position);
        let a = self.samples[index];
        let b = self.samples[(index + 1) % len];
        a + (b - a) * frac
    }
}

impl Resource for Wavetable {
    fn load(&mut self, payload: &str) -> Result<(), ResourceError> {
        self.samples = payload
            .split_whitespace()
            .map(|s| {
                s.parse::<f32>()
                    .map_err(|_| ResourceError::InvalidPayload(format!("bad sample '{s}'")))
            })
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn save(&self) -> String {
        self.samples
            .iter()
            .map(f32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `audio.wavetable`: oscillator over the node's `wavetable`/`table`
/// resource. Silent while the table is missing or empty.
///
/// ## Sockets
///
/// | Input | Type | Default |
/// |-------|------|---------|
/// | `frequency` | audioValue (Hz) | 440 |
///
/// Output `audio` (audioValue).
#[derive(Debug, Default)]
pub struct WavetableNode {
    table: Option<ResourceHandle<Wavetable>>,
    phase: f32,
}

impl WavetableNode {
    /// Input `frequency`.
    pub const INPUT_FREQUENCY: usize = 0;
    /// Output `audio`.
    pub const OUTPUT_AUDIO: usize = 0;
    /// Resource name under [`WAVETABLE_RESOURCE`].
    pub const TABLE: &'static str = "table";

    /// Creates a node without a table; the table is acquired on `init`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sockets of `audio.wavetable`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.wavetable")
            .description("Wavetable oscillator over an embedded single-cycle table")
            .input_with_default("frequency", SocketType::Signal, "440")
            .output("audio", SocketType::Signal)
    }
}

impl Node for WavetableNode {
    fn init(&mut self, ctx: &mut NodeContext<'_>) {
        self.table = ctx.acquire_resource::<Wavetable>(WAVETABLE_RESOURCE, Self::TABLE);
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let inv_sr = 1.0 / ctx.sample_rate();
        let (inputs, mut outputs) = ctx.io();
        let Some(out) = outputs.signal_mut(Self::OUTPUT_AUDIO) else {
            return;
        };
        let table = self.table.as_ref().map(ResourceHandle::lock);
        let Some(table) = table.filter(|t| !t.samples().is_empty()) else {
            out.set_scalar(0.0);
            return;
        };

        let frequency = inputs.signal(Self::INPUT_FREQUENCY, 440.0);
        for (i, o) in out.samples_mut().iter_mut().enumerate() {
            *o = table.lookup(self.phase);
            self.phase = wrap_phase(self.phase + frequency.sample(i) * inv_sr);
        }
    }

    fn shut(&mut self, ctx: &mut NodeContext<'_>) {
        if let Some(table) = self.table.take() {
            ctx.release_resource(table);
        }
    }

    fn describe(&self, report: &mut NodeReport) {
        match &self.table {
            Some(table) => report.add("table size", table.lock().samples().len()),
            None => report.line("no table"),
        }
    }
}
