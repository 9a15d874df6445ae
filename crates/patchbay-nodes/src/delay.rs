//! Integer-sample delay line and the `audio.delay` node.
//!
//! The delay is `floor(delay * sample_rate)` samples, so a constant input fed
//! from sample 0 through a 0.5 s delay at 44.1 kHz shows up at index 22050.
//! Delays are clamped to `[0, maxDelay]`; a non-positive `maxDelay` leaves a
//! zero-length line that passes its input straight through. `maxDelay` itself
//! is clamped to [`MAX_DELAY_SECONDS`].

use libm::floorf;
use patchbay_core::{Node, NodeContext, NodeReport, NodeTypeDescriptor, SocketType};

/// Longest `maxDelay` the `audio.delay` node allocates for.
pub const MAX_DELAY_SECONDS: f32 = 60.0;

/// Hard capacity limit of a [`DelayLine`] in samples.
pub const MAX_DELAY_SAMPLES: usize = 1 << 24;

/// Circular buffer delay with whole-sample taps.
///
/// # Memory
///
/// The buffer is allocated on construction and only reallocated by
/// [`resize`](Self::resize). No allocations occur per sample.
///
/// # Example
///
/// ```rust
/// use patchbay_nodes::DelayLine;
///
/// let mut line = DelayLine::new(4);
/// line.write(1.0);
/// assert_eq!(line.read(0), 1.0);
/// line.write(0.0);
/// assert_eq!(line.read(1), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    /// Index the next write goes to.
    write_pos: usize,
}

impl DelayLine {
    /// Creates a line holding delays of up to `max_delay_samples`, clamped
    /// to [`MAX_DELAY_SAMPLES`].
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.min(MAX_DELAY_SAMPLES) + 1],
            write_pos: 0,
        }
    }

    /// Creates a line from sample rate and max delay time in seconds.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        Self::new(Self::samples_for(sample_rate, max_seconds))
    }

    /// `floor(seconds * sample_rate)`, never negative.
    pub fn samples_for(sample_rate: f32, seconds: f32) -> usize {
        let samples = floorf(seconds * sample_rate);
        if samples.is_finite() && samples > 0.0 {
            samples as usize
        } else {
            0
        }
    }

    /// Writes a sample and advances the write position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Reads the sample written `delay` writes ago; `0` is the last write.
    ///
    /// Delays beyond [`max_delay`](Self::max_delay) are clamped.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.min(len - 1);
        // write_pos already points past the last write.
        self.buffer[(self.write_pos + len - delay - 1) % len]
    }

    /// Longest supported delay in samples.
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Changes the capacity, clearing the contents if it changed.
    ///
    /// The capacity is clamped to [`MAX_DELAY_SAMPLES`].
    pub fn resize(&mut self, max_delay_samples: usize) {
        let max_delay_samples = max_delay_samples.min(MAX_DELAY_SAMPLES);
        if max_delay_samples != self.max_delay() {
            self.buffer = vec![0.0; max_delay_samples + 1];
            self.write_pos = 0;
        }
    }

    /// Clears the line.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// `audio.delay`: delays a signal by a whole number of samples.
///
/// ## Sockets
///
/// | Input | Type | Default |
/// |-------|------|---------|
/// | `value` | audioValue | 0 |
/// | `delay` | float (seconds) | 0.5 |
/// | `maxDelay` | float (seconds, at most [`MAX_DELAY_SECONDS`]) | 1.0 |
///
/// Output `value` (audioValue).
#[derive(Debug, Clone)]
pub struct DelayNode {
    line: DelayLine,
    delay_samples: usize,
}

impl Default for DelayNode {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayNode {
    /// Input `value`.
    pub const INPUT_VALUE: usize = 0;
    /// Input `delay`.
    pub const INPUT_DELAY: usize = 1;
    /// Input `maxDelay`.
    pub const INPUT_MAX_DELAY: usize = 2;
    /// Output `value`.
    pub const OUTPUT_VALUE: usize = 0;

    /// Creates a node with an empty line; capacity is fixed on first tick.
    pub fn new() -> Self {
        Self {
            line: DelayLine::new(0),
            delay_samples: 0,
        }
    }

    /// Sockets of `audio.delay`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.delay")
            .description("Delays a signal by floor(delay * sample rate) samples")
            .input_with_default("value", SocketType::Signal, "0")
            .input_with_default("delay", SocketType::Float, "0.5")
            .input_with_default("maxDelay", SocketType::Float, "1")
            .output("value", SocketType::Signal)
    }
}

impl Node for DelayNode {
    fn init(&mut self, ctx: &mut NodeContext<'_>) {
        let max = max_seconds(ctx.inputs().float(Self::INPUT_MAX_DELAY, 1.0));
        self.line = DelayLine::from_time(ctx.sample_rate(), max);
    }

    fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
        let sample_rate = ctx.sample_rate();
        let (inputs, mut outputs) = ctx.io();

        let max = max_seconds(inputs.float(Self::INPUT_MAX_DELAY, 1.0));
        self.line.resize(DelayLine::samples_for(sample_rate, max));
        self.delay_samples = DelayLine::samples_for(sample_rate, inputs.float(Self::INPUT_DELAY, 0.5))
            .min(self.line.max_delay());

        let input = inputs.signal(Self::INPUT_VALUE, 0.0);
        let Some(out) = outputs.signal_mut(Self::OUTPUT_VALUE) else {
            return;
        };
        for (i, o) in out.samples_mut().iter_mut().enumerate() {
            self.line.write(input.sample(i));
            *o = self.line.read(self.delay_samples);
        }
    }

    fn describe(&self, report: &mut NodeReport) {
        report.add("delay (samples)", self.delay_samples);
        report.add("capacity (samples)", self.line.max_delay());
    }
}

fn max_seconds(seconds: f32) -> f32 {
    if seconds > MAX_DELAY_SECONDS {
        MAX_DELAY_SECONDS
    } else {
        seconds
    }
}
