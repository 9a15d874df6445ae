//! `audio.graph.poly`: a polyphonic host for sub-graph instances.
//!
//! Every `play` trigger builds a fresh instance ("voice") of the graph file
//! named by `file`. Voices run inside the host's tick with the host's `dt`,
//! each with its own control bridge, and their output buses are summed into
//! `audio`. When more than `voices` instances are alive the oldest ones are
//! dropped.
//!
//! The host mirrors the control values of its first voice as dynamic float
//! inputs. A connected input sets the desired value of the same-named control
//! in every voice, so a parent graph can steer all voices at once.

use std::collections::VecDeque;
use std::path::PathBuf;

use patchbay_core::{
    BuildError, DescriptionError, DynamicSocket, Graph, GraphDescription, GraphEnv, Node,
    NodeContext, NodeReport, NodeTypeDescriptor, SocketType, TriggerData,
};
use thiserror::Error;

/// Event triggered in every new voice before its first tick.
pub const BEGIN_EVENT: &str = "begin";

/// Why a voice could not be started.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// The `file` input is empty.
    #[error("no graph file set")]
    NoFile,
    /// The graph file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Resolved path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The graph file is not a valid description.
    #[error(transparent)]
    Parse(#[from] DescriptionError),
    /// The description did not build.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Polyphonic sub-graph host. See the [module docs](self).
///
/// ## Sockets
///
/// | Input | Type | Default |
/// |-------|------|---------|
/// | `file` | string | |
/// | `voices` | int | 4 |
/// | `play` | trigger | |
/// | `stopAll` | trigger | |
/// | *control names* | float (dynamic) | |
///
/// Outputs `audio` (signal) and `active` (int).
#[derive(Default)]
pub struct PolyNode {
    voices: VecDeque<Graph>,
    max_voices: usize,
    cached: Option<(String, GraphDescription)>,
    control_names: Vec<String>,
}

impl PolyNode {
    /// Input `file`.
    pub const INPUT_FILE: usize = 0;
    /// Input `voices`.
    pub const INPUT_VOICES: usize = 1;
    /// Input `play`.
    pub const INPUT_PLAY: usize = 2;
    /// Input `stopAll`.
    pub const INPUT_STOP_ALL: usize = 3;
    /// Output `audio`.
    pub const OUTPUT_AUDIO: usize = 0;
    /// Output `active`.
    pub const OUTPUT_ACTIVE: usize = 1;

    /// Default voice limit.
    pub const DEFAULT_VOICES: i32 = 4;

    /// Creates a host without voices.
    pub fn new() -> Self {
        Self {
            max_voices: Self::DEFAULT_VOICES as usize,
            ..Self::default()
        }
    }

    /// Sockets of `audio.graph.poly`.
    pub fn descriptor() -> NodeTypeDescriptor {
        NodeTypeDescriptor::new("audio.graph.poly")
            .display_name("Poly Graph")
            .description("Plays instances of a graph file as voices")
            .input("file", SocketType::String)
            .input_with_default("voices", SocketType::Int, "4")
            .input("play", SocketType::Trigger)
            .input("stopAll", SocketType::Trigger)
            .output("audio", SocketType::Signal)
            .output("active", SocketType::Int)
    }

    /// Number of live voices.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn description(&mut self, env: &GraphEnv, file: &str) -> Result<&GraphDescription, VoiceError> {
        if file.is_empty() {
            return Err(VoiceError::NoFile);
        }
        let stale = self.cached.as_ref().is_none_or(|(name, _)| name != file);
        if stale {
            let path = env.resolve_path(file);
            let text =
                std::fs::read_to_string(&path).map_err(|source| VoiceError::Read { path, source })?;
            let desc = GraphDescription::parse(&text)?;
            self.cached = Some((file.to_string(), desc));
        }
        match &self.cached {
            Some((_, desc)) => Ok(desc),
            None => Err(VoiceError::NoFile),
        }
    }

    fn spawn(&mut self, ctx: &mut NodeContext<'_>) {
        let file = ctx.inputs().string(Self::INPUT_FILE, "").to_string();
        let env = ctx.env().clone();
        let voice = self
            .description(&env, &file)
            .and_then(|desc| Graph::build(desc, env.clone()).map_err(VoiceError::from));

        match voice {
            Ok(voice) => {
                voice.controls().trigger_event(BEGIN_EVENT);
                self.voices.push_back(voice);
                self.limit_voices();
                ctx.clear_issue();
                tracing::debug!(node = %ctx.id(), file = %file, voices = self.voices.len(), "voice started");
            }
            Err(e) => {
                tracing::warn!(node = %ctx.id(), file = %file, error = %e, "voice failed to start");
                ctx.set_issue(e.to_string());
            }
        }
    }

    fn limit_voices(&mut self) {
        while self.voices.len() > self.max_voices {
            self.voices.pop_front();
        }
    }

    fn sync_inputs(&mut self, ctx: &mut NodeContext<'_>) {
        let names = self
            .voices
            .front()
            .map(|voice| voice.controls().names())
            .unwrap_or_default();
        if names == self.control_names {
            return;
        }
        let sockets: Vec<DynamicSocket> = names
            .iter()
            .map(|name| DynamicSocket::new(name.as_str(), SocketType::Float))
            .collect();
        ctx.set_dynamic_inputs(&sockets);
        self.control_names = names;
    }

    fn apply_controls(&self, ctx: &NodeContext<'_>) {
        let inputs = ctx.inputs();
        let start = ctx.dynamic_inputs_start();
        for (k, name) in self.control_names.iter().enumerate() {
            if !inputs.is_connected(start + k) {
                continue;
            }
            let value = inputs.float(start + k, 0.0);
            for voice in &self.voices {
                voice.controls().set_desired(name, value);
            }
        }
    }
}

impl Node for PolyNode {
    fn tick(&mut self, ctx: &mut NodeContext<'_>, dt: f32) {
        let file = ctx.inputs().string(Self::INPUT_FILE, "");
        if self.cached.as_ref().is_some_and(|(name, _)| name != file) {
            self.cached = None;
        }
        self.max_voices = ctx.inputs().int(Self::INPUT_VOICES, Self::DEFAULT_VOICES).max(0) as usize;
        self.limit_voices();

        self.sync_inputs(ctx);
        self.apply_controls(ctx);

        for voice in &mut self.voices {
            voice.tick(dt);
        }

        let mut outputs = ctx.outputs();
        if let Some(audio) = outputs.signal_mut(Self::OUTPUT_AUDIO) {
            audio.set_scalar(0.0);
            for voice in &self.voices {
                audio.add(voice.output_bus().view());
            }
        }
        outputs.set_int(Self::OUTPUT_ACTIVE, self.voices.len() as i32);
    }

    fn handle_trigger(&mut self, ctx: &mut NodeContext<'_>, input: usize, _data: &TriggerData) {
        match input {
            Self::INPUT_PLAY => self.spawn(ctx),
            Self::INPUT_STOP_ALL => {
                tracing::debug!(node = %ctx.id(), voices = self.voices.len(), "stopping all voices");
                self.voices.clear();
            }
            _ => {}
        }
    }

    fn shut(&mut self, _ctx: &mut NodeContext<'_>) {
        self.voices.clear();
    }

    fn describe(&self, report: &mut NodeReport) {
        report.line(format!("voices: {} / {}", self.voices.len(), self.max_voices));
        if let Some((file, _)) = &self.cached {
            report.add("file", file);
        }
        if !self.control_names.is_empty() {
            report.add("controls", self.control_names.join(", "));
        }
    }
}
