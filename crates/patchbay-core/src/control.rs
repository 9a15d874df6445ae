//! Values shared between a graph and the thread that drives its UI.
//!
//! A [`ControlBridge`] belongs to one graph instance and is handed out as an
//! `Arc` so a UI thread can hold it while the audio thread ticks the graph.
//! All state sits behind a single `parking_lot::Mutex`; each call takes the
//! lock for a handful of scalar updates and never while node code runs.
//!
//! # Control values
//!
//! Nodes register named values with a range and a smoothness. The UI sets a
//! *desired* value; once per tick [`ControlBridge::sync`] moves the *current*
//! value toward it:
//!
//! ```text
//! retain  = smoothness ^ dt
//! current = current * retain + desired * (1 - retain)
//! ```
//!
//! Registration is reference-counted by name, so several nodes (or several
//! voices of a sub-graph) can share one value.
//!
//! # Flags, events and memory
//!
//! Flags are named booleans. Events triggered by the UI become visible to the
//! next tick only. Memory slots carry four floats from the UI to the graph;
//! every control value also mirrors its current value into the slot of the
//! same name. The mirrored slot goes away with the value unless the UI wrote
//! to it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Range and smoothing of a control value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    /// Lower bound for desired values.
    pub min: f32,
    /// Upper bound for desired values.
    pub max: f32,
    /// Fraction of the current value kept after one second, in `[0, 1]`.
    pub smoothness: f32,
    /// Initial value.
    pub default_x: f32,
    /// Initial second component, for two-dimensional controls.
    pub default_y: f32,
}

impl Default for ControlSpec {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            smoothness: 0.0,
            default_x: 0.0,
            default_y: 0.0,
        }
    }
}

impl ControlSpec {
    /// A range with the given default and no smoothing.
    pub fn new(min: f32, max: f32, default: f32) -> Self {
        Self {
            min,
            max,
            default_x: default,
            ..Self::default()
        }
    }

    /// Sets the smoothness.
    pub fn with_smoothness(mut self, smoothness: f32) -> Self {
        self.smoothness = smoothness;
        self
    }

    fn clamp(&self, v: f32) -> f32 {
        if self.min <= self.max {
            v.clamp(self.min, self.max)
        } else {
            v
        }
    }
}

/// A control value as seen by the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSnapshot {
    /// Name the value was registered under.
    pub name: String,
    /// Range and smoothing.
    pub spec: ControlSpec,
    /// Target set by the UI.
    pub desired: [f32; 2],
    /// Smoothed value the graph reads.
    pub current: [f32; 2],
}

struct ControlEntry {
    name: String,
    spec: ControlSpec,
    ref_count: usize,
    desired: [f32; 2],
    current: [f32; 2],
    /// The memory slot was created by `register` and not written by the UI.
    owns_memory: bool,
}

#[derive(Default)]
struct BridgeState {
    /// Sorted by name.
    values: Vec<ControlEntry>,
    flags: BTreeSet<String>,
    pending_events: BTreeSet<String>,
    active_events: BTreeSet<String>,
    memory: BTreeMap<String, [f32; 4]>,
}

impl BridgeState {
    fn find(&self, name: &str) -> Result<usize, usize> {
        self.values.binary_search_by(|e| e.name.as_str().cmp(name))
    }
}

/// Control values, flags, events and memory slots of one graph instance.
#[derive(Default)]
pub struct ControlBridge {
    state: Mutex<BridgeState>,
    generation: AtomicU64,
}

impl ControlBridge {
    /// Creates an empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers control value `name`, or adds a reference to an existing one.
    ///
    /// The spec of an existing value is kept.
    pub fn register(&self, name: &str, spec: ControlSpec) {
        let mut state = self.state.lock();
        match state.find(name) {
            Ok(i) => state.values[i].ref_count += 1,
            Err(i) => {
                let initial = [spec.default_x, spec.default_y];
                let owns_memory = !state.memory.contains_key(name);
                state.values.insert(
                    i,
                    ControlEntry {
                        name: name.to_string(),
                        spec,
                        ref_count: 1,
                        desired: initial,
                        current: initial,
                        owns_memory,
                    },
                );
                state
                    .memory
                    .insert(name.to_string(), [initial[0], initial[1], 0.0, 0.0]);
                self.generation.fetch_add(1, Ordering::Release);
                tracing::debug!(name, "registered control value");
            }
        }
    }

    /// Drops one reference to `name`; the value disappears with the last one.
    ///
    /// Returns `false` if no such value is registered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Ok(i) = state.find(name) else {
            tracing::warn!(name, "failed to unregister control value");
            return false;
        };
        state.values[i].ref_count -= 1;
        if state.values[i].ref_count == 0 {
            if state.values.remove(i).owns_memory {
                state.memory.remove(name);
            }
            self.generation.fetch_add(1, Ordering::Release);
            tracing::debug!(name, "removed control value");
        }
        true
    }

    /// Bumped whenever the set of control values changes.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Names of the registered control values, sorted.
    pub fn names(&self) -> Vec<String> {
        self.state
            .lock()
            .values
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Spec of control value `name`.
    pub fn spec(&self, name: &str) -> Option<ControlSpec> {
        let state = self.state.lock();
        state.find(name).ok().map(|i| state.values[i].spec)
    }

    /// Sets the target of control value `name`, clamped to its range.
    ///
    /// Returns `false` if no such value is registered.
    pub fn set_desired(&self, name: &str, x: f32) -> bool {
        let mut state = self.state.lock();
        let Ok(i) = state.find(name) else {
            return false;
        };
        let entry = &mut state.values[i];
        entry.desired[0] = entry.spec.clamp(x);
        true
    }

    /// Sets both components of the target of control value `name`.
    pub fn set_desired_xy(&self, name: &str, x: f32, y: f32) -> bool {
        let mut state = self.state.lock();
        let Ok(i) = state.find(name) else {
            return false;
        };
        let entry = &mut state.values[i];
        entry.desired = [entry.spec.clamp(x), entry.spec.clamp(y)];
        true
    }

    /// Current (smoothed) value of `name`.
    pub fn current(&self, name: &str) -> Option<f32> {
        self.current_xy(name).map(|[x, _]| x)
    }

    /// Both components of the current value of `name`.
    pub fn current_xy(&self, name: &str) -> Option<[f32; 2]> {
        let state = self.state.lock();
        state.find(name).ok().map(|i| state.values[i].current)
    }

    /// Copies every control value, sorted by name.
    pub fn snapshot(&self) -> Vec<ControlSnapshot> {
        self.state
            .lock()
            .values
            .iter()
            .map(|e| ControlSnapshot {
                name: e.name.clone(),
                spec: e.spec,
                desired: e.desired,
                current: e.current,
            })
            .collect()
    }

    /// Sets or clears flag `name`.
    pub fn set_flag(&self, name: &str, value: bool) {
        let mut state = self.state.lock();
        if value {
            state.flags.insert(name.to_string());
        } else {
            state.flags.remove(name);
        }
    }

    /// Clears flag `name`.
    pub fn reset_flag(&self, name: &str) {
        self.state.lock().flags.remove(name);
    }

    /// Whether flag `name` is set.
    pub fn is_flag_set(&self, name: &str) -> bool {
        self.state.lock().flags.contains(name)
    }

    /// Queues event `name` for the next tick.
    pub fn trigger_event(&self, name: &str) {
        self.state.lock().pending_events.insert(name.to_string());
    }

    /// Whether event `name` was triggered before the current tick.
    pub fn event_active(&self, name: &str) -> bool {
        self.state.lock().active_events.contains(name)
    }

    /// Writes memory slot `name`.
    pub fn set_memory(&self, name: &str, value: [f32; 4]) {
        let mut state = self.state.lock();
        if let Ok(i) = state.find(name) {
            state.values[i].owns_memory = false;
        }
        state.memory.insert(name.to_string(), value);
    }

    /// Reads memory slot `name`.
    pub fn memory(&self, name: &str) -> Option<[f32; 4]> {
        self.state.lock().memory.get(name).copied()
    }

    /// Advances smoothing by `dt` seconds and publishes queued events.
    ///
    /// Called once per tick, before any node runs.
    pub fn sync(&self, dt: f32) {
        let mut state = self.state.lock();
        let BridgeState {
            values,
            memory,
            pending_events,
            active_events,
            ..
        } = &mut *state;

        for entry in values.iter_mut() {
            let retain = entry.spec.smoothness.clamp(0.0, 1.0).powf(dt);
            for (current, desired) in entry.current.iter_mut().zip(entry.desired) {
                *current = *current * retain + desired * (1.0 - retain);
            }
            if let Some(slot) = memory.get_mut(&entry.name) {
                slot[0] = entry.current[0];
                slot[1] = entry.current[1];
            }
        }

        active_events.clear();
        std::mem::swap(active_events, pending_events);
    }
}

impl std::fmt::Debug for ControlBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlBridge")
            .field("values", &self.names())
            .field("generation", &self.generation())
            .finish()
    }
}
