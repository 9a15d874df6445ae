//! Pull-style audio streaming out of a graph.
//!
//! An audio device (or an offline renderer) asks an [`AudioSource`] for
//! samples. [`GraphStream`] answers by ticking its graph one block at a time
//! and handing out the output bus, buffering across calls so the caller's
//! buffer size need not match the block size.

use crate::graph::Graph;

/// Something that produces mono audio on demand.
pub trait AudioSource {
    /// Fills `buffer` and returns the number of samples written.
    ///
    /// A return value smaller than `buffer.len()` means the source has ended;
    /// the rest of the buffer is left untouched.
    fn provide(&mut self, buffer: &mut [f32]) -> usize;
}

/// Streams the output bus of a graph.
#[derive(Debug)]
pub struct GraphStream {
    graph: Graph,
    block: Vec<f32>,
    read_pos: usize,
    limit: Option<u64>,
    produced: u64,
}

impl GraphStream {
    /// Streams `graph` without end.
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            block: Vec::new(),
            read_pos: 0,
            limit: None,
            produced: 0,
        }
    }

    /// Ends the stream after `samples` samples.
    pub fn with_limit(mut self, samples: u64) -> Self {
        self.limit = Some(samples);
        self
    }

    /// The streamed graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The streamed graph, for editing between reads.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Samples handed out so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Whether the sample limit has been reached.
    pub fn is_finished(&self) -> bool {
        self.limit.is_some_and(|limit| self.produced >= limit)
    }

    /// Gives the graph back.
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    fn render_block(&mut self) {
        let dt = self.graph.env().block_duration();
        self.graph.tick(dt);
        let bus = self.graph.output_bus();
        self.block.clear();
        self.block.extend((0..bus.len()).map(|i| bus.sample(i)));
        self.read_pos = 0;
    }
}

impl AudioSource for GraphStream {
    fn provide(&mut self, buffer: &mut [f32]) -> usize {
        let wanted = match self.limit {
            Some(limit) => {
                let remaining = limit.saturating_sub(self.produced);
                buffer.len().min(usize::try_from(remaining).unwrap_or(usize::MAX))
            }
            None => buffer.len(),
        };

        let mut written = 0;
        while written < wanted {
            if self.read_pos >= self.block.len() {
                self.render_block();
                if self.block.is_empty() {
                    break;
                }
            }
            let n = (wanted - written).min(self.block.len() - self.read_pos);
            buffer[written..written + n]
                .copy_from_slice(&self.block[self.read_pos..self.read_pos + n]);
            self.read_pos += n;
            written += n;
        }
        self.produced += written as u64;
        written
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::{GraphEnv, Node, NodeContext, NodeFlags, NodeTypeDescriptor, NodeTypeRegistry};
    use crate::resource::ResourceRegistry;
    use crate::value::SocketType;

    /// Writes a ramp 0, 1, 2, ... continuing across blocks.
    struct Ramp {
        next: f32,
    }

    impl Node for Ramp {
        fn tick(&mut self, ctx: &mut NodeContext<'_>, _dt: f32) {
            let mut outputs = ctx.outputs();
            if let Some(out) = outputs.signal_mut(0) {
                for s in out.samples_mut() {
                    *s = self.next;
                    self.next += 1.0;
                }
            }
            ctx.mix_output_to_bus(0, 1.0);
        }

        fn flags(&self) -> NodeFlags {
            NodeFlags::ROOT
        }
    }

    fn graph(block_size: usize) -> Graph {
        let mut types = NodeTypeRegistry::new();
        types.register(
            NodeTypeDescriptor::new("test.ramp").output("audio", SocketType::Signal),
            || Box::new(Ramp { next: 0.0 }),
        );
        let env = GraphEnv::new(Arc::new(types), Arc::new(ResourceRegistry::new()))
            .with_block_size(block_size);
        let mut graph = Graph::new(env);
        graph.add_node("test.ramp").unwrap();
        graph
    }

    #[test]
    fn reads_span_block_boundaries() {
        let mut stream = GraphStream::new(graph(4));
        let mut buffer = [0.0; 6];
        assert_eq!(stream.provide(&mut buffer), 6);
        assert_eq!(buffer, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stream.provide(&mut buffer[..3]), 3);
        assert_eq!(&buffer[..3], &[6.0, 7.0, 8.0]);
    }

    #[test]
    fn limit_makes_last_read_short() {
        let mut stream = GraphStream::new(graph(4)).with_limit(5);
        let mut buffer = [0.0; 4];
        assert_eq!(stream.provide(&mut buffer), 4);
        assert_eq!(stream.provide(&mut buffer), 1);
        assert!(stream.is_finished());
        assert_eq!(stream.provide(&mut buffer), 0);
    }
}
