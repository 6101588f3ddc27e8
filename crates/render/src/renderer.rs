use std::fmt::Write as _;

use crate::frame::FrameRecord;

/// Backend-agnostic sink for traversal output.
///
/// A renderer only sees the finished [`FrameRecord`]; it has no access to
/// the graph and cannot mutate it.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Consume one frame.
    fn render(&mut self, frame: &FrameRecord) -> Self::Output;
}

/// Produces a human-readable listing of a frame.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &FrameRecord) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} (visited={}, draws={}, culled={}) ===",
            frame.frame,
            frame.visited,
            frame.draws.len(),
            frame.culled
        );

        for draw in &frame.draws {
            let p = draw.model.w_axis;
            let label = match &draw.id {
                Some(id) => id.clone(),
                None => draw.node.short(),
            };
            let _ = write!(
                out,
                "  [{label}] {:?} pos=({:.2}, {:.2}, {:.2}) lights={}",
                draw.geometry,
                p.x,
                p.y,
                p.z,
                draw.lights.len()
            );
            match &draw.clip {
                Some(c) => {
                    let _ = writeln!(
                        out,
                        " clip=[{:.2}..{:.2}, {:.2}..{:.2}, {:.2}..{:.2}] {:?}",
                        c.xmin, c.xmax, c.ymin, c.ymax, c.zmin, c.zmax, draw.containment
                    );
                }
                None => {
                    let _ = writeln!(out, " unclipped");
                }
            }
        }

        out
    }
}

/// Keeps every frame it is given. Used by tests and the headless host.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: Vec<FrameRecord>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn last(&self) -> Option<&FrameRecord> {
        self.frames.last()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Renderer for RecordingRenderer {
    /// Number of draws in the recorded frame.
    type Output = usize;

    fn render(&mut self, frame: &FrameRecord) -> usize {
        self.frames.push(frame.clone());
        frame.draws.len()
    }
}
