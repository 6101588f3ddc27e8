use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use scenegraph_common::{Aabb, ClipBounds, Containment, NodeHandle};
use scenegraph_kernel::{MaterialParams, NodeKind, SceneGraph};

use crate::frame::{DrawRecord, FrameRecord, LightState};
use crate::renderer::Renderer;

/// Traversal switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// When false, clip boxes are ignored everywhere (debug switch).
    pub clipping_enabled: bool,
    /// Drop draws that lie entirely outside the clip region instead of
    /// emitting them marked [`Containment::Outside`].
    pub cull_outside: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clipping_enabled: true,
            cull_outside: true,
        }
    }
}

/// Where the coordinator is within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Idle,
    Visiting(NodeHandle),
}

/// State inherited by descendants. Transform, camera, material and lights
/// are scoped to the subtree of the node that set them.
#[derive(Debug, Clone)]
struct Scope {
    model: Mat4,
    view: Mat4,
    projection: Mat4,
    material: MaterialParams,
    lights: Vec<LightState>,
    clipping: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            material: MaterialParams::default(),
            lights: Vec::new(),
            clipping: true,
        }
    }
}

/// Pending work in a pass. `Exit` restores the enclosing scope and pops
/// the clip stack back to `clip_depth`.
enum Step {
    Enter(NodeHandle),
    Exit {
        clip_depth: usize,
        parent: Option<NodeHandle>,
    },
}

/// Walks the graph once per frame and turns it into draw records.
///
/// Clip boxes behave differently from the other stateful nodes: a clip box
/// stays active for the rest of its parent's children, not just its own
/// subtree. Active boxes compose by intersection.
#[derive(Debug)]
pub struct Coordinator {
    config: RenderConfig,
    state: TraversalState,
    frames: u64,
}

impl Coordinator {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            state: TraversalState::Idle,
            frames: 0,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    /// Number of completed passes.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Traverse the graph and hand the frame to `renderer`.
    pub fn render_once<R: Renderer>(&mut self, graph: &SceneGraph, renderer: &mut R) -> R::Output {
        let frame = self.traverse(graph);
        renderer.render(&frame)
    }

    /// Run one full pass and return its records without rendering them.
    pub fn traverse(&mut self, graph: &SceneGraph) -> FrameRecord {
        self.frames += 1;
        let mut frame = FrameRecord {
            frame: self.frames,
            ..FrameRecord::default()
        };
        let mut clip_stack = Vec::new();
        self.visit(graph, &mut clip_stack, &mut frame);
        self.state = TraversalState::Idle;

        if frame.culled > 0 {
            tracing::debug!(frame = frame.frame, culled = frame.culled, "draws culled by clip region");
        }
        tracing::trace!(
            frame = frame.frame,
            visited = frame.visited,
            draws = frame.draws.len(),
            "traversal complete"
        );
        frame
    }

    fn visit(&mut self, graph: &SceneGraph, clip_stack: &mut Vec<ClipBounds>, frame: &mut FrameRecord) {
        let mut scopes = vec![Scope::default()];
        let mut work = vec![Step::Enter(graph.root())];

        while let Some(step) = work.pop() {
            let handle = match step {
                Step::Enter(handle) => handle,
                Step::Exit { clip_depth, parent } => {
                    clip_stack.truncate(clip_depth);
                    scopes.pop();
                    if let Some(p) = parent {
                        self.state = TraversalState::Visiting(p);
                    }
                    continue;
                }
            };
            let Some(node) = graph.node(handle) else {
                continue;
            };
            if node.flags().enabled == Some(false) {
                tracing::trace!(node = %node.label(), "subtree disabled");
                continue;
            }
            self.state = TraversalState::Visiting(handle);
            frame.visited += 1;

            let mut scope = scopes.last().cloned().unwrap_or_default();
            if let Some(clipping) = node.flags().clipping {
                scope.clipping = clipping;
            }

            match node.kind() {
                NodeKind::Scene | NodeKind::Group => {}
                NodeKind::Rotate { angle, x, y, z } => {
                    match Vec3::new(*x, *y, *z).try_normalize() {
                        Some(axis) => scope.model *= Mat4::from_axis_angle(axis, angle.to_radians()),
                        None => tracing::warn!(node = %node.label(), "rotate with zero axis ignored"),
                    }
                }
                NodeKind::Translate { x, y, z } => {
                    scope.model *= Mat4::from_translation(Vec3::new(*x, *y, *z));
                }
                NodeKind::Scale { x, y, z } => {
                    scope.model *= Mat4::from_scale(Vec3::new(*x, *y, *z));
                }
                NodeKind::Camera(c) => {
                    scope.view = Mat4::look_at_rh(c.eye, c.look, c.up);
                    scope.projection = Mat4::perspective_rh(c.fovy.to_radians(), c.aspect, c.near, c.far);
                }
                NodeKind::Light(l) => scope.lights.push(LightState {
                    mode: l.mode,
                    color: l.color,
                    dir: scope.model.transform_vector3(l.dir),
                    pos: scope.model.transform_point3(l.pos),
                }),
                NodeKind::Material(m) => scope.material = *m,
                NodeKind::ClipBox(bounds) => {
                    if self.config.clipping_enabled {
                        let region = match clip_stack.last() {
                            Some(top) => top.intersect(bounds),
                            None => *bounds,
                        };
                        clip_stack.push(region);
                    }
                }
                NodeKind::Sphere { .. } | NodeKind::Cube { .. } => {
                    self.emit(node.kind(), handle, node.id(), &scope, clip_stack, frame);
                }
            }

            // The node's own clip box stays pushed until its parent exits.
            work.push(Step::Exit {
                clip_depth: clip_stack.len(),
                parent: node.parent(),
            });
            work.extend(node.children().iter().rev().map(|c| Step::Enter(*c)));
            scopes.push(scope);
        }
    }

    fn emit(
        &self,
        kind: &NodeKind,
        handle: NodeHandle,
        id: Option<&str>,
        scope: &Scope,
        clip_stack: &[ClipBounds],
        frame: &mut FrameRecord,
    ) {
        let Some(geometry) = kind.geometry() else {
            return;
        };
        let region = clip_stack
            .last()
            .filter(|_| scope.clipping && self.config.clipping_enabled);
        let (clip, containment) = match region {
            Some(region) => {
                let aabb = Aabb::from_transformed_box(scope.model, geometry.local_half_extents());
                (Some(*region), region.classify(&aabb))
            }
            None => (None, Containment::Unclipped),
        };

        if containment == Containment::Outside && self.config.cull_outside {
            frame.culled += 1;
            return;
        }
        frame.draws.push(DrawRecord {
            node: handle,
            id: id.map(str::to_string),
            geometry,
            model: scope.model,
            view: scope.view,
            projection: scope.projection,
            material: scope.material,
            lights: scope.lights.clone(),
            clip,
            containment,
        });
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
