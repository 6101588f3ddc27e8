use glam::{Mat4, Vec3};
use scenegraph_common::{ClipBounds, Containment, NodeHandle};
use scenegraph_kernel::{Geometry, LightMode, MaterialParams};

/// A light in effect for a draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub mode: LightMode,
    pub color: Vec3,
    /// World-space direction for directional lights.
    pub dir: Vec3,
    /// World-space position for point lights.
    pub pos: Vec3,
}

/// One geometry emission, in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub node: NodeHandle,
    pub id: Option<String>,
    pub geometry: Geometry,
    /// Composed model transform.
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub material: MaterialParams,
    pub lights: Vec<LightState>,
    /// Intersection of the active clip boxes, or `None` when clipping does
    /// not apply to this draw.
    pub clip: Option<ClipBounds>,
    pub containment: Containment,
}

/// Output of one traversal pass, handed to a [`Renderer`](crate::Renderer).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    /// Frame counter, starting at 1 for the first pass.
    pub frame: u64,
    pub draws: Vec<DrawRecord>,
    /// Draws dropped because they were entirely outside the clip region.
    pub culled: usize,
    /// Nodes visited, pruned subtrees excluded.
    pub visited: usize,
}

impl FrameRecord {
    pub fn draw_for(&self, id: &str) -> Option<&DrawRecord> {
        self.draws.iter().find(|d| d.id.as_deref() == Some(id))
    }
}
