//! Clip-box nodes: creation under a target and sparse bound updates.

use scenegraph_common::{BoundsPatch, ClipBounds, NodeHandle};

use crate::description::NodeDescription;
use crate::error::GraphError;
use crate::graph::{GraphEvent, SceneGraph};
use crate::node::NodeKind;

impl SceneGraph {
    /// Append a clip box under `target`. Bounds missing from `bounds` are
    /// left unbounded.
    ///
    /// The box only affects geometry traversed after it in the target's
    /// scope, so content meant to be clipped must come later.
    pub fn create_clip_box(
        &mut self,
        target: &str,
        bounds: &BoundsPatch,
    ) -> Result<NodeHandle, GraphError> {
        let handle =
            self.insert_child(target, &NodeDescription::clip_box(ClipBounds::from_patch(bounds)))?;
        tracing::debug!(target, fields = bounds.len(), "clip box created");
        Ok(handle)
    }

    /// First clip-box child of `target`.
    pub fn clip_box_under(&self, target: &str) -> Result<NodeHandle, GraphError> {
        let parent = self.find_by_id(target)?;
        parent
            .children()
            .iter()
            .copied()
            .find(|h| {
                self.node(*h)
                    .is_some_and(|n| matches!(n.kind(), NodeKind::ClipBox(_)))
            })
            .ok_or_else(|| GraphError::NoClipVolume(target.to_string()))
    }

    /// Overwrite only the fields present in `patch` on the clip box under
    /// `target`. Returns the resulting bounds.
    ///
    /// Inverted axes are stored as given. A patch that changes nothing
    /// records no event.
    pub fn update_clip_box(
        &mut self,
        target: &str,
        patch: &BoundsPatch,
    ) -> Result<ClipBounds, GraphError> {
        let handle = self.clip_box_under(target)?;
        let old = self
            .node(handle)
            .and_then(|n| n.kind().clip_bounds())
            .copied()
            .ok_or_else(|| GraphError::NoClipVolume(target.to_string()))?;

        let mut new = old;
        new.apply(patch);
        NodeKind::ClipBox(new)
            .validate()
            .map_err(|reason| GraphError::InvalidAttributeValue {
                node: target.to_string(),
                name: "clipBox".into(),
                reason,
            })?;

        if new != old {
            if let Some(bounds) = self
                .node_mut(handle)
                .and_then(|n| n.kind.clip_bounds_mut())
            {
                *bounds = new;
            }
            self.record(GraphEvent::ClipBoundsChanged { handle, old, new });
            tracing::debug!(target, fields = patch.len(), "clip box updated");
        }
        Ok(new)
    }
}
