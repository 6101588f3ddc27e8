use glam::Vec3;
use serde::{Deserialize, Serialize};
use scenegraph_common::{AttrValue, BoundField, ClipBounds, NodeHandle};

/// How a light node illuminates descendant geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightMode {
    #[default]
    Dir,
    Point,
    Ambient,
}

/// Viewing and projection parameters carried by a camera node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub eye: Vec3,
    pub look: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, -10.0),
            look: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 25.0,
            aspect: 1.47,
            near: 0.1,
            far: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightParams {
    pub mode: LightMode,
    pub color: Vec3,
    pub dir: Vec3,
    pub pos: Vec3,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            mode: LightMode::Dir,
            color: Vec3::ONE,
            dir: Vec3::new(0.0, -1.0, -1.0),
            pos: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaterialParams {
    pub base_color: Vec3,
    pub specular_color: Vec3,
    pub specular: f32,
    pub shine: f32,
    pub emit: f32,
    pub alpha: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color: Vec3::splat(0.8),
            specular_color: Vec3::ONE,
            specular: 0.9,
            shine: 6.0,
            emit: 0.0,
            alpha: 1.0,
        }
    }
}

/// Drawable shape emitted by geometry nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Sphere { radius: f32, slices: u32, rings: u32 },
    /// Box with the given half extents.
    Cube { half_extents: Vec3 },
}

impl Geometry {
    /// Half extents of the local-space bounding box.
    pub fn local_half_extents(&self) -> Vec3 {
        match self {
            Self::Sphere { radius, .. } => Vec3::splat(*radius),
            Self::Cube { half_extents } => *half_extents,
        }
    }
}

fn one() -> f32 {
    1.0
}

fn default_slices() -> u32 {
    30
}

/// Kind and kind-specific attributes of a node.
///
/// Serialized with a `type` tag, e.g. `{"type": "rotate", "angle": 30, "y": 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Scene,
    Group,
    Rotate {
        #[serde(default)]
        angle: f32,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default)]
        z: f32,
    },
    Translate {
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default)]
        z: f32,
    },
    Scale {
        #[serde(default = "one")]
        x: f32,
        #[serde(default = "one")]
        y: f32,
        #[serde(default = "one")]
        z: f32,
    },
    Camera(CameraParams),
    Light(LightParams),
    Material(MaterialParams),
    Sphere {
        #[serde(default = "one")]
        radius: f32,
        #[serde(default = "default_slices")]
        slices: u32,
        #[serde(default = "default_slices")]
        rings: u32,
    },
    Cube {
        #[serde(default = "one")]
        x: f32,
        #[serde(default = "one")]
        y: f32,
        #[serde(default = "one")]
        z: f32,
    },
    ClipBox(ClipBounds),
}

/// Why an attribute write was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeError {
    Unknown,
    Invalid(String),
}

impl NodeKind {
    /// Name used in descriptions and debug output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::Group => "group",
            Self::Rotate { .. } => "rotate",
            Self::Translate { .. } => "translate",
            Self::Scale { .. } => "scale",
            Self::Camera(_) => "camera",
            Self::Light(_) => "light",
            Self::Material(_) => "material",
            Self::Sphere { .. } => "sphere",
            Self::Cube { .. } => "cube",
            Self::ClipBox(_) => "clipBox",
        }
    }

    /// Contributes to the model-view transform of descendants.
    pub fn is_transforming(&self) -> bool {
        matches!(
            self,
            Self::Rotate { .. } | Self::Translate { .. } | Self::Scale { .. } | Self::Camera(_)
        )
    }

    /// Carries spatial extent: geometry or a clip volume.
    pub fn is_bounding(&self) -> bool {
        matches!(self, Self::Sphere { .. } | Self::Cube { .. } | Self::ClipBox(_))
    }

    pub fn is_material(&self) -> bool {
        matches!(self, Self::Material(_))
    }

    pub fn geometry(&self) -> Option<Geometry> {
        match *self {
            Self::Sphere {
                radius,
                slices,
                rings,
            } => Some(Geometry::Sphere {
                radius,
                slices,
                rings,
            }),
            Self::Cube { x, y, z } => Some(Geometry::Cube {
                half_extents: Vec3::new(x, y, z),
            }),
            _ => None,
        }
    }

    pub fn clip_bounds(&self) -> Option<&ClipBounds> {
        match self {
            Self::ClipBox(bounds) => Some(bounds),
            _ => None,
        }
    }

    pub(crate) fn clip_bounds_mut(&mut self) -> Option<&mut ClipBounds> {
        match self {
            Self::ClipBox(bounds) => Some(bounds),
            _ => None,
        }
    }

    /// Attribute names this kind exposes, in display order.
    pub fn attribute_names(&self) -> &'static [&'static str] {
        match self {
            Self::Scene | Self::Group => &[],
            Self::Rotate { .. } => &["angle", "x", "y", "z"],
            Self::Translate { .. } | Self::Scale { .. } | Self::Cube { .. } => &["x", "y", "z"],
            Self::Camera(_) => &["eye", "look", "up", "fovy", "aspect", "near", "far"],
            Self::Light(_) => &["color", "dir", "pos"],
            Self::Material(_) => &[
                "baseColor",
                "specularColor",
                "specular",
                "shine",
                "emit",
                "alpha",
            ],
            Self::Sphere { .. } => &["radius", "slices", "rings"],
            Self::ClipBox(_) => &["xmin", "ymin", "zmin", "xmax", "ymax", "zmax"],
        }
    }

    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        let value = match (self, name) {
            (Self::Rotate { angle, .. }, "angle") => AttrValue::Number(*angle),
            (
                Self::Rotate { x, .. } | Self::Translate { x, .. } | Self::Scale { x, .. } | Self::Cube { x, .. },
                "x",
            ) => AttrValue::Number(*x),
            (
                Self::Rotate { y, .. } | Self::Translate { y, .. } | Self::Scale { y, .. } | Self::Cube { y, .. },
                "y",
            ) => AttrValue::Number(*y),
            (
                Self::Rotate { z, .. } | Self::Translate { z, .. } | Self::Scale { z, .. } | Self::Cube { z, .. },
                "z",
            ) => AttrValue::Number(*z),
            (Self::Camera(c), "eye") => AttrValue::Vector(c.eye),
            (Self::Camera(c), "look") => AttrValue::Vector(c.look),
            (Self::Camera(c), "up") => AttrValue::Vector(c.up),
            (Self::Camera(c), "fovy") => AttrValue::Number(c.fovy),
            (Self::Camera(c), "aspect") => AttrValue::Number(c.aspect),
            (Self::Camera(c), "near") => AttrValue::Number(c.near),
            (Self::Camera(c), "far") => AttrValue::Number(c.far),
            (Self::Light(l), "color") => AttrValue::Vector(l.color),
            (Self::Light(l), "dir") => AttrValue::Vector(l.dir),
            (Self::Light(l), "pos") => AttrValue::Vector(l.pos),
            (Self::Material(m), "baseColor") => AttrValue::Vector(m.base_color),
            (Self::Material(m), "specularColor") => AttrValue::Vector(m.specular_color),
            (Self::Material(m), "specular") => AttrValue::Number(m.specular),
            (Self::Material(m), "shine") => AttrValue::Number(m.shine),
            (Self::Material(m), "emit") => AttrValue::Number(m.emit),
            (Self::Material(m), "alpha") => AttrValue::Number(m.alpha),
            (Self::Sphere { radius, .. }, "radius") => AttrValue::Number(*radius),
            (Self::Sphere { slices, .. }, "slices") => AttrValue::Number(*slices as f32),
            (Self::Sphere { rings, .. }, "rings") => AttrValue::Number(*rings as f32),
            (Self::ClipBox(b), field) => AttrValue::Number(b.get(BoundField::from_name(field)?)),
            _ => return None,
        };
        Some(value)
    }

    /// Write one attribute and return the previous value.
    ///
    /// The write is checked with [`NodeKind::validate`] before it lands, so a
    /// refused write leaves `self` untouched.
    pub fn set_attribute(
        &mut self,
        name: &str,
        value: AttrValue,
    ) -> Result<AttrValue, AttributeError> {
        let old = self.attribute(name).ok_or(AttributeError::Unknown)?;
        if old.shape() != value.shape() {
            return Err(AttributeError::Invalid(format!(
                "expected {}, got {}",
                old.shape(),
                value.shape()
            )));
        }

        let mut next = self.clone();
        match value {
            AttrValue::Number(n) => next.write_number(name, n),
            AttrValue::Vector(v) => next.write_vector(name, v),
        }
        next.validate().map_err(AttributeError::Invalid)?;
        *self = next;
        Ok(old)
    }

    fn write_number(&mut self, name: &str, n: f32) {
        match (self, name) {
            (Self::Rotate { angle, .. }, "angle") => *angle = n,
            (
                Self::Rotate { x, .. } | Self::Translate { x, .. } | Self::Scale { x, .. } | Self::Cube { x, .. },
                "x",
            ) => *x = n,
            (
                Self::Rotate { y, .. } | Self::Translate { y, .. } | Self::Scale { y, .. } | Self::Cube { y, .. },
                "y",
            ) => *y = n,
            (
                Self::Rotate { z, .. } | Self::Translate { z, .. } | Self::Scale { z, .. } | Self::Cube { z, .. },
                "z",
            ) => *z = n,
            (Self::Camera(c), "fovy") => c.fovy = n,
            (Self::Camera(c), "aspect") => c.aspect = n,
            (Self::Camera(c), "near") => c.near = n,
            (Self::Camera(c), "far") => c.far = n,
            (Self::Material(m), "specular") => m.specular = n,
            (Self::Material(m), "shine") => m.shine = n,
            (Self::Material(m), "emit") => m.emit = n,
            (Self::Material(m), "alpha") => m.alpha = n,
            (Self::Sphere { radius, .. }, "radius") => *radius = n,
            (Self::Sphere { slices, .. }, "slices") => *slices = n.max(0.0).round() as u32,
            (Self::Sphere { rings, .. }, "rings") => *rings = n.max(0.0).round() as u32,
            (Self::ClipBox(b), field) => {
                if let Some(field) = BoundField::from_name(field) {
                    b.set(field, n);
                }
            }
            _ => {}
        }
    }

    fn write_vector(&mut self, name: &str, v: Vec3) {
        match (self, name) {
            (Self::Camera(c), "eye") => c.eye = v,
            (Self::Camera(c), "look") => c.look = v,
            (Self::Camera(c), "up") => c.up = v,
            (Self::Light(l), "color") => l.color = v,
            (Self::Light(l), "dir") => l.dir = v,
            (Self::Light(l), "pos") => l.pos = v,
            (Self::Material(m), "baseColor") => m.base_color = v,
            (Self::Material(m), "specularColor") => m.specular_color = v,
            _ => {}
        }
    }

    /// Check kind-specific constraints. Clip boxes may be inverted; NaN is
    /// never accepted.
    pub fn validate(&self) -> Result<(), String> {
        let finite = |label: &str, v: f32| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(format!("{label} must be finite"))
            }
        };
        match self {
            Self::Scene | Self::Group => Ok(()),
            Self::Rotate { angle, x, y, z } => {
                finite("angle", *angle)?;
                let axis = Vec3::new(*x, *y, *z);
                if !axis.is_finite() || axis.length_squared() == 0.0 {
                    return Err("rotation axis must be finite and non-zero".into());
                }
                Ok(())
            }
            Self::Translate { x, y, z } | Self::Scale { x, y, z } => {
                finite("x", *x)?;
                finite("y", *y)?;
                finite("z", *z)
            }
            Self::Camera(c) => {
                if !(c.eye.is_finite() && c.look.is_finite() && c.up.is_finite()) {
                    return Err("camera vectors must be finite".into());
                }
                if c.eye == c.look {
                    return Err("camera eye and look must differ".into());
                }
                if c.up.length_squared() == 0.0 {
                    return Err("camera up must be non-zero".into());
                }
                if (c.look - c.eye).normalize().cross(c.up.normalize()).length_squared() < 1e-12 {
                    return Err("camera up must not be parallel to the view direction".into());
                }
                if !(c.near > 0.0 && c.far > c.near && c.fovy > 0.0 && c.aspect > 0.0) {
                    return Err("camera optics must satisfy 0 < near < far, fovy > 0, aspect > 0".into());
                }
                Ok(())
            }
            Self::Light(l) => {
                if l.color.is_finite() && l.dir.is_finite() && l.pos.is_finite() {
                    Ok(())
                } else {
                    Err("light vectors must be finite".into())
                }
            }
            Self::Material(m) => {
                if !(0.0..=1.0).contains(&m.alpha) {
                    return Err("material alpha must be within [0, 1]".into());
                }
                finite("shine", m.shine)?;
                finite("specular", m.specular)?;
                finite("emit", m.emit)
            }
            Self::Sphere { radius, slices, rings } => {
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err("sphere radius must be positive".into());
                }
                if *slices == 0 || *rings == 0 {
                    return Err("sphere slices and rings must be at least 1".into());
                }
                Ok(())
            }
            Self::Cube { x, y, z } => {
                let half = Vec3::new(*x, *y, *z);
                if half.is_finite() && half.cmpgt(Vec3::ZERO).all() {
                    Ok(())
                } else {
                    Err("cube half extents must be positive".into())
                }
            }
            Self::ClipBox(b) => {
                if BoundField::ALL.into_iter().any(|f| b.get(f).is_nan()) {
                    Err("clip bounds must not be NaN".into())
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Per-node capability overrides. `None` inherits from the parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeFlags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipping: Option<bool>,
    /// `false` prunes the whole subtree from traversal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl NodeFlags {
    pub const NAMES: [&'static str; 2] = ["clipping", "enabled"];

    pub fn is_empty(&self) -> bool {
        self.clipping.is_none() && self.enabled.is_none()
    }

    pub fn get(&self, name: &str) -> Option<Option<bool>> {
        match name {
            "clipping" => Some(self.clipping),
            "enabled" => Some(self.enabled),
            _ => None,
        }
    }

    /// Set a flag by name; returns the previous override, or `None` for an
    /// unknown name.
    pub fn set(&mut self, name: &str, value: bool) -> Option<Option<bool>> {
        let slot = match name {
            "clipping" => &mut self.clipping,
            "enabled" => &mut self.enabled,
            _ => return None,
        };
        Some(slot.replace(value))
    }
}

/// A node stored in a [`SceneGraph`](crate::SceneGraph).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) handle: NodeHandle,
    pub(crate) id: Option<String>,
    pub(crate) kind: NodeKind,
    pub(crate) flags: NodeFlags,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
}

impl Node {
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn flags(&self) -> &NodeFlags {
        &self.flags
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Child handles in traversal order.
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.kind.attribute(name)
    }

    /// `id` if present, otherwise the kind name and short handle.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}#{}", self.kind.name(), self.handle.short()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_attributes_read_and_write() {
        let mut kind = NodeKind::Rotate {
            angle: 0.0,
            x: 0.0,
            y: 1.0,
            z: 0.0,
        };
        assert_eq!(kind.attribute("angle"), Some(AttrValue::Number(0.0)));
        let old = kind.set_attribute("angle", AttrValue::Number(45.0)).unwrap();
        assert_eq!(old, AttrValue::Number(0.0));
        assert_eq!(kind.attribute("angle"), Some(AttrValue::Number(45.0)));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let mut kind = NodeKind::Group;
        assert_eq!(
            kind.set_attribute("angle", AttrValue::Number(1.0)),
            Err(AttributeError::Unknown)
        );
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let mut kind = NodeKind::Camera(CameraParams::default());
        let err = kind.set_attribute("eye", AttrValue::Number(1.0)).unwrap_err();
        assert!(matches!(err, AttributeError::Invalid(_)));
    }

    #[test]
    fn invalid_write_leaves_kind_untouched() {
        let mut kind = NodeKind::Sphere {
            radius: 1.0,
            slices: 30,
            rings: 30,
        };
        assert!(kind.set_attribute("radius", AttrValue::Number(-1.0)).is_err());
        assert_eq!(kind.attribute("radius"), Some(AttrValue::Number(1.0)));
    }

    #[test]
    fn zero_rotation_axis_is_invalid() {
        let kind = NodeKind::Rotate {
            angle: 10.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        };
        assert!(kind.validate().is_err());
    }

    #[test]
    fn camera_up_along_view_direction_is_invalid() {
        let mut kind = NodeKind::Camera(CameraParams::default());
        let err = kind
            .set_attribute("up", AttrValue::Vector(Vec3::Z))
            .unwrap_err();
        assert!(matches!(err, AttributeError::Invalid(ref r) if r.contains("parallel")));
        assert_eq!(kind.attribute("up"), Some(AttrValue::Vector(Vec3::Y)));

        let looking_down = NodeKind::Camera(CameraParams {
            eye: Vec3::new(0.0, 10.0, 0.0),
            ..CameraParams::default()
        });
        assert!(looking_down.validate().is_err());
        kind.set_attribute("up", AttrValue::Vector(Vec3::X)).unwrap();
    }

    #[test]
    fn clip_box_accepts_inverted_bounds() {
        let mut kind = NodeKind::ClipBox(ClipBounds::cube(1.0));
        kind.set_attribute("xmin", AttrValue::Number(5.0)).unwrap();
        assert!(kind.clip_bounds().unwrap().is_empty());
        assert!(kind.set_attribute("xmin", AttrValue::Number(f32::NAN)).is_err());
    }

    #[test]
    fn capabilities() {
        assert!(NodeKind::Scale { x: 1.0, y: 1.0, z: 1.0 }.is_transforming());
        assert!(NodeKind::ClipBox(ClipBounds::default()).is_bounding());
        assert!(NodeKind::Material(MaterialParams::default()).is_material());
        assert!(!NodeKind::Group.is_transforming());
    }

    #[test]
    fn flags_set_and_get() {
        let mut flags = NodeFlags::default();
        assert!(flags.is_empty());
        assert_eq!(flags.set("clipping", false), Some(None));
        assert_eq!(flags.get("clipping"), Some(Some(false)));
        assert_eq!(flags.set("picking", true), None);
        assert_eq!(flags.get("picking"), None);
    }

    #[test]
    fn kind_deserializes_from_tagged_json() {
        let kind: NodeKind =
            serde_json::from_str(r#"{"type": "rotate", "angle": 30, "y": 1}"#).unwrap();
        assert_eq!(
            kind,
            NodeKind::Rotate {
                angle: 30.0,
                x: 0.0,
                y: 1.0,
                z: 0.0
            }
        );
        let scale: NodeKind = serde_json::from_str(r#"{"type": "scale", "x": 2}"#).unwrap();
        assert_eq!(scale, NodeKind::Scale { x: 2.0, y: 1.0, z: 1.0 });
    }

    #[test]
    fn clip_box_deserializes_sparse_bounds() {
        let kind: NodeKind =
            serde_json::from_str(r#"{"type": "clipBox", "xmin": -1.0, "xmax": 1.0}"#).unwrap();
        let bounds = kind.clip_bounds().unwrap();
        assert_eq!(bounds.xmin, -1.0);
        assert_eq!(bounds.ymin, f32::NEG_INFINITY);
    }
}
