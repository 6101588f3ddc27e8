use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// One of the six scalar fields of a clip box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundField {
    XMin,
    YMin,
    ZMin,
    XMax,
    YMax,
    ZMax,
}

impl BoundField {
    pub const ALL: [BoundField; 6] = [
        Self::XMin,
        Self::YMin,
        Self::ZMin,
        Self::XMax,
        Self::YMax,
        Self::ZMax,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::XMin => "xmin",
            Self::YMin => "ymin",
            Self::ZMin => "zmin",
            Self::XMax => "xmax",
            Self::YMax => "ymax",
            Self::ZMax => "zmax",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Axis-aligned clip box in world space.
///
/// Unset bounds are infinite. An axis whose min exceeds its max is kept as
/// written and makes the whole box empty: nothing can be inside it.
///
/// Serializes as a [`BoundsPatch`]: infinite bounds are omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "BoundsPatch", into = "BoundsPatch")]
pub struct ClipBounds {
    pub xmin: f32,
    pub ymin: f32,
    pub zmin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub zmax: f32,
}

impl Default for ClipBounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl ClipBounds {
    pub const UNBOUNDED: Self = Self {
        xmin: f32::NEG_INFINITY,
        ymin: f32::NEG_INFINITY,
        zmin: f32::NEG_INFINITY,
        xmax: f32::INFINITY,
        ymax: f32::INFINITY,
        zmax: f32::INFINITY,
    };

    /// Symmetric box `[-extent, extent]` on every axis.
    pub fn cube(extent: f32) -> Self {
        Self {
            xmin: -extent,
            ymin: -extent,
            zmin: -extent,
            xmax: extent,
            ymax: extent,
            zmax: extent,
        }
    }

    /// Unbounded box with the patch's fields applied.
    pub fn from_patch(patch: &BoundsPatch) -> Self {
        let mut bounds = Self::UNBOUNDED;
        bounds.apply(patch);
        bounds
    }

    /// Overwrite only the fields present in `patch`.
    pub fn apply(&mut self, patch: &BoundsPatch) {
        for field in BoundField::ALL {
            if let Some(v) = patch.get(field) {
                self.set(field, v);
            }
        }
    }

    pub fn get(&self, field: BoundField) -> f32 {
        match field {
            BoundField::XMin => self.xmin,
            BoundField::YMin => self.ymin,
            BoundField::ZMin => self.zmin,
            BoundField::XMax => self.xmax,
            BoundField::YMax => self.ymax,
            BoundField::ZMax => self.zmax,
        }
    }

    pub fn set(&mut self, field: BoundField, value: f32) {
        match field {
            BoundField::XMin => self.xmin = value,
            BoundField::YMin => self.ymin = value,
            BoundField::ZMin => self.zmin = value,
            BoundField::XMax => self.xmax = value,
            BoundField::YMax => self.ymax = value,
            BoundField::ZMax => self.zmax = value,
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.xmin, self.ymin, self.zmin)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.xmax, self.ymax, self.zmax)
    }

    /// True when any axis is inverted.
    pub fn is_empty(&self) -> bool {
        self.xmin > self.xmax || self.ymin > self.ymax || self.zmin > self.zmax
    }

    /// Most restrictive combination of two boxes.
    pub fn intersect(&self, other: &ClipBounds) -> ClipBounds {
        ClipBounds {
            xmin: self.xmin.max(other.xmin),
            ymin: self.ymin.max(other.ymin),
            zmin: self.zmin.max(other.zmin),
            xmax: self.xmax.min(other.xmax),
            ymax: self.ymax.min(other.ymax),
            zmax: self.zmax.min(other.zmax),
        }
    }

    /// Classify a world-space box against this clip region.
    pub fn classify(&self, aabb: &Aabb) -> Containment {
        if self.is_empty() {
            return Containment::Outside;
        }
        let (lo, hi) = (self.min(), self.max());
        if aabb.max.cmplt(lo).any() || aabb.min.cmpgt(hi).any() {
            return Containment::Outside;
        }
        if aabb.min.cmpge(lo).all() && aabb.max.cmple(hi).all() {
            Containment::Inside
        } else {
            Containment::Partial
        }
    }
}

/// Sparse update of a clip box: absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xmin: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ymin: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zmin: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xmax: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ymax: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zmax: Option<f32>,
}

impl From<BoundsPatch> for ClipBounds {
    fn from(patch: BoundsPatch) -> Self {
        Self::from_patch(&patch)
    }
}

impl From<ClipBounds> for BoundsPatch {
    fn from(bounds: ClipBounds) -> Self {
        let mut patch = BoundsPatch::new();
        for field in BoundField::ALL {
            let v = bounds.get(field);
            if !v.is_infinite() {
                patch = patch.with(field, v);
            }
        }
        patch
    }
}

impl BoundsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that sets all six fields.
    pub fn full(bounds: &ClipBounds) -> Self {
        let mut patch = Self::new();
        for field in BoundField::ALL {
            patch = patch.with(field, bounds.get(field));
        }
        patch
    }

    pub fn with(mut self, field: BoundField, value: f32) -> Self {
        let slot = match field {
            BoundField::XMin => &mut self.xmin,
            BoundField::YMin => &mut self.ymin,
            BoundField::ZMin => &mut self.zmin,
            BoundField::XMax => &mut self.xmax,
            BoundField::YMax => &mut self.ymax,
            BoundField::ZMax => &mut self.zmax,
        };
        *slot = Some(value);
        self
    }

    pub fn get(&self, field: BoundField) -> Option<f32> {
        match field {
            BoundField::XMin => self.xmin,
            BoundField::YMin => self.ymin,
            BoundField::ZMin => self.zmin,
            BoundField::XMax => self.xmax,
            BoundField::YMax => self.ymax,
            BoundField::ZMax => self.zmax,
        }
    }

    /// Number of fields the patch carries.
    pub fn len(&self) -> usize {
        BoundField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// World-space axis-aligned bounding box of emitted geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Bounds of the local box `[-half, half]` after applying `model`.
    pub fn from_transformed_box(model: Mat4, half: Vec3) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { -half.x } else { half.x },
                if i & 2 == 0 { -half.y } else { half.y },
                if i & 4 == 0 { -half.z } else { half.z },
            );
            let p = model.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

/// Result of testing geometry against the active clip region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Containment {
    /// No clip region applies (none active, or clipping disabled for the subtree).
    Unclipped,
    Inside,
    Partial,
    Outside,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        let b = ClipBounds::default();
        assert_eq!(b.xmin, f32::NEG_INFINITY);
        assert_eq!(b.zmax, f32::INFINITY);
        assert!(!b.is_empty());
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut b = ClipBounds::cube(1.2);
        let patch = BoundsPatch::new()
            .with(BoundField::YMin, -2.0)
            .with(BoundField::XMax, 2.0)
            .with(BoundField::ZMax, 2.0);
        b.apply(&patch);
        assert_eq!(
            b,
            ClipBounds {
                xmin: -1.2,
                ymin: -2.0,
                zmin: -1.2,
                xmax: 2.0,
                ymax: 1.2,
                zmax: 2.0,
            }
        );
        assert_eq!(patch.len(), 3);
    }

    #[test]
    fn from_patch_leaves_missing_axes_open() {
        let b = ClipBounds::from_patch(&BoundsPatch::new().with(BoundField::XMax, 1.0));
        assert_eq!(b.xmax, 1.0);
        assert_eq!(b.xmin, f32::NEG_INFINITY);
        assert_eq!(b.ymax, f32::INFINITY);
    }

    #[test]
    fn intersection_is_most_restrictive() {
        let a = ClipBounds::cube(2.0);
        let b = ClipBounds::from_patch(&BoundsPatch::new().with(BoundField::XMin, 1.0));
        let c = a.intersect(&b);
        assert_eq!(c.xmin, 1.0);
        assert_eq!(c.xmax, 2.0);
        assert_eq!(c.ymin, -2.0);
    }

    #[test]
    fn inverted_axis_is_empty_and_excludes_everything() {
        let b = ClipBounds::from_patch(
            &BoundsPatch::new()
                .with(BoundField::XMin, 1.0)
                .with(BoundField::XMax, -1.0),
        );
        assert!(b.is_empty());
        let tiny = Aabb {
            min: Vec3::splat(-0.01),
            max: Vec3::splat(0.01),
        };
        assert_eq!(b.classify(&tiny), Containment::Outside);
    }

    #[test]
    fn classify_inside_partial_outside() {
        let region = ClipBounds::cube(1.0);
        let unit = |c: Vec3, h: f32| Aabb::from_transformed_box(Mat4::from_translation(c), Vec3::splat(h));
        assert_eq!(region.classify(&unit(Vec3::ZERO, 0.5)), Containment::Inside);
        assert_eq!(region.classify(&unit(Vec3::X, 0.5)), Containment::Partial);
        assert_eq!(region.classify(&unit(Vec3::X * 5.0, 0.5)), Containment::Outside);
    }

    #[test]
    fn transformed_box_accounts_for_scale() {
        let aabb = Aabb::from_transformed_box(Mat4::from_scale(Vec3::splat(2.0)), Vec3::ONE);
        assert_eq!(aabb.min, Vec3::splat(-2.0));
        assert_eq!(aabb.max, Vec3::splat(2.0));
    }

    #[test]
    fn serialized_form_omits_infinite_bounds() {
        let b = ClipBounds::from_patch(&BoundsPatch::new().with(BoundField::ZMin, -3.0));
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, r#"{"zmin":-3.0}"#);
        let back: ClipBounds = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn bound_field_names_round_trip() {
        for field in BoundField::ALL {
            assert_eq!(BoundField::from_name(field.name()), Some(field));
        }
        assert_eq!(BoundField::from_name("wmin"), None);
    }
}
