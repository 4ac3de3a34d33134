//! Parsed scene tree handed over by model loaders.

use glam::{Mat4, Quat, Vec3};

use crate::bounds::Aabb;
use crate::normalize::{normalize, NormalizedTransform};

/// Local translation / rotation / scale of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl NodeTransform {
    pub const IDENTITY: NodeTransform = NodeTransform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<NormalizedTransform> for NodeTransform {
    fn from(fit: NormalizedTransform) -> Self {
        Self {
            translation: fit.center_offset,
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(fit.uniform_scale),
        }
    }
}

/// Renderable geometry attached to a node. Only its local bounds matter to
/// the presentation pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshInfo {
    pub bounds: Aabb,
    pub primitive_count: usize,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshInfo {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            primitive_count: 1,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn shadowed(&self) -> bool {
        self.cast_shadow && self.receive_shadow
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: NodeTransform,
    pub mesh: Option<MeshInfo>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Empty container node.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Leaf node carrying geometry with the given local bounds.
    pub fn mesh(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: Some(name.into()),
            mesh: Some(MeshInfo::new(bounds)),
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first, pre-order visit of this node and every descendant.
    pub fn traverse(&self, f: &mut impl FnMut(&SceneNode)) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    pub fn traverse_mut(&mut self, f: &mut impl FnMut(&mut SceneNode)) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.traverse(&mut |_: &SceneNode| n += 1);
        n
    }

    pub fn mesh_count(&self) -> usize {
        let mut n = 0;
        self.traverse(&mut |node: &SceneNode| {
            if node.mesh.is_some() {
                n += 1;
            }
        });
        n
    }

    /// Bounds of this node's geometry and all descendants, expressed in the
    /// node's own frame (its transform is not applied).
    pub fn local_bounds(&self) -> Aabb {
        let mut out = Aabb::EMPTY;
        self.accumulate_bounds(Mat4::IDENTITY, &mut out);
        out
    }

    /// Bounds in the parent's frame (this node's transform applied).
    pub fn bounds(&self) -> Aabb {
        let mut out = Aabb::EMPTY;
        self.accumulate_bounds(self.transform.to_mat4(), &mut out);
        out
    }

    fn accumulate_bounds(&self, to_frame: Mat4, out: &mut Aabb) {
        if let Some(mesh) = &self.mesh {
            *out = out.union(&mesh.bounds.transformed(&to_frame));
        }
        for child in &self.children {
            child.accumulate_bounds(to_frame * child.transform.to_mat4(), out);
        }
    }
}

/// Ready a freshly parsed scene for display.
///
/// The root is treated as a container: its transform is replaced by the
/// normalized fit of its content, and every mesh below it casts and
/// receives shadows.
pub fn prepare_for_display(root: &mut SceneNode) -> NormalizedTransform {
    let fit = normalize(&root.local_bounds());
    root.transform = fit.into();

    root.traverse_mut(&mut |node: &mut SceneNode| {
        if let Some(mesh) = node.mesh.as_mut() {
            mesh.cast_shadow = true;
            mesh.receive_shadow = true;
        }
    });

    fit
}
