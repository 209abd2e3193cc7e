//! Arena-backed scene graph.
//!
//! Nodes are only ever inserted; a [`NodeId`] stays valid for the lifetime of
//! the graph that issued it.

use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};

use crate::asset::TextureHandle;
use crate::geometry::Geometry;
use crate::light::{AmbientLight, HemisphereLight};
use crate::material::Material;

/// Index of a node inside its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Local placement of a node relative to its parent.
///
/// `orientation` holds rotations fixed at construction. `spin` is the
/// cumulative angle about the parent's vertical axis that animation advances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub orientation: Quat,
    pub spin: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            spin: 0.0,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// `T * R_y(spin) * orientation`.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(
            Quat::from_rotation_y(self.spin) * self.orientation,
            self.translation,
        )
    }
}

/// Drawable payload of a node.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Shape, generated and uploaded once per distinct key.
    pub geometry: Geometry,
    /// Surface appearance.
    pub material: Material,
}

/// What a node contributes to the frame.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Transform-only node that carries its children.
    Group,
    /// Drawn with the node's world matrix.
    Mesh(Mesh),
    /// Uniform light added to every lit surface.
    AmbientLight(AmbientLight),
    /// Sky/ground gradient light keyed on the surface normal.
    HemisphereLight(HemisphereLight),
}

/// A scene node. Parent and children links are owned by the [`SceneGraph`].
#[derive(Debug, Clone)]
pub struct Node {
    /// Debug label, not required to be unique.
    pub name: String,
    /// Transform relative to the parent.
    pub transform: Transform,
    /// Payload.
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The mesh payload, if this node is drawable.
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// Owner of every node in a scene.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        kind: NodeKind,
    ) -> NodeId {
        let id = self.push(name.into(), transform, kind, None);
        self.roots.push(id);
        id
    }

    /// Insert a node under `parent`. Panics if `parent` came from another graph.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        kind: NodeKind,
    ) -> NodeId {
        let id = self.push(name.into(), transform, kind, Some(parent));
        self.nodes[parent.index()].children.push(id);
        id
    }

    fn push(
        &mut self,
        name: String,
        transform: Transform,
        kind: NodeKind,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name,
            transform,
            kind,
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add `delta` to a node's spin, kept in `[0, 2π)` so precision does not
    /// decay over long sessions. Unknown ids are ignored.
    pub fn add_spin(&mut self, id: NodeId, delta: f32) {
        if let Some(node) = self.node_mut(id) {
            node.transform.spin = (node.transform.spin + delta).rem_euclid(TAU);
        }
    }

    pub fn spin(&self, id: NodeId) -> Option<f32> {
        self.node(id).map(|n| n.transform.spin)
    }

    /// World transform of a node: the product of local matrices from the root down.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.node(node_id) else {
                break;
            };
            matrix = node.transform.local_matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// Depth-first pre-order walk over all roots, passing each node's world matrix.
    pub fn visit(&self, mut f: impl FnMut(NodeId, &Node, Mat4)) {
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, Mat4::IDENTITY))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.index()];
            let world = parent_world * node.transform.local_matrix();
            f(id, node, world);
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }
}

/// A scene graph plus the background shown behind it.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub graph: SceneGraph,
    pub background: Option<TextureHandle>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }
}
