//! Arena-backed scene graph
//!
//! Nodes live in a slot map and refer to each other by [`NodeId`]. A node
//! owns its children: removing it removes the whole subtree. Structural
//! changes requested while a traversal is running go through
//! [`SceneGraph::mark_for_removal`] and are applied by [`SceneGraph::sweep`]
//! once the traversal is over.

use bitflags::bitflags;
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use super::{NodeTransform, AABB};
use crate::animation::Renderable;
use crate::foundation::math::{Axis, Mat4, Vec3};
use crate::render::{DrawCommand, Renderer};

new_key_type! {
    /// Stable handle to a node in a [`SceneGraph`]
    pub struct NodeId;
}

bitflags! {
    /// Per-node state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node's box takes part in collision queries
        const SOLID = 1 << 0;
        /// Node is logically gone and will be dropped by the next sweep
        const PENDING_REMOVAL = 1 << 1;
    }
}

/// Scene graph errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// Handle does not refer to a live node
    #[error("scene node {0:?} does not exist")]
    MissingNode(NodeId),

    /// Attaching would make a node its own ancestor
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Intended parent
        parent: NodeId,
        /// Node being attached
        child: NodeId,
    },
}

/// One node of the scene tree
///
/// `B` is the game's behavior component; the graph only stores it.
#[derive(Debug, Clone)]
pub struct SceneNode<B> {
    /// Diagnostic name
    pub name: String,
    transform: NodeTransform,
    bounds: AABB,
    flags: NodeFlags,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Model, material and animation cursor, for nodes that draw
    pub renderable: Option<Renderable>,
    /// Game-specific state
    pub behavior: Option<B>,
}

impl<B> SceneNode<B> {
    /// Empty, non-solid grouping node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: NodeTransform::identity(),
            bounds: AABB::default(),
            flags: NodeFlags::empty(),
            parent: None,
            children: Vec::new(),
            renderable: None,
            behavior: None,
        }
    }

    /// Solid node drawing `renderable`, boxed by its model's first keyframe
    pub fn geometry(name: impl Into<String>, renderable: Renderable) -> Self {
        let mut node = Self::new(name);
        node.bounds = renderable.bounding_box();
        node.flags.insert(NodeFlags::SOLID);
        node.renderable = Some(renderable);
        node
    }

    /// Attach a behavior component
    #[must_use]
    pub fn with_behavior(mut self, behavior: B) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Local transform
    pub fn transform(&self) -> &Mat4 {
        self.transform.matrix()
    }

    /// Inverse of the local transform
    pub fn inverse(&self) -> &Mat4 {
        self.transform.inverse()
    }

    /// Replace the local transform; the box is left untouched
    ///
    /// A singular matrix is rejected; returns whether it was applied.
    pub fn set_transform(&mut self, matrix: Mat4) -> bool {
        self.transform.set(matrix)
    }

    /// Move by `offset`, box included
    pub fn translate(&mut self, offset: Vec3) {
        if self.transform.translate(offset) {
            self.bounds = self.bounds.translated(offset);
        }
    }

    /// Scale by `factors`, box corners included
    ///
    /// A zero factor would make the transform singular and is ignored.
    pub fn scale(&mut self, factors: Vec3) {
        if self.transform.scale(factors) {
            self.bounds = self.bounds.scaled(factors);
        }
    }

    /// Rotate by `degrees` about `axis`. The box does not follow rotations.
    pub fn rotate(&mut self, degrees: f32, axis: &Vec3) {
        self.transform.rotate(degrees, axis);
    }

    /// Rotate about a principal axis
    pub fn rotate_about(&mut self, axis: Axis, degrees: f32) {
        self.transform.rotate_about(axis, degrees);
    }

    /// Origin of this node in its parent's space
    pub fn location(&self) -> Vec3 {
        self.transform.location()
    }

    /// Collision box
    pub fn bounding_box(&self) -> AABB {
        self.bounds
    }

    /// Replace the collision box
    pub fn set_bounding_box(&mut self, bounds: AABB) {
        self.bounds = bounds;
    }

    /// Current flags
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Whether the box takes part in collision
    pub fn is_solid(&self) -> bool {
        self.flags.contains(NodeFlags::SOLID)
    }

    /// Toggle collision participation
    pub fn set_solid(&mut self, solid: bool) {
        self.flags.set(NodeFlags::SOLID, solid);
    }

    /// Marked for the next sweep
    pub fn is_pending_removal(&self) -> bool {
        self.flags.contains(NodeFlags::PENDING_REMOVAL)
    }

    /// Parent handle, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Owning arena of scene nodes
#[derive(Debug, Clone)]
pub struct SceneGraph<B> {
    nodes: SlotMap<NodeId, SceneNode<B>>,
}

impl<B> Default for SceneGraph<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SceneGraph<B> {
    /// Empty graph
    pub fn new() -> Self {
        Self { nodes: SlotMap::with_key() }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// No live nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is live
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a node
    pub fn get(&self, id: NodeId) -> Option<&SceneNode<B>> {
        self.nodes.get(id)
    }

    /// Mutably borrow a node
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode<B>> {
        self.nodes.get_mut(id)
    }

    /// Insert a detached node (a new root)
    pub fn insert(&mut self, mut node: SceneNode<B>) -> NodeId {
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    /// Insert `node` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode<B>) -> Result<NodeId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::MissingNode(parent));
        }
        let id = self.insert(node);
        self.link(parent, id);
        Ok(id)
    }

    /// Move an existing node (and its subtree) under `parent`
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        for id in [parent, child] {
            if !self.contains(id) {
                return Err(SceneError::MissingNode(id));
            }
        }
        if self.ancestors(parent).any(|a| a == child) || parent == child {
            return Err(SceneError::Cycle { parent, child });
        }
        self.detach(child);
        self.link(parent, child);
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Unlink a node from its parent, keeping it alive as a root
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&c| c != child);
        }
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).and_then(SceneNode::parent), |&p| self.get(p).and_then(SceneNode::parent))
    }

    /// Remove a node and its whole subtree; returns how many nodes were dropped
    pub fn remove(&mut self, id: NodeId) -> usize {
        if !self.contains(id) {
            return 0;
        }
        self.detach(id);

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    /// Flag a node for removal by the next [`SceneGraph::sweep`]
    ///
    /// A pending node is skipped by collision queries but still updated and
    /// drawn until the sweep runs.
    pub fn mark_for_removal(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.flags.insert(NodeFlags::PENDING_REMOVAL);
        }
    }

    /// Remove every node marked for removal, with its subtree
    pub fn sweep(&mut self) -> usize {
        let doomed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.is_pending_removal())
            .map(|(id, _)| id)
            .collect();
        doomed.into_iter().map(|id| self.remove(id)).sum()
    }

    /// Children of `id`, empty for unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(SceneNode::children).unwrap_or_default()
    }

    /// Depth-first pre-order update
    ///
    /// Every node first advances its animation, then `hook` runs for it with
    /// full access to the graph, then its children are visited in order. The
    /// child list is read after the hook, so children the hook adds are
    /// updated in the same pass; nodes the hook removes are skipped.
    pub fn update<F>(&mut self, root: NodeId, hook: &mut F)
    where
        F: FnMut(&mut Self, NodeId),
    {
        let Some(node) = self.nodes.get_mut(root) else {
            return;
        };
        if let Some(renderable) = node.renderable.as_mut() {
            renderable.advance();
        }

        hook(self, root);

        let children = self.children(root).to_vec();
        for child in children {
            self.update(child, hook);
        }
    }

    /// Pre-order draw
    ///
    /// A node composes `transform * accum`, emits its own draw command with
    /// that matrix, and hands the same matrix down to its children, so every
    /// ancestor's transform is applied exactly once.
    pub fn draw(&self, root: NodeId, accum: &Mat4, renderer: &mut dyn Renderer) {
        let Some(node) = self.get(root) else {
            return;
        };
        let world = node.transform() * accum;

        if let Some(renderable) = &node.renderable {
            match DrawCommand::for_renderable(world, renderable) {
                Some(command) if renderable.material().is_loaded() => renderer.draw(command),
                Some(_) => log::trace!("Skipping '{}': material '{}' has no textures", node.name, renderable.material().name),
                None => log::warn!("Skipping '{}': model '{}' has no keyframes", node.name, renderable.model().name()),
            }
        }

        for &child in &node.children {
            self.draw(child, &world, renderer);
        }
    }

    /// First solid node in `root`'s subtree (pre-order) whose box strictly overlaps `other`
    pub fn is_colliding_with(&self, root: NodeId, other: &AABB) -> Option<NodeId> {
        let node = self.get(root)?;
        if node.is_pending_removal() {
            return None;
        }
        if node.is_solid() && node.bounds.intersects(other) {
            return Some(root);
        }
        node.children.iter().find_map(|&child| self.is_colliding_with(child, other))
    }

    /// [`SceneGraph::is_colliding_with`] against another node's box
    pub fn node_collides_with_node(&self, root: NodeId, other: NodeId) -> Option<NodeId> {
        let bounds = self.get(other)?.bounding_box();
        self.is_colliding_with(root, &bounds)
    }
}

impl<B: Clone> SceneGraph<B> {
    /// Deep copy of a subtree as a new detached root
    ///
    /// Every copied node keeps its transform, box, solidity, renderable and
    /// behavior; child order is preserved. The removal mark is not copied.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId, SceneError> {
        let source = self.get(id).ok_or(SceneError::MissingNode(id))?;
        let mut copy = source.clone();
        copy.flags.remove(NodeFlags::PENDING_REMOVAL);
        let children = source.children.clone();

        let new_id = self.insert(copy);
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.link(new_id, child_copy);
        }
        Ok(new_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Keyframe, Model};
    use crate::assets::MeshData;
    use crate::render::{Material, MaterialTextures, RecordingRenderer};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    type Graph = SceneGraph<u32>;

    fn cube_renderable() -> Renderable {
        let keyframe = Arc::new(Keyframe::from_mesh(&MeshData::cube(0.5)).unwrap());
        let mut model = Model::new("cube");
        model.add_keyframe(keyframe, 1).unwrap();
        let material = Material {
            name: "test".into(),
            textures: MaterialTextures { diffuse: "white.png".into(), ..Default::default() },
            ..Default::default()
        };
        Renderable::new(Arc::new(model), Arc::new(material)).unwrap()
    }

    fn solid_at(name: &str, at: Vec3) -> SceneNode<u32> {
        let mut node = SceneNode::geometry(name, cube_renderable());
        node.translate(at);
        node
    }

    #[test]
    fn test_geometry_node_is_solid_with_model_bounds() {
        let node = solid_at("cube", Vec3::new(2.0, 0.0, 0.0));
        assert!(node.is_solid());
        assert_eq!(node.bounding_box(), AABB::new(Vec3::new(1.5, -0.5, -0.5), Vec3::new(2.5, 0.5, 0.5)));
        assert_relative_eq!(node.location(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotation_leaves_bounds_alone() {
        let mut node = solid_at("cube", Vec3::zeros());
        node.scale(Vec3::new(4.0, 1.0, 1.0));
        let before = node.bounding_box();
        node.rotate_about(Axis::Y, 90.0);
        assert_eq!(node.bounding_box(), before);
        assert_relative_eq!(node.transform() * node.inverse(), Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_zero_scale_is_ignored() {
        let mut node = solid_at("cube", Vec3::new(1.0, 0.0, 0.0));
        let before = node.bounding_box();
        node.scale(Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(node.bounding_box(), before);
        assert_relative_eq!(node.transform() * node.inverse(), Mat4::identity(), epsilon = 1e-5);
        assert!(!node.set_transform(Mat4::zeros()));
        assert_relative_eq!(node.location(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_node_against_node() {
        let mut graph = Graph::new();
        let walls = graph.insert(SceneNode::new("walls"));
        let wall = graph.add_child(walls, solid_at("wall", Vec3::zeros())).unwrap();
        let near = graph.insert(solid_at("near", Vec3::new(0.9, 0.0, 0.0)));
        let far = graph.insert(solid_at("far", Vec3::new(3.0, 0.0, 0.0)));

        assert_eq!(graph.node_collides_with_node(walls, near), Some(wall));
        assert_eq!(graph.node_collides_with_node(walls, far), None);
        graph.remove(near);
        assert_eq!(graph.node_collides_with_node(walls, near), None);
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut graph = Graph::new();
        let root = graph.insert(SceneNode::new("root"));
        let a = graph.add_child(root, SceneNode::new("a")).unwrap();
        let b = graph.add_child(a, SceneNode::new("b")).unwrap();
        let c = graph.add_child(root, SceneNode::new("c")).unwrap();

        assert_eq!(graph.remove(a), 2);
        assert!(!graph.contains(b));
        assert_eq!(graph.children(root), &[c]);
    }

    #[test]
    fn test_mark_then_sweep() {
        let mut graph = Graph::new();
        let root = graph.insert(SceneNode::new("root"));
        let a = graph.add_child(root, solid_at("a", Vec3::zeros())).unwrap();
        let b = graph.add_child(root, solid_at("b", Vec3::new(5.0, 0.0, 0.0))).unwrap();

        graph.mark_for_removal(a);
        assert!(graph.contains(a));
        let probe = AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(0.1));
        assert_eq!(graph.is_colliding_with(root, &probe), None);

        assert_eq!(graph.sweep(), 1);
        assert!(!graph.contains(a));
        assert_eq!(graph.children(root), &[b]);
    }

    #[test]
    fn test_collision_is_first_match_in_preorder() {
        let mut graph = Graph::new();
        let root = graph.insert(SceneNode::new("root"));
        let first = graph.add_child(root, solid_at("first", Vec3::zeros())).unwrap();
        let _second = graph.add_child(root, solid_at("second", Vec3::new(0.5, 0.0, 0.0))).unwrap();

        let probe = AABB::from_center_extents(Vec3::new(0.3, 0.0, 0.0), Vec3::repeat(0.1));
        assert_eq!(graph.is_colliding_with(root, &probe), Some(first));

        graph.get_mut(first).unwrap().set_solid(false);
        assert_ne!(graph.is_colliding_with(root, &probe), Some(first));
        assert!(graph.is_colliding_with(root, &probe).is_some());

        let far = AABB::from_center_extents(Vec3::new(10.0, 0.0, 0.0), Vec3::repeat(0.1));
        assert_eq!(graph.is_colliding_with(root, &far), None);
    }

    #[test]
    fn test_update_is_preorder_and_sees_new_children() {
        let mut graph = Graph::new();
        let root = graph.insert(SceneNode::new("root").with_behavior(0));
        let a = graph.add_child(root, SceneNode::new("a").with_behavior(1)).unwrap();
        graph.add_child(a, SceneNode::new("a1").with_behavior(2)).unwrap();
        graph.add_child(root, SceneNode::new("b").with_behavior(3)).unwrap();

        let mut order = Vec::new();
        graph.update(root, &mut |graph: &mut Graph, id| {
            let tag = graph.get(id).and_then(|n| n.behavior).unwrap();
            order.push(tag);
            if tag == 3 {
                graph.add_child(id, SceneNode::new("spawned").with_behavior(4)).unwrap();
            }
        });
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_update_skips_nodes_removed_by_hook() {
        let mut graph = Graph::new();
        let root = graph.insert(SceneNode::new("root").with_behavior(0));
        let doomed = graph.add_child(root, SceneNode::new("doomed").with_behavior(1)).unwrap();
        graph.add_child(root, SceneNode::new("kept").with_behavior(2)).unwrap();

        let mut seen = Vec::new();
        graph.update(root, &mut |graph: &mut Graph, id| {
            seen.push(graph.get(id).and_then(|n| n.behavior).unwrap());
            if id == root {
                graph.remove(doomed);
            }
        });
        assert_eq!(seen, vec![0, 2]);
    }

    #[test]
    fn test_draw_applies_each_ancestor_once() {
        let mut graph = Graph::new();
        let root = graph.insert(SceneNode::new("root"));
        let group = graph.add_child(root, SceneNode::new("group")).unwrap();
        graph.get_mut(group).unwrap().translate(Vec3::new(0.0, 10.0, 0.0));
        graph.add_child(group, solid_at("leaf", Vec3::new(1.0, 0.0, 0.0))).unwrap();

        let mut renderer = RecordingRenderer::default();
        graph.draw(root, &Mat4::identity(), &mut renderer);

        assert_eq!(renderer.commands.len(), 1);
        let command = &renderer.commands[0];
        assert_relative_eq!(command.world.column(3).xyz(), Vec3::new(1.0, 10.0, 0.0));
        assert_eq!(command.vertex_count, 36);
        assert_eq!((command.current_keyframe, command.next_keyframe), (0, 0));
    }

    #[test]
    fn test_draw_skips_untextured_material() {
        let mut graph = Graph::new();
        let mut renderable = cube_renderable();
        renderable.set_material(Arc::new(Material::unloaded("missing")));
        let root = graph.insert(SceneNode::geometry("cube", renderable));

        let mut renderer = RecordingRenderer::default();
        graph.draw(root, &Mat4::identity(), &mut renderer);
        assert!(renderer.commands.is_empty());
    }

    #[test]
    fn test_attach_rejects_cycles() {
        let mut graph = Graph::new();
        let root = graph.insert(SceneNode::new("root"));
        let child = graph.add_child(root, SceneNode::new("child")).unwrap();
        assert_eq!(graph.attach(child, root), Err(SceneError::Cycle { parent: child, child: root }));

        let other = graph.insert(SceneNode::new("other"));
        graph.attach(other, child).unwrap();
        assert!(graph.children(root).is_empty());
        assert_eq!(graph.get(child).unwrap().parent(), Some(other));
    }

    #[test]
    fn test_clone_subtree_is_deep() {
        let mut graph = Graph::new();
        let root = graph.insert(SceneNode::new("root"));
        let a = graph.add_child(root, solid_at("a", Vec3::new(1.0, 0.0, 0.0))).unwrap();
        graph.add_child(a, SceneNode::new("x").with_behavior(7)).unwrap();
        graph.add_child(a, SceneNode::new("y").with_behavior(8)).unwrap();

        let copy = graph.clone_subtree(a).unwrap();
        assert_ne!(copy, a);
        let copied = graph.get(copy).unwrap();
        assert_eq!(copied.parent(), None);
        assert!(copied.is_solid());
        assert_eq!(copied.bounding_box(), graph.get(a).unwrap().bounding_box());

        let tags: Vec<_> = graph.children(copy).iter().map(|&c| graph.get(c).unwrap().behavior.unwrap()).collect();
        assert_eq!(tags, vec![7, 8]);
        assert_eq!(graph.len(), 7);

        graph.remove(copy);
        assert_eq!(graph.children(a).len(), 2);
    }
}
