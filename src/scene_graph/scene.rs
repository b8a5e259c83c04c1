use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::math::ray::Ray;
use crate::scene_graph::node::{NodeId, SceneNode};
use crate::scene_graph::transform::{PoseOffset, Transform};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

pub struct Scene {
    pub nodes: Arena<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
        }
    }

    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.nodes.alloc(node)
    }

    pub fn add_child(&mut self, parent_id: NodeId, node: SceneNode) -> NodeId {
        let node_id = self.add_node(node);
        self.set_node_parent(node_id, Some(parent_id));
        node_id
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent_id.is_none())
            .map(|(id, _)| id)
    }

    /// Depth-first, parents before children.
    pub fn walk(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };

            visited.push(id);
            stack.extend(node.child_ids.iter().rev().copied());
        }

        visited
    }

    /// Same as [`Scene::walk`] but hidden nodes prune their whole subtree.
    pub fn walk_visible(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };

            if !node.visible {
                continue;
            }

            visited.push(id);
            stack.extend(node.child_ids.iter().rev().copied());
        }

        visited
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes.get(node).and_then(|node| node.parent_id);

        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent_id);
        }

        false
    }

    /// Updates all node transforms in hierarchical order
    fn update_transforms(&self) {
        for root_id in self.roots() {
            self.update_node_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_node_transform_recursive(&self, node_id: NodeId, parent_world_matrix: Mat4) {
        if let Some(node) = self.nodes.get(node_id) {
            if node.transform.is_world_dirty() {
                let local_matrix = *node.transform.get_local_matrix();
                node.transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *node.transform.get_world_matrix();
            for &child_id in &node.child_ids {
                self.update_node_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for a node and all its descendants
    pub fn invalidate_node_hierarchy(&self, node_id: NodeId) {
        if let Some(node) = self.nodes.get(node_id) {
            node.transform.invalidate_world();

            for &child_id in &node.child_ids {
                self.invalidate_node_hierarchy(child_id);
            }
        }
    }

    /// Re-parents a node. Refuses moves that would create a cycle.
    pub fn set_node_parent(&mut self, child_id: NodeId, new_parent_id: Option<NodeId>) -> bool {
        if let Some(new_parent_id) = new_parent_id {
            if new_parent_id == child_id || self.is_ancestor(child_id, new_parent_id) {
                log::warn!("Refusing to parent a scene node under its own descendant");
                return false;
            }
        }

        if let Some(child) = self.nodes.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.nodes.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.nodes.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.nodes.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_node_hierarchy(child_id);
        true
    }

    /// Accumulates into this frame's offset. Cleared by [`Scene::early_update`].
    pub fn offset_node(&mut self, node_id: NodeId, offset: PoseOffset) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.offset.translation += offset.translation;
            node.offset.rotation += offset.rotation;
        }
    }

    pub fn set_visible(&mut self, node_id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.visible = visible;
        }
    }

    pub fn get_node_transform(&self, node_id: NodeId) -> Option<&Transform> {
        self.nodes.get(node_id).map(|node| &node.transform)
    }

    pub fn world_matrix(&self, node_id: NodeId) -> Option<Mat4> {
        self.nodes
            .get(node_id)
            .map(|node| *node.transform.get_world_matrix())
    }

    pub fn early_update(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            node.transform.reset_flags();
            node.offset = PoseOffset::default();
        }
    }

    /// Applies rest pose + offset to every node and propagates world matrices.
    pub fn late_update(&mut self) {
        let mut changed = Vec::new();

        for (id, node) in self.nodes.iter_mut() {
            let pose = node.rest.offset_by(&node.offset);
            node.transform.set_pose(&pose);
            if node.transform.has_changed() {
                changed.push(id);
            }
        }

        for id in changed {
            self.invalidate_node_hierarchy(id);
        }

        self.update_transforms();
    }

    /// Nearest visible primitive under `root` hit by a world-space ray.
    pub fn raycast(&self, root: NodeId, ray: &Ray) -> Option<Hit> {
        self.walk_visible(root)
            .into_iter()
            .filter_map(|id| {
                let node = self.nodes.get(id)?;
                let primitive = node.as_primitive()?;

                let local_ray = ray.transform(&node.transform.get_inverse_world_matrix());
                let t = primitive.shape.intersect_ray(&local_ray)?;
                let point = node
                    .transform
                    .get_world_matrix()
                    .transform_point3(local_ray.at(t));

                Some(Hit {
                    node: id,
                    distance: (point - ray.origin).length(),
                    point,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
