use id_arena::Id;

use crate::scene_graph::primitive::Primitive;
use crate::scene_graph::transform::{Pose, PoseOffset, Transform};

pub type NodeId = Id<SceneNode>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Group,
    Primitive(Primitive),
}

pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub rest: Pose,
    pub offset: PoseOffset,
    pub transform: Transform,
    pub visible: bool,
    pub parent_id: Option<NodeId>,
    pub child_ids: Vec<NodeId>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>, rest: Pose) -> Self {
        Self::new(name, NodeKind::Group, rest)
    }

    pub fn primitive(name: impl Into<String>, primitive: Primitive, rest: Pose) -> Self {
        Self::new(name, NodeKind::Primitive(primitive), rest)
    }

    fn new(name: impl Into<String>, kind: NodeKind, rest: Pose) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::from_pose(&rest),
            rest,
            offset: PoseOffset::default(),
            visible: true,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match &self.kind {
            NodeKind::Primitive(primitive) => Some(primitive),
            NodeKind::Group => None,
        }
    }
}
