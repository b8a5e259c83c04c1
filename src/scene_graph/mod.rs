pub mod builder;
pub mod node;
pub mod primitive;
pub mod scene;
pub mod transform;

pub use builder::CharacterScene;
pub use node::{NodeId, NodeKind, SceneNode};
pub use primitive::{Material, Primitive, Shape};
pub use scene::{Hit, Scene};
pub use transform::{Pose, PoseOffset, Transform};
