pub mod animation;
pub mod camera;
pub mod clock;
pub mod config;
pub mod dodge;
pub mod experience;
pub mod interaction;
pub mod landing;
pub mod math;
pub mod mesh;
pub mod motion;
pub mod prop_image;
pub mod reveal;
pub mod rendering;
pub mod scene_graph;
pub mod scheduler;
