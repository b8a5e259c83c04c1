use std::collections::HashSet;
use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use crate::mesh::{MeshData, Vertex};
use crate::scene_graph::{NodeId, Primitive, Scene};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Instance {
    pub model: Mat4,
    /// rgb colour, a: emissive
    pub color: Vec4,
    /// x: 1 when the prop texture is sampled
    pub params: Vec4,
}

impl Instance {
    pub fn from_primitive(model: Mat4, primitive: &Primitive) -> Self {
        let material = &primitive.material;
        Self {
            model,
            color: material.color.extend(material.emissive),
            params: Vec4::new(if material.textured { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0),
        }
    }

    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x4,
            10 => Float32x4
        ];

        wgpu::VertexBufferLayout {
            array_stride: size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

pub const RENDER_MESH_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, tex_coords) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
    ],
};

/// GPU copy of one primitive node's mesh with its single instance slot.
pub struct RenderMesh {
    pub node: NodeId,
    pub name: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    num_indices: u32,
    visible: bool,
}

impl RenderMesh {
    pub fn from_node(device: &wgpu::Device, scene: &Scene, node_id: NodeId) -> Option<Self> {
        let node = scene.get_node(node_id)?;
        let primitive = node.as_primitive()?;
        let mesh = MeshData::from_shape(&primitive.shape);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Vertex buffer ({})", node.name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Index buffer ({})", node.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("Instance buffer ({})", node.name)),
            size: size_of::<Instance>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Some(Self {
            node: node_id,
            name: node.name.clone(),
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_indices: mesh.indices.len() as u32,
            visible: false,
        })
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if !self.visible {
            return;
        }

        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}

/// One mesh per primitive node under `root`.
pub fn create_render_meshes(device: &wgpu::Device, scene: &Scene, root: NodeId) -> Vec<RenderMesh> {
    let meshes: Vec<_> = scene
        .walk(root)
        .into_iter()
        .filter_map(|id| RenderMesh::from_node(device, scene, id))
        .collect();

    log::info!("Created {} meshes", meshes.len());
    meshes
}

/// Writes this frame's world matrices and hides meshes under invisible nodes.
pub fn gather_instances(
    queue: &wgpu::Queue,
    scene: &Scene,
    root: NodeId,
    meshes: &mut [RenderMesh],
) {
    let visible: HashSet<NodeId> = scene.walk_visible(root).into_iter().collect();

    for mesh in meshes {
        mesh.visible = visible.contains(&mesh.node);
        if !mesh.visible {
            continue;
        }

        let Some(node) = scene.get_node(mesh.node) else {
            mesh.visible = false;
            continue;
        };
        let Some(primitive) = node.as_primitive() else {
            continue;
        };

        let instance = Instance::from_primitive(*node.transform.get_world_matrix(), primitive);
        queue.write_buffer(&mesh.instance_buffer, 0, bytemuck::cast_slice(&[instance]));
    }
}
