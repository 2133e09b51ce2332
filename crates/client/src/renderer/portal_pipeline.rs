//! Portal disk pipeline.
//!
//! The disk animates a classic Perlin noise field between two gradient
//! colors; the only per-frame input is the elapsed time. Drawn double-sided
//! so the disk reads from behind the portal as well.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{util::DeviceExt, BindGroup, Buffer, Device, Queue, RenderPipeline, TextureFormat};

use super::mesh::SceneVertex;
use super::DEPTH_FORMAT;

const PORTAL_SHADER: &str = include_str!("shaders/portal.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PortalUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub color_start: [f32; 4],
    pub color_end: [f32; 4],
    pub time: f32,
    pub _pad: [f32; 3],
}

pub struct PortalPipeline {
    pub pipeline: RenderPipeline,
    uniform_buffer: Buffer,
    pub bind_group: BindGroup,
}

impl PortalPipeline {
    pub fn new(device: &Device, format: TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("portal_shader"),
            source: wgpu::ShaderSource::Wgsl(PORTAL_SHADER.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("portal_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("portal_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("portal_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[SceneVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Double-sided disk.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("portal_uniform_buffer"),
            contents: bytemuck::cast_slice(&[PortalUniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                color_start: [0.0; 4],
                color_end: [0.0; 4],
                time: 0.0,
                _pad: [0.0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("portal_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn update(
        &self,
        queue: &Queue,
        view_proj: Mat4,
        color_start: [f32; 3],
        color_end: [f32; 3],
        time: f32,
    ) {
        let uniforms = PortalUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            color_start: [color_start[0], color_start[1], color_start[2], 1.0],
            color_end: [color_end[0], color_end[1], color_end[2], 1.0],
            time,
            _pad: [0.0; 3],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }
}
