//! Firefly billboard pipeline.
//!
//! wgpu has no point-size rasterization, so each firefly is an instanced
//! quad expanded in clip space. Size attenuates with view depth and scales
//! with the (clamped) pixel ratio; blending is additive with depth writes
//! off so overlapping glows accumulate.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{util::DeviceExt, BindGroup, Buffer, Device, Queue, RenderPipeline, TextureFormat};

use super::mesh::FireflyInstance;
use super::DEPTH_FORMAT;

const FIREFLY_SHADER: &str = include_str!("shaders/fireflies.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FireflyUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// x: elapsed seconds, y: pixel ratio, z: base point size.
    pub params: [f32; 4],
    /// x, y: viewport size in pixels.
    pub resolution: [f32; 4],
}

pub struct FireflyPipeline {
    pub pipeline: RenderPipeline,
    uniform_buffer: Buffer,
    pub bind_group: BindGroup,
}

impl FireflyPipeline {
    pub fn new(device: &Device, format: TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("firefly_shader"),
            source: wgpu::ShaderSource::Wgsl(FIREFLY_SHADER.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("firefly_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("firefly_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("firefly_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[FireflyInstance::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    // Additive: overlapping glows sum.
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                // Occluded by the diorama, but never occluding.
                depth_write_enabled: false,
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
            label: Some("firefly_uniform_buffer"),
            contents: bytemuck::cast_slice(&[FireflyUniforms {
                view: Mat4::IDENTITY.to_cols_array_2d(),
                proj: Mat4::IDENTITY.to_cols_array_2d(),
                params: [0.0; 4],
                resolution: [1.0, 1.0, 0.0, 0.0],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("firefly_bind_group"),
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

    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &self,
        queue: &Queue,
        view: Mat4,
        proj: Mat4,
        time: f32,
        pixel_ratio: f32,
        size: f32,
        resolution: [f32; 2],
    ) {
        let uniforms = FireflyUniforms {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            params: [time, pixel_ratio, size, 0.0],
            resolution: [resolution[0], resolution[1], 0.0, 0.0],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }
}
