//! wgpu renderer for the portal diorama.
//!
//! Four pipelines drawn in one pass: scene meshes (baked lightmap or flat
//! color), the portal disk, firefly billboards, and the fade overlay.
//! The baked texture and the model arrive independently from background
//! loaders; the GPU scene is assembled once both are in.

mod camera;
mod firefly_pipeline;
mod mesh;
mod overlay_pipeline;
mod portal_pipeline;
mod scene;
mod scene_pipeline;
mod texture;

pub use camera::OrbitCamera;
pub use scene::SceneError;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use wgpu::{
    Backends, Device, DeviceDescriptor, Instance, InstanceDescriptor, PowerPreference, Queue,
    RequestAdapterOptions, Surface, SurfaceConfiguration, TextureUsages,
};
use winit::{dpi::PhysicalSize, window::Window};

use nashira_core::fireflies::FireflyField;
use nashira_core::SceneConfig;

use crate::assets::ModelData;
use firefly_pipeline::FireflyPipeline;
use mesh::{FireflyInstance, SceneVertex};
use overlay_pipeline::OverlayPipeline;
use portal_pipeline::PortalPipeline;
use scene::{MeshRole, SceneMeshes};
use scene_pipeline::{MaterialUniforms, ScenePipeline};
use texture::TextureBundle;

/// Depth buffer format shared by every pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Ceiling for the firefly pixel-ratio uniform.
const MAX_PIXEL_RATIO: f32 = 2.0;

fn clamp_pixel_ratio(scale_factor: f64) -> f32 {
    (scale_factor as f32).min(MAX_PIXEL_RATIO)
}

/// Per-frame inputs sampled by the app.
pub struct FrameParams {
    /// Seconds since startup, fed to the animated shaders.
    pub elapsed: f32,
    /// Seconds since the previous frame, for camera damping.
    pub dt: f32,
    /// Fade overlay alpha in [0, 1].
    pub overlay_alpha: f32,
}

/// One mesh uploaded to the GPU.
struct GpuMesh {
    role: MeshRole,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Material bind group for the scene pipeline; the portal disk has none.
    material: Option<wgpu::BindGroup>,
}

/// The main renderer.
pub struct Renderer {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth_view: wgpu::TextureView,
    camera: OrbitCamera,
    clear_color: wgpu::Color,
    pixel_ratio: f32,

    scene_pipeline: ScenePipeline,
    portal_pipeline: PortalPipeline,
    firefly_pipeline: FireflyPipeline,
    overlay_pipeline: OverlayPipeline,

    firefly_instances: wgpu::Buffer,
    firefly_count: u32,
    firefly_size: f32,

    portal_color_start: [f32; 3],
    portal_color_end: [f32; 3],
    pole_light_color: [f32; 3],
    bottom_color: [f32; 3],

    // Loaded independently; the GPU scene assembles once both are in.
    baked: Option<TextureBundle>,
    pending_meshes: Option<SceneMeshes>,
    meshes: Vec<GpuMesh>,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        scene_config: &SceneConfig,
        field: &FireflyField,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = Instance::new(&InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No suitable GPU adapter found"))?;

        tracing::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("nashira_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let aspect = config.width as f32 / config.height as f32;
        let camera = OrbitCamera::new(&scene_config.camera, aspect);

        let scene_pipeline = ScenePipeline::new(&device, surface_format);
        let portal_pipeline = PortalPipeline::new(&device, surface_format);
        let firefly_pipeline = FireflyPipeline::new(&device, surface_format);
        let overlay_pipeline = OverlayPipeline::new(&device, surface_format);

        let instances: Vec<FireflyInstance> = field
            .positions()
            .chunks(3)
            .zip(field.scales())
            .map(|(xyz, &scale)| FireflyInstance {
                position: [xyz[0], xyz[1], xyz[2]],
                scale,
            })
            .collect();

        let firefly_instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("firefly_instance_buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let clear = scene_config.clear_color.to_linear();

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth_view,
            camera,
            clear_color: wgpu::Color {
                r: clear[0] as f64,
                g: clear[1] as f64,
                b: clear[2] as f64,
                a: 1.0,
            },
            pixel_ratio: 1.0,
            scene_pipeline,
            portal_pipeline,
            firefly_pipeline,
            overlay_pipeline,
            firefly_instances,
            firefly_count: field.count() as u32,
            firefly_size: scene_config.fireflies.size,
            portal_color_start: scene_config.portal.color_start.to_linear(),
            portal_color_end: scene_config.portal.color_end.to_linear(),
            pole_light_color: scene_config.pole_light_color.to_linear(),
            bottom_color: scene_config.bottom_color.to_linear(),
            baked: None,
            pending_meshes: None,
            meshes: Vec::new(),
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
            self.camera
                .set_aspect(new_size.width as f32 / new_size.height as f32);
            tracing::debug!("Resized to {}x{}", new_size.width, new_size.height);
        }
    }

    /// Clamp and store the display pixel ratio for the firefly size uniform.
    pub fn set_pixel_ratio(&mut self, scale_factor: f64) {
        self.pixel_ratio = clamp_pixel_ratio(scale_factor);
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Install the decoded lightmap; assembles the scene if the model is in.
    pub fn install_baked_texture(&mut self, image: &image::RgbaImage) {
        self.baked = Some(texture::upload_baked(&self.device, &self.queue, image));
        self.try_assemble();
    }

    /// Install the imported model; assembles the scene if the texture is in.
    pub fn install_model(&mut self, model: &ModelData) -> Result<(), SceneError> {
        self.pending_meshes = Some(scene::extract(model)?);
        self.try_assemble();
        Ok(())
    }

    fn try_assemble(&mut self) {
        let (Some(baked), Some(pending)) = (&self.baked, &self.pending_meshes) else {
            return;
        };

        self.meshes = pending
            .meshes
            .iter()
            .map(|mesh| {
                let vertices: Vec<SceneVertex> = mesh
                    .positions
                    .iter()
                    .enumerate()
                    .map(|(i, &position)| SceneVertex {
                        position,
                        uv: mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                    })
                    .collect();

                let vertex_buffer =
                    self.device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("scene_vertex_buffer"),
                            contents: bytemuck::cast_slice(&vertices),
                            usage: wgpu::BufferUsages::VERTEX,
                        });
                let index_buffer =
                    self.device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("scene_index_buffer"),
                            contents: bytemuck::cast_slice(&mesh.indices),
                            usage: wgpu::BufferUsages::INDEX,
                        });

                let material = match mesh.role {
                    MeshRole::Baked => Some(MaterialUniforms::baked()),
                    MeshRole::PoleLight => Some(MaterialUniforms::flat(self.pole_light_color)),
                    MeshRole::Bottom => Some(MaterialUniforms::flat(self.bottom_color)),
                    MeshRole::Portal => None,
                };
                let material = material.map(|m| {
                    self.scene_pipeline
                        .create_material_bind_group(&self.device, m, baked)
                });

                GpuMesh {
                    role: mesh.role,
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                    material,
                }
            })
            .collect();

        self.pending_meshes = None;
        tracing::info!("GPU scene assembled: {} meshes", self.meshes.len());
    }

    pub fn render(&mut self, params: &FrameParams) -> Result<(), wgpu::SurfaceError> {
        self.camera.update(params.dt);

        let view_proj = self.camera.view_projection_matrix();
        self.scene_pipeline.update_globals(&self.queue, view_proj);
        self.portal_pipeline.update(
            &self.queue,
            view_proj,
            self.portal_color_start,
            self.portal_color_end,
            params.elapsed,
        );
        self.firefly_pipeline.update(
            &self.queue,
            self.camera.view_matrix(),
            self.camera.projection_matrix(),
            params.elapsed,
            self.pixel_ratio,
            self.firefly_size,
            [self.config.width as f32, self.config.height as f32],
        );
        self.overlay_pipeline.update(&self.queue, params.overlay_alpha);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Opaque diorama meshes.
            render_pass.set_pipeline(&self.scene_pipeline.pipeline);
            render_pass.set_bind_group(0, &self.scene_pipeline.global_bind_group, &[]);
            for mesh in &self.meshes {
                let Some(material) = &mesh.material else {
                    continue;
                };
                render_pass.set_bind_group(1, material, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }

            // Portal disk.
            render_pass.set_pipeline(&self.portal_pipeline.pipeline);
            render_pass.set_bind_group(0, &self.portal_pipeline.bind_group, &[]);
            for mesh in &self.meshes {
                if mesh.role != MeshRole::Portal {
                    continue;
                }
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }

            // Fireflies, additive over the scene.
            if self.firefly_count > 0 {
                render_pass.set_pipeline(&self.firefly_pipeline.pipeline);
                render_pass.set_bind_group(0, &self.firefly_pipeline.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.firefly_instances.slice(..));
                render_pass.draw(0..6, 0..self.firefly_count);
            }

            // Fade overlay, last.
            if params.overlay_alpha > 0.0 {
                render_pass.set_pipeline(&self.overlay_pipeline.pipeline);
                render_pass.set_bind_group(0, &self.overlay_pipeline.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_depth_view(device: &Device, config: &SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_clamps_at_two() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(1.5), 1.5);
        assert_eq!(clamp_pixel_ratio(2.0), 2.0);
        assert_eq!(clamp_pixel_ratio(3.0), 2.0);
    }
}
