//! SDF-based WebGPU render pipeline
//!
//! Shapes are raymarched in a fullscreen fragment shader against the same
//! distance functions the simulation hit-tests with. Particles go on top as
//! instanced billboards.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, Particle, Shape, ShapeGeometry};

/// Maximum number of shapes uploaded per frame
pub const MAX_SHAPES: usize = 64;
/// Maximum number of particles uploaded per frame
pub const MAX_GPU_PARTICLES: usize = crate::sim::MAX_PARTICLES;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct Globals {
    view_proj: [[f32; 4]; 4], // offset 0
    resolution: [f32; 2],     // offset 64
    time: f32,                // offset 72
    fov_y: f32,               // offset 76
    camera_pos: [f32; 3],     // offset 80 (vec3 packs with the u32 after it)
    shape_count: u32,         // offset 92
    particle_count: u32,      // offset 96
    march_steps: u32,         // offset 100
    dim: f32,                 // offset 104 - scene brightness, lowered while paused
    z_far: f32,               // offset 108
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ShapeData {
    position: [f32; 3],
    bounding_radius: f32,
    /// Node rotation quaternion (x, y, z, w)
    rotation: [f32; 4],
    color: [f32; 4],
    /// Geometry dimensions, meaning depends on `kind`
    dims: [f32; 4],
    kind: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ParticleData {
    pos: [f32; 3],
    size: f32,
    color: [f32; 4],
    life: f32,
    _pad: [u32; 3],
}

/// Pack a geometry's dimensions in the order the shader expects
pub(crate) fn shape_dims(geometry: &ShapeGeometry) -> [f32; 4] {
    match *geometry {
        ShapeGeometry::Box {
            width,
            height,
            length,
            chamfer_radius,
        } => [width, height, length, chamfer_radius],
        ShapeGeometry::Sphere { radius } => [radius, 0.0, 0.0, 0.0],
        ShapeGeometry::Pyramid {
            width,
            height,
            length,
        } => [width, height, length, 0.0],
        ShapeGeometry::Torus {
            ring_radius,
            pipe_radius,
        } => [ring_radius, pipe_radius, 0.0, 0.0],
        ShapeGeometry::Capsule { cap_radius, height } => [cap_radius, height, 0.0, 0.0],
        ShapeGeometry::Cylinder { radius, height } => [radius, height, 0.0, 0.0],
        ShapeGeometry::Cone {
            top_radius,
            bottom_radius,
            height,
        } => [top_radius, bottom_radius, height, 0.0],
        ShapeGeometry::Tube {
            inner_radius,
            outer_radius,
            height,
        } => [inner_radius, outer_radius, height, 0.0],
    }
}

impl ShapeData {
    pub(crate) fn from_shape(shape: &Shape) -> Self {
        Self {
            position: shape.body.position.to_array(),
            bounding_radius: shape.geometry.bounding_radius(),
            rotation: shape.body.rotation.to_array(),
            color: shape.color.rgba(),
            dims: shape_dims(&shape.geometry),
            kind: shape.kind.index(),
            _pad: [0; 3],
        }
    }
}

impl ParticleData {
    pub(crate) fn from_particle(particle: &Particle) -> Self {
        Self {
            pos: particle.pos.to_array(),
            size: particle.size,
            color: particle.color,
            life: particle.life.clamp(0.0, 1.0),
            _pad: [0; 3],
        }
    }
}

impl Globals {
    pub(crate) fn from_state(
        state: &GameState,
        settings: &Settings,
        resolution: Vec2,
        elapsed: f32,
        shape_count: u32,
        particle_count: u32,
    ) -> Self {
        let camera = &state.camera;
        let aspect = resolution.x / resolution.y.max(1.0);
        let view_proj = camera.projection(aspect) * camera.view();
        let dim = match state.phase {
            GamePhase::Playing => 1.0,
            GamePhase::Paused => 0.45,
            GamePhase::GameOver => 0.35,
        };
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            resolution: resolution.to_array(),
            time: elapsed,
            fov_y: camera.fov_y,
            camera_pos: camera.position.to_array(),
            shape_count,
            particle_count,
            march_steps: settings.quality.march_steps(),
            dim,
            z_far: camera.z_far,
        }
    }
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    shapes_buffer: wgpu::Buffer,
    particles_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,

    // Reused upload scratch
    shapes_data: Vec<ShapeData>,
    particles_data: Vec<ParticleData>,
}

fn buffer_layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// A vertex-buffer-free pass over one shader module. Geometry comes from
/// the vertex and instance indices.
struct ShaderPass {
    label: &'static str,
    vs_entry: &'static str,
    fs_entry: &'static str,
    blend: Option<wgpu::BlendState>,
}

impl ShaderPass {
    fn build(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(self.vs_entry),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(self.fs_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: self.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        // Storage buffers are required, so start from the downlevel limits
        // rather than the WebGL2 ones
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        log::info!("Surface alpha modes: {:?}", surface_caps.alpha_modes);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shapes_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shapes"),
            size: (std::mem::size_of::<ShapeData>() * MAX_SHAPES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let particles_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particles"),
            size: (std::mem::size_of::<ParticleData>() * MAX_GPU_PARTICLES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage = wgpu::BufferBindingType::Storage { read_only: true };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                buffer_layout_entry(0, wgpu::BufferBindingType::Uniform),
                buffer_layout_entry(1, storage),
                buffer_layout_entry(2, storage),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: shapes_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: particles_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let scene = ShaderPass {
            label: "sdf_pipeline",
            vs_entry: "vs_main",
            fs_entry: "fs_main",
            blend: None,
        };
        let pipeline = scene.build(&device, &pipeline_layout, &shader, config.format);

        let sparks = ShaderPass {
            label: "particle_pipeline",
            vs_entry: "vs_particle",
            fs_entry: "fs_particle",
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        };
        let particle_pipeline = sparks.build(&device, &pipeline_layout, &shader, config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            particle_pipeline,
            globals_buffer,
            shapes_buffer,
            particles_buffer,
            bind_group,
            size: (width, height),
            start_time: 0.0,
            shapes_data: Vec::with_capacity(MAX_SHAPES),
            particles_data: Vec::with_capacity(MAX_GPU_PARTICLES),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Update GPU buffers from game state and render
    pub fn render(
        &mut self,
        state: &GameState,
        settings: &Settings,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // time is ms since page load from requestAnimationFrame
        let elapsed = ((time - self.start_time) / 1000.0) as f32;

        if state.shapes.len() > MAX_SHAPES {
            log::debug!("Drawing {} of {} shapes", MAX_SHAPES, state.shapes.len());
        }
        self.shapes_data.clear();
        self.shapes_data.extend(
            state
                .shapes
                .iter()
                .take(MAX_SHAPES)
                .map(ShapeData::from_shape),
        );

        let max_particles = settings.max_particles().min(MAX_GPU_PARTICLES);
        self.particles_data.clear();
        self.particles_data.extend(
            state
                .particles
                .iter()
                .take(max_particles)
                .map(ParticleData::from_particle),
        );

        let resolution = Vec2::new(self.size.0 as f32, self.size.1 as f32);
        let globals = Globals::from_state(
            state,
            settings,
            resolution,
            elapsed,
            self.shapes_data.len() as u32,
            self.particles_data.len() as u32,
        );
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        if !self.shapes_data.is_empty() {
            self.queue.write_buffer(
                &self.shapes_buffer,
                0,
                bytemuck::cast_slice(&self.shapes_data),
            );
        }
        if !self.particles_data.is_empty() {
            self.queue.write_buffer(
                &self.particles_buffer,
                0,
                bytemuck::cast_slice(&self.particles_data),
            );
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_pipeline(&self.pipeline);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle

            if !self.particles_data.is_empty() {
                render_pass.set_pipeline(&self.particle_pipeline);
                render_pass.draw(0..6, 0..self.particles_data.len() as u32);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ShapeColor, ShapeKind};
    use glam::Vec3;

    #[test]
    fn test_gpu_struct_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<Globals>(), 112);
        assert_eq!(std::mem::size_of::<ShapeData>(), 80);
        assert_eq!(std::mem::size_of::<ParticleData>(), 48);
    }

    #[test]
    fn test_shape_data_carries_kind_and_color() {
        let shape = Shape::new(7, ShapeKind::Torus, ShapeColor::Orange, Vec3::new(1.0, 2.0, 3.0));
        let data = ShapeData::from_shape(&shape);
        assert_eq!(data.kind, ShapeKind::Torus.index());
        assert_eq!(data.color, ShapeColor::Orange.rgba());
        assert_eq!(data.position, [1.0, 2.0, 3.0]);
        assert_eq!(data.dims, [0.5, 0.25, 0.0, 0.0]);
        assert!(data.bounding_radius >= 0.75);
    }

    #[test]
    fn test_box_dims_keep_chamfer() {
        let dims = shape_dims(&ShapeKind::Box.geometry());
        assert_eq!(dims, [1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_paused_scene_is_dimmed() {
        let mut state = GameState::new(1);
        let settings = Settings::default();
        let res = Vec2::new(800.0, 600.0);
        let playing = Globals::from_state(&state, &settings, res, 0.0, 0, 0);
        state.phase = GamePhase::Paused;
        let paused = Globals::from_state(&state, &settings, res, 0.0, 0, 0);
        assert_eq!(playing.dim, 1.0);
        assert!(paused.dim < playing.dim);
        assert_eq!(playing.march_steps, settings.quality.march_steps());
    }
}
