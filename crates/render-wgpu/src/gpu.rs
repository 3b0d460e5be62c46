use crate::mesh::{MeshData, Vertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use colorcube_common::Color;
use colorcube_render::{DrawCall, RenderError, Shape};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    color: [f32; 4],
    mix_factor: [f32; 4],
}

impl From<&DrawCall> for Uniforms {
    fn from(call: &DrawCall) -> Self {
        Self {
            model: call.model.to_cols_array_2d(),
            view: call.view.to_cols_array_2d(),
            projection: call.projection.to_cols_array_2d(),
            color: call.color,
            mix_factor: [if call.vertex_colors { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

fn to_wgpu_color(color: Color) -> wgpu::Color {
    let [r, g, b, a] = color.rgba();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

/// Outcome of a failed surface texture acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireFailure {
    /// The surface no longer matches its window; configure it and retry once.
    Reconfigure,
    /// Nothing to draw into this frame. Try again next frame.
    Skip,
    Fatal,
}

fn classify_surface_error(err: &wgpu::SurfaceError) -> AcquireFailure {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => AcquireFailure::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => AcquireFailure::Fatal,
        _ => AcquireFailure::Skip,
    }
}

/// A window surface handed to the renderer, with its initial size.
pub struct SurfaceSource {
    pub surface: wgpu::Surface<'static>,
    pub width: u32,
    pub height: u32,
}

struct WindowTarget {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
}

struct ActiveFrame {
    slot: usize,
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Multi-window wgpu renderer.
///
/// [`begin_frame`](Self::begin_frame) acquires the window's next surface
/// texture (the wgpu counterpart of making a context current),
/// [`draw`](Self::draw) clears it and draws the mesh, and
/// [`present`](Self::present) hands it back to the compositor.
pub struct WgpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    targets: Vec<WindowTarget>,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    mesh: Option<GpuMesh>,
    clear_color: wgpu::Color,
    active: Option<ActiveFrame>,
    /// Window whose frame was skipped by the last `begin_frame`.
    skipped: Option<usize>,
}

impl WgpuRenderer {
    /// Pick an adapter for the given surfaces, create the device, configure
    /// every surface, and build the pipeline and mesh for `shape`.
    pub fn new(
        instance: &wgpu::Instance,
        sources: Vec<SurfaceSource>,
        shape: Shape,
    ) -> Result<Self, RenderError> {
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: sources.first().map(|s| &s.surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("colorcube_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let mut targets = Vec::with_capacity(sources.len());
        let mut surface_format = None;
        for (slot, source) in sources.into_iter().enumerate() {
            let caps = source.surface.get_capabilities(&adapter);
            // Clear colors are given in display space, so skip sRGB encoding.
            let format = match surface_format {
                Some(f) => f,
                None => {
                    let f = caps
                        .formats
                        .iter()
                        .find(|f| !f.is_srgb())
                        .or_else(|| caps.formats.first())
                        .copied()
                        .ok_or_else(|| RenderError::Surface {
                            slot,
                            reason: "surface is not supported by the adapter".into(),
                        })?;
                    surface_format = Some(f);
                    f
                }
            };
            if !caps.formats.contains(&format) {
                return Err(RenderError::Surface {
                    slot,
                    reason: format!("surface does not support {format:?}"),
                });
            }

            let config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: source.width.max(1),
                height: source.height.max(1),
                present_mode: wgpu::PresentMode::AutoVsync,
                alpha_mode: caps.alpha_modes[0],
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            };
            source.surface.configure(&device, &config);
            let depth_view = create_depth_texture(&device, config.width, config.height);
            targets.push(WindowTarget {
                surface: source.surface,
                config,
                depth_view,
            });
        }
        let surface_format = surface_format.ok_or_else(|| RenderError::Surface {
            slot: 0,
            reason: "no surfaces given".into(),
        })?;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::from(&DrawCall::default())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("primitive_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PRIMITIVE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("primitive_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::Shader {
                label: "primitive_shader".into(),
                reason: err.to_string(),
            });
        }

        let mesh_data = MeshData::for_shape(shape);
        let mesh = GpuMesh {
            vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertex_buffer"),
                contents: bytemuck::cast_slice(&mesh_data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_index_buffer"),
                contents: bytemuck::cast_slice(&mesh_data.indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: mesh_data.index_count(),
        };

        let adapter_info = adapter.get_info();
        tracing::info!(
            adapter = %adapter_info.name,
            backend = adapter_info.backend.to_str(),
            windows = targets.len(),
            ?shape,
            "GPU initialized"
        );

        Ok(Self {
            device,
            queue,
            adapter_info,
            targets,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            mesh: Some(mesh),
            clear_color: wgpu::Color::BLACK,
            active: None,
            skipped: None,
        })
    }

    pub fn window_count(&self) -> usize {
        self.targets.len()
    }

    pub fn description(&self) -> String {
        format!(
            "{} via {} ({} {})",
            self.adapter_info.name,
            self.adapter_info.backend.to_str(),
            self.adapter_info.driver,
            self.adapter_info.driver_info
        )
    }

    pub fn aspect_ratio(&self, slot: usize) -> f32 {
        self.targets
            .get(slot)
            .map(|t| t.config.width as f32 / t.config.height.max(1) as f32)
            .unwrap_or(1.0)
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = to_wgpu_color(color);
    }

    pub fn resize(&mut self, slot: usize, width: u32, height: u32) {
        let Some(target) = self.targets.get_mut(slot) else {
            return;
        };
        target.config.width = width.max(1);
        target.config.height = height.max(1);
        target.surface.configure(&self.device, &target.config);
        target.depth_view =
            create_depth_texture(&self.device, target.config.width, target.config.height);
    }

    /// Acquire the next texture of the window's surface. A frame still held
    /// for another window is dropped without presenting.
    ///
    /// When the surface cannot hand out a texture right now (occluded,
    /// minimized, timed out) the frame is skipped: this returns `Ok` and the
    /// following [`draw`](Self::draw) and [`present`](Self::present) do
    /// nothing. Only out-of-memory is fatal.
    pub fn begin_frame(&mut self, slot: usize) -> Result<(), RenderError> {
        let count = self.targets.len();
        if slot >= count {
            return Err(RenderError::NoSuchWindow { slot, count });
        }
        if let Some(stale) = self.active.take() {
            tracing::warn!(slot = stale.slot, "dropping frame that was never presented");
        }
        self.skipped = None;

        let Some(texture) = self.acquire(slot)? else {
            self.skipped = Some(slot);
            return Ok(());
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.active = Some(ActiveFrame {
            slot,
            texture,
            view,
        });
        Ok(())
    }

    fn acquire(&self, slot: usize) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        let target = &self.targets[slot];
        let mut reconfigured = false;
        loop {
            let err = match target.surface.get_current_texture() {
                Ok(texture) => return Ok(Some(texture)),
                Err(err) => err,
            };
            match classify_surface_error(&err) {
                AcquireFailure::Reconfigure if !reconfigured => {
                    tracing::debug!(slot, "reconfiguring surface after {err}");
                    target.surface.configure(&self.device, &target.config);
                    reconfigured = true;
                }
                AcquireFailure::Fatal => {
                    return Err(RenderError::Activation {
                        slot,
                        reason: err.to_string(),
                    });
                }
                AcquireFailure::Reconfigure | AcquireFailure::Skip => {
                    tracing::debug!(slot, "skipping frame: {err}");
                    return Ok(None);
                }
            }
        }
    }

    /// Clear the acquired frame and draw the mesh with the call's uniforms.
    pub fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        let Some(frame) = self.active.as_ref() else {
            return match self.skipped {
                Some(_) => Ok(()),
                None => Err(RenderError::NotCurrent),
            };
        };
        let target = &self.targets[frame.slot];

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&Uniforms::from(call)));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(mesh) = &self.mesh {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Present the frame acquired for `slot`.
    pub fn present(&mut self, slot: usize) -> Result<(), RenderError> {
        if self.skipped == Some(slot) {
            self.skipped = None;
            return Ok(());
        }
        match self.active.take() {
            Some(frame) if frame.slot == slot => {
                frame.texture.present();
                Ok(())
            }
            Some(frame) => {
                let held = frame.slot;
                self.active = Some(frame);
                Err(RenderError::Activation {
                    slot,
                    reason: format!("the acquired frame belongs to window {held}"),
                })
            }
            None => Err(RenderError::NotCurrent),
        }
    }

    /// Destroy the mesh buffers. Later draws only clear. Idempotent.
    pub fn release_mesh(&mut self) {
        if let Some(mesh) = self.mesh.take() {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
            tracing::debug!("mesh buffers released");
        }
    }
}

impl Drop for WgpuRenderer {
    fn drop(&mut self) {
        self.active = None;
        self.release_mesh();
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
