//! GPU rendering implementation using wgpu
//!
//! Turns frame layers into two kinds of draw calls: solid rects and
//! atlas-sampled glyph quads.

use crate::error::{NotepadError, Result};
use crate::render::{Layer, Rect};
use bytemuck::{Pod, Zeroable};
use std::ops::Range;
use std::sync::Arc;
use winit::window::Window;

const INITIAL_VERTEX_BUFFER_SIZE: u64 = 64 * 1024;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RectVertex {
    pub position: [f32; 2],
    pub color: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
    pub color: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ShaderUniforms {
    pub viewport_size: [f32; 2],
    pub _padding: [f32; 2], // Align to 16 bytes
}

/// Vertex buffer that grows to fit the largest frame seen so far
struct VertexBuffer {
    buffer: wgpu::Buffer,
    label: &'static str,
}

impl VertexBuffer {
    fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            buffer: Self::allocate(device, label, INITIAL_VERTEX_BUFFER_SIZE),
            label,
        }
    }

    fn allocate(device: &wgpu::Device, label: &'static str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let needed = bytes.len() as u64;
        if needed > self.buffer.size() {
            let size = needed.next_power_of_two();
            tracing::debug!(label = self.label, size, "Growing vertex buffer");
            self.buffer = Self::allocate(device, self.label, size);
        }
        queue.write_buffer(&self.buffer, 0, bytes);
    }
}

/// Vertex ranges of one layer inside the shared buffers
struct LayerRanges {
    rects: Range<u32>,
    glyphs: Range<u32>,
}

pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,

    rect_pipeline: wgpu::RenderPipeline,
    glyph_pipeline: wgpu::RenderPipeline,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    glyph_texture: wgpu::Texture,
    glyph_bind_group: wgpu::BindGroup,

    rect_vertices: VertexBuffer,
    glyph_vertices: VertexBuffer,
}

fn gpu_error(context: &str, e: impl std::fmt::Display) -> NotepadError {
    NotepadError::Gpu(format!("{}: {}", context, e))
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>, atlas_size: (u32, u32)) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| gpu_error("create surface", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| gpu_error("request adapter", e))?;
        tracing::info!(adapter = ?adapter.get_info().name, "Using GPU adapter");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Notepad Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| gpu_error("request device", e))?;

        // Theme colors are written as-is, so skip sRGB conversion
        let size = window.inner_size();
        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or_else(|| NotepadError::Gpu("surface not supported by adapter".to_string()))?;
        let capabilities = surface.get_capabilities(&adapter);
        if let Some(format) = capabilities.formats.iter().find(|f| !f.is_srgb()) {
            config.format = *format;
        }
        surface.configure(&device, &config);

        let rect_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Rectangle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/rect.wgsl").into()),
        });

        let glyph_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Glyph Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/glyph.wgsl").into()),
        });

        let glyph_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Glyph Atlas"),
            size: wgpu::Extent3d {
                width: atlas_size.0,
                height: atlas_size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let glyph_texture_view = glyph_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Glyphs sit on whole pixels
        let glyph_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<ShaderUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let glyph_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Glyph Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let glyph_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Glyph Bind Group"),
            layout: &glyph_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&glyph_texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&glyph_sampler),
                },
            ],
        });

        let rect_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Rect Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let glyph_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Glyph Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout, &glyph_bind_group_layout],
                push_constant_ranges: &[],
            });

        let target = [Some(wgpu::ColorTargetState {
            format: config.format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let rect_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Rect Pipeline"),
            layout: Some(&rect_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &rect_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<RectVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Uint32],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &rect_shader,
                entry_point: Some("fs_main"),
                targets: &target,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let glyph_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Glyph Pipeline"),
            layout: Some(&glyph_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &glyph_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GlyphVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                        2 => Uint32
                    ],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &glyph_shader,
                entry_point: Some("fs_main"),
                targets: &target,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let rect_vertices = VertexBuffer::new(&device, "Rect Vertex Buffer");
        let glyph_vertices = VertexBuffer::new(&device, "Glyph Vertex Buffer");

        Ok(Self {
            device,
            queue,
            surface,
            config,
            rect_pipeline,
            glyph_pipeline,
            uniform_buffer,
            uniform_bind_group,
            glyph_texture,
            glyph_bind_group,
            rect_vertices,
            glyph_vertices,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        // Minimized windows report zero
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn upload_atlas(&self, atlas_data: &[u8], width: u32, height: u32) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.glyph_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            atlas_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width), // R8: one byte per pixel
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Draw layers in order over a cleared background
    pub fn render(&mut self, layers: &[Layer], clear: [f64; 4]) -> Result<()> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(NotepadError::Gpu("out of memory".to_string()));
            }
            Err(e) => {
                tracing::warn!("Skipping frame: {}", e);
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = ShaderUniforms {
            viewport_size: [self.config.width as f32, self.config.height as f32],
            _padding: [0.0, 0.0],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        // All layers share one buffer per pipeline; each layer draws its own range
        let mut rect_data = Vec::new();
        let mut glyph_data = Vec::new();
        let mut ranges = Vec::with_capacity(layers.len());
        for layer in layers {
            let rect_start = rect_data.len() as u32;
            for instance in &layer.rects {
                push_rect(&mut rect_data, instance.rect, instance.color);
            }
            let glyph_start = glyph_data.len() as u32;
            for instance in &layer.glyphs {
                push_glyph(&mut glyph_data, instance.rect, instance.tex_coords, instance.color);
            }
            ranges.push(LayerRanges {
                rects: rect_start..rect_data.len() as u32,
                glyphs: glyph_start..glyph_data.len() as u32,
            });
        }
        self.rect_vertices
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&rect_data));
        self.glyph_vertices
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&glyph_data));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0],
                            g: clear[1],
                            b: clear[2],
                            a: clear[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            for range in ranges {
                if !range.rects.is_empty() {
                    render_pass.set_pipeline(&self.rect_pipeline);
                    render_pass.set_vertex_buffer(0, self.rect_vertices.buffer.slice(..));
                    render_pass.draw(range.rects, 0..1);
                }
                if !range.glyphs.is_empty() {
                    render_pass.set_pipeline(&self.glyph_pipeline);
                    render_pass.set_bind_group(1, &self.glyph_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, self.glyph_vertices.buffer.slice(..));
                    render_pass.draw(range.glyphs, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Two triangles per rectangle
fn push_rect(vertices: &mut Vec<RectVertex>, rect: Rect, color: u32) {
    let (x1, y1) = (rect.x, rect.y);
    let (x2, y2) = (rect.right(), rect.bottom());
    for position in [[x1, y1], [x2, y1], [x1, y2], [x2, y1], [x2, y2], [x1, y2]] {
        vertices.push(RectVertex { position, color });
    }
}

fn push_glyph(vertices: &mut Vec<GlyphVertex>, rect: Rect, tex: [f32; 4], color: u32) {
    let (x1, y1) = (rect.x, rect.y);
    let (x2, y2) = (rect.right(), rect.bottom());
    let [u0, v0, u1, v1] = tex;
    let corners = [
        ([x1, y1], [u0, v0]),
        ([x2, y1], [u1, v0]),
        ([x1, y2], [u0, v1]),
        ([x2, y1], [u1, v0]),
        ([x2, y2], [u1, v1]),
        ([x1, y2], [u0, v1]),
    ];
    for (position, tex_coord) in corners {
        vertices.push(GlyphVertex {
            position,
            tex_coord,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_is_two_triangles() {
        let mut vertices = Vec::new();
        push_rect(&mut vertices, Rect::new(10.0, 20.0, 5.0, 4.0), 0x11223344);
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[0].position, [10.0, 20.0]);
        assert_eq!(vertices[4].position, [15.0, 24.0]);
        assert!(vertices.iter().all(|v| v.color == 0x11223344));
    }

    #[test]
    fn test_glyph_corners_follow_tex_coords() {
        let mut vertices = Vec::new();
        push_glyph(
            &mut vertices,
            Rect::new(0.0, 0.0, 8.0, 16.0),
            [0.25, 0.5, 0.75, 1.0],
            0xFFFFFFFF,
        );
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[0].tex_coord, [0.25, 0.5]);
        assert_eq!(vertices[4].position, [8.0, 16.0]);
        assert_eq!(vertices[4].tex_coord, [0.75, 1.0]);
    }

    #[test]
    fn test_vertex_layouts_match_shaders() {
        assert_eq!(std::mem::size_of::<RectVertex>(), 12);
        assert_eq!(std::mem::size_of::<GlyphVertex>(), 20);
        assert_eq!(std::mem::size_of::<ShaderUniforms>(), 16);
    }
}
