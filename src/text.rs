use std::collections::HashMap;
use std::rc::Rc;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use freetype::Library;
use freetype::face::LoadFlag;

use crate::error::LanderError;
use crate::render::{Color, TextCommand};
use crate::sprite::ortho_projection;

/// Side of the square glyph atlas, in texels.
const ATLAS_SIZE: u32 = 512;
const GLYPH_PADDING: u32 = 1;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextUniforms {
    pub projection: [[f32; 4]; 4],
}

/// Where a rasterized glyph lives in the atlas, and how to place it
/// relative to the pen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphInfo {
    pub width: u32,
    pub height: u32,
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl GlyphInfo {
    /// Whitespace and other glyphs with no coverage.
    const EMPTY: Self = Self {
        width: 0,
        height: 0,
        bearing_x: 0,
        bearing_y: 0,
        u0: 0.0,
        v0: 0.0,
        u1: 0.0,
        v1: 0.0,
    };

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Row-by-row allocator for a fixed atlas. Glyphs fill a shelf left to
/// right; a glyph that does not fit opens a new shelf below the tallest
/// glyph so far.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    shelf_height: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
            shelf_height: 0,
        }
    }

    /// Top-left of a free `w`x`h` region, or None when the atlas is full.
    pub fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w > self.width {
            return None;
        }
        if self.x + w + GLYPH_PADDING > self.width {
            self.y += self.shelf_height + GLYPH_PADDING;
            self.x = 0;
            self.shelf_height = 0;
        }
        if self.y + h > self.height {
            return None;
        }

        let pos = (self.x, self.y);
        self.shelf_height = self.shelf_height.max(h);
        self.x += w + GLYPH_PADDING;
        Some(pos)
    }
}

/// Two triangles covering a glyph whose bitmap's top-left is at
/// (`x0`, `y0`) in view pixels.
pub fn glyph_quad(x0: f32, y0: f32, glyph: &GlyphInfo, color: Color) -> [TextVertex; 6] {
    let x1 = x0 + glyph.width as f32;
    let y1 = y0 + glyph.height as f32;
    let make = |x: f32, y: f32, u: f32, v: f32| TextVertex {
        position: [x, y],
        uv: [u, v],
        color,
    };

    [
        make(x0, y0, glyph.u0, glyph.v0),
        make(x1, y0, glyph.u1, glyph.v0),
        make(x0, y1, glyph.u0, glyph.v1),
        make(x1, y0, glyph.u1, glyph.v0),
        make(x1, y1, glyph.u1, glyph.v1),
        make(x0, y1, glyph.u0, glyph.v1),
    ]
}

/// Copy a FreeType bitmap into a tightly packed `w`x`h` buffer. Rows may
/// be padded (`pitch > w`) or stored bottom-up (`pitch < 0`).
fn unpack_bitmap(buffer: &[u8], w: u32, h: u32, pitch: i32) -> Vec<u8> {
    let abs_pitch = pitch.unsigned_abs() as usize;
    let mut pixels = Vec::with_capacity((w * h) as usize);
    for row in 0..h {
        let src_row = if pitch >= 0 { row } else { h - 1 - row };
        let start = src_row as usize * abs_pitch;
        pixels.extend_from_slice(&buffer[start..start + w as usize]);
    }
    pixels
}

struct PendingGlyphUpload {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

fn font_error(path: &str, reason: impl ToString) -> LanderError {
    LanderError::Font {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// HUD text renderer: cosmic-text shapes each line, FreeType rasterizes
/// glyphs on first use into a single-channel atlas.
pub struct TextRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    frame_vertices: Vec<TextVertex>,

    font_system: FontSystem,
    family: String,

    // Keyed by (glyph id, pixel size); the HUD uses more than one size.
    glyphs: HashMap<(u16, u32), GlyphInfo>,
    _ft_lib: Library,
    ft_face: freetype::Face,

    atlas_texture: wgpu::Texture,
    packer: ShelfPacker,
    pending_uploads: Vec<PendingGlyphUpload>,
}

impl TextRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        font_path: &str,
    ) -> Result<Self, LanderError> {
        let font_bytes = std::fs::read(font_path).map_err(|source| LanderError::Io {
            path: font_path.to_string(),
            source,
        })?;

        let ft_lib = Library::init().map_err(|e| font_error(font_path, e))?;
        let ft_face = ft_lib
            .new_memory_face(Rc::new(font_bytes.clone()), 0)
            .map_err(|e| font_error(font_path, e))?;

        let mut db = cosmic_text::fontdb::Database::new();
        db.load_font_data(font_bytes);
        let family = db
            .faces()
            .next()
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone())
            .ok_or_else(|| font_error(font_path, "no usable font face"))?;
        let font_system = FontSystem::new_with_locale_and_db("en-US".to_string(), db);

        let atlas_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph_atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &atlas_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &vec![0u8; (ATLAS_SIZE * ATLAS_SIZE) as usize],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(ATLAS_SIZE),
                rows_per_image: Some(ATLAS_SIZE),
            },
            wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
        );

        let atlas_view = atlas_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let atlas_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("text_uniforms"),
            size: std::mem::size_of::<TextUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let initial_capacity = 1200; // ~200 glyphs
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("text_vertices"),
            size: (initial_capacity * std::mem::size_of::<TextVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("text_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&atlas_sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("text_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("text.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("text_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("text_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<TextVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                        2 => Float32x4,
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
            multiview: None,
            cache: None,
        });

        log::info!("HUD font: {} ({})", family, font_path);

        Ok(Self {
            pipeline,
            bind_group,
            uniform_buffer,
            vertex_buffer,
            vertex_capacity: initial_capacity,
            frame_vertices: Vec::new(),
            font_system,
            family,
            glyphs: HashMap::new(),
            _ft_lib: ft_lib,
            ft_face,
            atlas_texture,
            packer: ShelfPacker::new(ATLAS_SIZE, ATLAS_SIZE),
            pending_uploads: Vec::new(),
        })
    }

    /// Start a new frame. Clears accumulated vertices and writes uniforms.
    pub fn begin_frame(&mut self, queue: &wgpu::Queue, view_w: u32, view_h: u32) {
        self.frame_vertices.clear();
        let uniforms = TextUniforms {
            projection: ortho_projection(view_w as f32, view_h as f32),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Shape one line and append its glyph quads.
    pub fn add_text(&mut self, command: &TextCommand) {
        let size = command.size.max(1.0);
        let px = size.round() as u32;

        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size));
        buffer.set_size(&mut self.font_system, None, None);
        let attrs = Attrs::new().family(Family::Name(&self.family));
        buffer.set_text(
            &mut self.font_system,
            &command.text,
            &attrs,
            Shaping::Advanced,
            None,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        // Collected first: rasterizing needs `self` mutably.
        let origin = command.position;
        let mut placed: Vec<(u16, i32, i32)> = Vec::new();
        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                let physical = glyph.physical((origin.x, origin.y + run.line_y), 1.0);
                placed.push((physical.cache_key.glyph_id, physical.x, physical.y));
            }
        }
        drop(buffer);

        for (glyph_id, x, y) in placed {
            let Some(info) = self.glyph(glyph_id, px) else {
                continue;
            };
            if info.is_empty() {
                continue;
            }
            let x0 = (x + info.bearing_x) as f32;
            let y0 = (y - info.bearing_y) as f32;
            self.frame_vertices
                .extend_from_slice(&glyph_quad(x0, y0, &info, command.color));
        }
    }

    /// Cached glyph, rasterizing it into the atlas on first use.
    fn glyph(&mut self, glyph_id: u16, px: u32) -> Option<GlyphInfo> {
        if let Some(info) = self.glyphs.get(&(glyph_id, px)) {
            return Some(*info);
        }

        self.ft_face.set_pixel_sizes(0, px).ok()?;
        self.ft_face
            .load_glyph(glyph_id as u32, LoadFlag::RENDER | LoadFlag::TARGET_LIGHT)
            .ok()?;

        let slot = self.ft_face.glyph();
        let bitmap = slot.bitmap();
        let w = bitmap.width() as u32;
        let h = bitmap.rows() as u32;

        if w == 0 || h == 0 {
            self.glyphs.insert((glyph_id, px), GlyphInfo::EMPTY);
            return Some(GlyphInfo::EMPTY);
        }

        let Some((x, y)) = self.packer.place(w, h) else {
            log::warn!("glyph atlas full, dropping glyph {} at {}px", glyph_id, px);
            return None;
        };

        let pixels = unpack_bitmap(bitmap.buffer(), w, h, bitmap.pitch());
        self.pending_uploads.push(PendingGlyphUpload {
            x,
            y,
            width: w,
            height: h,
            pixels,
        });

        let size = ATLAS_SIZE as f32;
        let info = GlyphInfo {
            width: w,
            height: h,
            bearing_x: slot.bitmap_left(),
            bearing_y: slot.bitmap_top(),
            u0: x as f32 / size,
            v0: y as f32 / size,
            u1: (x + w) as f32 / size,
            v1: (y + h) as f32 / size,
        };
        self.glyphs.insert((glyph_id, px), info);
        Some(info)
    }

    /// Upload new glyphs and this frame's vertices. Returns the vertex count
    /// for `render`.
    pub fn flush(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) -> u32 {
        for upload in self.pending_uploads.drain(..) {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.atlas_texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: upload.x,
                        y: upload.y,
                        z: 0,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &upload.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(upload.width),
                    rows_per_image: Some(upload.height),
                },
                wgpu::Extent3d {
                    width: upload.width,
                    height: upload.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let vertex_count = self.frame_vertices.len() as u32;
        if self.frame_vertices.is_empty() {
            return 0;
        }

        if self.frame_vertices.len() > self.vertex_capacity {
            self.vertex_capacity = self.frame_vertices.len().next_power_of_two();
            self.vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("text_vertices"),
                size: (self.vertex_capacity * std::mem::size_of::<TextVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }

        queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&self.frame_vertices),
        );

        vertex_count
    }

    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, vertex_count: u32) {
        if vertex_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..vertex_count, 0..1);
    }
}
