use crate::assets::TextureData;
use crate::components::TextureId;
use crate::render::{DrawList, SpriteCommand};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteUniforms {
    pub projection: [[f32; 4]; 4],
}

/// Consecutive vertices sharing one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub texture: TextureId,
    pub start: u32,
    pub count: u32,
}

/// Two triangles for one command, in view pixels.
pub fn sprite_vertices(command: &SpriteCommand) -> [SpriteVertex; 6] {
    let [tl, tr, br, bl] = command.corners();
    let s = command.src;
    let (u0, v0, u1, v1) = (s.x, s.y, s.x + s.w, s.y + s.h);
    let color = command.tint;

    let make = |p: glam::Vec2, u: f32, v: f32| SpriteVertex {
        position: [p.x, p.y],
        uv: [u, v],
        color,
    };

    [
        make(tl, u0, v0),
        make(tr, u1, v0),
        make(bl, u0, v1),
        make(tr, u1, v0),
        make(br, u1, v1),
        make(bl, u0, v1),
    ]
}

/// Append the list's vertices to `vertices`, merging runs of the same
/// texture into one batch.
pub fn batch_draw_list(list: &DrawList, vertices: &mut Vec<SpriteVertex>, batches: &mut Vec<Batch>) {
    for command in &list.commands {
        let start = vertices.len() as u32;
        vertices.extend_from_slice(&sprite_vertices(command));

        match batches.last_mut() {
            Some(batch) if batch.texture == command.texture => batch.count += 6,
            _ => batches.push(Batch {
                texture: command.texture,
                start,
                count: 6,
            }),
        }
    }
}

/// Orthographic projection from a `view_w`x`view_h` pixel space, y down,
/// to clip space.
pub fn ortho_projection(view_w: f32, view_h: f32) -> [[f32; 4]; 4] {
    #[rustfmt::skip]
    let projection = [
        [2.0 / view_w, 0.0,           0.0, 0.0],
        [0.0,         -2.0 / view_h,  0.0, 0.0],
        [0.0,          0.0,           1.0, 0.0],
        [-1.0,         1.0,           0.0, 1.0],
    ];
    projection
}

struct GpuTexture {
    bind_group: wgpu::BindGroup,
    // Kept alive for the bind group.
    _texture: wgpu::Texture,
}

/// Textured-quad batcher. Owns every texture the game draws with.
pub struct SpriteRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    textures: Vec<GpuTexture>,
    frame_vertices: Vec<SpriteVertex>,
    frame_batches: Vec<Batch>,
}

impl SpriteRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite_uniforms"),
            size: std::mem::size_of::<SpriteUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let initial_capacity = 3000; // ~500 quads
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite_vertices"),
            size: (initial_capacity * std::mem::size_of::<SpriteVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_uniform_layout"),
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

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite_uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sprite.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprite_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SpriteVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        // position
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                        // uv
                        wgpu::VertexAttribute {
                            offset: 8,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                        // color
                        wgpu::VertexAttribute {
                            offset: 16,
                            shader_location: 2,
                            format: wgpu::VertexFormat::Float32x4,
                        },
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

        Self {
            pipeline,
            uniform_bind_group,
            texture_layout,
            sampler,
            uniform_buffer,
            vertex_buffer,
            vertex_capacity: initial_capacity,
            textures: Vec::new(),
            frame_vertices: Vec::new(),
            frame_batches: Vec::new(),
        }
    }

    /// Upload RGBA8 pixels and return a handle for draw commands.
    pub fn add_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
        label: &str,
    ) -> TextureId {
        let size = wgpu::Extent3d {
            width: data.width.max(1),
            height: data.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.textures.push(GpuTexture {
            bind_group,
            _texture: texture,
        });
        TextureId(self.textures.len() - 1)
    }

    /// Clear vertices and write the projection for a `view_w`x`view_h`
    /// logical view.
    pub fn begin_frame(&mut self, queue: &wgpu::Queue, view_w: u32, view_h: u32) {
        self.frame_vertices.clear();
        self.frame_batches.clear();

        let uniforms = SpriteUniforms {
            projection: ortho_projection(view_w as f32, view_h as f32),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn add_draw_list(&mut self, list: &DrawList) {
        batch_draw_list(list, &mut self.frame_vertices, &mut self.frame_batches);
    }

    /// Upload vertices to GPU. Returns vertex count for render().
    pub fn flush(&mut self, queue: &wgpu::Queue, device: &wgpu::Device) -> u32 {
        let vertex_count = self.frame_vertices.len() as u32;
        if self.frame_vertices.is_empty() {
            return 0;
        }

        if self.frame_vertices.len() > self.vertex_capacity {
            self.vertex_capacity = self.frame_vertices.len().next_power_of_two();
            self.vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("sprite_vertices"),
                size: (self.vertex_capacity * std::mem::size_of::<SpriteVertex>()) as u64,
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
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

        for batch in &self.frame_batches {
            // Unknown handles draw nothing.
            let Some(texture) = self.textures.get(batch.texture.0) else {
                continue;
            };
            render_pass.set_bind_group(1, &texture.bind_group, &[]);
            render_pass.draw(batch.start..batch.start + batch.count, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Rect;
    use crate::render::{BLACK, WHITE};
    use glam::Vec2;

    fn command(texture: usize) -> SpriteCommand {
        SpriteCommand {
            texture: TextureId(texture),
            src: Rect::new(0.25, 0.0, 0.25, 1.0),
            dst: Rect::new(10.0, 20.0, 30.0, 40.0),
            origin: Vec2::ZERO,
            rotation_deg: 0.0,
            tint: WHITE,
        }
    }

    #[test]
    fn quad_vertices_cover_dst_and_src() {
        let v = sprite_vertices(&command(0));
        assert_eq!(v[0].position, [10.0, 20.0]);
        assert_eq!(v[0].uv, [0.25, 0.0]);
        assert_eq!(v[4].position, [40.0, 60.0]);
        assert_eq!(v[4].uv, [0.5, 1.0]);
        // Shared diagonal.
        assert_eq!(v[1], v[3]);
        assert_eq!(v[2], v[5]);
    }

    #[test]
    fn consecutive_textures_merge_into_one_batch() {
        let mut list = DrawList::new(BLACK);
        list.push(command(0));
        list.push(command(0));
        list.push(command(1));
        list.push(command(0));

        let mut vertices = Vec::new();
        let mut batches = Vec::new();
        batch_draw_list(&list, &mut vertices, &mut batches);

        assert_eq!(vertices.len(), 24);
        assert_eq!(
            batches,
            vec![
                Batch {
                    texture: TextureId(0),
                    start: 0,
                    count: 12
                },
                Batch {
                    texture: TextureId(1),
                    start: 12,
                    count: 6
                },
                Batch {
                    texture: TextureId(0),
                    start: 18,
                    count: 6
                },
            ]
        );
    }

    #[test]
    fn projection_maps_view_corners_to_clip_space() {
        let m = ortho_projection(1000.0, 600.0);
        let apply = |x: f32, y: f32| {
            [
                m[0][0] * x + m[1][0] * y + m[3][0],
                m[0][1] * x + m[1][1] * y + m[3][1],
            ]
        };
        let close = |a: [f32; 2], b: [f32; 2]| (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5;
        assert!(close(apply(0.0, 0.0), [-1.0, 1.0]));
        assert!(close(apply(1000.0, 600.0), [1.0, -1.0]));
        assert!(close(apply(500.0, 300.0), [0.0, 0.0]));
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<SpriteVertex>(), 32);
    }
}
