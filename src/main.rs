use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use lander::assets::{TextureData, load_texture};
use lander::config::GameConfig;
use lander::input::{InputState, KeyBindings, apply_controls};
use lander::loading::{LevelData, load_config_or_default, load_level_or_default};
use lander::render::{self, Color, SceneStyle};
use lander::simulation::{Simulation, TextureIds};
use lander::sprite::SpriteRenderer;
use lander::text::TextRenderer;

const CONFIG_PATH: &str = "data/config.ron";

/// Longest frame fed to the simulation. A stall longer than this (window
/// drag, breakpoint) is dropped instead of replayed.
const MAX_FRAME_DELTA: f32 = 0.25;

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    window: Arc<Window>,
}

impl GpuState {
    fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("failed to find a suitable GPU adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lander_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        ))
        .expect("failed to create GPU device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Self {
            surface,
            device,
            queue,
            config,
            window,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn render(
        &self,
        sprites: &SpriteRenderer,
        sprite_vertex_count: u32,
        text: Option<(&TextRenderer, u32)>,
        clear: Color,
    ) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                return;
            }
            Err(e) => {
                log::warn!("surface error: {e:?}");
                return;
            }
        };

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
                label: Some("sprite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: clear[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            sprites.render(&mut render_pass, sprite_vertex_count);
            if let Some((text, text_vertex_count)) = text {
                text.render(&mut render_pass, text_vertex_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    gpu: Option<GpuState>,
    sprites: Option<SpriteRenderer>,
    /// None when the HUD font failed to load; the game runs without text.
    text: Option<TextRenderer>,
    style: Option<SceneStyle>,
    sim: Option<Simulation>,
    config: GameConfig,
    /// Consumed when the simulation is built on first resume.
    level: Option<LevelData>,
    input: InputState,
    bindings: KeyBindings,
    last_frame_time: Instant,
    title: String,
}

impl App {
    /// Upload every texture and build the simulation around the handles.
    fn build_scene(&mut self, gpu: &GpuState, sprites: &mut SpriteRenderer) -> Option<Simulation> {
        let assets = &self.config.assets;
        let mut upload = |path: &str| {
            let data = load_texture(path);
            sprites.add_texture(&gpu.device, &gpu.queue, &data, path)
        };
        let tile_sheet = upload(&assets.tile_sheet);
        let textures = TextureIds {
            player: upload(&assets.player),
            patrol: upload(&assets.patrol),
        };
        let solid = sprites.add_texture(
            &gpu.device,
            &gpu.queue,
            &TextureData::white_pixel(),
            "white",
        );

        self.style = Some(SceneStyle {
            tile_sheet,
            tile_sheet_columns: assets.tile_sheet_columns,
            tile_sheet_rows: assets.tile_sheet_rows,
            solid,
            show_colliders: self.config.show_colliders,
        });

        let level = self.level.take().unwrap_or_else(LevelData::default_level);
        match Simulation::from_config(&self.config, level, textures) {
            Ok(sim) => Some(sim),
            Err(e) => {
                log::error!("failed to build scene: {}", e);
                None
            }
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu), Some(sprites), Some(style), Some(sim)) = (
            self.gpu.as_ref(),
            self.sprites.as_mut(),
            self.style.as_ref(),
            self.sim.as_mut(),
        ) else {
            return;
        };

        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame_time)
            .as_secs_f32()
            .min(MAX_FRAME_DELTA);
        self.last_frame_time = now;

        // === Input ===
        let gravity = sim.physics().gravity;
        if apply_controls(sim.player_mut(), &self.input, &self.bindings, gravity) {
            sim.terminate();
        }

        // === Simulation ===
        sim.advance(dt);
        for event in sim.events.take_unread() {
            log::info!("{}", render::describe_event(&event));
        }
        if sim.is_terminated() {
            event_loop.exit();
            return;
        }

        let status = render::render_status(sim, &self.config.window.title);
        if status != self.title {
            gpu.window.set_title(&status);
            self.title = status;
        }

        // === Render ===
        let (view_w, view_h) = (self.config.window.width, self.config.window.height);
        let list = render::build_scene(sim, style);
        sprites.begin_frame(&gpu.queue, view_w, view_h);
        sprites.add_draw_list(&list);
        let sprite_vertex_count = sprites.flush(&gpu.queue, &gpu.device);

        let text = self.text.as_mut().map(|text| {
            text.begin_frame(&gpu.queue, view_w, view_h);
            for line in &list.texts {
                text.add_text(line);
            }
            text.flush(&gpu.queue, &gpu.device)
        });
        gpu.render(
            sprites,
            sprite_vertex_count,
            self.text.as_ref().zip(text),
            list.clear,
        );

        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let window_config = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                window_config.width as f64,
                window_config.height as f64,
            ));

        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        let gpu = GpuState::new(window.clone());
        let mut sprites = SpriteRenderer::new(&gpu.device, gpu.surface_format());
        let text = match TextRenderer::new(
            &gpu.device,
            &gpu.queue,
            gpu.surface_format(),
            &self.config.assets.font,
        ) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("{}, HUD text disabled", e);
                None
            }
        };

        let Some(sim) = self.build_scene(&gpu, &mut sprites) else {
            event_loop.exit();
            return;
        };

        self.gpu = Some(gpu);
        self.sprites = Some(sprites);
        self.text = text;
        self.sim = Some(sim);
        self.last_frame_time = Instant::now();
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(sim) = self.sim.as_mut() {
                    sim.terminate();
                }
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(kc) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.input.press(kc),
                        ElementState::Released => self.input.release(kc),
                    }
                }
            }
            // Releases are not delivered while unfocused.
            WindowEvent::Focused(false) => self.input.clear(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size);
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let config = load_config_or_default(CONFIG_PATH);
    let level = load_level_or_default(config.level.as_deref());
    let bindings = KeyBindings::defaults();
    log::info!("controls: {}", bindings.summary());

    let event_loop = EventLoop::new().expect("create event loop");
    let mut app = App {
        gpu: None,
        sprites: None,
        text: None,
        style: None,
        sim: None,
        title: config.window.title.clone(),
        config,
        level: Some(level),
        input: InputState::new(),
        bindings,
        last_frame_time: Instant::now(),
    };
    event_loop.run_app(&mut app).expect("run event loop");
}
