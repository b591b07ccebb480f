//! CRT demo -- main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Everything happens in
//! `RedrawRequested` with a variable timestep:
//!
//!   1. `begin_frame()` -- measure wall-clock delta
//!   2. Poll devices and advance the input snapshots, act on `exit` / `toggle_crt`
//!   3. Pick up config changes, feed the frame-rate counter
//!   4. Draw the source texture (through the CRT pass when enabled), composite
//!      the fps overlay, present
//!
//! At startup the texture is additionally rendered once through the CRT pass
//! into an off-screen target and written to disk as a PNG.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crt_core::config::{load_config_or_default, reload_config, DEFAULT_CONFIG_PATH};
use crt_core::{
    Action, DemoConfig, FileWatcher, FrameClock, FrameRateCounter, GamePadState, Input,
    KeyboardState,
};
use crt_devtools::FpsOverlay;
use crt_platform::{create_window, map_key, GamepadPoller, PlatformConfig};
use crt_render::texture::{fallback_pattern, load_image};
use crt_render::{
    render_to_image, save_png, Camera2D, CrtPipeline, GpuContext, QuadMesh, SpritePipeline,
    Texture,
};

const FALLBACK_TEXTURE_SIZE: (u32, u32) = (320, 240);

/// Action bindings, the active config and the runtime CRT toggle. Kept apart
/// from the GPU resources so per-frame decisions can run without a device.
struct DemoControls {
    input: Input<Action>,
    config: DemoConfig,
    crt_enabled: bool,
}

impl DemoControls {
    fn new(config: DemoConfig) -> Self {
        let mut input = Input::new(KeyboardState::new());
        apply_bindings(&mut input, &config);
        Self {
            input,
            crt_enabled: config.crt_enabled,
            config,
        }
    }

    /// Advance the input snapshots and act on the toggle. Returns true while
    /// `exit` is held.
    fn update(&mut self, keyboard: &KeyboardState, gamepad: &GamePadState) -> bool {
        self.input.update(keyboard, gamepad);

        if self.input.is_down(&Action::Exit) {
            return true;
        }
        if self.input.is_pressed(&Action::ToggleCrt) {
            self.crt_enabled = !self.crt_enabled;
            log::info!(
                "CRT shader: {}",
                if self.crt_enabled { "ON" } else { "OFF" }
            );
        }
        false
    }

    /// Adopt a reloaded config. `crt_enabled` in the file only seeds the
    /// toggle at startup; the runtime state is kept.
    fn apply_config(&mut self, config: DemoConfig) {
        apply_bindings(&mut self.input, &config);
        self.config = config;
    }
}

/// All mutable demo state. Constructed lazily in `ApplicationHandler::resumed`
/// once the window and GPU surface are available.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    clock: FrameClock,
    frame_rate: FrameRateCounter,

    // --- Input & config ---------------------------------------------------------
    // `keyboard` is fed by window events as they arrive; `controls` only sees
    // it once per frame, which is what edge detection compares against.
    keyboard: KeyboardState,
    gamepad: GamepadPoller,
    config_watcher: FileWatcher,
    controls: DemoControls,

    // --- GPU resources ----------------------------------------------------------
    camera: Camera2D,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sprite_pipeline: SpritePipeline,
    crt_pipeline: CrtPipeline,
    source: Texture,
    source_bind_group: wgpu::BindGroup,
    quad: QuadMesh,
    fps_overlay: FpsOverlay,
}

impl EngineState {
    fn new(
        window: Arc<Window>,
        config_path: PathBuf,
        config: DemoConfig,
        source_image: &RgbaImage,
    ) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone(), config.vsync)?;

        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let source = Texture::from_image(&gpu.device, &gpu.queue, source_image, "source");
        let source_bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &source);
        let quad = QuadMesh::new(
            &gpu.device,
            0.0,
            0.0,
            source.size.0 as f32,
            source.size.1 as f32,
        );

        let camera = Camera2D::new(gpu.size.0, gpu.size.1);
        let camera_buffer = create_camera_buffer(&gpu.device, &camera);
        let camera_bind_group = sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let crt_pipeline = CrtPipeline::new(
            &gpu.device,
            gpu.surface_format,
            &sprite_pipeline.camera_bind_group_layout,
            &source,
            &config.crt,
            gpu.size,
        );

        let mut fps_overlay = FpsOverlay::new(&gpu.device, gpu.surface_format, &window);
        fps_overlay.visible = config.show_fps;

        log::info!(
            "Source texture {}x{}, CRT {}",
            source.size.0,
            source.size.1,
            if config.crt_enabled { "ON" } else { "OFF" }
        );

        Ok(Self {
            window,
            gpu,
            clock: FrameClock::new(),
            frame_rate: FrameRateCounter::new(),
            keyboard: KeyboardState::new(),
            gamepad: GamepadPoller::new(),
            config_watcher: FileWatcher::new(config_path),
            controls: DemoControls::new(config),
            camera,
            camera_buffer,
            camera_bind_group,
            sprite_pipeline,
            crt_pipeline,
            source,
            source_bind_group,
            quad,
            fps_overlay,
        })
    }

    /// Render one frame through the CRT pass into an off-screen target the
    /// size of the back buffer and write it to `path`. The source keeps its
    /// native size in the top-left corner, as on screen.
    fn capture(&mut self, path: &Path) -> Result<(), String> {
        let size = self.gpu.size;
        self.camera.viewport = size;
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );
        self.crt_pipeline
            .set_params(&self.gpu.queue, &self.controls.config.crt, self.source.size, size);

        let crt_pipeline = &self.crt_pipeline;
        let camera_bind_group = &self.camera_bind_group;
        let quad = &self.quad;
        let image = render_to_image(
            &self.gpu.device,
            &self.gpu.queue,
            self.gpu.surface_format,
            size,
            |render_pass| crt_pipeline.draw(render_pass, camera_bind_group, quad),
        )?;

        save_png(&image, path)?;
        log::info!("Saved CRT capture to {}", path.display());
        Ok(())
    }

    fn check_config_reload(&mut self) {
        let Some(config) = reload_config(&mut self.config_watcher) else {
            return;
        };
        self.crt_pipeline
            .set_params(&self.gpu.queue, &config.crt, self.source.size, self.gpu.size);
        self.fps_overlay.visible = config.show_fps;
        self.controls.apply_config(config);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.camera.viewport = (width, height);
        self.crt_pipeline
            .set_params(&self.gpu.queue, &self.controls.config.crt, self.source.size, self.gpu.size);
    }

    fn render(&mut self) {
        let camera_uniform = self.camera.build_uniform();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniform]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let (egui_primitives, egui_textures_delta) = self.fps_overlay.prepare(
            &self.window,
            &self.frame_rate,
            &self.controls.config.fps_overlay,
        );
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b] = self.controls.config.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if self.controls.crt_enabled {
                self.crt_pipeline
                    .draw(&mut render_pass, &self.camera_bind_group, &self.quad);
            } else {
                self.sprite_pipeline.draw(
                    &mut render_pass,
                    &self.camera_bind_group,
                    &self.source_bind_group,
                    &self.quad,
                );
            }
        }

        self.fps_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.fps_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.fps_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.frame_rate.record_draw();
        output.present();
    }
}

struct App {
    config_path: PathBuf,
    config: DemoConfig,
    source_image: RgbaImage,
    state: Option<EngineState>,
    error: Option<String>,
}

impl App {
    fn new(config_path: PathBuf, config: DemoConfig, source_image: RgbaImage) -> Self {
        Self {
            config_path,
            config,
            source_image,
            state: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<EngineState, String> {
        let (width, height) = self.source_image.dimensions();
        let platform = PlatformConfig::sized_to(&self.config.window_title, width, height);
        let window = create_window(event_loop, &platform)?;
        log::info!("Window created: {}x{}", platform.width, platform.height);

        let mut state = EngineState::new(
            window,
            self.config_path.clone(),
            self.config.clone(),
            &self.source_image,
        )?;

        if let Some(capture_path) = &self.config.capture_path {
            if let Err(err) = state.capture(Path::new(capture_path)) {
                log::error!("Startup capture failed: {err}");
            }
        }

        Ok(state)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Startup failed: {err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        state
            .fps_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.keyboard.key_down(key),
                            ElementState::Released => state.keyboard.key_up(key),
                        }
                    }
                }
            }

            // Release events for keys held while unfocused never arrive.
            WindowEvent::Focused(false) => {
                state.keyboard.clear();
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                let dt = state.clock.begin_frame();
                let gamepad = state.gamepad.poll();
                if state.controls.update(&state.keyboard, &gamepad) {
                    log::info!("Exit requested, exiting.");
                    event_loop.exit();
                    return;
                }

                state.check_config_reload();
                state.frame_rate.update(dt);
                state.render();
            }

            _ => {}
        }
    }
}

fn create_camera_buffer(device: &wgpu::Device, camera: &Camera2D) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Camera Buffer"),
        contents: bytemuck::cast_slice(&[camera.build_uniform()]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn apply_bindings(input: &mut Input<Action>, config: &DemoConfig) {
    input.clear_actions();
    for &action in Action::ALL {
        input.set_action(action, config.binding(action));
    }
}

fn load_source_image(path: &Path) -> RgbaImage {
    match load_image(path) {
        Ok(image) => image,
        Err(err) => {
            log::warn!("{err}; using generated test pattern");
            fallback_pattern(FALLBACK_TEXTURE_SIZE.0, FALLBACK_TEXTURE_SIZE.1)
        }
    }
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("CRT demo starting...");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = load_config_or_default(&config_path)?;
    let source_image = load_source_image(Path::new(&config.texture_path));

    let event_loop = EventLoop::new().map_err(|e| format!("Failed to create event loop: {e}"))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config_path, config, source_image);
    event_loop
        .run_app(&mut app)
        .map_err(|e| format!("Event loop error: {e}"))?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
