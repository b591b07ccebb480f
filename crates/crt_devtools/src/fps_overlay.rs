//! Frame-rate readout rendered via egui on top of the scene.
//!
//! Same four-phase split the egui wgpu integration needs everywhere:
//!
//!   1. `prepare()` -- paint the text shapes, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! Each line is drawn twice for a drop shadow: black at the line position,
//! white one pixel up and to the left.

use crt_core::config::FpsOverlaySettings;
use crt_core::time::FrameRateCounter;
use egui::{Align2, Color32, FontId, LayerId, Order, Pos2};
use winit::window::Window;

/// Offset of the white foreground text relative to its black shadow.
pub const SHADOW_OFFSET: [f32; 2] = [-1.0, -1.0];

/// Top-left positions of the fps and spf lines. The spf line sits one text
/// row below the fps line.
pub fn line_positions(origin: [f32; 2], row_height: f32) -> [[f32; 2]; 2] {
    [origin, [origin[0], origin[1] + row_height]]
}

pub struct FpsOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl FpsOverlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: true,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        counter: &FrameRateCounter,
        settings: &FpsOverlaySettings,
    ) -> (Vec<egui::ClippedPrimitive>, egui::TexturesDelta) {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let visible = self.visible;
        let lines = [counter.fps_label(), counter.spf_label()];

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !visible {
                return;
            }

            // Settings are in physical pixels; egui lays out in points.
            let ppp = ctx.pixels_per_point();
            let font_id = FontId::proportional(settings.font_size / ppp);
            let row_height = ctx.fonts(|fonts| fonts.row_height(&font_id));
            let origin = [settings.position[0] / ppp, settings.position[1] / ppp];
            let shadow = [SHADOW_OFFSET[0] / ppp, SHADOW_OFFSET[1] / ppp];

            let painter = ctx.layer_painter(LayerId::new(Order::Foreground, egui::Id::new("fps")));
            for (text, pos) in lines.iter().zip(line_positions(origin, row_height)) {
                painter.text(
                    Pos2::new(pos[0], pos[1]),
                    Align2::LEFT_TOP,
                    text,
                    font_id.clone(),
                    Color32::BLACK,
                );
                painter.text(
                    Pos2::new(pos[0] + shadow[0], pos[1] + shadow[1]),
                    Align2::LEFT_TOP,
                    text,
                    font_id.clone(),
                    Color32::WHITE,
                );
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_line_sits_one_row_below() {
        let [fps, spf] = line_positions([5.0, 5.0], 16.0);
        assert_eq!(fps, [5.0, 5.0]);
        assert_eq!(spf, [5.0, 21.0]);
    }

    #[test]
    fn shadow_offset_is_up_and_left() {
        assert!(SHADOW_OFFSET[0] < 0.0);
        assert!(SHADOW_OFFSET[1] < 0.0);
    }
}
