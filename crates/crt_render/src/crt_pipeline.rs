//! CRT-Lottes post-processing pass.
//!
//! Draws the same screen-space quad as the sprite pipeline, but the fragment
//! stage reconstructs the source through scanline and bloom filters, screen
//! warp and a phosphor mask. Bind group 0 is the shared camera, bind group 1
//! holds the source texture (raw UNORM view), its sampler and `CrtUniform`.

use crt_core::config::CrtSettings;
use wgpu::util::DeviceExt;

use crate::sprite_pipeline::create_quad_pipeline;
use crate::texture::Texture;
use crate::vertex::QuadMesh;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CrtUniform {
    pub texture_size: [f32; 2],
    pub video_size: [f32; 2],
    pub output_size: [f32; 2],
    pub hard_scan: f32,
    pub hard_pix: f32,
    pub warp_x: f32,
    pub warp_y: f32,
    pub mask_dark: f32,
    pub mask_light: f32,
    pub scale_in_linear_gamma: f32,
    pub shadow_mask: f32,
    pub bright_boost: f32,
    pub hard_bloom_scan: f32,
    pub hard_bloom_pix: f32,
    pub bloom_amount: f32,
    pub shape: f32,
    /// 1.0 when the render target encodes to sRGB on store.
    pub srgb_target: f32,
}

impl CrtUniform {
    pub fn new(
        settings: &CrtSettings,
        texture_size: (u32, u32),
        output_size: (u32, u32),
        srgb_target: bool,
    ) -> Self {
        let texture_size = [texture_size.0 as f32, texture_size.1 as f32];
        Self {
            texture_size,
            video_size: texture_size,
            output_size: [output_size.0 as f32, output_size.1 as f32],
            hard_scan: settings.hard_scan,
            hard_pix: settings.hard_pix,
            warp_x: settings.warp_x,
            warp_y: settings.warp_y,
            mask_dark: settings.mask_dark,
            mask_light: settings.mask_light,
            scale_in_linear_gamma: settings.scale_in_linear_gamma,
            shadow_mask: settings.shadow_mask,
            bright_boost: settings.bright_boost,
            hard_bloom_scan: settings.hard_bloom_scan,
            hard_bloom_pix: settings.hard_bloom_pix,
            bloom_amount: settings.bloom_amount,
            shape: settings.shape,
            srgb_target: if srgb_target { 1.0 } else { 0.0 },
        }
    }
}

pub struct CrtPipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    pub uniform: CrtUniform,
    pub uniform_buffer: wgpu::Buffer,
    srgb_target: bool,
}

impl CrtPipeline {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        source: &Texture,
        settings: &CrtSettings,
        output_size: (u32, u32),
    ) -> Self {
        let srgb_target = target_format.is_srgb();
        let uniform = CrtUniform::new(settings, source.size, output_size, srgb_target);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("CRT Uniforms"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("CRT BGL"),
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
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<CrtUniform>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("CRT BG"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source.raw_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&source.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("CRT Lottes WGSL"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/crt_lottes.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("CRT Pipeline Layout"),
            bind_group_layouts: &[camera_bind_group_layout, &bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline =
            create_quad_pipeline(device, "CRT Pipeline", &layout, &shader, target_format);

        Self {
            render_pipeline,
            bind_group_layout,
            bind_group,
            uniform,
            uniform_buffer,
            srgb_target,
        }
    }

    /// Re-apply shader parameters, e.g. after a config reload or resize.
    pub fn set_params(
        &mut self,
        queue: &wgpu::Queue,
        settings: &CrtSettings,
        texture_size: (u32, u32),
        output_size: (u32, u32),
    ) {
        let uniform = CrtUniform::new(settings, texture_size, output_size, self.srgb_target);
        if uniform == self.uniform {
            return;
        }
        self.uniform = uniform;
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        camera_bind_group: &wgpu::BindGroup,
        quad: &QuadMesh,
    ) {
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.bind_group, &[]);
        quad.draw(render_pass);
    }
}
