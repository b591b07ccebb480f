//! Off-screen rendering with CPU readback, used to dump a frame to PNG.

use std::path::Path;
use std::sync::mpsc;

use image::RgbaImage;

/// Row pitch of a texture-to-buffer copy: rows are padded up to
/// `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drop the per-row padding of a readback buffer, leaving tightly packed
/// 4-byte texels.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    let padded_row = padded_row as usize;
    let mut pixels = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * padded_row;
        pixels.extend_from_slice(&data[start..start + row]);
    }
    pixels
}

/// Swap red and blue in place, turning BGRA texels into RGBA.
pub fn bgra_to_rgba(pixels: &mut [u8]) {
    for texel in pixels.chunks_exact_mut(4) {
        texel.swap(0, 2);
    }
}

fn needs_swizzle(format: wgpu::TextureFormat) -> Result<bool, String> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Ok(false),
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => Ok(true),
        other => Err(format!("Capture does not support target format {other:?}")),
    }
}

/// Render into a fresh `format` target of `size` and read the result back.
/// `draw` records into a pass that has already been cleared to transparent.
pub fn render_to_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    format: wgpu::TextureFormat,
    size: (u32, u32),
    draw: impl FnOnce(&mut wgpu::RenderPass<'_>),
) -> Result<RgbaImage, String> {
    let swizzle = needs_swizzle(format)?;
    let (width, height) = (size.0.max(1), size.1.max(1));
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Capture Target"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let padded_row = padded_bytes_per_row(width);
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Capture Readback"),
        size: padded_row as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Capture Encoder"),
    });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Capture Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
        draw(&mut render_pass);
    }

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        extent,
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|e| format!("Capture readback was dropped: {e}"))?
        .map_err(|e| format!("Failed to map capture buffer: {e}"))?;

    let mut pixels = {
        let data = slice.get_mapped_range();
        unpad_rows(&data, width, height, padded_row)
    };
    readback.unmap();

    if swizzle {
        bgra_to_rgba(&mut pixels);
    }

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| "Capture buffer size does not match image dimensions".to_string())
}

pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), String> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| format!("Failed to write PNG {}: {e}", path.display()))
}
