use std::path::Path;

use image::RgbaImage;

/// A sampled 2D texture. Texels are stored as sRGB so the sprite path gets
/// hardware decoding; `raw_view` reinterprets the same texels as plain UNORM
/// for shaders that do their own gamma handling.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub raw_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: (u32, u32),
}

impl Texture {
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
    ) -> Result<Self, String> {
        let image = decode_image(bytes, label)?;
        Ok(Self::from_image(device, queue, &image, label))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
    ) -> Self {
        let (width, height) = image.dimensions();
        Self::from_rgba8(device, queue, image.as_raw(), width, height, label)
    }

    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
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
            view_formats: &[wgpu::TextureFormat::Rgba8Unorm],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let raw_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            format: Some(wgpu::TextureFormat::Rgba8Unorm),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            raw_view,
            sampler,
            size: (width, height),
        }
    }
}

pub fn decode_image(bytes: &[u8], label: &str) -> Result<RgbaImage, String> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| format!("Failed to decode image '{label}': {e}"))?;
    Ok(image.to_rgba8())
}

pub fn load_image(path: &Path) -> Result<RgbaImage, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read texture '{}': {e}", path.display()))?;
    decode_image(&bytes, &path.display().to_string())
}

/// Checkerboard with a colour ramp, used when the source texture is missing.
/// Fine detail and hard edges make the scanlines and mask easy to see.
pub fn fallback_pattern(width: u32, height: u32) -> RgbaImage {
    const CELL: u32 = 16;
    RgbaImage::from_fn(width.max(1), height.max(1), |x, y| {
        let checker = ((x / CELL) + (y / CELL)) % 2 == 0;
        let r = ((x * 255) / width.max(1)) as u8;
        let b = ((y * 255) / height.max(1)) as u8;
        if checker {
            image::Rgba([r, 96, b, 255])
        } else {
            image::Rgba([24, 24, 24, 255])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_pattern_has_requested_size() {
        let image = fallback_pattern(320, 240);
        assert_eq!(image.dimensions(), (320, 240));
    }

    #[test]
    fn fallback_pattern_alternates_cells() {
        let image = fallback_pattern(64, 64);
        let dark = image::Rgba([24, 24, 24, 255]);
        assert_ne!(*image.get_pixel(0, 0), dark);
        assert_eq!(*image.get_pixel(16, 0), dark);
        assert_eq!(*image.get_pixel(0, 16), dark);
        assert_ne!(*image.get_pixel(16, 16), dark);
        assert!(image.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn fallback_pattern_clamps_zero_size() {
        assert_eq!(fallback_pattern(0, 0).dimensions(), (1, 1));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_image(b"definitely not a png", "garbage").expect_err("should fail");
        assert!(err.contains("garbage"));
    }

    #[test]
    fn decode_roundtrips_encoded_png() {
        let source = fallback_pattern(8, 4);
        let mut encoded = std::io::Cursor::new(Vec::new());
        source
            .write_to(&mut encoded, image::ImageFormat::Png)
            .expect("png encode");
        let decoded = decode_image(encoded.get_ref(), "roundtrip").expect("png decode");
        assert_eq!(decoded, source);
    }

    #[test]
    fn load_image_reports_missing_path() {
        let err = load_image(Path::new("definitely/missing/texture.png"))
            .expect_err("missing file should fail");
        assert!(err.contains("Failed to read texture"));
    }
}
