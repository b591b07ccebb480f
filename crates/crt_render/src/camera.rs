use glam::Mat4;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Screen-space projection with a top-left origin and y pointing down, so a
/// sprite drawn at (0, 0) with the viewport's size covers the whole target.
pub struct Camera2D {
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn projection(&self) -> Mat4 {
        let (width, height) = (self.viewport.0 as f32, self.viewport.1 as f32);
        Mat4::orthographic_rh(0.0, width, height, 0.0, -1.0, 1.0)
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn assert_near(a: Vec3, b: Vec3) {
        assert!((a - b).abs().max_element() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn top_left_maps_to_upper_left_clip_corner() {
        let camera = Camera2D::new(640, 480);
        let clip = camera.projection().project_point3(Vec3::new(0.0, 0.0, 0.0));
        assert_near(clip.truncate().extend(0.0), Vec3::new(-1.0, 1.0, 0.0));
    }

    #[test]
    fn bottom_right_maps_to_lower_right_clip_corner() {
        let camera = Camera2D::new(640, 480);
        let clip = camera
            .projection()
            .project_point3(Vec3::new(640.0, 480.0, 0.0));
        assert_near(clip.truncate().extend(0.0), Vec3::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn sprite_plane_is_inside_depth_range() {
        let camera = Camera2D::new(320, 200);
        let clip = camera.projection().project_point3(Vec3::new(160.0, 100.0, 0.0));
        assert!((0.0..=1.0).contains(&clip.z));
    }

    #[test]
    fn resized_viewport_keeps_pixel_scale() {
        let mut camera = Camera2D::new(320, 240);
        camera.viewport = (640, 480);
        // The 320x240 source now fills only the upper-left quarter.
        let clip = camera
            .projection()
            .project_point3(Vec3::new(320.0, 240.0, 0.0));
        assert_near(clip.truncate().extend(0.0), Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn uniform_matches_projection() {
        let camera = Camera2D::new(100, 50);
        let uniform = camera.build_uniform();
        assert_eq!(
            Mat4::from_cols_array_2d(&uniform.view_proj),
            camera.projection()
        );
    }
}
