pub mod camera;
pub mod capture;
pub mod crt_pipeline;
pub mod gpu_context;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use camera::{Camera2D, CameraUniform};
pub use capture::{render_to_image, save_png};
pub use crt_pipeline::{CrtPipeline, CrtUniform};
pub use gpu_context::GpuContext;
pub use sprite_pipeline::SpritePipeline;
pub use texture::Texture;
pub use vertex::{QuadMesh, SpriteVertex};
