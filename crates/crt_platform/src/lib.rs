pub mod gamepad;
pub mod keyboard;
pub mod window;

pub use gamepad::GamepadPoller;
pub use keyboard::map_key;
pub use window::{create_window, PlatformConfig};
