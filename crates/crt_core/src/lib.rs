pub mod config;
pub mod input;
pub mod time;

pub use config::{reload_config, Action, CrtSettings, DemoConfig, FileWatcher, FpsOverlaySettings};
pub use input::{Button, GamePadState, Input, InputList, Key, KeyboardState};
pub use time::{FrameClock, FrameRateCounter};
