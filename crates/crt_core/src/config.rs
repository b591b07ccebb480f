//! Demo configuration, loaded from JSON at startup and re-read on change.
//!
//! Every field has a default, so `{}` is a valid configuration and a missing
//! file falls back to the built-in settings. Bindings that the file leaves
//! out keep their default controls.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Deserialize;

use crate::input::{Button, InputList, Key};

pub const DEFAULT_CONFIG_PATH: &str = "assets/crt_demo.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Exit,
    ToggleCrt,
}

impl Action {
    pub const ALL: &'static [Action] = &[Action::Exit, Action::ToggleCrt];

    pub fn default_binding(self) -> InputList {
        match self {
            Self::Exit => InputList::new()
                .with_key(Key::Escape)
                .with_button(Button::Back),
            Self::ToggleCrt => InputList::new().with_key(Key::T).with_button(Button::Y),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DemoConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_texture_path")]
    pub texture_path: String,
    /// Where the startup CRT render is written. `null` skips the dump.
    #[serde(default = "default_capture_path")]
    pub capture_path: Option<String>,
    #[serde(default)]
    pub vsync: bool,
    #[serde(default = "default_true")]
    pub crt_enabled: bool,
    #[serde(default = "default_true")]
    pub show_fps: bool,
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 3],
    #[serde(default)]
    pub fps_overlay: FpsOverlaySettings,
    #[serde(default)]
    pub crt: CrtSettings,
    #[serde(default)]
    pub bindings: HashMap<Action, InputList>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let mut config = Self {
            window_title: default_window_title(),
            texture_path: default_texture_path(),
            capture_path: default_capture_path(),
            vsync: false,
            crt_enabled: true,
            show_fps: true,
            clear_color: default_clear_color(),
            fps_overlay: FpsOverlaySettings::default(),
            crt: CrtSettings::default(),
            bindings: HashMap::new(),
        };
        config.fill_default_bindings();
        config
    }
}

impl DemoConfig {
    pub fn binding(&self, action: Action) -> InputList {
        self.bindings
            .get(&action)
            .cloned()
            .unwrap_or_else(|| action.default_binding())
    }

    fn fill_default_bindings(&mut self) {
        for &action in Action::ALL {
            self.bindings
                .entry(action)
                .or_insert_with(|| action.default_binding());
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FpsOverlaySettings {
    pub position: [f32; 2],
    pub font_size: f32,
}

impl Default for FpsOverlaySettings {
    fn default() -> Self {
        Self {
            position: [5.0, 5.0],
            font_size: 14.0,
        }
    }
}

/// Tunables of the CRT-Lottes shader.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CrtSettings {
    /// Scanline sharpness, -8 soft to -16 hard.
    pub hard_scan: f32,
    /// Horizontal pixel sharpness, -2 soft to -4 hard.
    pub hard_pix: f32,
    pub warp_x: f32,
    pub warp_y: f32,
    pub mask_dark: f32,
    pub mask_light: f32,
    /// Non-zero filters in linear light.
    pub scale_in_linear_gamma: f32,
    /// 0 off, 1 compressed TV, 2 aperture grille, 3 stretched VGA, 4 VGA.
    pub shadow_mask: f32,
    pub bright_boost: f32,
    pub hard_bloom_scan: f32,
    pub hard_bloom_pix: f32,
    pub bloom_amount: f32,
    /// Kernel falloff exponent, 2.0 is Gaussian.
    pub shape: f32,
}

impl Default for CrtSettings {
    fn default() -> Self {
        Self {
            hard_scan: -8.0,
            hard_pix: -3.0,
            warp_x: 0.031,
            warp_y: 0.041,
            mask_dark: 0.5,
            mask_light: 1.5,
            scale_in_linear_gamma: 1.0,
            shadow_mask: 3.0,
            bright_boost: 1.0,
            hard_bloom_scan: -1.5,
            hard_bloom_pix: -2.0,
            bloom_amount: 0.15,
            shape: 2.0,
        }
    }
}

/// Polls a file's mtime so changes can be picked up at frame boundaries.
pub struct FileWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<DemoConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let mut config: DemoConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    config.fill_default_bindings();
    validate_config(&config)?;
    Ok(config)
}

/// Like `load_config_from_path`, but a missing file yields the defaults.
/// A file that exists and fails to parse or validate is still an error.
pub fn load_config_or_default(path: &Path) -> Result<DemoConfig, String> {
    if !path.exists() {
        log::warn!(
            "Config file '{}' not found, using built-in defaults",
            path.display()
        );
        return Ok(DemoConfig::default());
    }
    load_config_from_path(path)
}

/// Re-read the watched file if it changed since the last poll. Returns `None`
/// when nothing changed or the new contents fail to load, in which case the
/// caller keeps its current configuration.
pub fn reload_config(watcher: &mut FileWatcher) -> Option<DemoConfig> {
    if !watcher.should_reload() {
        return None;
    }
    match load_config_from_path(watcher.path()) {
        Ok(config) => {
            log::info!("Config reloaded from {}", watcher.path().display());
            Some(config)
        }
        Err(err) => {
            log::error!("Config reload failed, keeping previous config: {err}");
            None
        }
    }
}

fn validate_config(config: &DemoConfig) -> Result<(), String> {
    if config.texture_path.trim().is_empty() {
        return Err("Config validation failed: texture_path is empty".to_string());
    }
    if config.fps_overlay.font_size <= 0.0 {
        return Err("Config validation failed: fps_overlay.font_size must be > 0".to_string());
    }

    let crt = &config.crt;
    if crt.shape <= 0.0 {
        return Err("Config validation failed: crt.shape must be > 0".to_string());
    }
    if !(0.0..=4.0).contains(&crt.shadow_mask) {
        return Err(format!(
            "Config validation failed: crt.shadow_mask must be in 0..=4, got {}",
            crt.shadow_mask
        ));
    }
    for (name, value) in [
        ("mask_dark", crt.mask_dark),
        ("mask_light", crt.mask_light),
        ("bright_boost", crt.bright_boost),
        ("bloom_amount", crt.bloom_amount),
    ] {
        if value < 0.0 {
            return Err(format!(
                "Config validation failed: crt.{name} must be >= 0, got {value}"
            ));
        }
    }

    for (action, list) in &config.bindings {
        if list.is_empty() {
            log::warn!("Action {:?} has no bound keys or buttons", action);
        }
    }

    Ok(())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

fn default_window_title() -> String {
    "CRT Demo".to_string()
}

fn default_texture_path() -> String {
    "assets/textures/source.png".to_string()
}

fn default_capture_path() -> Option<String> {
    Some("img.png".to_string())
}

const fn default_true() -> bool {
    true
}

const fn default_clear_color() -> [f32; 3] {
    [0.392, 0.584, 0.929]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "crt_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_config_file(path: &Path, body: &str) {
        fs::write(path, body).expect("failed to write temp config file");
    }

    #[test]
    fn empty_object_yields_defaults() {
        let path = temp_file_path("empty");
        write_config_file(&path, "{}");

        let config = load_config_from_path(&path).expect("empty config should load");
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.capture_path.as_deref(), Some("img.png"));
        assert!(config.crt_enabled);
        assert!(!config.vsync);
        assert_eq!(config.crt.hard_scan, -8.0);
        assert_eq!(config.crt.shadow_mask, 3.0);
        assert_eq!(config.fps_overlay.position, [5.0, 5.0]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_crt_block_keeps_other_defaults() {
        let path = temp_file_path("partial_crt");
        write_config_file(
            &path,
            r#"{ "crt": { "warp_x": 0.0, "warp_y": 0.0, "shadow_mask": 2.0 } }"#,
        );

        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.crt.warp_x, 0.0);
        assert_eq!(config.crt.shadow_mask, 2.0);
        assert_eq!(config.crt.hard_pix, -3.0);
        assert_eq!(config.crt.bloom_amount, 0.15);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn null_capture_path_disables_capture() {
        let path = temp_file_path("no_capture");
        write_config_file(&path, r#"{ "capture_path": null }"#);

        let config = load_config_from_path(&path).expect("config should load");
        assert!(config.capture_path.is_none());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_bindings_fall_back_to_defaults() {
        let path = temp_file_path("bindings");
        write_config_file(
            &path,
            r#"{ "bindings": { "toggle_crt": { "keys": ["C"] } } }"#,
        );

        let config = load_config_from_path(&path).expect("config should load");
        assert_eq!(
            config.binding(Action::ToggleCrt),
            InputList::new().with_key(Key::C)
        );
        assert_eq!(config.binding(Action::Exit), Action::Exit.default_binding());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_out_of_range_shadow_mask() {
        let path = temp_file_path("bad_mask");
        write_config_file(&path, r#"{ "crt": { "shadow_mask": 7.0 } }"#);

        let err = load_config_from_path(&path).expect_err("shadow mask 7 should fail");
        assert!(err.contains("shadow_mask"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_negative_bloom() {
        let path = temp_file_path("bad_bloom");
        write_config_file(&path, r#"{ "crt": { "bloom_amount": -0.5 } }"#);

        let err = load_config_from_path(&path).expect_err("negative bloom should fail");
        assert!(err.contains("bloom_amount"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_zero_font_size() {
        let path = temp_file_path("bad_font");
        write_config_file(&path, r#"{ "fps_overlay": { "font_size": 0.0 } }"#);

        let err = load_config_from_path(&path).expect_err("zero font size should fail");
        assert!(err.contains("font_size"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_unknown_key_name() {
        let path = temp_file_path("bad_key");
        write_config_file(
            &path,
            r#"{ "bindings": { "exit": { "keys": ["NotAKey"] } } }"#,
        );

        let err = load_config_from_path(&path).expect_err("unknown key should fail");
        assert!(err.contains("Failed to parse config JSON"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = temp_file_path("missing");
        let _ = fs::remove_file(&path);

        let config = load_config_or_default(&path).expect("missing file should default");
        assert_eq!(config, DemoConfig::default());
        assert!(load_config_from_path(&path).is_err());
    }

    #[test]
    fn file_watcher_detects_newly_created_file() {
        let path = temp_file_path("watcher_create");
        let _ = fs::remove_file(&path);

        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload(), "missing file should not reload");

        write_config_file(&path, "{}");

        assert!(
            watcher.should_reload(),
            "creating file should trigger reload once"
        );
        assert!(
            !watcher.should_reload(),
            "without changes, second poll should not reload"
        );

        let _ = fs::remove_file(path);
    }

    #[test]
    fn reload_picks_up_changed_file() {
        let path = temp_file_path("reload_ok");
        let _ = fs::remove_file(&path);
        let mut watcher = FileWatcher::new(path.clone());
        assert!(reload_config(&mut watcher).is_none());

        write_config_file(&path, r#"{ "crt": { "shadow_mask": 1.0 } }"#);
        let config = reload_config(&mut watcher).expect("changed file should reload");
        assert_eq!(config.crt.shadow_mask, 1.0);
        assert!(reload_config(&mut watcher).is_none());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn reload_of_malformed_file_yields_nothing() {
        let path = temp_file_path("reload_bad");
        let _ = fs::remove_file(&path);
        let mut watcher = FileWatcher::new(path.clone());

        write_config_file(&path, r#"{ "crt": { "shape": "#);
        assert!(reload_config(&mut watcher).is_none());

        let _ = fs::remove_file(path);
    }
}
