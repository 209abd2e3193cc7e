//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Initial camera placement and projection.
    pub camera: CameraConfig,
    /// Orbit camera controls.
    pub controls: ControlsConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Texture lookup settings.
    pub assets: AssetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Starting camera position in world units.
    pub position: [f32; 3],
}

/// Orbit controls configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Smooth camera motion by carrying a decaying share of input into later frames.
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per frame when damping is enabled.
    pub damping_factor: f32,
    /// Zoom speed multiplier for scroll input.
    pub zoom_speed: f32,
    /// Rotation speed multiplier for drag input.
    pub rotate_speed: f32,
    /// Closest allowed distance to the orbit target.
    pub min_distance: f32,
    /// Farthest allowed distance from the orbit target.
    pub max_distance: f32,
    /// Invert vertical drag direction.
    pub invert_y: bool,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Request multisample antialiasing.
    pub antialias: bool,
    /// MSAA sample count used when antialiasing is on (1 or 4).
    pub msaa_samples: u32,
    /// Upper bound for the device pixel ratio used to size the render surface.
    pub max_pixel_ratio: f64,
    /// Prefer a surface with a non-opaque alpha mode.
    pub transparent: bool,
    /// Clear color (sRGB hex) shown until the background texture resolves.
    pub clear_color: u32,
}

/// Texture lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding `<name>.jpg` textures for the sun, planets and background.
    pub texture_dir: PathBuf,
    /// File extension appended to texture keys.
    pub texture_extension: String,
    /// Number of background decode threads.
    pub loader_threads: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Start the HTTP debug panel in debug builds.
    pub panel_enabled: bool,
    /// Port for the HTTP debug panel.
    pub panel_port: u16,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Orrery - Solar System".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 55.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 15.0, 100.0],
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            zoom_speed: 0.5,
            rotate_speed: 1.0,
            min_distance: 12.0,
            max_distance: 400.0,
            invert_y: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            msaa_samples: 4,
            max_pixel_ratio: 2.0,
            transparent: true,
            clear_color: 0x000000,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            texture_dir: PathBuf::from("textures"),
            texture_extension: "jpg".to_string(),
            loader_threads: 2,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            panel_enabled: true,
            panel_port: 9999,
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// The OS configuration directory for the viewer, if the platform exposes one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("orrery"))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
