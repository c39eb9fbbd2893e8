//! Configuration system
//!
//! `RenderCoreConfig` describes everything the bootstrap needs from the
//! application: naming, the requested window extent, validation, the depth
//! format and how the render pass treats its attachments. It can be loaded
//! from and saved to TOML or RON.

use ash::vk;
pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values parsed fine but do not make sense together
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Depth formats the depth buffer may be created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    /// Let the provisioner pick its default (16-bit depth)
    #[default]
    Unset,
    /// `D16_UNORM`
    D16Unorm,
    /// `D16_UNORM_S8_UINT`
    D16UnormS8Uint,
    /// `D24_UNORM_S8_UINT`
    D24UnormS8Uint,
    /// `D32_SFLOAT`
    D32Sfloat,
    /// `D32_SFLOAT_S8_UINT`
    D32SfloatS8Uint,
}

impl DepthFormat {
    /// Vulkan format for this choice; `Unset` maps to `UNDEFINED`
    pub const fn to_vk(self) -> vk::Format {
        match self {
            Self::Unset => vk::Format::UNDEFINED,
            Self::D16Unorm => vk::Format::D16_UNORM,
            Self::D16UnormS8Uint => vk::Format::D16_UNORM_S8_UINT,
            Self::D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
            Self::D32Sfloat => vk::Format::D32_SFLOAT,
            Self::D32SfloatS8Uint => vk::Format::D32_SFLOAT_S8_UINT,
        }
    }
}

/// Window parameters handed to the presentation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Requested width in pixels
    pub width: u32,
    /// Requested height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Render Core".to_string(),
            width: 640,
            height: 480,
        }
    }
}

/// Render pass options
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderPassConfig {
    /// Attach the depth buffer to the subpass
    pub include_depth: bool,
    /// Clear attachments on load instead of preserving their contents
    pub clear: bool,
}

impl Default for RenderPassConfig {
    fn default() -> Self {
        Self {
            include_depth: true,
            clear: true,
        }
    }
}

/// # Render Core Configuration
///
/// Top-level configuration for context bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderCoreConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Application version (major, minor, patch)
    pub application_version: (u32, u32, u32),
    /// Window title and requested extent
    pub window: WindowConfig,
    /// Whether to enable Vulkan validation layers (None = by build type)
    pub enable_validation: Option<bool>,
    /// Additional instance layers to enable by name
    pub instance_layers: Vec<String>,
    /// Depth buffer format
    pub depth_format: DepthFormat,
    /// Render pass attachment options
    pub render_pass: RenderPassConfig,
    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
}

impl RenderCoreConfig {
    /// Create a new configuration with defaults
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            application_version: (1, 0, 0),
            window: WindowConfig::default(),
            enable_validation: None,
            instance_layers: Vec::new(),
            depth_format: DepthFormat::Unset,
            render_pass: RenderPassConfig::default(),
            log_level: "info".to_string(),
        }
    }

    /// Set application version
    pub fn with_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.application_version = (major, minor, patch);
        self
    }

    /// Set the requested window extent
    pub fn with_extent(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Set the window title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    /// Enable or disable validation layers
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = Some(enabled);
        self
    }

    /// Choose the depth buffer format
    pub fn with_depth_format(mut self, format: DepthFormat) -> Self {
        self.depth_format = format;
        self
    }

    /// Set render pass options
    pub fn with_render_pass(mut self, include_depth: bool, clear: bool) -> Self {
        self.render_pass = RenderPassConfig {
            include_depth,
            clear,
        };
        self
    }

    /// Set the default log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Whether validation ends up enabled for this build
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid(
                "Application name cannot be empty".to_string(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Window extent must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if self.instance_layers.iter().any(|name| name.contains('\0')) {
            return Err(ConfigError::Invalid(
                "Instance layer names cannot contain NUL bytes".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for RenderCoreConfig {
    fn default() -> Self {
        Self::new("Render Core Application")
    }
}

impl Config for RenderCoreConfig {}
