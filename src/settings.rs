//! Settings management for the gesture server
//!
//! Handles loading/saving of the XML settings file. Only I/O plumbing is
//! configurable here; the gesture constants (smoothing alpha, grab hold
//! time, publish interval) are fixed design values in [`crate::gesture`].

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Server settings stored as XML in the user config directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "GestureServer")]
pub struct ServerSettings {
    /// WebSocket/REST listen port
    #[serde(rename = "apiPort", default = "default_api_port")]
    pub api_port: u16,

    /// Camera index to open per session (0 for default device)
    #[serde(rename = "cameraIndex", default)]
    pub camera_index: u32,

    /// Requested capture width
    #[serde(rename = "captureWidth", default = "default_capture_width")]
    pub capture_width: u32,

    /// Requested capture height
    #[serde(rename = "captureHeight", default = "default_capture_height")]
    pub capture_height: u32,

    /// Mirror captured frames horizontally (selfie view)
    #[serde(rename = "mirrorFrames", default = "default_mirror_frames")]
    pub mirror_frames: bool,

    /// Override for the ONNX model directory (default: search next to the
    /// executable, then the working directory)
    #[serde(rename = "modelDir", default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,

    /// Default log level filter when no environment override is set
    #[serde(rename = "logLevel", default = "default_log_level")]
    pub log_level: String,
}

/// Default API server port (the port the original tracking backend used)
fn default_api_port() -> u16 {
    8765
}

/// Default capture width
fn default_capture_width() -> u32 {
    640
}

/// Default capture height
fn default_capture_height() -> u32 {
    480
}

/// Default mirroring (selfie view on)
fn default_mirror_frames() -> bool {
    true
}

/// Default log level
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            camera_index: 0,
            capture_width: default_capture_width(),
            capture_height: default_capture_height(),
            mirror_frames: default_mirror_frames(),
            model_dir: None,
            log_level: default_log_level(),
        }
    }
}

impl ServerSettings {
    /// Clamp capture dimensions to sane minimums
    pub fn clamp_capture(&mut self) {
        self.capture_width = self.capture_width.max(64);
        self.capture_height = self.capture_height.max(64);
    }

    /// Get the settings file path
    fn get_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("GestureServer");
            p.push("settings.xml");
            p
        })
    }

    /// Load settings from the config directory, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::get_settings_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from an XML file
    pub fn load_from_file(path: &PathBuf) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(SettingsError::Io)?;
        let mut settings: Self = from_str(&contents).map_err(SettingsError::XmlParse)?;
        settings.clamp_capture();
        Ok(settings)
    }

    /// Save settings to an XML file
    pub fn save_to_file(&self, path: &PathBuf) -> Result<(), SettingsError> {
        let xml = to_string(self).map_err(SettingsError::XmlWrite)?;

        // Add XML declaration
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(SettingsError::Io)?;
        }
        fs::write(path, formatted).map_err(SettingsError::Io)?;
        Ok(())
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = Self::get_settings_path() else {
            return Err(SettingsError::NoConfigDir);
        };
        self.save_to_file(&path)
    }

    /// Resolved model directory override, if configured
    pub fn model_dir(&self) -> Option<PathBuf> {
        self.model_dir.as_ref().map(PathBuf::from)
    }
}

/// Settings-related errors
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    XmlParse(quick_xml::DeError),
    XmlWrite(quick_xml::SeError),
    NoConfigDir,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::XmlParse(e) => write!(f, "XML parse error: {}", e),
            SettingsError::XmlWrite(e) => write!(f, "XML write error: {}", e),
            SettingsError::NoConfigDir => write!(f, "Could not find config directory"),
        }
    }
}

impl std::error::Error for SettingsError {}
