use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::document::DocumentDefaults;
use super::style::{CharAttrs, Color, MAX_FONT_SIZE, ParagraphAttrs};
use crate::app::error::AppError;
use crate::app::services::text_ops::SearchOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default)]
    pub text_color: Color,

    /// Paragraph spacing above, in points.
    #[serde(default)]
    pub space_above: f32,

    /// Paragraph spacing below, in points.
    #[serde(default)]
    pub space_below: f32,

    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,

    #[serde(default)]
    pub match_case: bool,

    #[serde(default)]
    pub whole_word: bool,

    #[serde(default)]
    pub last_open_directory: Option<String>,
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    12
}

fn default_undo_limit() -> usize {
    100
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
            text_color: Color::BLACK,
            space_above: 0.0,
            space_below: 0.0,
            undo_limit: default_undo_limit(),
            match_case: false,
            whole_word: false,
            last_open_directory: None,
        }
    }
}

impl AppSettings {
    pub fn char_attrs(&self) -> CharAttrs {
        CharAttrs::new(self.font_family.clone(), self.font_size, self.text_color)
    }

    pub fn document_defaults(&self) -> DocumentDefaults {
        DocumentDefaults {
            char_attrs: self.char_attrs(),
            paragraph: ParagraphAttrs::new(self.space_above, self.space_below),
            undo_limit: self.undo_limit,
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            case_sensitive: self.match_case,
            whole_word: self.whole_word,
        }
    }

    /// Reject values the editor cannot use.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.font_family.trim().is_empty() {
            return Err(AppError::Settings("font family is empty".to_string()));
        }
        if self.font_size == 0 || self.font_size > MAX_FONT_SIZE {
            return Err(AppError::Settings("invalid font size".to_string()));
        }
        if !(self.space_above >= 0.0 && self.space_below >= 0.0) {
            return Err(AppError::Settings("negative paragraph spacing".to_string()));
        }
        Ok(())
    }

    /// Load settings from disk, or create default if not exists
    pub fn load() -> Self {
        Self::load_from(&Self::get_config_path())
    }

    pub fn load_from(config_path: &Path) -> Self {
        match fs::read_to_string(config_path) {
            Ok(contents) => {
                match serde_json::from_str::<Self>(&contents)
                    .map_err(AppError::from)
                    .and_then(|s| s.validate().map(|_| s))
                {
                    Ok(settings) => settings,
                    Err(e) => {
                        tracing::warn!("Failed to parse settings: {}. Using defaults.", e);
                        Self::default()
                    }
                }
            }
            Err(_) => {
                // File doesn't exist, use defaults
                let default = Self::default();
                // Try to save defaults for next time
                if let Err(e) = default.save_to(config_path) {
                    tracing::debug!("Could not write default settings: {}", e);
                }
                default
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), AppError> {
        self.save_to(&Self::get_config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), AppError> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(config_path, json)?;

        Ok(())
    }

    /// Get config file path (cross-platform)
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("richpad");
        path.push("settings.json");
        path
    }
}
