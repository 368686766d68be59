// Engine settings
// Loaded from ~/.config/mergegrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // History
    #[serde(rename = "history.maxEntries")]
    pub history_max_entries: usize,

    // Grid
    #[serde(rename = "grid.defaultValue")]
    pub default_value: String,

    #[serde(rename = "grid.initRows")]
    pub init_rows: usize,

    #[serde(rename = "grid.initCols")]
    pub init_cols: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // History
            history_max_entries: 100,
            // Grid
            default_value: String::new(),
            init_rows: 4,
            init_cols: 4,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mergegrid");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file();
            return settings;
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                eprintln!("Error reading settings.json: {}", e);
                Self::default()
            }
        }
    }

    /// Parse settings text, stripping comment lines (starting with //)
    pub fn parse(contents: &str) -> Self {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        match serde_json::from_str(&cleaned) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error parsing settings.json: {}", e);
                eprintln!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(&path, json).map_err(|e| e.to_string())
    }

    /// Create default settings file with comments
    fn create_default_file(&self) {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Undo/redo history depth
    "history.maxEntries": 100,

    // Text given to freshly created cells
    "grid.defaultValue": "",

    // Dimensions of a newly seeded table
    "grid.initRows": 4,
    "grid.initCols": 4
}
"#;

        if let Err(e) = fs::write(&path, default_config) {
            eprintln!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.history_max_entries, 100);
        assert_eq!(settings.default_value, "");
        assert_eq!(settings.init_rows, 4);
        assert_eq!(settings.init_cols, 4);
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let settings = Settings::parse(r#"{"history.maxEntries": 25}"#);
        assert_eq!(settings.history_max_entries, 25);
        assert_eq!(settings.init_rows, 4);
    }

    #[test]
    fn test_parse_strips_comment_lines() {
        let settings = Settings::parse(
            "{\n// a comment\n\"grid.defaultValue\": \"Cell\",\n\"grid.initRows\": 8\n}",
        );
        assert_eq!(settings.default_value, "Cell");
        assert_eq!(settings.init_rows, 8);
    }

    #[test]
    fn test_parse_garbage_falls_back_to_defaults() {
        let settings = Settings::parse("not json at all");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut settings = Settings::default();
        settings.history_max_entries = 7;
        settings.default_value = "x".into();

        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::parse(&json), settings);
    }
}
