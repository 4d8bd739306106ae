//! Shop Configuration
//!
//! Loaded once at start-up from a TOML file. Every field has a default so an
//! empty (or missing) file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ShopError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// When false, item templates are stored at full durability so worn and
    /// pristine items trade as the same thing.
    pub check_item_durability: bool,
    /// Whether clients understand rich text (hover tooltips). Resolved once here
    /// instead of probing per message.
    pub rich_text: bool,
    /// Sentinel owner identity for administrative shops
    pub admin_owner: Uuid,
    pub admin_label: String,
    pub closed_label: String,
    pub currency_symbol: String,
    pub price_decimals: usize,
    pub tick_interval_ms: u64,
    pub data_dir: PathBuf,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            check_item_durability: false,
            rich_text: true,
            admin_owner: Uuid::nil(),
            admin_label: "admin".to_string(),
            closed_label: "CLOSED".to_string(),
            currency_symbol: "$".to_string(),
            price_decimals: 2,
            tick_interval_ms: 50, // 20 Hz
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ShopConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ShopError> {
        if !path.exists() {
            warn!("Config file {:?} does not exist, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ShopError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml(&contents).map_err(|reason| ShopError::Config {
            path: path.to_path_buf(),
            reason,
        })?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Format a price with the configured symbol and precision.
    pub fn format_price(&self, price: f64) -> String {
        format!("{}{:.*}", self.currency_symbol, self.price_decimals, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("signshop.toml");

        let toml_content = r#"
check_item_durability = true
rich_text = false
admin_label = "Server"
admin_owner = "00000000-0000-0000-0000-0000000000ad"
"#;
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = ShopConfig::load(&path).unwrap();
        assert!(config.check_item_durability);
        assert!(!config.rich_text);
        assert_eq!(config.admin_label, "Server");
        assert_eq!(config.admin_owner.as_u128(), 0xad);
        // Untouched fields keep their defaults
        assert_eq!(config.closed_label, "CLOSED");
        assert_eq!(config.tick_interval_ms, 50);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ShopConfig::load(&temp_dir.path().join("nope.toml")).unwrap();
        assert!(config.rich_text);
        assert_eq!(config.admin_owner, Uuid::nil());
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "rich_text = \"maybe\"").unwrap();
        assert!(matches!(ShopConfig::load(&path), Err(ShopError::Config { .. })));
    }

    #[test]
    fn test_format_price() {
        let config = ShopConfig::default();
        assert_eq!(config.format_price(10.0), "$10.00");
        assert_eq!(config.format_price(2.5), "$2.50");
    }
}
