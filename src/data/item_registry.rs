use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::item_def::{ItemDefinition, RawItemDefinition};
use crate::item::ItemStack;

/// Registry for all item definitions
pub struct ItemRegistry {
    items: HashMap<String, ItemDefinition>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    /// Load all item definitions from `<data_dir>/items/*.toml`
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), String> {
        let items_dir = data_dir.join("items");

        if !items_dir.exists() {
            warn!("Items directory does not exist: {:?}", items_dir);
            return Ok(());
        }

        let entries = std::fs::read_dir(&items_dir)
            .map_err(|e| format!("Failed to read items directory: {}", e))?;

        for entry in entries {
            let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "toml") {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

                // Parse as table of items
                let table: HashMap<String, RawItemDefinition> = toml::from_str(&content)
                    .map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;

                for (id, raw) in table {
                    if self.items.contains_key(&id) {
                        warn!("Duplicate item ID '{}' in {:?}, overwriting", id, path);
                    }
                    self.items.insert(id.clone(), ItemDefinition::from_raw(&id, &raw));
                }
            }
        }

        info!("Loaded {} item definitions", self.items.len());
        Ok(())
    }

    pub fn insert(&mut self, definition: ItemDefinition) {
        self.items.insert(definition.id.clone(), definition);
    }

    pub fn get(&self, id: &str) -> Option<&ItemDefinition> {
        self.items.get(id)
    }

    /// Build a stack for a known item, or `None` if the id is unknown.
    pub fn stack(&self, id: &str, amount: u32) -> Option<ItemStack> {
        self.items.get(id).map(|def| def.stack(amount))
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.items.keys()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_items_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let items_dir = temp_dir.path().join("items");
        std::fs::create_dir(&items_dir).unwrap();

        let toml_content = r#"
[emerald]
display_name = "Emerald"

[iron_sword]
max_stack = 1
max_durability = 250
"#;

        let mut file = std::fs::File::create(items_dir.join("basic.toml")).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();
        std::fs::write(items_dir.join("notes.txt"), "ignored").unwrap();

        let mut registry = ItemRegistry::new();
        registry.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        let sword = registry.stack("iron_sword", 1).unwrap();
        assert_eq!(sword.max_stack, 1);
        assert!(sword.has_durability());
        assert!(registry.stack("unknown", 1).is_none());
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = ItemRegistry::new();
        registry.load_from_directory(temp_dir.path()).unwrap();
        assert!(registry.is_empty());
    }
}
