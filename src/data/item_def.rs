use serde::Deserialize;

use crate::item::ItemStack;

// ============================================================================
// Raw Item Definition (direct from TOML)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawItemDefinition {
    pub display_name: Option<String>,
    pub max_stack: Option<u32>,
    /// Hits before the item breaks; absent for items without durability
    pub max_durability: Option<u16>,
    #[serde(default)]
    pub tradeable: Option<bool>,
}

// ============================================================================
// Resolved Item Definition
// ============================================================================

#[derive(Debug, Clone)]
pub struct ItemDefinition {
    pub id: String,
    pub display_name: String,
    pub max_stack: u32,
    pub max_durability: u16,
    pub tradeable: bool,
}

impl ItemDefinition {
    pub fn from_raw(id: &str, raw: &RawItemDefinition) -> Self {
        Self {
            id: id.to_string(),
            display_name: raw.display_name.clone()
                .unwrap_or_else(|| id.replace('_', " ")),
            max_stack: raw.max_stack.unwrap_or(64).max(1),
            max_durability: raw.max_durability.unwrap_or(0),
            tradeable: raw.tradeable.unwrap_or(true),
        }
    }

    /// Fresh, undamaged stack of this item.
    pub fn stack(&self, amount: u32) -> ItemStack {
        ItemStack::new(&self.id, amount)
            .with_max_stack(self.max_stack)
            .with_durability(0, self.max_durability)
            .with_meta("name", &self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_defaults() {
        let toml_str = r#"
            [iron_sword]
            display_name = "Iron Sword"
            max_stack = 1
            max_durability = 250

            [dirt]
        "#;

        let parsed: std::collections::HashMap<String, RawItemDefinition> =
            toml::from_str(toml_str).unwrap();

        let sword = ItemDefinition::from_raw("iron_sword", &parsed["iron_sword"]);
        assert_eq!(sword.max_stack, 1);
        assert_eq!(sword.max_durability, 250);
        assert!(sword.tradeable);

        let dirt = ItemDefinition::from_raw("dirt", &parsed["dirt"]);
        assert_eq!(dirt.display_name, "dirt");
        assert_eq!(dirt.max_stack, 64);
        assert!(!dirt.stack(3).has_durability());
    }
}
