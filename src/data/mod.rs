pub mod item_def;
pub mod item_registry;

pub use item_def::{ItemDefinition, RawItemDefinition};
pub use item_registry::ItemRegistry;
