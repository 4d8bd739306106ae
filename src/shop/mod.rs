pub mod context;
pub mod definition;
pub mod entity;
pub mod registry;
pub mod transaction;

pub use context::ShopContext;
pub use definition::{Placement, ShopType};
pub use entity::{DeleteReport, Shop, ShopState};
pub use registry::ShopRegistry;
pub use transaction::{Party, TransactionOutcome};
