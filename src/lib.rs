//! Sign shops: wall signs bound to the container behind them that sell,
//! buy, barter, gamble or combine sell and buy for a single item kind.

pub mod config;
pub mod console;
pub mod data;
pub mod display;
pub mod economy;
pub mod error;
pub mod item;
pub mod message;
pub mod player;
pub mod scheduler;
pub mod shop;
pub mod world;

pub use config::ShopConfig;
pub use error::ShopError;
pub use item::{Inventory, ItemStack};
pub use shop::{Placement, Shop, ShopContext, ShopRegistry, ShopType, TransactionOutcome};
pub use world::{BlockPos, BlockWorld, Facing};
