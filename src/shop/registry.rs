//! Shop Registry
//!
//! Owns every live shop, keyed by sign position.

use std::collections::HashMap;
use tracing::{debug, info};

use super::context::ShopContext;
use super::definition::ShopType;
use super::entity::{DeleteReport, Shop};
use super::transaction::TransactionOutcome;
use crate::error::ShopError;
use crate::player::Player;
use crate::world::BlockPos;

/// Registry for all live shops
pub struct ShopRegistry {
    shops: HashMap<BlockPos, Shop>,
}

impl ShopRegistry {
    /// Create a new empty shop registry
    pub fn new() -> Self {
        Self {
            shops: HashMap::new(),
        }
    }

    /// Register a shop. A sign can carry only one shop.
    pub fn add(&mut self, shop: Shop) -> Result<(), ShopError> {
        let pos = shop.sign_pos();
        if self.shops.contains_key(&pos) {
            return Err(ShopError::DuplicateShop(pos));
        }
        let siblings = self.sharing_storage(shop.storage_pos()).len();
        if siblings > 0 {
            debug!("Shop at {} shares storage {} with {} other shop(s)", pos, shop.storage_pos(), siblings);
        }
        self.shops.insert(pos, shop);
        Ok(())
    }

    /// Get a shop by sign position
    pub fn get(&self, sign: BlockPos) -> Option<&Shop> {
        self.shops.get(&sign)
    }

    /// Get a mutable shop by sign position
    pub fn get_mut(&mut self, sign: BlockPos) -> Option<&mut Shop> {
        self.shops.get_mut(&sign)
    }

    /// Deregister and delete the shop at `sign`.
    pub fn delete_shop(&mut self, sign: BlockPos, ctx: &mut ShopContext) -> Option<DeleteReport> {
        let shop = self.shops.remove(&sign)?;
        Some(shop.delete(ctx))
    }

    /// Sign positions of every shop whose storage is at `storage`.
    pub fn sharing_storage(&self, storage: BlockPos) -> Vec<BlockPos> {
        self.shops
            .values()
            .filter(|shop| shop.storage_pos() == storage)
            .map(Shop::sign_pos)
            .collect()
    }

    /// Run a transaction on the shop at `sign`. After a real (non dry-run)
    /// success, other shops on the same storage re-render their signs since
    /// their stock moved too. `None` if no shop is registered there.
    pub fn transact(
        &mut self,
        sign: BlockPos,
        ctx: &mut ShopContext,
        orders: u32,
        actor: &mut Player,
        dry_run: bool,
        requested: ShopType,
    ) -> Option<TransactionOutcome> {
        let shop = self.shops.get_mut(&sign)?;
        let storage = shop.storage_pos();
        let outcome = shop.execute_transaction(ctx, orders, actor, dry_run, requested);

        if outcome.is_success() && !dry_run {
            for sibling in self
                .shops
                .values_mut()
                .filter(|s| s.sign_pos() != sign && s.storage_pos() == storage)
            {
                sibling.update_sign(ctx);
            }
        }
        Some(outcome)
    }

    /// Re-render every sign (e.g. after loading or a config change)
    pub fn update_all_signs(&mut self, ctx: &mut ShopContext) {
        for shop in self.shops.values_mut() {
            shop.update_sign(ctx);
        }
        info!("Queued sign updates for {} shops", self.shops.len());
    }

    /// Check if a shop exists at the sign position
    pub fn contains(&self, sign: BlockPos) -> bool {
        self.shops.contains_key(&sign)
    }

    /// Get the number of shops in the registry
    pub fn len(&self) -> usize {
        self.shops.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.shops.is_empty()
    }
}

impl Default for ShopRegistry {
    fn default() -> Self {
        Self::new()
    }
}
