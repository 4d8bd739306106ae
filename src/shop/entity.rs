//! Shop Entity
//!
//! One `Shop` per wall sign. The storage container sits directly behind the
//! sign. Item templates are owned by the shop; everything handed out is a
//! copy. Deleting a shop consumes it, so nothing can touch it afterwards.

use tracing::{debug, info};
use uuid::Uuid;

use super::context::ShopContext;
use super::definition::{Placement, ShopType};
use super::transaction::{handler_for, Order, Parties, TransactionOutcome};
use crate::config::ShopConfig;
use crate::display::Display;
use crate::error::ShopError;
use crate::item::{Inventory, ItemStack};
use crate::message::{error_style, strip_formatting, InfoLine, ShopSummary, RED};
use crate::player::Player;
use crate::scheduler::SignWrite;
use crate::world::{BlockPos, Facing, InventoryResolver, Location};

/// Pitch actors are left looking at after a teleport to a shop
const TELEPORT_PITCH: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopState {
    /// No primary item yet; renders in error style and refuses trades
    Uninitialized,
    Initialized,
}

/// What `delete` managed to clean up. Each step runs regardless of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    pub display_removed: bool,
    pub sign_cleared: bool,
    pub writes_cancelled: usize,
}

#[derive(Debug)]
pub struct Shop {
    sign_pos: BlockPos,
    storage_pos: BlockPos,
    facing: Facing,
    owner: Uuid,
    item: Option<ItemStack>,
    secondary_item: Option<ItemStack>,
    price: f64,
    price_combo: f64,
    amount: u32,
    admin: bool,
    shop_type: ShopType,
    sign_lines: [String; 4],
    display: Display,
}

fn check_price(price: f64) -> Result<f64, ShopError> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(ShopError::InvalidPrice(price))
    }
}

impl Shop {
    /// Build the shop for a freshly placed sign.
    pub fn create(ctx: &ShopContext, placement: Placement) -> Result<Self, ShopError> {
        if placement.amount == 0 {
            return Err(ShopError::InvalidAmount(placement.amount));
        }
        let price = check_price(placement.price)?;
        let price_combo = match placement.shop_type {
            ShopType::Combo => check_price(placement.price_combo)?,
            _ => 0.0,
        };
        let facing = ctx
            .world
            .sign_facing(placement.sign)
            .ok_or(ShopError::NotASign(placement.sign))?;
        let owner = if placement.admin {
            ctx.config.admin_owner
        } else {
            placement.owner
        };

        let shop = Self {
            sign_pos: placement.sign,
            storage_pos: placement.sign.relative(facing.opposite()),
            facing,
            owner,
            item: None,
            secondary_item: None,
            price,
            price_combo,
            amount: placement.amount,
            admin: placement.admin,
            shop_type: placement.shop_type,
            sign_lines: Default::default(),
            display: Display::spawn(placement.sign),
        };

        info!(
            "Created {} shop at {} (storage {}, owner {}, admin {})",
            shop.shop_type, shop.sign_pos, shop.storage_pos, shop.owner, shop.admin
        );
        Ok(shop)
    }

    // ------------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------------

    pub fn sign_pos(&self) -> BlockPos {
        self.sign_pos
    }

    pub fn storage_pos(&self) -> BlockPos {
        self.storage_pos
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn shop_type(&self) -> ShopType {
        self.shop_type
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn price_combo(&self) -> f64 {
        self.price_combo
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Last rendered sign text (not necessarily applied to the block yet).
    pub fn sign_lines(&self) -> &[String; 4] {
        &self.sign_lines
    }

    pub fn is_initialized(&self) -> bool {
        self.item.is_some()
    }

    pub fn state(&self) -> ShopState {
        if self.is_initialized() {
            ShopState::Initialized
        } else {
            ShopState::Uninitialized
        }
    }

    /// Owner usable for owner-keyed storage. Administrative shops have none.
    fn storage_owner(&self) -> Option<Uuid> {
        if self.admin { None } else { Some(self.owner) }
    }

    pub fn inventory<'c>(&self, ctx: &'c ShopContext) -> Option<&'c Inventory> {
        ctx.world.resolve(self.storage_pos, self.storage_owner())
    }

    /// Complete batches in storage.
    pub fn stock(&self, ctx: &ShopContext) -> u32 {
        match (self.inventory(ctx), self.item.as_ref()) {
            (Some(inventory), Some(item)) => {
                inventory.count_matching_with(item, ctx.config.check_item_durability) / self.amount
            }
            _ => 0,
        }
    }

    /// Copy of the primary item with the amount set to one batch.
    pub fn item_stack(&self) -> Option<ItemStack> {
        self.item.as_ref().map(|item| item.with_amount(self.amount))
    }

    /// Copy of the barter item with the amount set to the integer part of the price.
    pub fn secondary_item_stack(&self) -> Option<ItemStack> {
        self.secondary_item
            .as_ref()
            .map(|item| item.with_amount(self.price.max(0.0) as u32))
    }

    pub fn item_durability_percent(&self) -> Option<u32> {
        self.item.as_ref().map(ItemStack::durability_percent)
    }

    pub fn secondary_item_durability_percent(&self) -> Option<u32> {
        self.secondary_item.as_ref().map(ItemStack::durability_percent)
    }

    pub fn owner_name(&self, ctx: &ShopContext) -> String {
        if self.admin {
            return ctx.config.admin_label.clone();
        }
        match ctx.world.player_name(self.owner) {
            Some(name) => name.to_string(),
            None => format!("{}{}", RED, ctx.config.closed_label),
        }
    }

    pub fn price_string(&self, config: &ShopConfig) -> String {
        config.format_price(self.price)
    }

    pub fn price_per_item(&self) -> f64 {
        self.price / self.amount as f64
    }

    pub fn price_per_item_string(&self, config: &ShopConfig) -> String {
        config.format_price(self.price_per_item())
    }

    pub fn summary(&self, ctx: &ShopContext) -> ShopSummary {
        let stock = self.stock(ctx);
        let hands_out_items = !matches!(self.shop_type, ShopType::Buy);
        ShopSummary {
            shop_type: self.shop_type,
            item: self.item.as_ref().map(ItemStack::display_name),
            barter_item: self.secondary_item.as_ref().map(ItemStack::display_name),
            amount: self.amount,
            barter_amount: self.price.max(0.0) as u32,
            price: self.price_string(&ctx.config),
            price_combo: ctx.config.format_price(self.price_combo),
            price_per_item: self.price_per_item_string(&ctx.config),
            owner: self.owner_name(ctx),
            stock,
            out_of_stock: self.is_initialized() && !self.admin && hands_out_items && stock == 0,
            admin: self.admin,
            initialized: self.is_initialized(),
        }
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    fn normalize(mut item: ItemStack, config: &ShopConfig) -> ItemStack {
        if !config.check_item_durability && item.has_durability() {
            item.repair();
        }
        item
    }

    /// Set the primary item template. The first call initializes the shop.
    pub fn set_item_stack(&mut self, item: ItemStack, config: &ShopConfig) {
        self.item = Some(Self::normalize(item, config));
    }

    pub fn set_secondary_item_stack(&mut self, item: ItemStack, config: &ShopConfig) {
        self.secondary_item = Some(Self::normalize(item, config));
    }

    pub fn set_owner(&mut self, owner: Uuid) {
        self.owner = owner;
    }

    pub fn set_price(&mut self, price: f64) -> Result<(), ShopError> {
        self.price = check_price(price)?;
        Ok(())
    }

    pub fn set_price_combo(&mut self, price_combo: f64) -> Result<(), ShopError> {
        self.price_combo = check_price(price_combo)?;
        Ok(())
    }

    pub fn set_amount(&mut self, amount: u32) -> Result<(), ShopError> {
        if amount == 0 {
            return Err(ShopError::InvalidAmount(amount));
        }
        self.amount = amount;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Sign synchronization
    // ------------------------------------------------------------------------

    fn render_lines(&self, ctx: &ShopContext) -> [String; 4] {
        ctx.formatter.sign_lines(&self.summary(ctx), self.shop_type)
    }

    /// Re-render the sign now; the block itself is written on the next tick.
    pub fn update_sign(&mut self, ctx: &mut ShopContext) {
        self.sign_lines = self.render_lines(ctx);
        let lines = if self.is_initialized() {
            self.sign_lines.clone()
        } else {
            self.sign_lines.clone().map(|line| error_style(&line))
        };
        ctx.scheduler.defer_one_tick(SignWrite {
            sign: self.sign_pos,
            lines,
        });
    }

    // ------------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------------

    /// Run `orders` batches in the `requested` direction. With `dry_run` only
    /// feasibility is checked and nothing changes.
    pub fn execute_transaction(
        &mut self,
        ctx: &mut ShopContext,
        orders: u32,
        actor: &mut Player,
        dry_run: bool,
        requested: ShopType,
    ) -> TransactionOutcome {
        if orders == 0 {
            return TransactionOutcome::InvalidOrder;
        }
        let Some(item) = self.item_stack() else {
            return TransactionOutcome::UninitializedShop;
        };
        if !self.shop_type.accepts(requested) {
            return TransactionOutcome::PolicyMismatch;
        }

        let order = Order {
            owner: self.owner,
            admin: self.admin,
            item,
            secondary: self.secondary_item_stack(),
            price: self.price,
            price_combo: self.price_combo,
            amount: self.amount,
            orders,
            dry_run,
            requested,
            check_durability: ctx.config.check_item_durability,
        };

        let outcome = {
            let ShopContext { world, economy, rng, .. } = &mut *ctx;
            let storage = world.resolve_mut(self.storage_pos, self.storage_owner());
            if storage.is_none() && !self.admin {
                return TransactionOutcome::InvalidStorage;
            }
            let mut parties = Parties {
                storage,
                actor: &mut *actor,
                economy,
                rng: &mut **rng,
            };
            handler_for(self.shop_type)(&order, &mut parties)
        };

        if outcome.is_success() && !dry_run {
            info!(
                "{} {} {}x{} at {} ({} order(s))",
                actor.name,
                requested.as_str(),
                order.quantity(),
                order.item.kind,
                self.sign_pos,
                orders
            );
            if self.render_lines(ctx) != self.sign_lines {
                self.update_sign(ctx);
            }
        }
        outcome
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Tear the shop down: remove the display, drop pending sign writes and
    /// blank the sign immediately. Every step is attempted even if another
    /// finds nothing to do. Callers holding the shop in a registry go through
    /// [`ShopRegistry::delete_shop`](super::ShopRegistry::delete_shop).
    pub fn delete(mut self, ctx: &mut ShopContext) -> DeleteReport {
        let display_removed = self.display.remove();
        let writes_cancelled = ctx.scheduler.cancel(self.sign_pos);
        let sign_cleared = ctx.world.sign_facing(self.sign_pos).is_some()
            && ctx.world.write_sign(self.sign_pos, Default::default());

        info!("Deleted {} shop at {}", self.shop_type, self.sign_pos);
        DeleteReport {
            display_removed,
            sign_cleared,
            writes_cancelled,
        }
    }

    /// Move `actor` to stand in front of the sign, looking at it.
    /// Returns false when there is no actor or the sign is gone.
    pub fn teleport(&self, ctx: &ShopContext, actor: Option<&mut Player>) -> bool {
        let Some(actor) = actor else {
            return false;
        };
        let Some(facing) = ctx.world.sign_facing(self.sign_pos) else {
            debug!("Sign at {} is gone, not teleporting {}", self.sign_pos, actor.name);
            return false;
        };

        let mut location = Location::centered(self.sign_pos.relative(facing));
        location.yaw = facing.opposite().yaw();
        location.pitch = TELEPORT_PITCH;
        actor.teleport(location);
        true
    }

    // ------------------------------------------------------------------------
    // Sales information
    // ------------------------------------------------------------------------

    /// Without rich text every line goes out stripped and without a tooltip.
    fn info_line(&self, ctx: &ShopContext, text: String, item: Option<&ItemStack>) -> InfoLine {
        if !ctx.config.rich_text {
            return InfoLine::plain(strip_formatting(&text));
        }
        InfoLine {
            text,
            tooltip: item.and_then(|item| serde_json::to_string(item).ok()),
        }
    }

    /// Description lines shown to an actor inspecting the shop.
    pub fn sales_info(&self, ctx: &ShopContext, actor: &Player) -> Vec<InfoLine> {
        let summary = self.summary(ctx);
        let category = self.shop_type.as_str();
        let actor_name = Some(actor.name.as_str());
        let render = |category: &str, key: &str| ctx.formatter.render(category, key, &summary, actor_name);

        let mut lines = vec![InfoLine::blank()];
        if let Some(text) = render(category, "descriptionItem") {
            let item = self.item_stack();
            lines.push(self.info_line(ctx, text, item.as_ref()));
        }
        if self.shop_type == ShopType::Barter {
            if let Some(text) = render(category, "descriptionBarterItem") {
                let item = self.secondary_item_stack();
                lines.push(self.info_line(ctx, text, item.as_ref()));
            }
        }
        lines.push(InfoLine::blank());

        if self.price != 0.0 {
            for key in ["descriptionPrice", "descriptionPricePerItem"] {
                if let Some(text) = render(category, key) {
                    lines.push(self.info_line(ctx, text, None));
                }
            }
            lines.push(InfoLine::blank());
        }

        let stock_key = if self.admin { "stockAdmin" } else { "stock" };
        if let Some(text) = render("description", stock_key) {
            lines.push(self.info_line(ctx, text, None));
        }
        lines
    }
}
