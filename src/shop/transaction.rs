//! Shop Transactions
//!
//! One free function per [`ShopType`], looked up through [`handler_for`].
//! Handlers never touch live state directly: they work on a [`Ledger`] drafted
//! from copies of the storage, the actor's inventory and both balances, and
//! the draft is committed only when every step succeeded and the call is not
//! a dry run.

use rand::{Rng, RngCore};
use tracing::debug;
use uuid::Uuid;

use super::definition::ShopType;
use crate::economy::Economy;
use crate::item::{Inventory, ItemStack};
use crate::player::Player;

/// Slack for float comparisons on balances
const FUNDS_EPSILON: f64 = 1e-9;

/// Which side of the trade came up short on money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Actor,
    Owner,
}

/// Classified result of a transaction attempt. Failures are values, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Success,
    /// Shop storage doesn't hold enough of what it hands out
    InsufficientStock,
    InsufficientFunds { payer: Party },
    /// Actor doesn't carry enough of what it offers
    InsufficientItems,
    /// Shop storage can't take what the actor hands over
    InsufficientStorageSpace,
    ActorInventoryFull,
    /// Requested direction doesn't match the shop's policy
    PolicyMismatch,
    UninitializedShop,
    /// Storage coordinate no longer resolves to an inventory
    InvalidStorage,
    /// Order count of zero
    InvalidOrder,
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Success)
    }

    /// Message key for the formatter's "transaction" category.
    pub fn message_key(&self) -> &'static str {
        match self {
            TransactionOutcome::Success => "success",
            TransactionOutcome::InsufficientStock => "insufficientStock",
            TransactionOutcome::InsufficientFunds { payer: Party::Actor } => "insufficientFundsPlayer",
            TransactionOutcome::InsufficientFunds { payer: Party::Owner } => "insufficientFundsShop",
            TransactionOutcome::InsufficientItems => "insufficientItems",
            TransactionOutcome::InsufficientStorageSpace => "storageFull",
            TransactionOutcome::ActorInventoryFull => "inventoryFull",
            TransactionOutcome::PolicyMismatch => "policyMismatch",
            TransactionOutcome::UninitializedShop => "uninitialized",
            TransactionOutcome::InvalidStorage => "invalidStorage",
            TransactionOutcome::InvalidOrder => "invalidOrder",
        }
    }
}

// ============================================================================
// Order and Parties
// ============================================================================

/// Immutable terms of one transaction call, snapshotted from the shop.
#[derive(Debug, Clone)]
pub struct Order {
    pub owner: Uuid,
    /// Administrative shops have unlimited stock, space and money
    pub admin: bool,
    pub item: ItemStack,
    pub secondary: Option<ItemStack>,
    pub price: f64,
    pub price_combo: f64,
    /// Batch size of the primary item
    pub amount: u32,
    pub orders: u32,
    pub dry_run: bool,
    pub requested: ShopType,
    /// When false, worn and pristine copies of an item are interchangeable
    pub check_durability: bool,
}

impl Order {
    /// Primary item units moved.
    pub fn quantity(&self) -> u32 {
        self.orders.saturating_mul(self.amount)
    }

    fn cost(&self, price: f64) -> f64 {
        self.orders as f64 * price
    }

    /// Secondary item units the actor pays in a barter (integer part of the price per batch).
    pub fn barter_quantity(&self) -> u32 {
        self.orders.saturating_mul(self.price.max(0.0) as u32)
    }
}

/// Mutable state a transaction may touch.
pub struct Parties<'a> {
    pub storage: Option<&'a mut Inventory>,
    pub actor: &'a mut Player,
    pub economy: &'a mut Economy,
    pub rng: &'a mut dyn RngCore,
}

pub type TransactionHandler = fn(&Order, &mut Parties<'_>) -> TransactionOutcome;

pub fn handler_for(shop_type: ShopType) -> TransactionHandler {
    match shop_type {
        ShopType::Sell => sell,
        ShopType::Buy => buy,
        ShopType::Barter => barter,
        ShopType::Gamble => gamble,
        ShopType::Combo => combo,
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Draft copy of everything a transaction can change.
struct Ledger {
    storage: Inventory,
    unlimited: bool,
    check_durability: bool,
    actor_items: Inventory,
    actor_balance: f64,
    owner_balance: f64,
    actor_delta: f64,
    owner_delta: f64,
}

type Step = Result<(), TransactionOutcome>;

impl Ledger {
    fn open(order: &Order, parties: &Parties<'_>) -> Result<Self, TransactionOutcome> {
        let storage = match parties.storage.as_deref() {
            Some(inventory) => inventory.clone(),
            None if order.admin => Inventory::new(0),
            None => return Err(TransactionOutcome::InvalidStorage),
        };
        Ok(Self {
            storage,
            unlimited: order.admin,
            check_durability: order.check_durability,
            actor_items: parties.actor.inventory.clone(),
            actor_balance: parties.economy.balance(parties.actor.id),
            owner_balance: parties.economy.balance(order.owner),
            actor_delta: 0.0,
            owner_delta: 0.0,
        })
    }

    /// Units leave storage as stored; an unlimited storage hands out template copies.
    fn storage_take(&mut self, item: &ItemStack, quantity: u32) -> Result<Vec<ItemStack>, TransactionOutcome> {
        if self.unlimited {
            return Ok(if quantity == 0 { Vec::new() } else { vec![item.with_amount(quantity)] });
        }
        if self.storage.count_matching_with(item, self.check_durability) < quantity {
            return Err(TransactionOutcome::InsufficientStock);
        }
        Ok(self.storage.take_matching(item, quantity, self.check_durability))
    }

    fn storage_put(&mut self, stacks: &[ItemStack]) -> Step {
        if self.unlimited {
            return Ok(());
        }
        if self.storage.add_stacks(stacks) > 0 {
            return Err(TransactionOutcome::InsufficientStorageSpace);
        }
        Ok(())
    }

    fn actor_take(&mut self, item: &ItemStack, quantity: u32) -> Result<Vec<ItemStack>, TransactionOutcome> {
        if self.actor_items.count_matching_with(item, self.check_durability) < quantity {
            return Err(TransactionOutcome::InsufficientItems);
        }
        Ok(self.actor_items.take_matching(item, quantity, self.check_durability))
    }

    fn actor_give(&mut self, stacks: &[ItemStack]) -> Step {
        if self.actor_items.add_stacks(stacks) > 0 {
            return Err(TransactionOutcome::ActorInventoryFull);
        }
        Ok(())
    }

    fn actor_pays(&mut self, amount: f64) -> Step {
        if self.actor_balance + self.actor_delta + FUNDS_EPSILON < amount {
            return Err(TransactionOutcome::InsufficientFunds { payer: Party::Actor });
        }
        self.actor_delta -= amount;
        if !self.unlimited {
            self.owner_delta += amount;
        }
        Ok(())
    }

    fn owner_pays(&mut self, amount: f64) -> Step {
        if !self.unlimited {
            if self.owner_balance + self.owner_delta + FUNDS_EPSILON < amount {
                return Err(TransactionOutcome::InsufficientFunds { payer: Party::Owner });
            }
            self.owner_delta -= amount;
        }
        self.actor_delta += amount;
        Ok(())
    }

    fn commit(self, order: &Order, parties: &mut Parties<'_>) {
        if !self.unlimited {
            if let Some(storage) = parties.storage.as_deref_mut() {
                *storage = self.storage;
            }
            parties.economy.adjust(order.owner, self.owner_delta);
        }
        parties.actor.inventory = self.actor_items;
        parties.economy.adjust(parties.actor.id, self.actor_delta);
    }
}

/// Run the legs against a fresh draft and commit it if they all pass.
fn settle<F>(order: &Order, parties: &mut Parties<'_>, legs: F) -> TransactionOutcome
where
    F: FnOnce(&mut Ledger, &mut dyn RngCore) -> Step,
{
    let mut ledger = match Ledger::open(order, parties) {
        Ok(ledger) => ledger,
        Err(outcome) => return outcome,
    };
    if let Err(outcome) = legs(&mut ledger, &mut *parties.rng) {
        return outcome;
    }
    if !order.dry_run {
        ledger.commit(order, parties);
    }
    TransactionOutcome::Success
}

// ============================================================================
// Legs
// ============================================================================

fn sell_leg(order: &Order, ledger: &mut Ledger, price: f64) -> Step {
    let moved = ledger.storage_take(&order.item, order.quantity())?;
    ledger.actor_pays(order.cost(price))?;
    ledger.actor_give(&moved)
}

fn buy_leg(order: &Order, ledger: &mut Ledger, price: f64) -> Step {
    let moved = ledger.actor_take(&order.item, order.quantity())?;
    ledger.owner_pays(order.cost(price))?;
    ledger.storage_put(&moved)
}

// ============================================================================
// Handlers
// ============================================================================

pub fn sell(order: &Order, parties: &mut Parties<'_>) -> TransactionOutcome {
    settle(order, parties, |ledger, _| sell_leg(order, ledger, order.price))
}

pub fn buy(order: &Order, parties: &mut Parties<'_>) -> TransactionOutcome {
    settle(order, parties, |ledger, _| buy_leg(order, ledger, order.price))
}

pub fn barter(order: &Order, parties: &mut Parties<'_>) -> TransactionOutcome {
    let Some(secondary) = order.secondary.as_ref() else {
        return TransactionOutcome::UninitializedShop;
    };
    settle(order, parties, |ledger, _| {
        let goods = ledger.storage_take(&order.item, order.quantity())?;
        let payment = ledger.actor_take(secondary, order.barter_quantity())?;
        ledger.storage_put(&payment)?;
        ledger.actor_give(&goods)
    })
}

/// Each order draws one unit uniformly from everything in storage and hands
/// out up to one batch of that kind. The draw never happens on a dry run.
pub fn gamble(order: &Order, parties: &mut Parties<'_>) -> TransactionOutcome {
    settle(order, parties, |ledger, rng| {
        ledger.actor_pays(order.cost(order.price))?;
        if ledger.storage.total_units() == 0 {
            return Err(TransactionOutcome::InsufficientStock);
        }
        if order.dry_run {
            return Ok(());
        }

        for _ in 0..order.orders {
            let total = ledger.storage.total_units();
            if total == 0 {
                return Err(TransactionOutcome::InsufficientStock);
            }
            let drawn = ledger
                .storage
                .stack_at_unit(rng.gen_range(0..total))
                .cloned()
                .ok_or(TransactionOutcome::InsufficientStock)?;
            let quantity = order.amount.min(ledger.storage.count_matching_with(&drawn, order.check_durability));
            let won = ledger.storage_take(&drawn, quantity)?;
            ledger.actor_give(&won)?;
            debug!("Gamble drew {}x{}", quantity, drawn.kind);
        }
        Ok(())
    })
}

/// Sell leg at `price`, buy leg at `price_combo`, or both atomically when the
/// combo direction itself is requested.
pub fn combo(order: &Order, parties: &mut Parties<'_>) -> TransactionOutcome {
    settle(order, parties, |ledger, _| match order.requested {
        ShopType::Sell => sell_leg(order, ledger, order.price),
        ShopType::Buy => buy_leg(order, ledger, order.price_combo),
        _ => {
            sell_leg(order, ledger, order.price)?;
            buy_leg(order, ledger, order.price_combo)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        storage: Inventory,
        actor: Player,
        economy: Economy,
        owner: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                storage: Inventory::chest(),
                actor: Player::new("bob"),
                economy: Economy::new(),
                owner: Uuid::new_v4(),
            }
        }

        fn order(&self, item: &ItemStack, price: f64, amount: u32, orders: u32) -> Order {
            Order {
                owner: self.owner,
                admin: false,
                item: item.clone(),
                secondary: None,
                price,
                price_combo: 0.0,
                amount,
                orders,
                dry_run: false,
                requested: ShopType::Sell,
                check_durability: false,
            }
        }

        fn run(&mut self, handler: TransactionHandler, order: &Order, rng: &mut dyn RngCore) -> TransactionOutcome {
            let mut parties = Parties {
                storage: Some(&mut self.storage),
                actor: &mut self.actor,
                economy: &mut self.economy,
                rng,
            };
            handler(order, &mut parties)
        }
    }

    fn bread() -> ItemStack {
        ItemStack::new("bread", 1)
    }

    #[test]
    fn test_sell_moves_items_and_money() {
        let mut fx = Fixture::new();
        fx.storage.add_item(&bread(), 5);
        fx.economy.deposit(fx.actor.id, 25.0);
        let order = fx.order(&bread(), 10.0, 1, 2);

        let outcome = fx.run(sell, &order, &mut StepRng::new(0, 1));
        assert_eq!(outcome, TransactionOutcome::Success);
        assert_eq!(fx.storage.count_matching(&bread()), 3);
        assert_eq!(fx.actor.inventory.count_matching(&bread()), 2);
        assert_eq!(fx.economy.balance(fx.actor.id), 5.0);
        assert_eq!(fx.economy.balance(fx.owner), 20.0);
    }

    #[test]
    fn test_sell_failure_order() {
        let mut fx = Fixture::new();
        let order = fx.order(&bread(), 10.0, 1, 1);
        // Empty storage is reported before the actor's empty wallet
        assert_eq!(fx.run(sell, &order, &mut StepRng::new(0, 1)), TransactionOutcome::InsufficientStock);

        fx.storage.add_item(&bread(), 1);
        assert_eq!(
            fx.run(sell, &order, &mut StepRng::new(0, 1)),
            TransactionOutcome::InsufficientFunds { payer: Party::Actor }
        );
        assert_eq!(fx.storage.count_matching(&bread()), 1);
    }

    #[test]
    fn test_sell_actor_inventory_full_rolls_back() {
        let mut fx = Fixture::new();
        fx.actor.inventory = Inventory::new(1);
        fx.actor.inventory.add_item(&ItemStack::new("dirt", 1), 1);
        fx.storage.add_item(&bread(), 4);
        fx.economy.deposit(fx.actor.id, 100.0);
        let order = fx.order(&bread(), 1.0, 2, 1);

        assert_eq!(fx.run(sell, &order, &mut StepRng::new(0, 1)), TransactionOutcome::ActorInventoryFull);
        assert_eq!(fx.storage.count_matching(&bread()), 4);
        assert_eq!(fx.economy.balance(fx.actor.id), 100.0);
        assert_eq!(fx.economy.balance(fx.owner), 0.0);
    }

    #[test]
    fn test_buy_checks_owner_funds_and_space() {
        let mut fx = Fixture::new();
        fx.actor.inventory.add_item(&bread(), 6);
        let mut order = fx.order(&bread(), 4.0, 3, 2);
        order.requested = ShopType::Buy;

        assert_eq!(
            fx.run(buy, &order, &mut StepRng::new(0, 1)),
            TransactionOutcome::InsufficientFunds { payer: Party::Owner }
        );

        fx.economy.deposit(fx.owner, 8.0);
        fx.storage = Inventory::new(1);
        fx.storage.add_item(&ItemStack::new("stone", 1), 1);
        assert_eq!(fx.run(buy, &order, &mut StepRng::new(0, 1)), TransactionOutcome::InsufficientStorageSpace);

        fx.storage = Inventory::chest();
        assert_eq!(fx.run(buy, &order, &mut StepRng::new(0, 1)), TransactionOutcome::Success);
        assert_eq!(fx.storage.count_matching(&bread()), 6);
        assert_eq!(fx.actor.inventory.count_matching(&bread()), 0);
        assert_eq!(fx.economy.balance(fx.actor.id), 8.0);
        assert_eq!(fx.economy.balance(fx.owner), 0.0);
    }

    #[test]
    fn test_buy_without_items() {
        let mut fx = Fixture::new();
        fx.economy.deposit(fx.owner, 100.0);
        let order = fx.order(&bread(), 4.0, 1, 1);
        assert_eq!(fx.run(buy, &order, &mut StepRng::new(0, 1)), TransactionOutcome::InsufficientItems);
    }

    #[test]
    fn test_barter_quantities() {
        let mut fx = Fixture::new();
        let emerald = ItemStack::new("emerald", 1);
        fx.storage.add_item(&bread(), 10);
        fx.actor.inventory.add_item(&emerald, 5);
        let mut order = fx.order(&bread(), 2.0, 3, 2);
        order.secondary = Some(emerald.clone());
        order.requested = ShopType::Barter;

        assert_eq!(fx.run(barter, &order, &mut StepRng::new(0, 1)), TransactionOutcome::Success);
        assert_eq!(fx.storage.count_matching(&bread()), 4);
        assert_eq!(fx.storage.count_matching(&emerald), 4);
        assert_eq!(fx.actor.inventory.count_matching(&bread()), 6);
        assert_eq!(fx.actor.inventory.count_matching(&emerald), 1);

        // Only one emerald left, a single order needs two
        order.orders = 1;
        assert_eq!(fx.run(barter, &order, &mut StepRng::new(0, 1)), TransactionOutcome::InsufficientItems);
    }

    #[test]
    fn test_gamble_is_deterministic_for_seeded_rng() {
        let mut outcomes = Vec::new();
        for _ in 0..2 {
            let mut fx = Fixture::new();
            fx.storage.add_item(&bread(), 3);
            fx.storage.add_item(&ItemStack::new("diamond", 1), 3);
            fx.economy.deposit(fx.actor.id, 10.0);
            let mut order = fx.order(&bread(), 5.0, 1, 2);
            order.requested = ShopType::Gamble;

            let mut rng = StdRng::seed_from_u64(7);
            assert_eq!(fx.run(gamble, &order, &mut rng), TransactionOutcome::Success);
            assert_eq!(fx.actor.inventory.total_units(), 2);
            assert_eq!(fx.storage.total_units(), 4);
            assert_eq!(fx.economy.balance(fx.actor.id), 0.0);
            outcomes.push(fx.actor.inventory.clone());
        }
        assert_eq!(outcomes[0], outcomes[1]);
    }

    #[test]
    fn test_gamble_dry_run_never_draws() {
        struct PanicRng;
        impl RngCore for PanicRng {
            fn next_u32(&mut self) -> u32 { panic!("rng used during dry run") }
            fn next_u64(&mut self) -> u64 { panic!("rng used during dry run") }
            fn fill_bytes(&mut self, _: &mut [u8]) { panic!("rng used during dry run") }
            fn try_fill_bytes(&mut self, _: &mut [u8]) -> Result<(), rand::Error> {
                panic!("rng used during dry run")
            }
        }

        let mut fx = Fixture::new();
        fx.storage.add_item(&bread(), 1);
        fx.economy.deposit(fx.actor.id, 5.0);
        let mut order = fx.order(&bread(), 5.0, 1, 1);
        order.dry_run = true;

        assert_eq!(fx.run(gamble, &order, &mut PanicRng), TransactionOutcome::Success);
        assert_eq!(fx.storage.total_units(), 1);
        assert_eq!(fx.economy.balance(fx.actor.id), 5.0);

        fx.storage = Inventory::chest();
        assert_eq!(fx.run(gamble, &order, &mut PanicRng), TransactionOutcome::InsufficientStock);
    }

    #[test]
    fn test_combo_both_legs_are_atomic() {
        let mut fx = Fixture::new();
        fx.storage.add_item(&bread(), 2);
        fx.economy.deposit(fx.actor.id, 10.0);
        let mut order = fx.order(&bread(), 10.0, 2, 1);
        order.price_combo = 6.0;
        order.requested = ShopType::Combo;

        // Sell leg passes but the owner can't pay the buy-back leg
        fx.economy.adjust(fx.owner, -20.0);
        assert_eq!(
            fx.run(combo, &order, &mut StepRng::new(0, 1)),
            TransactionOutcome::InsufficientFunds { payer: Party::Owner }
        );
        assert_eq!(fx.storage.count_matching(&bread()), 2);
        assert_eq!(fx.economy.balance(fx.actor.id), 10.0);

        // With the sale's proceeds the owner covers the buy-back
        fx.economy.adjust(fx.owner, 20.0);
        assert_eq!(fx.run(combo, &order, &mut StepRng::new(0, 1)), TransactionOutcome::Success);
        assert_eq!(fx.storage.count_matching(&bread()), 2);
        assert_eq!(fx.economy.balance(fx.actor.id), 6.0);
        assert_eq!(fx.economy.balance(fx.owner), 4.0);
    }

    #[test]
    fn test_combo_single_leg_uses_its_price() {
        let mut fx = Fixture::new();
        fx.actor.inventory.add_item(&bread(), 1);
        fx.economy.deposit(fx.owner, 10.0);
        let mut order = fx.order(&bread(), 10.0, 1, 1);
        order.price_combo = 3.0;
        order.requested = ShopType::Buy;

        assert_eq!(fx.run(combo, &order, &mut StepRng::new(0, 1)), TransactionOutcome::Success);
        assert_eq!(fx.economy.balance(fx.actor.id), 3.0);
        assert_eq!(fx.economy.balance(fx.owner), 7.0);
    }

    #[test]
    fn test_worn_items_trade_unless_durability_checked() {
        let pristine = ItemStack::new("iron_sword", 1).with_max_stack(1).with_durability(0, 250);
        let worn = pristine.clone().with_durability(200, 250);

        let mut fx = Fixture::new();
        fx.storage.add_item(&worn, 1);
        fx.economy.deposit(fx.actor.id, 10.0);
        let mut order = fx.order(&pristine, 5.0, 1, 1);

        order.check_durability = true;
        assert_eq!(fx.run(sell, &order, &mut StepRng::new(0, 1)), TransactionOutcome::InsufficientStock);

        order.check_durability = false;
        assert_eq!(fx.run(sell, &order, &mut StepRng::new(0, 1)), TransactionOutcome::Success);
        // The actor gets the worn sword, not a repaired copy
        assert_eq!(fx.actor.inventory.count_matching(&worn), 1);
        assert_eq!(fx.actor.inventory.count_matching(&pristine), 0);

        fx.economy.deposit(fx.owner, 10.0);
        order.requested = ShopType::Buy;
        order.check_durability = true;
        assert_eq!(fx.run(buy, &order, &mut StepRng::new(0, 1)), TransactionOutcome::InsufficientItems);

        order.check_durability = false;
        assert_eq!(fx.run(buy, &order, &mut StepRng::new(0, 1)), TransactionOutcome::Success);
        assert_eq!(fx.storage.count_matching(&worn), 1);
        assert!(fx.actor.inventory.is_empty());
    }

    #[test]
    fn test_admin_is_unlimited_without_storage() {
        let mut fx = Fixture::new();
        fx.economy.deposit(fx.actor.id, 30.0);
        let mut order = fx.order(&bread(), 10.0, 4, 3);
        order.admin = true;

        let mut rng = StepRng::new(0, 1);
        let mut parties = Parties {
            storage: None,
            actor: &mut fx.actor,
            economy: &mut fx.economy,
            rng: &mut rng,
        };
        assert_eq!(sell(&order, &mut parties), TransactionOutcome::Success);
        assert_eq!(fx.actor.inventory.count_matching(&bread()), 12);
        assert_eq!(fx.economy.balance(fx.actor.id), 0.0);
        assert_eq!(fx.economy.balance(fx.owner), 0.0);
    }

    #[test]
    fn test_missing_storage_is_invalid_for_player_shops() {
        let mut fx = Fixture::new();
        let order = fx.order(&bread(), 1.0, 1, 1);
        let mut rng = StepRng::new(0, 1);
        let mut parties = Parties {
            storage: None,
            actor: &mut fx.actor,
            economy: &mut fx.economy,
            rng: &mut rng,
        };
        assert_eq!(sell(&order, &mut parties), TransactionOutcome::InvalidStorage);
    }
}
