use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Item Stack
// ============================================================================

/// An item descriptor: what the item is, plus how many of it.
///
/// Two stacks are "similar" when everything except `amount` matches. Shops
/// keep a template stack and hand out clones with the amount rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: String,
    pub amount: u32,
    #[serde(default)]
    pub durability: u16,
    #[serde(default)]
    pub max_durability: u16,
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

fn default_max_stack() -> u32 {
    64
}

impl ItemStack {
    pub fn new(kind: &str, amount: u32) -> Self {
        Self {
            kind: kind.to_string(),
            amount,
            durability: 0,
            max_durability: 0,
            max_stack: default_max_stack(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack.max(1);
        self
    }

    pub fn with_durability(mut self, damage: u16, max_durability: u16) -> Self {
        self.durability = damage.min(max_durability);
        self.max_durability = max_durability;
        self
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    /// Same item, ignoring amount.
    pub fn is_similar(&self, other: &ItemStack) -> bool {
        self.matches(other, true)
    }

    /// Same item, ignoring amount and, unless `check_durability`, damage taken.
    pub fn matches(&self, other: &ItemStack, check_durability: bool) -> bool {
        self.kind == other.kind
            && (!check_durability || self.durability == other.durability)
            && self.max_durability == other.max_durability
            && self.meta == other.meta
    }

    /// Clone with a different amount.
    pub fn with_amount(&self, amount: u32) -> Self {
        let mut stack = self.clone();
        stack.amount = amount;
        stack
    }

    pub fn has_durability(&self) -> bool {
        self.max_durability > 0
    }

    /// Reset accumulated damage (durability counts damage taken, 0 = pristine).
    pub fn repair(&mut self) {
        self.durability = 0;
    }

    /// Remaining durability as a percentage, 100 for items without durability.
    pub fn durability_percent(&self) -> u32 {
        if !self.has_durability() {
            return 100;
        }
        let remaining = (self.max_durability - self.durability.min(self.max_durability)) as f64;
        ((remaining / self.max_durability as f64) * 100.0).round() as u32
    }

    pub fn display_name(&self) -> String {
        match self.meta.get("name") {
            Some(name) => name.clone(),
            None => self.kind.replace('_', " "),
        }
    }
}

// ============================================================================
// Inventory
// ============================================================================

pub const CHEST_SIZE: usize = 27;
pub const PLAYER_INVENTORY_SIZE: usize = 36;

/// Fixed-size slot inventory. Used for chests, ender storage and players.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub slots: Vec<Option<ItemStack>>,
}

impl Inventory {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    pub fn chest() -> Self {
        Self::new(CHEST_SIZE)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Total amount of items similar to `item` across all slots.
    pub fn count_matching(&self, item: &ItemStack) -> u32 {
        self.count_matching_with(item, true)
    }

    pub fn count_matching_with(&self, item: &ItemStack, check_durability: bool) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.matches(item, check_durability))
            .map(|s| s.amount)
            .sum()
    }

    /// Total number of item units regardless of kind.
    pub fn total_units(&self) -> u32 {
        self.slots.iter().flatten().map(|s| s.amount).sum()
    }

    /// How many more units of `item` would fit.
    pub fn room_for(&self, item: &ItemStack) -> u32 {
        let max_stack = item.max_stack.max(1);
        self.slots
            .iter()
            .map(|slot| match slot {
                Some(s) if s.is_similar(item) => max_stack.saturating_sub(s.amount),
                Some(_) => 0,
                None => max_stack,
            })
            .sum()
    }

    /// Try to add `quantity` of `item`. Returns the quantity that couldn't fit.
    pub fn add_item(&mut self, item: &ItemStack, mut quantity: u32) -> u32 {
        let max_stack = item.max_stack.max(1);

        // First, try to stack with existing items
        for slot in self.slots.iter_mut().flatten() {
            if quantity == 0 {
                break;
            }
            if slot.is_similar(item) {
                let add = quantity.min(max_stack.saturating_sub(slot.amount));
                slot.amount += add;
                quantity -= add;
            }
        }

        // Then, try to find empty slots for remaining quantity
        for slot in &mut self.slots {
            if quantity == 0 {
                break;
            }
            if slot.is_none() {
                let add = quantity.min(max_stack);
                *slot = Some(item.with_amount(add));
                quantity -= add;
            }
        }

        quantity
    }

    /// Remove up to `quantity` of `item`, last slots first. Returns the quantity removed.
    pub fn remove_item(&mut self, item: &ItemStack, quantity: u32) -> u32 {
        self.take_matching(item, quantity, true)
            .iter()
            .map(|stack| stack.amount)
            .sum()
    }

    /// Remove up to `quantity` units matching `item`, last slots first, and
    /// return them as they were stored (damage included).
    pub fn take_matching(&mut self, item: &ItemStack, quantity: u32, check_durability: bool) -> Vec<ItemStack> {
        let mut taken = Vec::new();
        let mut remaining = quantity;
        for slot in self.slots.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            if let Some(stack) = slot {
                if stack.matches(item, check_durability) {
                    let take = remaining.min(stack.amount);
                    taken.push(stack.with_amount(take));
                    stack.amount -= take;
                    remaining -= take;
                    if stack.amount == 0 {
                        *slot = None;
                    }
                }
            }
        }
        taken
    }

    /// Add every stack in `stacks`. Returns the total quantity that couldn't fit.
    pub fn add_stacks(&mut self, stacks: &[ItemStack]) -> u32 {
        stacks.iter().map(|stack| self.add_item(stack, stack.amount)).sum()
    }

    /// Non-empty slots in slot order.
    pub fn stacks(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter().flatten()
    }

    /// Stack containing the `index`-th item unit, counting across slots in order.
    pub fn stack_at_unit(&self, mut index: u32) -> Option<&ItemStack> {
        for stack in self.stacks() {
            if index < stack.amount {
                return Some(stack);
            }
            index -= stack.amount;
        }
        None
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::chest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion() -> ItemStack {
        ItemStack::new("health_potion", 1).with_max_stack(10)
    }

    #[test]
    fn test_add_stacks_then_fills_empty_slots() {
        let mut inv = Inventory::new(3);
        assert_eq!(inv.add_item(&potion(), 25), 0);
        assert_eq!(inv.count_matching(&potion()), 25);
        assert_eq!(inv.slots[0].as_ref().unwrap().amount, 10);
        assert_eq!(inv.slots[2].as_ref().unwrap().amount, 5);

        // 5 more fit in the last slot, the rest is returned
        assert_eq!(inv.add_item(&potion(), 8), 3);
        assert_eq!(inv.room_for(&potion()), 0);
    }

    #[test]
    fn test_similarity_ignores_amount_but_not_meta() {
        let plain = potion();
        let named = potion().with_meta("name", "Elixir");
        assert!(plain.is_similar(&plain.with_amount(7)));
        assert!(!plain.is_similar(&named));

        let mut inv = Inventory::new(2);
        inv.add_item(&named, 4);
        assert_eq!(inv.count_matching(&plain), 0);
        assert_eq!(inv.room_for(&plain), 10);
    }

    #[test]
    fn test_remove_clears_empty_slots() {
        let mut inv = Inventory::new(3);
        inv.add_item(&potion(), 15);
        assert_eq!(inv.remove_item(&potion(), 12), 12);
        assert_eq!(inv.count_matching(&potion()), 3);
        assert_eq!(inv.stacks().count(), 1);

        assert_eq!(inv.remove_item(&potion(), 10), 3);
        assert!(inv.is_empty());
    }

    #[test]
    fn test_stack_at_unit_walks_slots() {
        let mut inv = Inventory::new(3);
        inv.add_item(&ItemStack::new("dirt", 1), 2);
        inv.add_item(&ItemStack::new("stone", 1), 3);
        assert_eq!(inv.stack_at_unit(0).unwrap().kind, "dirt");
        assert_eq!(inv.stack_at_unit(1).unwrap().kind, "dirt");
        assert_eq!(inv.stack_at_unit(2).unwrap().kind, "stone");
        assert_eq!(inv.stack_at_unit(4).unwrap().kind, "stone");
        assert!(inv.stack_at_unit(5).is_none());
    }

    #[test]
    fn test_take_matching_keeps_damage() {
        let sword = ItemStack::new("iron_sword", 1).with_max_stack(1);
        let mut inv = Inventory::new(3);
        inv.add_item(&sword.clone().with_durability(40, 250), 1);
        inv.add_item(&sword.clone().with_durability(200, 250), 1);
        let pristine = sword.with_durability(0, 250);

        assert_eq!(inv.count_matching(&pristine), 0);
        assert_eq!(inv.count_matching_with(&pristine, false), 2);
        assert!(inv.take_matching(&pristine, 2, true).is_empty());

        let taken = inv.take_matching(&pristine, 2, false);
        assert!(inv.is_empty());
        let mut damage: Vec<u16> = taken.iter().map(|s| s.durability).collect();
        damage.sort();
        assert_eq!(damage, vec![40, 200]);

        let mut other = Inventory::new(2);
        assert_eq!(other.add_stacks(&taken), 0);
        assert_eq!(other.stacks().count(), 2);
    }

    #[test]
    fn test_durability_percent() {
        let sword = ItemStack::new("iron_sword", 1).with_durability(125, 250);
        assert_eq!(sword.durability_percent(), 50);
        assert_eq!(ItemStack::new("dirt", 1).durability_percent(), 100);
    }
}
