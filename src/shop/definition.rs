//! Shop Type and Placement
//!
//! The closed set of transaction policies, and the parameters a shop is
//! created from when its sign is placed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ShopError;
use crate::world::BlockPos;

/// Transaction policy of a shop, and the direction an actor asks to trade in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopType {
    /// Shop hands items to the actor for money
    Sell,
    /// Shop takes items from the actor and pays for them
    Buy,
    /// Items for items, no money involved
    Barter,
    /// Actor pays for a random item from storage
    Gamble,
    /// Sell and buy on one sign, each with its own price
    Combo,
}

impl ShopType {
    pub const ALL: [ShopType; 5] = [
        ShopType::Sell,
        ShopType::Buy,
        ShopType::Barter,
        ShopType::Gamble,
        ShopType::Combo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShopType::Sell => "sell",
            ShopType::Buy => "buy",
            ShopType::Barter => "barter",
            ShopType::Gamble => "gamble",
            ShopType::Combo => "combo",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ShopType::Sell => "Sell",
            ShopType::Buy => "Buy",
            ShopType::Barter => "Barter",
            ShopType::Gamble => "Gamble",
            ShopType::Combo => "Combo",
        }
    }

    /// Whether a shop of this type trades in the `requested` direction.
    /// Combo shops take either leg on its own, or both at once.
    pub fn accepts(&self, requested: ShopType) -> bool {
        match self {
            ShopType::Combo => matches!(
                requested,
                ShopType::Sell | ShopType::Buy | ShopType::Combo
            ),
            other => *other == requested,
        }
    }
}

impl fmt::Display for ShopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ShopType {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShopType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ShopError::UnknownShopType(s.to_string()))
    }
}

/// Everything the factory needs to build a shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub sign: BlockPos,
    pub owner: Uuid,
    pub price: f64,
    /// Second price component; only combo shops use it
    #[serde(default)]
    pub price_combo: f64,
    pub amount: u32,
    #[serde(default)]
    pub admin: bool,
    pub shop_type: ShopType,
}

impl Placement {
    pub fn new(sign: BlockPos, owner: Uuid, shop_type: ShopType, price: f64, amount: u32) -> Self {
        Self {
            sign,
            owner,
            price,
            price_combo: 0.0,
            amount,
            admin: false,
            shop_type,
        }
    }

    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn with_price_combo(mut self, price_combo: f64) -> Self {
        self.price_combo = price_combo;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shop_type() {
        assert_eq!("SELL".parse::<ShopType>().unwrap(), ShopType::Sell);
        assert_eq!(" combo ".parse::<ShopType>().unwrap(), ShopType::Combo);
        assert!(matches!(
            "lottery".parse::<ShopType>(),
            Err(ShopError::UnknownShopType(tag)) if tag == "lottery"
        ));
    }

    #[test]
    fn test_accepts() {
        assert!(ShopType::Sell.accepts(ShopType::Sell));
        assert!(!ShopType::Sell.accepts(ShopType::Buy));
        assert!(!ShopType::Barter.accepts(ShopType::Sell));
        assert!(ShopType::Combo.accepts(ShopType::Buy));
        assert!(ShopType::Combo.accepts(ShopType::Combo));
        assert!(!ShopType::Combo.accepts(ShopType::Gamble));
    }

    #[test]
    fn test_placement_from_toml() {
        let placement: Placement = toml::from_str(
            r#"
            owner = "00000000-0000-0000-0000-000000000001"
            price = 12.5
            amount = 4
            shop_type = "barter"
            sign = { x = 1, y = 64, z = -3 }
            "#,
        )
        .unwrap();
        assert_eq!(placement.shop_type, ShopType::Barter);
        assert_eq!(placement.sign, BlockPos::new(1, 64, -3));
        assert!(!placement.admin);
        assert_eq!(placement.price_combo, 0.0);
    }
}
