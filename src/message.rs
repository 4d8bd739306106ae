//! Sign and Message Rendering
//!
//! The shop core only sees the [`MessageFormatter`] trait. [`TemplateFormatter`]
//! is the stock implementation: bracketed placeholders substituted from a
//! [`ShopSummary`], with templates overridable from a TOML file.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::ShopError;
use crate::shop::ShopType;

// ============================================================================
// Formatting Codes
// ============================================================================

pub const FORMAT_CHAR: char = '§';
pub const RED: &str = "§c";
pub const BLUE: &str = "§9";

/// Remove `§x` formatting pairs.
pub fn strip_formatting(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == FORMAT_CHAR {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Error style: decoration stripped, whole line red.
pub fn error_style(text: &str) -> String {
    format!("{}{}", RED, strip_formatting(text))
}

// ============================================================================
// Shop Summary
// ============================================================================

/// Everything a formatter may print about a shop, already resolved to text.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopSummary {
    pub shop_type: ShopType,
    pub item: Option<String>,
    pub barter_item: Option<String>,
    pub amount: u32,
    pub barter_amount: u32,
    pub price: String,
    pub price_combo: String,
    pub price_per_item: String,
    pub owner: String,
    pub stock: u32,
    pub out_of_stock: bool,
    pub admin: bool,
    pub initialized: bool,
}

/// One line of informational text with an optional hover payload.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoLine {
    pub text: String,
    /// Serialized item shown on hover; only present when rich text is enabled
    pub tooltip: Option<String>,
}

impl InfoLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tooltip: None,
        }
    }

    pub fn blank() -> Self {
        Self::plain("")
    }
}

// ============================================================================
// Formatter
// ============================================================================

pub trait MessageFormatter {
    /// The four sign lines for a shop of the given type.
    fn sign_lines(&self, summary: &ShopSummary, shop_type: ShopType) -> [String; 4];

    /// Informational message, `None` if no template exists for `category`/`key`.
    fn render(
        &self,
        category: &str,
        key: &str,
        summary: &ShopSummary,
        actor: Option<&str>,
    ) -> Option<String>;
}

#[derive(Debug, Default, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    signs: HashMap<String, [String; 4]>,
    #[serde(default)]
    messages: HashMap<String, HashMap<String, String>>,
}

pub struct TemplateFormatter {
    signs: HashMap<String, [String; 4]>,
    messages: HashMap<String, HashMap<String, String>>,
}

fn lines(a: &str, b: &str, c: &str, d: &str) -> [String; 4] {
    [a.to_string(), b.to_string(), c.to_string(), d.to_string()]
}

impl TemplateFormatter {
    pub fn new() -> Self {
        let mut signs = HashMap::new();
        signs.insert("sell".to_string(), lines("[status][Sell]", "[amount] [item]", "§a[price]", "[owner]"));
        signs.insert("buy".to_string(), lines("[status][Buy]", "[amount] [item]", "§a[price]", "[owner]"));
        signs.insert(
            "barter".to_string(),
            lines("[status][Barter]", "[amount] [item]", "for [barter amount] [barter item]", "[owner]"),
        );
        signs.insert("gamble".to_string(), lines("[status][Gamble]", "???", "§a[price]", "[owner]"));
        signs.insert(
            "combo".to_string(),
            lines("[status][Combo]", "[amount] [item]", "§aB [price] S [price combo]", "[owner]"),
        );

        let mut messages: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut add = |category: &str, key: &str, template: &str| {
            messages
                .entry(category.to_string())
                .or_default()
                .insert(key.to_string(), template.to_string());
        };
        add("sell", "descriptionItem", "§fThis shop sells [amount] §e[item]");
        add("sell", "descriptionPrice", "§fPrice: §a[price]");
        add("sell", "descriptionPricePerItem", "§fPer item: §a[price per item]");
        add("buy", "descriptionItem", "§fThis shop buys [amount] §e[item]");
        add("buy", "descriptionPrice", "§fPays: §a[price]");
        add("buy", "descriptionPricePerItem", "§fPer item: §a[price per item]");
        add("barter", "descriptionItem", "§fThis shop trades [amount] §e[item]");
        add("barter", "descriptionBarterItem", "§ffor [barter amount] §e[barter item]");
        add("gamble", "descriptionItem", "§fTry your luck for a random item");
        add("gamble", "descriptionPrice", "§fCost per spin: §a[price]");
        add("combo", "descriptionItem", "§fThis shop buys and sells [amount] §e[item]");
        add("combo", "descriptionPrice", "§fBuy for §a[price]§f, sell for §a[price combo]");
        add("combo", "descriptionPricePerItem", "§fPer item: §a[price per item]");
        add("description", "stock", "§fIn stock: §e[stock]");
        add("description", "stockAdmin", "§fIn stock: §eunlimited");

        Self { signs, messages }
    }

    /// Defaults overlaid with the templates in `path`. A missing file keeps the defaults.
    pub fn load(path: &Path) -> Result<Self, ShopError> {
        let mut formatter = Self::new();
        if !path.exists() {
            return Ok(formatter);
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ShopError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let file: TemplateFile = toml::from_str(&contents).map_err(|e| ShopError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        formatter.signs.extend(file.signs);
        for (category, templates) in file.messages {
            formatter.messages.entry(category).or_default().extend(templates);
        }

        info!("Loaded message templates from {:?}", path);
        Ok(formatter)
    }

    fn fill(template: &str, summary: &ShopSummary, actor: Option<&str>) -> String {
        let status = if summary.out_of_stock { RED } else { BLUE };
        template
            .replace("[status]", status)
            .replace("[shop type]", summary.shop_type.display_name())
            .replace("[barter item]", summary.barter_item.as_deref().unwrap_or("?"))
            .replace("[barter amount]", &summary.barter_amount.to_string())
            .replace("[item]", summary.item.as_deref().unwrap_or("?"))
            .replace("[amount]", &summary.amount.to_string())
            .replace("[price per item]", &summary.price_per_item)
            .replace("[price combo]", &summary.price_combo)
            .replace("[price]", &summary.price)
            .replace("[owner]", &summary.owner)
            .replace("[stock]", &summary.stock.to_string())
            .replace("[user]", actor.unwrap_or(""))
    }
}

impl Default for TemplateFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageFormatter for TemplateFormatter {
    fn sign_lines(&self, summary: &ShopSummary, shop_type: ShopType) -> [String; 4] {
        match self.signs.get(shop_type.as_str()) {
            Some(templates) => templates.clone().map(|t| Self::fill(&t, summary, None)),
            None => Default::default(),
        }
    }

    fn render(
        &self,
        category: &str,
        key: &str,
        summary: &ShopSummary,
        actor: Option<&str>,
    ) -> Option<String> {
        let template = self.messages.get(category)?.get(key)?;
        Some(Self::fill(template, summary, actor))
    }
}
