//! Console Commands
//!
//! Line-based commands that drive a sandbox world: placing shops, stocking
//! them, and trading as any named player.

use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::data::ItemRegistry;
use crate::item::ItemStack;
use crate::player::Player;
use crate::shop::{Placement, Shop, ShopContext, ShopRegistry, ShopType};
use crate::world::{Block, BlockPos, Facing, InventoryResolver};

/// Name of the player commands run as until `as` switches.
pub const DEFAULT_PLAYER: &str = "steve";

pub const HELP: &str = "\
commands:
  place <x> <y> <z> <facing> <type> <price> <amount> [price_combo] [admin]
  item <x> <y> <z> <item> [barter_item]
  stock <x> <y> <z> <item> <quantity>
  sell|buy|barter|gamble|combo <x> <y> <z> [orders]
  check <type> <x> <y> <z> [orders]
  give <item> <quantity>
  money <amount>
  as <player>
  info|sign|tp|delete <x> <y> <z>
  quit";

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Put a shop sign on `facing` side of `support`, creating a chest there if empty
    Place {
        support: BlockPos,
        facing: Facing,
        shop_type: ShopType,
        price: f64,
        amount: u32,
        price_combo: f64,
        admin: bool,
    },
    Item {
        sign: BlockPos,
        item: String,
        barter_item: Option<String>,
    },
    Stock {
        sign: BlockPos,
        item: String,
        quantity: u32,
    },
    Trade {
        sign: BlockPos,
        requested: ShopType,
        orders: u32,
        dry_run: bool,
    },
    Give {
        item: String,
        quantity: u32,
    },
    Money {
        amount: f64,
    },
    As {
        name: String,
    },
    Info {
        sign: BlockPos,
    },
    Sign {
        sign: BlockPos,
    },
    Teleport {
        sign: BlockPos,
    },
    Delete {
        sign: BlockPos,
    },
    Help,
    Quit,
}

fn num<T: FromStr>(value: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("Not a number: {}", value))
}

fn pos(args: &[&str]) -> Result<BlockPos, String> {
    match args {
        [x, y, z, ..] => Ok(BlockPos::new(num(x)?, num(y)?, num(z)?)),
        _ => Err("Expected <x> <y> <z>".to_string()),
    }
}

fn arg<'a>(args: &[&'a str], index: usize, name: &str) -> Result<&'a str, String> {
    args.get(index).copied().ok_or_else(|| format!("Missing <{}>", name))
}

fn orders(args: &[&str], index: usize) -> Result<u32, String> {
    args.get(index).map(|value| num(value)).transpose().map(|o| o.unwrap_or(1))
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            return Err("Empty command".to_string());
        };

        match name.to_ascii_lowercase().as_str() {
            "place" => {
                let facing = arg(args, 3, "facing")?;
                let mut price_combo = 0.0;
                let mut admin = false;
                for extra in args.iter().skip(7) {
                    if extra.eq_ignore_ascii_case("admin") {
                        admin = true;
                    } else {
                        price_combo = num(extra)?;
                    }
                }
                Ok(Command::Place {
                    support: pos(args)?,
                    facing: Facing::from_str_loose(facing)
                        .ok_or_else(|| format!("Unknown facing: {}", facing))?,
                    shop_type: arg(args, 4, "type")?.parse().map_err(|e| format!("{}", e))?,
                    price: num(arg(args, 5, "price")?)?,
                    amount: num(arg(args, 6, "amount")?)?,
                    price_combo,
                    admin,
                })
            }
            "item" => Ok(Command::Item {
                sign: pos(args)?,
                item: arg(args, 3, "item")?.to_string(),
                barter_item: args.get(4).map(|s| s.to_string()),
            }),
            "stock" => Ok(Command::Stock {
                sign: pos(args)?,
                item: arg(args, 3, "item")?.to_string(),
                quantity: num(arg(args, 4, "quantity")?)?,
            }),
            "check" => {
                let requested = arg(args, 0, "type")?.parse().map_err(|e| format!("{}", e))?;
                Ok(Command::Trade {
                    sign: pos(&args[1..])?,
                    requested,
                    orders: orders(args, 4)?,
                    dry_run: true,
                })
            }
            "give" => Ok(Command::Give {
                item: arg(args, 0, "item")?.to_string(),
                quantity: num(arg(args, 1, "quantity")?)?,
            }),
            "money" => Ok(Command::Money {
                amount: num(arg(args, 0, "amount")?)?,
            }),
            "as" => Ok(Command::As {
                name: arg(args, 0, "player")?.to_string(),
            }),
            "info" => Ok(Command::Info { sign: pos(args)? }),
            "sign" => Ok(Command::Sign { sign: pos(args)? }),
            "tp" => Ok(Command::Teleport { sign: pos(args)? }),
            "delete" => Ok(Command::Delete { sign: pos(args)? }),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => match other.parse::<ShopType>() {
                Ok(requested) => Ok(Command::Trade {
                    sign: pos(args)?,
                    requested,
                    orders: orders(args, 3)?,
                    dry_run: false,
                }),
                Err(_) => Err(format!("Unknown command: {}", other)),
            },
        }
    }
}

// ============================================================================
// Sandbox
// ============================================================================

pub struct Sandbox {
    pub ctx: ShopContext,
    pub registry: ShopRegistry,
    items: ItemRegistry,
    players: HashMap<String, Player>,
    current: String,
}

impl Sandbox {
    pub fn new(ctx: ShopContext, items: ItemRegistry) -> Self {
        let mut sandbox = Self {
            ctx,
            registry: ShopRegistry::new(),
            items,
            players: HashMap::new(),
            current: DEFAULT_PLAYER.to_string(),
        };
        sandbox.switch_player(DEFAULT_PLAYER);
        sandbox
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(&self.current)
    }

    fn switch_player(&mut self, name: &str) {
        let world = &mut self.ctx.world;
        self.players.entry(name.to_string()).or_insert_with(|| {
            let player = Player::new(name);
            world.register_player(player.id, name);
            debug!("New player {} ({})", name, player.id);
            player
        });
        self.current = name.to_string();
    }

    fn item(&self, id: &str, amount: u32) -> Result<ItemStack, String> {
        self.items.stack(id, amount).ok_or_else(|| format!("Unknown item: {}", id))
    }

    fn tradeable_item(&self, id: &str) -> Result<ItemStack, String> {
        match self.items.get(id) {
            Some(definition) if !definition.tradeable => Err(format!("{} cannot be traded", id)),
            _ => self.item(id, 1),
        }
    }

    fn shop(&self, sign: BlockPos) -> Result<&Shop, String> {
        self.registry.get(sign).ok_or_else(|| format!("No shop at {}", sign))
    }

    /// Run one command and return the lines to print.
    pub fn handle(&mut self, command: Command) -> Result<Vec<String>, String> {
        let Some(actor) = self.players.get_mut(&self.current) else {
            return Err(format!("No player named {}", self.current));
        };

        match command {
            Command::Place {
                support,
                facing,
                shop_type,
                price,
                amount,
                price_combo,
                admin,
            } => {
                let sign = support.relative(facing);
                if self.registry.contains(sign) {
                    return Err(format!("There is already a shop at {}", sign));
                }
                if self.ctx.world.block(sign).is_some() {
                    return Err(format!("{} is occupied", sign));
                }
                if self.ctx.world.block(support).is_none() {
                    self.ctx.world.set_block(support, Block::Chest(Default::default()));
                }
                self.ctx.world.place_wall_sign(support, facing);

                let mut placement = Placement::new(sign, actor.id, shop_type, price, amount)
                    .with_price_combo(price_combo);
                if admin {
                    placement = placement.admin();
                }
                let mut shop = Shop::create(&self.ctx, placement).map_err(|e| e.to_string())?;
                shop.update_sign(&mut self.ctx);
                let storage = shop.storage_pos();
                self.registry.add(shop).map_err(|e| e.to_string())?;
                Ok(vec![format!("Placed {} shop at {} (storage {})", shop_type, sign, storage)])
            }

            Command::Item { sign, item, barter_item } => {
                let stack = self.tradeable_item(&item)?;
                let barter = barter_item.map(|id| self.tradeable_item(&id)).transpose()?;
                let shop = self
                    .registry
                    .get_mut(sign)
                    .ok_or_else(|| format!("No shop at {}", sign))?;
                shop.set_item_stack(stack, &self.ctx.config);
                if let Some(barter) = barter {
                    shop.set_secondary_item_stack(barter, &self.ctx.config);
                }
                shop.update_sign(&mut self.ctx);
                Ok(vec![format!("Shop at {} now trades {}", sign, item)])
            }

            Command::Stock { sign, item, quantity } => {
                let stack = self.item(&item, 1)?;
                let shop = self.shop(sign)?;
                let storage = shop.storage_pos();
                let owner = (!shop.is_admin()).then(|| shop.owner_id());
                let inventory = self
                    .ctx
                    .world
                    .resolve_mut(storage, owner)
                    .ok_or_else(|| format!("No container at {}", storage))?;
                let leftover = inventory.add_item(&stack, quantity);
                if leftover > 0 {
                    warn!("Storage {} full, {} {} left over", storage, leftover, item);
                }

                for pos in self.registry.sharing_storage(storage) {
                    if let Some(shop) = self.registry.get_mut(pos) {
                        shop.update_sign(&mut self.ctx);
                    }
                }
                Ok(vec![format!("Stored {} {} at {}", quantity - leftover, item, storage)])
            }

            Command::Trade {
                sign,
                requested,
                orders,
                dry_run,
            } => {
                let outcome = self
                    .registry
                    .transact(sign, &mut self.ctx, orders, actor, dry_run, requested)
                    .ok_or_else(|| format!("No shop at {}", sign))?;
                let verb = if dry_run { "check" } else { requested.as_str() };
                Ok(vec![format!(
                    "{} x{}: {} (balance {})",
                    verb,
                    orders,
                    outcome.message_key(),
                    self.ctx.config.format_price(self.ctx.economy.balance(actor.id))
                )])
            }

            Command::Give { item, quantity } => {
                let stack = self.items.stack(&item, 1).ok_or_else(|| format!("Unknown item: {}", item))?;
                let leftover = actor.inventory.add_item(&stack, quantity);
                Ok(vec![format!("{} received {} {}", actor.name, quantity - leftover, item)])
            }

            Command::Money { amount } => {
                if amount >= 0.0 {
                    self.ctx.economy.deposit(actor.id, amount);
                } else if !self.ctx.economy.withdraw(actor.id, -amount) {
                    return Err(format!("{} cannot pay {}", actor.name, -amount));
                }
                Ok(vec![format!(
                    "{} has {}",
                    actor.name,
                    self.ctx.config.format_price(self.ctx.economy.balance(actor.id))
                )])
            }

            Command::As { name } => {
                self.switch_player(&name);
                Ok(vec![format!("Now acting as {}", name)])
            }

            Command::Info { sign } => {
                let shop = self.registry.get(sign).ok_or_else(|| format!("No shop at {}", sign))?;
                let mut out = vec![format!(
                    "{} shop by {}, stock {}",
                    shop.shop_type(),
                    shop.owner_name(&self.ctx),
                    shop.stock(&self.ctx)
                )];
                for line in shop.sales_info(&self.ctx, actor) {
                    out.push(line.text);
                    if let Some(tooltip) = line.tooltip {
                        out.push(format!("  hover: {}", tooltip));
                    }
                }
                Ok(out)
            }

            Command::Sign { sign } => {
                let lines = self
                    .ctx
                    .world
                    .sign_lines(sign)
                    .ok_or_else(|| format!("No sign at {}", sign))?;
                Ok(lines.iter().map(|line| format!("| {}", line)).collect())
            }

            Command::Teleport { sign } => {
                let shop = self.registry.get(sign).ok_or_else(|| format!("No shop at {}", sign))?;
                if !shop.teleport(&self.ctx, Some(&mut *actor)) {
                    return Err(format!("Cannot teleport to {}", sign));
                }
                let at = actor.location;
                Ok(vec![format!(
                    "{} at ({:.1}, {:.1}, {:.1}) yaw {} pitch {}",
                    actor.name, at.x, at.y, at.z, at.yaw, at.pitch
                )])
            }

            Command::Delete { sign } => {
                let report = self
                    .registry
                    .delete_shop(sign, &mut self.ctx)
                    .ok_or_else(|| format!("No shop at {}", sign))?;
                Ok(vec![format!(
                    "Deleted shop at {} (display removed: {}, sign cleared: {}, writes cancelled: {})",
                    sign, report.display_removed, report.sign_cleared, report.writes_cancelled
                )])
            }

            Command::Help => Ok(HELP.lines().map(str::to_string).collect()),

            Command::Quit => Ok(Vec::new()),
        }
    }
}
