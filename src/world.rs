use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::item::Inventory;

// ============================================================================
// Coordinates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Neighbouring block in the given horizontal direction.
    pub fn relative(self, facing: Facing) -> Self {
        let (dx, dz) = facing.offset();
        Self::new(self.x + dx, self.y, self.z + dz)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Horizontal direction a wall sign faces (away from the block it hangs on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// (dx, dz) of one step in this direction. North is -z.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Facing::North => Facing::South,
            Facing::East => Facing::West,
            Facing::South => Facing::North,
            Facing::West => Facing::East,
        }
    }

    /// Yaw in degrees for an entity looking in this direction.
    pub fn yaw(self) -> f32 {
        match self {
            Facing::South => 0.0,
            Facing::West => 90.0,
            Facing::North => 180.0,
            Facing::East => -90.0,
        }
    }

    pub fn from_str_loose(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "n" | "north" => Some(Facing::North),
            "e" | "east" => Some(Facing::East),
            "s" | "south" => Some(Facing::South),
            "w" | "west" => Some(Facing::West),
            _ => None,
        }
    }
}

/// Precise entity position with orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl Location {
    /// Centre of a block's floor.
    pub fn centered(pos: BlockPos) -> Self {
        Self {
            x: pos.x as f64 + 0.5,
            y: pos.y as f64,
            z: pos.z as f64 + 0.5,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

// ============================================================================
// Blocks
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    WallSign { facing: Facing, lines: [String; 4] },
    Chest(Inventory),
    /// Opens the interacting owner's personal storage rather than its own.
    EnderChest,
    Solid,
}

impl Block {
    pub fn wall_sign(facing: Facing) -> Self {
        Block::WallSign {
            facing,
            lines: Default::default(),
        }
    }
}

// ============================================================================
// Inventory Resolver
// ============================================================================

/// Maps a storage coordinate to the logical inventory behind it.
pub trait InventoryResolver {
    /// `owner` is `None` when there is no resolvable owner (administrative shops).
    fn resolve(&self, pos: BlockPos, owner: Option<Uuid>) -> Option<&Inventory>;

    fn resolve_mut(&mut self, pos: BlockPos, owner: Option<Uuid>) -> Option<&mut Inventory>;
}

// ============================================================================
// Block World
// ============================================================================

/// In-memory block map plus the per-player ender storage and name directory.
#[derive(Debug, Default)]
pub struct BlockWorld {
    blocks: HashMap<BlockPos, Block>,
    ender_storage: HashMap<Uuid, Inventory>,
    player_names: HashMap<Uuid, String>,
}

impl BlockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block(&mut self, pos: BlockPos, block: Block) {
        self.blocks.insert(pos, block);
    }

    pub fn remove_block(&mut self, pos: BlockPos) -> Option<Block> {
        self.blocks.remove(&pos)
    }

    pub fn block(&self, pos: BlockPos) -> Option<&Block> {
        self.blocks.get(&pos)
    }

    /// Place a wall sign on the given face of `support` and return its position.
    pub fn place_wall_sign(&mut self, support: BlockPos, facing: Facing) -> BlockPos {
        let pos = support.relative(facing);
        self.set_block(pos, Block::wall_sign(facing));
        pos
    }

    /// Register a player so owner names and ender storage resolve.
    pub fn register_player(&mut self, id: Uuid, name: &str) {
        self.player_names.insert(id, name.to_string());
        self.ender_storage.entry(id).or_insert_with(Inventory::chest);
    }

    pub fn player_name(&self, id: Uuid) -> Option<&str> {
        self.player_names.get(&id).map(String::as_str)
    }

    pub fn ender_storage_mut(&mut self, id: Uuid) -> Option<&mut Inventory> {
        self.ender_storage.get_mut(&id)
    }

    /// Facing of the wall sign at `pos`, if that block is still a wall sign.
    pub fn sign_facing(&self, pos: BlockPos) -> Option<Facing> {
        match self.blocks.get(&pos) {
            Some(Block::WallSign { facing, .. }) => Some(*facing),
            _ => None,
        }
    }

    pub fn sign_lines(&self, pos: BlockPos) -> Option<&[String; 4]> {
        match self.blocks.get(&pos) {
            Some(Block::WallSign { lines, .. }) => Some(lines),
            _ => None,
        }
    }

    /// Overwrite the four lines of a wall sign. Returns false if `pos` no longer
    /// holds a wall sign.
    pub fn write_sign(&mut self, pos: BlockPos, new_lines: [String; 4]) -> bool {
        match self.blocks.get_mut(&pos) {
            Some(Block::WallSign { lines, .. }) => {
                *lines = new_lines;
                debug!("Updated sign at {}", pos);
                true
            }
            _ => {
                warn!("Block at {} is no longer a wall sign, skipping write", pos);
                false
            }
        }
    }
}

impl InventoryResolver for BlockWorld {
    fn resolve(&self, pos: BlockPos, owner: Option<Uuid>) -> Option<&Inventory> {
        match self.blocks.get(&pos)? {
            Block::Chest(inventory) => Some(inventory),
            Block::EnderChest => self.ender_storage.get(&owner?),
            _ => None,
        }
    }

    fn resolve_mut(&mut self, pos: BlockPos, owner: Option<Uuid>) -> Option<&mut Inventory> {
        match self.blocks.get_mut(&pos)? {
            Block::Chest(inventory) => Some(inventory),
            Block::EnderChest => self.ender_storage.get_mut(&owner?),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemStack;

    #[test]
    fn test_facing_opposites_cancel() {
        for facing in Facing::ALL {
            let pos = BlockPos::new(3, 64, -7);
            assert_eq!(pos.relative(facing).relative(facing.opposite()), pos);
            assert_ne!(facing, facing.opposite());
        }
    }

    #[test]
    fn test_resolve_chest_and_ender_storage() {
        let mut world = BlockWorld::new();
        let owner = Uuid::new_v4();
        world.register_player(owner, "alice");

        let chest = BlockPos::new(0, 64, 0);
        let ender = BlockPos::new(5, 64, 0);
        world.set_block(chest, Block::Chest(Inventory::chest()));
        world.set_block(ender, Block::EnderChest);

        assert!(world.resolve(chest, None).is_some());
        assert!(world.resolve(ender, None).is_none());
        assert!(world.resolve(ender, Some(Uuid::new_v4())).is_none());

        world
            .resolve_mut(ender, Some(owner))
            .unwrap()
            .add_item(&ItemStack::new("diamond", 1), 4);
        let personal = world.resolve(ender, Some(owner)).unwrap();
        assert_eq!(personal.count_matching(&ItemStack::new("diamond", 1)), 4);

        assert!(world.resolve(BlockPos::new(9, 9, 9), Some(owner)).is_none());
    }

    #[test]
    fn test_write_sign_fails_on_non_sign() {
        let mut world = BlockWorld::new();
        let sign = world.place_wall_sign(BlockPos::new(0, 64, 0), Facing::East);
        assert_eq!(sign, BlockPos::new(1, 64, 0));

        let lines = ["a".into(), "b".into(), "c".into(), "d".into()];
        assert!(world.write_sign(sign, lines.clone()));
        assert_eq!(world.sign_lines(sign).unwrap()[2], "c");

        world.set_block(sign, Block::Solid);
        assert!(!world.write_sign(sign, lines));
    }
}
