use uuid::Uuid;

use crate::item::{Inventory, PLAYER_INVENTORY_SIZE};
use crate::world::Location;

/// An actor that trades with shops. Funds live in the [`Economy`](crate::economy::Economy).
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub inventory: Inventory,
    pub location: Location,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            inventory: Inventory::new(PLAYER_INVENTORY_SIZE),
            location: Location::default(),
        }
    }

    pub fn teleport(&mut self, location: Location) {
        tracing::debug!(
            "Teleporting {} to ({:.1}, {:.1}, {:.1})",
            self.name, location.x, location.y, location.z
        );
        self.location = location;
    }
}
