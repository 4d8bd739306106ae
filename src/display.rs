use tracing::debug;

use crate::world::BlockPos;

/// Handle to the floating item display hovering at a shop's sign.
///
/// The renderer itself lives elsewhere; the shop only controls lifetime.
#[derive(Debug)]
pub struct Display {
    anchor: BlockPos,
    active: bool,
}

impl Display {
    pub fn spawn(anchor: BlockPos) -> Self {
        debug!("Spawned display at {}", anchor);
        Self {
            anchor,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remove the display. Safe to call more than once; returns whether anything was removed.
    pub fn remove(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        debug!("Removed display at {}", self.anchor);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_is_idempotent() {
        let mut display = Display::spawn(BlockPos::new(1, 2, 3));
        assert!(display.is_active());
        assert!(display.remove());
        assert!(!display.remove());
        assert!(!display.is_active());
    }
}
