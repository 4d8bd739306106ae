use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::ShopConfig;
use crate::economy::Economy;
use crate::message::{MessageFormatter, TemplateFormatter};
use crate::scheduler::TickScheduler;
use crate::world::BlockWorld;

/// Everything a shop needs from its host, passed in explicitly.
pub struct ShopContext {
    pub config: ShopConfig,
    pub world: BlockWorld,
    pub economy: Economy,
    pub scheduler: TickScheduler,
    pub formatter: Box<dyn MessageFormatter>,
    /// Random source for gamble draws
    pub rng: Box<dyn RngCore>,
}

impl ShopContext {
    pub fn new(config: ShopConfig) -> Self {
        Self {
            config,
            world: BlockWorld::new(),
            economy: Economy::new(),
            scheduler: TickScheduler::new(),
            formatter: Box::new(TemplateFormatter::new()),
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    pub fn with_formatter(mut self, formatter: impl MessageFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Tick boundary: apply sign writes that have come due.
    pub fn tick(&mut self) -> usize {
        self.scheduler.advance(&mut self.world)
    }
}
