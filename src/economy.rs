use std::collections::HashMap;
use uuid::Uuid;

/// Balance ledger keyed by actor identity.
#[derive(Debug, Default, Clone)]
pub struct Economy {
    balances: HashMap<Uuid, f64>,
}

impl Economy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, id: Uuid) -> f64 {
        self.balances.get(&id).copied().unwrap_or(0.0)
    }

    pub fn has(&self, id: Uuid, amount: f64) -> bool {
        self.balance(id) + f64::EPSILON >= amount
    }

    pub fn deposit(&mut self, id: Uuid, amount: f64) {
        *self.balances.entry(id).or_insert(0.0) += amount;
    }

    /// Withdraw if the balance covers it. Returns false (and changes nothing) otherwise.
    pub fn withdraw(&mut self, id: Uuid, amount: f64) -> bool {
        if !self.has(id, amount) {
            return false;
        }
        self.adjust(id, -amount);
        true
    }

    /// Apply a signed delta without any balance check.
    pub fn adjust(&mut self, id: Uuid, delta: f64) {
        if delta != 0.0 {
            *self.balances.entry(id).or_insert(0.0) += delta;
        }
    }
}
