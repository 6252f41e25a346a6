//! Conflict-resolution strategies (§4.12).

use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::constants::{bucket_brigade, BucketBrigadeConfig};
use crate::production::ProductionId;
use crate::token::TokenId;

/// One member of the agenda: a production activation plus enough context
/// for strategies to score it without reaching back into the network.
#[derive(Debug, Clone)]
pub struct AgendaItem {
    pub production: ProductionId,
    pub production_name: String,
    pub token: TokenId,
    /// Sum of the assert-order timestamps of the WMEs on this token's path;
    /// higher means more recently matched (§4.12 Recency).
    pub recency_score: u64,
}

/// The capability set every conflict-resolution strategy implements.
pub trait ConflictResolutionStrategy: fmt::Debug {
    /// Choose one agenda item to fire, or `None` if nothing should fire
    /// (e.g. the agenda is empty). The result, if any, must always be a
    /// member of `agenda` (Testable Property 6).
    fn select(&mut self, agenda: &[AgendaItem]) -> Option<usize>;

    /// Reinforce or penalize a production's future selection odds. Only
    /// the learning strategy acts on this; others ignore it.
    fn feedback(&mut self, _production_name: &str, _score: f64) {}
}

/// Always fires the first agenda item.
#[derive(Debug, Default)]
pub struct DefaultStrategy;

impl ConflictResolutionStrategy for DefaultStrategy {
    fn select(&mut self, agenda: &[AgendaItem]) -> Option<usize> {
        if agenda.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// LEX-like: fires the activation whose matched WMEs are most recent,
/// ties broken by agenda order.
#[derive(Debug, Default)]
pub struct RecencyStrategy;

impl ConflictResolutionStrategy for RecencyStrategy {
    fn select(&mut self, agenda: &[AgendaItem]) -> Option<usize> {
        agenda
            .iter()
            .enumerate()
            .max_by_key(|(index, item)| (item.recency_score, std::cmp::Reverse(*index)))
            .map(|(index, _)| index)
    }
}

/// Reinforcement-learning strategy: maintains a per-production weight and
/// samples the agenda by roulette wheel, reinforced by `feedback`. Grounded
/// on the original `GamblersBucketBrigade` this engine's behavior was
/// distilled from — same weight update, same clamp floor, same roulette
/// walk — with the RNG made explicit and seedable for reproducible tests.
#[derive(Debug)]
pub struct GamblersBucketBrigade {
    rule_weights: HashMap<String, f64>,
    initial_weight: f64,
    learning_rate: f64,
    weight_floor: f64,
    rng: StdRng,
}

impl GamblersBucketBrigade {
    pub fn new(seed: u64) -> Self {
        Self {
            rule_weights: HashMap::new(),
            initial_weight: bucket_brigade::DEFAULT_INITIAL_WEIGHT,
            learning_rate: bucket_brigade::DEFAULT_LEARNING_RATE,
            weight_floor: bucket_brigade::DEFAULT_WEIGHT_FLOOR,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_initial_weight(mut self, initial_weight: f64) -> Self {
        self.initial_weight = initial_weight;
        self
    }

    pub fn with_weight_floor(mut self, weight_floor: f64) -> Self {
        self.weight_floor = weight_floor;
        self
    }

    /// Build from a seed plus an explicit [`BucketBrigadeConfig`], for
    /// callers that already have the three tunables grouped (e.g. loaded
    /// from an engine-wide configuration value) rather than set one at a
    /// time via the `with_*` builders.
    pub fn with_config(seed: u64, config: BucketBrigadeConfig) -> Self {
        Self::new(seed)
            .with_initial_weight(config.initial_weight)
            .with_learning_rate(config.learning_rate)
            .with_weight_floor(config.weight_floor)
    }

    pub fn weight(&self, production_name: &str) -> f64 {
        self.rule_weights.get(production_name).copied().unwrap_or(self.initial_weight)
    }

    pub fn weights(&self) -> &HashMap<String, f64> {
        &self.rule_weights
    }
}

impl ConflictResolutionStrategy for GamblersBucketBrigade {
    fn select(&mut self, agenda: &[AgendaItem]) -> Option<usize> {
        if agenda.is_empty() {
            return None;
        }

        for item in agenda {
            self.rule_weights.entry(item.production_name.clone()).or_insert(self.initial_weight);
        }

        let total: f64 = agenda.iter().map(|item| self.weight(&item.production_name)).sum();

        if total <= 0.0 {
            let index = self.rng.gen_range(0..agenda.len());
            debug!(index, "bucket brigade: non-positive total weight, picking uniformly");
            return Some(index);
        }

        let draw: f64 = self.rng.gen_range(0.0..total);
        let mut running = 0.0;
        for (index, item) in agenda.iter().enumerate() {
            running += self.weight(&item.production_name);
            if running >= draw {
                return Some(index);
            }
        }

        // Should not happen for a well-formed positive total; guard it the
        // same way the strategy this was distilled from does.
        Some(0)
    }

    fn feedback(&mut self, production_name: &str, score: f64) {
        let weight = self.rule_weights.entry(production_name.to_string()).or_insert(self.initial_weight);
        *weight += score * self.learning_rate;
        *weight = weight.max(self.weight_floor);
        debug!(production = production_name, new_weight = *weight, "bucket brigade feedback applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(production: u64, name: &str, recency_score: u64) -> AgendaItem {
        AgendaItem { production: ProductionId(production), production_name: name.to_string(), token: TokenId(0), recency_score }
    }

    #[test]
    fn default_strategy_always_picks_first() {
        let mut strategy = DefaultStrategy;
        assert_eq!(strategy.select(&[]), None);
        let agenda = vec![item(0, "a", 0), item(1, "b", 0)];
        assert_eq!(strategy.select(&agenda), Some(0));
    }

    #[test]
    fn recency_strategy_prefers_higher_score_then_earliest_index() {
        let mut strategy = RecencyStrategy;
        let agenda = vec![item(0, "a", 5), item(1, "b", 9), item(2, "c", 9)];
        // b and c tie at 9; earliest index (b, index 1) wins.
        assert_eq!(strategy.select(&agenda), Some(1));
    }

    #[test]
    fn recency_strategy_on_empty_agenda_returns_none() {
        let mut strategy = RecencyStrategy;
        assert_eq!(strategy.select(&[]), None);
    }

    /// Scenario S5: two rules A, B start at equal weight 1.0 with a 0.5
    /// learning rate; feedback(+1.0) on A then feedback(-0.8) on B must land
    /// exactly on weights[A] = 1.5, weights[B] = max(0.1, 0.6) = 0.6.
    #[test]
    fn s5_bucket_brigade_learns_exact_weights() {
        let mut strategy = GamblersBucketBrigade::new(42).with_learning_rate(0.5);
        let agenda = vec![item(0, "A", 0), item(1, "B", 0)];
        // Touch both productions once so their weights are initialized.
        strategy.select(&agenda);

        strategy.feedback("A", 1.0);
        strategy.feedback("B", -0.8);

        assert!((strategy.weight("A") - 1.5).abs() < 1e-9);
        assert!((strategy.weight("B") - 0.6).abs() < 1e-9);
    }

    #[test]
    fn s5_bucket_brigade_weight_floor_clamps_further_penalties() {
        let mut strategy = GamblersBucketBrigade::new(1).with_learning_rate(0.5).with_weight_floor(0.1);
        strategy.feedback("A", -10.0);
        assert_eq!(strategy.weight("A"), 0.1);
    }

    #[test]
    fn s5_bucket_brigade_selection_is_reproducible_for_a_fixed_seed() {
        let agenda = vec![item(0, "A", 0), item(1, "B", 0), item(2, "C", 0)];
        let mut strategy1 = GamblersBucketBrigade::new(7);
        let mut strategy2 = GamblersBucketBrigade::new(7);

        let picks1: Vec<Option<usize>> = (0..10).map(|_| strategy1.select(&agenda)).collect();
        let picks2: Vec<Option<usize>> = (0..10).map(|_| strategy2.select(&agenda)).collect();
        assert_eq!(picks1, picks2);
    }

    #[test]
    fn with_config_applies_all_three_tunables() {
        let config = BucketBrigadeConfig { initial_weight: 2.0, learning_rate: 0.25, weight_floor: 0.5 };
        let mut strategy = GamblersBucketBrigade::with_config(3, config);
        assert_eq!(strategy.weight("fresh"), 2.0);
        strategy.feedback("fresh", -100.0);
        assert_eq!(strategy.weight("fresh"), 0.5);
    }

    #[test]
    fn bucket_brigade_select_always_returns_an_agenda_index() {
        let mut strategy = GamblersBucketBrigade::new(99);
        let agenda = vec![item(0, "A", 0), item(1, "B", 0)];
        for _ in 0..20 {
            let index = strategy.select(&agenda).unwrap();
            assert!(index < agenda.len());
        }
    }
}
