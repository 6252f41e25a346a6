//! The public engine surface: recognize-act cycle driver and the API
//! described in §6.

use std::collections::HashSet;

use tracing::{info, instrument, warn};

use crate::condition::Condition;
use crate::constants::cycle;
use crate::error::{EngineError, EngineResult};
use crate::network::ReteNetwork;
use crate::production::{extract_bindings, Action, Bindings, ProductionId};
use crate::strategy::{AgendaItem, ConflictResolutionStrategy, DefaultStrategy};
use crate::term::Term;
use crate::wme::WmeId;

/// A handle to a production registered with an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductionHandle(pub(crate) ProductionId);

/// A handle to an asserted WME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WmeHandle(pub(crate) WmeId);

/// The inference engine: owns the discrimination network, the working
/// memory, and the active conflict-resolution strategy.
pub struct Engine {
    network: ReteNetwork,
    strategy: Box<dyn ConflictResolutionStrategy>,
    /// Instantiations that have already fired (§4.10 refraction): a token
    /// does not refire on its production once it has, even though it stays
    /// in the production node's `items` until the underlying match is torn
    /// down. A retracted-and-rebuilt match gets a fresh `TokenId` (ids are
    /// never reused), so it is eligible again without needing to purge
    /// entries here.
    fired: HashSet<(ProductionId, crate::token::TokenId)>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("strategy", &self.strategy).finish()
    }
}

/// Construct a new engine, optionally with a starting strategy. Defaults to
/// `DefaultStrategy` when none is given.
pub fn new_engine(strategy: Option<Box<dyn ConflictResolutionStrategy>>) -> Engine {
    Engine {
        network: ReteNetwork::new(),
        strategy: strategy.unwrap_or_else(|| Box::new(DefaultStrategy)),
        fired: HashSet::new(),
    }
}

impl Engine {
    pub fn new() -> Self {
        new_engine(None)
    }

    #[instrument(skip_all)]
    pub fn add_production(
        &mut self,
        name: impl Into<String>,
        conditions: Vec<Condition>,
        actions: Vec<Action>,
    ) -> EngineResult<ProductionHandle> {
        let id = self.network.add_production(name.into(), conditions, actions)?;
        Ok(ProductionHandle(id))
    }

    pub fn assert(&mut self, identifier: impl Into<Term>, attribute: impl Into<Term>, value: impl Into<Term>) -> WmeHandle {
        let id = self.network.assert_wme(identifier.into(), attribute.into(), value.into());
        WmeHandle(id)
    }

    pub fn retract(&mut self, wme: WmeHandle) -> EngineResult<()> {
        self.network.retract_wme(wme.0)
    }

    pub fn set_strategy(&mut self, strategy: Box<dyn ConflictResolutionStrategy>) {
        self.strategy = strategy;
    }

    /// The variable bindings of every current complete match of the named
    /// production, for introspection (debugging, tests) rather than for the
    /// recognize-act cycle itself. Returns an empty vector for an unknown
    /// production name.
    pub fn matches(&self, production_name: &str) -> Vec<Bindings> {
        let Some(id) = self.network.production_id(production_name) else {
            return Vec::new();
        };
        let Some(node) = self.network.production(id) else {
            return Vec::new();
        };
        node.items
            .iter()
            .filter_map(|&token_id| {
                let path = self.network.token_path(token_id);
                extract_bindings(&node.production, &path, &self.network.working_memory)
            })
            .collect()
    }

    pub fn provide_feedback(&mut self, production: ProductionHandle, score: f64) {
        let score = score.clamp(-1.0, 1.0);
        if let Some(node) = self.network.production(production.0) {
            self.strategy.feedback(&node.production.name, score);
        }
    }

    /// Run the recognize-act cycle until the agenda empties, the strategy
    /// declines to select, or `max_cycles` is reached. Returns the number
    /// of cycles that actually fired (§4.10).
    #[instrument(skip(self))]
    pub fn run(&mut self, max_cycles: u32) -> EngineResult<u32> {
        let mut agenda = self.build_agenda();
        for cycle in 0..max_cycles {
            if agenda.is_empty() {
                return Ok(cycle);
            }
            let Some(index) = self.strategy.select(&agenda) else {
                return Ok(cycle);
            };
            let item = agenda[index].clone();
            self.fire(&item)?;
            agenda = self.build_agenda();
        }
        Ok(max_cycles)
    }

    pub fn run_default(&mut self) -> EngineResult<u32> {
        self.run(cycle::DEFAULT_MAX_CYCLES)
    }

    fn build_agenda(&self) -> Vec<AgendaItem> {
        self.network
            .agenda()
            .into_iter()
            .filter(|&(production, token)| !self.fired.contains(&(production, token)))
            .map(|(production, token)| {
                let name = self
                    .network
                    .production(production)
                    .map(|n| n.production.name.clone())
                    .unwrap_or_default();
                let path = self.network.token_path(token);
                let recency_score: u64 = path
                    .iter()
                    .filter_map(|&wme_id| self.network.working_memory.get(wme_id))
                    .map(|wme| wme.timestamp)
                    .sum();
                AgendaItem { production, production_name: name, token, recency_score }
            })
            .collect()
    }

    fn fire(&mut self, item: &AgendaItem) -> EngineResult<()> {
        let path = self.network.token_path(item.token);
        let Some(node) = self.network.production(item.production) else {
            return Ok(());
        };
        let Some(bindings) = extract_bindings(&node.production, &path, &self.network.working_memory) else {
            warn!(production = %item.production_name, "inconsistent bindings, skipping activation");
            return Ok(());
        };

        // Actions take `&mut Engine` (so they may assert/retract), which
        // would alias the production's own storage if we called through a
        // borrow of it. Detach the action list for the duration of the
        // call instead of borrowing into `self.network`.
        let Some(node) = self.network.production_mut(item.production) else {
            return Ok(());
        };
        let actions = std::mem::take(&mut node.production.actions);

        let mut result = Ok(());
        for action in &actions {
            if let Err(source) = action(&bindings, self) {
                result = Err(EngineError::ActionError { production: item.production_name.clone(), source });
                break;
            }
        }

        if let Some(node) = self.network.production_mut(item.production) {
            node.production.actions = actions;
        }

        if result.is_ok() {
            self.fired.insert((item.production, item.token));
            info!(production = %item.production_name, "fired");
        }
        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
