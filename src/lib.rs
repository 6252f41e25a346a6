//! A forward-chaining, RETE-based production rule engine.
//!
//! Facts are triples (`WME`s, for Working Memory Element); rules
//! (`Production`s) are an ordered list of triple-shaped `Condition`s plus
//! action callbacks. The engine incrementally maintains the set of
//! satisfied rule activations as facts are asserted and retracted, and
//! fires them one at a time under a pluggable [`strategy::ConflictResolutionStrategy`].
//!
//! # Quick start
//!
//! ```
//! use emberrete::condition::{Condition, ConditionField as F};
//! use emberrete::engine::Engine;
//!
//! let mut engine = Engine::new();
//! engine
//!     .add_production(
//!         "adult",
//!         vec![Condition::new(F::var("p"), F::constant("age"), F::var("a"))],
//!         vec![Box::new(|bindings, _engine| {
//!             println!("matched: {bindings:?}");
//!             Ok(())
//!         })],
//!     )
//!     .unwrap();
//! engine.assert("person1", "age", 25_i64);
//! engine.run(10).unwrap();
//! ```
//!
//! # Module organization
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`term`] | The closed fact-term universe (symbol/string/int/float/bool) and variable names |
//! | [`condition`] | Condition patterns (constant or variable fields) |
//! | [`wme`] | Working memory elements and their store |
//! | [`token`] | Partial-match tokens |
//! | [`alpha`] | Alpha memories and the dispatch trie |
//! | [`beta`] | Beta memories |
//! | [`join`] | Join nodes and join-test computation |
//! | [`production`] | Productions and production (terminal) nodes |
//! | [`network`] | The discrimination network: construction, sharing, propagation, retraction |
//! | [`strategy`] | Conflict-resolution strategies |
//! | [`engine`] | The public recognize-act engine |
//! | [`error`] | The engine's error taxonomy |

pub mod alpha;
pub mod beta;
pub mod condition;
pub mod constants;
pub mod engine;
pub mod error;
pub mod join;
pub mod network;
pub mod production;
pub mod strategy;
pub mod term;
pub mod token;
pub mod wme;

pub use engine::{new_engine, Engine, ProductionHandle, WmeHandle};
pub use error::{EngineError, EngineResult};

/// Installs a `tracing` subscriber driven by `RUST_LOG` (defaulting to
/// `info`). Convenience for binaries, examples and tests; the library
/// itself never installs a global subscriber on its callers' behalf.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
