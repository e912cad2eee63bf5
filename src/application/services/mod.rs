pub mod action_coordinator;
pub mod interaction_service;
pub mod optimistic_mutator;

pub use action_coordinator::{ActionCoordinator, ActionKey};
pub use interaction_service::InteractionService;
pub use optimistic_mutator::{OptimisticMutator, Reconciliation, Speculation};
