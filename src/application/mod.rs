pub mod ports;
pub mod services;

pub use services::{ActionCoordinator, InteractionService, OptimisticMutator};
