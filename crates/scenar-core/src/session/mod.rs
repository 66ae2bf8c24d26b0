//! Session domain module.

mod model;
mod repository;

pub use model::{SimulationPhase, SimulationSession};
pub use repository::SessionRepository;
