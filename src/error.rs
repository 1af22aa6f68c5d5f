//! Error signals
//!
//! Nothing here is ever surfaced to the player. Simulation code returns these
//! as values, logs them, and carries on with the next tick.

use thiserror::Error;

/// Recoverable failures inside the simulation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// The planner ran out of attempts for a level
    #[error("no valid platform slot at y={target_y} after {attempts} attempts")]
    PlacementExhausted { target_y: f32, attempts: u32 },

    /// An optional collaborator (collider, registry, pool) was absent
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// A pool had nothing free and was not allowed to grow
    #[error("pool '{pool}' exhausted (capacity {capacity})")]
    PoolExhausted { pool: &'static str, capacity: usize },

    /// A value that would put the world in an invalid state was rejected
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings parse: {0}")]
    Parse(#[from] serde_json::Error),
}
