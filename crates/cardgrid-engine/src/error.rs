//! Error types for the engine layer.

/// Errors raised by board addressing and catalog registration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A slot id outside `0..=8`.
    #[error("slot {0} is out of bounds")]
    InvalidSlot(i64),

    /// A card with the same name is already registered.
    #[error("card {0:?} is already registered")]
    DuplicateCard(String),
}
