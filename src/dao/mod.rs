/// Persistence collaborator contract used by match coordinators.
pub mod gateway;
/// Process-local persistence backend.
pub mod memory;
/// Database model definitions.
pub mod models;
/// Storage error types shared by every backend.
pub mod storage;
