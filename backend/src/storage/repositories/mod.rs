// Repository modules
pub mod record_repository;
pub mod preference_repository;

// Re-export repository types
pub use record_repository::RecordRepository;
pub use preference_repository::{PreferenceRepository, CURRENT_SESSION_KEY};
