//! # Domain Layer
//!
//! Business logic of the camp manager, between the REST layer and storage:
//!
//! - **Sessions**: the registry of camp sessions and the current one
//! - **Records**: generic collection access with session references checked
//!   on write
//! - **Participants**: typed access to the `jeunes` collection and roster
//!   spreadsheet import
//! - **Export**: whole-database JSON dump and restore
//!
//! Services never read an ambient "current session". Operations that work on
//! session-scoped data take a [`SessionContext`] argument.

pub mod export_service;
pub mod import;
pub mod models;
pub mod participant_service;
pub mod record_service;
pub mod session_service;

pub use export_service::ExportService;
pub use models::SessionContext;
pub use participant_service::ParticipantService;
pub use record_service::RecordService;
pub use session_service::SessionService;
