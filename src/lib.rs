//! # Leadboard Core
//!
//! Core logic for a lead board: leads grouped into status columns,
//! reordered by drag-and-drop with optimistic local updates, and follow-up
//! due-date tracking.
//!
//! The persisted lead store is a collaborator behind the [`LeadStore`]
//! trait; this crate owns the in-memory board, the reconciliation of drag
//! gestures against it, and follow-up classification.

pub mod config;
pub mod domain;
pub mod error;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::{FailurePolicy, Settings};
pub use domain::{
    board::{BoardState, Column},
    drag::{DragGesture, DropTarget, MoveLeadRequest, MovePlan},
    follow_up::{FollowUpClassifier, FollowUpState},
    lead::{Lead, LeadId},
    status::{Status, StatusId},
};
pub use error::{LeadboardError, Result};
pub use session::{BoardSession, DropOutcome, DropStart, PendingMove, Recovery};
pub use storage::{BoardSnapshot, LeadStore};
