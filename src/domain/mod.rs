pub mod board;
pub mod drag;
pub mod follow_up;
pub mod lead;
pub mod sorting;
pub mod status;

pub use board::{BoardState, Column};
pub use drag::{plan_drop, DragGesture, DropTarget, MoveLeadRequest, MovePlan};
pub use follow_up::{classify_follow_up, DueLead, FollowUpClassifier, FollowUpState};
pub use lead::{Lead, LeadId};
pub use sorting::{sort_leads, SortField, SortOrder};
pub use status::{default_statuses, Status, StatusId};
