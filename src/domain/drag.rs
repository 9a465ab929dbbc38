//! Drag-and-drop resolution: turns a gesture into a concrete move plan and
//! the persistence request describing the resulting column orders.

use crate::domain::{board::BoardState, lead::LeadId, status::StatusId};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Where a dragged lead was released
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum DropTarget {
    /// Dropped on a column's empty area or header
    Column(StatusId),
    /// Dropped over another lead card
    Lead(LeadId),
}

/// A completed pick-up-and-drop interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragGesture {
    pub active: LeadId,
    pub target: DropTarget,
}

impl DragGesture {
    pub fn onto_column(active: LeadId, column: StatusId) -> Self {
        Self {
            active,
            target: DropTarget::Column(column),
        }
    }

    pub fn onto_lead(active: LeadId, over: LeadId) -> Self {
        Self {
            active,
            target: DropTarget::Lead(over),
        }
    }
}

/// A resolved move of one lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    pub lead_id: LeadId,
    pub from_column: StatusId,
    pub from_index: usize,
    pub to_column: StatusId,
    pub to_index: usize,
}

impl MovePlan {
    pub fn is_cross_column(&self) -> bool {
        self.from_column != self.to_column
    }

    /// True when applying the plan would not change the board
    pub fn is_noop(&self) -> bool {
        !self.is_cross_column() && self.from_index == self.to_index
    }

    /// Applies the plan to `board` and returns the persistence request
    /// describing the affected columns afterwards
    pub fn apply(&self, board: &mut BoardState) -> Result<MoveLeadRequest> {
        board.apply_move(&self.lead_id, &self.from_column, &self.to_column, self.to_index)?;
        Ok(MoveLeadRequest::from_board(board, &self.from_column, &self.to_column))
    }

    /// The plan that moves the lead back where it came from
    pub fn inverse(&self) -> MovePlan {
        MovePlan {
            lead_id: self.lead_id.clone(),
            from_column: self.to_column.clone(),
            from_index: self.to_index,
            to_column: self.from_column.clone(),
            to_index: self.from_index,
        }
    }
}

/// Full ordered lead lists for the columns a move touched.
///
/// Persisting overwrites `status_id` and `position` of every listed lead,
/// so sending the same request twice yields the same stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLeadRequest {
    pub from_column: StatusId,
    pub to_column: StatusId,
    pub from_order_ids: Vec<LeadId>,
    pub to_order_ids: Vec<LeadId>,
}

impl MoveLeadRequest {
    pub fn from_board(board: &BoardState, from_column: &StatusId, to_column: &StatusId) -> Self {
        let order = |id: &StatusId| board.lead_ids(id).map(<[LeadId]>::to_vec).unwrap_or_default();
        Self {
            from_column: from_column.clone(),
            to_column: to_column.clone(),
            from_order_ids: if from_column == to_column {
                Vec::new()
            } else {
                order(from_column)
            },
            to_order_ids: order(to_column),
        }
    }

    /// Every column and its new order, skipping the source list for
    /// same-column moves
    pub fn orders(&self) -> impl Iterator<Item = (&StatusId, &[LeadId])> {
        let source = (self.from_column != self.to_column)
            .then(|| (&self.from_column, self.from_order_ids.as_slice()));
        source
            .into_iter()
            .chain(std::iter::once((&self.to_column, self.to_order_ids.as_slice())))
    }
}

/// Resolves a gesture against the current board.
///
/// Returns `None` when the active lead or the drop target cannot be found,
/// which callers treat as a gesture that did not land on a valid drop.
pub fn plan_drop(board: &BoardState, gesture: &DragGesture) -> Option<MovePlan> {
    let (from_column, from_index) = board.locate(&gesture.active)?;

    let (to_column, target_index) = match &gesture.target {
        DropTarget::Column(status_id) => {
            let column = board.column(status_id)?;
            (column.id(), None)
        }
        DropTarget::Lead(over) => {
            let (column, index) = board.locate(over)?;
            (column, Some(index))
        }
    };

    let to_index = if from_column == to_column {
        let last = board.column(to_column).map_or(0, |c| c.len().saturating_sub(1));
        target_index.unwrap_or(last)
    } else {
        target_index.unwrap_or_else(|| board.column(to_column).map_or(0, |c| c.len()))
    };

    Some(MovePlan {
        lead_id: gesture.active.clone(),
        from_column: from_column.clone(),
        from_index,
        to_column: to_column.clone(),
        to_index,
    })
}
