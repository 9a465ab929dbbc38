use crate::domain::{
    lead::{Lead, LeadId},
    sorting::compare_position,
    status::{Status, StatusId},
};
use crate::error::{LeadboardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One status column and the leads it holds, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub status: Status,
    pub lead_ids: Vec<LeadId>,
}

impl Column {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            lead_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> &StatusId {
        &self.status.id
    }

    pub fn len(&self) -> usize {
        self.lead_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lead_ids.is_empty()
    }

    /// Index of `lead_id` within this column
    pub fn index_of(&self, lead_id: &LeadId) -> Option<usize> {
        self.lead_ids.iter().position(|id| id == lead_id)
    }
}

/// In-memory board: columns in status order, each holding an ordered list
/// of lead identifiers.
///
/// Every lead appears in exactly one column. The board is rebuilt from a
/// store snapshot with [`BoardState::load`] and mutated optimistically with
/// [`BoardState::apply_move`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    columns: Vec<Column>,
}

impl BoardState {
    /// Builds the board, bucketing leads with a missing or unknown status
    /// into the first column
    pub fn load(leads: &[Lead], statuses: &[Status]) -> Self {
        Self::load_with_default(leads, statuses, None)
    }

    /// Builds the board with an explicit default column for leads whose
    /// status is missing or unknown. Falls back to the first column when
    /// `default_status` is not one of `statuses`.
    pub fn load_with_default(
        leads: &[Lead],
        statuses: &[Status],
        default_status: Option<&StatusId>,
    ) -> Self {
        let mut ordered: Vec<Status> = statuses.to_vec();
        ordered.sort_by(|a, b| a.position.cmp(&b.position));

        let mut column_index: HashMap<StatusId, usize> = HashMap::new();
        let mut columns: Vec<Column> = Vec::with_capacity(ordered.len());
        for status in ordered {
            if column_index.contains_key(&status.id) {
                tracing::debug!(status = %status.id, "skipping duplicate status");
                continue;
            }
            column_index.insert(status.id.clone(), columns.len());
            columns.push(Column::new(status));
        }

        if columns.is_empty() {
            if !leads.is_empty() {
                tracing::warn!(
                    leads = leads.len(),
                    "board has no statuses; leads cannot be placed"
                );
            }
            return Self { columns };
        }

        let default_index = default_status
            .and_then(|id| column_index.get(id).copied())
            .unwrap_or(0);

        let mut buckets: Vec<Vec<&Lead>> = vec![Vec::new(); columns.len()];
        let mut seen: HashSet<&LeadId> = HashSet::new();
        for lead in leads {
            if !seen.insert(&lead.id) {
                tracing::debug!(lead = %lead.id, "skipping duplicate lead");
                continue;
            }
            let index = match lead.status_id.as_ref().and_then(|id| column_index.get(id)) {
                Some(index) => *index,
                None => {
                    tracing::debug!(
                        lead = %lead.id,
                        status = ?lead.status_id,
                        "lead has unknown status; using default column"
                    );
                    default_index
                }
            };
            buckets[index].push(lead);
        }

        for (column, mut bucket) in columns.iter_mut().zip(buckets) {
            bucket.sort_by(|a, b| compare_position(a, b));
            column.lead_ids = bucket.into_iter().map(|lead| lead.id.clone()).collect();
        }

        Self { columns }
    }

    /// Moves `lead_id` from `from_column` to `to_index` in `to_column`.
    ///
    /// The index is clamped to the target column's bounds after removal.
    /// Returns the index the lead ended up at. On error the board is left
    /// unchanged.
    pub fn apply_move(
        &mut self,
        lead_id: &LeadId,
        from_column: &StatusId,
        to_column: &StatusId,
        to_index: usize,
    ) -> Result<usize> {
        let from = self
            .column_index(from_column)
            .ok_or_else(|| LeadboardError::StatusNotFound(from_column.to_string()))?;
        let to = self
            .column_index(to_column)
            .ok_or_else(|| LeadboardError::StatusNotFound(to_column.to_string()))?;
        let old_index =
            self.columns[from]
                .index_of(lead_id)
                .ok_or_else(|| LeadboardError::LeadNotInColumn {
                    lead: lead_id.to_string(),
                    column: from_column.to_string(),
                })?;

        let id = self.columns[from].lead_ids.remove(old_index);
        let target = &mut self.columns[to].lead_ids;
        let index = to_index.min(target.len());
        target.insert(index, id);
        Ok(index)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, status_id: &StatusId) -> Option<&Column> {
        self.columns.iter().find(|column| column.id() == status_id)
    }

    pub fn contains_column(&self, status_id: &StatusId) -> bool {
        self.column_index(status_id).is_some()
    }

    /// Ordered lead ids of a column
    pub fn lead_ids(&self, status_id: &StatusId) -> Option<&[LeadId]> {
        self.column(status_id).map(|column| column.lead_ids.as_slice())
    }

    /// Finds the column currently holding `lead_id`
    pub fn column_of(&self, lead_id: &LeadId) -> Option<&StatusId> {
        self.locate(lead_id).map(|(status_id, _)| status_id)
    }

    /// Finds the column and index currently holding `lead_id`
    pub fn locate(&self, lead_id: &LeadId) -> Option<(&StatusId, usize)> {
        self.columns.iter().find_map(|column| {
            column
                .index_of(lead_id)
                .map(|index| (column.id(), index))
        })
    }

    /// Total number of leads on the board
    pub fn lead_count(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn column_index(&self, status_id: &StatusId) -> Option<usize> {
        self.columns.iter().position(|column| column.id() == status_id)
    }
}
