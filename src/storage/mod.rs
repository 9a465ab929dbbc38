use crate::{
    domain::{sorting::compare_position, Lead, LeadId, MoveLeadRequest, Status, StatusId},
    error::{LeadboardError, Result},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub mod file_storage;
pub mod memory_storage;

/// Persistence collaborator for the lead board.
///
/// `move_lead` must be safe to retry: it overwrites the full order of each
/// column it names, so identical requests produce identical stored state.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Loads every status and lead, ordered by status then position
    async fn fetch_board(&self) -> Result<BoardSnapshot>;

    /// Persists the new order of the column(s) a move touched
    async fn move_lead(&self, request: &MoveLeadRequest) -> Result<()>;

    /// Sets or clears a lead's follow-up time
    async fn set_follow_up(&self, lead_id: &LeadId, at: Option<DateTime<Utc>>) -> Result<()>;

    /// Moves a lead to the end of another status column
    async fn set_status(&self, lead_id: &LeadId, status_id: &StatusId) -> Result<()>;

    /// Sets or clears the agent owning a lead
    async fn assign_agent(&self, lead_id: &LeadId, agent_id: Option<&str>) -> Result<()>;

    /// Inserts a new lead or replaces an existing one with the same ID
    async fn save_lead(&self, lead: &Lead) -> Result<()>;
}

/// Full board contents as stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub statuses: Vec<Status>,
    pub leads: Vec<Lead>,
}

impl BoardSnapshot {
    pub fn new(statuses: Vec<Status>, leads: Vec<Lead>) -> Self {
        let mut snapshot = Self { statuses, leads };
        snapshot.sort();
        snapshot
    }

    /// Orders statuses by position and leads by column then position.
    /// Leads with an unknown status sort last.
    pub fn sort(&mut self) {
        self.statuses.sort_by(|a, b| a.position.cmp(&b.position));
        let column_rank: HashMap<&StatusId, usize> = self
            .statuses
            .iter()
            .enumerate()
            .map(|(rank, status)| (&status.id, rank))
            .collect();
        let rank = |lead: &Lead| {
            lead.status_id
                .as_ref()
                .and_then(|id| column_rank.get(id).copied())
                .unwrap_or(usize::MAX)
        };
        self.leads
            .sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| compare_position(a, b)));
    }

    pub fn status(&self, status_id: &StatusId) -> Option<&Status> {
        self.statuses.iter().find(|status| &status.id == status_id)
    }

    pub fn lead(&self, lead_id: &LeadId) -> Option<&Lead> {
        self.leads.iter().find(|lead| &lead.id == lead_id)
    }

    fn lead_mut(&mut self, lead_id: &LeadId) -> Result<&mut Lead> {
        self.leads
            .iter_mut()
            .find(|lead| &lead.id == lead_id)
            .ok_or_else(|| LeadboardError::LeadNotFound(lead_id.to_string()))
    }

    fn require_status(&self, status_id: &StatusId) -> Result<()> {
        match self.status(status_id) {
            Some(_) => Ok(()),
            None => Err(LeadboardError::StatusNotFound(status_id.to_string())),
        }
    }

    /// Rewrites status and position for every lead named in `request`.
    ///
    /// The request is validated as a whole before anything changes. Leads
    /// already at their requested place are left untouched.
    pub fn apply_move(&mut self, request: &MoveLeadRequest) -> Result<()> {
        let known: HashSet<&LeadId> = self.leads.iter().map(|lead| &lead.id).collect();
        for (status_id, order) in request.orders() {
            self.require_status(status_id)?;
            if let Some(missing) = order.iter().find(|id| !known.contains(id)) {
                return Err(LeadboardError::LeadNotFound(missing.to_string()));
            }
        }

        for (status_id, order) in request.orders() {
            for (index, lead_id) in order.iter().enumerate() {
                let position = index as i64;
                let lead = self.lead_mut(lead_id)?;
                if lead.status_id.as_ref() != Some(status_id) || lead.position != position {
                    lead.set_status(status_id.clone(), position);
                }
            }
        }
        self.sort();
        Ok(())
    }

    pub fn set_follow_up(&mut self, lead_id: &LeadId, at: Option<DateTime<Utc>>) -> Result<()> {
        self.lead_mut(lead_id)?.set_follow_up(at);
        Ok(())
    }

    /// Puts the lead after every other lead in `status_id`
    pub fn set_status(&mut self, lead_id: &LeadId, status_id: &StatusId) -> Result<()> {
        self.require_status(status_id)?;
        let position = self
            .leads
            .iter()
            .filter(|lead| &lead.id != lead_id && lead.status_id.as_ref() == Some(status_id))
            .map(|lead| lead.position + 1)
            .max()
            .unwrap_or(0);
        self.lead_mut(lead_id)?.set_status(status_id.clone(), position);
        self.sort();
        Ok(())
    }

    pub fn assign_agent(&mut self, lead_id: &LeadId, agent_id: Option<&str>) -> Result<()> {
        self.lead_mut(lead_id)?
            .assign_agent(agent_id.map(str::to_string));
        Ok(())
    }

    pub fn upsert_lead(&mut self, lead: Lead) {
        match self.leads.iter_mut().find(|existing| existing.id == lead.id) {
            Some(existing) => *existing = lead,
            None => self.leads.push(lead),
        }
        self.sort();
    }
}
