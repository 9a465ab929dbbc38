use crate::{
    domain::{default_statuses, Lead, LeadId, MoveLeadRequest, StatusId},
    error::Result,
    storage::{BoardSnapshot, LeadStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// In-process lead store, useful for previews and tests
#[derive(Debug, Default)]
pub struct MemoryLeadStore {
    snapshot: RwLock<BoardSnapshot>,
}

impl MemoryLeadStore {
    pub fn new(mut snapshot: BoardSnapshot) -> Self {
        snapshot.sort();
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    /// An empty store seeded with the default statuses
    pub fn with_default_statuses() -> Self {
        Self::new(BoardSnapshot::new(default_statuses(), Vec::new()))
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn fetch_board(&self) -> Result<BoardSnapshot> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn move_lead(&self, request: &MoveLeadRequest) -> Result<()> {
        self.snapshot.write().await.apply_move(request)
    }

    async fn set_follow_up(&self, lead_id: &LeadId, at: Option<DateTime<Utc>>) -> Result<()> {
        self.snapshot.write().await.set_follow_up(lead_id, at)
    }

    async fn set_status(&self, lead_id: &LeadId, status_id: &StatusId) -> Result<()> {
        self.snapshot.write().await.set_status(lead_id, status_id)
    }

    async fn assign_agent(&self, lead_id: &LeadId, agent_id: Option<&str>) -> Result<()> {
        self.snapshot.write().await.assign_agent(lead_id, agent_id)
    }

    async fn save_lead(&self, lead: &Lead) -> Result<()> {
        self.snapshot.write().await.upsert_lead(lead.clone());
        Ok(())
    }
}
