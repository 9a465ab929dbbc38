use crate::{
    domain::{default_statuses, Lead, LeadId, MoveLeadRequest, StatusId},
    error::{LeadboardError, Result},
    storage::{BoardSnapshot, LeadStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};

/// File-based lead store keeping the whole board in one JSON document
pub struct FileLeadStore {
    root_path: PathBuf,
    // Serializes read-modify-write cycles on the board file
    write_lock: Mutex<()>,
}

impl FileLeadStore {
    pub const LEADBOARD_DIR: &'static str = ".leadboard";
    const BOARD_FILE: &'static str = "board.json";

    /// Creates a new FileLeadStore for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::LEADBOARD_DIR),
            write_lock: Mutex::new(()),
        }
    }

    fn board_file(&self) -> PathBuf {
        self.root_path.join(Self::BOARD_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    /// Creates the directory and a board with the default statuses
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        if !self.board_file().exists() {
            let snapshot = BoardSnapshot::new(default_statuses(), Vec::new());
            self.write_snapshot(&snapshot).await?;
            tracing::info!(path = ?self.board_file(), "initialized lead board");
        }
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.board_file().exists()
    }

    async fn read_snapshot(&self) -> Result<BoardSnapshot> {
        let board_file = self.board_file();

        if !board_file.exists() {
            return Err(LeadboardError::BoardNotInitialized);
        }

        let contents = fs::read_to_string(&board_file).await?;
        let mut snapshot: BoardSnapshot = serde_json::from_str(&contents)?;
        snapshot.sort();
        Ok(snapshot)
    }

    async fn write_snapshot(&self, snapshot: &BoardSnapshot) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.board_file().with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, self.board_file()).await?;
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BoardSnapshot) -> Result<()> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.read_snapshot().await?;
        apply(&mut snapshot)?;
        self.write_snapshot(&snapshot).await
    }
}

#[async_trait]
impl LeadStore for FileLeadStore {
    async fn fetch_board(&self) -> Result<BoardSnapshot> {
        self.read_snapshot().await
    }

    async fn move_lead(&self, request: &MoveLeadRequest) -> Result<()> {
        self.update(|snapshot| snapshot.apply_move(request)).await
    }

    async fn set_follow_up(&self, lead_id: &LeadId, at: Option<DateTime<Utc>>) -> Result<()> {
        self.update(|snapshot| snapshot.set_follow_up(lead_id, at))
            .await
    }

    async fn set_status(&self, lead_id: &LeadId, status_id: &StatusId) -> Result<()> {
        self.update(|snapshot| snapshot.set_status(lead_id, status_id))
            .await
    }

    async fn assign_agent(&self, lead_id: &LeadId, agent_id: Option<&str>) -> Result<()> {
        self.update(|snapshot| snapshot.assign_agent(lead_id, agent_id))
            .await
    }

    async fn save_lead(&self, lead: &Lead) -> Result<()> {
        self.update(|snapshot| {
            snapshot.upsert_lead(lead.clone());
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_storage_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileLeadStore::new(temp_dir.path());

        assert!(!storage.is_initialized().await);

        storage.initialize().await.unwrap();

        assert!(storage.is_initialized().await);
        let snapshot = storage.fetch_board().await.unwrap();
        assert_eq!(snapshot.statuses.len(), 5);
        assert!(snapshot.leads.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_before_initialize_fails() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileLeadStore::new(temp_dir.path());

        let err = storage.fetch_board().await.unwrap_err();
        assert!(matches!(err, LeadboardError::BoardNotInitialized));
    }

    #[tokio::test]
    async fn test_lead_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileLeadStore::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let mut lead = Lead::new("Test Lead".to_string(), StatusId::new("new"));
        lead.email = Some("lead@example.com".to_string());
        storage.save_lead(&lead).await.unwrap();

        let snapshot = storage.fetch_board().await.unwrap();
        let loaded = snapshot.lead(&lead.id).unwrap();
        assert_eq!(loaded.name, "Test Lead");
        assert_eq!(loaded.email.as_deref(), Some("lead@example.com"));
    }

    #[tokio::test]
    async fn test_move_lead_is_idempotent_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileLeadStore::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let a = Lead::with_id(LeadId::new("a"), "A".to_string(), StatusId::new("new"));
        let mut b = Lead::with_id(LeadId::new("b"), "B".to_string(), StatusId::new("new"));
        b.position = 1;
        storage.save_lead(&a).await.unwrap();
        storage.save_lead(&b).await.unwrap();

        let request = MoveLeadRequest {
            from_column: StatusId::new("new"),
            to_column: StatusId::new("contacted"),
            from_order_ids: vec![LeadId::new("b")],
            to_order_ids: vec![LeadId::new("a")],
        };

        let order = |snapshot: &BoardSnapshot| -> Vec<(String, Option<StatusId>, i64)> {
            snapshot
                .leads
                .iter()
                .map(|l| (l.id.to_string(), l.status_id.clone(), l.position))
                .collect()
        };

        storage.move_lead(&request).await.unwrap();
        let first = order(&storage.fetch_board().await.unwrap());
        storage.move_lead(&request).await.unwrap();
        let second = order(&storage.fetch_board().await.unwrap());

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                ("b".to_string(), Some(StatusId::new("new")), 0),
                ("a".to_string(), Some(StatusId::new("contacted")), 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_update_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileLeadStore::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let lead = Lead::new("Test Lead".to_string(), StatusId::new("new"));
        storage.save_lead(&lead).await.unwrap();

        let result = storage
            .set_status(&lead.id, &StatusId::new("archived"))
            .await;
        assert!(result.is_err());

        let snapshot = storage.fetch_board().await.unwrap();
        assert_eq!(
            snapshot.lead(&lead.id).unwrap().status_id,
            Some(StatusId::new("new"))
        );
    }
}
