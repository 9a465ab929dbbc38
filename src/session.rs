//! A single user's working view of the lead board.
//!
//! Drag gestures are applied to the local [`BoardState`] immediately and
//! persisted afterwards. A failed persist never blocks later gestures; how
//! the local board reacts is controlled by [`FailurePolicy`].

use crate::{
    config::{FailurePolicy, Settings},
    domain::{
        plan_drop, BoardState, DragGesture, DueLead, FollowUpClassifier, FollowUpState, Lead,
        LeadId, MoveLeadRequest, MovePlan, StatusId,
    },
    error::{LeadboardError, Result},
    storage::{BoardSnapshot, LeadStore},
};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::{collections::HashMap, sync::Arc};

/// A move applied locally whose persistence has not settled yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub sequence: u64,
    pub plan: MovePlan,
    pub request: MoveLeadRequest,
}

impl PendingMove {
    /// Sends the move to the store. The future owns nothing from the
    /// session, so it can run while further gestures are applied.
    pub async fn persist<S: LeadStore + ?Sized>(&self, store: &S) -> Result<()> {
        store.move_lead(&self.request).await
    }
}

/// Result of applying a gesture locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropStart {
    /// The gesture did not resolve to a lead and a drop target
    Ignored,
    /// The drop would leave the board as it is
    Unchanged,
    Pending(PendingMove),
}

/// How the local board was reconciled after a failed persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Optimistic order kept; UI and store disagree until the next reload
    Kept,
    /// Lead moved back to where it was picked up
    Reverted,
    /// A later move rewrote one of the columns involved, so nothing was undone
    Superseded,
    /// Board reloaded from the store
    Refetched,
    /// Reload was attempted and failed; optimistic order kept
    RefetchFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Ignored,
    Unchanged,
    Persisted(MovePlan),
    Failed {
        plan: MovePlan,
        message: String,
        recovery: Recovery,
    },
}

pub struct BoardSession<S: LeadStore + ?Sized> {
    store: Arc<S>,
    settings: Settings,
    classifier: FollowUpClassifier,
    timezone: FixedOffset,
    board: BoardState,
    snapshot: BoardSnapshot,
    next_sequence: u64,
    // Latest unsettled move touching each column
    latest_move: HashMap<StatusId, u64>,
    last_error: Option<String>,
}

impl<S: LeadStore + ?Sized> BoardSession<S> {
    /// Fetches the board and builds the session's local state
    pub async fn open(store: Arc<S>, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let timezone = settings.follow_up.timezone()?;
        let classifier = settings.follow_up.classifier();

        let mut session = Self {
            store,
            settings,
            classifier,
            timezone,
            board: BoardState::default(),
            snapshot: BoardSnapshot::default(),
            next_sequence: 1,
            latest_move: HashMap::new(),
            last_error: None,
        };
        session.refresh().await?;
        Ok(session)
    }

    /// Replaces local state with the store's current board
    pub async fn refresh(&mut self) -> Result<()> {
        let snapshot = self.store.fetch_board().await?;
        self.board = BoardState::load_with_default(
            &snapshot.leads,
            &snapshot.statuses,
            self.settings.board.default_status.as_ref(),
        );
        tracing::debug!(
            columns = self.board.columns().len(),
            leads = self.board.lead_count(),
            "loaded lead board"
        );
        self.snapshot = snapshot;
        self.latest_move.clear();
        Ok(())
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Message of the most recent failed store call, if not yet cleared
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn lead(&self, lead_id: &LeadId) -> Option<&Lead> {
        self.snapshot.lead(lead_id)
    }

    /// Applies a gesture to the local board without touching the store
    pub fn begin_drop(&mut self, gesture: &DragGesture) -> DropStart {
        let Some(plan) = plan_drop(&self.board, gesture) else {
            tracing::debug!(
                lead = %gesture.active,
                target = ?gesture.target,
                "ignoring unresolved drop"
            );
            return DropStart::Ignored;
        };
        if plan.is_noop() {
            return DropStart::Unchanged;
        }

        let request = match plan.apply(&mut self.board) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(lead = %plan.lead_id, error = %err, "ignoring inapplicable drop");
                return DropStart::Ignored;
            }
        };
        self.mirror_locally(&request);

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        for (status_id, _) in request.orders() {
            self.latest_move.insert(status_id.clone(), sequence);
        }
        tracing::debug!(
            lead = %plan.lead_id,
            from = %plan.from_column,
            to = %plan.to_column,
            index = plan.to_index,
            sequence,
            "applied drop locally"
        );

        DropStart::Pending(PendingMove {
            sequence,
            plan,
            request,
        })
    }

    /// Reconciles the local board with the outcome of a persisted move
    pub async fn finish_drop(&mut self, pending: PendingMove, result: Result<()>) -> DropOutcome {
        let lead_id = pending.plan.lead_id.clone();
        // A later request overwrites whole column orders, so the move is
        // only ours to undo while no later move touched its columns.
        let is_latest = pending
            .request
            .orders()
            .all(|(status_id, _)| self.latest_move.get(status_id) == Some(&pending.sequence));
        self.latest_move
            .retain(|_, sequence| *sequence != pending.sequence);

        let err = match result {
            Ok(()) => return DropOutcome::Persisted(pending.plan),
            Err(err) => err,
        };

        let message = err.to_string();
        tracing::warn!(
            lead = %lead_id,
            sequence = pending.sequence,
            error = %message,
            "failed to persist lead move"
        );
        self.last_error = Some(message.clone());

        let policy = self.settings.board.failure_policy;
        let recovery = match policy {
            FailurePolicy::Keep => Recovery::Kept,
            FailurePolicy::Revert if !is_latest => Recovery::Superseded,
            FailurePolicy::Revert => self.revert(&pending.plan),
            FailurePolicy::Refetch => match self.refresh().await {
                Ok(()) => Recovery::Refetched,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to reload board after persist failure");
                    Recovery::RefetchFailed(err.to_string())
                }
            },
        };

        DropOutcome::Failed {
            plan: pending.plan,
            message,
            recovery,
        }
    }

    /// Applies a gesture, persists it and reconciles the result
    pub async fn drop_lead(&mut self, gesture: &DragGesture) -> DropOutcome {
        match self.begin_drop(gesture) {
            DropStart::Ignored => DropOutcome::Ignored,
            DropStart::Unchanged => DropOutcome::Unchanged,
            DropStart::Pending(pending) => {
                let result = pending.persist(self.store.as_ref()).await;
                self.finish_drop(pending, result).await
            }
        }
    }

    fn revert(&mut self, plan: &MovePlan) -> Recovery {
        if self.board.column_of(&plan.lead_id) != Some(&plan.to_column) {
            return Recovery::Superseded;
        }
        match plan.inverse().apply(&mut self.board) {
            Ok(request) => {
                self.mirror_locally(&request);
                Recovery::Reverted
            }
            Err(err) => {
                tracing::debug!(lead = %plan.lead_id, error = %err, "could not revert move");
                Recovery::Superseded
            }
        }
    }

    // Keeps the cached lead records in line with the board so follow-up
    // classification sees the lead's current column.
    fn mirror_locally(&mut self, request: &MoveLeadRequest) {
        if let Err(err) = self.snapshot.apply_move(request) {
            tracing::debug!(error = %err, "local lead cache out of sync with board");
        }
    }

    /// Moves a lead to the end of a column optimistically, then persists.
    ///
    /// A failed persist is reconciled like a failed drop. Unknown leads or
    /// statuses are rejected before anything changes.
    pub async fn set_status(
        &mut self,
        lead_id: &LeadId,
        status_id: &StatusId,
    ) -> Result<DropOutcome> {
        if self.board.column_of(lead_id).is_none() {
            return Err(LeadboardError::LeadNotFound(lead_id.to_string()));
        }
        if !self.board.contains_column(status_id) {
            return Err(LeadboardError::StatusNotFound(status_id.to_string()));
        }

        let gesture = DragGesture::onto_column(lead_id.clone(), status_id.clone());
        let pending = match self.begin_drop(&gesture) {
            DropStart::Pending(pending) => pending,
            DropStart::Unchanged => return Ok(DropOutcome::Unchanged),
            DropStart::Ignored => return Ok(DropOutcome::Ignored),
        };
        let result = self.store.set_status(lead_id, status_id).await;
        Ok(self.finish_drop(pending, result).await)
    }

    /// Pushes the follow-up `snooze_days` past `now` and returns the new time
    pub async fn snooze(&mut self, lead_id: &LeadId, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let at = now + Duration::days(i64::from(self.settings.follow_up.snooze_days));
        self.set_follow_up(lead_id, Some(at)).await?;
        Ok(at)
    }

    /// Marks the follow-up as done by clearing it
    pub async fn complete_follow_up(&mut self, lead_id: &LeadId) -> Result<()> {
        self.set_follow_up(lead_id, None).await
    }

    pub async fn set_follow_up(
        &mut self,
        lead_id: &LeadId,
        at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.require_lead(lead_id)?;
        let result = self.store.set_follow_up(lead_id, at).await;
        self.record(result)?;
        self.snapshot.set_follow_up(lead_id, at)
    }

    pub async fn assign_agent(&mut self, lead_id: &LeadId, agent_id: Option<&str>) -> Result<()> {
        self.require_lead(lead_id)?;
        let result = self.store.assign_agent(lead_id, agent_id).await;
        self.record(result)?;
        self.snapshot.assign_agent(lead_id, agent_id)
    }

    /// Saves a new lead and reloads the board to place it
    pub async fn add_lead(&mut self, lead: Lead) -> Result<()> {
        let result = self.store.save_lead(&lead).await;
        self.record(result)?;
        tracing::info!(lead = %lead.id, "added lead");
        self.refresh().await
    }

    /// Follow-up urgency of one lead, with day boundaries in the configured
    /// timezone
    pub fn follow_up_state(&self, lead_id: &LeadId, now: DateTime<Utc>) -> Option<FollowUpState> {
        let lead = self.snapshot.lead(lead_id)?;
        let status = lead
            .status_id
            .as_ref()
            .and_then(|id| self.snapshot.status(id));
        Some(
            self.classifier
                .classify(lead.follow_up_at, status, &now.with_timezone(&self.timezone)),
        )
    }

    /// Leads due for follow-up, most overdue first
    pub fn follow_up_queue(&self, now: DateTime<Utc>) -> Vec<DueLead<'_>> {
        self.classifier.due_queue(
            &self.snapshot.leads,
            &self.snapshot.statuses,
            &now.with_timezone(&self.timezone),
        )
    }

    fn require_lead(&self, lead_id: &LeadId) -> Result<()> {
        match self.snapshot.lead(lead_id) {
            Some(_) => Ok(()),
            None => Err(LeadboardError::LeadNotFound(lead_id.to_string())),
        }
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::warn!(error = %err, "lead store call failed");
            self.last_error = Some(err.to_string());
        }
        result
    }
}
