//! Participants ("jeunes") of a session, including bulk import from a roster
//! spreadsheet.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::import::{parse_roster, ImportLayout};
use crate::domain::models::SessionContext;
use crate::domain::record_service::RecordService;
use crate::storage::{Collection, Record, RecordStorage};
use shared::{ImportParticipantsResponse, Participant, ParticipantListResponse, RejectedRow};

/// Service for managing participants
#[derive(Clone)]
pub struct ParticipantService {
    records: Arc<dyn RecordStorage>,
    record_service: RecordService,
    layout: ImportLayout,
}

impl ParticipantService {
    pub fn new(records: Arc<dyn RecordStorage>, layout: ImportLayout) -> Self {
        Self {
            record_service: RecordService::new(records.clone()),
            records,
            layout,
        }
    }

    /// Participants of the context's session. Records that no longer match
    /// the participant shape are skipped with a warning.
    pub async fn list_participants(&self, ctx: &SessionContext) -> Result<ParticipantListResponse> {
        info!("Listing participants of session {}", ctx.session_id());

        let records = self
            .records
            .get_all(Collection::Participants, Some(ctx.session_id()))
            .await
            .context("Failed to list participants")?;

        let participants: Vec<Participant> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Participant>(record) {
                Ok(participant) => Some(participant),
                Err(e) => {
                    warn!("Skipping unreadable participant record: {}", e);
                    None
                }
            })
            .collect();

        info!("Found {} participants", participants.len());
        Ok(ParticipantListResponse { participants })
    }

    pub async fn get_participant(&self, participant_id: &str) -> Result<Option<Participant>> {
        let record = self.records.get_by_id(Collection::Participants, participant_id).await?;
        record
            .map(serde_json::from_value::<Participant>)
            .transpose()
            .context("Stored participant is unreadable")
    }

    /// Save a participant into the context's session. An empty id is
    /// replaced by a fresh one.
    pub async fn save_participant(&self, ctx: &SessionContext, mut participant: Participant) -> Result<Participant> {
        if participant.last_name.trim().is_empty() {
            return Err(anyhow::anyhow!("Participant last name cannot be empty"));
        }
        if participant.id.trim().is_empty() {
            participant.id = Participant::generate_id();
        }
        participant.session_id = Some(ctx.session_id().to_string());

        let record = serde_json::to_value(&participant)?;
        self.record_service.save(Collection::Participants, &record).await?;

        info!("Saved participant: {} with ID: {}", participant.display_name(), participant.id);
        Ok(participant)
    }

    pub async fn delete_participant(&self, participant_id: &str) -> Result<bool> {
        self.record_service.delete(Collection::Participants, participant_id).await
    }

    /// Parse a roster file and store every participant it yields into the
    /// context's session, all or nothing. Rows that could not be read are
    /// reported back, not stored.
    pub async fn import_spreadsheet(
        &self,
        ctx: &SessionContext,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<ImportParticipantsResponse> {
        info!("Importing participants from '{}' into session {}", file_name, ctx.session_id());

        let report = parse_roster(bytes, file_name, &self.layout)?;

        let mut imported = report.participants;
        for participant in &mut imported {
            participant.session_id = Some(ctx.session_id().to_string());
        }

        let records = imported
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<Record>>>()?;
        if let Some(first) = records.first() {
            self.record_service
                .check_session_reference(Collection::Participants, first)
                .await?;
        }
        self.records
            .save_all_atomic(Collection::Participants, &records)
            .await
            .context("Failed to store imported participants")?;

        let rejected: Vec<RejectedRow> = report
            .rejected
            .into_iter()
            .map(|error| RejectedRow {
                row: error.row,
                reason: error.kind.to_string(),
            })
            .collect();

        info!("Imported {} participants, {} rows rejected", imported.len(), rejected.len());
        // The import is committed; the total is only logged
        match self
            .records
            .count(Collection::Participants, Some(ctx.session_id()))
            .await
        {
            Ok(total) => info!("Session {} now has {} participants", ctx.session_id(), total),
            Err(e) => warn!("Could not count participants after import: {}", e),
        }
        Ok(ImportParticipantsResponse {
            success_message: format!("{} participants imported", imported.len()),
            imported,
            rejected,
        })
    }
}
