//! The operations behind every button of the workbench.

use std::sync::Arc;

use crate::config::SynthesisConfig;
use crate::corpus::{SentenceField, SentencePair};
use crate::playback::AudioPlayer;
use crate::session::{Action, EditSession, SaveAction, SessionError};
use crate::store::{CorrectionStore, RecordId};
use crate::synthesis::{AudioDecoder, Backend, SynthesisGateway};

use super::state::{BusyGuard, Notice, SharedState};
use super::WorkbenchError;

const PLAY_FAILED: &str = "語音合成失敗";
const SAVE_FAILED: &str = "儲存失敗";
const SAVED: &str = "儲存成功";
const DELETE_FAILED: &str = "刪除失敗";
const DELETED: &str = "已刪除";
const REFRESH_FAILED: &str = "讀取修正紀錄失敗";

/// A save resolved when the operator pressed the button.  Holds the Save
/// busy mark until it is committed or dropped.
#[derive(Debug)]
pub struct PendingSave {
    action: SaveAction,
    snapshot: EditSession,
    busy: BusyGuard,
}

/// Cheaply clonable handle; every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct Workbench {
    state: SharedState,
    corpus: Arc<Vec<SentencePair>>,
    synthesis: Arc<SynthesisConfig>,
    decoder: Arc<AudioDecoder>,
    gateway: Arc<dyn SynthesisGateway>,
    store: Arc<dyn CorrectionStore>,
    player: Arc<dyn AudioPlayer>,
}

impl Workbench {
    pub fn new(
        state: SharedState,
        corpus: Vec<SentencePair>,
        synthesis: &SynthesisConfig,
        gateway: Arc<dyn SynthesisGateway>,
        store: Arc<dyn CorrectionStore>,
        player: Arc<dyn AudioPlayer>,
    ) -> Self {
        Self {
            state,
            corpus: Arc::new(corpus),
            decoder: Arc::new(AudioDecoder::from_config(synthesis)),
            synthesis: Arc::new(synthesis.clone()),
            gateway,
            store,
            player,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    // -----------------------------------------------------------------------
    // Local operations
    // -----------------------------------------------------------------------

    /// Draw a random sentence and start a new draft for it.
    pub fn draw(&self) -> Result<SentencePair, WorkbenchError> {
        let result = {
            let mut st = self.state.lock().unwrap();
            st.session.draw(&self.corpus, &mut rand::thread_rng())
        };
        if let Ok(pair) = &result {
            log::debug!("workbench: drew {} / {}", pair.logographic, pair.romanized);
        }
        self.report(result.map_err(WorkbenchError::from), "")
    }

    /// Load a listed history record into the edit session.
    pub fn select_history(&self, id: &RecordId) -> Result<(), WorkbenchError> {
        let result = {
            let mut st = self.state.lock().unwrap();
            match st.history.iter().find(|r| &r.id == id).cloned() {
                Some(record) => {
                    st.session.select_history(&record);
                    Ok(())
                }
                None => Err(WorkbenchError::UnknownRecord(id.clone())),
            }
        };
        self.report(result, "")
    }

    pub fn edit_draft(&self, field: SentenceField, text: impl Into<String>) {
        self.state.lock().unwrap().session.edit_draft(field, text);
    }

    // -----------------------------------------------------------------------
    // Remote operations
    // -----------------------------------------------------------------------

    /// Synthesize the active sentence for the `field` column's play button
    /// and start playback.
    pub async fn play(&self, field: SentenceField, backend: Backend) -> Result<(), WorkbenchError> {
        let result = self.try_play(field, backend).await;
        self.report(result, PLAY_FAILED)
    }

    async fn try_play(&self, field: SentenceField, backend: Backend) -> Result<(), WorkbenchError> {
        let spoken = self.synthesis.spoken_field(backend, field);
        let text = {
            let st = self.state.lock().unwrap();
            st.session
                .active()
                .map(|pair| pair.form(spoken).to_string())
                .ok_or(SessionError::NoActiveSentence)?
        };
        let _busy = BusyGuard::begin(&self.state, Action::Play { field, backend });

        let language = self.synthesis.language_tag(backend, spoken);
        let raw = self.gateway.synthesize(&text, language, backend).await?;
        let audio = self.decoder.decode(raw)?;

        log::info!(
            "workbench: playing {} via {} ({:?} bytes)",
            field.label(),
            backend.label(),
            audio.byte_len()
        );
        self.player.play(audio);
        Ok(())
    }

    /// Plan a save from the session as it is right now and mark Save busy.
    ///
    /// Returns `Ok(None)` while another save is still in flight.  The
    /// returned [`PendingSave`] is unaffected by later draws or edits.
    pub fn begin_save(&self) -> Result<Option<PendingSave>, WorkbenchError> {
        let planned = {
            let mut st = self.state.lock().unwrap();
            if st.busy.is_busy(Action::Save) {
                log::debug!("workbench: save already in flight");
                return Ok(None);
            }
            let planned = st.session.plan_save().map(|action| (action, st.session.clone()));
            if planned.is_ok() {
                st.busy.begin(Action::Save);
            }
            planned
        };
        let (action, snapshot) = self.report(planned.map_err(WorkbenchError::from), SAVE_FAILED)?;
        Ok(Some(PendingSave {
            action,
            snapshot,
            busy: BusyGuard::adopt(&self.state, Action::Save),
        }))
    }

    /// Plan and commit in one step.
    pub async fn save(&self) -> Result<(), WorkbenchError> {
        match self.begin_save()? {
            Some(pending) => self.commit_save(pending).await,
            None => Ok(()),
        }
    }

    /// Persist a planned save: insert for a drawn sentence, update for a
    /// history record.  On success the drafts are cleared and the history
    /// refetched.
    pub async fn commit_save(&self, pending: PendingSave) -> Result<(), WorkbenchError> {
        let result = self.try_commit(pending).await;
        self.report(result, SAVE_FAILED)?;
        self.set_notice(Notice::info(SAVED));
        // A failed refetch reports itself; the save already happened.
        let _ = self.refresh_history().await;
        Ok(())
    }

    async fn try_commit(&self, pending: PendingSave) -> Result<(), WorkbenchError> {
        let PendingSave {
            action,
            snapshot,
            busy: _busy,
        } = pending;

        match action {
            SaveAction::Insert(new) => {
                self.store.insert(new).await?;
            }
            SaveAction::Update { id, patch } => {
                self.store.update(&id, patch).await?;
            }
        }

        let mut st = self.state.lock().unwrap();
        // Leave the session alone if the operator moved on while saving.
        if st.session == snapshot {
            st.session.complete_save();
        }
        Ok(())
    }

    /// Delete a record and refetch the history.  The edit session is not
    /// touched, even when the record is the one being edited.
    pub async fn delete(&self, id: &RecordId) -> Result<(), WorkbenchError> {
        let result = {
            let _busy = BusyGuard::begin(&self.state, Action::Delete);
            self.store.delete(id).await.map_err(WorkbenchError::from)
        };
        self.report(result, DELETE_FAILED)?;
        self.set_notice(Notice::info(DELETED));
        let _ = self.refresh_history().await;
        Ok(())
    }

    /// Replace the history with the store's current list.
    pub async fn refresh_history(&self) -> Result<(), WorkbenchError> {
        let result = {
            let _busy = BusyGuard::begin(&self.state, Action::RefreshHistory);
            self.store.list().await.map_err(WorkbenchError::from)
        };
        let records = self.report(result, REFRESH_FAILED)?;
        self.state.lock().unwrap().history = records;
        Ok(())
    }

    /// Startup fetch; a failure degrades to an empty history without notice.
    pub async fn load_initial_history(&self) {
        match self.store.list().await {
            Ok(records) => {
                log::info!("workbench: loaded {} history records", records.len());
                self.state.lock().unwrap().history = records;
            }
            Err(e) => {
                log::warn!("workbench: initial history load failed ({e}); starting empty");
                self.state.lock().unwrap().history.clear();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_notice(&self, notice: Notice) {
        self.state.lock().unwrap().notice = Some(notice);
    }

    /// Turn a failure into an error notice, passing the result through.
    fn report<T>(
        &self,
        result: Result<T, WorkbenchError>,
        context: &str,
    ) -> Result<T, WorkbenchError> {
        if let Err(e) = &result {
            let message = match e {
                WorkbenchError::Session(_) | WorkbenchError::UnknownRecord(_) => e.to_string(),
                _ if context.is_empty() => e.to_string(),
                _ => format!("{context}: {e}"),
            };
            log::error!("workbench: {message}");
            self.set_notice(Notice::error(message));
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::RecordingPlayer;
    use crate::session::SessionPhase;
    use crate::store::client::MockCorrectionStore;
    use crate::store::{CorrectionRecord, StoreError};
    use crate::synthesis::gateway::MockGateway;
    use crate::synthesis::{PlayableAudio, RawResponse};
    use crate::workbench::new_shared_state;

    struct Fixture {
        workbench: Workbench,
        gateway: Arc<MockGateway>,
        store: Arc<MockCorrectionStore>,
        player: Arc<RecordingPlayer>,
    }

    impl Fixture {
        fn with(corpus: Vec<SentencePair>, gateway: MockGateway, store: MockCorrectionStore) -> Self {
            let gateway = Arc::new(gateway);
            let store = Arc::new(store);
            let player = Arc::new(RecordingPlayer::default());
            let workbench = Workbench::new(
                new_shared_state(corpus.len()),
                corpus,
                &SynthesisConfig::default(),
                gateway.clone(),
                store.clone(),
                player.clone(),
            );
            Self {
                workbench,
                gateway,
                store,
                player,
            }
        }

        fn rain(store: MockCorrectionStore) -> Self {
            Self::with(vec![rain()], ok_gateway(), store)
        }

        fn session_phase(&self) -> SessionPhase {
            self.workbench.state().lock().unwrap().session.phase()
        }

        fn draft(&self, field: SentenceField) -> String {
            self.workbench
                .state()
                .lock()
                .unwrap()
                .session
                .draft(field)
                .to_string()
        }

        fn notice(&self) -> Option<Notice> {
            self.workbench.state().lock().unwrap().notice.clone()
        }

        fn history(&self) -> Vec<CorrectionRecord> {
            self.workbench.state().lock().unwrap().history.clone()
        }

        fn any_busy(&self) -> bool {
            self.workbench.state().lock().unwrap().busy.any_busy()
        }
    }

    fn rain() -> SentencePair {
        SentencePair::new("雨", "hoo7")
    }

    fn ok_gateway() -> MockGateway {
        // "SGVsbG8=" is base64 for "Hello"
        MockGateway::ok(RawResponse {
            backend: Backend::Inline,
            status: Some(200),
            body: br#"{"result": "SGVsbG8="}"#.to_vec(),
        })
    }

    fn stored_rain(id: &str) -> CorrectionRecord {
        CorrectionRecord {
            id: RecordId::new(id),
            original_hanji: "雨".into(),
            original_lomaji: "hoo7".into(),
            hanji_correction: Some(String::new()),
            lomaji_correction: Some("hōo".into()),
            created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    // ---- draw / select ---

    #[test]
    fn draw_from_empty_corpus_reports_error() {
        let fx = Fixture::with(Vec::new(), ok_gateway(), MockCorrectionStore::new());

        let err = fx.workbench.draw().unwrap_err();

        assert!(matches!(err, WorkbenchError::Session(SessionError::EmptyCorpus)));
        assert!(fx.notice().unwrap().is_error());
        assert_eq!(fx.session_phase(), SessionPhase::Fresh);
    }

    #[test]
    fn selecting_unlisted_record_fails() {
        let fx = Fixture::rain(MockCorrectionStore::new());
        let err = fx.workbench.select_history(&RecordId::new("404")).unwrap_err();
        assert!(matches!(err, WorkbenchError::UnknownRecord(_)));
        assert_eq!(fx.session_phase(), SessionPhase::Fresh);
    }

    // ---- play ---

    #[tokio::test]
    async fn play_synthesizes_active_form_and_plays_it() {
        let fx = Fixture::rain(MockCorrectionStore::new());
        fx.workbench.draw().unwrap();

        fx.workbench
            .play(SentenceField::Romanized, Backend::Inline)
            .await
            .unwrap();

        assert_eq!(
            fx.gateway.calls.lock().unwrap().clone(),
            vec![("hoo7".to_string(), "tb".to_string(), Backend::Inline)]
        );
        assert_eq!(
            fx.player.played(),
            vec![PlayableAudio::Bytes {
                data: b"Hello".to_vec(),
                mime_type: "audio/mp3".into()
            }]
        );
        assert!(!fx.any_busy());
    }

    #[tokio::test]
    async fn both_columns_speak_romanized_on_inline_backend() {
        let fx = Fixture::rain(MockCorrectionStore::new());
        fx.workbench.draw().unwrap();

        for field in SentenceField::ALL {
            fx.workbench.play(field, Backend::Inline).await.unwrap();
        }

        let expected = ("hoo7".to_string(), "tb".to_string(), Backend::Inline);
        assert_eq!(
            fx.gateway.calls.lock().unwrap().clone(),
            vec![expected.clone(), expected]
        );
        assert_eq!(fx.player.played().len(), 2);
    }

    #[tokio::test]
    async fn play_without_sentence_makes_no_call() {
        let fx = Fixture::rain(MockCorrectionStore::new());

        let err = fx
            .workbench
            .play(SentenceField::Logographic, Backend::Inline)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkbenchError::Session(SessionError::NoActiveSentence)));
        assert_eq!(fx.gateway.call_count(), 0);
        assert_eq!(fx.notice().unwrap().message, "請先抽選句子");
    }

    #[tokio::test]
    async fn play_failure_is_reported_and_clears_busy() {
        let fx = Fixture::with(
            vec![rain()],
            MockGateway::failing("connection refused"),
            MockCorrectionStore::new(),
        );
        fx.workbench.draw().unwrap();

        let err = fx
            .workbench
            .play(SentenceField::Logographic, Backend::Inline)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkbenchError::Transport(_)));
        let notice = fx.notice().unwrap();
        assert!(notice.is_error());
        assert!(notice.message.starts_with(PLAY_FAILED));
        assert!(fx.player.played().is_empty());
        assert!(!fx.any_busy());
    }

    #[tokio::test]
    async fn undecodable_response_plays_nothing() {
        let fx = Fixture::with(
            vec![rain()],
            MockGateway::ok(RawResponse {
                backend: Backend::Inline,
                status: Some(503),
                body: Vec::new(),
            }),
            MockCorrectionStore::new(),
        );
        fx.workbench.draw().unwrap();

        let err = fx
            .workbench
            .play(SentenceField::Logographic, Backend::Inline)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkbenchError::Decode(crate::synthesis::DecodeError::Transport { status: 503 })
        ));
        assert!(fx.player.played().is_empty());
    }

    // ---- save ---

    #[tokio::test]
    async fn saving_a_drawn_sentence_inserts_and_refreshes() {
        let fx = Fixture::rain(MockCorrectionStore::new());
        fx.workbench.draw().unwrap();
        fx.workbench.edit_draft(SentenceField::Romanized, "hōo");

        fx.workbench.save().await.unwrap();

        let stored = fx.store.records();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].original_hanji, "雨");
        assert_eq!(stored[0].original_lomaji, "hoo7");
        assert_eq!(stored[0].hanji_correction.as_deref(), Some(""));
        assert_eq!(stored[0].lomaji_correction.as_deref(), Some("hōo"));

        assert_eq!(fx.history(), stored);
        assert_eq!(fx.session_phase(), SessionPhase::DraftingNew);
        assert_eq!(fx.draft(SentenceField::Romanized), "");
        assert_eq!(fx.notice(), Some(Notice::info(SAVED)));
        assert!(!fx.any_busy());
    }

    #[tokio::test]
    async fn saving_a_history_item_updates_in_place() {
        let fx = Fixture::rain(MockCorrectionStore::with_records(vec![stored_rain("1")]));
        fx.workbench.load_initial_history().await;
        fx.workbench.select_history(&RecordId::new("1")).unwrap();
        fx.workbench.edit_draft(SentenceField::Romanized, "hōo-7");

        fx.workbench.save().await.unwrap();

        let stored = fx.store.records();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, RecordId::new("1"));
        assert_eq!(stored[0].original_hanji, "雨");
        assert_eq!(stored[0].original_lomaji, "hoo7");
        assert_eq!(stored[0].created_at, stored_rain("1").created_at);
        assert_eq!(stored[0].lomaji_correction.as_deref(), Some("hōo-7"));
        assert_eq!(fx.history()[0].id, RecordId::new("1"));
        assert_eq!(fx.history()[0].lomaji_correction.as_deref(), Some("hōo-7"));
        assert_eq!(fx.session_phase(), SessionPhase::DraftingNew);
    }

    #[tokio::test]
    async fn history_item_without_corrections_is_not_saved() {
        let mut bare = stored_rain("1");
        bare.hanji_correction = None;
        bare.lomaji_correction = Some(String::new());
        let fx = Fixture::rain(MockCorrectionStore::with_records(vec![bare.clone()]));
        fx.workbench.load_initial_history().await;
        fx.workbench.select_history(&RecordId::new("1")).unwrap();

        let err = fx.workbench.save().await.unwrap_err();

        assert!(matches!(err, WorkbenchError::Session(SessionError::NothingToSave)));
        assert_eq!(fx.store.write_count(), 0);
        assert_eq!(fx.store.records(), vec![bare]);
        assert_eq!(
            fx.session_phase(),
            SessionPhase::DraftingExisting(RecordId::new("1"))
        );
        assert!(!fx.any_busy());
    }

    #[tokio::test]
    async fn pending_save_ignores_later_edits() {
        let fx = Fixture::rain(MockCorrectionStore::new());
        fx.workbench.draw().unwrap();
        fx.workbench.edit_draft(SentenceField::Romanized, "hōo");

        let pending = fx.workbench.begin_save().unwrap().unwrap();
        fx.workbench.edit_draft(SentenceField::Romanized, "hōo-7");
        fx.workbench.commit_save(pending).await.unwrap();

        let stored = fx.store.records();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].lomaji_correction.as_deref(), Some("hōo"));
        // The newer draft is kept for the operator.
        assert_eq!(fx.draft(SentenceField::Romanized), "hōo-7");
        assert!(!fx.any_busy());
    }

    #[tokio::test]
    async fn empty_drafts_are_not_saved() {
        let fx = Fixture::rain(MockCorrectionStore::new());
        fx.workbench.draw().unwrap();

        let err = fx.workbench.save().await.unwrap_err();

        assert!(matches!(err, WorkbenchError::Session(SessionError::NothingToSave)));
        assert!(fx.store.records().is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_drafts_and_history() {
        let fx = Fixture::rain(MockCorrectionStore::with_records(vec![stored_rain("1")]));
        fx.workbench.load_initial_history().await;
        fx.workbench.draw().unwrap();
        fx.workbench.edit_draft(SentenceField::Logographic, "雨水");
        fx.store.fail_with("permission denied");

        let err = fx.workbench.save().await.unwrap_err();

        assert!(matches!(err, WorkbenchError::Store(StoreError::Rejected { .. })));
        assert_eq!(fx.draft(SentenceField::Logographic), "雨水");
        assert_eq!(fx.history(), vec![stored_rain("1")]);
        assert!(fx.notice().unwrap().message.starts_with(SAVE_FAILED));
        assert!(!fx.any_busy());
    }

    #[tokio::test]
    async fn update_after_delete_surfaces_not_found() {
        let fx = Fixture::rain(MockCorrectionStore::with_records(vec![stored_rain("1")]));
        fx.workbench.load_initial_history().await;
        fx.workbench.select_history(&RecordId::new("1")).unwrap();

        fx.workbench.delete(&RecordId::new("1")).await.unwrap();
        assert_eq!(
            fx.session_phase(),
            SessionPhase::DraftingExisting(RecordId::new("1"))
        );

        let err = fx.workbench.save().await.unwrap_err();
        assert!(matches!(err, WorkbenchError::Store(StoreError::NotFound(_))));
    }

    // ---- delete / history ---

    #[tokio::test]
    async fn delete_refreshes_history() {
        let fx = Fixture::rain(MockCorrectionStore::with_records(vec![
            stored_rain("1"),
            stored_rain("2"),
        ]));
        fx.workbench.load_initial_history().await;

        fx.workbench.delete(&RecordId::new("1")).await.unwrap();

        let ids: Vec<_> = fx.history().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RecordId::new("2")]);
        assert_eq!(fx.notice(), Some(Notice::info(DELETED)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_history() {
        let fx = Fixture::rain(MockCorrectionStore::with_records(vec![stored_rain("1")]));
        fx.workbench.load_initial_history().await;
        fx.store.fail_with("timeout");

        assert!(fx.workbench.refresh_history().await.is_err());

        assert_eq!(fx.history().len(), 1);
        assert!(fx.notice().unwrap().message.starts_with(REFRESH_FAILED));
        assert!(!fx.any_busy());
    }

    #[tokio::test]
    async fn initial_history_failure_is_silent() {
        let store = MockCorrectionStore::with_records(vec![stored_rain("1")]);
        store.fail_with("offline");
        let fx = Fixture::rain(store);

        fx.workbench.load_initial_history().await;

        assert!(fx.history().is_empty());
        assert!(fx.notice().is_none());
    }
}
