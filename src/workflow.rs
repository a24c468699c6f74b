//! Interpreter translation workflow.
//!
//! [`WorkflowController`] owns the current batch of passages, the selection
//! cursor and the translation form, and mediates every call to the remote
//! passage service. State lives behind a mutex that is only held for
//! synchronous mutation, never across a remote call, so a completion is
//! applied to the state as it is when the call returns.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::error::{Result, SinalizaError, ValidationError};
use crate::forms::{SearchField, SearchForm, TranslationField, TranslationForm};
use crate::notice::Notice;
use crate::passage::{Passage, PassageStatus, SearchCriteria, SiteInfo};
use crate::service::{FetchRequest, FetchedPassage, PassageService, VideoSubmission};

/// Cursor position after a successful submission at `index` in a batch of `len`.
/// The last passage wraps back to the first, whatever its status.
pub fn advance_index(index: usize, len: usize) -> usize {
    if index + 1 < len { index + 1 } else { 0 }
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub batch: Vec<Passage>,
    /// Always `< batch.len()` while the batch is non-empty
    pub selected_index: usize,
    pub site_info: Option<SiteInfo>,
    pub search_form: SearchForm,
    pub translation_form: TranslationForm,
    pub notice: Option<Notice>,
    pub searches_in_flight: usize,
    pub submitting: bool,
    search_generation: u64,
}

impl WorkflowState {
    pub fn selected(&self) -> Option<&Passage> {
        self.batch.get(self.selected_index)
    }

    pub fn pending_count(&self) -> usize {
        self.batch.iter().filter(|p| !p.is_translated()).count()
    }

    pub fn translated_count(&self) -> usize {
        self.batch.iter().filter(|p| p.is_translated()).count()
    }

    fn load_batch(&mut self, fetched: Vec<FetchedPassage>) {
        self.batch = fetched
            .into_iter()
            .enumerate()
            .map(|(index, p)| Passage {
                index,
                content: p.content,
                snapshot_name: p.snapshot_name,
                passage_id: p.passage_id,
                site_url: p.site_url,
                site_id: p.site_id,
                status: PassageStatus::Pending,
            })
            .collect();
        self.selected_index = 0;
        self.site_info = self.batch.first().map(SiteInfo::from);
        self.translation_form.passage_id = self.batch.first().map(|p| p.passage_id);
    }

    fn move_cursor(&mut self, index: usize) {
        self.selected_index = index;
        self.translation_form.passage_id = Some(self.batch[index].passage_id);
    }

    fn clear_batch(&mut self) {
        self.batch.clear();
        self.selected_index = 0;
        self.site_info = None;
        self.translation_form.passage_id = None;
    }

    /// Check submission preconditions in order; the first failure wins.
    fn prepare_submission(&self) -> std::result::Result<(usize, VideoSubmission), ValidationError> {
        let form = &self.translation_form;
        if form.interpreter_id.trim().is_empty() {
            return Err(ValidationError::MissingField("interpreter_id"));
        }
        if form.video_url.trim().is_empty() {
            return Err(ValidationError::MissingField("video_url"));
        }
        validate_video_url(form.video_url.trim())?;

        let passage = self.selected().ok_or(ValidationError::NoPassageLoaded)?;
        if passage.is_translated() {
            return Err(ValidationError::AlreadyTranslated(passage.passage_id));
        }

        Ok((
            self.selected_index,
            VideoSubmission {
                interpreter_id: form.interpreter_id.trim().to_string(),
                video_url: form.video_url.trim().to_string(),
                passage_id: passage.passage_id,
            },
        ))
    }
}

fn validate_video_url(video_url: &str) -> std::result::Result<(), ValidationError> {
    match Url::parse(video_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        _ => Err(ValidationError::InvalidVideoUrl(video_url.to_string())),
    }
}

pub struct WorkflowController {
    session_id: Uuid,
    service: Box<dyn PassageService>,
    config: WorkflowConfig,
    state: Mutex<WorkflowState>,
}

impl WorkflowController {
    pub fn new(service: Box<dyn PassageService>, config: WorkflowConfig) -> Self {
        let mut state = WorkflowState::default();
        if let Some(interpreter_id) = &config.interpreter_id {
            state.translation_form.interpreter_id = interpreter_id.clone();
        }

        let session_id = Uuid::new_v4();
        debug!("Created workflow session {}", session_id);

        Self {
            session_id,
            service,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a new batch and replace the current one.
    ///
    /// An empty result is not an error: the batch is cleared and an
    /// informational notice is recorded. Failures clear the batch too.
    pub async fn search(&self, criteria: SearchCriteria) -> Result<Vec<Passage>> {
        let span = info_span!("search", session = %self.session_id);
        self.run_search(criteria).instrument(span).await
    }

    /// Search with the criteria currently held in the search form.
    pub async fn search_from_form(&self) -> Result<Vec<Passage>> {
        let criteria = self.lock().search_form.criteria();
        self.search(criteria).await
    }

    async fn run_search(&self, criteria: SearchCriteria) -> Result<Vec<Passage>> {
        let request = FetchRequest::from(&criteria);
        let generation = {
            let mut state = self.lock();
            state.search_generation += 1;
            state.searches_in_flight += 1;
            state.search_generation
        };

        info!(
            "Searching passages (site filter: {}, all from site: {})",
            request.site_id.map(|id| id.to_string()).unwrap_or_else(|| "none".to_string()),
            request.all_from_site
        );

        let result = self.service.fetch_passages(&request).await;

        let mut state = self.lock();
        state.searches_in_flight = state.searches_in_flight.saturating_sub(1);

        if self.config.fence_stale_searches && generation != state.search_generation {
            debug!(
                "Discarding search result {} superseded by {}",
                generation, state.search_generation
            );
            return Err(SinalizaError::Superseded);
        }

        match result {
            Ok(fetched) if fetched.is_empty() => {
                info!("No passages available for the given criteria");
                state.clear_batch();
                state.notice = Some(Notice::info(
                    "No passages available for translation with the given criteria.",
                ));
                Ok(Vec::new())
            }
            Ok(fetched) => {
                state.load_batch(fetched);
                let count = state.batch.len();
                if let Some(site) = &state.site_info {
                    info!("Loaded {} passages from site {} ({})", count, site.site_id, site.site_url);
                }
                state.notice = Some(Notice::success(format!(
                    "Found {} passage(s) for translation!",
                    count
                )));
                Ok(state.batch.clone())
            }
            Err(e) => {
                warn!("Search failed: {}", e);
                state.clear_batch();
                state.notice = Some(Notice::from_error(&e));
                Err(e)
            }
        }
    }

    /// Move the cursor. Out-of-range indices are a caller bug: they panic in
    /// debug builds and are ignored otherwise.
    pub fn select(&self, index: usize) {
        let mut state = self.lock();
        let len = state.batch.len();
        debug_assert!(index < len, "select({}) out of range for batch of {}", index, len);
        if index >= len {
            warn!("Ignoring selection of index {} in batch of {}", index, len);
            return;
        }

        state.move_cursor(index);
    }

    /// Select the following passage. Does nothing on the last one.
    pub fn select_next(&self) -> bool {
        let mut state = self.lock();
        let next = state.selected_index + 1;
        if next >= state.batch.len() {
            return false;
        }
        state.move_cursor(next);
        true
    }

    pub fn update_search_form(&self, field: SearchField, value: &str) {
        self.lock().search_form.update(field, value);
    }

    pub fn update_translation_form(&self, field: TranslationField, value: &str) {
        self.lock().translation_form.update(field, value);
    }

    /// Register the video for the selected passage and move on to the next one.
    ///
    /// `fields` are merged into the stored translation form before validation.
    /// The passage submitted is always the selected one. Only one submission
    /// may be in flight at a time.
    pub async fn submit_translation(&self, fields: TranslationForm) -> Result<()> {
        let span = info_span!("submit", session = %self.session_id);
        self.run_submit(fields).instrument(span).await
    }

    async fn run_submit(&self, fields: TranslationForm) -> Result<()> {
        let (index, submission) = {
            let mut state = self.lock();
            let prepared = if state.submitting {
                Err(ValidationError::SubmissionInProgress)
            } else {
                state.translation_form.merge(fields);
                state.prepare_submission()
            };
            match prepared {
                Ok(prepared) => {
                    state.submitting = true;
                    prepared
                }
                Err(rejection) => {
                    debug!("Submission rejected: {}", rejection);
                    let err = SinalizaError::from(rejection);
                    state.notice = Some(Notice::from_error(&err));
                    return Err(err);
                }
            }
        };

        info!(
            "Submitting video for passage {} (interpreter {})",
            submission.passage_id, submission.interpreter_id
        );

        let result = self.service.submit_video(&submission).await;

        let mut state = self.lock();
        state.submitting = false;

        if let Err(e) = result {
            warn!("Submission for passage {} failed: {}", submission.passage_id, e);
            state.notice = Some(Notice::from_error(&e));
            return Err(e);
        }

        let still_loaded = state
            .batch
            .get(index)
            .is_some_and(|p| p.passage_id == submission.passage_id);

        if still_loaded {
            state.batch[index].status = PassageStatus::Translated;
            let next = advance_index(index, state.batch.len());
            state.selected_index = next;
            let next_id = state.batch[next].passage_id;
            state.translation_form.clear_for_next(Some(next_id));
            debug!("Passage {} translated, cursor moved to {}", submission.passage_id, next);
        } else {
            warn!(
                "Batch was replaced while passage {} was being submitted; local state left as is",
                submission.passage_id
            );
            let current = state.selected().map(|p| p.passage_id);
            state.translation_form.clear_for_next(current);
        }

        state.notice = Some(Notice::success(
            "Video registered successfully! Continue with the next passages.",
        ));
        Ok(())
    }

    pub async fn check_service(&self) -> Result<()> {
        self.service.check_availability().await
    }

    /// Snapshot of the whole state.
    pub fn state(&self) -> WorkflowState {
        self.lock().clone()
    }

    pub fn batch(&self) -> Vec<Passage> {
        self.lock().batch.clone()
    }

    pub fn selected(&self) -> Option<Passage> {
        self.lock().selected().cloned()
    }

    pub fn selected_index(&self) -> usize {
        self.lock().selected_index
    }

    pub fn site_info(&self) -> Option<SiteInfo> {
        self.lock().site_info.clone()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.lock().notice.clone()
    }

    pub fn take_notice(&self) -> Option<Notice> {
        self.lock().notice.take()
    }

    pub fn translation_form(&self) -> TranslationForm {
        self.lock().translation_form.clone()
    }

    pub fn search_form(&self) -> SearchForm {
        self.lock().search_form.clone()
    }

    pub fn is_searching(&self) -> bool {
        self.lock().searches_in_flight > 0
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().submitting
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending_count()
    }

    pub fn translated_count(&self) -> usize {
        self.lock().translated_count()
    }
}
