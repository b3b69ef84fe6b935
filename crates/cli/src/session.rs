use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use api::ProjectApi;
use jobs::{PollConfig, PollEvent, PollHandle, PollRuntime, PollStatus};
use project::{DraftRow, ProjectDb};
use serde::Serialize;
use store::{Intent, Outcome, ProjectState, Selectors, Store};
use timeline::{MusicDto, ProjectDto, TaskStatus};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Draft,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEdit {
    Add { at: usize, text: String },
    Delete { index: usize },
    Edit { index: usize, text: String },
    Move { from: usize, to: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub id: Option<String>,
    pub name: String,
    pub status: String,
    pub language: String,
    pub aspect: String,
    pub sentences: usize,
    pub script_duration_ms: i64,
    pub contents: usize,
    pub tracks: usize,
    pub subtitles_enabled: bool,
    pub regenerate_needed: bool,
    pub export_blocked: bool,
    pub has_error: bool,
    pub poll_target: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WatchReport {
    pub polled: bool,
    pub last_status: Option<TaskStatus>,
    pub has_error: bool,
    pub gave_up: bool,
}

/// Owns one editing session: the store and its selectors, the remote API,
/// the status poller and the local draft database.
pub struct Session {
    store: Store,
    selectors: Selectors,
    api: Arc<dyn ProjectApi>,
    poller: PollHandle,
    drafts: ProjectDb,
    event_timeout: Duration,
}

impl Session {
    pub fn new(api: Arc<dyn ProjectApi>, poll: PollConfig, drafts: ProjectDb) -> Self {
        // one interval plus slack for a slow request
        let event_timeout = poll.interval + Duration::from_secs(60);
        let poller = PollRuntime::start(api.clone(), poll);
        Self { store: Store::new(), selectors: Selectors::new(), api, poller, drafts, event_timeout }
    }

    pub fn state(&self) -> Arc<ProjectState> {
        self.store.state()
    }

    pub fn dispatch(&mut self, intent: Intent) -> Outcome {
        let name = intent.name();
        let outcome = self.store.dispatch(intent);
        if let Outcome::Skipped(skip) = &outcome {
            warn!(intent = name, reason = %skip, "session intent skipped");
        }
        outcome
    }

    /// Dispatch and turn a skip into an error.
    fn apply(&mut self, intent: Intent) -> Result<()> {
        let name = intent.name();
        match self.dispatch(intent) {
            Outcome::Applied => Ok(()),
            Outcome::Skipped(skip) => Err(anyhow!("{name} skipped: {skip}")),
        }
    }

    /// Load `id` from the local draft if one exists, else from the API.
    pub fn load(&mut self, id: &str) -> Result<Source> {
        if let Some(project) = self.drafts.load_draft(id)? {
            info!(id, "loaded local draft");
            self.apply(Intent::SetLocalProjectData(project))?;
            return Ok(Source::Draft);
        }
        self.fetch_remote(id)?;
        Ok(Source::Remote)
    }

    /// Fetch `id` from the API. Returns the status poll target the fetched
    /// project calls for; polling itself only starts in [`Session::watch`].
    pub fn fetch_remote(&mut self, id: &str) -> Result<Option<String>> {
        let project = self.api.get_project_data(id).with_context(|| format!("fetch project {id}"))?;
        info!(id, name = %project.name, "fetched project");
        self.apply(Intent::ProjectDataFetched(project))?;
        let state = self.store.state();
        let target = self.selectors.status_poll_target(&state);
        if let Some(target) = &target {
            info!(project_id = %target, "generation still running");
        }
        Ok(target)
    }

    pub fn summary(&mut self) -> Summary {
        let state = self.store.state();
        let sel = &mut self.selectors;
        let project = sel.project_data(&state);
        let sentences = sel.sentences(&state);
        Summary {
            id: sel.project_id(&state),
            name: project.name.clone(),
            status: project.status.as_str().to_string(),
            language: sel.language(&state).as_str().to_string(),
            aspect: sel.aspect(&state).as_str().to_string(),
            sentences: sentences.len(),
            script_duration_ms: sentences.iter().map(|s| s.duration).sum(),
            contents: sel.contents(&state).len(),
            tracks: sel.tracks(&state).len(),
            subtitles_enabled: sel.is_subtitles_enabled(&state),
            regenerate_needed: sel.is_regenerate_needed(&state),
            export_blocked: sel.is_export_blocked(&state),
            has_error: sel.is_project_have_error(&state),
            poll_target: sel.status_poll_target(&state),
        }
    }

    /// Poll the loaded project's generation status until it settles, feeding
    /// each fetched status back into the store. Refreshes the project once the
    /// video is done.
    pub fn watch(&mut self, mut on_event: impl FnMut(&PollEvent)) -> Result<WatchReport> {
        let state = self.store.state();
        let Some(target) = self.selectors.status_poll_target(&state) else {
            info!("nothing to poll");
            return Ok(WatchReport { has_error: state.is_project_have_error, ..Default::default() });
        };
        let job_id = self.poller.watch(&target)?;
        info!(project_id = %target, %job_id, "watching status");

        let mut report = WatchReport { polled: true, ..Default::default() };
        loop {
            let event = match self.poller.rx_events.recv_timeout(self.event_timeout) {
                Ok(event) => event,
                Err(_) => {
                    self.poller.cancel(&job_id);
                    bail!("no status events for {target} in {:?}", self.event_timeout);
                }
            };
            if event.job_id != job_id {
                continue;
            }
            on_event(&event);
            match event.status {
                PollStatus::Pending | PollStatus::Failed(_) => {}
                PollStatus::Fetched(task) => {
                    report.last_status = task.status.clone();
                    self.dispatch(Intent::ProjectStatusFetched(task));
                }
                PollStatus::Finished => break,
                PollStatus::Exhausted => {
                    report.gave_up = true;
                    break;
                }
                PollStatus::Canceled => bail!("status watch for {target} was canceled"),
            }
        }

        if report.last_status == Some(TaskStatus::VideoDone) {
            if let Err(e) = self.fetch_remote(&target) {
                warn!(error = %e, "refresh after generation failed");
            }
        }
        report.has_error = self.store.state().is_project_have_error;
        Ok(report)
    }

    fn ensure_unlocked(&mut self) -> Result<()> {
        let state = self.store.state();
        if self.selectors.is_changes_locked(&state) {
            bail!("changes are locked for this project");
        }
        Ok(())
    }

    /// Run one script edit through the script modal and commit it.
    pub fn edit_script(&mut self, edit: ScriptEdit) -> Result<()> {
        self.ensure_unlocked()?;
        let result = self.run_script_edit(edit);
        if result.is_err() && self.store.state().active_modal.script().is_some() {
            self.dispatch(Intent::SetScriptModalClose);
        }
        result?;
        self.save_draft()
    }

    fn run_script_edit(&mut self, edit: ScriptEdit) -> Result<()> {
        match edit {
            ScriptEdit::Add { at, text } => {
                self.apply(Intent::SetScriptModalOpen { selected_sentence_index: at, new_sentence: true })?;
                self.rewrite_working_sentence(at, text)?;
            }
            ScriptEdit::Delete { index } => {
                self.apply(Intent::SetScriptModalOpen { selected_sentence_index: index, new_sentence: false })?;
                self.apply(Intent::DeleteScriptModalSentence(index))?;
            }
            ScriptEdit::Edit { index, text } => {
                self.apply(Intent::SetScriptModalOpen { selected_sentence_index: index, new_sentence: false })?;
                self.rewrite_working_sentence(index, text)?;
            }
            ScriptEdit::Move { from, to } => {
                self.apply(Intent::SetScriptModalOpen { selected_sentence_index: from, new_sentence: false })?;
                self.apply(Intent::MoveScriptModalSentence { from, to })?;
            }
        }
        self.apply(Intent::CommitScriptModal)
    }

    fn rewrite_working_sentence(&mut self, index: usize, text: String) -> Result<()> {
        let state = self.store.state();
        let current = state
            .active_modal
            .script()
            .and_then(|data| data.sentences.get(index))
            .cloned()
            .ok_or_else(|| anyhow!("no sentence at {index}"))?;
        self.apply(Intent::EditScriptModalSentence { index, sentence: timeline::SentenceDto { text, ..current } })
    }

    /// Put `music` on track `index` through the track modal and commit.
    pub fn assign_music(&mut self, index: usize, music: MusicDto) -> Result<()> {
        self.ensure_unlocked()?;
        let result = self
            .apply(Intent::SetTrackModalOpen { selected_track_index: index, new_track: false })
            .and_then(|_| self.apply(Intent::SetTrackModalSelectedMusic(Some(music))))
            .and_then(|_| self.apply(Intent::CommitTrackModal));
        if result.is_err() && self.store.state().active_modal.track().is_some() {
            self.dispatch(Intent::SetTrackModalClose);
        }
        result?;
        self.save_draft()
    }

    pub fn save_draft(&self) -> Result<()> {
        self.drafts.save_draft(&self.store.state().project_data)
    }

    pub fn drafts(&self) -> Result<Vec<DraftRow>> {
        self.drafts.list_drafts()
    }

    pub fn discard_draft(&self, id: &str) -> Result<bool> {
        self.drafts.delete_draft(id)
    }

    /// Send the stored draft for `id` to the API and adopt what comes back.
    pub fn push(&mut self, id: &str) -> Result<ProjectDto> {
        let draft = self.drafts.load_draft(id)?.ok_or_else(|| anyhow!("no local draft for {id}"))?;
        let saved = self.api.save_project(&draft).with_context(|| format!("push project {id}"))?;
        self.apply(Intent::ProjectDataFetched(saved.clone()))?;
        self.drafts.save_draft(&saved)?;
        self.drafts.mark_pushed(id)?;
        info!(id, "draft pushed");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::MemoryProjectApi;
    use timeline::{AtvTaskDto, ProjectStatus, SentenceDto, TrackDto, VoiceOverType};

    fn sentences(durations: &[i64]) -> Vec<SentenceDto> {
        let mut start = 0;
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let s = SentenceDto { text: format!("line {i}"), start_time: start, duration: *d, order: i as i64, ..Default::default() };
                start += d;
                s
            })
            .collect()
    }

    fn remote(id: &str) -> ProjectDto {
        ProjectDto {
            id: Some(id.into()),
            name: "Launch".into(),
            status: ProjectStatus::InProgress,
            sentences: Some(sentences(&[1000, 2000, 1500])),
            tracks: Some(vec![
                TrackDto { duration: Some(5000), ..Default::default() },
                TrackDto::default(),
                TrackDto { duration: Some(3000), ..Default::default() },
            ]),
            ..Default::default()
        }
    }

    fn session(api: Arc<MemoryProjectApi>) -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let db = ProjectDb::open_or_create(&dir.path().join("drafts.sqlite")).unwrap();
        let poll = PollConfig { interval: Duration::from_millis(1), max_attempts: 10, workers: 1 };
        (dir, Session::new(api, poll, db))
    }

    fn task(status: TaskStatus) -> AtvTaskDto {
        AtvTaskDto { status: Some(status), ..Default::default() }
    }

    #[test]
    fn load_prefers_local_draft() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(remote("p1"));
        let (_dir, mut s) = session(api);
        assert_eq!(s.load("p1").unwrap(), Source::Remote);
        s.edit_script(ScriptEdit::Edit { index: 0, text: "changed".into() }).unwrap();
        assert_eq!(s.load("p1").unwrap(), Source::Draft);
        let summary = s.summary();
        assert_eq!(summary.sentences, 3);
        assert!(summary.regenerate_needed);
        assert!(summary.export_blocked);
    }

    #[test]
    fn remote_load_reports_poll_target_without_polling() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(remote("p1"));
        api.insert_project(ProjectDto { status: ProjectStatus::VideoDone, ..remote("p2") });
        api.script_statuses("p1", [task(TaskStatus::InProgress)]);
        let (_dir, mut s) = session(api.clone());
        assert_eq!(s.fetch_remote("p1").unwrap(), Some("p1".to_string()));
        assert_eq!(s.summary().poll_target.as_deref(), Some("p1"));
        assert_eq!(s.fetch_remote("p2").unwrap(), None);
        assert_eq!(api.status_calls(), 0);
    }

    #[test]
    fn load_of_unknown_project_fails() {
        let (_dir, mut s) = session(Arc::new(MemoryProjectApi::new()));
        assert!(s.load("ghost").is_err());
    }

    #[test]
    fn script_move_is_committed_and_saved() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(ProjectDto { voice_over_type: Some(VoiceOverType::AiGenerated), ..remote("p1") });
        let (_dir, mut s) = session(api);
        s.load("p1").unwrap();
        s.edit_script(ScriptEdit::Move { from: 2, to: 0 }).unwrap();
        let state = s.state();
        assert!(state.active_modal.script().is_none());
        let committed = state.project_data.sentences.clone().unwrap();
        assert_eq!(committed.iter().map(|x| x.start_time).collect::<Vec<_>>(), [0, 1500, 2500]);
        assert_eq!(committed[0].text, "line 2");
        let draft = s.drafts.load_draft("p1").unwrap().unwrap();
        assert_eq!(draft.sentences, Some(committed));
    }

    #[test]
    fn script_add_inserts_text_and_out_of_range_delete_fails() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(remote("p1"));
        let (_dir, mut s) = session(api);
        s.load("p1").unwrap();
        s.edit_script(ScriptEdit::Add { at: 1, text: "inserted".into() }).unwrap();
        let texts: Vec<String> =
            s.state().project_data.sentences.as_ref().unwrap().iter().map(|x| x.text.clone()).collect();
        assert_eq!(texts, ["line 0", "inserted", "line 1", "line 2"]);

        assert!(s.edit_script(ScriptEdit::Delete { index: 9 }).is_err());
        assert!(s.state().active_modal.script().is_none());
        assert_eq!(s.state().project_data.sentences.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn music_assignment_relays_tracks() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(remote("p1"));
        let (_dir, mut s) = session(api);
        s.load("p1").unwrap();
        let music = MusicDto { name: "calm".into(), duration: Some(4000), ..Default::default() };
        s.assign_music(1, music).unwrap();
        let tracks = s.drafts.load_draft("p1").unwrap().unwrap().tracks.unwrap();
        assert_eq!(tracks.iter().map(|t| t.start_time).collect::<Vec<_>>(), [0, 5000, 9000]);
        assert_eq!(tracks[1].music.as_ref().map(|m| m.name.as_str()), Some("calm"));
    }

    #[test]
    fn locked_project_refuses_edits() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(remote("p1"));
        let (_dir, mut s) = session(api);
        s.load("p1").unwrap();
        s.dispatch(Intent::SetIsChangesLocked(true));
        assert!(s.edit_script(ScriptEdit::Move { from: 0, to: 1 }).is_err());
        assert!(s.drafts().unwrap().is_empty());
    }

    #[test]
    fn watch_feeds_failure_into_error_flag() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(remote("p1"));
        api.script_statuses("p1", [task(TaskStatus::InProgress), task(TaskStatus::Error)]);
        let (_dir, mut s) = session(api);
        s.load("p1").unwrap();
        let mut seen = 0;
        let report = s.watch(|_| seen += 1).unwrap();
        assert!(report.polled);
        assert!(report.has_error);
        assert_eq!(report.last_status, Some(TaskStatus::Error));
        assert!(seen >= 4);
        assert!(s.summary().export_blocked);
    }

    #[test]
    fn watch_refreshes_project_when_video_is_done() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(remote("p1"));
        api.script_statuses("p1", [task(TaskStatus::VideoDone)]);
        let (_dir, mut s) = session(api.clone());
        s.load("p1").unwrap();
        api.insert_project(ProjectDto { status: ProjectStatus::VideoDone, ..remote("p1") });
        let report = s.watch(|_| {}).unwrap();
        assert!(!report.has_error);
        assert_eq!(s.state().project_data.status, ProjectStatus::VideoDone);
        // nothing left to poll
        assert!(!s.watch(|_| {}).unwrap().polled);
    }

    #[test]
    fn push_sends_draft_and_marks_it_clean() {
        let api = Arc::new(MemoryProjectApi::new());
        api.insert_project(remote("p1"));
        let (_dir, mut s) = session(api.clone());
        s.load("p1").unwrap();
        s.edit_script(ScriptEdit::Delete { index: 0 }).unwrap();
        assert!(s.drafts().unwrap()[0].is_dirty());
        s.push("p1").unwrap();
        assert_eq!(api.get_project_data("p1").unwrap().sentences.unwrap().len(), 2);
        assert!(!s.drafts().unwrap()[0].is_dirty());
        assert!(s.push("p2").is_err());
    }
}
