use std::sync::Arc;

use thiserror::Error;
use timeline::{
    add_content, add_layer, add_layer_item, add_sentence, add_track, calculate_ordering, compare_sentence_order,
    default_graphics, delete_sentence, edit_sentence, move_sentence, ProjectDto, SentenceDto, SubtitleSettingsDto,
    TimelineError, VoiceOverDto, VoiceOverType, FALLBACK_MUSIC_DURATION_MS,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::intent::Intent;
use crate::state::{
    ActiveModal, ContentFilter, ContentModalData, GraphicItemModalData, ModalType, ProjectState, ScriptModalData,
    TrackModalData,
};

/// Why an intent left the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Skip {
    #[error("project has no {0} loaded")]
    MissingSequence(&'static str),
    #[error("{0} modal is not open")]
    ModalNotOpen(ModalType),
    #[error("nothing is selected")]
    NothingSelected,
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped(Skip),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// The single writer of the editor state. Readers take snapshots.
#[derive(Debug, Clone, Default)]
pub struct Store {
    state: Arc<ProjectState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ProjectState) -> Self {
        Self { state: Arc::new(state) }
    }

    /// Latest committed snapshot.
    pub fn state(&self) -> Arc<ProjectState> {
        self.state.clone()
    }

    /// Apply one intent. A skipped intent leaves the previous snapshot in
    /// place, so partial edits never become visible.
    pub fn dispatch(&mut self, intent: Intent) -> Outcome {
        let name = intent.name();
        let mut next = ProjectState::clone(&self.state);
        match reduce(&mut next, intent) {
            Ok(()) => {
                self.state = Arc::new(next);
                debug!(intent = name, "applied");
                Outcome::Applied
            }
            Err(skip) => {
                warn!(intent = name, %skip, "intent skipped");
                Outcome::Skipped(skip)
            }
        }
    }
}

/// Selection for a freshly opened working copy: empty sequences open with
/// nothing selected, otherwise the index must exist.
fn open_selection(index: usize, len: usize) -> Result<Option<usize>, Skip> {
    if len == 0 {
        Ok(None)
    } else if index < len {
        Ok(Some(index))
    } else {
        Err(TimelineError::IndexOutOfRange { index, len }.into())
    }
}

fn checked(index: usize, len: usize) -> Result<usize, Skip> {
    if index < len { Ok(index) } else { Err(TimelineError::IndexOutOfRange { index, len }.into()) }
}

fn script(state: &mut ProjectState) -> Result<&mut ScriptModalData, Skip> {
    state.active_modal.script_mut().ok_or(Skip::ModalNotOpen(ModalType::Script))
}

fn content(state: &mut ProjectState) -> Result<&mut ContentModalData, Skip> {
    state.active_modal.content_mut().ok_or(Skip::ModalNotOpen(ModalType::Visual))
}

fn track(state: &mut ProjectState) -> Result<&mut TrackModalData, Skip> {
    state.active_modal.track_mut().ok_or(Skip::ModalNotOpen(ModalType::Music))
}

fn graphic_item(state: &mut ProjectState) -> Result<&mut GraphicItemModalData, Skip> {
    state.active_modal.graphic_item_mut().ok_or(Skip::ModalNotOpen(ModalType::Graphic))
}

/// Keep voice-over records in step with their sentences on commit.
fn with_voice_timing(sentences: Vec<SentenceDto>) -> Vec<SentenceDto> {
    sentences
        .into_iter()
        .map(|mut s| {
            let voice = s.voice_over.take().unwrap_or_default();
            s.voice_over = Some(VoiceOverDto { start_time: s.start_time, duration: s.duration, ..voice });
            s
        })
        .collect()
}

fn with_graphics_fallback(mut project: ProjectDto) -> ProjectDto {
    if project.graphics.as_ref().map_or(true, Vec::is_empty) {
        project.graphics = Some(default_graphics());
    }
    project
}

fn reduce(state: &mut ProjectState, intent: Intent) -> Result<(), Skip> {
    match intent {
        Intent::SetIsSubtitleEditing(v) => state.is_subtitle_editing = v,
        Intent::SetActiveModalType(modal) => {
            state.active_modal = modal.map_or(ActiveModal::None, ActiveModal::Plain);
        }
        Intent::SetActiveIndex(index) => state.active_index = index,
        Intent::SetIsChangesLocked(v) => state.is_changes_locked = v,

        Intent::SetLocalProjectData(project) | Intent::ProjectDataFetched(project) => {
            state.project_data = Arc::new(with_graphics_fallback(project));
        }
        Intent::SetLocalProjectName(name) => state.project_mut().name = name,
        Intent::SetProjectIsSubtitlesEnabled(v) => state.project_mut().enable_subtitles = v,
        Intent::SetProjectContents(contents) => state.project_mut().contents = Some(contents),
        Intent::SetProjectSentences(sentences) => {
            state.project_mut().sentences = Some(with_voice_timing(sentences));
        }
        Intent::SetProjectMusics(tracks) => state.project_mut().tracks = Some(tracks),
        Intent::SetProjectGraphics(layers) => state.project_mut().graphics = Some(layers),
        Intent::SetProjectSubtitlesSettings(settings) => state.project_mut().subtitle_settings = settings,

        // ── Script modal ─────────────────────────────────────────────────────
        Intent::SetScriptModalOpen { selected_sentence_index, new_sentence } => {
            let current = state.project_data.sentences.as_deref().ok_or(Skip::MissingSequence("sentences"))?;
            let sentences =
                if new_sentence { add_sentence(current, selected_sentence_index)? } else { current.to_vec() };
            let selected_sentence_index = open_selection(selected_sentence_index, sentences.len())?;
            state.active_modal = ActiveModal::Script(Arc::new(ScriptModalData {
                selected_sentence_index,
                selected_line_index: 0,
                sentences,
            }));
            if new_sentence {
                state.is_subtitle_editing = true;
            }
        }
        Intent::SetScriptModalClose
        | Intent::SetContentModalClose
        | Intent::SetTrackModalClose
        | Intent::SetGraphicItemModalClose => state.active_modal = ActiveModal::None,
        Intent::SetScriptModalSentences(sentences) => {
            let data = script(state)?;
            if data.selected_sentence_index.is_some_and(|i| i >= sentences.len()) {
                data.selected_sentence_index = None;
            }
            data.sentences = sentences;
        }
        Intent::SetScriptModalSubtitleSettings(settings) => {
            let data = script(state)?;
            let index = data.selected_sentence_index.ok_or(Skip::NothingSelected)?;
            let sentence = data.sentences.get_mut(index).ok_or(Skip::NothingSelected)?;
            sentence.subtitle_settings = Some(settings);
        }
        Intent::SetScriptModalSelectedSentenceIndex(index) => {
            let data = script(state)?;
            if let Some(i) = index {
                checked(i, data.sentences.len())?;
            }
            data.selected_sentence_index = index;
            data.selected_line_index = 0;
        }
        Intent::SetScriptModalSelectedLineIndex(line) => script(state)?.selected_line_index = line,
        Intent::AddScriptModalSentence(at) => {
            let data = script(state)?;
            data.sentences = add_sentence(&data.sentences, at)?;
            data.selected_sentence_index = Some(at);
            data.selected_line_index = 0;
        }
        Intent::DeleteScriptModalSentence(index) => {
            let data = script(state)?;
            data.sentences = delete_sentence(&data.sentences, index)?;
            data.selected_sentence_index = match data.selected_sentence_index {
                Some(sel) if sel == index => None,
                Some(sel) if sel > index => Some(sel - 1),
                other => other,
            };
        }
        Intent::EditScriptModalSentence { index, mut sentence } => {
            let data = script(state)?;
            let previous = data.sentences.get(index).map(|s| s.text.as_str());
            if previous.is_some_and(|text| text != sentence.text) {
                sentence.regenerate = true;
            }
            data.sentences = edit_sentence(&data.sentences, sentence, index)?;
            data.selected_sentence_index = None;
        }
        Intent::MoveScriptModalSentence { from, to } => {
            let is_voice_generated = state.project_data.voice_over_type == Some(VoiceOverType::AiGenerated);
            let data = script(state)?;
            data.sentences = move_sentence(&data.sentences, from, to, is_voice_generated)?;
        }
        Intent::ApplyScriptModalSubtitleSettingsToAll => {
            let fallback = state.project_data.subtitle_settings.clone().unwrap_or_default();
            let data = script(state)?;
            let settings: SubtitleSettingsDto = data
                .selected_sentence_index
                .and_then(|i| data.sentences.get(i))
                .and_then(|s| s.subtitle_settings.clone())
                .unwrap_or(fallback);
            for s in data.sentences.iter_mut() {
                s.subtitle_settings = Some(settings.clone());
            }
        }
        Intent::CommitScriptModal => {
            let data = state.active_modal.script().ok_or(Skip::ModalNotOpen(ModalType::Script))?;
            let mut sentences = data.sentences.clone();
            sentences.sort_by(compare_sentence_order);
            state.project_mut().sentences = Some(with_voice_timing(sentences));
            state.active_modal = ActiveModal::None;
            state.is_subtitle_editing = false;
        }

        // ── Content modal ────────────────────────────────────────────────────
        Intent::SetContentModalOpen { selected_content_index, new_content } => {
            let current = state.project_data.contents.as_deref().ok_or(Skip::MissingSequence("contents"))?;
            let contents =
                if new_content { add_content(current, selected_content_index)? } else { current.to_vec() };
            let selected_content_index = open_selection(selected_content_index, contents.len())?;
            state.active_modal = ActiveModal::Content(Arc::new(ContentModalData {
                selected_content_index,
                contents,
                filter: ContentFilter::All,
            }));
        }
        Intent::SetContentModalContents(contents) => {
            let data = content(state)?;
            if data.selected_content_index.is_some_and(|i| i >= contents.len()) {
                data.selected_content_index = None;
            }
            data.contents = contents;
        }
        Intent::SetContentModalFilter(filter) => content(state)?.filter = filter,
        Intent::SetContentModalSelectedContentIndex(index) => {
            let data = content(state)?;
            data.selected_content_index = Some(checked(index, data.contents.len())?);
        }
        Intent::CommitContentModal => {
            let data = state.active_modal.content().ok_or(Skip::ModalNotOpen(ModalType::Visual))?;
            let contents = data.contents.clone();
            state.project_mut().contents = Some(contents);
            state.active_modal = ActiveModal::None;
        }

        // ── Track modal ──────────────────────────────────────────────────────
        Intent::SetTrackModalOpen { selected_track_index, new_track } => {
            let current = state.project_data.tracks.as_deref().ok_or(Skip::MissingSequence("tracks"))?;
            let tracks = if new_track { add_track(current, selected_track_index)? } else { current.to_vec() };
            let selected_track_index = open_selection(selected_track_index, tracks.len())?;
            state.active_modal = ActiveModal::Track(Arc::new(TrackModalData { selected_track_index, tracks }));
        }
        Intent::SetTrackModalTracks(tracks) => {
            let data = track(state)?;
            if data.selected_track_index.is_some_and(|i| i >= tracks.len()) {
                data.selected_track_index = None;
            }
            data.tracks = tracks;
        }
        Intent::SetTrackModalSelectedTrackIndex(index) => {
            let data = track(state)?;
            data.selected_track_index = Some(checked(index, data.tracks.len())?);
        }
        Intent::SetTrackModalVolume(volume) => {
            let data = track(state)?;
            let index = data.selected_track_index.ok_or(Skip::NothingSelected)?;
            let item = data.tracks.get_mut(index).ok_or(Skip::NothingSelected)?;
            item.volume = volume;
        }
        Intent::SetTrackModalSelectedMusic(music) => {
            let data = track(state)?;
            let index = data.selected_track_index.ok_or(Skip::NothingSelected)?;
            let item = data.tracks.get_mut(index).ok_or(Skip::NothingSelected)?;
            let had_duration = item.explicit_duration().is_some();
            if !had_duration {
                let adopted = music.as_ref().and_then(|m| m.duration).filter(|d| *d > 0);
                item.duration = Some(adopted.unwrap_or(FALLBACK_MUSIC_DURATION_MS));
            }
            item.music = music;
            if !had_duration {
                data.tracks = calculate_ordering(&data.tracks);
            }
        }
        Intent::CommitTrackModal => {
            let data = state.active_modal.track().ok_or(Skip::ModalNotOpen(ModalType::Music))?;
            let tracks = calculate_ordering(&data.tracks);
            state.project_mut().tracks = Some(tracks);
            state.active_modal = ActiveModal::None;
        }

        // ── Graphic item modal ───────────────────────────────────────────────
        Intent::SetGraphicItemModalOpen { selected_layer_index, selected_item_index, new_item, new_layer } => {
            let current = state.project_data.graphics.as_deref().ok_or(Skip::MissingSequence("graphics"))?;
            let layers = if new_layer { add_layer(current, selected_layer_index)? } else { current.to_vec() };
            let layer = layers
                .get(selected_layer_index)
                .ok_or(TimelineError::IndexOutOfRange { index: selected_layer_index, len: layers.len() })?;
            let items = if new_item { add_layer_item(&layer.items, selected_item_index)? } else { layer.items.clone() };
            let selected_item_index = open_selection(selected_item_index, items.len())?;
            let selected_layer_id = layer.id.clone().unwrap_or_else(|| format!("new_{}", Uuid::new_v4()));
            state.active_modal = ActiveModal::GraphicItem(Arc::new(GraphicItemModalData {
                selected_layer_index,
                selected_item_index,
                items,
                selected_layer_id,
                is_new_layer: new_layer,
            }));
        }
        Intent::SetGraphicItemModalItems(items) => {
            let data = graphic_item(state)?;
            if data.selected_item_index.is_some_and(|i| i >= items.len()) {
                data.selected_item_index = None;
            }
            data.items = items;
        }
        Intent::SetGraphicItemModalSelectedItemIndex(index) => {
            let data = graphic_item(state)?;
            if let Some(i) = index {
                checked(i, data.items.len())?;
            }
            data.selected_item_index = index;
        }
        Intent::CommitGraphicItemModal => {
            let data = state.active_modal.graphic_item().ok_or(Skip::ModalNotOpen(ModalType::Graphic))?.clone();
            let layers = state.project_mut().graphics.get_or_insert_with(Vec::new);
            let existing = if data.is_new_layer {
                None
            } else {
                layers
                    .iter()
                    .position(|l| l.id.as_deref() == Some(data.selected_layer_id.as_str()))
                    .or_else(|| (data.selected_layer_index < layers.len()).then_some(data.selected_layer_index))
            };
            match existing {
                Some(i) => layers[i].items = data.items.clone(),
                None => {
                    let at = data.selected_layer_index.min(layers.len());
                    layers.insert(
                        at,
                        timeline::GraphicLayerDto { id: Some(data.selected_layer_id.clone()), items: data.items.clone() },
                    );
                }
            }
            state.active_modal = ActiveModal::None;
        }

        Intent::ProjectStatusFetched(task) => {
            if task.status.as_ref().is_some_and(|s| s.is_failure()) {
                info!(status = ?task.status, "generation task failed");
                state.is_project_have_error = true;
            }
        }
    }
    Ok(())
}
