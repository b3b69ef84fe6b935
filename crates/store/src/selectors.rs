//! Memoized read accessors over [`ProjectState`].
//!
//! Root accessors read the state directly. Every derived node is keyed only
//! on the outputs of other selectors, so a node is recomputed exactly when one
//! of its inputs changed identity (shared branches) or value (scalars).

use std::sync::Arc;

use timeline::{
    compare_sentence_order, image_offset_at, image_offsets, selected_subtitle_offset, subtitle_offsets, Aspect,
    ContentDto, GraphicLayerItemDto, ImageOffset, Language, Millis, ProjectDto, ProjectStatus, SentenceDto,
    SubtitleOffset, SubtitleSettingsDto, TrackDto, VoiceOverType,
};

use crate::memo::Memo;
use crate::state::{
    ContentFilter, ContentModalData, GraphicItemModalData, ModalType, ProjectState, ScriptModalData, TrackModalData,
};

type Seq<T> = Arc<Vec<T>>;

#[derive(Debug, Default)]
pub struct Selectors {
    project_id: Memo<Arc<ProjectDto>, Option<String>>,
    language: Memo<Arc<ProjectDto>, Language>,
    aspect: Memo<Arc<ProjectDto>, Aspect>,
    subtitle_settings: Memo<Arc<ProjectDto>, Option<Arc<SubtitleSettingsDto>>>,
    contents: Memo<Arc<ProjectDto>, Seq<ContentDto>>,
    tracks: Memo<Arc<ProjectDto>, Seq<TrackDto>>,
    sentences: Memo<Arc<ProjectDto>, Seq<SentenceDto>>,
    is_ai_voice_over: Memo<Arc<ProjectDto>, bool>,
    is_subtitles_enabled: Memo<Arc<ProjectDto>, bool>,
    status_poll_target: Memo<Arc<ProjectDto>, Option<String>>,
    is_regenerate_needed: Memo<Seq<SentenceDto>, bool>,
    is_export_blocked: Memo<(bool, bool, bool), bool>,
    script_subtitle_settings:
        Memo<(Seq<SentenceDto>, Option<Arc<SubtitleSettingsDto>>, Option<usize>), SubtitleSettingsDto>,
    script_modal_sentences: Memo<Option<Arc<ScriptModalData>>, Seq<SentenceDto>>,
    script_modal_subtitle_settings:
        Memo<(Seq<SentenceDto>, Option<Arc<SubtitleSettingsDto>>, Option<usize>), SubtitleSettingsDto>,
    script_modal_subtitle_offsets: Memo<Seq<SentenceDto>, Seq<SubtitleOffset>>,
    script_modal_selected_subtitle_offset: Memo<(Seq<SubtitleOffset>, usize, usize), Option<SubtitleOffset>>,
    image_offsets: Memo<Seq<ContentDto>, Seq<ImageOffset>>,
    image_offset_by_start_time: Memo<(Seq<ImageOffset>, Option<i64>), Option<ImageOffset>>,
    content_modal_contents: Memo<Option<Arc<ContentModalData>>, Seq<ContentDto>>,
    track_modal_tracks: Memo<Option<Arc<TrackModalData>>, Seq<TrackDto>>,
    graphic_item_modal_items: Memo<Option<Arc<GraphicItemModalData>>, Seq<GraphicLayerItemDto>>,
}

fn seq<T: Clone>(items: Option<&Vec<T>>) -> Seq<T> {
    Arc::new(items.cloned().unwrap_or_default())
}

fn settings_at(
    sentences: &[SentenceDto],
    project_default: Option<&Arc<SubtitleSettingsDto>>,
    index: Option<usize>,
) -> SubtitleSettingsDto {
    let fallback = || project_default.map(|s| SubtitleSettingsDto::clone(s)).unwrap_or_default();
    match index.and_then(|i| sentences.get(i)) {
        Some(sentence) => sentence.subtitle_settings.clone().unwrap_or_else(fallback),
        None => fallback(),
    }
}

impl Selectors {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Root accessors ───────────────────────────────────────────────────────

    pub fn project_data(&self, state: &ProjectState) -> Arc<ProjectDto> {
        state.project_data.clone()
    }

    pub fn index_active(&self, state: &ProjectState) -> Option<usize> {
        state.active_index
    }

    pub fn is_subtitle_editing(&self, state: &ProjectState) -> bool {
        state.is_subtitle_editing
    }

    pub fn is_changes_locked(&self, state: &ProjectState) -> bool {
        state.is_changes_locked
    }

    pub fn is_project_have_error(&self, state: &ProjectState) -> bool {
        state.is_project_have_error
    }

    pub fn active_modal_type(&self, state: &ProjectState) -> Option<ModalType> {
        state.active_modal.modal_type()
    }

    pub fn script_modal_data(&self, state: &ProjectState) -> Option<Arc<ScriptModalData>> {
        state.active_modal.script().cloned()
    }

    pub fn content_modal_data(&self, state: &ProjectState) -> Option<Arc<ContentModalData>> {
        state.active_modal.content().cloned()
    }

    pub fn track_modal_data(&self, state: &ProjectState) -> Option<Arc<TrackModalData>> {
        state.active_modal.track().cloned()
    }

    pub fn graphic_item_modal_data(&self, state: &ProjectState) -> Option<Arc<GraphicItemModalData>> {
        state.active_modal.graphic_item().cloned()
    }

    // ── Project ──────────────────────────────────────────────────────────────

    pub fn project_id(&mut self, state: &ProjectState) -> Option<String> {
        let project = self.project_data(state);
        self.project_id.get(project, |p| p.id.clone())
    }

    pub fn language(&mut self, state: &ProjectState) -> Language {
        let project = self.project_data(state);
        self.language.get(project, |p| p.language.clone())
    }

    pub fn aspect(&mut self, state: &ProjectState) -> Aspect {
        let project = self.project_data(state);
        self.aspect.get(project, |p| p.aspect.clone())
    }

    /// Project-wide subtitle defaults, when the project sets any.
    pub fn subtitle_settings(&mut self, state: &ProjectState) -> Option<Arc<SubtitleSettingsDto>> {
        let project = self.project_data(state);
        self.subtitle_settings.get(project, |p| p.subtitle_settings.clone().map(Arc::new))
    }

    pub fn contents(&mut self, state: &ProjectState) -> Seq<ContentDto> {
        let project = self.project_data(state);
        self.contents.get(project, |p| seq(p.contents.as_ref()))
    }

    pub fn tracks(&mut self, state: &ProjectState) -> Seq<TrackDto> {
        let project = self.project_data(state);
        self.tracks.get(project, |p| seq(p.tracks.as_ref()))
    }

    pub fn sentences(&mut self, state: &ProjectState) -> Seq<SentenceDto> {
        let project = self.project_data(state);
        self.sentences.get(project, |p| seq(p.sentences.as_ref()))
    }

    pub fn is_ai_voice_over(&mut self, state: &ProjectState) -> bool {
        let project = self.project_data(state);
        self.is_ai_voice_over.get(project, |p| p.voice_over_type == Some(VoiceOverType::AiGenerated))
    }

    pub fn is_subtitles_enabled(&mut self, state: &ProjectState) -> bool {
        let project = self.project_data(state);
        self.is_subtitles_enabled.get(project, |p| p.enable_subtitles)
    }

    /// Project id to poll for generation status: set while the project is
    /// known remotely and its video is not done yet.
    pub fn status_poll_target(&mut self, state: &ProjectState) -> Option<String> {
        let project = self.project_data(state);
        self.status_poll_target
            .get(project, |p| p.id.clone().filter(|_| p.status != ProjectStatus::VideoDone))
    }

    pub fn is_regenerate_needed(&mut self, state: &ProjectState) -> bool {
        let sentences = self.sentences(state);
        self.is_regenerate_needed.get(sentences, |s| s.iter().any(|s| s.regenerate))
    }

    /// Export stays disabled while changes are locked, the voice is stale or
    /// generation failed.
    pub fn is_export_blocked(&mut self, state: &ProjectState) -> bool {
        let key = (self.is_changes_locked(state), self.is_regenerate_needed(state), self.is_project_have_error(state));
        self.is_export_blocked.get(key, |(locked, stale, failed)| *locked || *stale || *failed)
    }

    pub fn script_subtitle_settings(&mut self, state: &ProjectState, index: Option<usize>) -> SubtitleSettingsDto {
        let key = (self.sentences(state), self.subtitle_settings(state), index);
        self.script_subtitle_settings.get(key, |(s, d, i)| settings_at(s, d.as_ref(), *i))
    }

    pub fn image_offsets(&mut self, state: &ProjectState) -> Seq<ImageOffset> {
        let contents = self.contents(state);
        self.image_offsets.get(contents, |c| Arc::new(image_offsets(c)))
    }

    pub fn image_offset_by_start_time(&mut self, state: &ProjectState, time: Option<Millis>) -> Option<ImageOffset> {
        let key = (self.image_offsets(state), time);
        self.image_offset_by_start_time.get(key, |(offsets, t)| t.and_then(|t| image_offset_at(offsets, t).cloned()))
    }

    // ── Script modal ─────────────────────────────────────────────────────────

    /// Working copy in canonical order; empty when the modal is closed.
    pub fn script_modal_sentences(&mut self, state: &ProjectState) -> Seq<SentenceDto> {
        let data = self.script_modal_data(state);
        self.script_modal_sentences.get(data, |d| {
            let mut sentences = d.as_ref().map(|d| d.sentences.clone()).unwrap_or_default();
            sentences.sort_by(compare_sentence_order);
            Arc::new(sentences)
        })
    }

    pub fn script_modal_selected_sentence_index(&self, state: &ProjectState) -> Option<usize> {
        self.script_modal_data(state).and_then(|d| d.selected_sentence_index)
    }

    pub fn script_modal_subtitle_settings(&mut self, state: &ProjectState) -> SubtitleSettingsDto {
        let key = (
            self.script_modal_sentences(state),
            self.subtitle_settings(state),
            self.script_modal_selected_sentence_index(state),
        );
        self.script_modal_subtitle_settings.get(key, |(s, d, i)| settings_at(s, d.as_ref(), *i))
    }

    pub fn script_modal_subtitle_offsets(&mut self, state: &ProjectState) -> Seq<SubtitleOffset> {
        let sentences = self.script_modal_sentences(state);
        self.script_modal_subtitle_offsets.get(sentences, |s| Arc::new(subtitle_offsets(s)))
    }

    pub fn script_modal_selected_subtitle_offset(
        &mut self,
        state: &ProjectState,
        sentence_index: usize,
        line_index: usize,
    ) -> Option<SubtitleOffset> {
        let key = (self.script_modal_subtitle_offsets(state), sentence_index, line_index);
        self.script_modal_selected_subtitle_offset
            .get(key, |(offsets, s, l)| selected_subtitle_offset(offsets, *s, *l).cloned())
    }

    // ── Content / track / graphic modals ─────────────────────────────────────

    pub fn content_modal_contents(&mut self, state: &ProjectState) -> Seq<ContentDto> {
        let data = self.content_modal_data(state);
        self.content_modal_contents.get(data, |d| seq(d.as_ref().map(|d| &d.contents)))
    }

    pub fn content_modal_selected_content_index(&self, state: &ProjectState) -> Option<usize> {
        self.content_modal_data(state).and_then(|d| d.selected_content_index)
    }

    pub fn content_modal_filter(&self, state: &ProjectState) -> Option<ContentFilter> {
        self.content_modal_data(state).map(|d| d.filter)
    }

    pub fn track_modal_tracks(&mut self, state: &ProjectState) -> Seq<TrackDto> {
        let data = self.track_modal_data(state);
        self.track_modal_tracks.get(data, |d| seq(d.as_ref().map(|d| &d.tracks)))
    }

    pub fn track_modal_selected_track_index(&self, state: &ProjectState) -> Option<usize> {
        self.track_modal_data(state).and_then(|d| d.selected_track_index)
    }

    pub fn graphic_item_modal_items(&mut self, state: &ProjectState) -> Seq<GraphicLayerItemDto> {
        let data = self.graphic_item_modal_data(state);
        self.graphic_item_modal_items.get(data, |d| seq(d.as_ref().map(|d| &d.items)))
    }

    // ── Cache introspection ──────────────────────────────────────────────────

    pub fn sentences_recomputations(&self) -> usize {
        self.sentences.recomputations()
    }

    pub fn script_modal_sentences_recomputations(&self) -> usize {
        self.script_modal_sentences.recomputations()
    }

    pub fn image_offsets_recomputations(&self) -> usize {
        self.image_offsets.recomputations()
    }
}
