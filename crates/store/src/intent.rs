use timeline::{
    AtvTaskDto, ContentDto, GraphicLayerDto, GraphicLayerItemDto, MusicDto, ProjectDto, SentenceDto,
    SubtitleSettingsDto, TrackDto,
};

use crate::state::{ContentFilter, PlainModal};

/// Every state change the editor can make. Views and the orchestration layer
/// only ever talk to the store through these.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    // ── Editor flags ─────────────────────────────────────────────────────────
    SetIsSubtitleEditing(bool),
    SetActiveModalType(Option<PlainModal>),
    SetActiveIndex(Option<usize>),
    SetIsChangesLocked(bool),

    // ── Authoritative project ────────────────────────────────────────────────
    SetLocalProjectData(ProjectDto),
    SetLocalProjectName(String),
    SetProjectIsSubtitlesEnabled(bool),
    SetProjectContents(Vec<ContentDto>),
    /// Also mirrors each sentence's timing into its voice-over record.
    SetProjectSentences(Vec<SentenceDto>),
    SetProjectMusics(Vec<TrackDto>),
    SetProjectGraphics(Vec<GraphicLayerDto>),
    SetProjectSubtitlesSettings(Option<SubtitleSettingsDto>),

    // ── Script modal ─────────────────────────────────────────────────────────
    SetScriptModalOpen { selected_sentence_index: usize, new_sentence: bool },
    SetScriptModalClose,
    SetScriptModalSentences(Vec<SentenceDto>),
    SetScriptModalSubtitleSettings(SubtitleSettingsDto),
    SetScriptModalSelectedSentenceIndex(Option<usize>),
    SetScriptModalSelectedLineIndex(usize),
    AddScriptModalSentence(usize),
    DeleteScriptModalSentence(usize),
    /// Flags `regenerate` when the text changed.
    EditScriptModalSentence { index: usize, sentence: SentenceDto },
    MoveScriptModalSentence { from: usize, to: usize },
    ApplyScriptModalSubtitleSettingsToAll,
    CommitScriptModal,

    // ── Content modal ────────────────────────────────────────────────────────
    SetContentModalOpen { selected_content_index: usize, new_content: bool },
    SetContentModalClose,
    SetContentModalContents(Vec<ContentDto>),
    SetContentModalFilter(ContentFilter),
    SetContentModalSelectedContentIndex(usize),
    CommitContentModal,

    // ── Track modal ──────────────────────────────────────────────────────────
    SetTrackModalOpen { selected_track_index: usize, new_track: bool },
    SetTrackModalClose,
    SetTrackModalTracks(Vec<TrackDto>),
    SetTrackModalSelectedTrackIndex(usize),
    SetTrackModalVolume(f32),
    SetTrackModalSelectedMusic(Option<MusicDto>),
    CommitTrackModal,

    // ── Graphic item modal ───────────────────────────────────────────────────
    SetGraphicItemModalOpen { selected_layer_index: usize, selected_item_index: usize, new_item: bool, new_layer: bool },
    SetGraphicItemModalClose,
    SetGraphicItemModalItems(Vec<GraphicLayerItemDto>),
    SetGraphicItemModalSelectedItemIndex(Option<usize>),
    CommitGraphicItemModal,

    // ── Remote results ───────────────────────────────────────────────────────
    ProjectDataFetched(ProjectDto),
    ProjectStatusFetched(AtvTaskDto),
}

impl Intent {
    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SetIsSubtitleEditing(_) => "setIsSubtitleEditing",
            Intent::SetActiveModalType(_) => "setActiveModalType",
            Intent::SetActiveIndex(_) => "setActiveIndex",
            Intent::SetIsChangesLocked(_) => "setIsChangesLocked",
            Intent::SetLocalProjectData(_) => "setLocalProjectData",
            Intent::SetLocalProjectName(_) => "setLocalProjectName",
            Intent::SetProjectIsSubtitlesEnabled(_) => "setProjectIsSubtitlesEnabled",
            Intent::SetProjectContents(_) => "setProjectContents",
            Intent::SetProjectSentences(_) => "setProjectSentences",
            Intent::SetProjectMusics(_) => "setProjectMusics",
            Intent::SetProjectGraphics(_) => "setProjectGraphics",
            Intent::SetProjectSubtitlesSettings(_) => "setProjectSubtitlesSettings",
            Intent::SetScriptModalOpen { .. } => "setScriptModalOpen",
            Intent::SetScriptModalClose => "setScriptModalClose",
            Intent::SetScriptModalSentences(_) => "setScriptModalSentences",
            Intent::SetScriptModalSubtitleSettings(_) => "setScriptModalSubtitleSettings",
            Intent::SetScriptModalSelectedSentenceIndex(_) => "setScriptModalSelectedSentenceIndex",
            Intent::SetScriptModalSelectedLineIndex(_) => "setScriptModalSelectedLineIndex",
            Intent::AddScriptModalSentence(_) => "addScriptModalSentence",
            Intent::DeleteScriptModalSentence(_) => "deleteScriptModalSentence",
            Intent::EditScriptModalSentence { .. } => "editScriptModalSentence",
            Intent::MoveScriptModalSentence { .. } => "moveScriptModalSentence",
            Intent::ApplyScriptModalSubtitleSettingsToAll => "applyScriptModalSubtitleSettingsToAll",
            Intent::CommitScriptModal => "commitScriptModal",
            Intent::SetContentModalOpen { .. } => "setContentModalOpen",
            Intent::SetContentModalClose => "setContentModalClose",
            Intent::SetContentModalContents(_) => "setContentModalContents",
            Intent::SetContentModalFilter(_) => "setContentModalFilter",
            Intent::SetContentModalSelectedContentIndex(_) => "setContentModalSelectedContentIndex",
            Intent::CommitContentModal => "commitContentModal",
            Intent::SetTrackModalOpen { .. } => "setTrackModalOpen",
            Intent::SetTrackModalClose => "setTrackModalClose",
            Intent::SetTrackModalTracks(_) => "setTrackModalTracks",
            Intent::SetTrackModalSelectedTrackIndex(_) => "setTrackModalSelectedTrackIndex",
            Intent::SetTrackModalVolume(_) => "setTrackModalVolume",
            Intent::SetTrackModalSelectedMusic(_) => "setTrackModalSelectedMusic",
            Intent::CommitTrackModal => "commitTrackModal",
            Intent::SetGraphicItemModalOpen { .. } => "setGraphicItemModalOpen",
            Intent::SetGraphicItemModalClose => "setGraphicItemModalClose",
            Intent::SetGraphicItemModalItems(_) => "setGraphicItemModalItems",
            Intent::SetGraphicItemModalSelectedItemIndex(_) => "setGraphicItemModalSelectedItemIndex",
            Intent::CommitGraphicItemModal => "commitGraphicItemModal",
            Intent::ProjectDataFetched(_) => "projectDataFetched",
            Intent::ProjectStatusFetched(_) => "projectStatusFetched",
        }
    }
}
