use std::sync::Arc;

use serde::{Deserialize, Serialize};
use timeline::{ContentDto, GraphicLayerItemDto, ProjectDto, SentenceDto, TrackDto};

/// The modal discriminator the views switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModalType {
    Visual,
    Script,
    Graphic,
    Music,
    Voice,
    VoiceSelect,
    Export,
    Delete,
    Info,
    Truncated,
}

impl ModalType {
    pub fn as_str(self) -> &'static str {
        match self {
            ModalType::Visual => "visual",
            ModalType::Script => "script",
            ModalType::Graphic => "graphic",
            ModalType::Music => "music",
            ModalType::Voice => "voice",
            ModalType::VoiceSelect => "voice-select",
            ModalType::Export => "export",
            ModalType::Delete => "delete",
            ModalType::Info => "info",
            ModalType::Truncated => "truncated",
        }
    }
}

impl std::fmt::Display for ModalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modals that carry no working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlainModal {
    Voice,
    VoiceSelect,
    Export,
    Delete,
    Info,
    Truncated,
}

impl From<PlainModal> for ModalType {
    fn from(m: PlainModal) -> Self {
        match m {
            PlainModal::Voice => ModalType::Voice,
            PlainModal::VoiceSelect => ModalType::VoiceSelect,
            PlainModal::Export => ModalType::Export,
            PlainModal::Delete => ModalType::Delete,
            PlainModal::Info => ModalType::Info,
            PlainModal::Truncated => ModalType::Truncated,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptModalData {
    pub selected_sentence_index: Option<usize>,
    pub selected_line_index: usize,
    pub sentences: Vec<SentenceDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFilter {
    #[default]
    All,
    Images,
    Videos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentModalData {
    pub selected_content_index: Option<usize>,
    pub contents: Vec<ContentDto>,
    pub filter: ContentFilter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackModalData {
    pub selected_track_index: Option<usize>,
    pub tracks: Vec<TrackDto>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicItemModalData {
    pub selected_layer_index: usize,
    pub selected_item_index: Option<usize>,
    pub items: Vec<GraphicLayerItemDto>,
    /// Id of the edited layer; `new_<uuid>` when the layer has no id yet.
    pub selected_layer_id: String,
    /// Commit inserts a layer instead of updating the one at `selected_layer_index`.
    pub is_new_layer: bool,
}

/// At most one modal is open, and only the open one has a working copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActiveModal {
    #[default]
    None,
    Script(Arc<ScriptModalData>),
    Content(Arc<ContentModalData>),
    Track(Arc<TrackModalData>),
    GraphicItem(Arc<GraphicItemModalData>),
    Plain(PlainModal),
}

impl ActiveModal {
    pub fn modal_type(&self) -> Option<ModalType> {
        match self {
            ActiveModal::None => None,
            ActiveModal::Script(_) => Some(ModalType::Script),
            ActiveModal::Content(_) => Some(ModalType::Visual),
            ActiveModal::Track(_) => Some(ModalType::Music),
            ActiveModal::GraphicItem(_) => Some(ModalType::Graphic),
            ActiveModal::Plain(m) => Some((*m).into()),
        }
    }

    pub fn script(&self) -> Option<&Arc<ScriptModalData>> {
        match self { ActiveModal::Script(d) => Some(d), _ => None }
    }

    pub fn content(&self) -> Option<&Arc<ContentModalData>> {
        match self { ActiveModal::Content(d) => Some(d), _ => None }
    }

    pub fn track(&self) -> Option<&Arc<TrackModalData>> {
        match self { ActiveModal::Track(d) => Some(d), _ => None }
    }

    pub fn graphic_item(&self) -> Option<&Arc<GraphicItemModalData>> {
        match self { ActiveModal::GraphicItem(d) => Some(d), _ => None }
    }

    pub(crate) fn script_mut(&mut self) -> Option<&mut ScriptModalData> {
        match self { ActiveModal::Script(d) => Some(Arc::make_mut(d)), _ => None }
    }

    pub(crate) fn content_mut(&mut self) -> Option<&mut ContentModalData> {
        match self { ActiveModal::Content(d) => Some(Arc::make_mut(d)), _ => None }
    }

    pub(crate) fn track_mut(&mut self) -> Option<&mut TrackModalData> {
        match self { ActiveModal::Track(d) => Some(Arc::make_mut(d)), _ => None }
    }

    pub(crate) fn graphic_item_mut(&mut self) -> Option<&mut GraphicItemModalData> {
        match self { ActiveModal::GraphicItem(d) => Some(Arc::make_mut(d)), _ => None }
    }
}

/// Root of the editor state. Branches sit behind `Arc` and are copied on
/// write, so a snapshot shares every branch an intent did not touch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectState {
    pub project_data: Arc<ProjectDto>,
    pub is_changes_locked: bool,
    pub active_modal: ActiveModal,
    pub active_index: Option<usize>,
    pub is_project_have_error: bool,
    pub is_subtitle_editing: bool,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            project_data: Arc::new(ProjectDto::default()),
            is_changes_locked: false,
            active_modal: ActiveModal::None,
            active_index: None,
            is_project_have_error: false,
            is_subtitle_editing: false,
        }
    }
}

impl ProjectState {
    pub(crate) fn project_mut(&mut self) -> &mut ProjectDto {
        Arc::make_mut(&mut self.project_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_types_map_to_views() {
        assert_eq!(ActiveModal::None.modal_type(), None);
        assert_eq!(ActiveModal::Plain(PlainModal::VoiceSelect).modal_type(), Some(ModalType::VoiceSelect));
        let content = ContentModalData { selected_content_index: None, contents: vec![], filter: ContentFilter::All };
        assert_eq!(ActiveModal::Content(Arc::new(content)).modal_type(), Some(ModalType::Visual));
        assert_eq!(ModalType::VoiceSelect.to_string(), "voice-select");
    }

    #[test]
    fn default_state_has_client_side_project() {
        let s = ProjectState::default();
        assert!(s.project_data.sentences.is_none());
        assert!(s.project_data.enable_subtitles);
        assert!(!s.project_data.graphics.as_ref().unwrap().is_empty());
        assert!(s.active_modal.script().is_none());
    }
}
