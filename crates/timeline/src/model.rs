use serde::{Deserialize, Serialize};

pub type Millis = i64; // timeline positions and durations, milliseconds

/// String-backed enums that keep values the client does not know about.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(s) => s.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(s),
                }
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                match v {
                    $name::Other(s) => s,
                    other => other.as_str().to_string(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Lifecycle of the generated video as reported on the project record.
    ProjectStatus {
        InProgress => "IN_PROGRESS",
        VideoDone => "VIDEO_DONE",
        Error => "ERROR",
    }
);

string_enum!(
    /// Status of the backend generation task (`AtvTaskDto`).
    TaskStatus {
        InProgress => "IN_PROGRESS",
        VideoDone => "VIDEO_DONE",
        Error => "ERROR",
        Ignored => "IGNORED",
    }
);

string_enum!(
    Aspect {
        Landscape16x9 => "16BY9",
        Portrait9x16 => "9BY16",
        Square1x1 => "1BY1",
    }
);

string_enum!(
    Language {
        English => "ENGLISH",
        German => "GERMAN",
        Spanish => "SPANISH",
        French => "FRENCH",
    }
);

string_enum!(
    VoiceOverType {
        AiGenerated => "AI_GENERATED",
        Recorded => "RECORDED",
    }
);

impl TaskStatus {
    /// ERROR and IGNORED block export; they are not retried.
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Error | TaskStatus::Ignored)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::VideoDone | TaskStatus::Error | TaskStatus::Ignored)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubtitlePosition {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleSettingsDto {
    pub font_family: String,
    pub font_size: u32,
    pub font_color: String,
    pub background_color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub uppercase: bool,
    pub position: SubtitlePosition,
    /// Vertical nudge from `position`, in percent of frame height.
    pub offset_y: i32,
}

impl Default for SubtitleSettingsDto {
    fn default() -> Self {
        Self {
            font_family: "Inter".into(),
            font_size: 48,
            font_color: "#FFFFFF".into(),
            background_color: None,
            bold: true,
            italic: false,
            uppercase: false,
            position: SubtitlePosition::Bottom,
            offset_y: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceOverDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub start_time: Millis,
    #[serde(default)]
    pub duration: Millis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub start_time: Millis,
    #[serde(default)]
    pub duration: Millis,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_over: Option<VoiceOverDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_settings: Option<SubtitleSettingsDto>,
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub video: bool,
    #[serde(default)]
    pub duration: Millis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Millis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub start_time: Millis,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Millis>,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicDto>,
}

fn default_volume() -> f32 {
    crate::tracks::DEFAULT_TRACK_VOLUME
}

impl Default for TrackDto {
    fn default() -> Self {
        Self { id: None, start_time: 0, order: 0, duration: None, volume: default_volume(), music: None }
    }
}

impl TrackDto {
    /// Zero counts as "no explicit duration", same as absent.
    pub fn explicit_duration(&self) -> Option<Millis> {
        self.duration.filter(|d| *d > 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicLayerItemDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub start_time: Millis,
    #[serde(default)]
    pub duration: Millis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicLayerDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub items: Vec<GraphicLayerItemDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub length: Millis,
    #[serde(default)]
    pub article_url: String,
    pub language: Language,
    pub aspect: Aspect,
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_over_type: Option<VoiceOverType>,
    #[serde(default = "enabled")]
    pub enable_subtitles: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_settings: Option<SubtitleSettingsDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<ContentDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentences: Option<Vec<SentenceDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<TrackDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphics: Option<Vec<GraphicLayerDto>>,
}

fn enabled() -> bool {
    true
}

impl Default for ProjectDto {
    /// Client-side defaults shown before the first load completes.
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            length: 0,
            article_url: String::new(),
            language: Language::English,
            aspect: Aspect::Landscape16x9,
            status: ProjectStatus::InProgress,
            voice_over_type: None,
            enable_subtitles: true,
            subtitle_settings: None,
            contents: None,
            sentences: None,
            tracks: None,
            graphics: Some(crate::graphics::default_graphics()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtvTaskDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
}
