//! Project entities and the pure sequence bookkeeping the editor runs on them.

use thiserror::Error;

pub mod contents;
pub mod graphics;
pub mod model;
pub mod offsets;
pub mod sentences;
pub mod tracks;

pub use contents::{add_content, image_offset_at, image_offsets, ImageOffset, DEFAULT_CONTENT_DURATION_MS};
pub use graphics::{add_layer, add_layer_item, default_graphics, DEFAULT_GRAPHIC_ITEM_DURATION_MS};
pub use model::*;
pub use offsets::{offset_at, selected_subtitle_offset, subtitle_offset_at, subtitle_offsets, SubtitleOffset, Timed};
pub use sentences::{
    add_sentence, compare_sentence_order, delete_sentence, edit_sentence, move_sentence, BLANK_SENTENCE_DURATION_MS,
};
pub use tracks::{add_track, calculate_ordering, DEFAULT_TRACK_VOLUME, FALLBACK_MUSIC_DURATION_MS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("index {index} out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<(), TimelineError> {
    if index < len { Ok(()) } else { Err(TimelineError::IndexOutOfRange { index, len }) }
}

pub(crate) fn check_insert(at: usize, len: usize) -> Result<(), TimelineError> {
    if at <= len { Ok(()) } else { Err(TimelineError::IndexOutOfRange { index: at, len }) }
}
