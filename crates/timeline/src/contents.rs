use crate::model::{ContentDto, Millis};
use crate::offsets::Timed;
use crate::{check_insert, TimelineError};

pub const DEFAULT_CONTENT_DURATION_MS: Millis = 5_000;

/// Insert an empty visual slot at `at` (0..=len).
pub fn add_content(contents: &[ContentDto], at: usize) -> Result<Vec<ContentDto>, TimelineError> {
    check_insert(at, contents.len())?;
    let mut out = contents.to_vec();
    out.insert(at, ContentDto { duration: DEFAULT_CONTENT_DURATION_MS, ..Default::default() });
    Ok(out)
}

/// Where a visual sits on the timeline, and what to show for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOffset {
    pub content_index: usize,
    pub start_time: Millis,
    pub duration: Millis,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video: bool,
}

impl ImageOffset {
    /// Preview source, falling back to the thumbnail.
    pub fn preview_url(&self) -> Option<&str> {
        self.url.as_deref().or(self.thumbnail_url.as_deref())
    }
}

impl Timed for ImageOffset {
    fn start_time(&self) -> Millis { self.start_time }
    fn duration(&self) -> Millis { self.duration }
}

/// Contents play back to back in sequence order.
pub fn image_offsets(contents: &[ContentDto]) -> Vec<ImageOffset> {
    let mut start = 0;
    contents
        .iter()
        .enumerate()
        .map(|(content_index, c)| {
            let offset = ImageOffset {
                content_index,
                start_time: start,
                duration: c.duration,
                url: c.url.clone(),
                thumbnail_url: c.thumbnail_url.clone(),
                video: c.video,
            };
            start += c.duration.max(0);
            offset
        })
        .collect()
}

pub fn image_offset_at(offsets: &[ImageOffset], time: Millis) -> Option<&ImageOffset> {
    crate::offsets::offset_at(offsets, time)
}
