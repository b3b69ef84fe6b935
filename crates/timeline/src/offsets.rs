use crate::model::{Millis, SentenceDto};

/// Anything occupying `[start_time, start_time + duration)` on the timeline.
pub trait Timed {
    fn start_time(&self) -> Millis;
    fn duration(&self) -> Millis;

    fn end_time(&self) -> Millis {
        self.start_time() + self.duration()
    }

    fn contains(&self, time: Millis) -> bool {
        self.start_time() <= time && time < self.end_time()
    }
}

impl Timed for SentenceDto {
    fn start_time(&self) -> Millis { self.start_time }
    fn duration(&self) -> Millis { self.duration }
}

/// What is showing at `time`: the element whose interval contains it, else
/// the nearest element starting before it. `None` when `time` precedes all.
pub fn offset_at<T: Timed>(items: &[T], time: Millis) -> Option<&T> {
    if let Some(hit) = items.iter().find(|i| i.contains(time)) {
        return Some(hit);
    }
    items
        .iter()
        .filter(|i| i.start_time() <= time)
        .max_by_key(|i| i.start_time())
}

/// One rendered subtitle line.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleOffset {
    pub sentence_index: usize,
    pub line_index: usize,
    pub text: String,
    pub start_time: Millis,
    pub duration: Millis,
}

impl Timed for SubtitleOffset {
    fn start_time(&self) -> Millis { self.start_time }
    fn duration(&self) -> Millis { self.duration }
}

/// Split every sentence into its editor lines. A sentence's duration is
/// shared among its lines by character count; the last line takes the rest.
pub fn subtitle_offsets(sentences: &[SentenceDto]) -> Vec<SubtitleOffset> {
    let mut out = Vec::new();
    for (sentence_index, sentence) in sentences.iter().enumerate() {
        let lines: Vec<&str> = sentence.text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let total_chars: i64 = lines.iter().map(|l| l.chars().count() as i64).sum();
        let mut start = sentence.start_time;
        let end = sentence.start_time + sentence.duration;
        for (line_index, line) in lines.iter().enumerate() {
            let duration = if line_index + 1 == lines.len() {
                end - start
            } else {
                sentence.duration * line.chars().count() as i64 / total_chars.max(1)
            };
            out.push(SubtitleOffset {
                sentence_index,
                line_index,
                text: (*line).to_string(),
                start_time: start,
                duration,
            });
            start += duration;
        }
    }
    out
}

pub fn selected_subtitle_offset(
    offsets: &[SubtitleOffset],
    sentence_index: usize,
    line_index: usize,
) -> Option<&SubtitleOffset> {
    offsets.iter().find(|o| o.sentence_index == sentence_index && o.line_index == line_index)
}

pub fn subtitle_offset_at(offsets: &[SubtitleOffset], time: Millis) -> Option<&SubtitleOffset> {
    offset_at(offsets, time)
}
