use std::cmp::Ordering;

use crate::model::{Millis, SentenceDto, VoiceOverDto};
use crate::{check_index, check_insert, TimelineError};

/// Duration given to a freshly inserted, not yet voiced sentence.
pub const BLANK_SENTENCE_DURATION_MS: Millis = 0;

/// Canonical presentation order: `order` first, then start time.
pub fn compare_sentence_order(a: &SentenceDto, b: &SentenceDto) -> Ordering {
    a.order.cmp(&b.order).then(a.start_time.cmp(&b.start_time))
}

fn renumber(sentences: &mut [SentenceDto]) {
    for (i, s) in sentences.iter_mut().enumerate() {
        s.order = i as i64;
    }
}

/// Insert a blank sentence at `at` (0..=len). Later sentences move forward by
/// the blank sentence's duration.
pub fn add_sentence(sentences: &[SentenceDto], at: usize) -> Result<Vec<SentenceDto>, TimelineError> {
    check_insert(at, sentences.len())?;
    let start_time = match sentences.get(at) {
        Some(next) => next.start_time,
        None => sentences.last().map(|s| s.start_time + s.duration).unwrap_or(0),
    };
    let blank = SentenceDto {
        start_time,
        duration: BLANK_SENTENCE_DURATION_MS,
        regenerate: true,
        ..Default::default()
    };
    let mut out = Vec::with_capacity(sentences.len() + 1);
    out.extend_from_slice(&sentences[..at]);
    out.push(blank);
    out.extend(sentences[at..].iter().cloned().map(|mut s| {
        s.start_time += BLANK_SENTENCE_DURATION_MS;
        s
    }));
    renumber(&mut out);
    Ok(out)
}

/// Remove the sentence at `index`; later sentences move back by its duration.
pub fn delete_sentence(sentences: &[SentenceDto], index: usize) -> Result<Vec<SentenceDto>, TimelineError> {
    check_index(index, sentences.len())?;
    let removed = sentences[index].duration;
    let mut out = Vec::with_capacity(sentences.len() - 1);
    out.extend_from_slice(&sentences[..index]);
    out.extend(sentences[index + 1..].iter().cloned().map(|mut s| {
        s.start_time -= removed;
        s
    }));
    renumber(&mut out);
    Ok(out)
}

/// Replace the sentence at `index`, keeping its slot in the order.
pub fn edit_sentence(
    sentences: &[SentenceDto],
    updated: SentenceDto,
    index: usize,
) -> Result<Vec<SentenceDto>, TimelineError> {
    check_index(index, sentences.len())?;
    let mut out = sentences.to_vec();
    let order = out[index].order;
    out[index] = SentenceDto { order, ..updated };
    Ok(out)
}

/// Move the sentence at `from` so that it ends up at `to`.
///
/// With a generated voice the sequence is laid out back to back from the
/// first sentence's original start and the voice-over records follow their
/// sentences. Otherwise only the order changes; timings stay as they were
/// until the voice is regenerated.
pub fn move_sentence(
    sentences: &[SentenceDto],
    from: usize,
    to: usize,
    is_voice_generated: bool,
) -> Result<Vec<SentenceDto>, TimelineError> {
    check_index(from, sentences.len())?;
    check_index(to, sentences.len())?;
    let base = sentences.iter().map(|s| s.start_time).min().unwrap_or(0);

    let mut out = sentences.to_vec();
    let moved = out.remove(from);
    out.insert(to, moved);
    renumber(&mut out);
    if !is_voice_generated {
        return Ok(out);
    }

    let mut cursor = base;
    for s in out.iter_mut() {
        s.start_time = cursor;
        let voice = s.voice_over.get_or_insert_with(VoiceOverDto::default);
        if voice.duration <= 0 {
            voice.duration = s.duration;
        }
        voice.start_time = cursor;
        cursor += s.duration;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laid_out(durations: &[Millis]) -> Vec<SentenceDto> {
        let mut start = 0;
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let s = SentenceDto {
                    id: Some(format!("s{i}")),
                    text: format!("sentence {i}"),
                    start_time: start,
                    duration: *d,
                    order: i as i64,
                    voice_over: Some(VoiceOverDto { url: None, start_time: start, duration: *d }),
                    ..Default::default()
                };
                start += d;
                s
            })
            .collect()
    }

    fn ids(s: &[SentenceDto]) -> Vec<&str> {
        s.iter().map(|s| s.id.as_deref().unwrap_or("")).collect()
    }

    #[test]
    fn add_then_delete_restores_sequence() {
        let s = laid_out(&[1000, 2000, 1500, 700]);
        for i in 0..=s.len() {
            let added = add_sentence(&s, i).unwrap();
            assert_eq!(added.len(), s.len() + 1);
            assert!(added[i].text.is_empty());
            assert!(added[i].regenerate);
            assert_eq!(delete_sentence(&added, i).unwrap(), s, "index {i}");
        }
    }

    #[test]
    fn add_places_blank_at_displaced_start() {
        let s = laid_out(&[1000, 2000]);
        assert_eq!(add_sentence(&s, 1).unwrap()[1].start_time, 1000);
        assert_eq!(add_sentence(&s, 2).unwrap()[2].start_time, 3000);
        assert_eq!(add_sentence(&[], 0).unwrap()[0].start_time, 0);
    }

    #[test]
    fn delete_shifts_following_sentences_back() {
        let s = laid_out(&[1000, 2000, 1500]);
        let out = delete_sentence(&s, 0).unwrap();
        assert_eq!(ids(&out), ["s1", "s2"]);
        assert_eq!(out.iter().map(|s| s.start_time).collect::<Vec<_>>(), [0, 2000]);
        assert_eq!(out.iter().map(|s| s.order).collect::<Vec<_>>(), [0, 1]);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let s = laid_out(&[1000]);
        assert_eq!(delete_sentence(&s, 1), Err(TimelineError::IndexOutOfRange { index: 1, len: 1 }));
        assert!(add_sentence(&s, 2).is_err());
        assert!(edit_sentence(&s, SentenceDto::default(), 3).is_err());
        assert!(move_sentence(&s, 0, 1, true).is_err());
        assert!(move_sentence(&[], 0, 0, false).is_err());
    }

    #[test]
    fn edit_keeps_order_slot() {
        let s = laid_out(&[1000, 2000]);
        let updated = SentenceDto { text: "changed".into(), order: 99, ..s[1].clone() };
        let out = edit_sentence(&s, updated, 1).unwrap();
        assert_eq!(out[1].text, "changed");
        assert_eq!(out[1].order, 1);
        assert_eq!(out[0], s[0]);
    }

    #[test]
    fn move_last_to_front_relays_voice() {
        let s = laid_out(&[1000, 2000, 1500]);
        let out = move_sentence(&s, 2, 0, true).unwrap();
        assert_eq!(ids(&out), ["s2", "s0", "s1"]);
        assert_eq!(out.iter().map(|s| s.start_time).collect::<Vec<_>>(), [0, 1500, 2500]);
        let voice: Vec<_> = out.iter().map(|s| s.voice_over.as_ref().unwrap().start_time).collect();
        assert_eq!(voice, [0, 1500, 2500]);
    }

    #[test]
    fn move_is_contiguous_for_every_pair() {
        let s = laid_out(&[400, 1000, 250, 3000, 800]);
        for from in 0..s.len() {
            for to in 0..s.len() {
                let out = move_sentence(&s, from, to, true).unwrap();
                assert_eq!(out[to].id, s[from].id);
                for w in out.windows(2) {
                    assert_eq!(w[0].start_time + w[0].duration, w[1].start_time);
                    assert!(compare_sentence_order(&w[0], &w[1]).is_lt());
                }
                assert_eq!(out[0].start_time, 0);
            }
        }
    }

    #[test]
    fn move_without_generated_voice_keeps_timings() {
        let s = laid_out(&[1000, 2000, 1500]);
        let out = move_sentence(&s, 2, 0, false).unwrap();
        assert_eq!(ids(&out), ["s2", "s0", "s1"]);
        assert_eq!(out.iter().map(|s| s.order).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(out.iter().map(|s| s.start_time).collect::<Vec<_>>(), [3000, 0, 1000]);
        let voice: Vec<_> = out.iter().map(|s| s.voice_over.as_ref().unwrap().start_time).collect();
        assert_eq!(voice, [3000, 0, 1000]);
    }

    #[test]
    fn order_sorts_before_start_time() {
        let a = SentenceDto { order: 0, start_time: 5000, ..Default::default() };
        let b = SentenceDto { order: 1, start_time: 0, ..Default::default() };
        assert_eq!(compare_sentence_order(&a, &b), Ordering::Less);
        let c = SentenceDto { order: 1, start_time: 10, ..Default::default() };
        assert_eq!(compare_sentence_order(&b, &c), Ordering::Less);
    }
}
