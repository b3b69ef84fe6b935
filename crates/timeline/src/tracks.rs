use crate::model::{Millis, TrackDto};
use crate::{check_insert, TimelineError};

pub const DEFAULT_TRACK_VOLUME: f32 = 1.0;

/// Duration adopted by a track that gets music without a known length.
pub const FALLBACK_MUSIC_DURATION_MS: Millis = 15_000;

/// Recompute `order` and start offsets as a prefix sum of the preceding
/// durations. Tracks without an explicit duration take no time.
pub fn calculate_ordering(tracks: &[TrackDto]) -> Vec<TrackDto> {
    let mut offset = 0;
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let track = TrackDto { order: i as i64, start_time: offset, ..t.clone() };
            offset += t.explicit_duration().unwrap_or(0);
            track
        })
        .collect()
}

/// Insert an empty track at `at` (0..=len).
pub fn add_track(tracks: &[TrackDto], at: usize) -> Result<Vec<TrackDto>, TimelineError> {
    check_insert(at, tracks.len())?;
    let mut out = tracks.to_vec();
    out.insert(at, TrackDto::default());
    Ok(calculate_ordering(&out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(durations: &[Option<Millis>]) -> Vec<TrackDto> {
        durations.iter().map(|d| TrackDto { duration: *d, ..Default::default() }).collect()
    }

    fn starts(t: &[TrackDto]) -> Vec<Millis> {
        t.iter().map(|t| t.start_time).collect()
    }

    #[test]
    fn offsets_are_prefix_sums() {
        let out = calculate_ordering(&tracks(&[Some(5000), None, Some(3000), Some(1)]));
        assert_eq!(starts(&out), [0, 5000, 5000, 8000]);
        assert_eq!(out.iter().map(|t| t.order).collect::<Vec<_>>(), [0, 1, 2, 3]);
    }

    #[test]
    fn ordering_is_idempotent() {
        let t = tracks(&[Some(1200), Some(0), None, Some(300)]);
        let once = calculate_ordering(&t);
        assert_eq!(calculate_ordering(&once), once);
    }

    #[test]
    fn add_track_reorders() {
        let out = add_track(&calculate_ordering(&tracks(&[Some(1000), Some(2000)])), 1).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].duration, None);
        assert_eq!(out[1].volume, DEFAULT_TRACK_VOLUME);
        assert_eq!(starts(&out), [0, 1000, 1000]);
        assert!(add_track(&out, 5).is_err());
    }
}
