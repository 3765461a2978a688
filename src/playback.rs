//! Preview playback state, modeled as an explicit transition function.
//!
//! A preview loop owns exactly one [`PlaybackState`] and feeds it events
//! (timer ticks, scrub input). The state never touches the timeline itself;
//! it only reads the immutable [`Timeline`] it is given, so a concurrent
//! export run can read the same timeline safely.

use crate::{
    clock::{self, ClockSample},
    model::Timeline,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_time: f64,
    pub playing: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            playing: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackEvent {
    Play,
    Pause,
    /// Scrub to an absolute time (clamped into `[0, total_duration]`).
    Seek(f64),
    /// Timer tick; advances only while playing.
    Tick {
        dt: f64,
    },
}

/// `(PlaybackState, event) -> PlaybackState`. Playback pauses automatically
/// when the end of the timeline is reached.
pub fn step(state: PlaybackState, event: PlaybackEvent, timeline: &Timeline) -> PlaybackState {
    let total = timeline.total_duration();
    match event {
        PlaybackEvent::Play => PlaybackState {
            playing: true,
            ..state
        },
        PlaybackEvent::Pause => PlaybackState {
            playing: false,
            ..state
        },
        PlaybackEvent::Seek(t) => PlaybackState {
            current_time: t.clamp(0.0, total),
            ..state
        },
        PlaybackEvent::Tick { dt } => {
            if !state.playing || dt <= 0.0 {
                return state;
            }
            let t = (state.current_time + dt).min(total);
            PlaybackState {
                current_time: t,
                playing: t < total,
            }
        }
    }
}

impl PlaybackState {
    /// Clock sample at the current position.
    pub fn sample(&self, timeline: &Timeline) -> Option<ClockSample> {
        clock::sample(timeline, self.current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_source;

    fn timeline() -> Timeline {
        let (tl, diags) =
            compile_source("```scene\nkind: text\nduration: 2\ncontent: x\n```\n");
        assert!(diags.is_empty());
        tl
    }

    #[test]
    fn tick_advances_only_while_playing() {
        let tl = timeline();
        let s0 = PlaybackState::default();
        let s1 = step(s0, PlaybackEvent::Tick { dt: 0.5 }, &tl);
        assert_eq!(s1.current_time, 0.0);

        let s2 = step(s1, PlaybackEvent::Play, &tl);
        let s3 = step(s2, PlaybackEvent::Tick { dt: 0.5 }, &tl);
        assert_eq!(s3.current_time, 0.5);
        assert!(s3.playing);
    }

    #[test]
    fn tick_pauses_at_the_end() {
        let tl = timeline();
        let s = PlaybackState {
            current_time: 1.9,
            playing: true,
        };
        let s = step(s, PlaybackEvent::Tick { dt: 1.0 }, &tl);
        assert_eq!(s.current_time, 2.0);
        assert!(!s.playing);
    }

    #[test]
    fn seek_clamps_to_timeline_bounds() {
        let tl = timeline();
        let s = step(PlaybackState::default(), PlaybackEvent::Seek(99.0), &tl);
        assert_eq!(s.current_time, 2.0);
        let s = step(s, PlaybackEvent::Seek(-1.0), &tl);
        assert_eq!(s.current_time, 0.0);
    }

    #[test]
    fn sample_reflects_current_time() {
        let tl = timeline();
        let s = step(PlaybackState::default(), PlaybackEvent::Seek(1.0), &tl);
        let sample = s.sample(&tl).unwrap();
        assert_eq!(sample.active.index, 0);
        assert_eq!(sample.active.local_time, 1.0);
    }
}
