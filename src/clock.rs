//! Timeline clock: a pure mapping from `(Timeline, t)` to the active scene(s).
//!
//! The clock has no side effects and no memory between calls; identical inputs
//! always yield identical samples, which is what makes exported frames
//! reproducible. Lookup is a binary search over the sorted scene starts.

use crate::model::Timeline;

/// One scene active at the query time, with its local progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveScene {
    /// Index into `Timeline::scenes()`.
    pub index: usize,
    /// `t - scene.start`, clamped into `[0, scene.duration]`.
    pub local_time: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockSample {
    /// The scene that owns the query time (the incoming scene during a
    /// cross-fade).
    pub active: ActiveScene,
    /// The scene still fading out underneath, present only inside an overlap
    /// window.
    pub outgoing: Option<ActiveScene>,
    /// Weight of `active`: exactly 1.0 outside any overlap, a linear ramp from
    /// 0 to 1 across the overlap window
    /// `[active.start, min(outgoing.end, active.end)]`.
    pub crossfade_alpha: f64,
}

impl ClockSample {
    fn solo(index: usize, local_time: f64) -> Self {
        Self {
            active: ActiveScene { index, local_time },
            outgoing: None,
            crossfade_alpha: 1.0,
        }
    }
}

/// Sample the timeline at time `t` (seconds). Returns `None` only for an empty
/// timeline. Out-of-range times clamp, never fail: before the first scene the
/// first scene is reported at local time 0; at or past the total duration the
/// last-ending scene is held at its final frame.
pub fn sample(timeline: &Timeline, t: f64) -> Option<ClockSample> {
    let scenes = timeline.scenes();
    if scenes.is_empty() {
        return None;
    }

    if t < scenes[0].start {
        return Some(ClockSample::solo(0, 0.0));
    }

    if t >= timeline.total_duration() {
        let i = timeline.last_scene_index();
        return Some(ClockSample::solo(i, scenes[i].duration));
    }

    // Last scene with start <= t; the guards above make the range non-empty.
    let i = scenes.partition_point(|s| s.start <= t) - 1;
    let scene = &scenes[i];

    if i > 0 {
        let prev = &scenes[i - 1];
        // Overlap between consecutive scenes is the cross-fade window
        // [scene.start, min(prev.end, scene.end)]: the fade cannot outlive
        // either participant.
        let fade_end = prev.end().min(scene.end());
        if prev.end() > scene.start && t < fade_end {
            let window = fade_end - scene.start;
            let alpha = ((t - scene.start) / window).clamp(0.0, 1.0);
            return Some(ClockSample {
                active: ActiveScene {
                    index: i,
                    local_time: t - scene.start,
                },
                outgoing: Some(ActiveScene {
                    index: i - 1,
                    local_time: t - prev.start,
                }),
                crossfade_alpha: alpha,
            });
        }
    }

    if t >= scene.end() {
        // The most recently started scene has ended. An earlier scene may
        // still cover t (a short scene nested inside a longer one).
        let mut hold = i;
        for j in (0..i).rev() {
            if t < scenes[j].end() {
                return Some(ClockSample::solo(j, t - scenes[j].start));
            }
            if scenes[j].end() > scenes[hold].end() {
                hold = j;
            }
        }
        // True gap before the next scene: hold the latest-ending finished
        // scene at its final frame, mirroring the end-of-timeline clamp.
        return Some(ClockSample::solo(hold, scenes[hold].duration));
    }

    Some(ClockSample::solo(i, t - scene.start))
}
