//! Round-robin zoom switching.
//!
//! A [`MapSwitcher`] cycles through its maps, showing each for its configured
//! number of seconds. An injected [`ZoomOverride`] can pin the selection, for
//! instance to keep the most detailed map on screen at the start and end of
//! a segment where the overlay is synchronised by eye with the footage.

use std::fmt;
use std::str::FromStr;

use super::FrameError;
use crate::coord::MAX_ZOOM;

/// One entry of the zoom cycle: a zoom level and how long it stays on
/// screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomLevel {
    pub zoom: u8,
    pub duration_secs: u32,
}

impl ZoomLevel {
    pub fn new(zoom: u8, duration_secs: u32) -> Self {
        Self {
            zoom,
            duration_secs,
        }
    }

    /// The cycle used when nothing is configured: three overview levels for
    /// five seconds each, then street level for a minute.
    pub fn default_cycle() -> Vec<ZoomLevel> {
        vec![
            ZoomLevel::new(5, 5),
            ZoomLevel::new(7, 5),
            ZoomLevel::new(11, 5),
            ZoomLevel::new(16, 60),
        ]
    }

    /// Parses a comma-separated `zoom:seconds` list such as `5:5,16:60`.
    pub fn parse_list(s: &str) -> Result<Vec<ZoomLevel>, FrameError> {
        let levels = s
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(ZoomLevel::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if levels.is_empty() {
            return Err(FrameError::NoZoomLevels);
        }
        Ok(levels)
    }

    /// Formats a list back into `zoom:seconds` form.
    pub fn format_list(levels: &[ZoomLevel]) -> String {
        levels
            .iter()
            .map(ZoomLevel::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for ZoomLevel {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| FrameError::InvalidLevel {
            entry: s.to_string(),
            reason: reason.to_string(),
        };
        let (zoom, secs) = s.split_once(':').ok_or_else(|| invalid("expected zoom:seconds"))?;
        let zoom: u8 = zoom.trim().parse().map_err(|_| invalid("zoom is not a number"))?;
        if zoom > MAX_ZOOM {
            return Err(invalid("zoom out of range"));
        }
        let duration_secs: u32 = secs
            .trim()
            .parse()
            .map_err(|_| invalid("duration is not a number"))?;
        if duration_secs == 0 {
            return Err(FrameError::ZeroDuration { zoom });
        }
        Ok(ZoomLevel::new(zoom, duration_secs))
    }
}

impl fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.zoom, self.duration_secs)
    }
}

/// Which map an override pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomChoice {
    /// A specific entry; out-of-range indices fall back to the last entry.
    Index(usize),
    /// The last configured entry, the most detailed one when levels are
    /// listed from coarse to fine.
    Finest,
}

/// Strategy deciding whether to pin the displayed map for a given second.
pub trait ZoomOverride {
    /// Returns the pinned map for `second` of a segment lasting
    /// `segment_duration` seconds, or `None` to keep cycling.
    fn select(&self, second: u64, segment_duration: f64) -> Option<ZoomChoice>;
}

impl<F> ZoomOverride for F
where
    F: Fn(u64, f64) -> Option<ZoomChoice>,
{
    fn select(&self, second: u64, segment_duration: f64) -> Option<ZoomChoice> {
        self(second, segment_duration)
    }
}

/// Never pins anything; the maps cycle freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverOverride;

impl ZoomOverride for NeverOverride {
    fn select(&self, _second: u64, _segment_duration: f64) -> Option<ZoomChoice> {
        None
    }
}

/// Pins the finest map on short segments and near both ends of long ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncOverride {
    /// Segments shorter than this never cycle.
    pub short_segment_secs: f64,
    /// Seconds at the start of a segment showing the finest map.
    pub head_secs: f64,
    /// Seconds at the end of a segment showing the finest map.
    pub tail_secs: f64,
}

impl Default for SyncOverride {
    fn default() -> Self {
        Self {
            short_segment_secs: 120.0,
            head_secs: 20.0,
            tail_secs: 40.0,
        }
    }
}

impl ZoomOverride for SyncOverride {
    fn select(&self, second: u64, segment_duration: f64) -> Option<ZoomChoice> {
        let second = second as f64;
        if segment_duration < self.short_segment_secs
            || second > segment_duration - self.tail_secs
            || second < self.head_secs
        {
            Some(ZoomChoice::Finest)
        } else {
            None
        }
    }
}

/// Cycles through maps as whole seconds of video elapse.
///
/// The selection only changes when the second (`frame_index / fps`,
/// truncated) changes, so replaying the same frames with the same policy
/// always yields the same indices.
pub struct MapSwitcher<M, O = NeverOverride> {
    maps: Vec<(M, u32)>,
    policy: O,
    segment_duration: f64,
    current: usize,
    remaining: u32,
    prev_second: Option<u64>,
}

impl<M, O: ZoomOverride> MapSwitcher<M, O> {
    /// Creates a switcher over `(map, seconds)` pairs.
    ///
    /// `segment_duration` is passed to the override policy.
    pub fn new(maps: Vec<(M, u32)>, policy: O, segment_duration: f64) -> Result<Self, FrameError> {
        let first = maps.first().ok_or(FrameError::NoZoomLevels)?;
        if let Some(index) = maps.iter().position(|(_, secs)| *secs == 0) {
            return Err(FrameError::ZeroDurationMap { index });
        }
        let remaining = first.1;
        Ok(Self {
            maps,
            policy,
            segment_duration,
            current: 0,
            remaining,
            prev_second: None,
        })
    }

    /// Advances the state machine to `frame_index` and returns the index of
    /// the map to display.
    pub fn compute_state(&mut self, frame_index: u64, fps: f64) -> usize {
        let second = (frame_index as f64 / fps) as u64;
        if self.prev_second == Some(second) {
            return self.current;
        }

        if self.prev_second.is_some() {
            self.remaining = self.remaining.saturating_sub(1);
        }
        if self.remaining == 0 {
            self.current = (self.current + 1) % self.maps.len();
            self.remaining = self.maps[self.current].1;
        }

        if self.maps.len() > 1 {
            if let Some(choice) = self.policy.select(second, self.segment_duration) {
                let last = self.maps.len() - 1;
                self.current = match choice {
                    ZoomChoice::Index(i) if i <= last => i,
                    _ => last,
                };
            }
        }

        self.prev_second = Some(second);
        self.current
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &M {
        &self.maps[self.current].0
    }

    pub fn get(&self, index: usize) -> Option<&M> {
        self.maps.get(index).map(|(m, _)| m)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut M> {
        self.maps.get_mut(index).map(|(m, _)| m)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Total seconds of one full cycle.
    pub fn cycle_secs(&self) -> u64 {
        self.maps.iter().map(|(_, s)| u64::from(*s)).sum()
    }
}

impl<O: ZoomOverride> MapSwitcher<ZoomLevel, O> {
    /// Creates a switcher whose maps are the zoom levels themselves.
    pub fn from_levels(levels: &[ZoomLevel], policy: O, segment_duration: f64) -> Result<Self, FrameError> {
        if let Some(level) = levels.iter().find(|l| l.duration_secs == 0) {
            return Err(FrameError::ZeroDuration { zoom: level.zoom });
        }
        let maps = levels.iter().map(|l| (*l, l.duration_secs)).collect();
        Self::new(maps, policy, segment_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Vec<ZoomLevel> {
        ZoomLevel::default_cycle()
    }

    /// Index selected for each whole second over `seconds` seconds.
    fn per_second<O: ZoomOverride>(sw: &mut MapSwitcher<ZoomLevel, O>, fps: f64, seconds: u64) -> Vec<usize> {
        let frames = (seconds as f64 * fps).ceil() as u64;
        let mut out = Vec::new();
        for f in 0..frames {
            let idx = sw.compute_state(f, fps);
            let second = (f as f64 / fps) as u64;
            if out.len() as u64 == second {
                out.push(idx);
            }
        }
        out
    }

    #[test]
    fn test_parse_list() {
        let parsed = ZoomLevel::parse_list("5:5, 7:5,11:5,16:60").unwrap();
        assert_eq!(parsed, levels());
        assert_eq!(ZoomLevel::format_list(&parsed), "5:5,7:5,11:5,16:60");
    }

    #[test]
    fn test_parse_list_errors() {
        assert!(matches!(ZoomLevel::parse_list(""), Err(FrameError::NoZoomLevels)));
        assert!(matches!(
            ZoomLevel::parse_list("5"),
            Err(FrameError::InvalidLevel { .. })
        ));
        assert!(matches!(
            ZoomLevel::parse_list("30:5"),
            Err(FrameError::InvalidLevel { .. })
        ));
        assert!(matches!(
            ZoomLevel::parse_list("5:0"),
            Err(FrameError::ZeroDuration { zoom: 5 })
        ));
    }

    #[test]
    fn test_zero_duration_map_is_reported_by_position() {
        let maps = vec![("overview", 5), ("detail", 0)];
        let result = MapSwitcher::new(maps, NeverOverride, 0.0);
        assert!(matches!(result, Err(FrameError::ZeroDurationMap { index: 1 })));
    }

    #[test]
    fn test_empty_switcher_rejected() {
        let result = MapSwitcher::<ZoomLevel, _>::from_levels(&[], NeverOverride, 0.0);
        assert!(matches!(result, Err(FrameError::NoZoomLevels)));
    }

    #[test]
    fn test_cycle_durations() {
        let mut sw = MapSwitcher::from_levels(&levels(), NeverOverride, 1000.0).unwrap();
        let seq = per_second(&mut sw, 1.0, 75);

        let mut expected = Vec::new();
        expected.extend(std::iter::repeat(0).take(5));
        expected.extend(std::iter::repeat(1).take(5));
        expected.extend(std::iter::repeat(2).take(5));
        expected.extend(std::iter::repeat(3).take(60));
        assert_eq!(seq, expected);

        // and wraps around
        assert_eq!(sw.compute_state(75, 1.0), 0);
    }

    #[test]
    fn test_same_second_does_not_advance() {
        let mut sw = MapSwitcher::from_levels(&levels(), NeverOverride, 1000.0).unwrap();
        for f in 0..(5 * 30) {
            assert_eq!(sw.compute_state(f, 30.0), 0);
        }
        assert_eq!(sw.compute_state(5 * 30, 30.0), 1);
    }

    #[test]
    fn test_single_map_ignores_override() {
        let single = [ZoomLevel::new(12, 10)];
        let pin = |_: u64, _: f64| Some(ZoomChoice::Index(0));
        let mut sw = MapSwitcher::from_levels(&single, pin, 0.0).unwrap();
        for f in 0..100 {
            assert_eq!(sw.compute_state(f, 1.0), 0);
        }
    }

    #[test]
    fn test_out_of_range_override_clamps_to_last() {
        let pin = |_: u64, _: f64| Some(ZoomChoice::Index(99));
        let mut sw = MapSwitcher::from_levels(&levels(), pin, 1000.0).unwrap();
        assert_eq!(sw.compute_state(0, 1.0), 3);
        assert_eq!(sw.current().zoom, 16);
    }

    #[test]
    fn test_sync_override_short_segment_always_finest() {
        let mut sw = MapSwitcher::from_levels(&levels(), SyncOverride::default(), 90.0).unwrap();
        assert!(per_second(&mut sw, 1.0, 90).iter().all(|&i| i == 3));
    }

    #[test]
    fn test_sync_override_head_and_tail() {
        let policy = SyncOverride::default();
        assert_eq!(policy.select(0, 600.0), Some(ZoomChoice::Finest));
        assert_eq!(policy.select(19, 600.0), Some(ZoomChoice::Finest));
        assert_eq!(policy.select(20, 600.0), None);
        assert_eq!(policy.select(560, 600.0), None);
        assert_eq!(policy.select(561, 600.0), Some(ZoomChoice::Finest));

        let mut sw = MapSwitcher::from_levels(&levels(), policy, 600.0).unwrap();
        let seq = per_second(&mut sw, 1.0, 600);
        assert!(seq[..20].iter().all(|&i| i == 3));
        assert!(seq[561..].iter().all(|&i| i == 3));
        assert!(seq[20..561].iter().any(|&i| i != 3));
    }

    #[test]
    fn test_deterministic_replay() {
        let policy = SyncOverride::default();
        let run = || {
            let mut sw = MapSwitcher::from_levels(&levels(), policy, 900.0).unwrap();
            (0..900 * 30).map(|f| sw.compute_state(f, 29.97)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_cycle_secs() {
        let sw = MapSwitcher::from_levels(&levels(), NeverOverride, 0.0).unwrap();
        assert_eq!(sw.cycle_secs(), 75);
        assert_eq!(sw.len(), 4);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_full_cycle_matches_configured_seconds(
                durations in prop::collection::vec(1u32..20, 1..6),
                fps in prop::sample::select(vec![1.0, 24.0, 29.97, 30.0, 59.94, 60.0])
            ) {
                let levels: Vec<ZoomLevel> = durations
                    .iter()
                    .enumerate()
                    .map(|(i, d)| ZoomLevel::new(i as u8, *d))
                    .collect();
                let mut sw = MapSwitcher::from_levels(&levels, NeverOverride, 1e9).unwrap();
                let cycle = sw.cycle_secs();
                let seq = per_second(&mut sw, fps, cycle);

                prop_assert_eq!(seq.len() as u64, cycle);
                for (i, d) in durations.iter().enumerate() {
                    let shown = seq.iter().filter(|&&x| x == i).count();
                    prop_assert_eq!(shown as u32, *d);
                }
            }
        }
    }
}
