//! Mute state tracking and change detection
//!
//! The debouncer remembers the last dispatched state and only lets a new
//! reading through when it differs, or when the state is `Unknown`
//! (startup and right after a reload).

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Last dispatched state of the monitored application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuteState {
    /// Nothing dispatched since startup or the last reload
    #[default]
    Unknown,
    Muted,
    Unmuted,
}

impl MuteState {
    pub fn from_unmuted(unmuted: bool) -> Self {
        if unmuted {
            Self::Unmuted
        } else {
            Self::Muted
        }
    }
}

impl fmt::Display for MuteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuteState::Unknown => write!(f, "Unknown"),
            MuteState::Muted => write!(f, "Muted"),
            MuteState::Unmuted => write!(f, "Unmuted"),
        }
    }
}

/// Decide whether `new_unmuted` must be dispatched given `previous`.
/// Returns the decision and the state to store afterwards.
pub fn should_dispatch(previous: MuteState, new_unmuted: bool) -> (bool, MuteState) {
    let next = MuteState::from_unmuted(new_unmuted);
    let dispatch = previous == MuteState::Unknown || previous != next;
    (dispatch, next)
}

/// Holds the last dispatched [`MuteState`]
#[derive(Debug, Default)]
pub struct Debouncer {
    state: MuteState,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    #[cfg(test)]
    pub fn state(&self) -> MuteState {
        self.state
    }

    /// Feed a normalized reading. Returns the new state when it has to
    /// be dispatched, `None` when the reading is redundant.
    pub fn observe(&mut self, unmuted: bool) -> Option<MuteState> {
        let (dispatch, next) = should_dispatch(self.state, unmuted);
        if !dispatch {
            return None;
        }

        info!(from = %self.state, to = %next, "mute state transition");
        self.state = next;
        Some(next)
    }

    /// Forget the last dispatched state so the next reading is forced through
    pub fn reset(&mut self) {
        debug!(from = %self.state, "mute state reset to Unknown");
        self.state = MuteState::Unknown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(Debouncer::new().state(), MuteState::Unknown);
    }

    #[test]
    fn test_should_dispatch_table() {
        assert_eq!(should_dispatch(MuteState::Unknown, true), (true, MuteState::Unmuted));
        assert_eq!(should_dispatch(MuteState::Unknown, false), (true, MuteState::Muted));
        assert_eq!(should_dispatch(MuteState::Muted, true), (true, MuteState::Unmuted));
        assert_eq!(should_dispatch(MuteState::Unmuted, false), (true, MuteState::Muted));
        assert_eq!(should_dispatch(MuteState::Muted, false), (false, MuteState::Muted));
        assert_eq!(should_dispatch(MuteState::Unmuted, true), (false, MuteState::Unmuted));
    }

    #[test]
    fn test_repeated_reading_is_suppressed() {
        let mut debouncer = Debouncer::new();
        assert_eq!(debouncer.observe(true), Some(MuteState::Unmuted));
        assert_eq!(debouncer.observe(true), None);
        assert_eq!(debouncer.state(), MuteState::Unmuted);
    }

    #[test]
    fn test_reset_forces_one_dispatch() {
        let mut debouncer = Debouncer::new();
        debouncer.observe(false);
        debouncer.reset();
        assert_eq!(debouncer.state(), MuteState::Unknown);
        assert_eq!(debouncer.observe(false), Some(MuteState::Muted));
        assert_eq!(debouncer.observe(false), None);
    }

    /// Dispatch count equals strict value changes plus one per reset
    #[test]
    fn test_dispatch_count_matches_changes_plus_resets() {
        // None marks a reset between readings
        let sequences: Vec<Vec<Option<bool>>> = vec![
            vec![Some(true), Some(true), Some(false), Some(false), Some(true)],
            vec![Some(false), None, Some(false), Some(false), None, Some(true), Some(true)],
            vec![Some(true), Some(false), Some(true), Some(false)],
            vec![None, None, Some(true)],
            vec![],
        ];

        for sequence in sequences {
            let mut debouncer = Debouncer::new();
            let mut dispatches = 0;
            let mut expected = 0;
            let mut last: Option<bool> = None;

            for step in &sequence {
                match step {
                    None => {
                        debouncer.reset();
                        last = None;
                    }
                    Some(unmuted) => {
                        if last != Some(*unmuted) {
                            expected += 1;
                        }
                        last = Some(*unmuted);
                        if debouncer.observe(*unmuted).is_some() {
                            dispatches += 1;
                        }
                    }
                }
            }

            assert_eq!(dispatches, expected, "sequence {sequence:?}");
        }
    }
}
