//! Recording state record

use super::Stopwatch;
use podcast_common::events::RecordingStatus;
use podcast_common::time::duration_to_millis;

/// Mutable recording state owned by the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingState {
    pub status: RecordingStatus,
    pub stopwatch: Stopwatch,
}

impl RecordingState {
    /// True while capture is running (not paused)
    pub fn is_recording(&self) -> bool {
        self.status == RecordingStatus::Recording
    }

    /// Elapsed capture time at 1-second resolution
    pub fn duration_ms(&self) -> u64 {
        if self.status == RecordingStatus::Idle {
            return 0;
        }
        let ms = duration_to_millis(self.stopwatch.elapsed());
        ms - ms % 1000
    }

    pub fn begin(&mut self) {
        self.status = RecordingStatus::Recording;
        self.stopwatch = Stopwatch::started();
    }

    pub fn pause(&mut self) {
        self.status = RecordingStatus::Paused;
        self.stopwatch.pause();
    }

    pub fn resume(&mut self) {
        self.status = RecordingStatus::Recording;
        self.stopwatch.resume();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_duration_truncates_to_whole_seconds() {
        let mut state = RecordingState::default();
        state.begin();
        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert_eq!(state.duration_ms(), 2_000);
        assert!(state.is_recording());
    }

    #[test]
    fn test_idle_duration_is_zero() {
        let state = RecordingState::default();
        assert_eq!(state.duration_ms(), 0);
        assert!(!state.is_recording());
    }
}
