//! Floating emoji bursts shown after a confirmed reaction

use crate::scheduler::DelayedTask;
use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One floating emoji, positioned in percent of the viewport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurstMarker {
    /// Emoji shown
    pub emoji: String,
    /// Distance from the top edge, `[0, 100)`
    pub top: f32,
    /// Distance from the left edge, `[0, 100)`
    pub left: f32,
}

/// Markers currently on screen
///
/// The generation changes on every burst so that repeating the same emoji
/// restarts the animation instead of being treated as an unchanged frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BurstFrame {
    /// Burst counter, starts at 0 before any burst
    pub generation: u64,
    /// Markers of the current generation, empty once expired
    pub markers: Vec<BurstMarker>,
}

struct BurstState {
    frame: BurstFrame,
    expiry: Option<DelayedTask>,
}

/// Creates and expires bursts
#[derive(Clone)]
pub struct BurstScheduler {
    state: Arc<Mutex<BurstState>>,
    duration: Duration,
}

impl BurstScheduler {
    /// Bursts last `duration`
    pub fn new(duration: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(BurstState {
                frame: BurstFrame::default(),
                expiry: None,
            })),
            duration,
        }
    }

    /// Show `count` copies of `emoji` at random positions
    ///
    /// Replaces any burst still on screen. The new generation is cleared
    /// after the configured duration; returns its number.
    pub fn burst(&self, emoji: &str, count: usize) -> u64 {
        let markers = random_markers(&mut rand::thread_rng(), emoji, count);

        let mut state = self.state.lock();
        state.frame.generation += 1;
        let generation = state.frame.generation;
        state.frame.markers = markers;

        let weak = Arc::downgrade(&self.state);
        let expiry = DelayedTask::schedule(self.duration, async move {
            if let Some(state) = weak.upgrade() {
                let mut state = state.lock();
                if state.frame.generation == generation {
                    state.frame.markers.clear();
                    debug!("Burst generation {} expired", generation);
                }
            }
        });
        // Dropping the previous task cancels its expiry
        state.expiry = Some(expiry);

        debug!("Burst generation {} with {} markers", generation, count);
        generation
    }

    /// Current frame
    pub fn frame(&self) -> BurstFrame {
        self.state.lock().frame.clone()
    }

    /// Remove markers now and cancel the pending expiry
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if let Some(task) = state.expiry.take() {
            task.cancel();
        }
        state.frame.markers.clear();
    }
}

/// Independent uniform positions, overlaps allowed
fn random_markers<R: Rng + ?Sized>(rng: &mut R, emoji: &str, count: usize) -> Vec<BurstMarker> {
    (0..count)
        .map(|_| BurstMarker {
            emoji: emoji.to_string(),
            top: rng.gen_range(0.0..100.0),
            left: rng.gen_range(0.0..100.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_positions_within_viewport() {
        let mut rng = StdRng::seed_from_u64(7);
        let markers = random_markers(&mut rng, "😊", 500);
        assert_eq!(markers.len(), 500);
        assert!(markers.iter().all(|m| m.emoji == "😊"));
        assert!(
            markers
                .iter()
                .all(|m| (0.0..100.0).contains(&m.top) && (0.0..100.0).contains(&m.left))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_expires_after_duration() {
        let bursts = BurstScheduler::new(Duration::from_millis(2000));
        let generation = bursts.burst("😍", 40);

        let frame = bursts.frame();
        assert_eq!(frame.generation, generation);
        assert_eq!(frame.markers.len(), 40);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(bursts.frame().markers.len(), 40);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let frame = bursts.frame();
        assert!(frame.markers.is_empty());
        assert_eq!(frame.generation, generation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_burst_gets_new_generation() {
        let bursts = BurstScheduler::new(Duration::from_millis(2000));
        let first = bursts.burst("😂", 40);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let second = bursts.burst("😂", 40);
        assert_eq!(second, first + 1);

        // The first generation's expiry no longer applies
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(bursts.frame().markers.len(), 40);

        tokio::time::sleep(Duration::from_millis(1401)).await;
        assert!(bursts.frame().markers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_clears_immediately() {
        let bursts = BurstScheduler::new(Duration::from_millis(2000));
        bursts.burst("😠", 10);
        bursts.cancel();
        assert!(bursts.frame().markers.is_empty());
        assert_eq!(bursts.frame().generation, 1);
    }
}
