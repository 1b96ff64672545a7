//! Active slide and background image
//!
//! The background leads the slide animation: `advance_to` is the carousel's
//! before-change hook, so the background already shows the incoming slide
//! while the transition is still running.

use crate::types::{Memory, SequenceId};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Carousel position and what it backgrounds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CarouselState {
    /// Index of the centered slide
    pub active_index: usize,
    /// Image shown behind the carousel
    pub background: Option<String>,
    /// Memory the background belongs to
    pub backgrounded: Option<SequenceId>,
}

/// Owns the active slide index and the background attribute
#[derive(Clone, Default)]
pub struct CarouselController {
    state: Arc<RwLock<CarouselState>>,
}

impl CarouselController {
    /// Fresh carousel on slide 0 with nothing backgrounded
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a transition to `next`, wrapping in both directions
    ///
    /// Returns the resolved index, or `None` when there are no slides.
    pub fn advance_to(&self, memories: &[Memory], next: isize) -> Option<usize> {
        if memories.is_empty() {
            return None;
        }

        let index = next.rem_euclid(memories.len() as isize) as usize;
        let memory = &memories[index];

        let mut state = self.state.write();
        state.active_index = index;
        state.background = Some(memory.image_url.clone());
        state.backgrounded = Some(memory.sequence_id);
        debug!("Carousel advancing to slide {} (sid {})", index, memory.sequence_id);
        Some(index)
    }

    /// Move one slide forward
    pub fn next(&self, memories: &[Memory]) -> Option<usize> {
        let current = self.state.read().active_index as isize;
        self.advance_to(memories, current + 1)
    }

    /// Move one slide back
    pub fn previous(&self, memories: &[Memory]) -> Option<usize> {
        let current = self.state.read().active_index as isize;
        self.advance_to(memories, current - 1)
    }

    /// Re-derive position and background after the list was replaced
    ///
    /// The backgrounded memory keeps its place if it is still in the list;
    /// otherwise the first memory becomes the background.
    pub fn reconcile(&self, memories: &[Memory]) {
        let mut state = self.state.write();

        let Some(first) = memories.first() else {
            *state = CarouselState::default();
            return;
        };

        let kept = state
            .backgrounded
            .and_then(|sid| memories.iter().position(|m| m.sequence_id == sid));

        let (index, memory) = match kept {
            Some(index) => (index, &memories[index]),
            None => (0, first),
        };
        state.active_index = index;
        state.background = Some(memory.image_url.clone());
        state.backgrounded = Some(memory.sequence_id);
    }

    /// Current state
    pub fn state(&self) -> CarouselState {
        self.state.read().clone()
    }

    /// Index of the centered slide
    pub fn active_index(&self) -> usize {
        self.state.read().active_index
    }

    /// Current background image
    pub fn background(&self) -> Option<String> {
        self.state.read().background.clone()
    }

    /// Sequence id of the backgrounded memory
    pub fn backgrounded(&self) -> Option<SequenceId> {
        self.state.read().backgrounded
    }

    /// Back to slide 0 with nothing backgrounded
    pub fn reset(&self) {
        *self.state.write() = CarouselState::default();
    }
}
