//! Confirm-then-apply reactions on the backgrounded memory

use crate::{
    burst::BurstScheduler,
    carousel::CarouselController,
    errors::{GalleryError, Result, WriteAction},
    notify::{Notifier, REACTION_FAILED},
    session::SessionGate,
    store::MemoryStore,
    transport::GalleryTransport,
    types::{ReactionRequest, SequenceId},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a reaction tap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Nothing is backgrounded; no request was sent
    NoTarget,
    /// The store confirmed the reaction and the record was updated
    Applied {
        /// Memory that received the reaction
        sid: SequenceId,
        /// Burst generation started for it
        generation: u64,
    },
    /// The store confirmed, but the memory is no longer held locally
    /// (view torn down or list reloaded meanwhile); no burst was started
    Detached {
        /// Memory that received the reaction
        sid: SequenceId,
    },
}

/// Sends reactions for the backgrounded memory
#[derive(Clone)]
pub struct ReactionService {
    transport: Arc<dyn GalleryTransport>,
    gate: SessionGate,
    store: MemoryStore,
    carousel: CarouselController,
    bursts: BurstScheduler,
    notifier: Notifier,
    burst_count: usize,
}

impl ReactionService {
    /// Wire the service to the shared components
    pub fn new(
        transport: Arc<dyn GalleryTransport>,
        gate: SessionGate,
        store: MemoryStore,
        carousel: CarouselController,
        bursts: BurstScheduler,
        notifier: Notifier,
        burst_count: usize,
    ) -> Self {
        Self {
            transport,
            gate,
            store,
            carousel,
            bursts,
            notifier,
            burst_count,
        }
    }

    /// React to the backgrounded memory with `emoji`
    ///
    /// Every call sends its own request; concurrent taps are neither merged
    /// nor canceled. The record only changes once the store confirms.
    pub async fn react(&self, emoji: &str) -> Result<ReactionOutcome> {
        let Some(memory) = self.carousel.backgrounded().and_then(|sid| self.store.get(sid)) else {
            return Ok(ReactionOutcome::NoTarget);
        };
        let token = self.gate.require_token()?;

        let request = ReactionRequest {
            sid: memory.sequence_id,
            reaction: emoji.to_string(),
        };

        match self.transport.post_reaction(&token, &request).await {
            Ok(()) => {
                let held = self
                    .store
                    .update(request.sid, |m| m.reaction = Some(request.reaction.clone()));
                if !held {
                    debug!("Reaction on memory {} confirmed after it left the list", request.sid);
                    return Ok(ReactionOutcome::Detached { sid: request.sid });
                }
                let generation = self.bursts.burst(emoji, self.burst_count);
                info!("Reaction {} recorded for memory {}", emoji, request.sid);
                Ok(ReactionOutcome::Applied {
                    sid: request.sid,
                    generation,
                })
            },
            Err(e) => {
                warn!("Reaction for memory {} failed: {}", request.sid, e);
                self.notifier.error(REACTION_FAILED);
                Err(GalleryError::action_failure(
                    WriteAction::Reaction,
                    e.to_string(),
                ))
            },
        }
    }
}
