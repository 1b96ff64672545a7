//! Protected gallery view
//!
//! `MemoriesView` wires the session gate, store, carousel, write services
//! and burst scheduler together. List fetches happen only where they are
//! needed: on `enter()` and, when enabled, after a confirmed write.

use crate::{
    burst::{BurstFrame, BurstScheduler},
    carousel::{CarouselController, CarouselState},
    comment::{CommentOutcome, CommentService, DetailState, DetailView},
    errors::Result,
    notify::Notifier,
    options::GalleryOptions,
    reaction::{ReactionOutcome, ReactionService},
    session::{Route, SessionContext, SessionGate},
    store::{MemoryStore, RefreshOutcome},
    transport::GalleryTransport,
    types::{Memory, SequenceId},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything the renderer needs to draw the gallery
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    /// Current top-level view
    pub route: Route,
    /// Ordered memory list
    pub memories: Vec<Memory>,
    /// Slide and background
    pub carousel: CarouselState,
    /// Detail modal
    pub detail: DetailState,
    /// Floating emojis
    pub burst: BurstFrame,
}

/// The gallery view and its components
#[derive(Clone)]
pub struct MemoriesView {
    gate: SessionGate,
    store: MemoryStore,
    carousel: CarouselController,
    reactions: ReactionService,
    detail: DetailView,
    bursts: BurstScheduler,
    notifier: Notifier,
    reconcile_after_write: bool,
}

impl MemoriesView {
    /// Build the view over `transport` for the session in `ctx`
    pub fn new(
        transport: Arc<dyn GalleryTransport>,
        ctx: SessionContext,
        options: &GalleryOptions,
    ) -> Self {
        let gate = SessionGate::new(ctx);
        let notifier = Notifier::new(options.toast_duration);
        let store = MemoryStore::new(transport.clone(), gate.clone());
        let carousel = CarouselController::new();
        let bursts = BurstScheduler::new(options.burst_duration);

        let reactions = ReactionService::new(
            transport.clone(),
            gate.clone(),
            store.clone(),
            carousel.clone(),
            bursts.clone(),
            notifier.clone(),
            options.burst_count,
        );
        let comments = CommentService::new(transport, gate.clone(), store.clone(), notifier.clone());

        Self {
            gate,
            store,
            carousel,
            reactions,
            detail: DetailView::new(comments),
            bursts,
            notifier,
            reconcile_after_write: options.reconcile_after_write,
        }
    }

    /// Load the view: requires a session, then fetches the list
    pub async fn enter(&self) -> Result<RefreshOutcome> {
        if !self.gate.can_enter(Route::Memories) {
            self.reset();
            return Err(self.gate.invalidate("no session token"));
        }
        self.gate.navigator().navigate(Route::Memories);
        self.refresh().await
    }

    /// Fetch the list and re-derive the carousel from it
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let outcome = self.store.refresh().await.inspect_err(|_| self.reset())?;
        if let RefreshOutcome::Applied { .. } = outcome {
            self.carousel.reconcile(&self.store.snapshot());
        }
        Ok(outcome)
    }

    /// Carousel before-change hook
    pub fn advance_to(&self, next: isize) -> Option<usize> {
        self.carousel.advance_to(&self.store.snapshot(), next)
    }

    /// Move one slide forward
    pub fn next(&self) -> Option<usize> {
        self.carousel.next(&self.store.snapshot())
    }

    /// Move one slide back
    pub fn previous(&self) -> Option<usize> {
        self.carousel.previous(&self.store.snapshot())
    }

    /// React to the backgrounded memory
    pub async fn react(&self, emoji: &str) -> Result<ReactionOutcome> {
        let outcome = self.reactions.react(emoji).await?;
        if matches!(outcome, ReactionOutcome::Applied { .. }) {
            self.reconcile().await?;
        }
        Ok(outcome)
    }

    /// Open the detail modal for `sid`; the carousel is left alone
    pub fn open_detail(&self, sid: SequenceId) -> Option<Memory> {
        let memory = self.store.get(sid)?;
        self.detail.open(memory.clone());
        Some(memory)
    }

    /// Close the detail modal
    pub fn close_detail(&self) {
        self.detail.close();
    }

    /// Post `text` on the memory shown in the detail modal
    pub async fn add_comment(&self, text: &str) -> Result<CommentOutcome> {
        self.detail.set_input(text);
        let outcome = self.detail.submit().await?;
        if matches!(outcome, CommentOutcome::Appended { .. }) {
            self.reconcile().await?;
        }
        Ok(outcome)
    }

    async fn reconcile(&self) -> Result<()> {
        if self.reconcile_after_write {
            debug!("Reconciling list after confirmed write");
            self.refresh().await?;
        }
        Ok(())
    }

    /// Sign out and leave the view
    pub fn logout(&self) {
        self.gate.logout();
        self.unmount();
    }

    /// Tear the view down: timers canceled, list discarded
    pub fn unmount(&self) {
        info!("Unmounting memories view");
        self.reset();
    }

    fn reset(&self) {
        self.bursts.cancel();
        self.detail.close();
        self.store.clear();
        self.carousel.reset();
    }

    /// Current state for rendering
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            route: self.gate.navigator().current(),
            memories: self.store.snapshot(),
            carousel: self.carousel.state(),
            detail: self.detail.state(),
            burst: self.bursts.frame(),
        }
    }

    /// Shared memory list
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Carousel controller
    pub fn carousel(&self) -> &CarouselController {
        &self.carousel
    }

    /// Detail modal
    pub fn detail(&self) -> &DetailView {
        &self.detail
    }

    /// Burst scheduler
    pub fn bursts(&self) -> &BurstScheduler {
        &self.bursts
    }

    /// Notifications raised by the view
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Session gate
    pub fn session(&self) -> &SessionGate {
        &self.gate
    }
}
