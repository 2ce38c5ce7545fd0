// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The relay pipeline actor.
//!
//! One task owns the album aggregator, the pending registry and the ordering
//! barrier, and reacts to inbound items, timer fires, finished processing
//! tasks and a periodic hold sweep. Processing runs in spawned tasks; released
//! posts go to the publish worker over an mpsc queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{Id, JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vetrina_config::VetrinaConfig;
use vetrina_core::VetrinaError;
use vetrina_core::traits::Publisher;
use vetrina_core::types::{
    ConversationId, InboundItem, LogicalPost, MediaItem, MediaKind, OutboundPost,
};
use vetrina_pricing::Pricer;

use crate::aggregator::AlbumAggregator;
use crate::barrier::{OrderingBarrier, PublishKey};
use crate::pending::PendingRegistry;
use crate::processor::PostProcessor;
use crate::publish::run_publish_worker;
use crate::tagfilter::PriceTagFilter;
use crate::timer::TimerFired;

const INBOUND_CAPACITY: usize = 512;

/// Timing and behaviour knobs of the pipeline.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub settle_window: Duration,
    pub pending_ttl: Duration,
    pub max_pending_per_conversation: usize,
    pub max_hold: Duration,
    pub drain_timeout: Duration,
    pub skip_marker: Option<String>,
    pub hint_on_miss: bool,
    pub retract_originals: bool,
}

impl RelaySettings {
    pub fn from_config(config: &VetrinaConfig) -> Self {
        let relay = &config.relay;
        Self {
            settle_window: Duration::from_millis(relay.settle_window_ms),
            pending_ttl: Duration::from_secs(relay.pending_ttl_secs),
            max_pending_per_conversation: relay.max_pending_per_conversation,
            max_hold: Duration::from_secs(relay.max_hold_secs),
            drain_timeout: Duration::from_secs(relay.drain_timeout_secs),
            skip_marker: relay.skip_marker.clone(),
            hint_on_miss: relay.hint_on_miss,
            retract_originals: config.telegram.delete_originals,
        }
    }

    fn sweep_period(&self) -> Duration {
        (self.max_hold / 4).max(Duration::from_millis(250))
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from_config(&VetrinaConfig::default())
    }
}

/// Collaborators the pipeline needs.
pub struct RelayDeps {
    pub publisher: Arc<dyn Publisher>,
    pub pricer: Pricer,
    /// `None` disables price-tag filtering.
    pub tag_filter: Option<PriceTagFilter>,
}

/// Handle to a running pipeline.
pub struct RelayHandle {
    inbound: mpsc::Sender<InboundItem>,
    actor: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl RelayHandle {
    /// A sender for inbound items, e.g. for a transport poller.
    pub fn sender(&self) -> mpsc::Sender<InboundItem> {
        self.inbound.clone()
    }

    pub async fn submit(&self, item: InboundItem) -> Result<(), VetrinaError> {
        self.inbound
            .send(item)
            .await
            .map_err(|e| VetrinaError::Channel {
                message: "relay pipeline is not running".to_string(),
                source: Some(Box::new(e)),
            })
    }

    /// Closes this handle's intake and waits until the pipeline and the
    /// publish worker have stopped.
    ///
    /// The pipeline stops once every sender is dropped or the cancellation
    /// token fires.
    pub async fn finish(self) {
        drop(self.inbound);
        if let Err(e) = self.actor.await {
            error!(error = %e, "relay pipeline task failed");
        }
        if let Err(e) = self.worker.await {
            error!(error = %e, "publish worker task failed");
        }
    }
}

/// Starts the pipeline actor and its publish worker.
pub fn spawn_relay(
    settings: RelaySettings,
    deps: RelayDeps,
    cancel: CancellationToken,
) -> RelayHandle {
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
    let (timer_tx, timer_rx) = mpsc::unbounded_channel();
    let (publish_tx, publish_rx) = mpsc::unbounded_channel();

    let worker = tokio::spawn(run_publish_worker(
        publish_rx,
        deps.publisher.clone(),
        settings.retract_originals,
    ));

    let processor = PostProcessor::new(
        deps.pricer,
        deps.tag_filter,
        deps.publisher,
        settings.hint_on_miss,
    );
    let actor = PipelineActor {
        aggregator: AlbumAggregator::new(settings.settle_window, timer_tx.clone()),
        registry: PendingRegistry::new(
            settings.pending_ttl,
            settings.max_pending_per_conversation,
            timer_tx,
        ),
        barrier: OrderingBarrier::new(settings.max_hold),
        processor: Arc::new(processor),
        in_flight: JoinSet::new(),
        in_flight_keys: HashMap::new(),
        publish_tx,
        settings,
    };
    let actor = tokio::spawn(actor.run(inbound_rx, timer_rx, cancel));

    RelayHandle {
        inbound: inbound_tx,
        actor,
        worker,
    }
}

struct PipelineActor {
    settings: RelaySettings,
    aggregator: AlbumAggregator,
    registry: PendingRegistry,
    barrier: OrderingBarrier<OutboundPost>,
    processor: Arc<PostProcessor>,
    in_flight: JoinSet<Option<OutboundPost>>,
    in_flight_keys: HashMap<Id, PublishKey>,
    publish_tx: mpsc::UnboundedSender<OutboundPost>,
}

impl PipelineActor {
    async fn run(
        mut self,
        mut inbound: mpsc::Receiver<InboundItem>,
        mut timers: mpsc::UnboundedReceiver<TimerFired>,
        cancel: CancellationToken,
    ) {
        let mut sweep = tokio::time::interval(self.settings.sweep_period());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("relay pipeline started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested; stopping intake");
                    break;
                }
                item = inbound.recv() => match item {
                    Some(item) => self.on_inbound(item),
                    None => {
                        info!("inbound stream closed");
                        break;
                    }
                },
                Some(fired) = timers.recv() => self.on_timer(fired),
                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    self.on_processed(joined);
                }
                _ = sweep.tick() => self.sweep(),
            }
        }

        self.shutdown().await;
    }

    fn on_inbound(&mut self, item: InboundItem) {
        crate::metrics::record_item(&item.kind.to_string());
        debug!(
            sequence = item.sequence,
            conversation = %item.conversation,
            kind = %item.kind,
            grouped = item.group.is_some(),
            "inbound item"
        );

        if item.group.is_none() && self.is_marked(item.caption_text()) {
            debug!(sequence = item.sequence, "marked item skipped");
            return;
        }

        match item.kind {
            MediaKind::Text => {
                if item.caption_text().is_none() {
                    debug!(sequence = item.sequence, "empty text ignored");
                    return;
                }
                let post = self.registry.match_caption(&item);
                self.start(post);
            }
            MediaKind::Photo | MediaKind::Video => {
                if item.group.is_some() {
                    self.aggregator.on_member(item);
                    return;
                }
                let Some(media) = item.media_item() else {
                    warn!(sequence = item.sequence, "media item without a media reference");
                    return;
                };
                match item.caption_text() {
                    Some(caption) => {
                        let post = LogicalPost::merge(
                            item.conversation,
                            vec![media],
                            Some(caption.to_string()),
                            &[],
                        );
                        self.start(post);
                    }
                    None => self.park(item.conversation, vec![media]),
                }
            }
        }
    }

    fn on_timer(&mut self, fired: TimerFired) {
        match fired {
            TimerFired::AlbumSettled { key, generation } => {
                let Some(album) = self.aggregator.flush(&key, generation) else {
                    return;
                };
                if self.is_marked(album.caption.as_deref()) {
                    debug!(group = %album.group.0, "marked album skipped");
                    return;
                }
                let media = album.media();
                match album.caption {
                    Some(caption) => {
                        let post =
                            LogicalPost::merge(album.conversation, media, Some(caption), &[]);
                        self.start(post);
                    }
                    None => self.park(album.conversation, media),
                }
            }
            TimerFired::SlotExpired { conversation, slot } => {
                self.registry.expire(conversation, slot);
            }
        }
    }

    fn on_processed(&mut self, joined: Result<(Id, Option<OutboundPost>), JoinError>) {
        let (id, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                error!(error = %e, "post processing task failed");
                (e.id(), None)
            }
        };
        let Some(key) = self.in_flight_keys.remove(&id) else {
            warn!("finished processing task has no reservation");
            return;
        };
        let released = self.barrier.submit(key, outcome, Instant::now());
        self.forward(released);
    }

    fn sweep(&mut self) {
        let released = self.barrier.expire_stale(Instant::now());
        self.forward(released);
    }

    fn park(&mut self, conversation: ConversationId, media: Vec<MediaItem>) {
        if let Some(evicted) = self.registry.remember(conversation, media) {
            info!(
                %conversation,
                dropped = evicted.len(),
                "uncaptioned media replaced by newer media"
            );
        }
    }

    /// Reserves the post's place in the barrier and spawns its processing.
    fn start(&mut self, post: LogicalPost) {
        let key = PublishKey::new(post.publish_sequence, post.conversation);
        self.barrier.reserve(key, Instant::now());
        let processor = self.processor.clone();
        let task = self
            .in_flight
            .spawn(async move { processor.process(post).await });
        self.in_flight_keys.insert(task.id(), key);
    }

    fn forward(&self, posts: Vec<OutboundPost>) {
        for post in posts {
            let sequence = post.publish_sequence;
            if self.publish_tx.send(post).is_err() {
                error!(sequence, "publish worker is gone; post dropped");
            }
        }
    }

    fn is_marked(&self, text: Option<&str>) -> bool {
        match (&self.settings.skip_marker, text) {
            (Some(marker), Some(text)) => text.contains(marker.as_str()),
            _ => false,
        }
    }

    async fn shutdown(mut self) {
        let albums = self.aggregator.shutdown();
        let slots = self.registry.shutdown();
        if albums + slots > 0 {
            warn!(albums, slots, "dropping media still waiting for a caption");
        }

        let deadline = tokio::time::sleep(self.settings.drain_timeout);
        tokio::pin!(deadline);
        while !self.in_flight.is_empty() {
            tokio::select! {
                Some(joined) = self.in_flight.join_next_with_id() => self.on_processed(joined),
                _ = &mut deadline => {
                    warn!(
                        remaining = self.in_flight.len(),
                        "drain timeout reached; abandoning in-flight posts"
                    );
                    self.in_flight.abort_all();
                    break;
                }
            }
        }

        let remaining = self.barrier.flush();
        self.forward(remaining);
        info!("relay pipeline stopped");
    }
}
