//! Channel attachment pagination.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::application::dto::{FetchOutcome, PageSummary, SkipReason};
use crate::domain::entities::{
    Attachment, ChannelKey, FetchDirection, PaginationState, normalize_all,
};
use crate::domain::errors::GalleryError;
use crate::domain::ports::{AttachmentSourcePort, FetchRequest};

/// Default page size.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Default fraction of the viewport at which the next page is requested.
pub const DEFAULT_END_REACHED_THRESHOLD: f64 = 0.5;

/// Paginator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginatorConfig {
    /// Page size used when the caller does not pass one.
    pub limit: usize,
    /// Fraction of the viewport height that triggers loading more.
    pub end_reached_threshold: f64,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            end_reached_threshold: DEFAULT_END_REACHED_THRESHOLD,
        }
    }
}

type SharedStates = Arc<Mutex<HashMap<ChannelKey, PaginationState>>>;

/// Releases a channel's in-flight marker if the fetch future is dropped
/// before its completion is applied.
struct InFlightGuard {
    states: SharedStates,
    channel: ChannelKey,
    token: u64,
    armed: bool,
}

impl InFlightGuard {
    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(state) = self.states.lock().get_mut(&self.channel)
            && state.finish_request(self.token)
        {
            debug!(channel = %self.channel, token = self.token, "Fetch cancelled, released channel");
        }
    }
}

/// Owns per-channel pagination state and drives page fetches.
///
/// At most one request per channel is in flight: a call made while another is
/// running returns [`FetchOutcome::Skipped`] without touching the source.
/// Each request carries a token; a completion whose token no longer owns the
/// channel (evicted, or re-initialized since) is discarded.
#[derive(Clone)]
pub struct AttachmentPaginator {
    source: Arc<dyn AttachmentSourcePort>,
    states: SharedStates,
    next_token: Arc<AtomicU64>,
    config: PaginatorConfig,
}

impl AttachmentPaginator {
    /// Creates a paginator with default settings.
    #[must_use]
    pub fn new(source: Arc<dyn AttachmentSourcePort>) -> Self {
        Self::with_config(source, PaginatorConfig::default())
    }

    /// Creates a paginator with explicit settings.
    #[must_use]
    pub fn with_config(source: Arc<dyn AttachmentSourcePort>, config: PaginatorConfig) -> Self {
        Self {
            source,
            states: Arc::new(Mutex::new(HashMap::new())),
            next_token: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    /// Loads the most recent page, replacing whatever the channel held.
    ///
    /// # Errors
    /// Returns error if the source fails; the previous state is kept.
    pub async fn fetch_initial(
        &self,
        channel: &ChannelKey,
        limit: usize,
    ) -> Result<FetchOutcome, GalleryError> {
        let guard = {
            let mut states = self.states.lock();
            let state = states
                .entry(channel.clone())
                .or_insert_with(|| PaginationState::new(limit));
            if state.is_loading() {
                debug!(channel = %channel, "Initial fetch skipped, request in flight");
                return Ok(FetchOutcome::Skipped {
                    reason: SkipReason::InFlight,
                });
            }
            state.set_limit(limit);
            self.begin(channel, state)
        };

        let request = FetchRequest::initial(channel, limit);
        self.run(channel, request, guard).await
    }

    /// Loads the page older than the last held item.
    ///
    /// # Errors
    /// Returns error if the channel is unknown or the source fails.
    pub async fn fetch_before(
        &self,
        channel: &ChannelKey,
        limit: usize,
    ) -> Result<FetchOutcome, GalleryError> {
        self.fetch_older(channel, None, limit).await
    }

    /// Loads the page older than `before_ts` (epoch seconds).
    ///
    /// # Errors
    /// Returns error if the channel is unknown or the source fails.
    pub async fn fetch_before_at(
        &self,
        channel: &ChannelKey,
        before_ts: i64,
        limit: usize,
    ) -> Result<FetchOutcome, GalleryError> {
        self.fetch_older(channel, Some(before_ts), limit).await
    }

    /// Loads items newer than the first held item.
    ///
    /// Only the in-flight guard applies: newer uploads can appear at any time.
    ///
    /// # Errors
    /// Returns error if the channel is unknown or the source fails.
    pub async fn fetch_after(
        &self,
        channel: &ChannelKey,
        limit: usize,
    ) -> Result<FetchOutcome, GalleryError> {
        let (after, guard) = {
            let mut states = self.states.lock();
            let state = states
                .get_mut(channel)
                .ok_or_else(|| GalleryError::UnknownChannel(channel.clone()))?;
            if state.is_loading() {
                debug!(channel = %channel, "Newer fetch skipped, request in flight");
                return Ok(FetchOutcome::Skipped {
                    reason: SkipReason::InFlight,
                });
            }
            let Some(after) = state.cursor_after() else {
                return Ok(FetchOutcome::Skipped {
                    reason: SkipReason::NoCursor,
                });
            };
            (after, self.begin(channel, state))
        };

        let request = FetchRequest::after(channel, after, limit);
        self.run(channel, request, guard).await
    }

    async fn fetch_older(
        &self,
        channel: &ChannelKey,
        before_ts: Option<i64>,
        limit: usize,
    ) -> Result<FetchOutcome, GalleryError> {
        let (before, guard) = {
            let mut states = self.states.lock();
            let state = states
                .get_mut(channel)
                .ok_or_else(|| GalleryError::UnknownChannel(channel.clone()))?;
            if state.is_loading() {
                debug!(channel = %channel, "Older fetch skipped, request in flight");
                return Ok(FetchOutcome::Skipped {
                    reason: SkipReason::InFlight,
                });
            }
            if !state.has_more_before() {
                debug!(channel = %channel, "Older fetch skipped, channel exhausted");
                return Ok(FetchOutcome::Skipped {
                    reason: SkipReason::Exhausted,
                });
            }
            let Some(before) = before_ts.or_else(|| state.cursor_before()) else {
                return Ok(FetchOutcome::Skipped {
                    reason: SkipReason::NoCursor,
                });
            };
            (before, self.begin(channel, state))
        };

        let request = FetchRequest::before(channel, before, limit);
        self.run(channel, request, guard).await
    }

    /// Marks `state` as loading under a fresh token.
    fn begin(&self, channel: &ChannelKey, state: &mut PaginationState) -> InFlightGuard {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        state.begin_request(token);
        InFlightGuard {
            states: Arc::clone(&self.states),
            channel: channel.clone(),
            token,
            armed: true,
        }
    }

    /// Sends the request and applies its completion. The lock is never held
    /// across the await.
    async fn run(
        &self,
        channel: &ChannelKey,
        request: FetchRequest,
        mut guard: InFlightGuard,
    ) -> Result<FetchOutcome, GalleryError> {
        debug!(
            channel = %channel,
            token = guard.token,
            direction = %request.direction,
            before = ?request.before,
            after = ?request.after,
            limit = request.limit,
            "Fetching attachment page"
        );

        let result = self.source.fetch_attachments(&request).await;
        guard.disarm();

        let mut states = self.states.lock();
        let Some(state) = states.get_mut(channel) else {
            debug!(channel = %channel, "Channel evicted while fetching, dropping page");
            return Ok(FetchOutcome::Discarded);
        };
        if !state.finish_request(guard.token) {
            debug!(
                channel = %channel,
                token = guard.token,
                current = ?state.in_flight(),
                "Channel re-initialized while fetching, dropping page"
            );
            return Ok(FetchOutcome::Discarded);
        }

        let response = result.map_err(|e| {
            warn!(channel = %channel, direction = %request.direction, error = %e, "Attachment fetch failed");
            GalleryError::fetch_failed(channel.clone(), request.direction, e)
        })?;

        let page = normalize_all(response.attachments, Utc::now());
        let returned = page.len();
        let (added, has_more) = match request.direction {
            FetchDirection::Initial => {
                state.replace(page, request.limit);
                (state.len(), state.has_more_before())
            }
            FetchDirection::Before => {
                let added = state.append_older(page, request.limit);
                (added, state.has_more_before())
            }
            FetchDirection::After => {
                let added = state.prepend_newer(page, request.limit);
                (added, state.has_more_after())
            }
        };

        info!(
            channel = %channel,
            direction = %request.direction,
            returned,
            added,
            total = state.len(),
            has_more,
            "Applied attachment page"
        );

        Ok(FetchOutcome::Applied(PageSummary {
            direction: request.direction,
            returned,
            added,
            total: state.len(),
            has_more,
        }))
    }

    /// Snapshot of a channel's state.
    #[must_use]
    pub fn state(&self, channel: &ChannelKey) -> Option<PaginationState> {
        self.states.lock().get(channel).cloned()
    }

    /// Items of a channel, newest first.
    #[must_use]
    pub fn items(&self, channel: &ChannelKey) -> Vec<Attachment> {
        self.states
            .lock()
            .get(channel)
            .map(|s| s.items().to_vec())
            .unwrap_or_default()
    }

    /// Cursor the next older page would use.
    #[must_use]
    pub fn next_before_cursor(&self, channel: &ChannelKey) -> Option<i64> {
        self.states
            .lock()
            .get(channel)
            .and_then(PaginationState::cursor_before)
    }

    /// Cursor the next newer page would use.
    #[must_use]
    pub fn next_after_cursor(&self, channel: &ChannelKey) -> Option<i64> {
        self.states
            .lock()
            .get(channel)
            .and_then(PaginationState::cursor_after)
    }

    /// Channels with live state.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelKey> {
        let mut channels: Vec<_> = self.states.lock().keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Drops a channel's state. Returns true if it existed.
    pub fn evict(&self, channel: &ChannelKey) -> bool {
        let removed = self.states.lock().remove(channel).is_some();
        if removed {
            debug!(channel = %channel, "Evicted gallery state");
        }
        removed
    }

    /// Whether a list scrolled to `distance_from_end` (same unit as
    /// `viewport_length`) should request the next older page.
    #[must_use]
    pub fn should_load_more(
        &self,
        channel: &ChannelKey,
        distance_from_end: f64,
        viewport_length: f64,
    ) -> bool {
        if viewport_length <= 0.0 {
            return false;
        }
        let states = self.states.lock();
        let Some(state) = states.get(channel) else {
            return false;
        };
        !state.is_loading()
            && state.has_more_before()
            && !state.is_empty()
            && distance_from_end <= self.config.end_reached_threshold * viewport_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RawAttachment;
    use crate::domain::errors::SourceError;
    use crate::domain::ports::FetchResponse;
    use crate::domain::ports::mocks::MockAttachmentSourcePort;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::function;
    use tokio::sync::Notify;

    fn raw(id: &str, secs: i64) -> RawAttachment {
        RawAttachment {
            id: Some(id.to_string()),
            url: format!("https://cdn.example.com/{id}.png"),
            filename: format!("{id}.png"),
            filetype: "image/png".to_string(),
            create_time: Utc.timestamp_opt(secs, 0).single(),
            ..RawAttachment::default()
        }
    }

    fn page(items: &[(&str, i64)]) -> FetchResponse {
        FetchResponse::new(items.iter().map(|(id, s)| raw(id, *s)).collect())
    }

    fn channel() -> ChannelKey {
        ChannelKey::new("clan", "general")
    }

    fn ids(paginator: &AttachmentPaginator) -> Vec<String> {
        paginator
            .items(&channel())
            .iter()
            .filter_map(|a| a.id().map(String::from))
            .collect()
    }

    #[tokio::test]
    async fn test_initial_then_before_dedups_and_advances_cursor() {
        let mut source = MockAttachmentSourcePort::new();
        source
            .expect_fetch_attachments()
            .with(function(|r: &FetchRequest| r.direction == FetchDirection::Initial))
            .times(1)
            .returning(|_| Ok(page(&[("a", 300), ("b", 200)])));
        source
            .expect_fetch_attachments()
            .with(function(|r: &FetchRequest| {
                r.direction == FetchDirection::Before && r.before == Some(200)
            }))
            .times(1)
            .returning(|_| Ok(page(&[("b", 200), ("c", 100)])));

        let paginator = AttachmentPaginator::new(Arc::new(source));

        let first = tokio_test::assert_ok!(paginator.fetch_initial(&channel(), 2).await);
        assert!(first.summary().is_some_and(|s| s.has_more));

        let second = tokio_test::assert_ok!(paginator.fetch_before(&channel(), 2).await);
        let summary = second.summary().copied().unwrap();
        assert_eq!(summary.returned, 2);
        assert_eq!(summary.added, 1);
        assert_eq!(ids(&paginator), ["a", "b", "c"]);
        assert_eq!(paginator.next_before_cursor(&channel()), Some(100));
    }

    #[tokio::test]
    async fn test_short_initial_page_exhausts_before() {
        let mut source = MockAttachmentSourcePort::new();
        source
            .expect_fetch_attachments()
            .times(1)
            .returning(|_| Ok(page(&[("a", 300)])));

        let paginator = AttachmentPaginator::new(Arc::new(source));
        paginator.fetch_initial(&channel(), 50).await.unwrap();

        let state = paginator.state(&channel()).unwrap();
        assert!(!state.has_more_before());
        assert!(!state.has_more_after());

        let outcome = paginator.fetch_before(&channel(), 50).await.unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::Skipped {
                reason: SkipReason::Exhausted
            }
        );
    }

    #[tokio::test]
    async fn test_empty_page_is_not_an_error() {
        let mut source = MockAttachmentSourcePort::new();
        source
            .expect_fetch_attachments()
            .returning(|r| {
                if r.direction == FetchDirection::Initial {
                    Ok(page(&[("a", 300), ("b", 200)]))
                } else {
                    Ok(FetchResponse::default())
                }
            });

        let paginator = AttachmentPaginator::new(Arc::new(source));
        paginator.fetch_initial(&channel(), 2).await.unwrap();
        let outcome = paginator.fetch_before(&channel(), 2).await.unwrap();

        assert_eq!(outcome.summary().map(|s| s.added), Some(0));
        assert!(!paginator.state(&channel()).unwrap().has_more_before());
    }

    #[tokio::test]
    async fn test_failure_keeps_state_and_clears_loading() {
        let mut source = MockAttachmentSourcePort::new();
        source
            .expect_fetch_attachments()
            .with(function(|r: &FetchRequest| r.direction == FetchDirection::Initial))
            .returning(|_| Ok(page(&[("a", 300), ("b", 200)])));
        source
            .expect_fetch_attachments()
            .with(function(|r: &FetchRequest| r.direction == FetchDirection::Before))
            .times(1)
            .returning(|_| Err(SourceError::network("connection reset")));

        let paginator = AttachmentPaginator::new(Arc::new(source));
        paginator.fetch_initial(&channel(), 2).await.unwrap();
        let before = paginator.state(&channel()).unwrap();

        let result = paginator.fetch_before(&channel(), 2).await;
        let err = tokio_test::assert_err!(result);

        assert!(matches!(err, GalleryError::FetchFailed { .. }));
        assert!(err.is_recoverable());
        let after = paginator.state(&channel()).unwrap();
        assert_eq!(after.items(), before.items());
        assert_eq!(after.cursor_before(), before.cursor_before());
        assert!(!after.is_loading());
    }

    #[tokio::test]
    async fn test_unknown_channel() {
        let source = MockAttachmentSourcePort::new();
        let paginator = AttachmentPaginator::new(Arc::new(source));

        let result = paginator.fetch_before(&channel(), 10).await;

        assert!(matches!(result, Err(GalleryError::UnknownChannel(_))));
    }

    #[tokio::test]
    async fn test_fetch_after_prepends_newer() {
        let mut source = MockAttachmentSourcePort::new();
        source
            .expect_fetch_attachments()
            .with(function(|r: &FetchRequest| r.direction == FetchDirection::Initial))
            .returning(|_| Ok(page(&[("a", 300), ("b", 200)])));
        source
            .expect_fetch_attachments()
            .with(function(|r: &FetchRequest| {
                r.direction == FetchDirection::After && r.after == Some(300)
            }))
            .times(1)
            .returning(|_| Ok(page(&[("n", 400), ("a", 300)])));

        let paginator = AttachmentPaginator::new(Arc::new(source));
        paginator.fetch_initial(&channel(), 2).await.unwrap();
        let outcome = paginator.fetch_after(&channel(), 2).await.unwrap();

        assert_eq!(outcome.summary().map(|s| s.added), Some(1));
        assert_eq!(ids(&paginator), ["n", "a", "b"]);
        assert_eq!(paginator.next_after_cursor(&channel()), Some(400));
    }

    struct GatedSource {
        gate: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl AttachmentSourcePort for GatedSource {
        async fn fetch_attachments(
            &self,
            _request: &FetchRequest,
        ) -> Result<FetchResponse, SourceError> {
            self.gate.notified().await;
            Ok(page(&[("a", 300)]))
        }
    }

    #[tokio::test]
    async fn test_second_fetch_is_skipped_while_in_flight() {
        let gate = Arc::new(Notify::new());
        let paginator = AttachmentPaginator::new(Arc::new(GatedSource { gate: gate.clone() }));

        let first = {
            let paginator = paginator.clone();
            tokio::spawn(async move { paginator.fetch_initial(&channel(), 10).await })
        };
        while !paginator.state(&channel()).is_some_and(|s| s.is_loading()) {
            tokio::task::yield_now().await;
        }

        let second = paginator.fetch_initial(&channel(), 10).await.unwrap();
        assert_eq!(
            second,
            FetchOutcome::Skipped {
                reason: SkipReason::InFlight
            }
        );
        assert!(!paginator.should_load_more(&channel(), 0.0, 100.0));

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert!(first.is_applied());
        assert!(!paginator.state(&channel()).unwrap().is_loading());
    }

    #[tokio::test]
    async fn test_evicted_channel_drops_late_page() {
        let gate = Arc::new(Notify::new());
        let paginator = AttachmentPaginator::new(Arc::new(GatedSource { gate: gate.clone() }));

        let pending = {
            let paginator = paginator.clone();
            tokio::spawn(async move { paginator.fetch_initial(&channel(), 10).await })
        };
        while paginator.state(&channel()).is_none() {
            tokio::task::yield_now().await;
        }
        assert!(paginator.evict(&channel()));

        gate.notify_one();
        let outcome = pending.await.unwrap().unwrap();

        assert_eq!(outcome, FetchOutcome::Discarded);
        assert!(paginator.channels().is_empty());
    }

    /// Answers the n-th call once `gates[n]` is notified, with an item named `gen{n}`.
    struct SequencedSource {
        gates: Vec<Arc<Notify>>,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AttachmentSourcePort for SequencedSource {
        async fn fetch_attachments(
            &self,
            _request: &FetchRequest,
        ) -> Result<FetchResponse, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.gates[call].notified().await;
            Ok(FetchResponse::new(vec![raw(&format!("gen{call}"), 300)]))
        }
    }

    #[tokio::test]
    async fn test_stale_completion_after_reinit_is_discarded() {
        let gates = vec![Arc::new(Notify::new()), Arc::new(Notify::new())];
        let source = SequencedSource {
            gates: gates.clone(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let paginator = AttachmentPaginator::new(Arc::new(source));

        let stale = {
            let paginator = paginator.clone();
            tokio::spawn(async move { paginator.fetch_initial(&channel(), 10).await })
        };
        while !paginator.state(&channel()).is_some_and(|s| s.is_loading()) {
            tokio::task::yield_now().await;
        }
        assert!(paginator.evict(&channel()));

        let fresh = {
            let paginator = paginator.clone();
            tokio::spawn(async move { paginator.fetch_initial(&channel(), 10).await })
        };
        while !paginator.state(&channel()).is_some_and(|s| s.is_loading()) {
            tokio::task::yield_now().await;
        }

        gates[0].notify_one();
        let stale = stale.await.unwrap().unwrap();
        assert_eq!(stale, FetchOutcome::Discarded);

        let state = paginator.state(&channel()).unwrap();
        assert!(state.is_loading());
        assert!(state.is_empty());
        assert_eq!(
            paginator.fetch_initial(&channel(), 10).await.unwrap(),
            FetchOutcome::Skipped {
                reason: SkipReason::InFlight
            }
        );

        gates[1].notify_one();
        let fresh = fresh.await.unwrap().unwrap();
        assert!(fresh.is_applied());
        assert_eq!(ids(&paginator), ["gen1"]);
        assert!(!paginator.state(&channel()).unwrap().is_loading());
    }

    #[tokio::test]
    async fn test_dropped_fetch_releases_channel() {
        let gate = Arc::new(Notify::new());
        let paginator = AttachmentPaginator::new(Arc::new(GatedSource { gate: gate.clone() }));
        let key = channel();

        let mut pending = tokio_test::task::spawn(paginator.fetch_initial(&key, 10));
        tokio_test::assert_pending!(pending.poll());
        assert!(paginator.state(&key).unwrap().is_loading());
        drop(pending);

        let state = paginator.state(&key).unwrap();
        assert!(!state.is_loading());
        assert_eq!(state.in_flight(), None);

        gate.notify_one();
        let next = paginator.fetch_initial(&key, 10).await.unwrap();
        assert!(next.is_applied());
        assert_eq!(ids(&paginator), ["a"]);
    }

    #[tokio::test]
    async fn test_should_load_more_threshold() {
        let mut source = MockAttachmentSourcePort::new();
        source
            .expect_fetch_attachments()
            .returning(|_| Ok(page(&[("a", 300), ("b", 200)])));

        let paginator = AttachmentPaginator::new(Arc::new(source));
        assert!(!paginator.should_load_more(&channel(), 0.0, 800.0));

        paginator.fetch_initial(&channel(), 2).await.unwrap();

        assert!(paginator.should_load_more(&channel(), 400.0, 800.0));
        assert!(!paginator.should_load_more(&channel(), 401.0, 800.0));
        assert!(!paginator.should_load_more(&channel(), 0.0, 0.0));
    }
}
