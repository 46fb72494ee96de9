use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Attachment, AttachmentKey};

/// Identifies one channel's gallery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelKey {
    /// Clan (server) the channel belongs to.
    pub clan_id: String,
    /// Channel id.
    pub channel_id: String,
}

impl ChannelKey {
    /// Creates a new channel key.
    #[must_use]
    pub fn new(clan_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            clan_id: clan_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.clan_id, self.channel_id)
    }
}

/// Which page a fetch asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchDirection {
    /// Most recent page.
    Initial,
    /// Older than the `before` cursor.
    Before,
    /// Newer than the `after` cursor.
    After,
}

impl std::fmt::Display for FetchDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// Pagination state of one channel. `items` is always newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    items: Vec<Attachment>,
    cursor_before: Option<i64>,
    cursor_after: Option<i64>,
    has_more_before: bool,
    has_more_after: bool,
    is_loading: bool,
    #[serde(skip)]
    request: Option<u64>,
    limit: usize,
}

#[allow(missing_docs)]
impl PaginationState {
    /// Fresh state for a channel that has not been fetched yet.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            cursor_before: None,
            cursor_after: None,
            has_more_before: true,
            has_more_after: false,
            is_loading: false,
            request: None,
            limit,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[Attachment] {
        &self.items
    }

    #[must_use]
    pub const fn cursor_before(&self) -> Option<i64> {
        self.cursor_before
    }

    #[must_use]
    pub const fn cursor_after(&self) -> Option<i64> {
        self.cursor_after
    }

    #[must_use]
    pub const fn has_more_before(&self) -> bool {
        self.has_more_before
    }

    #[must_use]
    pub const fn has_more_after(&self) -> bool {
        self.has_more_after
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Token of the request in flight, if any.
    #[must_use]
    pub const fn in_flight(&self) -> Option<u64> {
        self.request
    }

    pub(crate) const fn begin_request(&mut self, token: u64) {
        self.is_loading = true;
        self.request = Some(token);
    }

    /// Clears the in-flight marker if `token` still owns it.
    pub(crate) fn finish_request(&mut self, token: u64) -> bool {
        if self.request != Some(token) {
            return false;
        }
        self.is_loading = false;
        self.request = None;
        true
    }

    pub(crate) const fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Replaces the content with a first page.
    pub(crate) fn replace(&mut self, mut page: Vec<Attachment>, requested: usize) {
        let returned = page.len();
        sort_newest_first(&mut page);
        dedup_in_place(&mut page);
        self.has_more_before = returned >= requested && requested > 0;
        self.has_more_after = false;
        self.items = page;
        self.refresh_cursors();
    }

    /// Appends an older page. Returns the number of new items.
    pub(crate) fn append_older(&mut self, page: Vec<Attachment>, requested: usize) -> usize {
        let returned = page.len();
        let added = self.merge(page);
        self.has_more_before = returned >= requested && requested > 0 && added > 0;
        added
    }

    /// Prepends a newer page. Returns the number of new items.
    pub(crate) fn prepend_newer(&mut self, page: Vec<Attachment>, requested: usize) -> usize {
        let returned = page.len();
        let added = self.merge(page);
        self.has_more_after = returned >= requested && requested > 0 && added > 0;
        added
    }

    fn merge(&mut self, page: Vec<Attachment>) -> usize {
        let mut seen: HashSet<AttachmentKey> = self.items.iter().map(Attachment::key).collect();
        let before = self.items.len();
        for item in page {
            if seen.insert(item.key()) {
                self.items.push(item);
            }
        }
        let added = self.items.len() - before;
        if added > 0 {
            sort_newest_first(&mut self.items);
        }
        self.refresh_cursors();
        added
    }

    fn refresh_cursors(&mut self) {
        self.cursor_before = self.items.last().map(Attachment::epoch_seconds);
        self.cursor_after = self.items.first().map(|a| {
            let at = a.create_time();
            if at.timestamp_subsec_nanos() > 0 {
                at.timestamp() + 1
            } else {
                at.timestamp()
            }
        });
    }
}

/// Stable sort, newest first.
fn sort_newest_first(items: &mut [Attachment]) {
    items.sort_by(|a, b| b.create_time().cmp(&a.create_time()));
}

fn dedup_in_place(items: &mut Vec<Attachment>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, secs: i64) -> Attachment {
        let at = Utc.timestamp_opt(secs, 0).unwrap();
        Attachment::new(id, format!("https://x/{id}.png"), id, "image/png", at)
    }

    #[test]
    fn test_only_owning_request_clears_loading() {
        let mut state = PaginationState::new(3);
        state.begin_request(7);

        assert!(!state.finish_request(6));
        assert!(state.is_loading());
        assert_eq!(state.in_flight(), Some(7));

        assert!(state.finish_request(7));
        assert!(!state.is_loading());
        assert_eq!(state.in_flight(), None);
    }

    #[test]
    fn test_replace_sorts_and_sets_exhaustion() {
        let mut state = PaginationState::new(3);
        state.replace(vec![item("a", 10), item("b", 30), item("c", 20)], 3);

        let ids: Vec<_> = state.items().iter().filter_map(Attachment::id).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert!(state.has_more_before());
        assert!(!state.has_more_after());
        assert_eq!(state.cursor_before(), Some(10));
        assert_eq!(state.cursor_after(), Some(30));
    }

    #[test]
    fn test_append_older_drops_duplicates() {
        let mut state = PaginationState::new(2);
        state.replace(vec![item("a", 30), item("b", 20)], 2);

        let added = state.append_older(vec![item("b", 20), item("c", 10)], 2);

        assert_eq!(added, 1);
        assert_eq!(state.len(), 3);
        assert_eq!(state.cursor_before(), Some(10));
    }

    #[test]
    fn test_page_of_only_duplicates_exhausts() {
        let mut state = PaginationState::new(2);
        state.replace(vec![item("a", 30), item("b", 20)], 2);

        let added = state.append_older(vec![item("a", 30), item("b", 20)], 2);

        assert_eq!(added, 0);
        assert!(!state.has_more_before());
    }

    #[test]
    fn test_prepend_newer_keeps_order() {
        let mut state = PaginationState::new(2);
        state.replace(vec![item("a", 30), item("b", 20)], 2);

        state.prepend_newer(vec![item("z", 50), item("y", 40)], 5);

        let ids: Vec<_> = state.items().iter().filter_map(Attachment::id).collect();
        assert_eq!(ids, ["z", "y", "a", "b"]);
        assert!(!state.has_more_after());
        assert_eq!(state.cursor_after(), Some(50));
    }
}
