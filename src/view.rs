use crate::render::{RenderedMessage, RenderedToolCalls, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkBadge {
    /// Status request not answered yet.
    Checking,
    Connected(String),
    Disconnected,
}

/// What the chat controller writes to.
pub trait View {
    fn is_empty(&self) -> bool;
    fn append_message(&mut self, message: RenderedMessage);
    fn append_tool_calls(&mut self, block: RenderedToolCalls);
    fn clear_transcript(&mut self);
    fn set_loading(&mut self, loading: bool);
    fn set_network_badge(&mut self, badge: NetworkBadge);
    fn scroll_to_bottom(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Message(RenderedMessage),
    ToolCalls(RenderedToolCalls),
}

impl Entry {
    pub fn markup(&self) -> &str {
        match self {
            Entry::Message(m) => &m.markup,
            Entry::ToolCalls(t) => &t.markup,
        }
    }
}

/// In-memory conversation view: an append-only list of entries plus the
/// indicator state around it.
#[derive(Debug)]
pub struct Transcript {
    entries: Vec<Entry>,
    loading: bool,
    badge: NetworkBadge,
    scroll_requested: bool,
    generation: u64,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Transcript {
            entries: Vec::new(),
            loading: false,
            badge: NetworkBadge::Checking,
            scroll_requested: false,
            generation: 0,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn badge(&self) -> &NetworkBadge {
        &self.badge
    }

    /// Messages with the given role, oldest first.
    pub fn messages(&self, role: Role) -> impl Iterator<Item = &RenderedMessage> {
        self.entries.iter().filter_map(move |entry| match entry {
            Entry::Message(m) if m.role == role => Some(m),
            _ => None,
        })
    }

    pub fn last_reply(&self) -> Option<&RenderedMessage> {
        self.messages(Role::Assistant).last()
    }

    /// The conversation container's inner HTML.
    pub fn markup(&self) -> String {
        self.entries.iter().map(Entry::markup).collect()
    }

    /// Bumped on every clear, so caches keyed by entry index can tell a
    /// rebuilt transcript from a grown one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once per scroll request.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }
}

impl View for Transcript {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn append_message(&mut self, message: RenderedMessage) {
        self.entries.push(Entry::Message(message));
    }

    fn append_tool_calls(&mut self, block: RenderedToolCalls) {
        self.entries.push(Entry::ToolCalls(block));
    }

    fn clear_transcript(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_network_badge(&mut self, badge: NetworkBadge) {
        self.badge = badge;
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_message, render_tool_calls};

    #[test]
    fn test_entries_keep_append_order() {
        let mut transcript = Transcript::new();
        transcript.append_message(render_message(Role::User, "one"));
        transcript.append_tool_calls(render_tool_calls(&[]));
        transcript.append_message(render_message(Role::Assistant, "two"));

        let entries = transcript.entries();
        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[0], Entry::Message(m) if m.content == "one"));
        assert!(matches!(&entries[1], Entry::ToolCalls(_)));
        assert!(matches!(&entries[2], Entry::Message(m) if m.content == "two"));
        assert_eq!(transcript.last_reply().map(|m| m.content.as_str()), Some("two"));
    }

    #[test]
    fn test_markup_concatenates_entries() {
        let mut transcript = Transcript::new();
        transcript.append_message(render_message(Role::User, "a"));
        transcript.append_message(render_message(Role::User, "b"));
        let markup = transcript.markup();
        assert!(markup.find("<p>a</p>").unwrap() < markup.find("<p>b</p>").unwrap());
    }

    #[test]
    fn test_scroll_request_is_consumed() {
        let mut transcript = Transcript::new();
        assert!(!transcript.take_scroll_request());
        transcript.scroll_to_bottom();
        assert!(transcript.take_scroll_request());
        assert!(!transcript.take_scroll_request());
    }

    #[test]
    fn test_clear_keeps_indicators() {
        let mut transcript = Transcript::new();
        transcript.set_loading(true);
        transcript.set_network_badge(NetworkBadge::Disconnected);
        transcript.append_message(render_message(Role::System, "hi"));
        transcript.clear_transcript();

        assert!(transcript.is_empty());
        assert_eq!(transcript.generation(), 1);
        assert!(transcript.is_loading());
        assert_eq!(transcript.badge(), &NetworkBadge::Disconnected);
    }
}
