//! TUI application state
//!
//! Pure data for the view machine. One instance exists per process; the
//! reducer in `app.rs` is its only writer and the renderer in `views.rs`
//! its main reader. No rendering logic here.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use chrono::{DateTime, Local};
use serde_json::Value;
use tracing::debug;

use resq::{SearchEngine, SearchQuery, SearchResult};

use super::popups::Modal;
use super::progress::ProgressDescriptor;
use super::tree::ResourceTree;
use crate::cloud::{Container, Health, Resource, Subscription};

/// Bounded status log length
const MAX_STATUS_LINES: usize = 200;

/// Narrower than this, the layout drops to a single pane
pub const COMPACT_WIDTH: u16 = 100;

/// Content shown in the right pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Greeting + status log; shown before anything is selected
    #[default]
    Welcome,
    /// Subscription overview: counts by type/location, health rollup
    Dashboard,
    /// Selected resource's properties and action output
    Details,
    /// Executed search results
    SearchResults,
}

impl View {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Dashboard => "dashboard",
            Self::Details => "details",
            Self::SearchResults => "search",
        }
    }
}

/// Exactly one pane holds focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Tree,
    Details,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Self::Tree => Self::Details,
            Self::Details => Self::Tree,
        }
    }
}

/// Full two-pane layout vs single-pane compact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceMode {
    #[default]
    Full,
    Compact,
}

/// Search overlay state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Inactive,
    /// Editing the query; suggestions live
    Active,
    /// Navigating executed results
    Results,
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub mode: SearchMode,
    pub input: String,
    /// Byte offset into `input`
    pub cursor: usize,
    pub parsed: Option<SearchQuery>,
    pub results: Vec<SearchResult>,
    pub selected: usize,
    pub suggestions: Vec<String>,
    /// Session-only; never persisted
    pub history: Vec<String>,
}

impl SearchState {
    /// The token under the cursor (suggestions complete this)
    pub fn current_token(&self) -> &str {
        self.input[..self.cursor]
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or("")
    }

    /// Replace the token under the cursor with a suggestion
    pub fn accept_suggestion(&mut self, suggestion: &str) {
        let token_start = self.cursor - self.current_token().len();
        self.input.replace_range(token_start..self.cursor, suggestion);
        self.cursor = token_start + suggestion.len();
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.results.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_result(&self) -> Option<&SearchResult> {
        self.results.get(self.selected)
    }

    pub fn reset(&mut self) {
        self.mode = SearchMode::Inactive;
        self.input.clear();
        self.cursor = 0;
        self.parsed = None;
        self.results.clear();
        self.selected = 0;
        self.suggestions.clear();
    }
}

/// Severity of a status log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub when: DateTime<Local>,
    pub level: StatusLevel,
    pub text: String,
}

/// Right-pane buffer for the selected resource
#[derive(Debug, Default)]
pub struct DetailsBuffer {
    pub resource_id: String,
    /// Raw `describe` payload once it arrives
    pub value: Option<Value>,
    /// Diagnostic shown instead of / alongside the payload
    pub error: Option<String>,
    /// Rendered adapter listing (containers, secrets, pods, ...)
    pub listing: Option<String>,
    /// Appended success/failure lines from actions
    pub action_log: Vec<String>,
    /// AI analysis output (markdown)
    pub analysis: Option<String>,
    /// Containers from the last listing, for blob drill-down
    pub containers: Vec<Container>,
    pub loading: bool,
}

impl DetailsBuffer {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            loading: true,
            ..Self::default()
        }
    }
}

/// Main TUI application state. Created at startup, mutated only by the
/// reducer, dropped at quit.
#[derive(Debug)]
pub struct AppState {
    pub width: u16,
    pub height: u16,
    pub active_view: View,
    pub focus: Focus,
    pub left_scroll: usize,
    pub right_scroll: usize,
    /// Past views for Esc navigation; never holds the current view on top
    pub nav_stack: Vec<View>,
    pub interface_mode: InterfaceMode,

    // === Overlays ===
    /// Help coexists with a modal and takes Esc precedence
    pub help_open: bool,
    pub help_scroll: usize,
    pub modal: Option<Modal>,

    // === Cloud data ===
    pub tree: ResourceTree,
    pub subscriptions: Vec<Subscription>,
    pub current_subscription: Option<Subscription>,
    pub selected_resource: Option<Resource>,
    pub details: Option<DetailsBuffer>,
    pub health: HashMap<String, Health>,
    /// True once demo data replaced a timed-out listing
    pub demo_active: bool,

    // === Async action tracking ===
    outstanding_mutations: usize,
    pub loading_state: String,
    pub progress: HashMap<u64, ProgressDescriptor>,

    // === Search ===
    pub search: SearchState,
    pub engine: SearchEngine,

    // === Details pane ===
    pub selected_property: usize,
    pub expanded_properties: HashSet<String>,

    // === Diagnostics ===
    pub status_log: VecDeque<StatusLine>,

    pub spinner_frame: usize,
    pub started: Instant,
    pub should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            active_view: View::default(),
            focus: Focus::default(),
            left_scroll: 0,
            right_scroll: 0,
            nav_stack: Vec::new(),
            interface_mode: InterfaceMode::default(),
            help_open: false,
            help_scroll: 0,
            modal: None,
            tree: ResourceTree::new(),
            subscriptions: Vec::new(),
            current_subscription: None,
            selected_resource: None,
            details: None,
            health: HashMap::new(),
            demo_active: false,
            outstanding_mutations: 0,
            loading_state: String::new(),
            progress: HashMap::new(),
            search: SearchState::default(),
            engine: SearchEngine::new(),
            selected_property: 0,
            expanded_properties: HashSet::new(),
            status_log: VecDeque::new(),
            spinner_frame: 0,
            started: Instant::now(),
            should_quit: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // === Navigation stack ===

    /// Switch views, recording the old one. A no-op transition records
    /// nothing, so the stack never holds the current view on top.
    pub fn push_view(&mut self, view: View) {
        if view == self.active_view {
            return;
        }
        debug!(?view, from = ?self.active_view, "AppState::push_view");
        self.nav_stack.push(self.active_view);
        self.active_view = view;
    }

    /// Back one view. False (and no change) on an empty stack.
    /// Both pane scrolls reset on a successful pop.
    pub fn pop_view(&mut self) -> bool {
        match self.nav_stack.pop() {
            Some(view) => {
                debug!(?view, "AppState::pop_view");
                self.active_view = view;
                self.left_scroll = 0;
                self.right_scroll = 0;
                true
            }
            None => false,
        }
    }

    /// Drop the history but keep the current view
    pub fn clear_stack(&mut self) {
        self.nav_stack.clear();
    }

    // === Overlays ===

    /// Open a modal popup, replacing any current one
    pub fn open_modal(&mut self, modal: Modal) {
        debug!(title = modal.title(), "AppState::open_modal");
        self.modal = Some(modal);
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    // === Action lifecycle ===

    /// True iff at least one dispatched mutating command has not yet
    /// produced its terminal message
    pub fn action_in_progress(&self) -> bool {
        self.outstanding_mutations > 0
    }

    pub fn begin_action(&mut self, label: impl Into<String>) {
        self.outstanding_mutations += 1;
        self.loading_state = label.into();
    }

    pub fn finish_action(&mut self) {
        if self.outstanding_mutations == 0 {
            // Terminal message without a matching dispatch is a logic bug;
            // log and no-op rather than unwind.
            tracing::error!("finish_action with no outstanding mutation");
            return;
        }
        self.outstanding_mutations -= 1;
        if self.outstanding_mutations == 0 {
            self.loading_state.clear();
        }
    }

    // === Status log ===

    pub fn log_info(&mut self, text: impl Into<String>) {
        self.log(StatusLevel::Info, text);
    }

    pub fn log_warn(&mut self, text: impl Into<String>) {
        self.log(StatusLevel::Warn, text);
    }

    pub fn log_error(&mut self, text: impl Into<String>) {
        self.log(StatusLevel::Error, text);
    }

    fn log(&mut self, level: StatusLevel, text: impl Into<String>) {
        let text = text.into();
        debug!(?level, %text, "AppState::log");
        self.status_log.push_back(StatusLine {
            when: Local::now(),
            level,
            text,
        });
        while self.status_log.len() > MAX_STATUS_LINES {
            self.status_log.pop_front();
        }
    }

    /// Most recent status line, for the status bar
    pub fn last_status(&self) -> Option<&StatusLine> {
        self.status_log.back()
    }

    // === Search index ===

    /// Rebuild the search engine's record slice from the tree. Runs on
    /// the event loop whenever a resource listing lands.
    pub fn rebuild_index(&mut self) {
        let records: Vec<resq::Record> = self.tree.resources().iter().map(|r| r.to_record()).collect();
        debug!(count = records.len(), "AppState::rebuild_index");
        for resource in self.tree.resources() {
            self.health
                .insert(resource.id.clone(), Health::from_status(resource.status.as_deref()));
        }
        self.engine.set_records(records);
    }

    /// Effective layout mode: explicit compact toggle, or forced by width
    pub fn effective_mode(&self) -> InterfaceMode {
        if self.interface_mode == InterfaceMode::Compact || self.width < COMPACT_WIDTH {
            InterfaceMode::Compact
        } else {
            InterfaceMode::Full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_round_trip() {
        let mut state = AppState::new();
        assert_eq!(state.active_view, View::Welcome);

        state.push_view(View::Dashboard);
        state.push_view(View::Details);
        assert_eq!(state.nav_stack.len(), 2);

        assert!(state.pop_view());
        assert_eq!(state.active_view, View::Dashboard);
        assert!(state.pop_view());
        assert_eq!(state.active_view, View::Welcome);
        assert!(!state.pop_view());
        assert_eq!(state.active_view, View::Welcome);
    }

    #[test]
    fn test_push_same_view_is_noop() {
        let mut state = AppState::new();
        state.push_view(View::Welcome);
        assert!(state.nav_stack.is_empty());
    }

    #[test]
    fn test_pop_resets_scrolls() {
        let mut state = AppState::new();
        state.push_view(View::Details);
        state.left_scroll = 5;
        state.right_scroll = 9;
        assert!(state.pop_view());
        assert_eq!(state.left_scroll, 0);
        assert_eq!(state.right_scroll, 0);
    }

    #[test]
    fn test_action_lifecycle_counter() {
        let mut state = AppState::new();
        assert!(!state.action_in_progress());

        state.begin_action("start vm1…");
        state.begin_action("stop vm2…");
        assert!(state.action_in_progress());

        state.finish_action();
        assert!(state.action_in_progress());
        state.finish_action();
        assert!(!state.action_in_progress());
        assert!(state.loading_state.is_empty());

        // Stray terminal message must not unwind
        state.finish_action();
        assert!(!state.action_in_progress());
    }

    #[test]
    fn test_status_log_bounded() {
        let mut state = AppState::new();
        for i in 0..300 {
            state.log_info(format!("line {}", i));
        }
        assert_eq!(state.status_log.len(), MAX_STATUS_LINES);
        assert_eq!(state.status_log.back().unwrap().text, "line 299");
    }

    #[test]
    fn test_focus_toggle() {
        assert_eq!(Focus::Tree.toggle(), Focus::Details);
        assert_eq!(Focus::Details.toggle(), Focus::Tree);
    }

    #[test]
    fn test_compact_forced_by_width() {
        let mut state = AppState::new();
        state.width = 80;
        assert_eq!(state.effective_mode(), InterfaceMode::Compact);
        state.width = 160;
        assert_eq!(state.effective_mode(), InterfaceMode::Full);
        state.interface_mode = InterfaceMode::Compact;
        assert_eq!(state.effective_mode(), InterfaceMode::Compact);
    }

    #[test]
    fn test_search_current_token() {
        let mut search = SearchState::default();
        search.input = "type:vm web".to_string();
        search.cursor = search.input.len();
        assert_eq!(search.current_token(), "web");

        search.accept_suggestion("webapp-prod-01");
        assert_eq!(search.input, "type:vm webapp-prod-01");
        assert_eq!(search.cursor, search.input.len());
    }

    #[test]
    fn test_search_reset_clears_everything_but_history() {
        let mut search = SearchState::default();
        search.mode = SearchMode::Results;
        search.input = "x".to_string();
        search.history.push("x".to_string());
        search.reset();
        assert_eq!(search.mode, SearchMode::Inactive);
        assert!(search.input.is_empty());
        assert_eq!(search.history.len(), 1);
    }
}
