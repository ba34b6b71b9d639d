//! The reducer
//!
//! `App` owns the [`AppState`] and is its only writer. `update` consumes
//! one message and returns the follow-up commands to spawn; it never
//! blocks, never panics on command failure, and is deterministic for a
//! given (state, message) pair. Rendering is elsewhere (`views.rs`).
//!
//! Key routing priority (first match wins): help overlay, modal popup,
//! search mode, global shortcuts, context-sensitive resource actions,
//! focus-local navigation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::popups::{
    DevOpsMode, DevOpsPopup, Modal, SettingsMode, SettingsPopup, SubscriptionPopup, TerraformMode, TerraformPopup,
};
use super::properties;
use super::state::{AppState, DetailsBuffer, Focus, InterfaceMode, SearchMode, View};
use super::tree::{ChildSpec, NodeId, NodeKind};
use crate::adapters::{self, ActionKind, ActionSpec, ResourceAdapter};
use crate::ai::{Analyst, HttpAnalyst};
use crate::cloud::{CloudError, CloudMsg, Command, DemoCli, Dispatcher, Resource, ToolOp};
use crate::config::Config;

/// Simulated wall-time estimate for a mutating action
const MUTATE_EXPECTED: Duration = Duration::from_secs(8);

/// Progress descriptors count in percent
const PROGRESS_TOTAL: u64 = 100;

/// The reducer plus its collaborators
pub struct App {
    state: AppState,
    dispatcher: Dispatcher,
    analyst: Option<Arc<dyn Analyst>>,
    ai_auto: bool,
    subscription_override: Option<String>,
    tenant_override: Option<String>,
    next_op: u64,
}

impl App {
    pub fn new(dispatcher: Dispatcher, config: &Config) -> Self {
        let analyst: Option<Arc<dyn Analyst>> = match &config.ai {
            Some(ai) => match HttpAnalyst::new(ai) {
                Ok(analyst) => Some(Arc::new(analyst)),
                Err(e) => {
                    warn!(%e, "analysis provider unavailable");
                    None
                }
            },
            None => None,
        };

        Self {
            state: AppState::new(),
            dispatcher,
            analyst,
            ai_auto: config.ai_auto,
            subscription_override: config.subscription.clone(),
            tenant_override: config.tenant.clone(),
            next_op: 0,
        }
    }

    /// Swap in a scripted analyst (tests)
    #[cfg(test)]
    pub fn with_analyst(mut self, analyst: Arc<dyn Analyst>) -> Self {
        self.analyst = Some(analyst);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Commands to dispatch at startup
    pub fn init_commands(&mut self) -> Vec<Command> {
        self.state.log_info("loading subscriptions…");
        vec![self.dispatcher.list_subscriptions()]
    }

    /// The reducer: one message in, next state + follow-up commands out
    pub fn update(&mut self, msg: super::msg::Message) -> Vec<Command> {
        match msg {
            super::msg::Message::Key(key) => self.handle_key(key),
            super::msg::Message::Resize(w, h) => {
                self.state.width = w;
                self.state.height = h;
                Vec::new()
            }
            super::msg::Message::Tick => self.handle_tick(),
            super::msg::Message::Cloud(cloud) => self.handle_cloud(cloud),
        }
    }

    // === Key routing ===

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        debug!(?key, "App::handle_key");

        if self.state.help_open {
            self.handle_help_key(key);
            return Vec::new();
        }
        if self.state.modal.is_some() {
            return self.handle_modal_key(key);
        }
        if self.state.search.mode != SearchMode::Inactive {
            return self.handle_search_key(key);
        }
        if let Some(commands) = self.handle_global_key(key) {
            return commands;
        }
        if let KeyCode::Char(c) = key.code
            && let Some(commands) = self.handle_context_key(c)
        {
            return commands;
        }
        self.handle_nav_key(key)
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                self.state.help_open = false;
                self.state.help_scroll = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.help_scroll += 1,
            KeyCode::Char('k') | KeyCode::Up => self.state.help_scroll = self.state.help_scroll.saturating_sub(1),
            _ => {}
        }
    }

    /// Global shortcuts (priority 4). Returns None when the key falls
    /// through to context actions and navigation.
    fn handle_global_key(&mut self, key: KeyEvent) -> Option<Vec<Command>> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
                info!("quit requested");
                self.state.should_quit = true;
                Some(Vec::new())
            }
            (KeyCode::Char('?'), _) => {
                self.state.help_open = true;
                Some(Vec::new())
            }
            (KeyCode::Esc, _) => {
                // No popup and no search mode here; plain back-navigation
                self.state.pop_view();
                Some(Vec::new())
            }
            (KeyCode::Tab, _) => {
                self.state.focus = self.state.focus.toggle();
                Some(Vec::new())
            }
            (KeyCode::Char('h'), _) | (KeyCode::Left, _) => {
                self.state.focus = Focus::Tree;
                Some(Vec::new())
            }
            (KeyCode::Char('l'), _) | (KeyCode::Right, _) => {
                self.state.focus = Focus::Details;
                Some(Vec::new())
            }
            (KeyCode::Char('/'), _) => {
                self.state.search.mode = SearchMode::Active;
                Some(Vec::new())
            }
            (KeyCode::F(2), _) => {
                self.state.interface_mode = match self.state.interface_mode {
                    InterfaceMode::Full => InterfaceMode::Compact,
                    InterfaceMode::Compact => InterfaceMode::Full,
                };
                Some(Vec::new())
            }
            (KeyCode::Char('r'), _) => Some(self.refresh_selected()),
            (KeyCode::Char('R'), _) => Some(self.refresh_all()),
            (KeyCode::Char('d'), _) => {
                self.state.push_view(View::Dashboard);
                Some(Vec::new())
            }
            (KeyCode::Char('s'), _) => Some(self.open_subscription_popup()),
            (KeyCode::Char('T'), _) => {
                self.open_terraform_popup();
                Some(Vec::new())
            }
            (KeyCode::Char('O'), _) => {
                self.state.open_modal(Modal::DevOps(DevOpsPopup::new()));
                Some(Vec::new())
            }
            (KeyCode::Char(','), _) => {
                self.state.open_modal(Modal::Settings(SettingsPopup::new()));
                Some(Vec::new())
            }
            (KeyCode::Char('a'), _) => Some(self.request_analysis()),
            _ => None,
        }
    }

    /// Context-sensitive resource actions (priority 5)
    fn handle_context_key(&mut self, c: char) -> Option<Vec<Command>> {
        let resource = self.state.selected_resource.clone()?;
        let (adapter, spec) = adapters::action_for_key(&resource.resource_type, c)?;
        Some(self.execute_action(adapter, spec, &resource))
    }

    fn execute_action(
        &mut self,
        adapter: &'static dyn ResourceAdapter,
        spec: &'static ActionSpec,
        resource: &Resource,
    ) -> Vec<Command> {
        debug!(key = %spec.key, label = spec.label, resource = %resource.name, "App::execute_action");

        if spec.destructive && self.state.action_in_progress() {
            self.state
                .log_warn(format!("{} ignored: an action is already in progress", spec.label));
            return Vec::new();
        }

        match spec.kind {
            ActionKind::Mutate => {
                let details = self.state.details.as_ref().and_then(|d| d.value.as_ref());
                match adapter.mutate_args(resource, spec, details) {
                    Ok(args) => self.dispatch_mutation(resource, spec.label, args),
                    Err(reason) => {
                        // Precondition failure: surface, do not dispatch
                        self.state.log_error(reason);
                        Vec::new()
                    }
                }
            }
            ActionKind::Containers => {
                self.begin_listing(resource, "listing containers…");
                vec![
                    self.dispatcher
                        .list_containers(resource.id.clone(), resource.name.clone()),
                ]
            }
            ActionKind::Blobs => {
                let container = self
                    .state
                    .details
                    .as_ref()
                    .filter(|d| d.resource_id == resource.id)
                    .and_then(|d| d.containers.first())
                    .map(|c| c.name.clone());
                match container {
                    Some(container) => {
                        self.begin_listing(resource, "listing blobs…");
                        vec![
                            self.dispatcher
                                .list_blobs(resource.id.clone(), resource.name.clone(), container),
                        ]
                    }
                    None => {
                        self.state
                            .log_error(format!("list containers first (C) on {}", resource.name));
                        Vec::new()
                    }
                }
            }
            ActionKind::Secrets => {
                self.begin_listing(resource, "listing secrets…");
                vec![self.dispatcher.list_secrets(resource.id.clone(), resource.name.clone())]
            }
            ActionKind::Pods => {
                self.begin_listing(resource, "listing pods…");
                vec![self.dispatcher.list_pods(
                    resource.id.clone(),
                    resource.name.clone(),
                    resource.resource_group.clone(),
                )]
            }
        }
    }

    /// Details buffer for the resource, creating a fresh one when the
    /// selection moved elsewhere
    fn ensure_details(&mut self, resource: &Resource) -> &mut DetailsBuffer {
        if self
            .state
            .details
            .as_ref()
            .is_none_or(|d| d.resource_id != resource.id)
        {
            let mut buffer = DetailsBuffer::new(&resource.id);
            buffer.loading = false;
            self.state.details = Some(buffer);
        }
        self.state.details.get_or_insert_with(Default::default)
    }

    fn begin_listing(&mut self, resource: &Resource, label: &str) {
        let details = self.ensure_details(resource);
        details.listing = Some(label.to_string());
        self.state.push_view(View::Details);
    }

    fn dispatch_mutation(&mut self, resource: &Resource, label: &str, args: Vec<String>) -> Vec<Command> {
        let op = self.next_op;
        self.next_op += 1;

        let operation = format!("{} {}", label, resource.name);
        self.state.begin_action(format!("{}…", operation));
        self.state.progress.insert(
            op,
            super::progress::ProgressDescriptor::new(operation.clone(), PROGRESS_TOTAL, MUTATE_EXPECTED),
        );
        self.state.log_info(format!("{}…", operation));

        vec![
            self.dispatcher
                .mutate(op, resource.id.clone(), label.to_string(), args),
        ]
    }

    // === Modal popups ===

    fn handle_modal_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.code == KeyCode::Esc {
            if let Some(modal) = self.state.modal.as_mut()
                && modal.esc()
            {
                self.state.close_modal();
            }
            return Vec::new();
        }

        // Borrow dance: take the modal out, work on it, put it back
        // unless the handler decided to close it.
        let Some(mut modal) = self.state.modal.take() else {
            return Vec::new();
        };
        let mut close = false;
        let commands = match &mut modal {
            Modal::Subscription(p) => self.handle_subscription_popup_key(key, p, &mut close),
            Modal::DevOps(p) => self.handle_devops_popup_key(key, p),
            Modal::Terraform(p) => self.handle_terraform_popup_key(key, p),
            Modal::Settings(p) => self.handle_settings_popup_key(key, p),
        };
        if !close {
            self.state.modal = Some(modal);
        }
        commands
    }

    fn handle_subscription_popup_key(
        &mut self,
        key: KeyEvent,
        popup: &mut SubscriptionPopup,
        close: &mut bool,
    ) -> Vec<Command> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => popup.select_next(),
            KeyCode::Char('k') | KeyCode::Up => popup.select_prev(),
            KeyCode::Enter => {
                if let Some(sub) = popup.selected_subscription().cloned() {
                    *close = true;
                    self.state.log_info(format!("switching to {}…", sub.name));
                    return vec![self.dispatcher.set_subscription(sub.id)];
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_devops_popup_key(&mut self, key: KeyEvent, popup: &mut DevOpsPopup) -> Vec<Command> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => popup.select_next(),
            KeyCode::Char('k') | KeyCode::Up => popup.select_prev(),
            KeyCode::Enter => match popup.mode {
                DevOpsMode::Menu => {
                    if popup.menu_index == 0 {
                        popup.mode = DevOpsMode::Organizations;
                        popup.loading = true;
                        return vec![self.dispatcher.devops_organizations()];
                    }
                }
                DevOpsMode::Organizations => {
                    if let Some(org) = popup.selected_org() {
                        let org = org.name.clone();
                        popup.mode = DevOpsMode::Projects;
                        popup.loading = true;
                        return vec![self.dispatcher.devops_projects(org)];
                    }
                }
                DevOpsMode::Projects => {
                    if let (Some(org), Some(project)) = (popup.selected_org(), popup.selected_project()) {
                        let (org, project) = (org.name.clone(), project.name.clone());
                        popup.mode = DevOpsMode::Pipelines;
                        popup.loading = true;
                        return vec![self.dispatcher.devops_pipelines(org, project)];
                    }
                }
                DevOpsMode::Pipelines => {
                    if popup.selected_pipeline().is_some() {
                        popup.mode = DevOpsMode::Operations;
                        popup.scroll = 0;
                    }
                }
                DevOpsMode::Operations => {}
            },
            _ => {}
        }
        Vec::new()
    }

    fn handle_terraform_popup_key(&mut self, key: KeyEvent, popup: &mut TerraformPopup) -> Vec<Command> {
        // An open operand prompt swallows keys first (Esc is cleared one
        // level earlier, in Modal::esc)
        if let Some(input) = popup.workspace_input.as_mut() {
            match key.code {
                KeyCode::Enter => {
                    let name = input.trim().to_string();
                    if name.is_empty() {
                        self.state.log_error("workspace name is empty");
                        return Vec::new();
                    }
                    let Some(folder) = popup.selected_folder.clone() else {
                        popup.workspace_input = None;
                        return Vec::new();
                    };
                    popup.workspace_input = None;
                    popup.loading = true;
                    self.state.log_info(format!("terraform workspace select {}…", name));
                    return vec![self.dispatcher.run_tool(folder, ToolOp::WorkspaceSelect, Some(name))];
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => popup.select_next(),
            KeyCode::Char('k') | KeyCode::Up => popup.select_prev(),
            KeyCode::Enter => match popup.mode {
                TerraformMode::Menu => match popup.menu_index {
                    0 => popup.mode = TerraformMode::FolderSelect,
                    1 | 2 | 3 => {
                        if popup.selected_folder.is_none() {
                            self.state.log_error("select a working folder first");
                        } else {
                            popup.mode = match popup.menu_index {
                                1 => TerraformMode::Analysis,
                                2 => TerraformMode::Operations,
                                _ => TerraformMode::Editor,
                            };
                            popup.scroll = 0;
                        }
                    }
                    _ => {}
                },
                TerraformMode::FolderSelect => {
                    if let Some(folder) = popup.folders.get(popup.folder_index).cloned() {
                        self.state.log_info(format!("terraform folder: {}", folder.display()));
                        popup.selected_folder = Some(folder);
                        popup.mode = TerraformMode::Menu;
                    }
                }
                TerraformMode::Operations => {
                    if let (Some(op), Some(folder)) = (popup.selected_op(), popup.selected_folder.clone()) {
                        if op.wants_operand() {
                            popup.workspace_input = Some(String::new());
                        } else if op.is_destructive() && self.state.action_in_progress() {
                            self.state.log_warn("destroy ignored: an action is already in progress");
                        } else {
                            popup.loading = true;
                            self.state.log_info(format!("terraform {}…", op.label()));
                            return vec![self.dispatcher.run_tool(folder, op, None)];
                        }
                    }
                }
                TerraformMode::Analysis | TerraformMode::Editor => {}
            },
            _ => {}
        }
        Vec::new()
    }

    fn handle_settings_popup_key(&mut self, key: KeyEvent, popup: &mut SettingsPopup) -> Vec<Command> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => popup.select_next(),
            KeyCode::Char('k') | KeyCode::Up => popup.select_prev(),
            KeyCode::Enter => {
                if popup.mode == SettingsMode::Menu {
                    popup.mode = match popup.menu_index {
                        0 => SettingsMode::Environment,
                        _ => SettingsMode::Keybindings,
                    };
                    popup.scroll = 0;
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn open_subscription_popup(&mut self) -> Vec<Command> {
        let mut popup = SubscriptionPopup::new(self.state.subscriptions.clone());
        if popup.items.is_empty() {
            popup.loading = true;
            self.state.open_modal(Modal::Subscription(popup));
            return vec![self.dispatcher.list_subscriptions()];
        }
        self.state.open_modal(Modal::Subscription(popup));
        Vec::new()
    }

    fn open_terraform_popup(&mut self) {
        let folders = scan_tool_folders(&std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        self.state.open_modal(Modal::Terraform(TerraformPopup::new(folders)));
    }

    // === Search ===

    fn handle_search_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match self.state.search.mode {
            SearchMode::Active => {
                self.handle_search_edit_key(key);
                Vec::new()
            }
            SearchMode::Results => self.handle_search_results_key(key),
            SearchMode::Inactive => Vec::new(),
        }
    }

    fn handle_search_edit_key(&mut self, key: KeyEvent) {
        let search = &mut self.state.search;
        match key.code {
            KeyCode::Esc => {
                search.reset();
                if self.state.active_view == View::SearchResults {
                    self.state.pop_view();
                }
                return;
            }
            KeyCode::Enter => {
                self.run_search();
                return;
            }
            KeyCode::Tab => {
                if let Some(suggestion) = search.suggestions.first().cloned() {
                    search.accept_suggestion(&suggestion);
                }
            }
            KeyCode::Backspace => {
                if search.cursor > 0 {
                    let new_cursor = prev_char_boundary(&search.input, search.cursor);
                    search.input.drain(new_cursor..search.cursor);
                    search.cursor = new_cursor;
                }
            }
            KeyCode::Delete => {
                if search.cursor < search.input.len() {
                    let end = next_char_boundary(&search.input, search.cursor);
                    search.input.drain(search.cursor..end);
                }
            }
            KeyCode::Left => {
                if search.cursor > 0 {
                    search.cursor = prev_char_boundary(&search.input, search.cursor);
                }
            }
            KeyCode::Right => {
                if search.cursor < search.input.len() {
                    search.cursor = next_char_boundary(&search.input, search.cursor);
                }
            }
            KeyCode::Home => search.cursor = 0,
            KeyCode::End => search.cursor = search.input.len(),
            KeyCode::Down => {
                if !search.results.is_empty() {
                    search.mode = SearchMode::Results;
                }
                return;
            }
            KeyCode::Char(c) => {
                search.input.insert(search.cursor, c);
                search.cursor += c.len_utf8();
            }
            _ => return,
        }
        self.update_suggestions();
    }

    fn handle_search_results_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Esc => {
                self.state.search.reset();
                if self.state.active_view == View::SearchResults {
                    self.state.pop_view();
                }
            }
            KeyCode::Char('/') => self.state.search.mode = SearchMode::Active,
            KeyCode::Char('j') | KeyCode::Down => self.state.search.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.search.select_prev(),
            KeyCode::Enter => return self.jump_to_search_result(),
            _ => {}
        }
        Vec::new()
    }

    fn run_search(&mut self) {
        let raw = self.state.search.input.clone();
        let query = resq::SearchQuery::parse(&raw);
        debug!(%raw, advanced = query.is_advanced, "App::run_search");

        self.state.search.results = self.state.engine.search(&query);
        self.state.search.parsed = Some(query);
        self.state.search.selected = 0;
        self.state.search.mode = SearchMode::Results;
        if !raw.trim().is_empty() {
            self.state.search.history.push(raw);
        }
        self.state.push_view(View::SearchResults);
    }

    fn update_suggestions(&mut self) {
        let token = self.state.search.current_token().to_string();
        self.state.search.suggestions = resq::suggestions(&self.state.engine, &token);
    }

    fn jump_to_search_result(&mut self) -> Vec<Command> {
        let Some(result) = self.state.search.selected_result() else {
            return Vec::new();
        };
        let resource_id = result.resource_id.clone();

        let Some(node_id) = self.state.tree.find(&resource_id) else {
            self.state.log_warn("result no longer present in the tree");
            return Vec::new();
        };
        self.state.tree.reveal(node_id);
        self.state.search.mode = SearchMode::Inactive;
        match self.state.tree.get(node_id).and_then(|n| n.resource.clone()) {
            Some(resource) => self.open_details(&resource),
            None => Vec::new(),
        }
    }

    // === Navigation (priority 6: focus-local) ===

    fn handle_nav_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match self.state.focus {
            Focus::Tree => self.handle_tree_key(key),
            Focus::Details => {
                self.handle_details_key(key);
                Vec::new()
            }
        }
    }

    fn handle_tree_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.tree.select_next();
                self.sync_selected_resource();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.tree.select_prev();
                self.sync_selected_resource();
            }
            KeyCode::Char('g') => {
                self.state.tree.select_first();
                self.sync_selected_resource();
            }
            KeyCode::Char('G') => {
                self.state.tree.select_last();
                self.sync_selected_resource();
            }
            KeyCode::Char(' ') | KeyCode::Enter => return self.activate_selected_node(),
            _ => {}
        }
        Vec::new()
    }

    fn sync_selected_resource(&mut self) {
        self.state.selected_resource = self.state.tree.selected_node().and_then(|n| n.resource.clone());
    }

    /// Space/Enter on the selected node: toggle expansion (dispatching the
    /// child listing on first expansion) or open resource details.
    fn activate_selected_node(&mut self) -> Vec<Command> {
        let Some(node_id) = self.state.tree.selected_id() else {
            return Vec::new();
        };
        let Some(node) = self.state.tree.get(node_id) else {
            return Vec::new();
        };

        if node.kind == NodeKind::Resource {
            if let Some(resource) = node.resource.clone() {
                return self.open_details(&resource);
            }
            return Vec::new();
        }

        if node.expanded {
            self.state.tree.collapse(node_id);
            return Vec::new();
        }
        if node.loaded {
            self.state.tree.expand(node_id);
            return Vec::new();
        }
        if node.loading {
            return Vec::new();
        }
        self.load_children(node_id)
    }

    fn load_children(&mut self, node_id: NodeId) -> Vec<Command> {
        let Some(node) = self.state.tree.get(node_id) else {
            return Vec::new();
        };
        match node.kind {
            NodeKind::Subscription => {
                let sub_id = node.azure_id.clone();
                self.state.tree.begin_loading(node_id);
                vec![self.dispatcher.list_groups(node_id, sub_id)]
            }
            NodeKind::Group => {
                let group = node.label.clone();
                let Some(sub_id) = self.subscription_of(node_id) else {
                    warn!("group node without subscription ancestor");
                    return Vec::new();
                };
                self.state.tree.begin_loading(node_id);
                vec![self.dispatcher.list_resources(node_id, sub_id, group)]
            }
            // Tenants get their subscription children at startup
            NodeKind::Tenant | NodeKind::Resource => Vec::new(),
        }
    }

    fn subscription_of(&self, node_id: NodeId) -> Option<String> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = self.state.tree.get(id)?;
            if node.kind == NodeKind::Subscription {
                return Some(node.azure_id.clone());
            }
            current = node.parent;
        }
        None
    }

    fn open_details(&mut self, resource: &Resource) -> Vec<Command> {
        debug!(resource = %resource.name, "App::open_details");
        self.state.selected_resource = Some(resource.clone());
        self.state.details = Some(DetailsBuffer::new(&resource.id));
        self.state.selected_property = 0;
        self.state.right_scroll = 0;
        self.state.push_view(View::Details);
        vec![self.dispatcher.describe_resource(resource.id.clone())]
    }

    fn handle_details_key(&mut self, key: KeyEvent) {
        let property_count = self
            .state
            .details
            .as_ref()
            .and_then(|d| d.value.as_ref())
            .map(|v| properties::flatten(v, &self.state.expanded_properties).len())
            .unwrap_or(0);

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.state.active_view == View::Details && property_count > 0 {
                    if self.state.selected_property + 1 < property_count {
                        self.state.selected_property += 1;
                    }
                } else {
                    self.state.right_scroll = self.state.right_scroll.saturating_add(1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.state.active_view == View::Details && property_count > 0 {
                    self.state.selected_property = self.state.selected_property.saturating_sub(1);
                } else {
                    self.state.right_scroll = self.state.right_scroll.saturating_sub(1);
                }
            }
            KeyCode::Char('e') => self.toggle_selected_property(),
            _ => {}
        }
    }

    /// Toggle the disclosure state of the property under the cursor
    fn toggle_selected_property(&mut self) {
        let Some(value) = self.state.details.as_ref().and_then(|d| d.value.as_ref()) else {
            return;
        };
        let lines = properties::flatten(value, &self.state.expanded_properties);
        let Some(line) = lines.get(self.state.selected_property) else {
            return;
        };
        if !line.expandable {
            return;
        }
        if !self.state.expanded_properties.remove(&line.path) {
            self.state.expanded_properties.insert(line.path.clone());
        }
    }

    // === Refresh ===

    fn refresh_selected(&mut self) -> Vec<Command> {
        let Some(node_id) = self.state.tree.selected_id() else {
            return Vec::new();
        };
        let Some(node) = self.state.tree.get(node_id) else {
            return Vec::new();
        };
        match node.kind {
            NodeKind::Resource => {
                if let Some(resource) = node.resource.clone() {
                    self.state.log_info(format!("refreshing {}…", resource.name));
                    return self.open_details(&resource);
                }
                Vec::new()
            }
            NodeKind::Subscription | NodeKind::Group if node.loaded || node.expandable => {
                self.state.log_info(format!("refreshing {}…", node.label));
                self.load_children(node_id)
            }
            _ => Vec::new(),
        }
    }

    fn refresh_all(&mut self) -> Vec<Command> {
        self.state.log_info("reloading subscriptions…");
        self.state.tree.clear();
        self.state.demo_active = false;
        self.state.selected_resource = None;
        vec![self.dispatcher.list_subscriptions()]
    }

    // === AI analysis ===

    fn request_analysis(&mut self) -> Vec<Command> {
        let Some(analyst) = self.analyst.clone() else {
            self.state
                .log_warn("AI analysis not configured (set AZSCOPE_AI_ENABLED + endpoint/key)");
            return Vec::new();
        };
        let Some(resource) = self.state.selected_resource.clone() else {
            self.state.log_warn("select a resource to analyze");
            return Vec::new();
        };
        let Some(body) = self
            .state
            .details
            .as_ref()
            .filter(|d| d.resource_id == resource.id)
            .and_then(|d| d.value.as_ref())
            .map(|v| v.to_string())
        else {
            self.state.log_warn("open details first (Enter) before analysis");
            return Vec::new();
        };

        if let Some(details) = self.state.details.as_mut() {
            details.analysis = Some("_analyzing…_".to_string());
        }
        self.state.log_info(format!("analyzing {}…", resource.name));
        vec![analysis_command(analyst, resource.id.clone(), resource.name.clone(), body)]
    }

    // === Tick ===

    fn handle_tick(&mut self) -> Vec<Command> {
        self.state.spinner_frame = self.state.spinner_frame.wrapping_add(1);
        for descriptor in self.state.progress.values_mut() {
            descriptor.tick();
        }
        Vec::new()
    }

    // === Cloud results ===

    fn handle_cloud(&mut self, msg: CloudMsg) -> Vec<Command> {
        match msg {
            CloudMsg::Subscriptions(result) => self.on_subscriptions(result),
            CloudMsg::SubscriptionSet { id, result } => self.on_subscription_set(id, result),
            CloudMsg::Groups { node, result } => self.on_groups(node, result),
            CloudMsg::Resources { node, group, result } => self.on_resources(node, group, result),
            CloudMsg::Details { resource_id, result } => self.on_details(resource_id, result),
            CloudMsg::ActionDone {
                op,
                resource_id,
                action,
                result,
            } => self.on_action_done(op, resource_id, action, result),
            CloudMsg::Containers { resource_id, result } => {
                self.on_listing(&resource_id, |details| match result {
                    Ok(containers) => {
                        let account = details.resource_id.rsplit('/').next().unwrap_or("").to_string();
                        details.listing = Some(crate::adapters::storage::render_containers(&account, &containers));
                        details.containers = containers;
                        None
                    }
                    Err(e) => {
                        details.listing = Some(e.user_line());
                        Some(e)
                    }
                })
            }
            CloudMsg::Blobs {
                resource_id,
                container,
                result,
            } => self.on_listing(&resource_id, |details| match result {
                Ok(blobs) => {
                    details.listing = Some(crate::adapters::storage::render_blobs(&container, &blobs));
                    None
                }
                Err(e) => {
                    details.listing = Some(e.user_line());
                    Some(e)
                }
            }),
            CloudMsg::Secrets { resource_id, result } => self.on_listing(&resource_id, |details| match result {
                Ok(secrets) => {
                    let vault = details.resource_id.rsplit('/').next().unwrap_or("").to_string();
                    details.listing = Some(crate::adapters::keyvault::render_secrets(&vault, &secrets));
                    None
                }
                Err(e) => {
                    details.listing = Some(e.user_line());
                    Some(e)
                }
            }),
            CloudMsg::Pods { resource_id, result } => self.on_listing(&resource_id, |details| match result {
                Ok(pods) => {
                    let cluster = details.resource_id.rsplit('/').next().unwrap_or("").to_string();
                    details.listing = Some(crate::adapters::aks::render_pods(&cluster, &pods));
                    None
                }
                Err(e) => {
                    details.listing = Some(e.user_line());
                    Some(e)
                }
            }),
            CloudMsg::DevOpsOrganizations(result) => {
                if let Some(Modal::DevOps(popup)) = self.state.modal.as_mut() {
                    popup.loading = false;
                    match result {
                        Ok(orgs) => popup.orgs = orgs,
                        Err(e) => {
                            popup.mode = DevOpsMode::Menu;
                            self.state.log_error(e.user_line());
                        }
                    }
                }
                Vec::new()
            }
            CloudMsg::DevOpsProjects { result, .. } => {
                if let Some(Modal::DevOps(popup)) = self.state.modal.as_mut() {
                    popup.loading = false;
                    match result {
                        Ok(projects) => {
                            popup.projects = projects;
                            popup.project_index = 0;
                        }
                        Err(e) => {
                            popup.mode = DevOpsMode::Organizations;
                            self.state.log_error(e.user_line());
                        }
                    }
                }
                Vec::new()
            }
            CloudMsg::DevOpsPipelines { result, .. } => {
                if let Some(Modal::DevOps(popup)) = self.state.modal.as_mut() {
                    popup.loading = false;
                    match result {
                        Ok(pipelines) => {
                            popup.pipelines = pipelines;
                            popup.pipeline_index = 0;
                        }
                        Err(e) => {
                            popup.mode = DevOpsMode::Projects;
                            self.state.log_error(e.user_line());
                        }
                    }
                }
                Vec::new()
            }
            CloudMsg::Tool { op, dir, result } => {
                if let Some(Modal::Terraform(popup)) = self.state.modal.as_mut() {
                    popup.loading = false;
                    popup.scroll = 0;
                    popup.mode = TerraformMode::Analysis;
                    popup.analysis = match result {
                        Ok(output) => format!("$ terraform {} ({})\n\n{}", op.label(), dir.display(), output),
                        Err(e) => e.user_line(),
                    };
                } else if let Err(e) = result {
                    self.state.log_error(e.user_line());
                }
                Vec::new()
            }
            CloudMsg::Analysis { resource_id, result } => {
                if let Some(details) = self.state.details.as_mut()
                    && details.resource_id == resource_id
                {
                    details.analysis = Some(match result {
                        Ok(text) => text,
                        Err(e) => format!("analysis failed: {}", e),
                    });
                }
                Vec::new()
            }
        }
    }

    fn on_subscriptions(&mut self, result: Result<Vec<crate::cloud::Subscription>, CloudError>) -> Vec<Command> {
        let mut subscriptions = match result {
            Ok(subs) => subs,
            Err(e) if e.is_timeout() => {
                self.state.log_warn(format!("{}; showing demo data", e.user_line()));
                self.state.demo_active = true;
                DemoCli::subscriptions()
            }
            Err(e) => {
                self.state.log_error(e.user_line());
                if let Some(Modal::Subscription(popup)) = self.state.modal.as_mut() {
                    popup.loading = false;
                }
                return Vec::new();
            }
        };

        if let Some(tenant) = &self.tenant_override
            && subscriptions.iter().any(|s| &s.tenant_id == tenant)
        {
            subscriptions.retain(|s| &s.tenant_id == tenant);
        }

        info!(count = subscriptions.len(), "subscriptions loaded");
        self.state.subscriptions = subscriptions.clone();

        self.state.current_subscription = subscriptions
            .iter()
            .find(|s| match &self.subscription_override {
                Some(wanted) => &s.id == wanted || &s.name == wanted,
                None => s.is_default,
            })
            .or_else(|| subscriptions.first())
            .cloned();

        // Rebuild the tree: tenants as roots, subscriptions attached
        self.state.tree.clear();
        let mut tenants: Vec<String> = subscriptions.iter().map(|s| s.tenant_id.clone()).collect();
        tenants.sort();
        tenants.dedup();
        for tenant in tenants {
            let label = if tenant.is_empty() {
                "tenant".to_string()
            } else {
                format!("tenant {}", &tenant[..tenant.len().min(8)])
            };
            let root = self.state.tree.add_root(NodeKind::Tenant, label, tenant.clone());
            let children = subscriptions
                .iter()
                .filter(|s| s.tenant_id == tenant)
                .map(|s| ChildSpec {
                    kind: NodeKind::Subscription,
                    label: s.name.clone(),
                    azure_id: s.id.clone(),
                    resource: None,
                })
                .collect();
            self.state.tree.set_children(root, children);
        }
        self.sync_selected_resource();
        self.state.log_info(format!("{} subscriptions", self.state.subscriptions.len()));

        if let Some(Modal::Subscription(popup)) = self.state.modal.as_mut() {
            popup.loading = false;
            popup.items = self.state.subscriptions.clone();
        }
        Vec::new()
    }

    fn on_subscription_set(&mut self, id: String, result: Result<(), CloudError>) -> Vec<Command> {
        match result {
            Ok(()) => {
                self.state.current_subscription = self.state.subscriptions.iter().find(|s| s.id == id).cloned();
                let name = self
                    .state
                    .current_subscription
                    .as_ref()
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| id.clone());
                self.state.log_info(format!("subscription: {}", name));
                // Reload the subscription's groups eagerly
                if let Some(node_id) = self.state.tree.find(&id) {
                    return self.load_children(node_id);
                }
                Vec::new()
            }
            Err(e) => {
                self.state.log_error(e.user_line());
                Vec::new()
            }
        }
    }

    fn on_groups(&mut self, node: NodeId, result: Result<Vec<crate::cloud::ResourceGroup>, CloudError>) -> Vec<Command> {
        let sub_id = self.state.tree.get(node).map(|n| n.azure_id.clone()).unwrap_or_default();
        let groups = match result {
            Ok(groups) => groups,
            Err(e) if e.is_timeout() => {
                self.state.log_warn(format!("{}; showing demo data", e.user_line()));
                self.state.demo_active = true;
                DemoCli::groups()
            }
            Err(e) => {
                self.state.tree.abort_loading(node);
                self.state.log_error(e.user_line());
                return Vec::new();
            }
        };

        let count = groups.len();
        let children = groups
            .into_iter()
            .map(|g| ChildSpec {
                kind: NodeKind::Group,
                azure_id: format!("{}/{}", sub_id, g.name),
                label: g.name,
                resource: None,
            })
            .collect();
        self.state.tree.set_children(node, children);
        self.sync_selected_resource();
        self.state.log_info(format!("{} resource groups", count));
        Vec::new()
    }

    fn on_resources(
        &mut self,
        node: NodeId,
        group: String,
        result: Result<Vec<Resource>, CloudError>,
    ) -> Vec<Command> {
        let resources = match result {
            Ok(resources) => resources,
            Err(e) if e.is_timeout() => {
                self.state.log_warn(format!("{}; showing demo data", e.user_line()));
                self.state.demo_active = true;
                DemoCli::resources(&group)
            }
            Err(e) => {
                self.state.tree.abort_loading(node);
                self.state.log_error(e.user_line());
                return Vec::new();
            }
        };

        let count = resources.len();
        let children = resources
            .into_iter()
            .map(|r| ChildSpec {
                kind: NodeKind::Resource,
                label: r.name.clone(),
                azure_id: r.id.clone(),
                resource: Some(r),
            })
            .collect();
        self.state.tree.set_children(node, children);
        self.state.rebuild_index();
        self.sync_selected_resource();
        self.state.log_info(format!("{}: {} resources", group, count));
        Vec::new()
    }

    fn on_details(&mut self, resource_id: String, result: Result<Value, CloudError>) -> Vec<Command> {
        let Some(details) = self.state.details.as_mut() else {
            return Vec::new();
        };
        if details.resource_id != resource_id {
            debug!(%resource_id, "stale details result ignored");
            return Vec::new();
        }
        details.loading = false;

        match result {
            Ok(value) => {
                details.value = Some(value);
                details.error = None;
                self.state.selected_property = 0;

                if self.ai_auto && self.analyst.is_some() {
                    return self.request_analysis();
                }
                Vec::new()
            }
            Err(e) => {
                details.error = Some(e.user_line());
                if !e.is_cancelled() {
                    self.state.log_error(e.user_line());
                }
                Vec::new()
            }
        }
    }

    fn on_action_done(
        &mut self,
        op: u64,
        resource_id: String,
        action: String,
        result: Result<Option<Value>, CloudError>,
    ) -> Vec<Command> {
        self.state.finish_action();
        self.state.progress.remove(&op);

        let line = match &result {
            Ok(payload) => {
                let suffix = payload
                    .as_ref()
                    .and_then(|v| v.get("status"))
                    .and_then(Value::as_str)
                    .map(|s| format!(" ({})", s))
                    .unwrap_or_default();
                self.state.log_info(format!("{} succeeded", action));
                format!("✓ {}{}", action, suffix)
            }
            Err(e) if e.is_cancelled() => return Vec::new(),
            Err(e) => {
                self.state.log_error(format!("{}: {}", action, e.user_line()));
                format!("✗ {}: {}", action, e.user_line())
            }
        };

        if let Some(details) = self.state.details.as_mut()
            && details.resource_id == resource_id
        {
            details.action_log.push(line);
            // Logs come back as a plain text payload worth showing whole
            if action == "logs"
                && let Ok(Some(Value::String(text))) = result
            {
                details.listing = Some(text);
            }
        }
        Vec::new()
    }

    fn on_listing<F>(&mut self, resource_id: &str, apply: F) -> Vec<Command>
    where
        F: FnOnce(&mut DetailsBuffer) -> Option<CloudError>,
    {
        let Some(details) = self.state.details.as_mut() else {
            return Vec::new();
        };
        if details.resource_id != resource_id {
            debug!(%resource_id, "stale listing result ignored");
            return Vec::new();
        }
        if let Some(e) = apply(details) {
            self.state.log_error(e.user_line());
        }
        Vec::new()
    }
}

/// Build the analysis command outside the reducer borrow
fn analysis_command(analyst: Arc<dyn Analyst>, resource_id: String, subject: String, body: String) -> Command {
    Box::pin(async move {
        let result = analyst.analyze(&subject, &body).await.map_err(|e| e.to_string());
        CloudMsg::Analysis { resource_id, result }
    })
}

/// Immediate subdirectories containing at least one `.tf` file
fn scan_tool_folders(base: &std::path::Path) -> Vec<PathBuf> {
    let mut folders = Vec::new();
    if has_tool_files(base) {
        folders.push(base.to_path_buf());
    }
    if let Ok(entries) = std::fs::read_dir(base) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && has_tool_files(&path) {
                folders.push(path);
            }
        }
    }
    folders.sort();
    folders
}

fn has_tool_files(dir: &std::path::Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| {
            entries.any(|e| {
                e.map(|e| e.path().extension().is_some_and(|ext| ext == "tf"))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

fn prev_char_boundary(s: &str, pos: usize) -> usize {
    let mut new_pos = pos.saturating_sub(1);
    while new_pos > 0 && !s.is_char_boundary(new_pos) {
        new_pos -= 1;
    }
    new_pos
}

fn next_char_boundary(s: &str, pos: usize) -> usize {
    let mut new_pos = pos + 1;
    while new_pos < s.len() && !s.is_char_boundary(new_pos) {
        new_pos += 1;
    }
    new_pos.min(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::msg::Message;

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::from(code))
    }

    fn demo_app() -> App {
        let dispatcher = Dispatcher::new(Arc::new(DemoCli::new()));
        App::new(dispatcher, &Config::default())
    }

    /// Drive a command to completion and feed its message back
    async fn settle(app: &mut App, commands: Vec<Command>) {
        for command in commands {
            let msg = command.await;
            let follow_ups = app.update(Message::Cloud(msg));
            Box::pin(settle(app, follow_ups)).await;
        }
    }

    async fn loaded_app() -> App {
        let mut app = demo_app();
        let init = app.init_commands();
        settle(&mut app, init).await;
        app
    }

    #[tokio::test]
    async fn test_startup_builds_tree() {
        let app = loaded_app().await;
        assert_eq!(app.state().subscriptions.len(), 2);
        // tenant + two subscriptions visible
        assert_eq!(app.state().tree.visible_len(), 3);
        assert_eq!(app.state().current_subscription.as_ref().unwrap().name, "Contoso Production");
    }

    #[tokio::test]
    async fn test_expand_subscription_loads_groups() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char('j'))); // first subscription
        let commands = app.update(key(KeyCode::Enter));
        assert_eq!(commands.len(), 1);
        settle(&mut app, commands).await;
        // tenant + 2 subs + 3 groups
        assert_eq!(app.state().tree.visible_len(), 6);
    }

    #[tokio::test]
    async fn test_enter_on_resource_opens_details() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char('j')));
        let cmds = app.update(key(KeyCode::Enter));
        settle(&mut app, cmds).await;
        // Navigate to first group and expand
        app.update(key(KeyCode::Char('j')));
        let cmds = app.update(key(KeyCode::Enter));
        settle(&mut app, cmds).await;
        // First child resource
        app.update(key(KeyCode::Char('j')));
        assert!(app.state().selected_resource.is_some());

        let cmds = app.update(key(KeyCode::Enter));
        assert_eq!(app.state().active_view, View::Details);
        settle(&mut app, cmds).await;
        let details = app.state().details.as_ref().unwrap();
        assert!(details.value.is_some());
        assert!(!details.loading);
    }

    #[tokio::test]
    async fn test_esc_navigation_contract() {
        let mut app = loaded_app().await;
        assert_eq!(app.state().active_view, View::Welcome);

        app.update(key(KeyCode::Char('d')));
        assert_eq!(app.state().active_view, View::Dashboard);

        // Open details on top
        app.state_mut().selected_resource = Some(DemoCli::resources("rg-web-prod")[0].clone());
        let resource = app.state().selected_resource.clone().unwrap();
        let cmds = app.open_details(&resource);
        settle(&mut app, cmds).await;
        assert_eq!(app.state().active_view, View::Details);

        app.update(key(KeyCode::Esc));
        assert_eq!(app.state().active_view, View::Dashboard);
        app.update(key(KeyCode::Esc));
        assert_eq!(app.state().active_view, View::Welcome);
        // Stack empty: Esc leaves the view unchanged
        app.update(key(KeyCode::Esc));
        assert_eq!(app.state().active_view, View::Welcome);
    }

    #[tokio::test]
    async fn test_esc_closes_help_before_navigation() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char('d')));
        app.update(key(KeyCode::Char('?')));
        assert!(app.state().help_open);

        app.update(key(KeyCode::Esc));
        assert!(!app.state().help_open);
        assert_eq!(app.state().active_view, View::Dashboard);
    }

    #[tokio::test]
    async fn test_esc_closes_modal_before_navigation() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char('d')));
        app.update(key(KeyCode::Char(',')));
        assert!(app.state().modal.is_some());

        app.update(key(KeyCode::Esc));
        assert!(app.state().modal.is_none());
        assert_eq!(app.state().active_view, View::Dashboard);
    }

    #[tokio::test]
    async fn test_help_esc_precedence_over_modal() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char(',')));
        app.update(key(KeyCode::Char('?')));
        assert!(app.state().help_open);
        assert!(app.state().modal.is_some());

        app.update(key(KeyCode::Esc));
        assert!(!app.state().help_open);
        assert!(app.state().modal.is_some());
    }

    #[tokio::test]
    async fn test_focus_cycles_under_tab() {
        let mut app = loaded_app().await;
        assert_eq!(app.state().focus, Focus::Tree);
        app.update(key(KeyCode::Tab));
        assert_eq!(app.state().focus, Focus::Details);
        app.update(key(KeyCode::Tab));
        assert_eq!(app.state().focus, Focus::Tree);
    }

    #[tokio::test]
    async fn test_opening_and_closing_popup_leaves_state_unchanged() {
        let mut app = loaded_app().await;
        let view_before = app.state().active_view;
        let focus_before = app.state().focus;
        let stack_before = app.state().nav_stack.len();
        let visible_before = app.state().tree.visible_len();

        app.update(key(KeyCode::Char('O')));
        assert!(app.state().modal.is_some());
        app.update(key(KeyCode::Esc));

        assert!(app.state().modal.is_none());
        assert_eq!(app.state().active_view, view_before);
        assert_eq!(app.state().focus, focus_before);
        assert_eq!(app.state().nav_stack.len(), stack_before);
        assert_eq!(app.state().tree.visible_len(), visible_before);
    }

    #[tokio::test]
    async fn test_mutating_action_lifecycle() {
        let mut app = loaded_app().await;
        // Select the first VM and open details
        let resource = DemoCli::resources("rg-web-prod")[0].clone();
        let cmds = app.open_details(&resource);
        settle(&mut app, cmds).await;
        assert!(!app.state().action_in_progress());

        // 'S' starts the VM
        let commands = app.update(key(KeyCode::Char('S')));
        assert_eq!(commands.len(), 1);
        assert!(app.state().action_in_progress());
        assert!(app.state().loading_state.contains("start"));
        assert_eq!(app.state().progress.len(), 1);

        settle(&mut app, commands).await;
        assert!(!app.state().action_in_progress());
        assert!(app.state().progress.is_empty());
        let details = app.state().details.as_ref().unwrap();
        assert!(details.action_log.iter().any(|l| l.starts_with('✓')));
    }

    #[tokio::test]
    async fn test_destructive_action_blocked_while_busy() {
        let mut app = loaded_app().await;
        let resource = DemoCli::resources("rg-web-prod")[0].clone();
        let cmds = app.open_details(&resource);
        settle(&mut app, cmds).await;

        let first = app.update(key(KeyCode::Char('S')));
        assert!(app.state().action_in_progress());

        let second = app.update(key(KeyCode::Char('X')));
        assert!(second.is_empty());

        settle(&mut app, first).await;
        assert!(!app.state().action_in_progress());
    }

    #[tokio::test]
    async fn test_ssh_precondition_failure_does_not_dispatch() {
        let mut app = loaded_app().await;
        let resource = DemoCli::resources("rg-web-prod")[0].clone();
        app.state_mut().selected_resource = Some(resource.clone());
        // No details loaded: precondition (public IP) cannot hold
        let commands = app.update(key(KeyCode::Char('C')));
        assert!(commands.is_empty());
        assert!(!app.state().action_in_progress());
        let last = app.state().last_status().unwrap();
        assert!(last.text.contains("public IP"));
    }

    #[tokio::test]
    async fn test_search_flow_end_to_end() {
        let mut app = loaded_app().await;
        // Load resources so the index is populated
        app.update(key(KeyCode::Char('j')));
        let cmds = app.update(key(KeyCode::Enter));
        settle(&mut app, cmds).await;
        app.update(key(KeyCode::Char('j')));
        let cmds = app.update(key(KeyCode::Enter));
        settle(&mut app, cmds).await;

        app.update(key(KeyCode::Char('/')));
        assert_eq!(app.state().search.mode, SearchMode::Active);
        // rg-data-prod holds exactly one storage account
        for c in "type:storage".chars() {
            app.update(key(KeyCode::Char(c)));
        }
        app.update(key(KeyCode::Enter));
        assert_eq!(app.state().search.mode, SearchMode::Results);
        assert_eq!(app.state().active_view, View::SearchResults);
        assert_eq!(app.state().search.results.len(), 1);
        assert_eq!(app.state().search.results[0].resource_name, "stcontosodata");
        assert!(app.state().search.results.iter().all(|r| r.score == resq::FILTER_ONLY_SCORE));

        // Esc dismisses search and pops the view
        app.update(key(KeyCode::Esc));
        assert_eq!(app.state().search.mode, SearchMode::Inactive);
        assert_ne!(app.state().active_view, View::SearchResults);
    }

    #[tokio::test]
    async fn test_search_suggestions_complete_token() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char('j')));
        let cmds = app.update(key(KeyCode::Enter));
        settle(&mut app, cmds).await;
        app.update(key(KeyCode::Char('j')));
        let cmds = app.update(key(KeyCode::Enter));
        settle(&mut app, cmds).await;

        app.update(key(KeyCode::Char('/')));
        for c in "aks".chars() {
            app.update(key(KeyCode::Char(c)));
        }
        assert!(!app.state().search.suggestions.is_empty());
        app.update(key(KeyCode::Tab));
        // Name suggestions outrank the type alias
        assert_eq!(app.state().search.input, "aks-contoso");
    }

    #[tokio::test]
    async fn test_analysis_flow_with_mock_provider() {
        let mut app = demo_app().with_analyst(Arc::new(crate::ai::MockAnalyst::new(vec![Ok(
            "## Summary\nall good".to_string(),
        )])));
        let init = app.init_commands();
        settle(&mut app, init).await;

        let resource = DemoCli::resources("rg-web-prod")[0].clone();
        let cmds = app.open_details(&resource);
        settle(&mut app, cmds).await;

        let cmds = app.update(key(KeyCode::Char('a')));
        assert_eq!(cmds.len(), 1);
        settle(&mut app, cmds).await;

        let analysis = app.state().details.as_ref().unwrap().analysis.as_deref();
        assert_eq!(analysis, Some("## Summary\nall good"));
    }

    #[tokio::test]
    async fn test_analysis_without_provider_logs_hint() {
        let mut app = loaded_app().await;
        let cmds = app.update(key(KeyCode::Char('a')));
        assert!(cmds.is_empty());
        assert!(app.state().last_status().unwrap().text.contains("not configured"));
    }

    #[tokio::test]
    async fn test_property_expansion_toggle() {
        let mut app = loaded_app().await;
        let resource = DemoCli::resources("rg-web-prod")[0].clone();
        let cmds = app.open_details(&resource);
        settle(&mut app, cmds).await;
        app.state_mut().focus = Focus::Details;

        // The demo id is long enough to be truncatable
        let value = app.state().details.as_ref().unwrap().value.clone().unwrap();
        let lines = properties::flatten(&value, &std::collections::HashSet::new());
        let target = lines.iter().position(|l| l.expandable).unwrap();
        app.state_mut().selected_property = target;

        app.update(key(KeyCode::Char('e')));
        assert_eq!(app.state().expanded_properties.len(), 1);
        app.update(key(KeyCode::Char('e')));
        assert!(app.state().expanded_properties.is_empty());
    }

    #[tokio::test]
    async fn test_terraform_popup_flow() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main.tf"), "resource {}\n").unwrap();

        let mut app = loaded_app().await;
        app.state_mut().open_modal(Modal::Terraform(TerraformPopup::new(vec![
            temp.path().to_path_buf(),
        ])));

        // Menu -> FolderSelect -> pick folder -> Menu
        app.update(key(KeyCode::Enter));
        app.update(key(KeyCode::Enter));
        match app.state().modal.as_ref() {
            Some(Modal::Terraform(p)) => {
                assert_eq!(p.mode, TerraformMode::Menu);
                assert!(p.selected_folder.is_some());
            }
            other => panic!("unexpected modal: {:?}", other.map(|m| m.title())),
        }

        // Menu item 2 = Operations; run the eagerly selected init op
        app.update(key(KeyCode::Char('j')));
        app.update(key(KeyCode::Char('j')));
        app.update(key(KeyCode::Enter));
        let commands = app.update(key(KeyCode::Enter));
        assert_eq!(commands.len(), 1);
        settle(&mut app, commands).await;

        match app.state().modal.as_ref() {
            Some(Modal::Terraform(p)) => {
                assert_eq!(p.mode, TerraformMode::Analysis);
                assert!(p.analysis.contains("terraform init"));
            }
            other => panic!("unexpected modal: {:?}", other.map(|m| m.title())),
        }
    }

    #[tokio::test]
    async fn test_terraform_workspace_select_prompts_for_name() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("main.tf"), "resource {}\n").unwrap();

        let mut app = loaded_app().await;
        app.state_mut().open_modal(Modal::Terraform(TerraformPopup::new(vec![
            temp.path().to_path_buf(),
        ])));

        // Select the folder, then enter Operations
        app.update(key(KeyCode::Enter));
        app.update(key(KeyCode::Enter));
        app.update(key(KeyCode::Char('j')));
        app.update(key(KeyCode::Char('j')));
        app.update(key(KeyCode::Enter));

        // Walk to the last operation: workspace select
        for _ in 0..ToolOp::ALL.len() {
            app.update(key(KeyCode::Char('j')));
        }
        let cmds = app.update(key(KeyCode::Enter));
        assert!(cmds.is_empty(), "prompt opens without dispatching");
        match app.state().modal.as_ref() {
            Some(Modal::Terraform(p)) => assert!(p.workspace_input.is_some()),
            other => panic!("unexpected modal: {:?}", other.map(|m| m.title())),
        }

        // Enter on an empty name refuses to dispatch
        let cmds = app.update(key(KeyCode::Enter));
        assert!(cmds.is_empty());
        assert!(app.state().last_status().unwrap().text.contains("empty"));

        for c in "staging".chars() {
            app.update(key(KeyCode::Char(c)));
        }
        let commands = app.update(key(KeyCode::Enter));
        assert_eq!(commands.len(), 1);
        settle(&mut app, commands).await;

        match app.state().modal.as_ref() {
            Some(Modal::Terraform(p)) => {
                assert_eq!(p.mode, TerraformMode::Analysis);
                assert!(p.workspace_input.is_none());
                assert!(p.analysis.contains("workspace select staging"));
            }
            other => panic!("unexpected modal: {:?}", other.map(|m| m.title())),
        }
    }

    #[tokio::test]
    async fn test_devops_popup_drill_down() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char('O')));

        let commands = app.update(key(KeyCode::Enter)); // menu -> organizations
        settle(&mut app, commands).await;
        let commands = app.update(key(KeyCode::Enter)); // org -> projects
        settle(&mut app, commands).await;
        let commands = app.update(key(KeyCode::Enter)); // project -> pipelines
        settle(&mut app, commands).await;
        app.update(key(KeyCode::Enter)); // pipeline -> operations

        match app.state().modal.as_ref() {
            Some(Modal::DevOps(p)) => {
                assert_eq!(p.mode, DevOpsMode::Operations);
                assert_eq!(p.pipelines.len(), 2);
            }
            other => panic!("unexpected modal: {:?}", other.map(|m| m.title())),
        }

        // Esc walks back exactly one level
        app.update(key(KeyCode::Esc));
        match app.state().modal.as_ref() {
            Some(Modal::DevOps(p)) => assert_eq!(p.mode, DevOpsMode::Pipelines),
            other => panic!("unexpected modal: {:?}", other.map(|m| m.title())),
        }
    }

    #[tokio::test]
    async fn test_subscription_switch() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char('s')));
        assert!(matches!(app.state().modal, Some(Modal::Subscription(_))));

        app.update(key(KeyCode::Char('j')));
        let commands = app.update(key(KeyCode::Enter));
        assert!(app.state().modal.is_none());
        settle(&mut app, commands).await;
        assert_eq!(app.state().current_subscription.as_ref().unwrap().name, "Contoso Development");
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = loaded_app().await;
        app.update(key(KeyCode::Char('q')));
        assert!(app.state().should_quit);

        let mut app = loaded_app().await;
        app.update(Message::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.state().should_quit);
    }

    #[tokio::test]
    async fn test_tick_advances_progress() {
        let mut app = loaded_app().await;
        let resource = DemoCli::resources("rg-web-prod")[0].clone();
        let cmds = app.open_details(&resource);
        settle(&mut app, cmds).await;
        let _pending = app.update(key(KeyCode::Char('S')));

        app.update(Message::Tick);
        let descriptor = app.state().progress.values().next().unwrap();
        assert!(descriptor.completed < descriptor.total);
    }
}
