//! TUI views and rendering
//!
//! All rendering logic is contained here. Rendering is a pure function of
//! `AppState`; nothing in this module mutates state. Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ powerline status bar                                 │
//! ├────────────────┬─────────────────────────────────────┤
//! │ tree pane      │ content pane (welcome / dashboard / │
//! │                │ details / search results)           │
//! └────────────────┴─────────────────────────────────────┘
//! ```
//!
//! Popups composite on top of the panes as frameless overlays.

use std::collections::BTreeMap;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::trace;

use super::popups::{DEVOPS_MENU, DevOpsMode, Modal, SETTINGS_MENU, SettingsMode, TERRAFORM_MENU, TerraformMode};
use super::properties;
use super::state::{AppState, Focus, InterfaceMode, SearchMode, StatusLevel, View};
use super::tree::NodeKind;
use crate::adapters;
use crate::cloud::{Health, ToolOp};

/// Palette (powerline-ish)
mod colors {
    use ratatui::style::Color;

    pub const ACCENT: Color = Color::Rgb(0, 153, 204); // azure blue
    pub const SEGMENT_BG: Color = Color::Rgb(38, 38, 48);
    pub const SEGMENT_FG: Color = Color::Rgb(220, 220, 220);
    pub const FOCUSED_BORDER: Color = Color::Rgb(0, 255, 255);
    pub const DIM_BORDER: Color = Color::DarkGray;
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const HEALTHY: Color = Color::Rgb(50, 205, 50);
    pub const WARNING: Color = Color::Rgb(255, 215, 0);
    pub const CRITICAL: Color = Color::Rgb(220, 20, 60);
    pub const UNKNOWN: Color = Color::Gray;
    pub const DIM: Color = Color::DarkGray;
    pub const KEY: Color = Color::Rgb(0, 255, 255);
    pub const OVERLAY_BG: Color = Color::Rgb(24, 24, 32);
}

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Powerline segment separator
const SEP: &str = "";

fn health_color(health: Health) -> Color {
    match health {
        Health::Healthy => colors::HEALTHY,
        Health::Warning => colors::WARNING,
        Health::Critical => colors::CRITICAL,
        Health::Unknown => colors::UNKNOWN,
    }
}

/// Main render function
pub fn render(state: &AppState, frame: &mut Frame) {
    trace!(view = ?state.active_view, "render");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(0),    // panes
        ])
        .split(frame.area());

    render_status_bar(state, frame, chunks[0]);

    match state.effective_mode() {
        InterfaceMode::Full => {
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(chunks[1]);
            render_tree_pane(state, frame, panes[0]);
            render_content_pane(state, frame, panes[1]);
        }
        InterfaceMode::Compact => {
            // One pane at a time; focus decides which
            match state.focus {
                Focus::Tree => render_tree_pane(state, frame, chunks[1]),
                Focus::Details => render_content_pane(state, frame, chunks[1]),
            }
        }
    }

    if state.search.mode == SearchMode::Active {
        render_search_overlay(state, frame);
    }
    if let Some(modal) = &state.modal {
        render_modal(state, modal, frame);
    }
    if state.help_open {
        render_help_overlay(state, frame);
    }
}

// === Status bar ===

fn segment<'a>(spans: &mut Vec<Span<'a>>, text: String, fg: Color, bg: Color) {
    if !spans.is_empty() {
        spans.push(Span::styled(SEP, Style::default().fg(bg)));
    }
    spans.push(Span::styled(format!(" {} ", text), Style::default().fg(fg).bg(bg)));
}

fn render_status_bar(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut spans: Vec<Span> = Vec::new();

    segment(
        &mut spans,
        "azscope".to_string(),
        Color::Black,
        colors::ACCENT,
    );

    let subscription = state
        .current_subscription
        .as_ref()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "no subscription".to_string());
    segment(&mut spans, subscription, colors::SEGMENT_FG, colors::SEGMENT_BG);

    if state.demo_active {
        segment(&mut spans, "demo data".to_string(), Color::Black, colors::WARNING);
    }

    if state.action_in_progress() {
        let spin = SPINNER[state.spinner_frame % SPINNER.len()];
        let label = if let Some(p) = state.progress.values().next() {
            format!(
                "{} {} {}% {}",
                spin,
                p.current_operation,
                (p.fraction() * 100.0) as u64,
                p.stage.as_str()
            )
        } else {
            format!("{} {}", spin, state.loading_state)
        };
        segment(&mut spans, label, Color::Black, colors::WARNING);
    }

    let focus = match state.focus {
        Focus::Tree => "▶ Tree (j/k:navigate)",
        Focus::Details => "▶ Details (j/k:scroll)",
    };
    segment(&mut spans, focus.to_string(), colors::SEGMENT_FG, colors::SEGMENT_BG);

    segment(
        &mut spans,
        contextual_shortcuts(state),
        colors::KEY,
        colors::SEGMENT_BG,
    );

    if !state.nav_stack.is_empty() {
        segment(
            &mut spans,
            format!("Esc:Back({})", state.nav_stack.len()),
            colors::SEGMENT_FG,
            colors::SEGMENT_BG,
        );
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Shortcut list for the current mode / selected resource
fn contextual_shortcuts(state: &AppState) -> String {
    if let Some(modal) = &state.modal {
        return modal.shortcuts();
    }
    match state.search.mode {
        SearchMode::Active => return "Tab:complete Enter:run Esc:cancel".to_string(),
        SearchMode::Results => return "j/k:move Enter:open /:edit Esc:close".to_string(),
        SearchMode::Inactive => {}
    }
    if let Some(resource) = &state.selected_resource
        && let Some(adapter) = adapters::adapter_for(&resource.resource_type)
    {
        return format!("{} · /:search ?:help", adapter.shortcuts());
    }
    "/:search d:dash s:subs T:tf O:devops ?:help".to_string()
}

// === Tree pane ===

fn render_tree_pane(state: &AppState, frame: &mut Frame, area: Rect) {
    let focused = state.focus == Focus::Tree;
    let border_color = if focused { colors::FOCUSED_BORDER } else { colors::DIM_BORDER };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Resources ")
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.tree.is_empty() {
        let spin = SPINNER[state.spinner_frame % SPINNER.len()];
        frame.render_widget(
            Paragraph::new(format!("{} loading…", spin)).style(Style::default().fg(colors::DIM)),
            inner,
        );
        return;
    }

    let viewport = inner.height as usize;
    let selected = state.tree.selected_index();
    // Keep the selection inside the viewport
    let offset = if selected >= viewport { selected + 1 - viewport } else { 0 };

    let mut lines: Vec<Line> = Vec::new();
    for (row, &node_id) in state.tree.visible().iter().enumerate().skip(offset).take(viewport) {
        let Some(node) = state.tree.get(node_id) else { continue };
        let indent = "  ".repeat(node.depth);

        let marker = if node.loading {
            SPINNER[state.spinner_frame % SPINNER.len()]
        } else if node.expandable {
            if node.expanded { "▼" } else { "▶" }
        } else {
            " "
        };

        let mut spans = vec![
            Span::raw(format!("{}{} ", indent, marker)),
            Span::styled(format!("{} ", node.kind.icon()), Style::default().fg(colors::DIM)),
        ];

        if node.kind == NodeKind::Resource {
            let health = state.health.get(&node.azure_id).copied().unwrap_or_default();
            spans.push(Span::styled(
                format!("{} ", health.glyph()),
                Style::default().fg(health_color(health)),
            ));
        }

        spans.push(Span::raw(node.label.clone()));

        let mut line = Line::from(spans);
        if row == selected {
            let style = if focused {
                Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD)
            } else {
                Style::default().bg(colors::SELECTED_BG)
            };
            line = line.style(style);
        }
        lines.push(line);
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

// === Content pane ===

fn render_content_pane(state: &AppState, frame: &mut Frame, area: Rect) {
    let focused = state.focus == Focus::Details;
    let border_color = if focused { colors::FOCUSED_BORDER } else { colors::DIM_BORDER };
    let title = format!(" {} ", state.active_view.display_name());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match state.active_view {
        View::Welcome => render_welcome(state, frame, inner),
        View::Dashboard => render_dashboard(state, frame, inner),
        View::Details => render_details(state, frame, inner),
        View::SearchResults => render_search_results(state, frame, inner),
    }
}

fn render_welcome(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "azscope — Azure resource browser",
            Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw("Space/Enter expand · Enter on a resource opens details"),
        Line::raw("/ search · d dashboard · s subscriptions · ? full help"),
        Line::raw(""),
    ];

    if !state.status_log.is_empty() {
        lines.push(Line::from(Span::styled("Recent activity", Style::default().fg(colors::DIM))));
        for entry in state.status_log.iter().rev().take(12) {
            let color = match entry.level {
                StatusLevel::Info => colors::SEGMENT_FG,
                StatusLevel::Warn => colors::WARNING,
                StatusLevel::Error => colors::CRITICAL,
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} ", entry.when.format("%H:%M:%S")),
                    Style::default().fg(colors::DIM),
                ),
                Span::styled(entry.text.clone(), Style::default().fg(color)),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_dashboard(state: &AppState, frame: &mut Frame, area: Rect) {
    let resources = state.tree.resources();
    let name = state
        .current_subscription
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or("-");

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_location: BTreeMap<&str, usize> = BTreeMap::new();
    let mut healthy = 0usize;
    let mut warning = 0usize;
    let mut critical = 0usize;
    let mut unknown = 0usize;
    for r in &resources {
        *by_type.entry(r.resource_type.as_str()).or_default() += 1;
        *by_location.entry(r.location.as_str()).or_default() += 1;
        match state.health.get(&r.id).copied().unwrap_or_default() {
            Health::Healthy => healthy += 1,
            Health::Warning => warning += 1,
            Health::Critical => critical += 1,
            Health::Unknown => unknown += 1,
        }
    }

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Dashboard — {}", name),
            Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::raw(format!("{} resources loaded   ", resources.len())),
            Span::styled(format!("✓ {}  ", healthy), Style::default().fg(colors::HEALTHY)),
            Span::styled(format!("⚠ {}  ", warning), Style::default().fg(colors::WARNING)),
            Span::styled(format!("✗ {}  ", critical), Style::default().fg(colors::CRITICAL)),
            Span::styled(format!("? {}", unknown), Style::default().fg(colors::UNKNOWN)),
        ]),
        Line::raw(""),
    ];

    if resources.is_empty() {
        lines.push(Line::raw("Nothing loaded yet - expand a resource group first."));
    } else {
        lines.push(Line::from(Span::styled("By type", Style::default().fg(colors::DIM))));
        for (rtype, count) in &by_type {
            lines.push(Line::raw(format!("  {:<56} {}", rtype, count)));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("By location", Style::default().fg(colors::DIM))));
        for (location, count) in &by_location {
            lines.push(Line::raw(format!("  {:<56} {}", location, count)));
        }
    }

    let scroll = state.right_scroll.min(lines.len().saturating_sub(1)) as u16;
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
}

fn render_details(state: &AppState, frame: &mut Frame, area: Rect) {
    let Some(details) = &state.details else {
        frame.render_widget(
            Paragraph::new("Select a resource and press Enter.").style(Style::default().fg(colors::DIM)),
            area,
        );
        return;
    };

    let mut lines: Vec<Line> = Vec::new();

    if let Some(resource) = &state.selected_resource {
        let health = state.health.get(&resource.id).copied().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", health.glyph()),
                Style::default().fg(health_color(health)),
            ),
            Span::styled(
                resource.name.clone(),
                Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} · {}", resource.resource_type, resource.location),
                Style::default().fg(colors::DIM),
            ),
        ]));
        lines.push(Line::raw(""));
    }

    if details.loading {
        let spin = SPINNER[state.spinner_frame % SPINNER.len()];
        lines.push(Line::raw(format!("{} fetching details…", spin)));
    }

    if let Some(error) = &details.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(colors::CRITICAL),
        )));
        lines.push(Line::raw(""));
    }

    let focused = state.focus == Focus::Details;
    let mut selected_row = None;
    if let Some(value) = &details.value {
        for (i, prop) in properties::flatten(value, &state.expanded_properties).into_iter().enumerate() {
            let indent = "  ".repeat(prop.depth);
            let mut spans = vec![Span::raw(indent)];
            match prop.value {
                Some(text) => {
                    spans.push(Span::styled(
                        format!("{}: ", prop.key),
                        Style::default().fg(colors::KEY),
                    ));
                    spans.push(Span::raw(text));
                    if prop.truncated {
                        spans.push(Span::styled(" (e:expand)", Style::default().fg(colors::DIM)));
                    }
                }
                None => spans.push(Span::styled(
                    prop.key.clone(),
                    Style::default().fg(colors::SEGMENT_FG).add_modifier(Modifier::BOLD),
                )),
            }
            let mut line = Line::from(spans);
            if focused && i == state.selected_property {
                line = line.style(Style::default().bg(colors::SELECTED_BG));
                selected_row = Some(lines.len());
            }
            lines.push(line);
        }
    }

    if let Some(listing) = &details.listing {
        lines.push(Line::raw(""));
        for text_line in listing.lines() {
            lines.push(Line::raw(text_line.to_string()));
        }
    }

    if !details.action_log.is_empty() {
        lines.push(Line::raw(""));
        for entry in &details.action_log {
            let color = if entry.starts_with('✓') { colors::HEALTHY } else { colors::CRITICAL };
            lines.push(Line::from(Span::styled(entry.clone(), Style::default().fg(color))));
        }
    }

    if let Some(analysis) = &details.analysis {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "AI analysis",
            Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD),
        )));
        let rendered = tui_markdown::from_str(analysis);
        for line in rendered.lines.iter() {
            lines.push(line.clone());
        }
    }

    // Keep the selected property in view; manual scroll otherwise
    let viewport = area.height as usize;
    let scroll = match selected_row {
        Some(row) if row >= viewport => row + 1 - viewport,
        Some(_) => 0,
        None => state.right_scroll.min(lines.len().saturating_sub(1)),
    } as u16;

    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
}

fn render_search_results(state: &AppState, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    let query = state
        .search
        .parsed
        .as_ref()
        .map(|q| q.to_query_string())
        .unwrap_or_default();
    lines.push(Line::from(vec![
        Span::styled("Search: ", Style::default().fg(colors::DIM)),
        Span::styled(query, Style::default().fg(colors::ACCENT)),
        Span::styled(
            format!("   {} results", state.search.results.len()),
            Style::default().fg(colors::DIM),
        ),
    ]));
    lines.push(Line::raw(""));

    if state.search.results.is_empty() {
        lines.push(Line::raw("No matching resources."));
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Likely causes: nothing loaded yet, wrong subscription, or a filter that excludes everything.",
            Style::default().fg(colors::DIM),
        )));
    }

    let viewport = area.height.saturating_sub(2) as usize;
    let selected = state.search.selected;
    let offset = if selected >= viewport { selected + 1 - viewport } else { 0 };

    for (i, result) in state.search.results.iter().enumerate().skip(offset).take(viewport) {
        let mut line = Line::from(vec![
            Span::styled(format!("{:>5} ", result.score), Style::default().fg(colors::DIM)),
            Span::raw(format!("{:<36} ", truncate(&result.resource_name, 36))),
            Span::styled(
                format!("{:<14} ", result.match_type.as_str()),
                Style::default().fg(colors::KEY),
            ),
            Span::styled(truncate(&result.match_text, 40), Style::default().fg(colors::DIM)),
        ]);
        if i == selected {
            line = line.style(Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD));
        }
        lines.push(line);
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

// === Overlays ===

/// Centered rect with the given percentage footprint
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Frameless overlay base: clear, tint, one title line. Returns the body.
fn overlay(frame: &mut Frame, area: Rect, title: &str) -> Rect {
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new("").style(Style::default().bg(colors::OVERLAY_BG)),
        area,
    );
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area.inner(ratatui::layout::Margin { horizontal: 2, vertical: 1 }));
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD),
        )))
        .style(Style::default().bg(colors::OVERLAY_BG)),
        chunks[0],
    );
    chunks[1]
}

fn render_search_overlay(state: &AppState, frame: &mut Frame) {
    let area = centered_rect(70, 40, frame.area());
    let body = overlay(frame, area, "Search  (name, type:vm, loc:eastus, rg:…, tag:k=v, * ?)");

    let mut lines = vec![Line::from(vec![
        Span::styled("/ ", Style::default().fg(colors::ACCENT)),
        Span::raw(state.search.input.clone()),
        Span::styled("▏", Style::default().fg(colors::ACCENT)),
    ])];
    lines.push(Line::raw(""));

    for (i, suggestion) in state.search.suggestions.iter().enumerate() {
        let style = if i == 0 {
            Style::default().fg(colors::KEY)
        } else {
            Style::default().fg(colors::DIM)
        };
        let hint = if i == 0 { "  (Tab)" } else { "" };
        lines.push(Line::from(Span::styled(format!("{}{}", suggestion, hint), style)));
    }

    if !state.search.history.is_empty() && state.search.input.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("Recent", Style::default().fg(colors::DIM))));
        for recent in state.search.history.iter().rev().take(5) {
            lines.push(Line::from(Span::styled(recent.clone(), Style::default().fg(colors::DIM))));
        }
    }

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(colors::OVERLAY_BG)),
        body,
    );
}

fn render_help_overlay(state: &AppState, frame: &mut Frame) {
    let area = centered_rect(70, 80, frame.area());
    let body = overlay(frame, area, "Help  (j/k scroll, ? or Esc to close)");

    let entries: &[(&str, &str)] = &[
        ("j/k ↑/↓", "move selection / scroll (focus-dependent)"),
        ("Space/Enter", "expand or collapse; open details on a resource"),
        ("Tab h/l ←/→", "switch focus between panes"),
        ("Esc", "close popup, else navigate back"),
        ("/", "search (free text + type:/loc:/rg:/tag:/name: filters)"),
        ("d", "subscription dashboard"),
        ("r / R", "refresh selection / reload everything"),
        ("s", "subscription switcher"),
        ("T", "terraform manager"),
        ("O", "DevOps browser"),
        (",", "settings"),
        ("a", "AI analysis of the selected resource (if configured)"),
        ("F2", "toggle compact layout"),
        ("q / Ctrl+C", "quit"),
        ("", ""),
        ("VM", "S:start K:stop B:restart C:ssh-check X:delete"),
        ("Storage", "C:containers B:blobs X:delete"),
        ("Key Vault", "V:secrets X:delete"),
        ("AKS", "P:pods S:start K:stop X:delete"),
        ("Container", "S:start K:stop B:restart L:logs X:delete"),
        ("", ""),
        ("", "Destructive actions fire on a single keypress; there is"),
        ("", "no second confirmation. They are ignored while another"),
        ("", "action is in progress."),
    ];

    let lines: Vec<Line> = entries
        .iter()
        .skip(state.help_scroll.min(entries.len().saturating_sub(1)))
        .map(|(keys, description)| {
            Line::from(vec![
                Span::styled(format!("{:<14}", keys), Style::default().fg(colors::KEY)),
                Span::raw(*description),
            ])
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(colors::OVERLAY_BG)),
        body,
    );
}

fn render_modal(state: &AppState, modal: &Modal, frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());
    match modal {
        Modal::Subscription(popup) => {
            let body = overlay(frame, area, "Subscriptions");
            let mut lines = Vec::new();
            if popup.loading {
                lines.push(Line::raw(format!(
                    "{} loading…",
                    SPINNER[state.spinner_frame % SPINNER.len()]
                )));
            }
            for (i, sub) in popup.items.iter().enumerate() {
                let marker = if state.current_subscription.as_ref().is_some_and(|c| c.id == sub.id) {
                    "●"
                } else {
                    " "
                };
                let mut line = Line::from(vec![
                    Span::styled(format!("{} ", marker), Style::default().fg(colors::ACCENT)),
                    Span::raw(sub.name.clone()),
                    Span::styled(format!("  {}", sub.id), Style::default().fg(colors::DIM)),
                ]);
                if i == popup.selected {
                    line = line.style(Style::default().bg(colors::SELECTED_BG));
                }
                lines.push(line);
            }
            frame.render_widget(
                Paragraph::new(lines).style(Style::default().bg(colors::OVERLAY_BG)),
                body,
            );
        }
        Modal::DevOps(popup) => {
            let body = overlay(frame, area, "DevOps");
            let mut lines = Vec::new();
            if popup.loading {
                lines.push(Line::raw(format!(
                    "{} loading…",
                    SPINNER[state.spinner_frame % SPINNER.len()]
                )));
            }
            match popup.mode {
                DevOpsMode::Menu => {
                    for (i, item) in DEVOPS_MENU.iter().enumerate() {
                        lines.push(menu_line(item, i == popup.menu_index));
                    }
                }
                DevOpsMode::Organizations => {
                    for (i, org) in popup.orgs.iter().enumerate() {
                        lines.push(menu_line(&org.name, i == popup.org_index));
                    }
                }
                DevOpsMode::Projects => {
                    for (i, project) in popup.projects.iter().enumerate() {
                        let label = match &project.description {
                            Some(d) => format!("{} — {}", project.name, d),
                            None => project.name.clone(),
                        };
                        lines.push(menu_line(&label, i == popup.project_index));
                    }
                }
                DevOpsMode::Pipelines => {
                    for (i, pipeline) in popup.pipelines.iter().enumerate() {
                        let label = format!(
                            "#{} {} {}",
                            pipeline.id,
                            pipeline.name,
                            pipeline.folder.as_deref().unwrap_or("")
                        );
                        lines.push(menu_line(&label, i == popup.pipeline_index));
                    }
                }
                DevOpsMode::Operations => {
                    let pipeline = popup.selected_pipeline().map(|p| p.name.clone()).unwrap_or_default();
                    let all = [
                        format!("Pipeline: {}", pipeline),
                        String::new(),
                        "az pipelines run --name <pipeline>".to_string(),
                        "az pipelines runs list --pipeline-ids <id>".to_string(),
                        "az pipelines show --name <pipeline>".to_string(),
                        String::new(),
                        "Runs are not triggered from here; copy the command".to_string(),
                        "into a shell to execute it.".to_string(),
                    ];
                    for text in all.iter().skip(popup.scroll.min(all.len().saturating_sub(1))) {
                        lines.push(Line::raw(text.clone()));
                    }
                }
            }
            frame.render_widget(
                Paragraph::new(lines).style(Style::default().bg(colors::OVERLAY_BG)),
                body,
            );
        }
        Modal::Terraform(popup) => {
            let body = overlay(frame, area, "Terraform");
            let mut lines = Vec::new();
            if let Some(folder) = &popup.selected_folder {
                lines.push(Line::from(Span::styled(
                    format!("folder: {}", folder.display()),
                    Style::default().fg(colors::DIM),
                )));
                lines.push(Line::raw(""));
            }
            if popup.loading {
                lines.push(Line::raw(format!(
                    "{} running…",
                    SPINNER[state.spinner_frame % SPINNER.len()]
                )));
            }
            match popup.mode {
                TerraformMode::Menu => {
                    for (i, item) in TERRAFORM_MENU.iter().enumerate() {
                        lines.push(menu_line(item, i == popup.menu_index));
                    }
                }
                TerraformMode::FolderSelect => {
                    if popup.folders.is_empty() {
                        lines.push(Line::raw("No folders with .tf files under the working directory."));
                    }
                    for (i, folder) in popup.folders.iter().enumerate() {
                        lines.push(menu_line(&folder.display().to_string(), i == popup.folder_index));
                    }
                }
                TerraformMode::Operations => {
                    for (i, op) in ToolOp::ALL.iter().enumerate() {
                        let label = if op.is_destructive() {
                            format!("{} (destructive)", op.label())
                        } else {
                            op.label().to_string()
                        };
                        lines.push(menu_line(&label, i == popup.op_index));
                    }
                    if let Some(input) = &popup.workspace_input {
                        lines.push(Line::raw(""));
                        lines.push(Line::from(vec![
                            Span::styled("workspace: ", Style::default().fg(colors::KEY)),
                            Span::raw(input.clone()),
                            Span::styled("▏", Style::default().fg(colors::ACCENT)),
                        ]));
                    }
                }
                TerraformMode::Analysis => {
                    if popup.analysis.is_empty() {
                        lines.push(Line::raw("No analysis yet - run an operation first."));
                    }
                    for text in popup.analysis.lines().skip(popup.scroll) {
                        lines.push(Line::raw(text.to_string()));
                    }
                }
                TerraformMode::Editor => {
                    lines.push(Line::raw("Template editing happens outside the TUI."));
                    lines.push(Line::raw("Open the selected folder in your editor of choice."));
                }
            }
            frame.render_widget(
                Paragraph::new(lines).style(Style::default().bg(colors::OVERLAY_BG)),
                body,
            );
        }
        Modal::Settings(popup) => {
            let body = overlay(frame, area, "Settings");
            let mut lines = Vec::new();
            match popup.mode {
                SettingsMode::Menu => {
                    for (i, item) in SETTINGS_MENU.iter().enumerate() {
                        lines.push(menu_line(item, i == popup.menu_index));
                    }
                }
                SettingsMode::Environment => {
                    let entries = [
                        "AZSCOPE_SUBSCRIPTION    subscription override",
                        "AZSCOPE_TENANT          tenant override",
                        "AZSCOPE_TIMEOUT_SECS    read deadline (max 15)",
                        "AZSCOPE_MUTATE_TIMEOUT_SECS  mutation deadline (max 15)",
                        "AZSCOPE_DEMO            serve demo data",
                        "AZSCOPE_AI_ENABLED      enable analysis provider",
                        "AZSCOPE_AI_ENDPOINT     provider base URL",
                        "AZSCOPE_AI_KEY          provider key (never shown)",
                        "AZSCOPE_AI_MODEL        provider model",
                        "AZSCOPE_AI_AUTO         analyze on details load",
                        "AZSCOPE_DEVOPS_ORG      DevOps organization",
                        "AZSCOPE_LOG             log level",
                    ];
                    for text in entries.iter().skip(popup.scroll.min(entries.len() - 1)) {
                        lines.push(Line::raw(*text));
                    }
                }
                SettingsMode::Keybindings => {
                    lines.push(Line::raw("Keybindings are fixed in this release."));
                    lines.push(Line::raw("See ? for the full reference."));
                }
            }
            frame.render_widget(
                Paragraph::new(lines).style(Style::default().bg(colors::OVERLAY_BG)),
                body,
            );
        }
    }
}

fn menu_line(text: &str, selected: bool) -> Line<'static> {
    let line = Line::from(Span::raw(text.to_string()));
    if selected {
        line.style(Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD))
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        let cut = truncate("ありがとうございました", 5);
        assert_eq!(cut.chars().count(), 5);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(60, 60, outer);
        assert!(inner.x >= outer.x && inner.y >= outer.y);
        assert!(inner.right() <= outer.right() && inner.bottom() <= outer.bottom());
    }

    #[test]
    fn test_contextual_shortcuts_for_vm() {
        let mut state = AppState::new();
        state.selected_resource = Some(crate::cloud::DemoCli::resources("rg-web-prod")[0].clone());
        let shortcuts = contextual_shortcuts(&state);
        assert!(shortcuts.contains("S:start"));
        assert!(shortcuts.contains("X:delete"));
    }

    #[test]
    fn test_contextual_shortcuts_default() {
        let state = AppState::new();
        assert!(contextual_shortcuts(&state).contains("/:search"));
    }
}
