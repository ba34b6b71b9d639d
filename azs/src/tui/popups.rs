//! Popup overlay state machines
//!
//! At most one modal popup is open at a time; Help coexists on top and
//! always wins Esc. Every popup follows the same contracts: Esc pops one
//! sub-mode level (closing at the top menu), content scroll is bounded and
//! resets on close, and each popup contributes a shortcut list to the
//! status bar while active.

use std::path::PathBuf;

use crate::cloud::{Organization, Pipeline, Project, Subscription, ToolOp};

/// The modal popups. Search is a mode of the main view, not a modal.
#[derive(Debug)]
pub enum Modal {
    Subscription(SubscriptionPopup),
    DevOps(DevOpsPopup),
    Terraform(TerraformPopup),
    Settings(SettingsPopup),
}

impl Modal {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Subscription(_) => "Subscriptions",
            Self::DevOps(_) => "DevOps",
            Self::Terraform(_) => "Terraform",
            Self::Settings(_) => "Settings",
        }
    }

    /// Esc pressed: pop one level. Returns true when the popup closes.
    pub fn esc(&mut self) -> bool {
        match self {
            Self::Subscription(_) => true,
            Self::DevOps(p) => p.esc(),
            Self::Terraform(p) => p.esc(),
            Self::Settings(p) => p.esc(),
        }
    }

    /// Status-bar shortcut list while this popup is active
    pub fn shortcuts(&self) -> String {
        match self {
            Self::Subscription(_) => "j/k:move Enter:switch Esc:close".to_string(),
            Self::DevOps(p) => p.shortcuts(),
            Self::Terraform(p) => p.shortcuts(),
            Self::Settings(_) => "j/k:move Enter:open Esc:back".to_string(),
        }
    }
}

// === Subscription ===

/// Flat list + select; no sub-modes
#[derive(Debug, Default)]
pub struct SubscriptionPopup {
    pub items: Vec<Subscription>,
    pub selected: usize,
    pub loading: bool,
}

impl SubscriptionPopup {
    pub fn new(items: Vec<Subscription>) -> Self {
        Self {
            items,
            selected: 0,
            loading: false,
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_subscription(&self) -> Option<&Subscription> {
        self.items.get(self.selected)
    }
}

// === DevOps ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevOpsMode {
    #[default]
    Menu,
    Organizations,
    Projects,
    Pipelines,
    /// Scrollable operations reference for the selected pipeline
    Operations,
}

pub const DEVOPS_MENU: &[&str] = &["Browse organizations"];

#[derive(Debug, Default)]
pub struct DevOpsPopup {
    pub mode: DevOpsMode,
    pub menu_index: usize,
    pub orgs: Vec<Organization>,
    pub org_index: usize,
    pub projects: Vec<Project>,
    pub project_index: usize,
    pub pipelines: Vec<Pipeline>,
    pub pipeline_index: usize,
    pub scroll: usize,
    pub loading: bool,
}

impl DevOpsPopup {
    pub fn new() -> Self {
        Self::default()
    }

    /// One level up; selection indices survive so returning to a parent
    /// mode lands where the user left it.
    pub fn esc(&mut self) -> bool {
        self.mode = match self.mode {
            DevOpsMode::Menu => return true,
            DevOpsMode::Organizations => DevOpsMode::Menu,
            DevOpsMode::Projects => DevOpsMode::Organizations,
            DevOpsMode::Pipelines => DevOpsMode::Projects,
            DevOpsMode::Operations => DevOpsMode::Pipelines,
        };
        self.scroll = 0;
        false
    }

    pub fn shortcuts(&self) -> String {
        match self.mode {
            DevOpsMode::Operations => "j/k:scroll Esc:back".to_string(),
            _ => "j/k:move Enter:open Esc:back".to_string(),
        }
    }

    pub fn selected_org(&self) -> Option<&Organization> {
        self.orgs.get(self.org_index)
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.projects.get(self.project_index)
    }

    pub fn selected_pipeline(&self) -> Option<&Pipeline> {
        self.pipelines.get(self.pipeline_index)
    }

    /// Length of the list the current mode navigates
    pub fn current_len(&self) -> usize {
        match self.mode {
            DevOpsMode::Menu => DEVOPS_MENU.len(),
            DevOpsMode::Organizations => self.orgs.len(),
            DevOpsMode::Projects => self.projects.len(),
            DevOpsMode::Pipelines => self.pipelines.len(),
            DevOpsMode::Operations => 0,
        }
    }

    pub fn current_index_mut(&mut self) -> &mut usize {
        match self.mode {
            DevOpsMode::Menu => &mut self.menu_index,
            DevOpsMode::Organizations => &mut self.org_index,
            DevOpsMode::Projects => &mut self.project_index,
            DevOpsMode::Pipelines => &mut self.pipeline_index,
            DevOpsMode::Operations => &mut self.scroll,
        }
    }

    pub fn select_next(&mut self) {
        let len = self.current_len();
        let idx = self.current_index_mut();
        if len > 0 && *idx + 1 < len {
            *idx += 1;
        } else if len == 0 {
            *idx += 1; // Operations mode scroll; bounded by the renderer
        }
    }

    pub fn select_prev(&mut self) {
        let idx = self.current_index_mut();
        *idx = idx.saturating_sub(1);
    }
}

// === Terraform (external-tool manager) ===

/// State machine: `menu -> folder-select -> {analysis | operations | editor}`.
/// Esc moves strictly one level up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerraformMode {
    #[default]
    Menu,
    FolderSelect,
    Analysis,
    Operations,
    Editor,
}

pub const TERRAFORM_MENU: &[&str] = &["Select working folder", "Analysis", "Operations", "Editor"];

#[derive(Debug, Default)]
pub struct TerraformPopup {
    pub mode: TerraformMode,
    pub menu_index: usize,
    pub folders: Vec<PathBuf>,
    pub folder_index: usize,
    pub selected_folder: Option<PathBuf>,
    /// Output of the last tool run, shown in Analysis
    pub analysis: String,
    pub op_index: usize,
    /// Inline prompt buffer for ops taking an operand (workspace select);
    /// Some while the user is typing the name
    pub workspace_input: Option<String>,
    pub scroll: usize,
    pub loading: bool,
}

impl TerraformPopup {
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self {
            folders,
            ..Self::default()
        }
    }

    pub fn esc(&mut self) -> bool {
        // An open operand prompt is its own level
        if self.workspace_input.take().is_some() {
            return false;
        }
        self.mode = match self.mode {
            TerraformMode::Menu => return true,
            TerraformMode::FolderSelect => TerraformMode::Menu,
            TerraformMode::Analysis | TerraformMode::Operations | TerraformMode::Editor => TerraformMode::FolderSelect,
        };
        self.scroll = 0;
        false
    }

    pub fn shortcuts(&self) -> String {
        if self.workspace_input.is_some() {
            return "type name Enter:select Esc:cancel".to_string();
        }
        match self.mode {
            TerraformMode::Analysis => "j/k:scroll Esc:back".to_string(),
            TerraformMode::Operations => "j/k:move Enter:run Esc:back".to_string(),
            _ => "j/k:move Enter:select Esc:back".to_string(),
        }
    }

    pub fn selected_op(&self) -> Option<ToolOp> {
        ToolOp::ALL.get(self.op_index).copied()
    }

    pub fn current_len(&self) -> usize {
        match self.mode {
            TerraformMode::Menu => TERRAFORM_MENU.len(),
            TerraformMode::FolderSelect => self.folders.len(),
            TerraformMode::Operations => ToolOp::ALL.len(),
            TerraformMode::Analysis | TerraformMode::Editor => 0,
        }
    }

    pub fn select_next(&mut self) {
        match self.mode {
            TerraformMode::Analysis | TerraformMode::Editor => self.scroll += 1,
            _ => {
                let len = self.current_len();
                let idx = match self.mode {
                    TerraformMode::Menu => &mut self.menu_index,
                    TerraformMode::FolderSelect => &mut self.folder_index,
                    TerraformMode::Operations => &mut self.op_index,
                    _ => unreachable!(),
                };
                if len > 0 && *idx + 1 < len {
                    *idx += 1;
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.mode {
            TerraformMode::Analysis | TerraformMode::Editor => self.scroll = self.scroll.saturating_sub(1),
            TerraformMode::Menu => self.menu_index = self.menu_index.saturating_sub(1),
            TerraformMode::FolderSelect => self.folder_index = self.folder_index.saturating_sub(1),
            TerraformMode::Operations => self.op_index = self.op_index.saturating_sub(1),
        }
    }
}

// === Settings ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsMode {
    #[default]
    Menu,
    Environment,
    Keybindings,
}

pub const SETTINGS_MENU: &[&str] = &["Environment", "Keybindings"];

#[derive(Debug, Default)]
pub struct SettingsPopup {
    pub mode: SettingsMode,
    pub menu_index: usize,
    pub scroll: usize,
}

impl SettingsPopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn esc(&mut self) -> bool {
        match self.mode {
            SettingsMode::Menu => true,
            _ => {
                self.mode = SettingsMode::Menu;
                self.scroll = 0;
                false
            }
        }
    }

    pub fn select_next(&mut self) {
        match self.mode {
            SettingsMode::Menu => {
                if self.menu_index + 1 < SETTINGS_MENU.len() {
                    self.menu_index += 1;
                }
            }
            _ => self.scroll += 1,
        }
    }

    pub fn select_prev(&mut self) {
        match self.mode {
            SettingsMode::Menu => self.menu_index = self.menu_index.saturating_sub(1),
            _ => self.scroll = self.scroll.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devops_esc_walks_one_level() {
        let mut p = DevOpsPopup::new();
        p.mode = DevOpsMode::Operations;
        assert!(!p.esc());
        assert_eq!(p.mode, DevOpsMode::Pipelines);
        assert!(!p.esc());
        assert_eq!(p.mode, DevOpsMode::Projects);
        assert!(!p.esc());
        assert_eq!(p.mode, DevOpsMode::Organizations);
        assert!(!p.esc());
        assert_eq!(p.mode, DevOpsMode::Menu);
        assert!(p.esc());
    }

    #[test]
    fn test_devops_indices_survive_mode_pop() {
        let mut p = DevOpsPopup::new();
        p.orgs = vec![
            Organization {
                name: "a".to_string(),
                url: None,
            },
            Organization {
                name: "b".to_string(),
                url: None,
            },
        ];
        p.mode = DevOpsMode::Organizations;
        p.select_next();
        assert_eq!(p.org_index, 1);

        p.mode = DevOpsMode::Projects;
        assert!(!p.esc());
        assert_eq!(p.org_index, 1);
    }

    #[test]
    fn test_terraform_esc_is_strictly_one_level() {
        let mut p = TerraformPopup::new(vec![]);
        p.mode = TerraformMode::Analysis;
        assert!(!p.esc());
        assert_eq!(p.mode, TerraformMode::FolderSelect);
        assert!(!p.esc());
        assert_eq!(p.mode, TerraformMode::Menu);
        assert!(p.esc());
    }

    #[test]
    fn test_terraform_esc_cancels_workspace_prompt_first() {
        let mut p = TerraformPopup::new(vec![]);
        p.mode = TerraformMode::Operations;
        p.workspace_input = Some("staging".to_string());

        assert!(!p.esc());
        assert!(p.workspace_input.is_none());
        assert_eq!(p.mode, TerraformMode::Operations);

        assert!(!p.esc());
        assert_eq!(p.mode, TerraformMode::FolderSelect);
    }

    #[test]
    fn test_terraform_folder_selection_preserved() {
        let mut p = TerraformPopup::new(vec![PathBuf::from("a"), PathBuf::from("b")]);
        p.mode = TerraformMode::FolderSelect;
        p.select_next();
        assert_eq!(p.folder_index, 1);
        p.mode = TerraformMode::Operations;
        assert!(!p.esc());
        assert_eq!(p.folder_index, 1);
    }

    #[test]
    fn test_subscription_selection_bounds() {
        let mut p = SubscriptionPopup::new(vec![]);
        p.select_next();
        p.select_prev();
        assert!(p.selected_subscription().is_none());
    }

    #[test]
    fn test_settings_esc() {
        let mut p = SettingsPopup::new();
        p.mode = SettingsMode::Keybindings;
        assert!(!p.esc());
        assert_eq!(p.mode, SettingsMode::Menu);
        assert!(p.esc());
    }
}
