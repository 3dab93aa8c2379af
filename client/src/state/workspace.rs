//! Editor shell state: project files, open tabs, activity bar, terminal.
//!
//! DESIGN
//! ======
//! Tabs keep the editor buffer and the last saved content; a tab is dirty
//! whenever the two differ, so typing back to the saved text clears the
//! flag. Backend calls go through `IdeService`. Their failures are logged
//! and printed to the terminal rather than returned, since the shell has
//! nowhere else to surface them.

use std::collections::BTreeMap;

use tracing::{error, info};

use crate::net::ide_service::IdeService;
use crate::state::terminal::{LineKind, Terminal};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("unknown file: {0}")]
    UnknownFile(String),
    #[error("file is not open: {0}")]
    NotOpen(String),
}

/// A file in the project tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub id: String,
    pub name: String,
    pub language: String,
    pub content: String,
}

impl ProjectFile {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let language = language_for(&name).to_owned();
        Self { id: id.into(), name, language, content: content.into() }
    }
}

/// Guess the editor language mode from a file name.
#[must_use]
pub fn language_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).as_deref() {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("ts" | "tsx") => "typescript",
        Some("js" | "jsx" | "mjs") => "javascript",
        Some("json") => "json",
        Some("md") => "markdown",
        Some("toml") => "toml",
        Some("html") => "html",
        Some("css") => "css",
        _ => "plaintext",
    }
}

/// An editor tab over one project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTab {
    pub file_id: String,
    pub title: String,
    pub content: String,
    saved_content: String,
}

impl OpenTab {
    fn from_file(file: &ProjectFile) -> Self {
        Self {
            file_id: file.id.clone(),
            title: file.name.clone(),
            content: file.content.clone(),
            saved_content: file.content.clone(),
        }
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.content != self.saved_content
    }
}

/// Activity bar entries; each opens a sidebar view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityView {
    #[default]
    Explorer,
    Search,
    SourceControl,
    Debug,
    Collaboration,
    Extensions,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    pub project_id: String,
    files: BTreeMap<String, ProjectFile>,
    tabs: Vec<OpenTab>,
    active: Option<String>,
    /// `None` when the sidebar is collapsed.
    activity: Option<ActivityView>,
    pub terminal: Terminal,
}

impl Workspace {
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            files: BTreeMap::new(),
            tabs: Vec::new(),
            active: None,
            activity: Some(ActivityView::default()),
            terminal: Terminal::new(),
        }
    }

    // =========================================================================
    // FILES
    // =========================================================================

    /// Add or replace a file in the project tree. Open tabs are untouched.
    pub fn add_file(&mut self, file: ProjectFile) {
        self.files.insert(file.id.clone(), file);
    }

    #[must_use]
    pub fn file(&self, file_id: &str) -> Option<&ProjectFile> {
        self.files.get(file_id)
    }

    /// Project files sorted by id.
    pub fn files(&self) -> impl Iterator<Item = &ProjectFile> {
        self.files.values()
    }

    // =========================================================================
    // TABS
    // =========================================================================

    /// Open a file in a tab and focus it. An already open file is only
    /// focused; its buffer is kept.
    pub fn open_file(&mut self, file: ProjectFile) {
        if !self.is_open(&file.id) {
            self.tabs.push(OpenTab::from_file(&file));
        }
        self.active = Some(file.id.clone());
        self.files.entry(file.id.clone()).or_insert(file);
    }

    /// Open a file already in the project tree.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::UnknownFile`] if no such file exists.
    pub fn open_by_id(&mut self, file_id: &str) -> Result<(), WorkspaceError> {
        let file = self
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| WorkspaceError::UnknownFile(file_id.to_owned()))?;
        self.open_file(file);
        Ok(())
    }

    /// Close a tab. If it was active, focus moves to the tab on its right,
    /// or the one on its left when it was last.
    pub fn close_tab(&mut self, file_id: &str) -> Option<OpenTab> {
        let idx = self.tabs.iter().position(|t| t.file_id == file_id)?;
        let closed = self.tabs.remove(idx);

        if self.active.as_deref() == Some(file_id) {
            let next = self.tabs.get(idx).or_else(|| idx.checked_sub(1).and_then(|i| self.tabs.get(i)));
            self.active = next.map(|t| t.file_id.clone());
        }
        Some(closed)
    }

    /// Focus an open tab.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotOpen`] if the file has no tab.
    pub fn set_active(&mut self, file_id: &str) -> Result<(), WorkspaceError> {
        if !self.is_open(file_id) {
            return Err(WorkspaceError::NotOpen(file_id.to_owned()));
        }
        self.active = Some(file_id.to_owned());
        Ok(())
    }

    /// Replace a tab's buffer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotOpen`] if the file has no tab.
    pub fn edit(&mut self, file_id: &str, content: impl Into<String>) -> Result<(), WorkspaceError> {
        let tab = self.tab_mut(file_id)?;
        tab.content = content.into();
        Ok(())
    }

    /// Record a tab's buffer as saved and sync it into the project tree.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::NotOpen`] if the file has no tab.
    pub fn mark_saved(&mut self, file_id: &str) -> Result<(), WorkspaceError> {
        let tab = self.tab_mut(file_id)?;
        tab.saved_content.clone_from(&tab.content);
        let content = tab.content.clone();
        if let Some(file) = self.files.get_mut(file_id) {
            file.content = content;
        }
        Ok(())
    }

    #[must_use]
    pub fn tabs(&self) -> &[OpenTab] {
        &self.tabs
    }

    #[must_use]
    pub fn tab(&self, file_id: &str) -> Option<&OpenTab> {
        self.tabs.iter().find(|t| t.file_id == file_id)
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<&OpenTab> {
        self.active.as_deref().and_then(|id| self.tab(id))
    }

    #[must_use]
    pub fn active_file_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    #[must_use]
    pub fn dirty_tabs(&self) -> Vec<&OpenTab> {
        self.tabs.iter().filter(|t| t.is_dirty()).collect()
    }

    #[must_use]
    pub fn is_open(&self, file_id: &str) -> bool {
        self.tabs.iter().any(|t| t.file_id == file_id)
    }

    fn tab_mut(&mut self, file_id: &str) -> Result<&mut OpenTab, WorkspaceError> {
        self.tabs
            .iter_mut()
            .find(|t| t.file_id == file_id)
            .ok_or_else(|| WorkspaceError::NotOpen(file_id.to_owned()))
    }

    // =========================================================================
    // ACTIVITY BAR
    // =========================================================================

    /// Select an activity view. Selecting the current one collapses the
    /// sidebar; selecting any view while collapsed reopens it.
    pub fn select_activity(&mut self, view: ActivityView) {
        self.activity = if self.activity == Some(view) { None } else { Some(view) };
    }

    #[must_use]
    pub fn activity(&self) -> Option<ActivityView> {
        self.activity
    }

    #[must_use]
    pub fn sidebar_open(&self) -> bool {
        self.activity.is_some()
    }

    // =========================================================================
    // BACKEND ACTIONS
    // =========================================================================

    /// Save the active tab through `service`. Returns whether it was saved.
    pub async fn save_active(&mut self, service: &dyn IdeService) -> bool {
        let Some(tab) = self.active_tab().cloned() else {
            self.terminal.error("no file is open");
            return false;
        };

        match service.save_file(&self.project_id, &tab.file_id, &tab.content).await {
            Ok(()) => {
                if let Err(e) = self.mark_saved(&tab.file_id) {
                    self.terminal.error(&e.to_string());
                    return false;
                }
                info!(project_id = %self.project_id, file_id = %tab.file_id, "workspace: saved file");
                self.terminal.status(&format!("saved {}", tab.title));
                true
            }
            Err(e) => {
                error!(project_id = %self.project_id, file_id = %tab.file_id, error = %e, "workspace: save failed");
                self.terminal.error(&format!("failed to save {}: {e}", tab.title));
                false
            }
        }
    }

    /// Run the project and print its output. Returns the exit code, or
    /// `None` if the run could not be started.
    pub async fn run_project(&mut self, service: &dyn IdeService) -> Option<i32> {
        self.terminal.status(&format!("$ run {}", self.project_id));

        match service.run_project(&self.project_id).await {
            Ok(output) => {
                self.terminal.print(LineKind::Output, &output.stdout);
                self.terminal.print(LineKind::Error, &output.stderr);
                self.terminal.status(&format!("exited with code {}", output.exit_code));
                info!(project_id = %self.project_id, exit_code = output.exit_code, "workspace: run finished");
                Some(output.exit_code)
            }
            Err(e) => {
                error!(project_id = %self.project_id, error = %e, "workspace: run failed");
                self.terminal.error(&format!("run failed: {e}"));
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;
