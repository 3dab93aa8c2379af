//! Debug panel view-model: breakpoints and session status.
//!
//! The panel does not speak a debugger protocol. Starting a session is one
//! `IdeService` call; continue/step/pause/stop are local transitions over
//! the returned frames.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{error, info};

use crate::net::ide_service::{Breakpoint, IdeService, IdeServiceError, StackFrame, Variable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebugStatus {
    #[default]
    Idle,
    Starting,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum DebugError {
    #[error("cannot {action} while {from:?}")]
    InvalidTransition { from: DebugStatus, action: &'static str },
    #[error("failed to start debug session: {0}")]
    Service(#[from] IdeServiceError),
}

#[derive(Debug, Clone, Default)]
pub struct DebugPanel {
    breakpoints: BTreeMap<String, BTreeSet<u32>>,
    status: DebugStatus,
    session_id: Option<String>,
    paused_at: Option<Breakpoint>,
    frames: Vec<StackFrame>,
    variables: Vec<Variable>,
}

impl DebugPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // BREAKPOINTS
    // =========================================================================

    /// Toggle a breakpoint. Returns true if the line now has one.
    pub fn toggle_breakpoint(&mut self, file_id: &str, line: u32) -> bool {
        let lines = self.breakpoints.entry(file_id.to_owned()).or_default();
        let set = if lines.remove(&line) {
            false
        } else {
            lines.insert(line);
            true
        };
        if lines.is_empty() {
            self.breakpoints.remove(file_id);
        }
        set
    }

    /// Sorted breakpoint lines for one file.
    #[must_use]
    pub fn breakpoints_in(&self, file_id: &str) -> Vec<u32> {
        self.breakpoints
            .get(file_id)
            .map(|lines| lines.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every breakpoint, ordered by file then line.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        self.breakpoints
            .iter()
            .flat_map(|(file_id, lines)| {
                lines.iter().map(move |&line| Breakpoint { file_id: file_id.clone(), line })
            })
            .collect()
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    #[must_use]
    pub fn status(&self) -> DebugStatus {
        self.status
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn paused_at(&self) -> Option<&Breakpoint> {
        self.paused_at.as_ref()
    }

    #[must_use]
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Launch a session with the current breakpoints.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::InvalidTransition`] unless idle or stopped, and
    /// [`DebugError::Service`] if the backend call fails (the panel is then
    /// back to idle).
    pub async fn start(&mut self, service: &dyn IdeService, project_id: &str) -> Result<(), DebugError> {
        if !matches!(self.status, DebugStatus::Idle | DebugStatus::Stopped) {
            return Err(self.invalid("start"));
        }
        self.reset_session();
        self.status = DebugStatus::Starting;

        let breakpoints = self.breakpoints();
        match service.start_debug_session(project_id, &breakpoints).await {
            Ok(session) => {
                self.status = if session.paused_at.is_some() { DebugStatus::Paused } else { DebugStatus::Running };
                info!(%project_id, session_id = %session.session_id, status = ?self.status, "debug: session started");
                self.session_id = Some(session.session_id);
                self.paused_at = session.paused_at;
                self.frames = session.frames;
                self.variables = session.variables;
                Ok(())
            }
            Err(e) => {
                error!(%project_id, error = %e, "debug: failed to start session");
                self.status = DebugStatus::Idle;
                Err(e.into())
            }
        }
    }

    /// Resume a paused session.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::InvalidTransition`] unless paused.
    pub fn continue_(&mut self) -> Result<(), DebugError> {
        if self.status != DebugStatus::Paused {
            return Err(self.invalid("continue"));
        }
        self.status = DebugStatus::Running;
        self.paused_at = None;
        self.variables.clear();
        Ok(())
    }

    /// Advance the paused location by one line.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::InvalidTransition`] unless paused.
    pub fn step_over(&mut self) -> Result<(), DebugError> {
        if self.status != DebugStatus::Paused {
            return Err(self.invalid("step over"));
        }
        if let Some(at) = self.paused_at.as_mut() {
            at.line = at.line.saturating_add(1);
        }
        if let Some(top) = self.frames.first_mut() {
            top.line = top.line.saturating_add(1);
        }
        Ok(())
    }

    /// Pause a running session at its top frame.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::InvalidTransition`] unless running.
    pub fn pause(&mut self) -> Result<(), DebugError> {
        if self.status != DebugStatus::Running {
            return Err(self.invalid("pause"));
        }
        self.status = DebugStatus::Paused;
        self.paused_at = self
            .frames
            .first()
            .map(|f| Breakpoint { file_id: f.file_id.clone(), line: f.line });
        Ok(())
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::InvalidTransition`] when there is no session.
    pub fn stop(&mut self) -> Result<(), DebugError> {
        if matches!(self.status, DebugStatus::Idle | DebugStatus::Stopped) {
            return Err(self.invalid("stop"));
        }
        self.reset_session();
        self.status = DebugStatus::Stopped;
        Ok(())
    }

    fn reset_session(&mut self) {
        self.session_id = None;
        self.paused_at = None;
        self.frames.clear();
        self.variables.clear();
    }

    fn invalid(&self, action: &'static str) -> DebugError {
        DebugError::InvalidTransition { from: self.status, action }
    }
}

#[cfg(test)]
#[path = "debug_test.rs"]
mod tests;
