use super::*;
use crate::net::ide_service::RunOutput;
use crate::net::mock_ide::MockIde;

fn file(id: &str) -> ProjectFile {
    ProjectFile::new(id, format!("{id}.rs"), format!("// {id}\n"))
}

fn workspace_with_tabs(ids: &[&str]) -> Workspace {
    let mut ws = Workspace::new("p1");
    for id in ids {
        ws.open_file(file(id));
    }
    ws
}

fn tab_ids(ws: &Workspace) -> Vec<&str> {
    ws.tabs().iter().map(|t| t.file_id.as_str()).collect()
}

// =============================================================
// Files and language
// =============================================================

#[test]
fn language_for_maps_common_extensions() {
    assert_eq!(language_for("main.rs"), "rust");
    assert_eq!(language_for("app.TSX"), "typescript");
    assert_eq!(language_for("script.py"), "python");
    assert_eq!(language_for("README"), "plaintext");
}

#[test]
fn open_by_id_requires_known_file() {
    let mut ws = Workspace::new("p1");
    assert_eq!(ws.open_by_id("nope"), Err(WorkspaceError::UnknownFile("nope".into())));

    ws.add_file(file("a"));
    ws.open_by_id("a").expect("known file");
    assert_eq!(ws.active_file_id(), Some("a"));
}

#[test]
fn files_lists_added_files_by_id() {
    let mut ws = Workspace::new("p1");
    ws.add_file(file("b"));
    ws.add_file(file("a"));
    ws.add_file(ProjectFile::new("a", "renamed.rs", ""));

    let names: Vec<&str> = ws.files().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["renamed.rs", "b.rs"]);
    assert!(ws.tabs().is_empty(), "adding files opens no tabs");
}

// =============================================================
// Tabs
// =============================================================

#[test]
fn open_file_appends_and_focuses() {
    let ws = workspace_with_tabs(&["a", "b"]);
    assert_eq!(tab_ids(&ws), vec!["a", "b"]);
    assert_eq!(ws.active_file_id(), Some("b"));
    assert!(ws.file("a").is_some());
}

#[test]
fn reopening_focuses_existing_tab_and_keeps_buffer() {
    let mut ws = workspace_with_tabs(&["a", "b"]);
    ws.edit("a", "changed").expect("open");

    ws.open_file(file("a"));
    assert_eq!(tab_ids(&ws), vec!["a", "b"]);
    assert_eq!(ws.active_file_id(), Some("a"));
    assert_eq!(ws.tab("a").expect("open").content, "changed");
}

#[test]
fn closing_active_tab_focuses_right_neighbour() {
    let mut ws = workspace_with_tabs(&["a", "b", "c"]);
    ws.set_active("b").expect("open");

    let closed = ws.close_tab("b").expect("was open");
    assert_eq!(closed.file_id, "b");
    assert_eq!(ws.active_file_id(), Some("c"));
}

#[test]
fn closing_last_active_tab_focuses_left_neighbour() {
    let mut ws = workspace_with_tabs(&["a", "b", "c"]);
    ws.close_tab("c");
    assert_eq!(ws.active_file_id(), Some("b"));
}

#[test]
fn closing_inactive_tab_keeps_focus() {
    let mut ws = workspace_with_tabs(&["a", "b", "c"]);
    ws.close_tab("a");
    assert_eq!(ws.active_file_id(), Some("c"));
    assert_eq!(tab_ids(&ws), vec!["b", "c"]);
}

#[test]
fn closing_only_tab_clears_focus() {
    let mut ws = workspace_with_tabs(&["a"]);
    ws.close_tab("a");
    assert!(ws.active_tab().is_none());
    assert!(ws.close_tab("a").is_none());
}

#[test]
fn set_active_requires_open_tab() {
    let mut ws = workspace_with_tabs(&["a"]);
    assert_eq!(ws.set_active("zzz"), Err(WorkspaceError::NotOpen("zzz".into())));
    assert_eq!(ws.active_file_id(), Some("a"));
}

// =============================================================
// Dirty tracking
// =============================================================

#[test]
fn edit_marks_dirty_until_saved() {
    let mut ws = workspace_with_tabs(&["a", "b"]);
    ws.edit("a", "fn main() {}").expect("open");
    assert_eq!(ws.dirty_tabs().len(), 1);
    assert!(ws.tab("a").expect("open").is_dirty());

    ws.mark_saved("a").expect("open");
    assert!(ws.dirty_tabs().is_empty());
    assert_eq!(ws.file("a").expect("known").content, "fn main() {}");
}

#[test]
fn editing_back_to_saved_content_is_clean() {
    let mut ws = workspace_with_tabs(&["a"]);
    ws.edit("a", "temp").expect("open");
    ws.edit("a", "// a\n").expect("open");
    assert!(ws.dirty_tabs().is_empty());
}

#[test]
fn edit_unknown_tab_errors() {
    let mut ws = Workspace::new("p1");
    assert_eq!(ws.edit("a", "x"), Err(WorkspaceError::NotOpen("a".into())));
    assert_eq!(ws.mark_saved("a"), Err(WorkspaceError::NotOpen("a".into())));
}

// =============================================================
// Activity bar
// =============================================================

#[test]
fn activity_defaults_to_explorer() {
    let ws = Workspace::new("p1");
    assert_eq!(ws.activity(), Some(ActivityView::Explorer));
    assert!(ws.sidebar_open());
}

#[test]
fn selecting_current_activity_collapses_sidebar() {
    let mut ws = Workspace::new("p1");
    ws.select_activity(ActivityView::Explorer);
    assert!(!ws.sidebar_open());

    ws.select_activity(ActivityView::Explorer);
    assert_eq!(ws.activity(), Some(ActivityView::Explorer));
}

#[test]
fn selecting_other_activity_switches_view() {
    let mut ws = Workspace::new("p1");
    ws.select_activity(ActivityView::Collaboration);
    assert_eq!(ws.activity(), Some(ActivityView::Collaboration));
    ws.select_activity(ActivityView::Debug);
    assert_eq!(ws.activity(), Some(ActivityView::Debug));
}

// =============================================================
// Backend actions
// =============================================================

#[tokio::test]
async fn save_active_saves_and_clears_dirty() {
    let ide = MockIde::default();
    let mut ws = workspace_with_tabs(&["a"]);
    ws.edit("a", "new body").expect("open");

    assert!(ws.save_active(&ide).await);
    assert!(ws.dirty_tabs().is_empty());
    assert_eq!(
        ide.saves.lock().expect("lock").clone(),
        vec![("p1".to_owned(), "a".to_owned(), "new body".to_owned())]
    );
    assert_eq!(ws.terminal.text(), vec!["saved a.rs"]);
}

#[tokio::test]
async fn save_failure_prints_error_and_stays_dirty() {
    let ide = MockIde::failing(500);
    let mut ws = workspace_with_tabs(&["a"]);
    ws.edit("a", "new body").expect("open");

    assert!(!ws.save_active(&ide).await);
    assert_eq!(ws.dirty_tabs().len(), 1);
    let last = ws.terminal.lines().last().expect("a line");
    assert_eq!(last.kind, LineKind::Error);
    assert!(last.text.starts_with("error: failed to save a.rs"), "{}", last.text);
}

#[tokio::test]
async fn save_without_open_tab_prints_error() {
    let mut ws = Workspace::new("p1");
    assert!(!ws.save_active(&MockIde::default()).await);
    assert_eq!(ws.terminal.text(), vec!["error: no file is open"]);
}

#[tokio::test]
async fn run_project_prints_output_and_exit_code() {
    let ide = MockIde {
        run_output: RunOutput { stdout: "hello\nworld\n".into(), stderr: "warn: x\n".into(), exit_code: 3 },
        ..MockIde::default()
    };
    let mut ws = Workspace::new("p1");

    assert_eq!(ws.run_project(&ide).await, Some(3));
    assert_eq!(ws.terminal.text(), vec!["$ run p1", "hello", "world", "warn: x", "exited with code 3"]);
    assert_eq!(ws.terminal.lines()[3].kind, LineKind::Error);
}

#[tokio::test]
async fn run_failure_prints_error() {
    let mut ws = Workspace::new("p1");
    assert_eq!(ws.run_project(&MockIde::failing(503)).await, None);
    assert_eq!(ws.terminal.text()[1], "error: run failed: server returned 503: mock failure");
}

#[test]
fn terminal_clear_empties_lines() {
    let mut ws = Workspace::new("p1");
    ws.terminal.status("one");
    ws.terminal.error("two");
    assert_eq!(ws.terminal.lines().len(), 2);
    ws.terminal.clear();
    assert!(ws.terminal.lines().is_empty());
}
