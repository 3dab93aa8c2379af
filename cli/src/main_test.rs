use super::*;
use protocol::{ChatPayload, ServerEvent, UserJoinPayload, UserLeavePayload};

fn join(id: &str, name: &str) -> ServerEvent {
    ServerEvent::UserJoin(UserJoinPayload {
        user_id: id.to_owned(),
        user_email: String::new(),
        user_name: name.to_owned(),
        color: String::new(),
    })
}

fn chat(name: &str, content: &str) -> ServerEvent {
    ServerEvent::Chat(ChatPayload {
        user_id: name.to_lowercase(),
        user_name: name.to_owned(),
        content: content.to_owned(),
        file_id: None,
        line_number: None,
        timestamp: 1,
    })
}

// =============================================================================
// parse_input
// =============================================================================

#[test]
fn plain_line_is_chat() {
    assert_eq!(parse_input("hello there"), Input::Chat("hello there".into()));
}

#[test]
fn blank_line_is_empty() {
    assert_eq!(parse_input("   "), Input::Empty);
    assert_eq!(parse_input(""), Input::Empty);
}

#[test]
fn cursor_command_parses_line_and_column() {
    assert_eq!(parse_input("/cursor 12 4"), Input::Cursor(CursorPosition::new(12, 4)));
}

#[test]
fn cursor_command_rejects_bad_numbers() {
    assert!(matches!(parse_input("/cursor x 4"), Input::Invalid(_)));
    assert!(matches!(parse_input("/cursor 1"), Input::Invalid(_)));
    assert!(matches!(parse_input("/cursor -1 2"), Input::Invalid(_)));
}

#[test]
fn select_command_parses_range() {
    assert_eq!(
        parse_input("/select 1 2 3 4"),
        Input::Selection(SelectionRange { start_line_number: 1, start_column: 2, end_line_number: 3, end_column: 4 })
    );
}

#[test]
fn file_command_sets_file() {
    assert_eq!(parse_input("/file src/main.rs"), Input::File("src/main.rs".into()));
    assert!(matches!(parse_input("/file"), Input::Invalid(_)));
}

#[test]
fn double_slash_escapes_chat() {
    assert_eq!(parse_input("//cursor 1 1"), Input::Chat("/cursor 1 1".into()));
}

#[test]
fn unknown_command_is_invalid() {
    assert_eq!(parse_input("/shrug"), Input::Invalid("unknown command: /shrug".into()));
}

// =============================================================================
// EventPrinter
// =============================================================================

#[test]
fn printer_reports_joins_and_leaves() {
    let mut state = SessionState::new();
    let mut printer = EventPrinter::default();

    state.apply(join("u1", "Ada"));
    assert_eq!(printer.changes(&state), vec!["+ Ada (u1) joined"]);

    state.apply(ServerEvent::UserLeave(UserLeavePayload { user_id: "u1".into() }));
    assert_eq!(printer.changes(&state), vec!["- Ada (u1) left"]);
}

#[test]
fn printer_prints_each_message_once() {
    let mut state = SessionState::new();
    let mut printer = EventPrinter::default();

    state.apply(chat("Ada", "hi"));
    assert_eq!(printer.changes(&state), vec!["[Ada] hi"]);
    assert!(printer.changes(&state).is_empty());

    state.apply(chat("Bob", "yo"));
    assert_eq!(printer.changes(&state), vec!["[Bob] yo"]);
}

#[test]
fn printer_reports_new_errors_once() {
    let mut state = SessionState::new();
    let mut printer = EventPrinter::default();

    state.apply(ServerEvent::error("E_RATE_LIMITED", "slow down"));
    assert_eq!(printer.changes(&state), vec!["! E_RATE_LIMITED: slow down"]);
    assert!(printer.changes(&state).is_empty());
}

#[test]
fn cursor_line_includes_file_when_present() {
    assert_eq!(format_cursor("u1", CursorPosition::new(3, 7), Some("main.rs")), "~ u1 at 3:7 in main.rs");
    assert_eq!(format_cursor("u1", CursorPosition::new(3, 7), None), "~ u1 at 3:7");
}
