use super::*;

#[test]
fn script_line_parses_event() {
    let event = parse_script_line(1, r#"{ "type": "pointer_down", "x": 10, "y": 20 }"#).unwrap();
    assert_eq!(event, Some(InputEvent::PointerDown { x: 10.0, y: 20.0 }));
}

#[test]
fn blank_and_comment_lines_are_skipped() {
    assert!(parse_script_line(1, "   ").unwrap().is_none());
    assert!(parse_script_line(2, "# draw a sticker").unwrap().is_none());
}

#[test]
fn bad_line_reports_line_number() {
    let err = parse_script_line(7, r#"{ "type": "scroll" }"#).unwrap_err();
    assert!(matches!(err, CliError::ScriptEvent { line: 7, .. }));
    assert!(err.to_string().contains("line 7"));
}

#[test]
fn cli_parses_replay() {
    let cli = Cli::try_parse_from(["stickerboard", "--offline", "--role", "viewer", "replay", "b1", "--script", "s.jsonl"])
        .unwrap();
    assert!(cli.offline);
    assert_eq!(cli.role, BoardRole::Viewer);
    assert_eq!(cli.command.board_id(), "b1");
    assert!(matches!(cli.command, Command::Replay { ref script, .. } if script == "s.jsonl"));
}

#[test]
fn cli_role_defaults_to_creator() {
    let cli = Cli::try_parse_from(["stickerboard", "show", "b1"]).unwrap();
    assert_eq!(cli.role, BoardRole::Creator);
    assert!(!cli.stream_motion);
}

#[test]
fn cli_rejects_unknown_role() {
    assert!(Cli::try_parse_from(["stickerboard", "--role", "admin", "show", "b1"]).is_err());
}
