#![allow(missing_docs)]
use otp_entry_core::shape::delimited_parser;
use otp_entry_core::{
    CodeEngine, CodeOrigin, CodeShape, CompletionEvent, EngineEvent, FocusIntent, Key,
    SubmissionResult, ValidatorRule,
};
use pretty_assertions::assert_eq;

fn engine(cells: &[usize]) -> CodeEngine {
    CodeEngine::with_shape(cells.to_vec()).expect("valid shape")
}

fn digits() -> ValidatorRule {
    ValidatorRule::pattern("^[0-9]$").expect("valid pattern")
}

fn entered(events: &[EngineEvent]) -> Vec<&CompletionEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::CodeEntered(entered) => Some(entered),
            _ => None,
        })
        .collect()
}

fn submitted(events: &[EngineEvent]) -> Vec<&SubmissionResult> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Submitted(result) => Some(result),
            _ => None,
        })
        .collect()
}

#[test]
fn test_malformed_shape_fails_at_construction() {
    assert!(CodeEngine::with_shape([1, 0]).is_err());
    assert!(CodeEngine::with_shape(Vec::<usize>::new()).is_err());
}

#[test]
fn test_manual_entry_moves_focus_and_completes_once() {
    let mut engine = engine(&[1, 1, 1, 1]);
    let mut all_events = Vec::new();

    let focus: Vec<FocusIntent> = "4829"
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let outcome = engine.apply_character(Key::Char(c), i);
            all_events.extend(outcome.events);
            outcome.focus
        })
        .collect();

    assert_eq!(
        focus,
        vec![
            FocusIntent::Cell(1),
            FocusIntent::Cell(2),
            FocusIntent::Cell(3),
            FocusIntent::PastLast
        ]
    );
    assert_eq!(
        entered(&all_events),
        vec![&CompletionEvent {
            code: "4829".to_string(),
            origin: CodeOrigin::Manual,
        }]
    );
    assert_eq!(
        submitted(&all_events),
        vec![&SubmissionResult {
            is_valid: true,
            code: "4829".to_string(),
            origin: CodeOrigin::Manual,
        }]
    );
}

#[test]
fn test_manual_completion_without_auto_submit() {
    let mut engine = CodeEngine::builder(CodeShape::new([1, 1]).expect("valid shape"))
        .automatically_submit(false)
        .build();
    engine.apply_character(Key::Char('1'), 0);
    let outcome = engine.apply_character(Key::Char('2'), 1);

    assert_eq!(entered(&outcome.events).len(), 1);
    assert!(submitted(&outcome.events).is_empty());
}

#[test]
fn test_filling_last_cell_of_incomplete_code_does_not_complete() {
    let mut engine = engine(&[1, 1, 1]);
    engine.apply_character(Key::Char('1'), 0);
    let outcome = engine.apply_character(Key::Char('3'), 2);

    assert_eq!(outcome.focus, FocusIntent::PastLast);
    assert!(entered(&outcome.events).is_empty());
    assert!(submitted(&outcome.events).is_empty());
}

#[test]
fn test_rejected_character_is_absorbed() {
    let mut engine = CodeEngine::builder(CodeShape::new([1, 1]).expect("valid shape"))
        .validator(digits())
        .build();
    let outcome = engine.apply_character(Key::Char('x'), 0);

    assert_eq!(outcome.focus, FocusIntent::Stay);
    assert!(outcome.events.is_empty());
    assert_eq!(engine.state().cells(), ["", ""]);
}

#[test]
fn test_full_cell_is_replaced_not_appended() {
    let mut engine = engine(&[3, 1]);
    for c in "ABC".chars() {
        engine.apply_character(Key::Char(c), 0);
    }
    assert_eq!(engine.state().cell(0), Some("ABC"));

    let outcome = engine.apply_character(Key::Char('D'), 0);
    assert_eq!(engine.state().cell(0), Some("D"));
    assert_eq!(outcome.focus, FocusIntent::Stay);
}

#[test]
fn test_full_single_character_cell_is_replaced() {
    let mut engine = engine(&[1, 1]);
    engine.apply_character(Key::Char('1'), 0);
    let outcome = engine.apply_character(Key::Char('2'), 0);
    assert_eq!(engine.state().cell(0), Some("2"));
    assert_eq!(outcome.focus, FocusIntent::Cell(1));
}

#[test]
fn test_backspace_shrinks_and_moves_back_when_empty() {
    let mut engine = engine(&[2, 2]);
    engine.apply_character(Key::Char('1'), 0);
    engine.apply_character(Key::Char('2'), 0);
    engine.apply_character(Key::Char('3'), 1);

    let outcome = engine.apply_character(Key::Backspace, 1);
    assert_eq!(outcome.focus, FocusIntent::Cell(0));
    assert_eq!(engine.state().cells(), ["12", ""]);

    let outcome = engine.apply_character(Key::Backspace, 0);
    assert_eq!(outcome.focus, FocusIntent::Stay);
    assert_eq!(engine.state().cell(0), Some("1"));

    let outcome = engine.apply_character(Key::Backspace, 0);
    assert_eq!(outcome.focus, FocusIntent::BeforeFirst);
    assert_eq!(engine.state().cell(0), Some(""));

    // Backspace on an empty cell still asks for the previous cell but changes nothing.
    let outcome = engine.apply_character(Key::Backspace, 1);
    assert_eq!(outcome.focus, FocusIntent::Cell(0));
    assert!(outcome.events.is_empty());
}

#[test]
fn test_backspace_accepted_under_rejecting_rule() {
    let mut engine = CodeEngine::builder(CodeShape::new([2]).expect("valid shape"))
        .validator(ValidatorRule::predicate(|c| c == '1'))
        .value("11")
        .build();
    engine.apply_character(Key::Backspace, 0);
    assert_eq!(engine.code(), "1");
}

#[test]
fn test_char_transform_applies_before_storing() {
    let mut engine = CodeEngine::builder(CodeShape::new([3]).expect("valid shape"))
        .char_transform(|c| c.to_ascii_uppercase())
        .build();
    engine.apply_character(Key::Char('a'), 0);
    engine.apply_character(Key::Char('b'), 0);
    assert_eq!(engine.code(), "AB");
}

#[test]
fn test_out_of_range_index_is_ignored() {
    let mut engine = engine(&[1, 1]);
    let outcome = engine.apply_character(Key::Char('1'), 5);
    assert_eq!(outcome.focus, FocusIntent::Stay);
    assert!(outcome.events.is_empty());
    assert_eq!(engine.code(), "");
}

#[test]
fn test_bulk_text_replaces_state_and_submits() {
    let mut engine = engine(&[1, 1, 1, 1, 1, 1]);
    engine.apply_character(Key::Char('9'), 0);
    let events = engine.apply_bulk_text("482913");

    assert_eq!(engine.state().cells(), ["4", "8", "2", "9", "1", "3"]);
    assert_eq!(
        events,
        vec![
            EngineEvent::Changed {
                code: "482913".to_string(),
                cells: ["4", "8", "2", "9", "1", "3"].map(String::from).to_vec(),
            },
            EngineEvent::CodeEntered(CompletionEvent {
                code: "482913".to_string(),
                origin: CodeOrigin::PastedOrSms,
            }),
            EngineEvent::Submitted(SubmissionResult {
                is_valid: true,
                code: "482913".to_string(),
                origin: CodeOrigin::PastedOrSms,
            }),
        ]
    );
}

#[test]
fn test_invalid_bulk_text_leaves_state_untouched() {
    let mut engine = CodeEngine::builder(CodeShape::new([1, 1, 1, 1]).expect("valid shape"))
        .validator(digits())
        .value("12")
        .build();
    let before = engine.state().clone();

    assert!(engine.apply_bulk_text("12a4").is_empty());
    assert!(engine.apply_bulk_text("123").is_empty());
    assert!(engine.apply_bulk_text("").is_empty());
    assert_eq!(engine.state(), &before);
}

#[test]
fn test_bulk_text_longer_than_shape_is_truncated_by_default_splitter() {
    let mut engine = engine(&[1, 1]);
    let events = engine.apply_bulk_text("123");
    assert_eq!(engine.code(), "12");
    assert_eq!(entered(&events).len(), 1);
}

#[test]
fn test_custom_paste_parser() {
    let mut engine = CodeEngine::builder(CodeShape::new([3, 3]).expect("valid shape"))
        .paste_parser(delimited_parser("-"))
        .build();
    let events = engine.apply_bulk_text("ABC-XYZ");
    assert_eq!(engine.state().cells(), ["ABC", "XYZ"]);
    assert_eq!(entered(&events)[0].code, "ABCXYZ");

    // A parser producing the wrong number of cells is a mismatch.
    assert!(engine.apply_bulk_text("ABCXYZ").is_empty());
    assert_eq!(engine.code(), "ABCXYZ");
}

#[test]
fn test_code_is_split_by_position_even_with_paste_parser() {
    let mut engine = CodeEngine::builder(CodeShape::new([3, 3]).expect("valid shape"))
        .paste_parser(delimited_parser("-"))
        .build();
    let events = engine.apply_code("482913");
    assert_eq!(engine.state().cells(), ["482", "913"]);
    assert_eq!(entered(&events)[0].origin, CodeOrigin::PastedOrSms);

    let before = engine.state().clone();
    assert!(engine.apply_code("4829").is_empty());
    assert_eq!(engine.state(), &before);
}

#[test]
fn test_submit_reports_invalid_codes() {
    let engine = CodeEngine::builder(CodeShape::new([3, 3]).expect("valid shape"))
        .value("ABCX")
        .build();
    assert!(engine.is_ready());
    assert!(!engine.is_complete());

    let result = engine.submit(CodeOrigin::ExplicitSubmit);
    assert_eq!(
        result,
        SubmissionResult {
            is_valid: false,
            code: "ABCX".to_string(),
            origin: CodeOrigin::ExplicitSubmit,
        }
    );
}

#[test]
fn test_initial_value_is_validated_per_cell() {
    let engine = CodeEngine::builder(CodeShape::new([2, 2]).expect("valid shape"))
        .validator(digits())
        .value("1x34")
        .build();
    assert_eq!(engine.state().cells(), ["", "34"]);
}

#[test]
fn test_set_value_emits_change_only_when_different() {
    let mut engine = engine(&[2, 2]);
    let events = engine.set_value("1234");
    assert_eq!(events.len(), 1);
    assert!(entered(&events).is_empty());
    assert!(engine.set_value("1234").is_empty());
}

#[test]
fn test_origin_serialization() {
    let json = serde_json::to_string(&CodeOrigin::PastedOrSms).expect("serializes");
    assert_eq!(json, "\"pasted-or-sms\"");
    let json = serde_json::to_string(&CodeOrigin::ExplicitSubmit).expect("serializes");
    assert_eq!(json, "\"explicit-submit\"");
}
