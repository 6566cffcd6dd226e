// Integration tests for structured logging of context operations
// Runs in its own binary: the capture layer is the global subscriber

use frolf_core::logging_facility::init_test_capture;
use frolf_core::{Course, Layout, Player};
use frolf_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE, FIELD_INSERTED,
};
use frolf_store::FrolfContext;

fn setup_context() -> FrolfContext {
    let mut ctx = FrolfContext::open_in_memory().unwrap();
    ctx.ensure_schema().unwrap();
    ctx
}

#[test]
fn test_save_emits_start_and_end() {
    // Given: Capture mode and a context with two pending inserts
    let capture = init_test_capture();
    let mut ctx = setup_context();
    ctx.track(Player::new("logged").unwrap()).unwrap();
    ctx.track(Course::new("Logged Course").unwrap()).unwrap();

    // When: The context is saved
    ctx.save().unwrap();

    // Then: Start and end events were emitted for the save
    capture.assert_event_exists("save", EVENT_START);
    capture.assert_event_exists("save", EVENT_END);
    capture.assert_event_exists("ensure_schema", EVENT_END);

    // And: The end event reports the inserted rows
    let reported = capture.count_events(|e| {
        e.op.as_deref() == Some("save")
            && e.event.as_deref() == Some(EVENT_END)
            && e.field(FIELD_INSERTED) == Some("2")
    });
    assert!(reported >= 1);
}

#[test]
fn test_failed_save_emits_error_event() {
    // Given: A stored course that a stored layout still references
    let capture = init_test_capture();
    let mut ctx = setup_context();
    let course = ctx.track(Course::new("Referenced").unwrap()).unwrap();
    ctx.track(Layout::new(course, "Only").unwrap()).unwrap();
    ctx.save().unwrap();

    // When: The course alone is removed and saved
    ctx.remove(course).unwrap();
    assert!(ctx.save().is_err());

    // Then: An error event with the persistence code was emitted
    let errors = capture.count_events(|e| {
        e.op.as_deref() == Some("save")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field(FIELD_ERR_CODE) == Some("ERR_PERSISTENCE")
    });
    assert!(errors >= 1);
}

#[test]
fn test_failed_schema_emits_error_event() {
    // Given: A store that refuses writes
    let capture = init_test_capture();
    let mut ctx = FrolfContext::open_in_memory().unwrap();
    ctx.connection()
        .pragma_update(None, "query_only", true)
        .unwrap();

    // When: The schema is ensured
    assert!(ctx.ensure_schema().is_err());

    // Then: The error event carries the schema code
    let errors = capture.count_events(|e| {
        e.op.as_deref() == Some("ensure_schema")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field(FIELD_ERR_CODE) == Some("ERR_SCHEMA")
    });
    assert!(errors >= 1);
}
