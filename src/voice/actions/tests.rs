use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::error::{ErrorKind, VoxError};

fn counting_action(counter: &Arc<AtomicUsize>) -> Arc<dyn CommandAction> {
    let counter = Arc::clone(counter);
    Arc::new(move |_: &Parameters| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn test_pattern_extracts_single_parameter() {
    let pattern = CommandPattern::new("set volume to {level}").unwrap();

    assert!(pattern.matches("set volume to 42"));
    let params = pattern.extract_parameters("set volume to 42");
    assert_eq!(params.len(), 1);
    assert_eq!(params["level"], "42");
}

#[test]
fn test_pattern_is_case_insensitive_and_anchored() {
    let pattern = CommandPattern::new("open {app}").unwrap();

    assert!(pattern.matches("Open Camera"));
    assert_eq!(pattern.extract_parameters("OPEN camera")["app"], "camera");

    assert!(!pattern.matches("close app"));
    assert!(!pattern.matches("please open camera"));
    assert!(!pattern.matches("open camera now"));
    assert!(pattern.extract_parameters("close app").is_empty());
}

#[test]
fn test_pattern_reports_all_placeholders_in_order() {
    let pattern = CommandPattern::new("send {message} to {contact} at {time}").unwrap();
    assert_eq!(pattern.parameter_names(), ["message", "contact", "time"]);

    let params = pattern.extract_parameters("send hello to bob at noon");
    let keys: Vec<&str> = params.keys().map(String::as_str).collect();
    assert_eq!(keys, ["message", "contact", "time"]);
    assert_eq!(params["contact"], "bob");
}

#[test]
fn test_duplicate_placeholder_keeps_last_value() {
    let pattern = CommandPattern::new("{x} plus {x}").unwrap();
    assert_eq!(pattern.parameter_names(), ["x"]);

    let params = pattern.extract_parameters("two plus three");
    assert_eq!(params.len(), 1);
    assert_eq!(params["x"], "three");
}

#[test]
fn test_pattern_without_placeholders_is_exact_phrase() {
    let pattern = CommandPattern::new("stop listening").unwrap();

    assert!(pattern.matches("Stop Listening"));
    assert!(pattern.matches("  stop   listening "));
    assert!(!pattern.matches("stop listening please"));
    assert!(pattern.extract_parameters("stop listening").is_empty());
}

#[test]
fn test_pattern_literal_text_is_escaped() {
    let pattern = CommandPattern::new("what's 2+2?").unwrap();
    assert!(pattern.matches("What's 2+2?"));
    assert!(!pattern.matches("what's 22"));
}

#[test]
fn test_placeholder_captures_word_characters_only() {
    let pattern = CommandPattern::new("call {name}").unwrap();
    assert!(pattern.matches("call Zoë"));
    assert!(!pattern.matches("call mary jane"));
}

#[test]
fn test_declared_parameters_must_match_placeholders() {
    let names = vec!["contact".to_string(), "message".to_string()];
    assert!(CommandPattern::with_parameters("send {message} to {contact}", &names).is_ok());
    assert!(CommandPattern::with_parameters("send {message} to {contact}", &[]).is_ok());

    let err = CommandPattern::with_parameters("open {app}", &["application".to_string()])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPattern);
}

#[test]
fn test_empty_pattern_is_rejected() {
    assert!(matches!(
        CommandPattern::new("   "),
        Err(VoxError::InvalidPattern { .. })
    ));
}

#[test]
fn test_registry_first_match_wins_in_insertion_order() {
    let mut registry = CommandRegistry::new();
    let specific = Arc::new(AtomicUsize::new(0));
    let generic = Arc::new(AtomicUsize::new(0));

    registry
        .register("open camera", &[], counting_action(&specific))
        .unwrap();
    registry
        .register("open {app}", &[], counting_action(&generic))
        .unwrap();

    let resolution = registry.resolve("open camera").unwrap();
    assert_eq!(resolution.pattern, "open camera");
    assert!(resolution.parameters.is_empty());

    let resolution = registry.resolve("open maps").unwrap();
    assert_eq!(resolution.pattern, "open {app}");
    assert_eq!(resolution.parameters["app"], "maps");
}

#[test]
fn test_registry_no_match_returns_none() {
    let mut registry = CommandRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry
        .register("open {app}", &[], counting_action(&counter))
        .unwrap();

    assert!(registry.resolve("close app").is_none());
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_registry_reregister_replaces_action() {
    let mut registry = CommandRegistry::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    registry.register("lights on", &[], counting_action(&first)).unwrap();
    registry.register("lights on", &[], counting_action(&second)).unwrap();
    assert_eq!(registry.len(), 1);

    let resolution = registry.resolve("lights on").unwrap();
    resolution.action.invoke(&resolution.parameters);
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registry_resolve_is_idempotent() {
    let mut registry = CommandRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry
        .register("play {song}", &[], counting_action(&counter))
        .unwrap();

    let a = registry.resolve("play thunderstruck").unwrap();
    let b = registry.resolve("play thunderstruck").unwrap();
    assert!(Arc::ptr_eq(&a.action, &b.action));
    assert_eq!(a.parameters, b.parameters);
    // Resolving never invokes
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_registry_unregister_absent_is_noop() {
    let mut registry = CommandRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry.register("open {app}", &[], counting_action(&counter)).unwrap();
    registry.register("close {app}", &[], counting_action(&counter)).unwrap();

    assert!(!registry.unregister("never registered"));
    assert!(registry.unregister("open {app}"));
    assert_eq!(registry.patterns(), vec!["close {app}".to_string()]);
    assert!(registry.resolve("open maps").is_none());
}

#[test]
fn test_shared_registry_allows_registration_from_action() {
    let shared = SharedRegistry::new();
    let inner = shared.clone();
    let action: Arc<dyn CommandAction> = Arc::new(move |params: &Parameters| {
        // Registering while a resolved action runs must not deadlock
        let word = params.get("word").cloned().unwrap_or_default();
        let _ = inner.register(&format!("say {}", word), &[], Arc::new(|_: &Parameters| {}));
    });
    shared.register("learn {word}", &[], action).unwrap();

    let resolution = shared.resolve("learn hello").unwrap();
    resolution.action.invoke(&resolution.parameters);

    assert_eq!(
        shared.patterns(),
        vec!["learn {word}".to_string(), "say hello".to_string()]
    );
}
