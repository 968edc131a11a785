//! Message Tests
//!
//! Command names, validation helpers, and the tagged value types.

use cachette::protocol::{CommandKind, CommandMessage, Val, Value};
use cachette::CacheError;

// =============================================================================
// Command Names
// =============================================================================

#[test]
fn test_every_command_name_parses_back() {
    for kind in CommandKind::ALL {
        assert_eq!(kind.as_str().parse::<CommandKind>().unwrap(), kind);
    }
}

#[test]
fn test_wire_names_are_camel_case() {
    assert_eq!(CommandKind::GetAllKeys.as_str(), "getAllKeys");
    assert_eq!(CommandKind::ListGetRemFirst.as_str(), "listGetRemFirst");
    assert_eq!(CommandKind::ListSet.to_string(), "listSet");
}

#[test]
fn test_command_names_are_case_sensitive() {
    assert!(matches!(
        "GET".parse::<CommandKind>(),
        Err(CacheError::UnknownCommand(name)) if name == "GET"
    ));
}

// =============================================================================
// Validation Helpers
// =============================================================================

#[test]
fn test_require_key() {
    let with_key = CommandMessage::new("d", CommandKind::Get).with_key("k");
    assert_eq!(with_key.require_key().unwrap(), "k");

    let without = CommandMessage::new("d", CommandKind::Get);
    assert!(matches!(
        without.require_key(),
        Err(CacheError::MissingParameter("key"))
    ));

    let empty = CommandMessage::new("d", CommandKind::Get).with_key("");
    assert!(matches!(
        empty.require_key(),
        Err(CacheError::MissingParameter("key"))
    ));
}

#[test]
fn test_require_ttl() {
    let command = CommandMessage::new("d", CommandKind::Set).with_ttl(1.5);
    assert_eq!(command.require_ttl().unwrap(), 1.5);

    let mut missing = CommandMessage::new("d", CommandKind::Set);
    missing.ttl = None;
    assert!(matches!(
        missing.require_ttl(),
        Err(CacheError::MissingParameter("ttl"))
    ));

    let nan = CommandMessage::new("d", CommandKind::Set).with_ttl(f64::NAN);
    assert!(nan.require_ttl().is_err());
}

#[test]
fn test_require_val() {
    let command = CommandMessage::new("d", CommandKind::Set).with_val("v");
    assert_eq!(command.require_val().unwrap(), &Val::Scalar("v".to_string()));

    let missing = CommandMessage::new("d", CommandKind::Set);
    assert!(matches!(
        missing.require_val(),
        Err(CacheError::MissingParameter("val"))
    ));
}

#[test]
fn test_missing_parameter_message() {
    let err = CommandMessage::new("d", CommandKind::Get)
        .require_key()
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing parameter key");
}

// =============================================================================
// Tagged Values
// =============================================================================

#[test]
fn test_val_decodes_scalar_or_sequence() {
    let scalar: Val = serde_json::from_str(r#""x""#).unwrap();
    assert_eq!(scalar, Val::Scalar("x".to_string()));

    let seq: Val = serde_json::from_str(r#"["x","y"]"#).unwrap();
    assert_eq!(seq, Val::Sequence(vec!["x".to_string(), "y".to_string()]));

    assert!(serde_json::from_str::<Val>("42").is_err());
}

#[test]
fn test_val_into_items() {
    assert_eq!(Val::from("a").into_items(), vec!["a".to_string()]);
    assert_eq!(
        Val::from(vec!["a", "b"]).into_items(),
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn test_value_decodes_each_shape() {
    let cases = [
        ("null", Value::Null),
        ("true", Value::Bool(true)),
        ("12", Value::Int(12)),
        (r#""pong""#, Value::Str("pong".to_string())),
        (r#"["a"]"#, Value::Seq(vec!["a".to_string()])),
    ];

    for (json, expected) in cases {
        assert_eq!(serde_json::from_str::<Value>(json).unwrap(), expected);
    }
}

#[test]
fn test_value_display_is_json() {
    assert_eq!(Value::from("ACK").to_string(), r#""ACK""#);
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::Seq(vec!["a".into()]).to_string(), r#"["a"]"#);
}
