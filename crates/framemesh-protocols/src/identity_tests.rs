use super::*;

#[test]
fn test_context_id_display() {
    let ctx = ContextId::new("tab1", "frame2");
    assert_eq!(ctx.to_string(), "tab1:frame2");
}

#[test]
fn test_context_id_equality() {
    let a = ContextId::new("tab1", "frame1");
    let b = ContextId::new("tab1", "frame1");
    let c = ContextId::new("tab1", "frame2");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_context_id_no_key_collision() {
    // Concatenated keys would make these two ambiguous.
    let a = ContextId::new("tab1:frame", "1");
    let b = ContextId::new("tab1", "frame:1");
    assert_ne!(a, b);
}

#[test]
fn test_same_host() {
    let a = ContextId::new("tab1", "frame1");
    let b = ContextId::new("tab1", "frame9");
    let c = ContextId::new("tab2", "frame1");
    assert!(a.same_host(&b));
    assert!(!a.same_host(&c));
}

#[test]
fn test_context_id_serde_round_trip() {
    let ctx = ContextId::new("tab3", "frame7");
    let json = serde_json::to_string(&ctx).unwrap();
    let back: ContextId = serde_json::from_str(&json).unwrap();
    assert_eq!(ctx, back);
}

#[test]
fn test_role_as_str_and_display() {
    let role = Role::new("sorting");
    assert_eq!(role.as_str(), "sorting");
    assert_eq!(role.to_string(), "sorting");
}

#[test]
fn test_role_from_str() {
    let role: Role = "trigger".into();
    assert_eq!(role, Role::new("trigger"));
}

#[test]
fn test_role_serializes_transparent() {
    let role = Role::new("sorting");
    let json = serde_json::to_string(&role).unwrap();
    assert_eq!(json, "\"sorting\"");
}

#[test]
fn test_correlation_id_unique() {
    let a = CorrelationId::generate();
    let b = CorrelationId::generate();
    assert_ne!(a, b);
}

#[test]
fn test_correlation_id_format() {
    let id = CorrelationId::generate();
    assert!(id.as_str().starts_with("c_"));
    assert!(id.as_str().len() > 2);
}
