//! Session keys.

/// Key under which the serialized `VisitorSession` is stored.
pub const VISITOR: &str = "visitor";
