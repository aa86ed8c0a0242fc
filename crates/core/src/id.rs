//! Strongly-typed identifiers for workflow engine entities.
//!
//! Each identifier is a [`domain_key::define_uuid!`] wrapper around a UUID,
//! parameterized by a unique domain marker so the compiler rejects mixing
//! e.g. a `NodeId` where an `ExecutionId` is expected. All types are `Copy`,
//! serialize as plain UUID strings, and support `v4()`/`parse`/`Display`.

use domain_key::define_uuid;

define_uuid!(pub WorkflowIdDomain => WorkflowId);
define_uuid!(pub NodeIdDomain => NodeId);
define_uuid!(pub ConnectionIdDomain => ConnectionId);
define_uuid!(pub ExecutionIdDomain => ExecutionId);
define_uuid!(pub NodeExecutionIdDomain => NodeExecutionId);
define_uuid!(pub LogEntryIdDomain => LogEntryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_but_share_generation() {
        let w = WorkflowId::v4();
        let n = NodeId::v4();
        assert_ne!(w.to_string(), n.to_string());
        assert!(!w.is_nil());
    }

    #[test]
    fn parse_roundtrip() {
        let id = ExecutionId::v4();
        let parsed = ExecutionId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn nil_id() {
        assert!(NodeId::nil().is_nil());
    }
}
