//! Diagnostic code identifiers.
//!
//! Codes come in definite/potential pairs where the root-type resolution
//! confidence selects the half (and with it the fixed severity: the
//! definite half is an error, the potential half a warning). Codes without
//! a `_POTENTIAL` twin have a single fixed severity.

/// Info. A read-only entity property is computed in application code and
/// has no backing column. Emitted at the declaration site.
pub const COMPUTED_PROPERTY: &str = "EF_QUERY_COMPUTED_PROPERTY";

/// Error / Warning. A read-only property is referenced inside a query
/// predicate or projection.
pub const READONLY_USED: &str = "EF_QUERY_READONLY_USED";
pub const READONLY_USED_POTENTIAL: &str = "EF_QUERY_READONLY_USED_POTENTIAL";

/// Error / Warning. A static method call the translation layer does not
/// recognize.
pub const STATIC_CALL: &str = "EF_QUERY_STATIC_CALL";
pub const STATIC_CALL_POTENTIAL: &str = "EF_QUERY_STATIC_CALL_POTENTIAL";

/// Error / Warning. An instance method call the translation layer does not
/// recognize.
pub const INSTANCE_CALL: &str = "EF_QUERY_INSTANCE_CALL";
pub const INSTANCE_CALL_POTENTIAL: &str = "EF_QUERY_INSTANCE_CALL_POTENTIAL";

/// Error / Warning. A collection navigation property queried through a
/// delegate variable instead of an inline predicate.
pub const NAV_NOT_QUERYABLE: &str = "EF_QUERY_NAV_NOT_QUERYABLE";
pub const NAV_NOT_QUERYABLE_POTENTIAL: &str = "EF_QUERY_NAV_NOT_QUERYABLE_POTENTIAL";

/// Warning. A member name matches properties on more than one known entity
/// class and the receiver's static type cannot break the tie.
pub const NAV_AMBIGUOUS: &str = "EF_QUERY_NAV_AMBIGUOUS";

/// Error / Warning. An interpolated string inside a query expression.
pub const INTERPOLATED_STRING: &str = "EF_QUERY_INTERPOLATED_STRING";
pub const INTERPOLATED_STRING_POTENTIAL: &str = "EF_QUERY_INTERPOLATED_STRING_POTENTIAL";

/// Error / Warning. A property carrying the not-mapped marker attribute is
/// referenced inside a query expression.
pub const UNMAPPED_USED: &str = "EF_QUERY_UNMAPPED_USED";
pub const UNMAPPED_USED_POTENTIAL: &str = "EF_QUERY_UNMAPPED_USED_POTENTIAL";

/// Error / Warning. A mapped entity class is constructed inside a query
/// expression.
pub const ENTITY_NEW: &str = "EF_QUERY_ENTITY_NEW";
pub const ENTITY_NEW_POTENTIAL: &str = "EF_QUERY_ENTITY_NEW_POTENTIAL";

/// Error. A source file could not be parsed at all.
pub const PARSE_ERROR: &str = "EF_QUERY_PARSE_ERROR";
