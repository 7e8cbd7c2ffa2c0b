//! The capability registry: the write-once knowledge base of operations the
//! remote query translation layer is known to support.
//!
//! Three kinds of facts live here:
//!
//! - **Canonical functions**, keyed by name. An entry either carries full
//!   signature rows (invoking shape, return type, argument list) or is a
//!   *stub*, meaning the name alone counts as evidence of support.
//! - **Query operators**: the structural operators (filter, project, join,
//!   aggregate, ordering, set operators) that route the classifier down the
//!   navigation-property validation path instead of the leaf-call path.
//! - **Host types**: types whose entire static surface is presumed
//!   translatable, so member calls on them are never flagged.
//!
//! Signature rows are recorded but deliberately not validated against call
//! sites: a non-stub entry still answers "supported" on a bare name match.
//! False negatives are preferred over false positives for operations whose
//! exact overload set is unverified.
//!
//! The registry is built once behind a `OnceLock` and is immutable (and
//! therefore freely shared across threads) afterwards.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodEntry {
    pub name: &'static str,
    pub signatures: Vec<Signature>,
    pub is_stub: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub return_type: &'static str,
    pub args: Vec<Argument>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    pub name: &'static str,
    pub allowed_types: Vec<&'static str>,
}

pub struct Registry {
    methods: HashMap<&'static str, MethodEntry>,
    operators: HashSet<&'static str>,
    host_types: HashSet<&'static str>,
}

/// Attributes that mark a user-declared method as a server-side function.
/// Membership is checked against declarations by the resolver, not against
/// these tables.
pub const SERVER_FUNCTION_ATTRIBUTES: &[&str] = &["DbFunction", "EdmFunction"];

impl Registry {
    /// The process-wide registry instance.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    /// Name-only check for a call with no receiver in scope.
    pub fn is_known_static_call(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Check for an instance call. Falls back to a bare name match when the
    /// entry is a stub, and currently also when it is not (see module docs).
    pub fn is_known_instance_call(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Structural query operator (`Where`, `Select`, `OrderBy`, ...) rather
    /// than a leaf value operation.
    pub fn is_query_operator(&self, name: &str) -> bool {
        self.operators.contains(name)
    }

    /// A type whose entire static surface is presumed translatable.
    pub fn is_host_type(&self, name: &str) -> bool {
        self.host_types.contains(name)
    }

    /// Whether the given attribute name marks a server-side function. The
    /// conventional `...Attribute` suffix is accepted.
    pub fn is_server_function_attribute(name: &str) -> bool {
        let name = name.strip_suffix("Attribute").unwrap_or(name);
        SERVER_FUNCTION_ATTRIBUTES.contains(&name)
    }

    /// The registered entry for a name, if any.
    pub fn entry(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.get(name)
    }

    fn build() -> Registry {
        let mut methods = HashMap::new();

        // Aggregates carry per-numeric-type overload rows.
        per_type_entry(&mut methods, "Avg", NUMERIC, "expression", Ret::SameAsArg);
        single_entry(&mut methods, "BigCount", "Int64", "expression", "Object");
        single_entry(&mut methods, "Count", "Int32", "expression", "Object");
        per_type_entry(&mut methods, "Max", ORDERED, "expression", Ret::SameAsArg);
        per_type_entry(&mut methods, "Min", ORDERED, "expression", Ret::SameAsArg);
        per_type_entry(&mut methods, "StDev", NUMERIC, "expression", Ret::Fixed("Double"));
        per_type_entry(&mut methods, "StDevP", NUMERIC, "expression", Ret::Fixed("Double"));
        per_type_entry(&mut methods, "Sum", NUMERIC, "expression", Ret::Fixed("Double"));
        per_type_entry(&mut methods, "Var", NUMERIC, "expression", Ret::Fixed("Double"));
        per_type_entry(&mut methods, "VarP", NUMERIC, "expression", Ret::Fixed("Double"));

        // Math.
        per_type_entry(&mut methods, "Abs", SIGNED, "value", Ret::SameAsArg);
        per_type_entry(&mut methods, "Ceiling", FRACTIONAL, "value", Ret::SameAsArg);
        per_type_entry(&mut methods, "Floor", FRACTIONAL, "value", Ret::SameAsArg);
        per_type_entry(&mut methods, "Power", FRACTIONAL, "value", Ret::SameAsArg);

        // Everything below is registered name-only: the overload surfaces
        // are wide or legacy-documented, so stubs keep detection name-based.
        for &name in STRING_STUBS
            .iter()
            .chain(MATH_STUBS)
            .chain(DATE_TIME_STUBS)
            .chain(BITWISE_STUBS)
            .chain(SPATIAL_STUBS)
            .chain(MISC_STUBS)
            .chain(QUERY_OPERATORS)
        {
            methods.insert(
                name,
                MethodEntry {
                    name,
                    signatures: Vec::new(),
                    is_stub: true,
                },
            );
        }

        Registry {
            methods,
            operators: QUERY_OPERATORS.iter().copied().collect(),
            host_types: HOST_TYPES.iter().copied().collect(),
        }
    }
}

#[derive(Clone, Copy)]
enum Ret {
    SameAsArg,
    Fixed(&'static str),
}

fn per_type_entry(
    methods: &mut HashMap<&'static str, MethodEntry>,
    name: &'static str,
    types: &[&'static str],
    arg_name: &'static str,
    ret: Ret,
) {
    let signatures = types
        .iter()
        .map(|ty| Signature {
            return_type: match ret {
                Ret::SameAsArg => ty,
                Ret::Fixed(fixed) => fixed,
            },
            args: vec![Argument {
                name: arg_name,
                allowed_types: vec![ty],
            }],
        })
        .collect();
    methods.insert(
        name,
        MethodEntry {
            name,
            signatures,
            is_stub: false,
        },
    );
}

fn single_entry(
    methods: &mut HashMap<&'static str, MethodEntry>,
    name: &'static str,
    return_type: &'static str,
    arg_name: &'static str,
    arg_type: &'static str,
) {
    methods.insert(
        name,
        MethodEntry {
            name,
            signatures: vec![Signature {
                return_type,
                args: vec![Argument {
                    name: arg_name,
                    allowed_types: vec![arg_type],
                }],
            }],
            is_stub: false,
        },
    );
}

const NUMERIC: &[&str] = &["Int32", "Int64", "Double", "Decimal"];

const ORDERED: &[&str] = &[
    "Byte",
    "Int16",
    "Int32",
    "Int64",
    "Single",
    "Double",
    "Decimal",
    "DateTime",
    "DateTimeOffset",
    "String",
];

const SIGNED: &[&str] = &[
    "Int16", "Int32", "Int64", "Double", "Decimal", "Byte", "Single",
];

const FRACTIONAL: &[&str] = &["Single", "Double", "Decimal"];

const MATH_STUBS: &[&str] = &["Round", "Truncate"];

const STRING_STUBS: &[&str] = &[
    "Concat",
    "Contains",
    "EndsWith",
    "IndexOf",
    "Left",
    "Length",
    "LTrim",
    "Replace",
    "Reverse",
    "Right",
    "RTrim",
    "Substring",
    "StartsWith",
    "ToLower",
    "ToUpper",
    "Trim",
];

const DATE_TIME_STUBS: &[&str] = &[
    "AddNanoseconds",
    "AddMicroseconds",
    "AddMilliseconds",
    "AddSeconds",
    "AddMinutes",
    "AddHours",
    "AddDays",
    "AddMonths",
    "AddYears",
    "CreateDateTime",
    "CreateDateTimeOffset",
    "CreateTime",
    "CurrentDateTime",
    "CurrentDateTimeOffset",
    "CurrentUtcDateTime",
    "Day",
    "DayOfYear",
    "DiffNanoseconds",
    "DiffMicroseconds",
    "DiffMilliseconds",
    "DiffSeconds",
    "DiffMinutes",
    "DiffHours",
    "DiffDays",
    "DiffMonths",
    "DiffYears",
    "GetTotalOffsetMinutes",
    "Hour",
    "Millisecond",
    "Minute",
    "Month",
    "Second",
    "TruncateTime",
    "Year",
];

const BITWISE_STUBS: &[&str] = &["BitWiseAnd", "BitWiseNot", "BitWiseOr", "BitWiseXor"];

const SPATIAL_STUBS: &[&str] = &[
    "Area",
    "AsBinary",
    "AsGml",
    "AsText",
    "Centroid",
    "CoordinateSystemId",
    "Distance",
    "Elevation",
    "EndPoint",
    "ExteriorRing",
    "GeographyCollectionFromBinary",
    "GeographyCollectionFromText",
    "GeographyFromBinary",
    "GeographyFromGml",
    "GeographyFromText",
    "GeographyLineFromBinary",
    "GeographyLineFromText",
    "GeographyMultiLineFromBinary",
    "GeographyMultiLineFromText",
    "GeographyMultiPointFromBinary",
    "GeographyMultiPointFromText",
    "GeographyMultiPolygonFromBinary",
    "GeographyMultiPolygonFromText",
    "GeographyPointFromBinary",
    "GeographyPointFromText",
    "GeographyPolygonFromBinary",
    "GeographyPolygonFromText",
    "GeometryCollectionFromBinary",
    "GeometryCollectionFromText",
    "GeometryFromBinary",
    "GeometryFromGml",
    "GeometryFromText",
    "GeometryLineFromBinary",
    "GeometryLineFromText",
    "GeometryMultiLineFromBinary",
    "GeometryMultiLineFromText",
    "GeometryMultiPointFromBinary",
    "GeometryMultiPointFromText",
    "GeometryMultiPolygonFromBinary",
    "GeometryMultiPolygonFromText",
    "GeometryPointFromBinary",
    "GeometryPointFromText",
    "GeometryPolygonFromBinary",
    "GeometryPolygonFromText",
    "InteriorRingAt",
    "InteriorRingCount",
    "IsClosedSpatial",
    "IsEmptySpatial",
    "IsRing",
    "IsSimpleGeometry",
    "IsValidGeometry",
    "Latitude",
    "Longitude",
    "Measure",
    "PointAt",
    "PointCount",
    "PointOnSurface",
    "SpatialBoundary",
    "SpatialBuffer",
    "SpatialContains",
    "SpatialConvexHull",
    "SpatialCrosses",
    "SpatialDifference",
    "SpatialDimension",
    "SpatialDisjoint",
    "SpatialElementAt",
    "SpatialElementCount",
    "SpatialEnvelope",
    "SpatialEquals",
    "SpatialIntersection",
    "SpatialIntersects",
    "SpatialLength",
    "SpatialOverlaps",
    "SpatialRelate",
    "SpatialSymmetricDifference",
    "SpatialTouches",
    "SpatialTypeName",
    "SpatialUnion",
    "SpatialWithin",
    "StartPoint",
    "XCoordinate",
    "YCoordinate",
];

const MISC_STUBS: &[&str] = &["NewGuid"];

/// Structural query operators. Registered both here (for routing) and as
/// stub method entries (so bare-name checks accept them).
const QUERY_OPERATORS: &[&str] = &[
    "Where",
    "Select",
    "SelectMany",
    "GroupBy",
    "GroupJoin",
    "Join",
    "Aggregate",
    "OrderBy",
    "OrderByDescending",
    "ThenBy",
    "ThenByDescending",
    "Distinct",
    "Union",
    "Intersect",
    "Except",
    "Skip",
    "Take",
    "Any",
    "All",
    "LongCount",
    "Average",
    "First",
    "FirstOrDefault",
    "Single",
    "SingleOrDefault",
];

const HOST_TYPES: &[&str] = &[
    "DbFunctions",
    "EntityFunctions",
    "SqlFunctions",
    "DbGeography",
    "DbGeometry",
];
