//! Type dump parsing and the type registry.
//!
//! The companion `types.json` written by `tsc --generateTrace` is an array
//! of type descriptors keyed by integer id. Relationship fields point at
//! other ids and may form cycles; that is expected, not an error.

use crate::utils::config::NOT_FOUND_TYPE_ID;
use crate::utils::error::{AnalysisError, ParseError};
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::slice;

/// The compiler's integer identifier for a type (`-1` means not found)
pub type TypeId = i64;

/// Type flag names as formatted by the compiler's debug helpers
///
/// Composite names (`Literal`, `StructuredType`, ...) show up in real dumps
/// because the formatter emits every enum member whose bits overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeFlag {
    Any,
    Unknown,
    String,
    Number,
    Boolean,
    Enum,
    BigInt,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    EnumLiteral,
    BigIntLiteral,
    #[serde(rename = "ESSymbol")]
    EsSymbol,
    #[serde(rename = "UniqueESSymbol")]
    UniqueEsSymbol,
    Void,
    Undefined,
    Null,
    Never,
    TypeParameter,
    Object,
    Union,
    Intersection,
    Index,
    IndexedAccess,
    Conditional,
    Substitution,
    NonPrimitive,
    TemplateLiteral,
    StringMapping,
    Reserved1,
    Reserved2,
    Reserved3,
    AnyOrUnknown,
    Nullable,
    Literal,
    Unit,
    Freshable,
    StringOrNumberLiteral,
    StringOrNumberLiteralOrUnique,
    DefinitelyFalsy,
    PossiblyFalsy,
    Intrinsic,
    StringLike,
    NumberLike,
    BigIntLike,
    BooleanLike,
    EnumLike,
    #[serde(rename = "ESSymbolLike")]
    EsSymbolLike,
    VoidLike,
    Primitive,
    DefinitelyNonNullable,
    DisjointDomains,
    UnionOrIntersection,
    StructuredType,
    TypeVariable,
    InstantiableNonPrimitive,
    InstantiablePrimitive,
    Instantiable,
    StructuredOrInstantiable,
    ObjectFlagsType,
    Simplifiable,
    Singleton,
    Narrowable,
    IncludesMask,
    IncludesMissingType,
    IncludesNonWideningType,
    IncludesWildcard,
    IncludesEmptyObject,
    IncludesInstantiable,
    IncludesConstrainedTypeVariable,
    IncludesError,
    NotPrimitiveUnion,
}

/// 1-based line/character position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChar {
    pub line: u32,
    pub character: u32,
}

/// A source range recorded in the type dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Location {
    pub path: String,
    pub start: LineChar,
    pub end: LineChar,
}

/// One relationship field of a type record, treated as a typed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    UnionTypes,
    IntersectionTypes,
    AliasType,
    AliasTypeArguments,
    KeyofType,
    IndexedAccessObjectType,
    IndexedAccessIndexType,
    InstantiatedType,
    TypeArguments,
    ConditionalCheckType,
    ConditionalExtendsType,
    ConditionalTrueType,
    ConditionalFalseType,
    SubstitutionBaseType,
    ConstraintType,
    ReverseMappedSourceType,
    ReverseMappedMappedType,
    ReverseMappedConstraintType,
    EvolvingArrayElementType,
    EvolvingArrayFinalType,
}

impl LinkKind {
    /// Every kind, in the order relations are visited
    pub const ALL: [LinkKind; 20] = [
        LinkKind::UnionTypes,
        LinkKind::IntersectionTypes,
        LinkKind::AliasType,
        LinkKind::AliasTypeArguments,
        LinkKind::KeyofType,
        LinkKind::IndexedAccessObjectType,
        LinkKind::IndexedAccessIndexType,
        LinkKind::InstantiatedType,
        LinkKind::TypeArguments,
        LinkKind::ConditionalCheckType,
        LinkKind::ConditionalExtendsType,
        LinkKind::ConditionalTrueType,
        LinkKind::ConditionalFalseType,
        LinkKind::SubstitutionBaseType,
        LinkKind::ConstraintType,
        LinkKind::ReverseMappedSourceType,
        LinkKind::ReverseMappedMappedType,
        LinkKind::ReverseMappedConstraintType,
        LinkKind::EvolvingArrayElementType,
        LinkKind::EvolvingArrayFinalType,
    ];

    /// Field name as it appears in the type dump
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::UnionTypes => "unionTypes",
            LinkKind::IntersectionTypes => "intersectionTypes",
            LinkKind::AliasType => "aliasType",
            LinkKind::AliasTypeArguments => "aliasTypeArguments",
            LinkKind::KeyofType => "keyofType",
            LinkKind::IndexedAccessObjectType => "indexedAccessObjectType",
            LinkKind::IndexedAccessIndexType => "indexedAccessIndexType",
            LinkKind::InstantiatedType => "instantiatedType",
            LinkKind::TypeArguments => "typeArguments",
            LinkKind::ConditionalCheckType => "conditionalCheckType",
            LinkKind::ConditionalExtendsType => "conditionalExtendsType",
            LinkKind::ConditionalTrueType => "conditionalTrueType",
            LinkKind::ConditionalFalseType => "conditionalFalseType",
            LinkKind::SubstitutionBaseType => "substitutionBaseType",
            LinkKind::ConstraintType => "constraintType",
            LinkKind::ReverseMappedSourceType => "reverseMappedSourceType",
            LinkKind::ReverseMappedMappedType => "reverseMappedMappedType",
            LinkKind::ReverseMappedConstraintType => "reverseMappedConstraintType",
            LinkKind::EvolvingArrayElementType => "evolvingArrayElementType",
            LinkKind::EvolvingArrayFinalType => "evolvingArrayFinalType",
        }
    }

    /// Whether the field holds an array of ids rather than a single id
    pub fn is_array(self) -> bool {
        matches!(
            self,
            LinkKind::UnionTypes
                | LinkKind::IntersectionTypes
                | LinkKind::AliasTypeArguments
                | LinkKind::TypeArguments
        )
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type record from the type dump
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolvedType {
    pub id: TypeId,

    #[serde(default)]
    pub flags: Vec<TypeFlag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intrinsic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursion_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tuple: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_declaration: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructuring_pattern: Option<Location>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub union_types: Option<Vec<TypeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intersection_types: Option<Vec<TypeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_type_arguments: Option<Vec<TypeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyof_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_access_object_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_access_index_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instantiated_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_arguments: Option<Vec<TypeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_check_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_extends_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_true_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_false_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_base_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_mapped_source_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_mapped_mapped_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_mapped_constraint_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolving_array_element_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolving_array_final_type: Option<TypeId>,
}

static NOT_FOUND_TYPE: Lazy<ResolvedType> = Lazy::new(|| ResolvedType {
    id: NOT_FOUND_TYPE_ID,
    display: Some("(not found)".to_string()),
    ..Default::default()
});

impl ResolvedType {
    /// Placeholder returned for the sentinel id
    pub fn not_found() -> &'static ResolvedType {
        &NOT_FOUND_TYPE
    }

    /// Present relationship fields with their target ids, in `LinkKind::ALL` order
    ///
    /// Scalar fields yield a one-element slice. The destructuring below has no
    /// rest pattern, so a field added to the record must be classified here
    /// before the crate compiles.
    pub fn links(&self) -> Vec<(LinkKind, &[TypeId])> {
        let ResolvedType {
            id: _,
            flags: _,
            display: _,
            symbol_name: _,
            intrinsic_name: _,
            recursion_id: _,
            is_tuple: _,
            first_declaration: _,
            reference_location: _,
            destructuring_pattern: _,
            union_types,
            intersection_types,
            alias_type,
            alias_type_arguments,
            keyof_type,
            indexed_access_object_type,
            indexed_access_index_type,
            instantiated_type,
            type_arguments,
            conditional_check_type,
            conditional_extends_type,
            conditional_true_type,
            conditional_false_type,
            substitution_base_type,
            constraint_type,
            reverse_mapped_source_type,
            reverse_mapped_mapped_type,
            reverse_mapped_constraint_type,
            evolving_array_element_type,
            evolving_array_final_type,
        } = self;

        fn many(ids: &Option<Vec<TypeId>>) -> Option<&[TypeId]> {
            ids.as_deref()
        }
        fn one(id: &Option<TypeId>) -> Option<&[TypeId]> {
            id.as_ref().map(slice::from_ref)
        }

        let fields: [(LinkKind, Option<&[TypeId]>); 20] = [
            (LinkKind::UnionTypes, many(union_types)),
            (LinkKind::IntersectionTypes, many(intersection_types)),
            (LinkKind::AliasType, one(alias_type)),
            (LinkKind::AliasTypeArguments, many(alias_type_arguments)),
            (LinkKind::KeyofType, one(keyof_type)),
            (LinkKind::IndexedAccessObjectType, one(indexed_access_object_type)),
            (LinkKind::IndexedAccessIndexType, one(indexed_access_index_type)),
            (LinkKind::InstantiatedType, one(instantiated_type)),
            (LinkKind::TypeArguments, many(type_arguments)),
            (LinkKind::ConditionalCheckType, one(conditional_check_type)),
            (LinkKind::ConditionalExtendsType, one(conditional_extends_type)),
            (LinkKind::ConditionalTrueType, one(conditional_true_type)),
            (LinkKind::ConditionalFalseType, one(conditional_false_type)),
            (LinkKind::SubstitutionBaseType, one(substitution_base_type)),
            (LinkKind::ConstraintType, one(constraint_type)),
            (LinkKind::ReverseMappedSourceType, one(reverse_mapped_source_type)),
            (LinkKind::ReverseMappedMappedType, one(reverse_mapped_mapped_type)),
            (LinkKind::ReverseMappedConstraintType, one(reverse_mapped_constraint_type)),
            (LinkKind::EvolvingArrayElementType, one(evolving_array_element_type)),
            (LinkKind::EvolvingArrayFinalType, one(evolving_array_final_type)),
        ];

        fields
            .into_iter()
            .filter_map(|(kind, ids)| ids.map(|ids| (kind, ids)))
            .collect()
    }

    /// Target ids of a single relationship, if the field is present
    pub fn link(&self, kind: LinkKind) -> Option<&[TypeId]> {
        self.links()
            .into_iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, ids)| ids)
    }

    /// Best human-readable name for logs and summaries
    pub fn label(&self) -> String {
        self.display
            .as_deref()
            .or(self.symbol_name.as_deref())
            .or(self.intrinsic_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("type {}", self.id))
    }
}

/// Lookup from type id to its record, built once per analysis run
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<TypeId, ResolvedType>,
}

impl TypeRegistry {
    /// Build a registry from already-parsed records
    pub fn new(types: impl IntoIterator<Item = ResolvedType>) -> Result<Self, ParseError> {
        let mut map = BTreeMap::new();

        for (index, ty) in types.into_iter().enumerate() {
            if ty.id <= 0 {
                return Err(ParseError::InvalidType {
                    index,
                    reason: format!("type id must be positive, got {}", ty.id),
                });
            }
            let id = ty.id;
            if map.insert(id, ty).is_some() {
                return Err(ParseError::DuplicateType(id));
            }
        }

        Ok(Self { types: map })
    }

    /// Build a registry from the raw type dump document
    ///
    /// # Errors
    /// * `ParseError::InvalidFormat` - Document is not a JSON array
    /// * `ParseError::InvalidType` - A record does not match the type schema
    /// * `ParseError::DuplicateType` - Two records share an id
    pub fn from_json(document: &serde_json::Value) -> Result<Self, ParseError> {
        let records = document.as_array().ok_or_else(|| {
            ParseError::InvalidFormat("Type dump must be a JSON array".to_string())
        })?;

        let mut types = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let ty = ResolvedType::deserialize(record).map_err(|e| ParseError::InvalidType {
                index,
                reason: e.to_string(),
            })?;
            types.push(ty);
        }

        let registry = Self::new(types)?;
        debug!("Type registry holds {} types", registry.len());
        Ok(registry)
    }

    /// Parse a type dump from its JSON text
    pub fn from_json_str(text: &str) -> Result<Self, ParseError> {
        let document: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(&document)
    }

    pub fn get(&self, id: TypeId) -> Option<&ResolvedType> {
        self.types.get(&id)
    }

    /// Look up a type, mapping the sentinel id to the placeholder record
    ///
    /// # Errors
    /// * `AnalysisError::TypeNotFound` - Any other id absent from the dump
    pub fn resolve(&self, id: TypeId) -> Result<&ResolvedType, AnalysisError> {
        if id == NOT_FOUND_TYPE_ID {
            return Ok(ResolvedType::not_found());
        }
        self.types.get(&id).ok_or(AnalysisError::TypeNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All types in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedType> {
        self.types.values()
    }

    /// Case-insensitive substring search over symbol, intrinsic and display names
    pub fn search(&self, query: &str) -> Vec<&ResolvedType> {
        let needle = query.to_lowercase();
        self.iter()
            .filter(|ty| {
                [&ty.symbol_name, &ty.intrinsic_name, &ty.display]
                    .into_iter()
                    .flatten()
                    .any(|name| name.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn colors() -> TypeRegistry {
        TypeRegistry::from_json(&json!([
            {"id": 100, "flags": ["StringLiteral"], "display": "\"red\""},
            {"id": 101, "flags": ["StringLiteral"], "display": "\"green\""},
            {"id": 102, "flags": ["StringLiteral"], "display": "\"blue\""},
            {"id": 103, "flags": ["Union"], "unionTypes": [100, 101, 102], "symbolName": "Color"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_parse_registry() {
        let registry = colors();
        assert_eq!(registry.len(), 4);
        let union = registry.get(103).unwrap();
        assert_eq!(union.flags, vec![TypeFlag::Union]);
        assert_eq!(union.link(LinkKind::UnionTypes), Some(&[100, 101, 102][..]));
        assert_eq!(union.link(LinkKind::TypeArguments), None);
    }

    #[test]
    fn test_scalar_link_is_single_element() {
        let registry = TypeRegistry::from_json(&json!([
            {"id": 5, "flags": ["Object"], "aliasType": 5}
        ]))
        .unwrap();
        let links = registry.get(5).unwrap().links();
        assert_eq!(links, vec![(LinkKind::AliasType, &[5][..])]);
    }

    #[test]
    fn test_resolve_sentinel_and_missing() {
        let registry = colors();
        assert_eq!(registry.resolve(-1).unwrap().id, -1);
        assert!(matches!(registry.resolve(7), Err(AnalysisError::TypeNotFound(7))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = TypeRegistry::from_json(&json!([{"id": 1, "flags": [], "bogus": 3}]));
        assert!(matches!(result, Err(ParseError::InvalidType { index: 0, .. })));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let result = TypeRegistry::from_json(&json!([{"id": 1, "flags": ["Wibble"]}]));
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = TypeRegistry::from_json(&json!([{"id": 1}, {"id": 1}]));
        assert!(matches!(result, Err(ParseError::DuplicateType(1))));
    }

    #[test]
    fn test_locations_parse() {
        let registry = TypeRegistry::from_json(&json!([{
            "id": 9,
            "flags": ["Object"],
            "symbolName": "Box",
            "firstDeclaration": {
                "path": "/src/box.ts",
                "start": {"line": 1, "character": 1},
                "end": {"line": 3, "character": 2}
            }
        }]))
        .unwrap();
        let decl = registry.get(9).unwrap().first_declaration.as_ref().unwrap();
        assert_eq!(decl.path, "/src/box.ts");
        assert_eq!(decl.end.line, 3);
    }

    #[test]
    fn test_search() {
        let registry = colors();
        let hits: Vec<TypeId> = registry.search("GREEN").iter().map(|t| t.id).collect();
        assert_eq!(hits, vec![101]);
        let hits: Vec<TypeId> = registry.search("color").iter().map(|t| t.id).collect();
        assert_eq!(hits, vec![103]);
    }

    #[test]
    fn test_link_kind_names_unique() {
        let mut names: Vec<&str> = LinkKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), LinkKind::ALL.len());
    }
}
