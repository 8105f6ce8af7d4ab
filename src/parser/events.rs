//! Trace event classification.
//!
//! Every record of a `--generateTrace` document is validated against the
//! schema registered for its event name and turned into a `TraceEvent`.
//! Unknown phases, unknown names and argument-shape mismatches abort the
//! whole analysis: span reconstruction assumes well-typed payloads.

use super::types::TypeId;
use crate::utils::error::ParseError;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Lifetime encoding of a trace record (`ph` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// `B`: opens a span closed by a later `E`
    Begin,
    /// `E`: closes the most recent open `B`
    End,
    /// `X`: carries its own duration
    Complete,
    /// `I` / `i`
    Instant,
    /// `M`
    Metadata,
}

impl Phase {
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "B" => Some(Phase::Begin),
            "E" => Some(Phase::End),
            "X" => Some(Phase::Complete),
            "I" | "i" => Some(Phase::Instant),
            "M" => Some(Phase::Metadata),
            _ => None,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Phase::Begin => "B",
            Phase::End => "E",
            Phase::Complete => "X",
            Phase::Instant => "I",
            Phase::Metadata => "M",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Visibility of an instant event (`s` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstantScope {
    #[serde(rename = "g")]
    Global,
    #[serde(rename = "p")]
    Process,
    #[serde(rename = "t")]
    Thread,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyArgs {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProgramArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FindSourceFileArgs {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default_lib: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_include_kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountArgs {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeReferenceDirectiveArgs {
    pub directive: String,
    pub has_resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_kind: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainingFileArgs {
    pub containing_file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolveLibraryArgs {
    pub resolve_from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OldProgramArgs {
    pub has_old_program: bool,
}

/// Position of a syntax node, as traced by the checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeArgs {
    pub kind: u32,
    pub pos: u32,
    pub end: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypePairArgs {
    pub source_id: TypeId,
    pub target_id: TypeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarianceArgs {
    pub arity: u32,
    pub id: TypeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeParameterArgs {
    pub parent: TypeId,
    pub id: TypeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InstantiationLimitArgs {
    pub type_id: TypeId,
    pub instantiation_depth: u32,
    pub instantiation_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecursiveRelationLimitArgs {
    pub source_id: TypeId,
    pub source_id_stack: Vec<TypeId>,
    pub target_id: TypeId,
    pub target_id_stack: Vec<TypeId>,
    pub depth: u32,
    pub target_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationLimitArgs {
    pub source_id: TypeId,
    pub target_id: TypeId,
    pub depth: u32,
    pub target_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlowNodeLimitArgs {
    pub flow_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DiscriminatedLimitArgs {
    pub source_id: TypeId,
    pub target_id: TypeId,
    pub num_combinations: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CrossProductLimitArgs {
    pub type_ids: Vec<TypeId>,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeIdsArgs {
    pub type_ids: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TooLargeLimitArgs {
    pub source_id: TypeId,
    pub source_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildInfoArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_info_path: Option<String>,
}

/// `transformNodes` traces a whole file or a single node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransformNodesArgs {
    File(PathArgs),
    Node(NodeArgs),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracingStartedArgs {
    pub data: Value,
}

/// Closed set of compiler trace events, one variant per event name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventKind {
    CreateSourceFile(PathArgs),
    CreateProgram(CreateProgramArgs),
    FindSourceFile(FindSourceFileArgs),
    ProcessRootFiles(CountArgs),
    ProcessTypeReferences(CountArgs),
    ProcessTypeReferenceDirective(TypeReferenceDirectiveArgs),
    ResolveModuleNamesWorker(ContainingFileArgs),
    ResolveTypeReferenceDirectiveNamesWorker(ContainingFileArgs),
    ResolveLibrary(ResolveLibraryArgs),
    ShouldProgramCreateNewSourceFiles(OldProgramArgs),
    TryReuseStructureFromOldProgram(EmptyArgs),
    BindSourceFile(PathArgs),
    CheckSourceFile(PathArgs),
    CheckExpression(NodeArgs),
    CheckVariableDeclaration(NodeArgs),
    CheckDeferredNode(NodeArgs),
    StructuredTypeRelatedTo(TypePairArgs),
    GetVariancesWorker(VarianceArgs),
    CheckTypeParameterDeferred(TypeParameterArgs),
    InstantiateTypeDepthLimit(InstantiationLimitArgs),
    RecursiveTypeRelatedToDepthLimit(RecursiveRelationLimitArgs),
    CheckTypeRelatedToDepthLimit(RelationLimitArgs),
    GetTypeAtFlowNodeDepthLimit(FlowNodeLimitArgs),
    TypeRelatedToDiscriminatedTypeDepthLimit(DiscriminatedLimitArgs),
    CheckCrossProductUnionDepthLimit(CrossProductLimitArgs),
    RemoveSubtypesDepthLimit(TypeIdsArgs),
    TraceUnionsOrIntersectionsTooLargeDepthLimit(TooLargeLimitArgs),
    Emit(EmptyArgs),
    EmitJsFileOrBundle(PathArgs),
    EmitDeclarationFileOrBundle(PathArgs),
    EmitBuildInfo(BuildInfoArgs),
    TransformNodes(TransformNodesArgs),
    ProcessName(NameArgs),
    ThreadName(NameArgs),
    TracingStartedInBrowser(TracingStartedArgs),
}

fn parse_args<T, F>(args: Value, wrap: F) -> Result<EventKind, serde_json::Error>
where
    T: DeserializeOwned,
    F: FnOnce(T) -> EventKind,
{
    serde_json::from_value(args).map(wrap)
}

impl EventKind {
    /// Parse the argument payload registered for `name`
    ///
    /// Returns `None` when the name is not part of the known set.
    pub fn from_name_and_args(
        name: &str,
        args: Value,
    ) -> Option<Result<EventKind, serde_json::Error>> {
        let parsed = match name {
            "createSourceFile" => parse_args(args, EventKind::CreateSourceFile),
            "createProgram" => parse_args(args, EventKind::CreateProgram),
            "findSourceFile" => parse_args(args, EventKind::FindSourceFile),
            "processRootFiles" => parse_args(args, EventKind::ProcessRootFiles),
            "processTypeReferences" => parse_args(args, EventKind::ProcessTypeReferences),
            "processTypeReferenceDirective" => {
                parse_args(args, EventKind::ProcessTypeReferenceDirective)
            }
            "resolveModuleNamesWorker" => parse_args(args, EventKind::ResolveModuleNamesWorker),
            "resolveTypeReferenceDirectiveNamesWorker" => {
                parse_args(args, EventKind::ResolveTypeReferenceDirectiveNamesWorker)
            }
            "resolveLibrary" => parse_args(args, EventKind::ResolveLibrary),
            "shouldProgramCreateNewSourceFiles" => {
                parse_args(args, EventKind::ShouldProgramCreateNewSourceFiles)
            }
            "tryReuseStructureFromOldProgram" => {
                parse_args(args, EventKind::TryReuseStructureFromOldProgram)
            }
            "bindSourceFile" => parse_args(args, EventKind::BindSourceFile),
            "checkSourceFile" => parse_args(args, EventKind::CheckSourceFile),
            "checkExpression" => parse_args(args, EventKind::CheckExpression),
            "checkVariableDeclaration" => parse_args(args, EventKind::CheckVariableDeclaration),
            "checkDeferredNode" => parse_args(args, EventKind::CheckDeferredNode),
            "structuredTypeRelatedTo" => parse_args(args, EventKind::StructuredTypeRelatedTo),
            "getVariancesWorker" => parse_args(args, EventKind::GetVariancesWorker),
            "checkTypeParameterDeferred" => {
                parse_args(args, EventKind::CheckTypeParameterDeferred)
            }
            "instantiateType_DepthLimit" => parse_args(args, EventKind::InstantiateTypeDepthLimit),
            "recursiveTypeRelatedTo_DepthLimit" => {
                parse_args(args, EventKind::RecursiveTypeRelatedToDepthLimit)
            }
            "checkTypeRelatedTo_DepthLimit" => {
                parse_args(args, EventKind::CheckTypeRelatedToDepthLimit)
            }
            "getTypeAtFlowNode_DepthLimit" => {
                parse_args(args, EventKind::GetTypeAtFlowNodeDepthLimit)
            }
            "typeRelatedToDiscriminatedType_DepthLimit" => {
                parse_args(args, EventKind::TypeRelatedToDiscriminatedTypeDepthLimit)
            }
            "checkCrossProductUnion_DepthLimit" => {
                parse_args(args, EventKind::CheckCrossProductUnionDepthLimit)
            }
            "removeSubtypes_DepthLimit" => parse_args(args, EventKind::RemoveSubtypesDepthLimit),
            "traceUnionsOrIntersectionsTooLarge_DepthLimit" => {
                parse_args(args, EventKind::TraceUnionsOrIntersectionsTooLargeDepthLimit)
            }
            "emit" => parse_args(args, EventKind::Emit),
            "emitJsFileOrBundle" => parse_args(args, EventKind::EmitJsFileOrBundle),
            "emitDeclarationFileOrBundle" => {
                parse_args(args, EventKind::EmitDeclarationFileOrBundle)
            }
            "emitBuildInfo" => parse_args(args, EventKind::EmitBuildInfo),
            "transformNodes" => parse_args(args, EventKind::TransformNodes),
            "process_name" => parse_args(args, EventKind::ProcessName),
            "thread_name" => parse_args(args, EventKind::ThreadName),
            "TracingStartedInBrowser" => parse_args(args, EventKind::TracingStartedInBrowser),
            _ => return None,
        };
        Some(parsed)
    }

    /// Event name as written by the compiler
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::CreateSourceFile(_) => "createSourceFile",
            EventKind::CreateProgram(_) => "createProgram",
            EventKind::FindSourceFile(_) => "findSourceFile",
            EventKind::ProcessRootFiles(_) => "processRootFiles",
            EventKind::ProcessTypeReferences(_) => "processTypeReferences",
            EventKind::ProcessTypeReferenceDirective(_) => "processTypeReferenceDirective",
            EventKind::ResolveModuleNamesWorker(_) => "resolveModuleNamesWorker",
            EventKind::ResolveTypeReferenceDirectiveNamesWorker(_) => {
                "resolveTypeReferenceDirectiveNamesWorker"
            }
            EventKind::ResolveLibrary(_) => "resolveLibrary",
            EventKind::ShouldProgramCreateNewSourceFiles(_) => "shouldProgramCreateNewSourceFiles",
            EventKind::TryReuseStructureFromOldProgram(_) => "tryReuseStructureFromOldProgram",
            EventKind::BindSourceFile(_) => "bindSourceFile",
            EventKind::CheckSourceFile(_) => "checkSourceFile",
            EventKind::CheckExpression(_) => "checkExpression",
            EventKind::CheckVariableDeclaration(_) => "checkVariableDeclaration",
            EventKind::CheckDeferredNode(_) => "checkDeferredNode",
            EventKind::StructuredTypeRelatedTo(_) => "structuredTypeRelatedTo",
            EventKind::GetVariancesWorker(_) => "getVariancesWorker",
            EventKind::CheckTypeParameterDeferred(_) => "checkTypeParameterDeferred",
            EventKind::InstantiateTypeDepthLimit(_) => "instantiateType_DepthLimit",
            EventKind::RecursiveTypeRelatedToDepthLimit(_) => "recursiveTypeRelatedTo_DepthLimit",
            EventKind::CheckTypeRelatedToDepthLimit(_) => "checkTypeRelatedTo_DepthLimit",
            EventKind::GetTypeAtFlowNodeDepthLimit(_) => "getTypeAtFlowNode_DepthLimit",
            EventKind::TypeRelatedToDiscriminatedTypeDepthLimit(_) => {
                "typeRelatedToDiscriminatedType_DepthLimit"
            }
            EventKind::CheckCrossProductUnionDepthLimit(_) => "checkCrossProductUnion_DepthLimit",
            EventKind::RemoveSubtypesDepthLimit(_) => "removeSubtypes_DepthLimit",
            EventKind::TraceUnionsOrIntersectionsTooLargeDepthLimit(_) => {
                "traceUnionsOrIntersectionsTooLarge_DepthLimit"
            }
            EventKind::Emit(_) => "emit",
            EventKind::EmitJsFileOrBundle(_) => "emitJsFileOrBundle",
            EventKind::EmitDeclarationFileOrBundle(_) => "emitDeclarationFileOrBundle",
            EventKind::EmitBuildInfo(_) => "emitBuildInfo",
            EventKind::TransformNodes(_) => "transformNodes",
            EventKind::ProcessName(_) => "process_name",
            EventKind::ThreadName(_) => "thread_name",
            EventKind::TracingStartedInBrowser(_) => "TracingStartedInBrowser",
        }
    }

    /// Whether this event may only appear with the metadata phase
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            EventKind::ProcessName(_)
                | EventKind::ThreadName(_)
                | EventKind::TracingStartedInBrowser(_)
        )
    }

    /// Source file path carried by the event, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            EventKind::CreateSourceFile(args)
            | EventKind::BindSourceFile(args)
            | EventKind::CheckSourceFile(args)
            | EventKind::EmitJsFileOrBundle(args)
            | EventKind::EmitDeclarationFileOrBundle(args)
            | EventKind::TransformNodes(TransformNodesArgs::File(args)) => Some(&args.path),
            EventKind::CheckExpression(args)
            | EventKind::CheckVariableDeclaration(args)
            | EventKind::CheckDeferredNode(args)
            | EventKind::TransformNodes(TransformNodesArgs::Node(args)) => args.path.as_deref(),
            EventKind::FindSourceFile(args) => Some(&args.file_name),
            _ => None,
        }
    }
}

/// One validated trace record
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub phase: Phase,
    pub category: String,
    /// Microseconds since the trace clock origin
    pub ts: f64,
    /// Only set for complete (`X`) events
    pub dur: Option<f64>,
    pub pid: u64,
    pub tid: u64,
    /// Only set for instant events
    pub scope: Option<InstantScope>,
    pub kind: EventKind,
    /// Pop-time payload the compiler appends to `E`/`X` arguments
    pub results: Option<Value>,
}

impl TraceEvent {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn path(&self) -> Option<&str> {
        self.kind.path()
    }

    /// Whether the event belongs to the `check` category
    pub fn is_check(&self) -> bool {
        self.category == "check"
    }
}

/// Wire shape of a record before its arguments are validated
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecord {
    ph: String,
    name: String,
    cat: String,
    ts: f64,
    #[serde(default)]
    dur: Option<f64>,
    pid: u64,
    tid: u64,
    #[serde(default)]
    s: Option<InstantScope>,
    #[serde(default)]
    args: Option<Map<String, Value>>,
}

/// Classify a single raw record
///
/// # Errors
/// * `ParseError::InvalidRecord` - The record envelope is malformed: a
///   missing `pid`, `tid`, `ph`, `cat`, `ts` or `name`, or an instant
///   scope other than `g`, `p`, `t`
/// * `ParseError::UnknownPhase` - `ph` is not one of `B E X I i M`
/// * `ParseError::UnknownEvent` - `name` is not in the known set
/// * `ParseError::InvalidArgs` - `args` do not match the schema for `name`
pub fn classify_event(index: usize, record: &Value) -> Result<TraceEvent, ParseError> {
    let raw = RawRecord::deserialize(record)
        .map_err(|source| ParseError::InvalidRecord { index, source })?;

    let phase = Phase::from_marker(&raw.ph).ok_or_else(|| ParseError::UnknownPhase {
        index,
        phase: raw.ph.clone(),
    })?;

    let mut args = raw.args.unwrap_or_default();
    let results = match phase {
        Phase::End | Phase::Complete => args.remove("results"),
        _ => None,
    };

    let kind = EventKind::from_name_and_args(&raw.name, Value::Object(args))
        .ok_or_else(|| ParseError::UnknownEvent {
            index,
            name: raw.name.clone(),
        })?
        .map_err(|source| ParseError::InvalidArgs {
            index,
            name: raw.name.clone(),
            source,
        })?;

    if kind.is_metadata() != (phase == Phase::Metadata) {
        return Err(ParseError::PhaseMismatch {
            index,
            name: raw.name,
            phase: raw.ph,
        });
    }

    let dur = match (phase, raw.dur) {
        (Phase::Complete, None) => {
            return Err(ParseError::MissingDuration {
                index,
                name: raw.name,
            })
        }
        (Phase::Complete, dur) => dur,
        _ => None,
    };

    let scope = match phase {
        Phase::Instant => raw.s,
        _ => None,
    };

    Ok(TraceEvent {
        phase,
        category: raw.cat,
        ts: raw.ts,
        dur,
        pid: raw.pid,
        tid: raw.tid,
        scope,
        kind,
        results,
    })
}

/// Classify every record of a trace document, preserving order
///
/// The first failing record aborts classification.
pub fn classify_events(records: &[Value]) -> Result<Vec<TraceEvent>, ParseError> {
    let events = records
        .iter()
        .enumerate()
        .map(|(index, record)| classify_event(index, record))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Classified {} trace events", events.len());
    Ok(events)
}

/// Record shape used when an event is written back out
#[derive(Serialize)]
struct RecordView<'a> {
    pid: u64,
    tid: u64,
    ph: &'static str,
    cat: &'a str,
    ts: f64,
    name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    s: Option<InstantScope>,
    args: Value,
}

impl Serialize for TraceEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut args = serde_json::to_value(&self.kind).map_err(serde::ser::Error::custom)?;
        if let (Some(results), Value::Object(map)) = (&self.results, &mut args) {
            map.insert("results".to_string(), results.clone());
        }

        RecordView {
            pid: self.pid,
            tid: self.tid,
            ph: self.phase.marker(),
            cat: &self.category,
            ts: self.ts,
            name: self.name(),
            dur: self.dur,
            s: self.scope,
            args,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TraceEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Value::deserialize(deserializer)?;
        classify_event(0, &record).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_begin_check_source_file() {
        let event = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "B", "cat": "check", "ts": 10.5,
                    "name": "checkSourceFile", "args": {"path": "/a.ts"}}),
        )
        .unwrap();

        assert_eq!(event.phase, Phase::Begin);
        assert_eq!(event.name(), "checkSourceFile");
        assert_eq!(event.path(), Some("/a.ts"));
        assert!(event.is_check());
        assert_eq!(event.ts, 10.5);
    }

    #[test]
    fn test_classify_complete_requires_duration() {
        let result = classify_event(
            3,
            &json!({"pid": 1, "tid": 1, "ph": "X", "cat": "checkTypes", "ts": 1, "name": "structuredTypeRelatedTo",
                    "args": {"sourceId": 1, "targetId": 2}}),
        );
        assert!(matches!(result, Err(ParseError::MissingDuration { index: 3, .. })));
    }

    #[test]
    fn test_end_results_are_split_off() {
        let event = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "E", "cat": "checkTypes", "ts": 5, "name": "getVariancesWorker",
                    "args": {"arity": 1, "id": 42, "results": {"variances": ["[independent]"]}}}),
        )
        .unwrap();

        assert_eq!(
            event.kind,
            EventKind::GetVariancesWorker(VarianceArgs { arity: 1, id: 42 })
        );
        assert!(event.results.is_some());
    }

    #[test]
    fn test_results_rejected_on_begin() {
        let result = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "B", "cat": "check", "ts": 5, "name": "checkSourceFile",
                    "args": {"path": "/a.ts", "results": {}}}),
        );
        assert!(matches!(result, Err(ParseError::InvalidArgs { .. })));
    }

    #[test]
    fn test_unknown_phase() {
        let result = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "Q", "cat": "emit", "ts": 0, "name": "emit"}),
        );
        assert!(matches!(result, Err(ParseError::UnknownPhase { .. })));
    }

    #[test]
    fn test_unknown_name() {
        let result = classify_event(
            7,
            &json!({"pid": 1, "tid": 1, "ph": "B", "cat": "check", "ts": 0, "name": "frobnicate"}),
        );
        match result {
            Err(ParseError::UnknownEvent { index, name }) => {
                assert_eq!(index, 7);
                assert_eq!(name, "frobnicate");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let result = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "B", "cat": "checkTypes", "ts": 0, "name": "structuredTypeRelatedTo",
                    "args": {"sourceId": "one", "targetId": 2}}),
        );
        assert!(matches!(result, Err(ParseError::InvalidArgs { .. })));
    }

    #[test]
    fn test_metadata_phase_mismatch() {
        let result = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "B", "cat": "__metadata", "ts": 0, "name": "process_name",
                    "args": {"name": "tsc"}}),
        );
        assert!(matches!(result, Err(ParseError::PhaseMismatch { .. })));
    }

    #[test]
    fn test_transform_nodes_either_shape() {
        let file = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "B", "cat": "emit", "ts": 0, "name": "transformNodes",
                    "args": {"path": "/a.ts"}}),
        )
        .unwrap();
        assert_eq!(file.path(), Some("/a.ts"));

        let node = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "B", "cat": "emit", "ts": 0, "name": "transformNodes",
                    "args": {"kind": 200, "pos": 1, "end": 9}}),
        )
        .unwrap();
        assert_eq!(node.path(), None);
    }

    #[test]
    fn test_event_serializes_back_to_record() {
        let record = json!({"pid": 1, "tid": 1, "ph": "B", "cat": "check", "ts": 10.0,
                            "name": "checkSourceFile", "args": {"path": "/a.ts"}});
        let event = classify_event(0, &record).unwrap();
        assert_eq!(serde_json::to_value(&event).unwrap(), record);
    }

    #[test]
    fn test_check_type_related_to_depth_limit() {
        let event = classify_event(
            0,
            &json!({"pid": 1, "tid": 1, "ph": "I", "cat": "checkTypes", "ts": 40, "s": "g",
                    "name": "checkTypeRelatedTo_DepthLimit",
                    "args": {"sourceId": 1, "targetId": 2, "depth": 100, "targetDepth": 3}}),
        )
        .unwrap();

        assert_eq!(event.phase, Phase::Instant);
        assert_eq!(event.scope, Some(InstantScope::Global));
        assert_eq!(
            event.kind,
            EventKind::CheckTypeRelatedToDepthLimit(RelationLimitArgs {
                source_id: 1,
                target_id: 2,
                depth: 100,
                target_depth: 3,
            })
        );
        assert_eq!(event.name(), "checkTypeRelatedTo_DepthLimit");
    }

    #[test]
    fn test_get_type_at_flow_node_depth_limit() {
        let record = json!({"pid": 1, "tid": 1, "ph": "I", "cat": "checkTypes", "ts": 40.0, "s": "g",
                            "name": "getTypeAtFlowNode_DepthLimit", "args": {"flowId": 812}});
        let event = classify_event(0, &record).unwrap();

        assert_eq!(
            event.kind,
            EventKind::GetTypeAtFlowNodeDepthLimit(FlowNodeLimitArgs { flow_id: 812 })
        );
        assert_eq!(serde_json::to_value(&event).unwrap(), record);

        let extra = json!({"pid": 1, "tid": 1, "ph": "I", "cat": "checkTypes", "ts": 40,
                           "name": "getTypeAtFlowNode_DepthLimit",
                           "args": {"flowId": 812, "depth": 2}});
        assert!(matches!(
            classify_event(0, &extra),
            Err(ParseError::InvalidArgs { .. })
        ));
    }

    #[test]
    fn test_missing_envelope_fields_rejected() {
        let complete = json!({"pid": 1, "tid": 1, "ph": "B", "cat": "check", "ts": 3,
                              "name": "checkSourceFile", "args": {"path": "/a.ts"}});
        assert!(classify_event(0, &complete).is_ok());

        for field in ["ts", "cat", "pid", "tid"] {
            let mut record = complete.clone();
            record.as_object_mut().unwrap().remove(field);
            assert!(
                matches!(classify_event(4, &record), Err(ParseError::InvalidRecord { index: 4, .. })),
                "record without '{}' was accepted",
                field
            );
        }
    }

    #[test]
    fn test_instant_scope_validated() {
        let record = json!({"pid": 1, "tid": 1, "ph": "I", "cat": "checkTypes", "ts": 0, "s": "x",
                            "name": "removeSubtypes_DepthLimit", "args": {"typeIds": []}});
        assert!(matches!(
            classify_event(0, &record),
            Err(ParseError::InvalidRecord { .. })
        ));
    }
}
