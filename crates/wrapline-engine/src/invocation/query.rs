// Batched invocation from a query document

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use wrapline_error::{WrapError, WrapErrorCode};
use wrapline_types::Uri;

use super::{panic_message, InvokeOptions};
use crate::client::Client;

//-----------------------------------------------------------------------------
// Query Types
//-----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// URI targeted by entries that do not name their own
    pub uri: Uri,
    pub query: String,
    pub variables: Map<String, Value>,
}

impl QueryOptions {
    pub fn new(uri: Uri, query: impl Into<String>) -> Self {
        QueryOptions {
            uri,
            query: query.into(),
            variables: Map::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

/// One aliased invocation produced by a [`QueryParser`]
#[derive(Debug, Clone)]
pub struct QueryInvocation {
    pub options: InvokeOptions,
    /// Field selection applied to the result, see [`filter_results`]
    pub select: Option<Value>,
}

/// Outcome of a query: successful results by alias plus every error.
#[derive(Debug, Default)]
pub struct QueryResult {
    pub data: BTreeMap<String, Value>,
    pub errors: Vec<WrapError>,
}

impl QueryResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Turns query text into aliased invocations.
pub trait QueryParser: Send + Sync {
    fn parse(
        &self,
        uri: &Uri,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<BTreeMap<String, QueryInvocation>, String>;
}

//-----------------------------------------------------------------------------
// JSON Query Parser
//-----------------------------------------------------------------------------

/// Parses a JSON object of `alias -> { method, args?, uri?, select? }`.
///
/// Any string value of the form `"$name"` inside `args` is replaced by the
/// variable `name`; an unknown variable fails the parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonQueryParser;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QueryEntry {
    method: String,
    #[serde(default)]
    args: Option<Value>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    select: Option<Value>,
}

impl QueryParser for JsonQueryParser {
    fn parse(
        &self,
        uri: &Uri,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<BTreeMap<String, QueryInvocation>, String> {
        let document: Value = serde_json::from_str(query).map_err(|err| err.to_string())?;
        let Value::Object(entries) = document else {
            return Err("query document must be a JSON object".to_string());
        };

        let mut invocations = BTreeMap::new();
        for (alias, entry) in entries {
            let entry: QueryEntry = serde_json::from_value(entry)
                .map_err(|err| format!("invalid query entry \"{alias}\": {err}"))?;
            let target = match entry.uri {
                Some(target) => Uri::parse(&target).map_err(|err| err.to_string())?,
                None => uri.clone(),
            };

            let mut options = InvokeOptions::new(target, entry.method);
            if let Some(args) = entry.args {
                options = options.with_args(substitute_variables(args, variables)?);
            }
            invocations.insert(
                alias,
                QueryInvocation {
                    options,
                    select: entry.select,
                },
            );
        }
        Ok(invocations)
    }
}

fn substitute_variables(value: Value, variables: &Map<String, Value>) -> Result<Value, String> {
    match value {
        Value::String(text) if text.len() > 1 && text.starts_with('$') => {
            let name = &text[1..];
            variables
                .get(name)
                .cloned()
                .ok_or_else(|| format!("Missing variable: {name}"))
        }
        Value::Array(items) => items
            .into_iter()
            .map(|item| substitute_variables(item, variables))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => fields
            .into_iter()
            .map(|(key, item)| Ok((key, substitute_variables(item, variables)?)))
            .collect::<Result<Map<_, _>, String>>()
            .map(Value::Object),
        other => Ok(other),
    }
}

//-----------------------------------------------------------------------------
// Result Selection
//-----------------------------------------------------------------------------

/// Keep only the fields named in `filter`.
///
/// A `true` leaf keeps the field as is, a nested object recurses into it.
/// Fields missing from the result come back as `null`.
pub fn filter_results(result: Value, filter: &Value) -> Result<Value, String> {
    if result.is_null() {
        return Ok(result);
    }
    let fields = match result {
        Value::Object(fields) => fields,
        other => return Err(format!("cannot select fields from non-object result {other}")),
    };
    let Value::Object(selection) = filter else {
        return Err(format!("selection must be an object, got {filter}"));
    };

    let mut filtered = Map::new();
    for (key, sub_filter) in selection {
        let value = match fields.get(key) {
            None | Some(Value::Null) => Value::Null,
            Some(value) if sub_filter.is_object() => filter_results(value.clone(), sub_filter)?,
            Some(value) => value.clone(),
        };
        filtered.insert(key.clone(), value);
    }
    Ok(Value::Object(filtered))
}

//-----------------------------------------------------------------------------
// Execution
//-----------------------------------------------------------------------------

impl Client {
    /// Run every invocation in the query concurrently.
    ///
    /// Never fails as a whole: a parse failure and each failed invocation
    /// are reported in [`QueryResult::errors`].
    #[instrument(skip_all, fields(uri = %options.uri))]
    pub async fn query(&self, options: QueryOptions) -> QueryResult {
        let invocations = match self.query_parser().parse(&options.uri, &options.query, &options.variables) {
            Ok(invocations) => invocations,
            Err(reason) => {
                return QueryResult {
                    data: BTreeMap::new(),
                    errors: vec![WrapError::new(
                        WrapErrorCode::WrapperArgsMalformed,
                        format!("Failed to parse query: {reason}"),
                    )
                    .with_uri(options.uri.to_string())],
                }
            }
        };
        debug!(count = invocations.len(), "running query");

        let pending = invocations.into_iter().map(|(alias, invocation)| async move {
            let uri = invocation.options.uri.to_string();
            let method = invocation.options.method.clone();
            let select = invocation.select;

            let outcome = AssertUnwindSafe(self.invoke(invocation.options)).catch_unwind().await;
            let result = match outcome {
                Ok(result) => result.and_then(|payload| {
                    let value = payload.into_value().map_err(|err| {
                        WrapError::new(WrapErrorCode::WrapperInvokeFail, err.to_string())
                            .with_uri(uri.clone())
                            .with_method(method.clone())
                    })?;
                    match &select {
                        Some(filter) => filter_results(value, filter).map_err(|reason| {
                            WrapError::new(WrapErrorCode::WrapperArgsMalformed, reason)
                                .with_uri(uri.clone())
                                .with_method(method.clone())
                        }),
                        None => Ok(value),
                    }
                }),
                Err(panic) => Err(WrapError::new(WrapErrorCode::WrapperInvokeFail, panic_message(panic))
                    .with_uri(uri.clone())
                    .with_method(method.clone())),
            };
            (alias, result)
        });

        let mut result = QueryResult::default();
        for (alias, outcome) in join_all(pending).await {
            match outcome {
                Ok(value) => {
                    result.data.insert(alias, value);
                }
                Err(err) => result.errors.push(err),
            }
        }
        result
    }
}
