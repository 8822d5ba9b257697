// Env propagation from configuration into an invocation

use serde_json::Value;
use wrapline_error::{WrapError, WrapErrorCode, WrapResult};
use wrapline_types::{Env, EnvRegistration, Payload, Uri};

/// First env registered for any URI on `path`, in path order.
pub fn env_for_path<'a>(path: &[Uri], envs: &'a [EnvRegistration]) -> Option<&'a Env> {
    path.iter()
        .find_map(|uri| envs.iter().find(|registration| registration.uri == *uri))
        .map(|registration| &registration.env)
}

/// Shallow-merge a caller-supplied env over a registered one. Keys supplied
/// by the caller win.
pub fn merge_env(registered: Option<&Env>, supplied: Option<Payload>) -> WrapResult<Option<Env>> {
    let supplied = match supplied {
        None => None,
        Some(payload) => match payload.into_value() {
            Ok(Value::Object(env)) => Some(env),
            Ok(Value::Null) => None,
            Ok(other) => {
                return Err(WrapError::new(
                    WrapErrorCode::WrapperArgsMalformed,
                    format!("env must be an object, got {other}"),
                ))
            }
            Err(err) => {
                return Err(WrapError::new(WrapErrorCode::WrapperArgsMalformed, err.to_string())
                    .with_cause(err))
            }
        },
    };

    Ok(match (registered, supplied) {
        (None, None) => None,
        (Some(registered), None) => Some(registered.clone()),
        (None, Some(supplied)) => Some(supplied),
        (Some(registered), Some(supplied)) => {
            let mut merged = registered.clone();
            merged.extend(supplied);
            Some(merged)
        }
    })
}
