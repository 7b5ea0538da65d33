//! Request definition resolver

use apicmp_core::{Headers, RequestBody, RequestSpec, ResolvedRequest, VariableScope};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{ResolveError, ResolveResult};
use crate::substitute::{placeholders, value_text, Substitution};

/// Check if a content type names a JSON media type
///
/// Accepts `application/json` and any `+json` suffix type; parameters such
/// as `charset` are ignored.
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.contains('/') && essence.ends_with("+json"))
}

/// Turns templated request specs into concrete requests
///
/// The resolver holds the suite-wide default headers and variable scope.
/// The base URL is passed per call so each endpoint of a comparison can
/// target its own host without touching shared state.
#[derive(Debug, Clone, Default)]
pub struct RequestResolver {
    default_headers: IndexMap<String, Value>,
    scope: VariableScope,
}

impl RequestResolver {
    /// Create a resolver from default headers and a variable scope
    pub fn new(default_headers: IndexMap<String, Value>, scope: VariableScope) -> Self {
        Self {
            default_headers,
            scope,
        }
    }

    /// The variable scope used for substitution
    pub fn scope(&self) -> &VariableScope {
        &self.scope
    }

    /// Resolve a request spec against a base URL
    ///
    /// Without a `shared_id`, one identifier is generated for this request and
    /// used for every `{{uuid}}` in it.
    pub fn resolve(
        &self,
        spec: &RequestSpec,
        base_url: &str,
        shared_id: Option<&str>,
    ) -> ResolveResult<ResolvedRequest> {
        let pass = Substitution::new(&self.scope, shared_id);

        let method = spec.method.trim().to_ascii_uppercase();
        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ResolveError::InvalidMethod {
                method: spec.method.clone(),
            });
        }

        let mut path = pass.string(spec.effective_path());
        for (key, value) in &spec.path_params {
            let value = pass.value(value);
            path = path.replace(&format!("{{{}}}", key), &value_text(&value));
        }

        let url = join_url(base_url, &path)?;

        let mut headers = Headers::new();
        for (name, value) in self.default_headers.iter().chain(spec.headers.iter()) {
            headers.set(name.clone(), value_text(&pass.value(value)).into_owned());
        }

        let mut query = Vec::new();
        for (key, value) in &spec.query_params {
            match pass.value(value) {
                Value::Null => {}
                Value::Array(items) => query.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (key.clone(), value_text(item).into_owned())),
                ),
                other => query.push((key.clone(), value_text(&other).into_owned())),
            }
        }

        let body = spec.body.as_ref().map(|body| {
            let body = pass.value(body);
            let json = headers
                .get("content-type")
                .map(is_json_media_type)
                .unwrap_or(false);
            encode_body(body, json)
        });

        let unresolved = placeholders(&path);
        if !unresolved.is_empty() {
            debug!("Unresolved placeholders in path {}: {:?}", path, unresolved);
        }
        trace!("Resolved {} {} ({} headers)", method, url, headers.len());

        Ok(ResolvedRequest {
            method,
            base_url: base_url.to_string(),
            path,
            url: url.to_string(),
            headers,
            query,
            body,
        })
    }
}

fn join_url(base_url: &str, path: &str) -> ResolveResult<Url> {
    let base = Url::parse(base_url).map_err(|source| ResolveError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;
    base.join(path).map_err(|source| ResolveError::InvalidPath {
        base_url: base_url.to_string(),
        path: path.to_string(),
        source,
    })
}

fn encode_body(body: Value, json: bool) -> RequestBody {
    if json {
        return RequestBody::Json(body);
    }
    match body {
        Value::Object(map) => RequestBody::Form(
            map.iter()
                .map(|(k, v)| (k.clone(), value_text(v).into_owned()))
                .collect(),
        ),
        Value::String(s) => RequestBody::Raw(s),
        other => RequestBody::Raw(other.to_string()),
    }
}
