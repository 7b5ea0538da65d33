//! Templating for the API comparator
//!
//! Two layers live here:
//!
//! - [`substitute`] expands `{{name}}` placeholders from a [`VariableScope`]
//!   and the reserved `{{uuid}}` token inside arbitrarily nested JSON values.
//! - [`RequestResolver`] turns a templated [`RequestSpec`] into a concrete
//!   [`ResolvedRequest`] for one endpoint's base URL.
//!
//! Both are pure: nothing here performs I/O or mutates shared state.
//!
//! # Example
//!
//! ```ignore
//! use apicmp_template::{resolve_str, RequestResolver};
//!
//! let scope = VariableScope::new().with("user", "42");
//! assert_eq!(resolve_str("/users/{{user}}", &scope, None), "/users/42");
//!
//! let resolver = RequestResolver::new(default_headers, scope);
//! let request = resolver.resolve(&spec, "https://api.example.com", Some(&shared_id))?;
//! ```
//!
//! [`VariableScope`]: apicmp_core::VariableScope
//! [`RequestSpec`]: apicmp_core::RequestSpec
//! [`ResolvedRequest`]: apicmp_core::ResolvedRequest

mod error;
mod request;
pub mod substitute;

pub use error::{ResolveError, ResolveResult};
pub use request::{is_json_media_type, RequestResolver};
pub use substitute::{new_shared_id, placeholders, resolve_str, resolve_value, value_text};
