//! Method dispatch.
//!
//! A [`MethodTable`] maps method names to registration records built at
//! startup. Each record bundles the decode step for the method's declared
//! payload type with the application handler, so dispatch needs no runtime
//! type introspection. The table is read-only once the server starts and is
//! shared across connection tasks behind an `Arc`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use glint_common::protocol::{
    response_from_error, GlintError, Headers, Payload, Response, Result,
};
use glint_common::transport::codec;

use crate::user::User;

/// A request decoded for a specific method, with the payload already
/// validated into the handler's declared type.
#[derive(Debug, Clone)]
pub struct TypedRequest<P> {
    pub method_name: String,
    pub trace_id: String,
    pub payload: P,
    pub headers: Headers,
}

impl<P: DeserializeOwned> TypedRequest<P> {
    /// Decodes a raw frame and validates its payload against `P`.
    pub fn from_frame(raw: &[u8]) -> Result<Self> {
        let request = codec::decode_request(raw)?;
        let payload =
            serde_json::from_value(Value::Object(request.payload)).map_err(|err| {
                GlintError::Validation {
                    reason: err.to_string(),
                }
            })?;

        Ok(Self {
            method_name: request.method_name,
            trace_id: request.trace_id,
            payload,
            headers: request.headers,
        })
    }
}

impl<P> TypedRequest<P> {
    /// Builds a successful response answering this request.
    pub fn ok(&self, payload: Payload) -> Response {
        Response::new(self.method_name.clone(), self.trace_id.clone(), true, payload)
    }

    /// Builds a successful response from any serializable payload.
    pub fn ok_with<S: Serialize>(&self, payload: &S) -> Result<Response> {
        match serde_json::to_value(payload)? {
            Value::Object(payload) => Ok(self.ok(payload)),
            other => Err(GlintError::Validation {
                reason: format!("payload must be a JSON object, got {other}"),
            }),
        }
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;
type ErasedHandler = Arc<dyn Fn(&[u8], User) -> HandlerFuture + Send + Sync>;

/// Mapping from method name to handler.
///
/// Registration is explicit; registering the same name twice silently
/// overwrites the earlier handler.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, ErasedHandler>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method_name`.
    ///
    /// `P` is the method's declared payload type; frames that fail to decode
    /// into it are answered with a validation error. An `Err` escaping the
    /// handler is converted into a `method_internal_error` response carrying
    /// the decoded request's method name and trace id — this is the single
    /// catch-all boundary for handler failures.
    pub fn register<P, F, Fut>(&mut self, method_name: impl Into<String>, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(TypedRequest<P>, User) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |raw: &[u8], user: User| {
            let handler = Arc::clone(&handler);
            let decoded = TypedRequest::<P>::from_frame(raw);

            Box::pin(async move {
                let request = match decoded {
                    Ok(request) => request,
                    Err(err) => return response_from_error(&err, None),
                };

                let method_name = request.method_name.clone();
                let trace_id = request.trace_id.clone();

                match handler(request, user).await {
                    Ok(response) => response,
                    Err(err) => {
                        let internal = GlintError::MethodInternal {
                            reason: err.to_string(),
                        };
                        tracing::debug!("handler {method_name} failed: {err}");
                        Response::for_error(&internal, method_name, trace_id)
                    }
                }
            })
        });

        self.methods.insert(method_name.into(), erased);
    }

    /// Merges another table into this one; names present in both are taken
    /// from `other`.
    pub fn include(&mut self, other: MethodTable) {
        self.methods.extend(other.methods);
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Dispatches one raw frame.
    ///
    /// Every outcome is a response: frames whose method name cannot even be
    /// extracted get a context-free error response rather than being
    /// dropped.
    pub async fn handle(&self, raw: &[u8], user: User) -> Response {
        let method_name = match codec::find_method_name(raw) {
            Ok(method_name) => method_name,
            Err(err) => return response_from_error(&err, None),
        };

        let Some(handler) = self.methods.get(method_name) else {
            let err = GlintError::UnknownMethod(method_name.to_string());
            return response_from_error(&err, None);
        };

        handler(raw, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_common::protocol::{Request, ZERO_TRACE_ID};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct CreateTask {
        title: String,
    }

    #[derive(Deserialize)]
    struct Empty {}

    fn table() -> MethodTable {
        let mut methods = MethodTable::new();
        methods.register(
            "create_task",
            |request: TypedRequest<CreateTask>, _user: User| async move {
                let title = request.payload.title.clone();
                request.ok_with(&json!({"created": title}))
            },
        );
        methods.register(
            "broken",
            |_request: TypedRequest<Empty>, _user: User| async move {
                Err(GlintError::MethodInternal {
                    reason: "not implemented".into(),
                })
            },
        );
        methods
    }

    fn user() -> User {
        User::new("127.0.0.1:50000")
    }

    fn encode(request: &Request) -> Vec<u8> {
        codec::encode_request(request).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_invokes_registered_handler() {
        let request = Request::from_payload("create_task", &json!({"title": "Buy milk"})).unwrap();
        let response = table().handle(&encode(&request), user()).await;

        assert!(response.success);
        assert_eq!(response.method_name, "create_task");
        assert_eq!(response.trace_id, request.trace_id);
        assert_eq!(response.payload["created"], "Buy milk");
    }

    #[tokio::test]
    async fn test_unknown_method_regardless_of_payload() {
        let request = Request::from_payload("no_such_method", &json!({"title": "x"})).unwrap();
        let response = table().handle(&encode(&request), user()).await;

        assert!(!response.success);
        assert_eq!(response.payload["error_code"], "unknown_method");
        assert_eq!(response.payload["details"]["method_name"], "no_such_method");
        // The attempted name is diagnostics only; the response itself is
        // context-free.
        assert_eq!(response.method_name, "__warning");
        assert_eq!(response.trace_id, ZERO_TRACE_ID);
    }

    #[tokio::test]
    async fn test_unextractable_method_name_still_yields_a_response() {
        let response = table().handle(b"no braces at all", user()).await;

        assert!(!response.success);
        assert_eq!(response.payload["error_code"], "invalid_message_format");
        assert_eq!(response.method_name, "__warning");
        assert_eq!(response.trace_id, ZERO_TRACE_ID);
    }

    #[tokio::test]
    async fn test_payload_validation_failure() {
        // `title` is required by CreateTask.
        let request = Request::from_payload("create_task", &json!({"not_title": 1})).unwrap();
        let response = table().handle(&encode(&request), user()).await;

        assert!(!response.success);
        assert_eq!(response.payload["error_code"], "validation_error");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_internal_error_with_request_context() {
        let request = Request::from_payload("broken", &json!({})).unwrap();
        let response = table().handle(&encode(&request), user()).await;

        assert!(!response.success);
        assert_eq!(response.payload["error_code"], "method_internal_error");
        assert_eq!(response.method_name, "broken");
        assert_eq!(response.trace_id, request.trace_id);
    }

    #[tokio::test]
    async fn test_duplicate_registration_overwrites() {
        let mut methods = table();
        methods.register(
            "create_task",
            |request: TypedRequest<Empty>, _user: User| async move {
                request.ok_with(&json!({"replaced": true}))
            },
        );

        let request = Request::from_payload("create_task", &json!({})).unwrap();
        let response = methods.handle(&encode(&request), user()).await;
        assert!(response.success);
        assert_eq!(response.payload["replaced"], true);
    }

    #[tokio::test]
    async fn test_include_merges_tables() {
        let mut base = MethodTable::new();
        base.include(table());
        assert!(base.method_names().any(|name| name == "create_task"));

        let request = Request::from_payload("broken", &json!({})).unwrap();
        let response = base.handle(&encode(&request), user()).await;
        assert_eq!(response.payload["error_code"], "method_internal_error");
    }
}
