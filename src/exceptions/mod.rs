//! Custom exception-handler lookup.
//!
//! When request handling fails, the folder that was being served may carry
//! a reserved `exceptions.hl` script customizing the error response. The
//! resolver searches upward from the failing path's immediate parent toward
//! the virtual root (exclusive), executes the nearest handler it finds with
//! the structured failure context, and builds the response from whatever
//! the handler left in that context. Without a handler the response is a
//! generic, non-identifying message, unless the failure was explicitly
//! flagged public.
//!
//! Lookups are never cached: every failure re-walks the ancestor chain.
//! Failures are assumed rare relative to request volume.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::{RootResolver, EVALUATE_SLOT, EXCEPTIONS_FILE};
use crate::error::MagicError;
use crate::files::FileService;
use crate::script::{Node, ScriptParser};
use crate::slots::SlotRegistry;

/// Message returned when the failure is not public and no handler script
/// chose to say more.
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred";

/// Structured failure context handed to handler scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Human-readable failure description.
    pub message: String,
    /// HTTP status the response should carry.
    pub status: u16,
    /// Whether the message and field may be exposed to clients verbatim.
    pub public: bool,
    /// Optional name of the input field that caused the failure.
    pub field: Option<String>,
}

impl Fault {
    /// Create a fault with no field attached.
    pub fn new(message: impl Into<String>, status: u16, public: bool) -> Self {
        Self {
            message: message.into(),
            status,
            public,
            field: None,
        }
    }

    /// Attach the offending field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl From<&MagicError> for Fault {
    fn from(err: &MagicError) -> Self {
        match err {
            MagicError::Script {
                message,
                status,
                public,
                field,
            } => Fault {
                message: message.clone(),
                status: *status,
                public: *public,
                field: field.clone(),
            },
            other => Fault::new(other.to_string(), 500, false),
        }
    }
}

/// Response produced for a failed request.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON payload (`message`, optional `field`).
    pub payload: Value,
}

impl ErrorResponse {
    fn build(message: &str, status: u16, field: Option<&str>) -> Self {
        let mut payload = json!({ "message": message });
        if let Some(field) = field {
            payload["field"] = json!(field);
        }
        Self { status, payload }
    }
}

/// Resolves failures to responses via ancestor `exceptions.hl` scripts.
pub struct ExceptionResolver<F: FileService> {
    files: F,
    parser: Arc<dyn ScriptParser>,
    registry: Arc<SlotRegistry>,
    roots: RootResolver,
}

impl<F: FileService> ExceptionResolver<F> {
    /// Create a resolver over the given collaborators.
    pub fn new(
        files: F,
        parser: Arc<dyn ScriptParser>,
        registry: Arc<SlotRegistry>,
        roots: RootResolver,
    ) -> Self {
        Self {
            files,
            parser,
            registry,
            roots,
        }
    }

    /// Resolve one failure that occurred while serving `virtual_path`.
    ///
    /// Exactly one handler script executes per failure, the nearest
    /// ancestor's. A handler that itself fails is logged and ignored, and
    /// the default response applies as if no handler existed.
    pub async fn resolve(&self, virtual_path: &str, fault: &Fault) -> ErrorResponse {
        for ancestor in ancestors(virtual_path) {
            let candidate = self.roots.resolve(&ancestor).join(EXCEPTIONS_FILE);
            if !self.files.exists(&candidate) {
                continue;
            }

            debug!(handler = %candidate.display(), path = virtual_path, "Running exception handler");
            match self.run_handler(&candidate, virtual_path, fault).await {
                Ok(response) => return response,
                Err(err) => {
                    error!(
                        handler = %candidate.display(),
                        error = %err,
                        "Exception handler failed, using default response"
                    );
                    return default_response(fault);
                }
            }
        }

        default_response(fault)
    }

    async fn run_handler(
        &self,
        handler: &std::path::Path,
        virtual_path: &str,
        fault: &Fault,
    ) -> crate::error::Result<ErrorResponse> {
        let text = self.files.read_to_string(handler)?;
        let mut root = self.parser.parse(&text)?;

        // Failure context, appended after the handler's own instructions.
        // The handler rewrites these children; the response is read back
        // from them after execution.
        root.push(Node::with_value("message", fault.message.clone()));
        root.push(Node::with_value("path", virtual_path));
        root.push(Node::with_value("status", fault.status));
        root.push(Node::with_value("public", fault.public));
        if let Some(field) = &fault.field {
            root.push(Node::with_value("field", field.clone()));
        }

        self.registry.signal(EVALUATE_SLOT, &mut root).await?;

        let message = root.child_str("message").unwrap_or(GENERIC_MESSAGE).to_string();
        let status = root.get("status").and_then(Node::value_u16).unwrap_or(500);
        let field = root.child_str("field").map(str::to_string);
        Ok(ErrorResponse::build(&message, status, field.as_deref()))
    }
}

/// Ancestor directories of a virtual path, nearest first, excluding the
/// virtual root itself: `/modules/invoices/create` yields
/// `/modules/invoices` then `/modules`.
fn ancestors(virtual_path: &str) -> Vec<String> {
    let segments: Vec<&str> = virtual_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return Vec::new();
    }

    (1..segments.len())
        .rev()
        .map(|depth| format!("/{}", segments[..depth].join("/")))
        .collect()
}

/// Response when no handler ran: generic message for non-public faults,
/// verbatim message and field for public ones. An explicit fault status is
/// preserved either way.
fn default_response(fault: &Fault) -> ErrorResponse {
    if fault.public {
        ErrorResponse::build(&fault.message, fault.status, fault.field.as_deref())
    } else {
        ErrorResponse::build(GENERIC_MESSAGE, fault.status, None)
    }
}
