use std::process::{ExitCode, Termination};

use axum::extract::rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use error_stack::Report;
use tracing::{debug, error, warn};

use kernel::{reject, ErrorReason, KernelError, ValidationErrors};

use crate::response::Envelope;

const INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Debug)]
pub struct StackTrace(Report<KernelError>);

impl From<Report<KernelError>> for StackTrace {
    fn from(e: Report<KernelError>) -> Self {
        StackTrace(e)
    }
}

impl Termination for StackTrace {
    fn report(self) -> ExitCode {
        self.0.report()
    }
}

#[derive(Debug)]
pub struct ErrorStatus(Report<KernelError>);

impl From<Report<KernelError>> for ErrorStatus {
    fn from(e: Report<KernelError>) -> Self {
        ErrorStatus(e)
    }
}

/// Extractor rejections become validation failures carrying axum's own explanation.
fn malformed(explanation: String) -> ErrorStatus {
    ErrorStatus(reject(KernelError::Validation, explanation))
}

impl From<JsonRejection> for ErrorStatus {
    fn from(rejection: JsonRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ErrorStatus {
    fn from(rejection: QueryRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<PathRejection> for ErrorStatus {
    fn from(rejection: PathRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<BytesRejection> for ErrorStatus {
    fn from(rejection: BytesRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl ErrorStatus {
    fn status_code(&self) -> StatusCode {
        match self.0.current_context() {
            KernelError::Validation | KernelError::Conflict => StatusCode::BAD_REQUEST,
            KernelError::NotFound => StatusCode::NOT_FOUND,
            KernelError::Concurrency => StatusCode::CONFLICT,
            KernelError::Timeout => StatusCode::REQUEST_TIMEOUT,
            KernelError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal details never leave the process; only attached reasons do.
    fn envelope(&self) -> Envelope<()> {
        let report = &self.0;
        let context = report.current_context();
        match context {
            KernelError::Internal => {
                error!("{report:?}");
                Envelope::failure(INTERNAL_MESSAGE, None)
            }
            KernelError::Concurrency | KernelError::Timeout => {
                warn!("{report:?}");
                Envelope::failure(context.to_string(), None)
            }
            _ => {
                debug!("{report:?}");
                let message = report
                    .downcast_ref::<ErrorReason>()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| context.to_string());
                let errors = report
                    .downcast_ref::<ValidationErrors>()
                    .map(|errors| errors.errors().to_vec());
                Envelope::failure(message, errors)
            }
        }
    }
}

impl IntoResponse for ErrorStatus {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}
