use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use ticketpro_core::CoreError;
use ticketpro_directory::DirectoryError;
use ticketpro_inventory::InventoryError;
use ticketpro_ledger::LedgerError;
use ticketpro_ops::OpsError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UnprocessableError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnprocessableError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let msg = err.to_string();
        match err {
            CoreError::ValidationError(_) => AppError::ValidationError(msg),
            CoreError::NotFound { .. } => AppError::NotFoundError(msg),
            CoreError::Conflict(_) => AppError::ConflictError(msg),
            CoreError::Forbidden { .. } => AppError::AuthorizationError(msg),
            CoreError::StorageError(_) | CoreError::InternalError(_) => AppError::InternalServerError(msg),
        }
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Core(core) => core.into(),
            InventoryError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            InventoryError::InvalidTransition { .. } => AppError::ConflictError(err.to_string()),
            InventoryError::IncompleteForm(_) => AppError::ValidationError(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Core(core) => core.into(),
            LedgerError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            LedgerError::Overpayment { .. } => AppError::UnprocessableError(err.to_string()),
            LedgerError::InvalidAmount(_) => AppError::ValidationError(err.to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Core(core) => core.into(),
            DirectoryError::NotFound { .. } => AppError::NotFoundError(err.to_string()),
            DirectoryError::Duplicate { .. } => AppError::ConflictError(err.to_string()),
            DirectoryError::CommissionExceeded { .. } => AppError::UnprocessableError(err.to_string()),
            DirectoryError::Inactive(_) => AppError::AuthorizationError(err.to_string()),
        }
    }
}

impl From<OpsError> for AppError {
    fn from(err: OpsError) -> Self {
        match err {
            OpsError::Core(core) => core.into(),
            OpsError::NotificationNotFound(_) => AppError::NotFoundError(err.to_string()),
            OpsError::BackupInProgress | OpsError::NoBackupRunning => AppError::ConflictError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketpro_core::{Permission, Role};
    use ticketpro_inventory::LockStatus;

    #[test]
    fn test_status_codes() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (
                InventoryError::InvalidTransition {
                    from: LockStatus::Sold,
                    to: LockStatus::Locked,
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                InventoryError::IncompleteForm("agent name is required".to_string()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::Overpayment {
                    amount: 10,
                    remaining: 5,
                }
                .into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CoreError::Forbidden {
                    role: Role::Staff,
                    permission: Permission::UnlockTicket,
                }
                .into(),
                StatusCode::FORBIDDEN,
            ),
            (OpsError::BackupInProgress.into(), StatusCode::CONFLICT),
            (
                CoreError::StorageError("connection reset".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
