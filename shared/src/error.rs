use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("{0}")]
    InvalidInput(String),
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    KeyValueStoreError(#[from] redis::RedisError),
    #[error("{0}")]
    BcryptError(#[from] bcrypt::BcryptError),
    #[error("{0}")]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("{0}")]
    ExternalServiceError(String),
    #[error("ログインに失敗しました")]
    UnauthenticatedError,
    #[error("認可情報が誤っています")]
    UnauthorizedError,
    #[error("許可されていない操作です")]
    ForbiddenOperation,
    #[error("{0}")]
    ConversionEntityError(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Coarse error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ValidationError,
    NotFoundError,
    RemoteError,
    UnauthenticatedError,
    ForbiddenError,
    UnexpectedError,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::UnprocessableEntity(_)
            | AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::ConvertToUuidError(_) => ErrorKind::ValidationError,
            AppError::EntityNotFound(_) => ErrorKind::NotFoundError,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::KeyValueStoreError(_)
            | AppError::ExternalServiceError(_) => ErrorKind::RemoteError,
            AppError::UnauthenticatedError | AppError::UnauthorizedError => {
                ErrorKind::UnauthenticatedError
            }
            AppError::ForbiddenOperation => ErrorKind::ForbiddenError,
            AppError::BcryptError(_)
            | AppError::ConversionEntityError(_)
            | AppError::Unexpected(_) => ErrorKind::UnexpectedError,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::ConvertToUuidError(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthenticatedError | AppError::UnauthorizedError => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ForbiddenOperation => StatusCode::FORBIDDEN,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::KeyValueStoreError(_)
            | AppError::BcryptError(_)
            | AppError::ConversionEntityError(_)
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
        } else {
            tracing::debug!(error.message = %self, "request rejected");
        }
        let body = ErrorResponse {
            error: self.kind(),
            message: self.to_string(),
        };
        (status_code, Json(body)).into_response()
    }
}

// リクエストの読み取りに失敗した場合も同じ形式のエラーとして返す
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
