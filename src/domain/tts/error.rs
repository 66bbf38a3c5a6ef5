use crate::domain::voice::{DenyReason, Provider};
use crate::error::AppError;
use crate::infrastructure::cache::CacheError;
use crate::infrastructure::repositories::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    #[error("permission denied: {0}")]
    PermissionDenied(DenyReason),
    #[error("invalid voice: {0}")]
    InvalidVoice(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("text too long: {length} characters, limit {limit}")]
    TextTooLong { length: usize, limit: usize },
    #[error("{provider} upstream error (status {status:?}): {body}")]
    Upstream {
        provider: Provider,
        status: Option<u16>,
        body: String,
    },
    #[error("{provider} timed out")]
    Timeout { provider: Provider },
    #[error("{provider} synthesis cancelled")]
    Cancelled { provider: Provider },
    /// Cache failure on the admin cache routes. Synthesis treats cache errors as misses.
    #[error("cache io error: {0}")]
    CacheIo(String),
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<ProviderError> for TtsServiceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Upstream {
                provider,
                status,
                body,
            } => TtsServiceError::Upstream {
                provider,
                status,
                body,
            },
            ProviderError::Timeout { provider } => TtsServiceError::Timeout { provider },
            ProviderError::Cancelled { provider } => TtsServiceError::Cancelled { provider },
        }
    }
}

impl From<CacheError> for TtsServiceError {
    fn from(err: CacheError) -> Self {
        TtsServiceError::CacheIo(err.to_string())
    }
}

/// Language used for user-facing error messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    /// Pick a locale from an `Accept-Language` header value
    pub fn from_accept_language(header: Option<&str>) -> Self {
        let Some(header) = header else {
            return Locale::En;
        };

        for tag in header.split(',') {
            let lang = tag.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            if lang.starts_with("vi") {
                return Locale::Vi;
            }
            if lang.starts_with("en") {
                return Locale::En;
            }
        }
        Locale::En
    }
}

impl TtsServiceError {
    /// Generic message safe to show to end users. Diagnostic detail stays in logs.
    pub fn user_message(&self, locale: Locale) -> String {
        use TtsServiceError::*;

        match (self, locale) {
            (PermissionDenied(DenyReason::RequiresLogin), Locale::En) => {
                "Please sign in to use this voice.".to_string()
            }
            (PermissionDenied(DenyReason::RequiresLogin), Locale::Vi) => {
                "Vui lòng đăng nhập để sử dụng giọng đọc này.".to_string()
            }
            (PermissionDenied(DenyReason::RequiresUpgrade(tier)), Locale::En) => {
                format!("This voice requires the {} plan. Please upgrade to use it.", tier)
            }
            (PermissionDenied(DenyReason::RequiresUpgrade(tier)), Locale::Vi) => {
                format!("Giọng đọc này yêu cầu gói {}. Vui lòng nâng cấp để sử dụng.", tier)
            }
            (PermissionDenied(DenyReason::InvalidVoice) | InvalidVoice(_), Locale::En) => {
                "The selected voice is not available.".to_string()
            }
            (PermissionDenied(DenyReason::InvalidVoice) | InvalidVoice(_), Locale::Vi) => {
                "Giọng đọc đã chọn không khả dụng.".to_string()
            }
            (Validation(msg), Locale::En) => format!("Invalid request: {}", msg),
            (Validation(msg), Locale::Vi) => format!("Yêu cầu không hợp lệ: {}", msg),
            (TextTooLong { limit, .. }, Locale::En) => {
                format!("Text is too long. Your plan allows up to {} characters.", limit)
            }
            (TextTooLong { limit, .. }, Locale::Vi) => {
                format!("Văn bản quá dài. Gói của bạn cho phép tối đa {} ký tự.", limit)
            }
            (Upstream { .. } | Timeout { .. } | Cancelled { .. }, Locale::En) => {
                "Speech synthesis is temporarily unavailable. Please try again in a few moments."
                    .to_string()
            }
            (Upstream { .. } | Timeout { .. } | Cancelled { .. }, Locale::Vi) => {
                "Dịch vụ chuyển văn bản thành giọng nói tạm thời không khả dụng. Vui lòng thử lại sau ít phút."
                    .to_string()
            }
            (CacheIo(_) | Dependency(_), Locale::En) => {
                "Something went wrong. Please try again.".to_string()
            }
            (CacheIo(_) | Dependency(_), Locale::Vi) => {
                "Đã xảy ra lỗi. Vui lòng thử lại.".to_string()
            }
        }
    }

    /// Convert into the HTTP error, logging the full diagnostic detail
    pub fn into_app_error(self, locale: Locale) -> AppError {
        let message = self.user_message(locale);

        match &self {
            TtsServiceError::Upstream {
                provider,
                status,
                body,
            } => {
                tracing::error!(provider = %provider, status = ?status, body = %body, "Synthesis failed upstream");
            }
            TtsServiceError::Timeout { provider } | TtsServiceError::Cancelled { provider } => {
                tracing::error!(provider = %provider, error = %self, "Synthesis did not complete");
            }
            TtsServiceError::CacheIo(_) | TtsServiceError::Dependency(_) => {
                tracing::error!(error = %self, "Request failed on a backing service");
            }
            _ => {
                tracing::warn!(error = %self, "Synthesis request rejected");
            }
        }

        match self {
            TtsServiceError::PermissionDenied(DenyReason::RequiresLogin) => {
                AppError::Unauthorized(message)
            }
            TtsServiceError::PermissionDenied(DenyReason::RequiresUpgrade(_)) => {
                AppError::Forbidden(message)
            }
            TtsServiceError::PermissionDenied(DenyReason::InvalidVoice)
            | TtsServiceError::InvalidVoice(_)
            | TtsServiceError::Validation(_) => AppError::BadRequest(message),
            TtsServiceError::TextTooLong { .. } => AppError::PayloadTooLarge(message),
            TtsServiceError::Upstream { .. } => AppError::ExternalService(message),
            TtsServiceError::Timeout { .. } => AppError::GatewayTimeout(message),
            TtsServiceError::Cancelled { .. } => AppError::ServiceUnavailable(message),
            TtsServiceError::CacheIo(_) | TtsServiceError::Dependency(_) => {
                AppError::Internal(message)
            }
        }
    }
}

impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        err.into_app_error(Locale::default())
    }
}
