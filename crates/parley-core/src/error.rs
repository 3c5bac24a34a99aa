//! Error types for parley operations.
//!
//! Every failure the engine can observe maps to a [`ParleyError`] variant with a
//! stable [`ErrorCode`]. Most of them are recovered locally (an unreadable
//! ruleset becomes an empty one, a failed embedding skips the semantic tier);
//! only infrastructure faults such as a corrupted embedding cache escape
//! [`crate::engine::ResolutionEngine::resolve`].

use thiserror::Error;

/// Result type alias for parley operations.
pub type ParleyResult<T> = Result<T, ParleyError>;

/// Main error type for all parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    /// The ruleset source could not be read or parsed.
    #[error("Ruleset load error: {message}")]
    RulesetLoad {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding generation failed or no embedder is available.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The keyword embedding cache is inconsistent with the embedder.
    #[error("Embedding cache corrupted: {message}")]
    CacheCorrupted { message: String, code: ErrorCode },

    /// Authentication with an embedding provider failed.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rate limit exceeded at an embedding provider.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        code: ErrorCode,
        retry_after: Option<u64>,
    },

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Ruleset (RULE_xxx)
    RuleUnreadable,
    RuleInvalidFormat,

    // Embedding (EMB_xxx)
    EmbConnectionFailed,
    EmbGenerationFailed,
    EmbInvalidVector,

    // Cache (CACHE_xxx)
    CacheDimensionMismatch,

    // Authentication (AUTH_xxx)
    AuthInvalidKey,

    // Rate Limit (RATE_xxx)
    RateLimitExceeded,

    // Network (NET_xxx)
    NetTimeout,
    NetConnectionFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,

    // Errors without a dedicated code
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RuleUnreadable => "RULE_001",
            ErrorCode::RuleInvalidFormat => "RULE_002",
            ErrorCode::EmbConnectionFailed => "EMB_001",
            ErrorCode::EmbGenerationFailed => "EMB_002",
            ErrorCode::EmbInvalidVector => "EMB_003",
            ErrorCode::CacheDimensionMismatch => "CACHE_001",
            ErrorCode::AuthInvalidKey => "AUTH_001",
            ErrorCode::RateLimitExceeded => "RATE_001",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl ParleyError {
    /// Create a ruleset error for a source that could not be read.
    pub fn ruleset_unreadable(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RulesetLoad {
            message: message.into(),
            code: ErrorCode::RuleUnreadable,
            source: Some(Box::new(source)),
        }
    }

    /// Create a ruleset error for content that could not be parsed.
    pub fn ruleset_invalid(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RulesetLoad {
            message: message.into(),
            code: ErrorCode::RuleInvalidFormat,
            source: Some(Box::new(source)),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create an embedding error for a vector that cannot be used (empty, zero norm, wrong size).
    pub fn invalid_vector(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbInvalidVector,
            source: None,
        }
    }

    /// Create a cache corruption error for a vector dimension mismatch.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::CacheCorrupted {
            message: format!(
                "cached keyword vectors have dimension {} but the embedder returned {}",
                expected, actual
            ),
            code: ErrorCode::CacheDimensionMismatch,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RulesetLoad { code, .. } => *code,
            Self::Embedding { code, .. } => *code,
            Self::CacheCorrupted { code, .. } => *code,
            Self::Authentication { code, .. } => *code,
            Self::RateLimit { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether the error means the embedding provider is unreachable or
    /// refused the call, as opposed to answering with something unusable.
    ///
    /// The semantic matcher logs these as warnings and anything else as an
    /// error; both degrade to "no match".
    pub fn is_embedding_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Embedding { .. }
                | Self::Authentication { .. }
                | Self::RateLimit { .. }
                | Self::Network { .. }
                | Self::Configuration(_)
        )
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::RulesetLoad { .. } => {
                Some("Please check the ruleset path and that the file is valid JSON, TOML or YAML")
            }
            Self::Embedding { .. } => Some("Please check your embedding provider configuration"),
            Self::CacheCorrupted { .. } => Some(
                "Reload the ruleset after changing the embedding model so keyword vectors are rebuilt",
            ),
            Self::Authentication { .. } => {
                Some("Please check your API key and authentication credentials")
            }
            Self::RateLimit { .. } => Some("Please wait before making more requests"),
            _ => None,
        }
    }

    /// Convert from HTTP status code (for provider errors).
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Authentication {
                message: body.to_string(),
                code: ErrorCode::AuthInvalidKey,
                source: None,
            },
            408 | 504 => Self::Network {
                message: body.to_string(),
                code: ErrorCode::NetTimeout,
                source: None,
            },
            429 => Self::RateLimit {
                message: body.to_string(),
                code: ErrorCode::RateLimitExceeded,
                retry_after: None,
            },
            400..=499 => Self::Embedding {
                message: format!("HTTP {}: {}", status, body),
                code: ErrorCode::EmbGenerationFailed,
                source: None,
            },
            _ => Self::Embedding {
                message: format!("HTTP {}: {}", status, body),
                code: ErrorCode::EmbConnectionFailed,
                source: None,
            },
        }
    }
}
