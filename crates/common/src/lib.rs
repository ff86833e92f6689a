pub mod errors;
pub mod structured_logging;

pub use structured_logging::{
    init_structured_logging,
    ExecutionContext,
    LoggingConfig,
    OperationTimer,
    RequestContext,
    StructuredLogEntry,
};

pub use errors::{
    ConfigError, ConfigResult,
    DocgenError, DocgenResult,
    FileSystemError, FileSystemResult,
    LLMError, LLMResult,
    RecoveryStrategy,
};
