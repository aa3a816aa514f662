use thiserror::Error;

/// Error taxonomy for the state store. Every variant is stable across
/// reloads: callers match on variant, not message text.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("link not found: {0}")]
    LinkNotFound(String),

    #[error("export not found: {0}")]
    ExportNotFound(String),

    #[error("event not found: {0}")]
    EventNotFound(String),

    #[error("changeset not found: {0}")]
    ChangesetNotFound(String),

    #[error("validation not found: {0}")]
    ValidationNotFound(String),

    /// An in-memory referential invariant was violated (e.g. a resource
    /// whose owning instance has vanished). The operation that observed
    /// this is aborted; no mutation is performed.
    #[error("malformed state: {0}")]
    MalformedState(String),

    /// An on-disk index points at a chunk position that does not exist.
    #[error("malformed state file: {0}")]
    MalformedStateFile(String),

    #[error("event partition size would exceed the configured maximum ({size} > {max})")]
    MaxEventPartitionSizeExceeded { size: u64, max: u64 },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("filesystem error: {0}")]
    FilesystemError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
