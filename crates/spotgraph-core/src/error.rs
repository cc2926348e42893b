//! Error types for spotgraph-core.
//!
//! Failures fall into three families:
//!
//! - **Consistency** errors are contract violations by the caller (double free,
//!   stale handle, removing a vertex that still has edges). The operation is
//!   aborted before any pool, bimap, listener or journal state changes.
//! - **Configuration** errors name the offending feature key or setting.
//! - **I/O** errors wrap the underlying cause with the persistence section
//!   that failed.

use thiserror::Error;

use crate::config::ConfigError;
use crate::handle::ElementKind;
use crate::idmap::PersistentId;
use crate::persistence::Section;

/// Engine error types.
#[derive(Error, Debug)]
pub enum Error {
    /// A pool slot was freed while already on the free list.
    #[error("double free of {kind} slot {slot}")]
    DoubleFree {
        /// Record kind of the pool.
        kind: ElementKind,
        /// Raw slot index.
        slot: u32,
    },

    /// A slot index beyond the pool capacity was used.
    #[error("{kind} slot {slot} is out of bounds (capacity {capacity})")]
    SlotOutOfBounds {
        /// Record kind of the pool.
        kind: ElementKind,
        /// Raw slot index.
        slot: u32,
        /// Current pool capacity in records.
        capacity: usize,
    },

    /// A pool cannot address more records.
    #[error("{0} pool exhausted")]
    PoolExhausted(ElementKind),

    /// A handle refers to a slot that was freed (and possibly reused) since
    /// the handle was obtained.
    #[error("stale {kind} handle for slot {slot} (generation {generation}, current {current})")]
    StaleHandle {
        /// Record kind of the handle.
        kind: ElementKind,
        /// Raw slot index.
        slot: u32,
        /// Generation carried by the handle.
        generation: u32,
        /// Generation currently stored for the slot.
        current: u32,
    },

    /// The requested mutation would leave the graph inconsistent.
    #[error("illegal graph state: {0}")]
    IllegalGraphState(String),

    /// Edges from a vertex to itself are not supported.
    #[error("self-loop on vertex {0} is not supported")]
    SelfLoop(PersistentId),

    /// A persistent id is already bound to another live element.
    #[error("{kind} id {id} is already bound")]
    IdCollision {
        /// Element kind of the bimap.
        kind: ElementKind,
        /// Colliding id.
        id: PersistentId,
    },

    /// The undo journal references elements that no longer exist.
    #[error("undo journal corrupted: {0}")]
    JournalCorrupted(String),

    /// No feature specification is registered for the key.
    #[error("no feature registered for key '{0}'")]
    FeatureNotRegistered(String),

    /// The feature is registered but has never been declared on the model.
    #[error("feature '{0}' has not been computed on this model")]
    FeatureNotDeclared(String),

    /// The feature has no serializer, so it cannot be written or read.
    #[error("no serializer registered for feature '{0}'")]
    MissingSerializer(String),

    /// A feature with the same key is already registered.
    #[error("feature '{0}' is already registered")]
    DuplicateFeature(String),

    /// The feature specification is unusable.
    #[error("invalid feature specification '{key}': {reason}")]
    InvalidFeatureSpec {
        /// Key of the rejected specification.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A project stream references an id that does not exist in the rebuilt graph.
    #[error("unknown {kind} id {id} in {section} section")]
    UnknownPersistentId {
        /// Section being read.
        section: Section,
        /// Element kind of the id.
        kind: ElementKind,
        /// Unresolved id.
        id: PersistentId,
    },

    /// Reading or writing a project section failed.
    #[error("failed to process {section} section: {source}")]
    Persistence {
        /// Section being processed.
        section: Section,
        /// Underlying cause.
        #[source]
        source: Box<Error>,
    },

    /// The stream is not a project file or is corrupted.
    #[error("corrupted project stream: {0}")]
    Corrupted(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Binary encoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps `source` with the persistence section that failed.
    pub(crate) fn in_section(section: Section, source: impl Into<Error>) -> Self {
        Error::Persistence {
            section,
            source: Box::new(source.into()),
        }
    }

    /// Returns true for programmer-contract violations.
    #[must_use]
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            Error::DoubleFree { .. }
                | Error::SlotOutOfBounds { .. }
                | Error::StaleHandle { .. }
                | Error::IllegalGraphState(_)
                | Error::SelfLoop(_)
                | Error::IdCollision { .. }
                | Error::JournalCorrupted(_)
        )
    }

    /// Returns true for configuration problems (missing or invalid features, bad settings).
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::FeatureNotRegistered(_)
                | Error::FeatureNotDeclared(_)
                | Error::MissingSerializer(_)
                | Error::DuplicateFeature(_)
                | Error::InvalidFeatureSpec { .. }
                | Error::Config(_)
        )
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
