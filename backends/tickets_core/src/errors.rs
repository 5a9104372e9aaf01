use crate::TicketId;

/// `PoolError` lists the expected, recoverable outcomes of pool operations.
///
/// None of these indicate a corrupted pool: a blocking call that times out
/// or a rejected cancel leaves the pool exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The blocking precondition (free slot / unsold ticket) did not hold
    /// within the pool's bounded wait.
    Timeout,

    /// The pool was closed before or while the caller waited.
    Closed,

    NotFound(TicketId),

    /// The ticket was created by another pool, or this pool does not hold it.
    NotAMember(TicketId),

    NotSold(TicketId),

    Duplicate(TicketId),

    InvalidCapacity,

    UnknownStrategy(String),
}

impl PoolError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, PoolError::Timeout)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, PoolError::Closed)
    }
}

impl core::error::Error for PoolError {}

impl core::fmt::Display for PoolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PoolError::Timeout => write!(f, "PoolError::Timeout"),
            PoolError::Closed => write!(f, "PoolError::Closed"),
            PoolError::NotFound(id) => write!(f, "PoolError::NotFound(ticket {id})"),
            PoolError::NotAMember(id) => write!(f, "PoolError::NotAMember(ticket {id})"),
            PoolError::NotSold(id) => write!(f, "PoolError::NotSold(ticket {id})"),
            PoolError::Duplicate(id) => write!(f, "PoolError::Duplicate(ticket {id})"),
            PoolError::InvalidCapacity => write!(f, "PoolError::InvalidCapacity(capacity must be > 0)"),
            PoolError::UnknownStrategy(name) => write!(f, "PoolError::UnknownStrategy({name})"),
        }
    }
}

pub type PoolResult<T> = std::result::Result<T, PoolError>;
