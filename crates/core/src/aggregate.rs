//! Aggregate root trait and optimistic concurrency expectations.

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

/// Aggregate root marker + minimal interface.
///
/// An aggregate is an entity whose state changes are versioned, so that a
/// writer can detect that another writer changed the same record in between
/// its read and its write.
pub trait AggregateRoot: Entity {
    /// Monotonically increasing version of the aggregate's state.
    ///
    /// Incremented once per applied state change; a freshly persisted
    /// aggregate is at version 1.
    fn version(&self) -> u64;
}

/// Version a writer read before deciding; the write only lands if the stored
/// aggregate is still at it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpectedVersion(pub u64);

impl ExpectedVersion {
    pub fn of<A: AggregateRoot>(aggregate: &A) -> Self {
        Self(aggregate.version())
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.0 == actual {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {}, actual: {actual})",
                self.0
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_is_a_conflict() {
        assert!(ExpectedVersion(3).check(3).is_ok());
        match ExpectedVersion(2).check(3) {
            Err(DomainError::Conflict(msg)) => assert!(msg.contains("expected: 2, actual: 3")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
