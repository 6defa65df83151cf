//! Field access strategies
//!
//! A schema reads and writes fields through a [`FieldAccessor`]. Two strategies
//! exist:
//!
//! - [`DirectAccess`] - accessor functions, available when the field is visible
//!   to whoever builds the descriptor
//! - [`FieldOffset`] - typed byte offset into the message layout
//!
//! A descriptor carries [`Candidates`] (whichever handles could be built for
//! the field). When the schema is created, [`AccessPolicy::select`] picks one
//! strategy per field and the result is frozen into an [`Access`].
//!
//! # Selection Order
//!
//! 1. Offset, if configured as preferred, supported, and available
//! 2. Direct, if available
//! 3. Offset, if supported and available
//! 4. Otherwise the schema cannot be built ([`SchemaError::AccessDenied`])

mod direct;
mod offset;

use std::fmt;

use bitflags::bitflags;
use tracing::{trace, warn};

use crate::error::{SchemaError, SchemaResult};

pub use direct::DirectAccess;
pub use offset::FieldOffset;

/// Typed read/write access to one field of a message
pub trait FieldAccessor<M, T> {
    /// Borrow the field
    fn get<'a>(&self, message: &'a M) -> &'a T;

    /// Borrow the field mutably
    fn get_mut<'a>(&self, message: &'a mut M) -> &'a mut T;

    /// Replace the field's value
    #[inline]
    fn put(&self, message: &mut M, value: T) {
        *self.get_mut(message) = value;
    }
}

bitflags! {
    /// Access handles available for a field
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessSupport: u8 {
        /// Accessor functions exist
        const DIRECT = 0x01;
        /// A typed offset exists
        const OFFSET = 0x02;
    }
}

/// Strategy chosen for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessStrategy {
    Direct,
    Offset,
}

/// Rules for picking an access strategy per field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Use offset access even when a direct accessor exists
    pub prefer_offset: bool,
    /// Whether offset access may be used at all
    pub offset_supported: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            prefer_offset: false,
            offset_supported: true,
        }
    }
}

impl AccessPolicy {
    /// Pick a strategy for a field with the given handles
    ///
    /// Returns `None` when no strategy can reach the field.
    pub fn select(&self, support: AccessSupport) -> Option<AccessStrategy> {
        let offset = self.offset_supported && support.contains(AccessSupport::OFFSET);

        if self.prefer_offset && offset {
            Some(AccessStrategy::Offset)
        } else if support.contains(AccessSupport::DIRECT) {
            Some(AccessStrategy::Direct)
        } else if offset {
            Some(AccessStrategy::Offset)
        } else {
            None
        }
    }
}

/// Access handles that could be used for a field, before selection
pub struct Candidates<M, T> {
    direct: Option<DirectAccess<M, T>>,
    offset: Option<FieldOffset<M, T>>,
}

impl<M, T> Candidates<M, T> {
    /// Candidates with only a direct accessor
    pub const fn from_direct(direct: DirectAccess<M, T>) -> Self {
        Self {
            direct: Some(direct),
            offset: None,
        }
    }

    /// Candidates with only an offset handle
    pub const fn from_offset(offset: FieldOffset<M, T>) -> Self {
        Self {
            direct: None,
            offset: Some(offset),
        }
    }

    /// Merge two candidate sets, keeping `self`'s handles where both exist
    ///
    /// ```ignore
    /// let balance = direct!(Account, balance).or(offset!(Account, balance: i64));
    /// ```
    pub fn or(self, other: Self) -> Self {
        Self {
            direct: self.direct.or(other.direct),
            offset: self.offset.or(other.offset),
        }
    }

    /// Which handles are present
    pub fn support(&self) -> AccessSupport {
        let mut support = AccessSupport::empty();
        if self.direct.is_some() {
            support |= AccessSupport::DIRECT;
        }
        if self.offset.is_some() {
            support |= AccessSupport::OFFSET;
        }
        support
    }

    /// Apply the policy and freeze the chosen handle
    ///
    /// # Arguments
    /// * `policy` - Selection rules
    /// * `message` - Message name, for errors and logs
    /// * `field` - Field name, for errors and logs
    pub fn resolve(
        self,
        policy: &AccessPolicy,
        message: &'static str,
        field: &'static str,
    ) -> SchemaResult<Access<M, T>> {
        let strategy = policy.select(self.support());

        let access = match (strategy, self.direct, self.offset) {
            (Some(AccessStrategy::Direct), Some(direct), _) => Access::Direct(direct),
            (Some(AccessStrategy::Offset), direct, Some(offset)) => {
                if direct.is_none() {
                    warn!(
                        "{}.{} has no direct accessor, falling back to offset access",
                        message, field
                    );
                }
                Access::Offset(offset)
            }
            _ => return Err(SchemaError::AccessDenied { message, field }),
        };

        trace!("{}.{}: {:?} access", message, field, access.strategy());
        Ok(access)
    }
}

impl<M, T> fmt::Debug for Candidates<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidates")
            .field("support", &self.support())
            .finish()
    }
}

/// The access strategy frozen for one field
pub enum Access<M, T> {
    Direct(DirectAccess<M, T>),
    Offset(FieldOffset<M, T>),
}

impl<M, T> Access<M, T> {
    /// Strategy in use
    pub fn strategy(&self) -> AccessStrategy {
        match self {
            Access::Direct(_) => AccessStrategy::Direct,
            Access::Offset(_) => AccessStrategy::Offset,
        }
    }
}

impl<M, T> FieldAccessor<M, T> for Access<M, T> {
    #[inline]
    fn get<'a>(&self, message: &'a M) -> &'a T {
        match self {
            Access::Direct(access) => access.get(message),
            Access::Offset(access) => access.get(message),
        }
    }

    #[inline]
    fn get_mut<'a>(&self, message: &'a mut M) -> &'a mut T {
        match self {
            Access::Direct(access) => access.get_mut(message),
            Access::Offset(access) => access.get_mut(message),
        }
    }
}

impl<M, T> Clone for Access<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for Access<M, T> {}

impl<M, T> fmt::Debug for Access<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Direct(access) => access.fmt(f),
            Access::Offset(access) => access.fmt(f),
        }
    }
}

/// Build access candidates with both a direct accessor and an offset
///
/// ```ignore
/// let balance = access!(Account, balance: i64);
/// ```
#[macro_export]
macro_rules! access {
    ($msg:ty, $field:ident : $ty:ty) => {
        $crate::direct!($msg, $field).or($crate::offset!($msg, $field: $ty))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ledger {
        total: i64,
        note: Option<String>,
    }

    const BOTH: AccessSupport = AccessSupport::DIRECT.union(AccessSupport::OFFSET);

    #[test]
    fn test_policy_prefers_direct_by_default() {
        let policy = AccessPolicy::default();
        assert_eq!(policy.select(BOTH), Some(AccessStrategy::Direct));
        assert_eq!(policy.select(AccessSupport::DIRECT), Some(AccessStrategy::Direct));
        assert_eq!(policy.select(AccessSupport::OFFSET), Some(AccessStrategy::Offset));
        assert_eq!(policy.select(AccessSupport::empty()), None);
    }

    #[test]
    fn test_policy_prefer_offset() {
        let policy = AccessPolicy {
            prefer_offset: true,
            offset_supported: true,
        };
        assert_eq!(policy.select(BOTH), Some(AccessStrategy::Offset));
        assert_eq!(policy.select(AccessSupport::DIRECT), Some(AccessStrategy::Direct));
    }

    #[test]
    fn test_policy_offset_unsupported() {
        let policy = AccessPolicy {
            prefer_offset: true,
            offset_supported: false,
        };
        assert_eq!(policy.select(BOTH), Some(AccessStrategy::Direct));
        assert_eq!(policy.select(AccessSupport::OFFSET), None);
    }

    #[test]
    fn test_resolve_access_denied() {
        let candidates = crate::offset!(Ledger, total: i64);
        let policy = AccessPolicy {
            prefer_offset: false,
            offset_supported: false,
        };

        let err = candidates.resolve(&policy, "Ledger", "total").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::AccessDenied {
                message: "Ledger",
                field: "total"
            }
        ));
        assert!(err.to_string().contains("Ledger.total"));
    }

    #[test]
    fn test_resolved_strategies_agree() {
        let direct = crate::direct!(Ledger, note)
            .resolve(&AccessPolicy::default(), "Ledger", "note")
            .unwrap();
        let offset = crate::access!(Ledger, note: Option<String>)
            .resolve(
                &AccessPolicy {
                    prefer_offset: true,
                    offset_supported: true,
                },
                "Ledger",
                "note",
            )
            .unwrap();
        assert_eq!(direct.strategy(), AccessStrategy::Direct);
        assert_eq!(offset.strategy(), AccessStrategy::Offset);

        let mut ledger = Ledger::default();
        direct.put(&mut ledger, Some("first".to_string()));
        assert_eq!(offset.get(&ledger).as_deref(), Some("first"));
        offset.put(&mut ledger, Some("second".to_string()));
        assert_eq!(direct.get(&ledger).as_deref(), Some("second"));

        let total = crate::access!(Ledger, total: i64)
            .resolve(&AccessPolicy::default(), "Ledger", "total")
            .unwrap();
        total.put(&mut ledger, 12);
        assert_eq!(ledger.total, 12);
    }
}
