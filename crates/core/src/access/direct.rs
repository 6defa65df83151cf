//! Direct field access through accessor functions

use std::fmt;

use super::FieldAccessor;

/// Reads and writes a field through a pair of accessor functions
///
/// This is the path used when the field is visible where the descriptor is
/// built. Usually created with the [`direct!`](crate::direct) macro.
pub struct DirectAccess<M, T> {
    get: fn(&M) -> &T,
    get_mut: fn(&mut M) -> &mut T,
}

impl<M, T> DirectAccess<M, T> {
    /// Create a direct accessor from a getter and a mutable getter
    pub const fn new(get: fn(&M) -> &T, get_mut: fn(&mut M) -> &mut T) -> Self {
        Self { get, get_mut }
    }
}

impl<M, T> FieldAccessor<M, T> for DirectAccess<M, T> {
    #[inline]
    fn get<'a>(&self, message: &'a M) -> &'a T {
        (self.get)(message)
    }

    #[inline]
    fn get_mut<'a>(&self, message: &'a mut M) -> &'a mut T {
        (self.get_mut)(message)
    }
}

impl<M, T> Clone for DirectAccess<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for DirectAccess<M, T> {}

impl<M, T> fmt::Debug for DirectAccess<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectAccess").finish_non_exhaustive()
    }
}

/// Build access candidates that reach a field directly
///
/// ```ignore
/// let id = direct!(Person, id);
/// ```
#[macro_export]
macro_rules! direct {
    ($msg:ty, $field:ident) => {
        $crate::access::Candidates::from_direct($crate::access::DirectAccess::new(
            |m: &$msg| &m.$field,
            |m: &mut $msg| &mut m.$field,
        ))
    };
}
