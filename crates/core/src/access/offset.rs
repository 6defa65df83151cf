//! Offset-based field access
//!
//! A [`FieldOffset`] reaches a field by its byte offset inside the message
//! layout, without going through an accessor. It is the fallback for fields
//! that have no direct accessor, and the preferred path when configured.
//!
//! The offset is resolved once (with `offset_of!`) and carried as a typed
//! handle: `FieldOffset<M, T>` can only be applied to an `M` and only yields a
//! `T`. The [`offset!`](crate::offset) macro checks both at compile time, so
//! the raw pointer arithmetic below never sees an unchecked integer.

use std::fmt;
use std::marker::PhantomData;
use std::mem::align_of;

use super::FieldAccessor;

/// Typed byte offset of a `T` field inside an `M`
pub struct FieldOffset<M, T> {
    offset: usize,
    _marker: PhantomData<fn(&M) -> &T>,
}

impl<M, T> FieldOffset<M, T> {
    /// Create an offset handle
    ///
    /// # Panics
    /// Panics if `offset` is not aligned for `T`, or if `M` is less aligned
    /// than `T` (packed layouts are not supported).
    ///
    /// # Safety
    /// `offset` must be the byte offset of a field of type `T` declared in `M`.
    pub const unsafe fn new_unchecked(offset: usize) -> Self {
        assert!(
            offset % align_of::<T>() == 0 && align_of::<M>() >= align_of::<T>(),
            "field offset is not naturally aligned"
        );
        Self {
            offset,
            _marker: PhantomData,
        }
    }

    /// Byte offset of the field from the start of the message
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn field_ptr(&self, message: *const M) -> *const T {
        // SAFETY: `offset` lies inside `M` per the constructor contract
        unsafe { message.cast::<u8>().add(self.offset).cast::<T>() }
    }

    /// Read a `Copy` field by value
    #[inline]
    pub fn load(&self, message: &M) -> T
    where
        T: Copy,
    {
        *self.get(message)
    }

    /// Overwrite the field, dropping the previous value
    #[inline]
    pub fn store(&self, message: &mut M, value: T) {
        *self.get_mut(message) = value;
    }
}

impl<M, T> FieldAccessor<M, T> for FieldOffset<M, T> {
    #[inline]
    fn get<'a>(&self, message: &'a M) -> &'a T {
        // SAFETY: the pointer is in bounds, aligned, and typed `T` per the
        // constructor contract; the borrow is tied to `message`
        unsafe { &*self.field_ptr(message) }
    }

    #[inline]
    fn get_mut<'a>(&self, message: &'a mut M) -> &'a mut T {
        let ptr = self.field_ptr(message as *mut M as *const M) as *mut T;
        // SAFETY: as in `get`, and `message` is borrowed mutably for `'a`
        unsafe { &mut *ptr }
    }
}

impl<M, T> Clone for FieldOffset<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for FieldOffset<M, T> {}

impl<M, T> fmt::Debug for FieldOffset<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOffset")
            .field("offset", &self.offset)
            .finish()
    }
}

/// Build access candidates that reach a field by offset
///
/// The field's type is checked against `$ty` before the offset is taken.
///
/// ```ignore
/// let balance = offset!(Account, balance: i64);
/// ```
#[macro_export]
macro_rules! offset {
    ($msg:ty, $field:ident : $ty:ty) => {{
        // Raw pointers only coerce by unsizing, so this fails unless the
        // field is exactly `$ty`.
        let _check = |m: &$msg| -> *const $ty { ::core::ptr::addr_of!(m.$field) };
        // SAFETY: `_check` proves `$field` is a `$ty` field of `$msg`
        let handle = unsafe {
            $crate::access::FieldOffset::<$msg, $ty>::new_unchecked(::core::mem::offset_of!(
                $msg, $field
            ))
        };
        $crate::access::Candidates::from_offset(handle)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[derive(Default)]
    struct Account {
        id: u32,
        flag: bool,
        balance: i64,
        owner: Option<String>,
        history: Option<Vec<i64>>,
    }

    #[test]
    fn test_offset_scalar_widths() {
        let id: FieldOffset<Account, u32> = unsafe { FieldOffset::new_unchecked(offset_of!(Account, id)) };
        let flag: FieldOffset<Account, bool> =
            unsafe { FieldOffset::new_unchecked(offset_of!(Account, flag)) };
        let balance: FieldOffset<Account, i64> =
            unsafe { FieldOffset::new_unchecked(offset_of!(Account, balance)) };

        let mut account = Account::default();
        id.store(&mut account, 7);
        flag.store(&mut account, true);
        balance.put(&mut account, -1_000);

        assert_eq!(account.id, 7);
        assert!(account.flag);
        assert_eq!(account.balance, -1_000);
        assert_eq!(balance.load(&account), -1_000);
        assert_eq!(*id.get(&account), 7);
    }

    #[test]
    fn test_offset_object_fields() {
        let owner: FieldOffset<Account, Option<String>> =
            unsafe { FieldOffset::new_unchecked(offset_of!(Account, owner)) };
        let history: FieldOffset<Account, Option<Vec<i64>>> =
            unsafe { FieldOffset::new_unchecked(offset_of!(Account, history)) };

        let mut account = Account::default();
        owner.store(&mut account, Some("alice".to_string()));
        history.get_mut(&mut account).get_or_insert_with(Vec::new).push(5);
        history.get_mut(&mut account).get_or_insert_with(Vec::new).push(6);

        assert_eq!(account.owner.as_deref(), Some("alice"));
        assert_eq!(account.history, Some(vec![5, 6]));

        // Replacing an owned value drops the old one
        owner.store(&mut account, None);
        assert!(account.owner.is_none());
    }

    #[test]
    fn test_offset_macro() {
        let candidates = crate::offset!(Account, balance: i64);
        assert!(candidates.support().contains(crate::access::AccessSupport::OFFSET));
        assert!(!candidates.support().contains(crate::access::AccessSupport::DIRECT));
    }

    #[test]
    #[should_panic(expected = "not naturally aligned")]
    fn test_misaligned_offset_rejected() {
        let _ = unsafe { FieldOffset::<Account, i64>::new_unchecked(3) };
    }
}
