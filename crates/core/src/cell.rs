//! Critical-section protected cell.

use core::cell::RefCell;

use critical_section::Mutex;

/// State shared between priority levels and interrupt context.
///
/// Access only happens inside `critical_section::with`, so the borrow is
/// never observable from another context. Closures must not re-enter the same
/// cell.
pub struct CritCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CritCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Runs `f` with exclusive access inside a critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| {
            let mut guard = self.inner.borrow_ref_mut(cs);
            f(&mut *guard)
        })
    }

    /// Runs `f` with shared access inside a critical section.
    pub fn with_ref<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        critical_section::with(|cs| {
            let guard = self.inner.borrow_ref(cs);
            f(&*guard)
        })
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

impl<T: Copy> CritCell<T> {
    pub fn get(&self) -> T {
        self.with_ref(|value| *value)
    }
}

impl<T: Default> Default for CritCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
