use rtk_core::Priority;

/// Board callbacks invoked by the kernel.
///
/// Every method has an empty default, so an implementation only overrides
/// what its platform needs.
pub trait KernelHooks: Send + Sync {
    /// Once, before the first dispatch of a run loop.
    fn on_startup(&self) {}

    /// Nothing is ready to run. Typically sleeps until the next interrupt.
    fn on_idle(&self) {}

    /// The running priority changes from `prev` to `next`; either may be the
    /// idle level.
    fn on_context_switch(&self, _prev: Priority, _next: Priority) {}

    /// Once, after [`Kernel::stop`](crate::Kernel::stop) ended the run loop.
    fn on_cleanup(&self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl KernelHooks for NoHooks {}
