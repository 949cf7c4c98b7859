use core::marker::PhantomData;
use critical_section::RestoreState;

/// Keeps interrupts disabled while alive.
///
/// Wraps the sampling part of every bit slot so the line is read within the
/// window the devices drive it. The platform supplies the actual mechanism
/// through a `critical-section` implementation.
///
/// Guards must be dropped in reverse order of creation, on the thread that
/// created them, and never inside a `critical_section::with` entered after
/// them. Only the slot code in this crate creates them.
///
/// ```compile_fail
/// let _guard = onewire_ds18x20::DisableInterrupts::new();
/// ```
pub(crate) struct DisableInterrupts {
    state: RestoreState,
    _not_send: PhantomData<*mut ()>,
}

impl DisableInterrupts {
    pub(crate) fn new() -> Self {
        // SAFETY: released exactly once in `drop`, and the guard is !Send so the
        // release happens on the acquiring thread
        let state = unsafe { critical_section::acquire() };
        DisableInterrupts {
            state,
            _not_send: PhantomData,
        }
    }
}

impl Drop for DisableInterrupts {
    fn drop(&mut self) {
        // SAFETY: `state` came from the matching `acquire` in `new`
        unsafe { critical_section::release(self.state) }
    }
}
