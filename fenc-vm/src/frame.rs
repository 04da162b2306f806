//! Call frames.

use fengc::ClosureRef;

/// One active function invocation. `slot_base` is the index into the VM's
/// value stack where this call's slot 0 (the callee itself, or the
/// receiver for a bound method) lives — the Rust stand-in for clox's
/// `frame->slots` pointer, since our stack is an index-addressed `Vec`
/// rather than raw pointers into a fixed array.
pub(crate) struct CallFrame {
    pub closure: ClosureRef,
    pub ip: usize,
    pub slot_base: usize,
}

/// Matches clox's `FRAMES_MAX`.
pub(crate) const FRAMES_MAX: usize = 64;
