//! fenc-util - shared foundation types for the fen toolchain
//!
//! Every other `fenc-*` crate and `fengc`/`fent` builds on the small
//! set of types in this crate: source locations ([`span`]), compiler
//! diagnostics ([`diagnostic`]), typed index vectors ([`index_vec`]),
//! and the shared error types in [`error`].
//!
//! None of this is specific to any one compilation phase — that's the
//! point of keeping it in its own crate, the same way `faxc-util`
//! underlies its whole pipeline.

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use error::{FencError, Result};
pub use index_vec::{Idx, IndexVec};
pub use span::Span;
