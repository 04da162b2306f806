//! Native functions registered into every fresh [`crate::Vm`].

use std::sync::OnceLock;
use std::time::Instant;

use fengc::Value;

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Seconds elapsed since the process started, as a float — the same
/// shape as `clockNative`'s `(double)clock() / CLOCKS_PER_SEC`, just
/// measured from an `Instant` rather than C's `clock()`.
pub fn clock(_args: &[Value]) -> Result<Value, String> {
    let start = PROCESS_START.get_or_init(Instant::now);
    Ok(Value::Number(start.elapsed().as_secs_f64()))
}
