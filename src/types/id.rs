//! Collision-resistant string identifiers.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use rand::Rng;

/// Process-lifetime sequence number mixed into every ID.
static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Last timestamp prefix handed out, in microseconds.
static LAST_MICROS: AtomicU64 = AtomicU64::new(0);

/// Generate a new memory ID.
///
/// Layout: `{micros:016x}-{counter:08x}-{r1:08x}-{r2:04x}-{r3:04x}`. Every
/// group is zero padded and the time prefix never goes backwards within a
/// process, even if the wall clock does, so IDs from one process sort
/// lexicographically in creation order. Across restarts the order follows
/// the wall clock.
pub fn generate_id() -> String {
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);
    let now = chrono::Utc::now().timestamp_micros().max(0) as u64;
    let micros = next_micros(now);
    let mut rng = rand::thread_rng();
    let r1: u32 = rng.gen();
    let r2: u16 = rng.gen();
    let r3: u16 = rng.gen();
    format!("{micros:016x}-{counter:08x}-{r1:08x}-{r2:04x}-{r3:04x}")
}

/// The larger of `now` and one past the last prefix issued.
fn next_micros(now: u64) -> u64 {
    let previous = LAST_MICROS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last.saturating_add(1)))
        })
        .unwrap_or_else(|last| last);
    now.max(previous.saturating_add(1))
}
