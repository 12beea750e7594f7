//! Identifier generation for the CV aggregate and its entries.
//!
//! Ids are version-4 UUIDs drawn from the OS CSPRNG. If the OS source is unavailable the
//! generator degrades to a clock-seeded `SmallRng` with a process-wide counter embedded in
//! the id bytes, so a fallback id is never repeated within the process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng};
use tracing::warn;
use uuid::{Builder, Uuid};

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh unique identifier. Never fails.
pub fn generate_id() -> Uuid {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => Builder::from_random_bytes(bytes).into_uuid(),
        Err(e) => {
            warn!("OS random source unavailable ({e}); using fallback id generator");
            fallback_id()
        }
    }
}

/// Weak-source id: 10 bytes from a clock-seeded PRNG, 6 bytes of a monotonically
/// increasing counter. Version and variant bits are set by the builder and never
/// overlap the counter bytes.
pub(crate) fn fallback_id() -> Uuid {
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let seed = nanos ^ count.rotate_left(32) ^ ((std::process::id() as u64) << 16);

    let mut bytes = [0u8; 16];
    SmallRng::seed_from_u64(seed).fill_bytes(&mut bytes[..10]);
    bytes[10..].copy_from_slice(&count.to_be_bytes()[2..]);
    Builder::from_random_bytes(bytes).into_uuid()
}
