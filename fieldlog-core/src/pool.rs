//! Bounded reuse pool for event buffers.
//!
//! Every live event checks a buffer out of this pool and returns it when the
//! event is dropped, so steady-state logging allocates nothing per call. The
//! free list is the only synchronization point; checkout and return each take
//! the lock once.

use parking_lot::Mutex;

/// Maximum number of idle buffers kept in the pool.
const POOL_LIMIT: usize = 64;

/// Buffers that grew beyond this capacity are dropped instead of pooled,
/// so one oversized record cannot pin memory for the rest of the process.
const RETAIN_CAP: usize = 1 << 16;

/// Starting capacity for freshly allocated buffers.
const SEED_CAP: usize = 512;

static FREE_LIST: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

/// Checks a cleared buffer out of the pool, allocating if the pool is empty.
pub(crate) fn checkout() -> Vec<u8> {
    FREE_LIST
        .lock()
        .pop()
        .unwrap_or_else(|| Vec::with_capacity(SEED_CAP))
}

/// Returns a buffer to the pool, clearing it first.
pub(crate) fn restore(mut buf: Vec<u8>) {
    if buf.capacity() > RETAIN_CAP {
        return;
    }
    buf.clear();
    let mut free = FREE_LIST.lock();
    if free.len() < POOL_LIMIT {
        free.push(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: the free list is process-global and tests run in parallel, so
    // these assertions only rely on invariants that hold under interleaving.

    #[test]
    fn test_restored_buffers_come_back_cleared() {
        let mut buf = checkout();
        buf.extend_from_slice(b"leftover");
        restore(buf);
        for _ in 0..POOL_LIMIT {
            assert!(checkout().is_empty());
        }
    }

    #[test]
    fn test_oversized_buffer_is_never_pooled() {
        let buf = Vec::with_capacity(RETAIN_CAP + 1);
        restore(buf);
        for _ in 0..POOL_LIMIT {
            assert!(checkout().capacity() <= RETAIN_CAP);
        }
    }
}
