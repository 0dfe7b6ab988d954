//! Debug assertion macros for adapter invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.

// =============================================================================
// Buffer accounting
// =============================================================================

/// Assert that the resident count matches the push/pop totals.
///
/// **Invariant**: `len == pushed - popped` (no loss, no duplication)
///
/// Used in: `Buffer::push()` and `Buffer::pop()` while the lock is held
macro_rules! debug_assert_buffer_accounting {
    ($len:expr, $pushed:expr, $popped:expr) => {
        debug_assert!(
            $popped <= $pushed && ($pushed - $popped) as usize == $len,
            "buffer accounting violated: len {} but pushed {} popped {}",
            $len,
            $pushed,
            $popped
        )
    };
}

// =============================================================================
// Completed drain leaves nothing behind
// =============================================================================

/// Assert that a drain loop reporting completion left the buffer empty.
///
/// **Invariant**: `Termination::Completed → buffer.is_empty()`
///
/// Used in: drain loop after the final flush
macro_rules! debug_assert_drained_on_completion {
    ($completed:expr, $resident:expr) => {
        debug_assert!(
            !$completed || $resident == 0,
            "drain completed with {} items still buffered",
            $resident
        )
    };
}

// =============================================================================
// Forwarded never exceeds popped
// =============================================================================

/// Assert that every forwarded item was first popped from the buffer.
///
/// **Invariant**: `forwarded <= popped`
///
/// Used in: `AdapterHandle::join()` once both tasks have ended
macro_rules! debug_assert_forwarded_bounded {
    ($forwarded:expr, $popped:expr) => {
        debug_assert!(
            $forwarded <= $popped,
            "forwarded {} items but only {} were popped",
            $forwarded,
            $popped
        )
    };
}

// =============================================================================
// Every popped item is forwarded or reported
// =============================================================================

/// Assert that the drain loop accounted for every item it popped.
///
/// **Invariant**: `popped == forwarded + in_flight`, where `in_flight` is 1
/// for `Termination::Disconnected` (the item whose send failed) and 0 otherwise.
/// Together with buffer accounting this gives
/// `pushed == forwarded + abandoned` at termination.
///
/// Used in: drain loop on exit (it is the only caller of `Buffer::pop()`)
macro_rules! debug_assert_drain_accounting {
    ($popped:expr, $forwarded:expr, $in_flight:expr) => {
        debug_assert!(
            $popped == $forwarded + $in_flight,
            "drain popped {} items but forwarded {} with {} in flight",
            $popped,
            $forwarded,
            $in_flight
        )
    };
}

// =============================================================================
// Output closed exactly once
// =============================================================================

// The drain loop owns the output channel's `mpsc::Sender` and drops it when it
// returns. `Adapter::spawn` moves that sender into the drain task without
// cloning it, so no other holder can keep the output open or close it a second
// time.

pub(crate) use debug_assert_buffer_accounting;
pub(crate) use debug_assert_drain_accounting;
pub(crate) use debug_assert_drained_on_completion;
pub(crate) use debug_assert_forwarded_bounded;
