//! Captured-failure registry.
//!
//! A generation-tagged slot arena: every token carries the slot index
//! and the generation the slot had when the failure was stored, so a
//! reused slot can never satisfy a stale token. Retention is bounded;
//! at capacity the oldest live entry is evicted and its token simply
//! resolves to absent.
//!
//! All mutation happens under one short-held mutex. The lock is never
//! held across a caller-supplied handler: `resolve` hands out an `Arc`
//! clone and the handler runs outside the critical section.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Default number of live entries retained before eviction kicks in.
pub const DEFAULT_CAPACITY: usize = 128;

/// A failure captured by a guarded call, with enough context to
/// inspect it after the original call boundary.
pub struct StoredFailure {
    payload: Box<dyn Any + Send>,
    type_name: &'static str,
    message: String,
    origin: String,
}

impl StoredFailure {
    /// Wraps an error value returned by a guarded operation.
    #[must_use]
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + 'static,
    {
        let message = err.to_string();
        Self {
            payload: Box::new(err),
            type_name: std::any::type_name::<E>(),
            message,
            origin: String::new(),
        }
    }

    /// Wraps a panic payload recovered by a catch adapter.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&'static str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "opaque panic payload".to_string()
        };
        Self {
            payload,
            type_name: "panic",
            message,
            origin: String::new(),
        }
    }

    pub(crate) fn set_origin(&mut self, origin: &str) {
        self.origin = origin.to_string();
    }

    /// Borrows the failure as its concrete type, if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Whether the stored payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// Name of the concrete failure type at capture time.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Rendered failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Caller identity active when the failure was captured.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

// SAFETY: the payload is written only at construction and accessed
// exclusively through shared references afterwards; `StoredFailure`
// exposes no interior mutability of its own.
unsafe impl Sync for StoredFailure {}

impl fmt::Debug for StoredFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredFailure")
            .field("type_name", &self.type_name)
            .field("message", &self.message)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Opaque handle to a captured failure.
///
/// Valid only while the entry it references is live; a released or
/// evicted entry bumps its slot generation, after which the token
/// resolves to absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FailureToken {
    slot: u32,
    generation: u32,
}

impl FailureToken {
    /// Arena slot index.
    #[must_use]
    pub fn slot(self) -> u32 {
        self.slot
    }

    /// Slot generation at capture time.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Arc<StoredFailure>>,
}

#[derive(Debug, Default)]
struct Inner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: VecDeque<FailureToken>,
    live: usize,
}

/// Thread-safe store of captured failures.
#[derive(Debug)]
pub struct FailureRegistry {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl FailureRegistry {
    /// Registry with the default retention bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Registry retaining at most `capacity` live entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Stores a failure and returns its token.
    ///
    /// Evicts the oldest live entry first when the registry is full.
    pub fn capture(&self, failure: StoredFailure) -> FailureToken {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.live >= self.capacity {
            Self::evict_oldest(inner);
        }
        if inner.order.len() > self.capacity * 4 {
            Self::compact_order(inner);
        }

        let index = match inner.free.pop() {
            Some(index) => index,
            None => {
                inner.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                u32::try_from(inner.slots.len() - 1).unwrap_or(u32::MAX)
            }
        };
        let slot = &mut inner.slots[index as usize];
        slot.entry = Some(Arc::new(failure));
        let token = FailureToken {
            slot: index,
            generation: slot.generation,
        };
        inner.order.push_back(token);
        inner.live += 1;
        token
    }

    /// Looks up a token. Absent for released, evicted or never-set
    /// entries; idempotent for live ones.
    #[must_use]
    pub fn resolve(&self, token: FailureToken) -> Option<Arc<StoredFailure>> {
        let inner = self.inner.lock();
        let slot = inner.slots.get(token.slot as usize)?;
        if slot.generation != token.generation {
            return None;
        }
        slot.entry.clone()
    }

    /// Releases the entry behind a token, bumping the slot generation.
    /// A no-op for tokens that are already stale.
    pub fn release(&self, token: FailureToken) {
        let mut guard = self.inner.lock();
        Self::clear(&mut guard, token);
    }

    /// Number of live entries.
    #[must_use]
    pub fn live(&self) -> usize {
        self.inner.lock().live
    }

    /// Whether no entries are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live() == 0
    }

    fn clear(inner: &mut Inner, token: FailureToken) -> bool {
        let Some(slot) = inner.slots.get_mut(token.slot as usize) else {
            return false;
        };
        if slot.generation != token.generation || slot.entry.is_none() {
            return false;
        }
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(token.slot);
        inner.live -= 1;
        true
    }

    fn evict_oldest(inner: &mut Inner) {
        while let Some(oldest) = inner.order.pop_front() {
            if Self::clear(inner, oldest) {
                tracing::warn!(
                    slot = oldest.slot,
                    generation = oldest.generation,
                    "failure registry at capacity, evicted oldest live entry"
                );
                break;
            }
            // Stale order entry for an already-released token; skip.
        }
    }

    fn compact_order(inner: &mut Inner) {
        let slots = &inner.slots;
        inner.order.retain(|token| {
            slots
                .get(token.slot as usize)
                .is_some_and(|slot| slot.generation == token.generation && slot.entry.is_some())
        });
    }
}

impl Default for FailureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Boom(&'static str);

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom: {}", self.0)
        }
    }

    impl std::error::Error for Boom {}

    fn failure(tag: &'static str) -> StoredFailure {
        StoredFailure::from_error(Boom(tag))
    }

    #[test]
    fn capture_resolve_release_roundtrip() {
        let registry = FailureRegistry::new();
        let token = registry.capture(failure("a"));

        let stored = registry.resolve(token).expect("live entry resolves");
        assert_eq!(stored.message(), "boom: a");
        assert!(stored.is::<Boom>());

        // Resolution is idempotent while the entry is live.
        assert!(registry.resolve(token).is_some());

        registry.release(token);
        assert!(registry.resolve(token).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_token_never_sees_a_reused_slot() {
        let registry = FailureRegistry::new();
        let first = registry.capture(failure("first"));
        registry.release(first);

        let second = registry.capture(failure("second"));
        assert_eq!(first.slot(), second.slot());
        assert_ne!(first.generation(), second.generation());

        assert!(registry.resolve(first).is_none());
        assert_eq!(
            registry.resolve(second).expect("live").message(),
            "boom: second"
        );
    }

    #[test]
    fn capacity_pressure_evicts_oldest_live_entry() {
        let registry = FailureRegistry::with_capacity(2);
        let a = registry.capture(failure("a"));
        let b = registry.capture(failure("b"));
        let c = registry.capture(failure("c"));

        assert!(registry.resolve(a).is_none(), "oldest entry was evicted");
        assert!(registry.resolve(b).is_some());
        assert!(registry.resolve(c).is_some());
        assert_eq!(registry.live(), 2);
    }

    #[test]
    fn release_is_a_noop_for_stale_tokens() {
        let registry = FailureRegistry::new();
        let token = registry.capture(failure("a"));
        registry.release(token);
        registry.release(token);
        assert!(registry.is_empty());

        let fresh = registry.capture(failure("b"));
        registry.release(token); // stale generation, must not touch "b"
        assert!(registry.resolve(fresh).is_some());
    }

    #[test]
    fn panic_payload_messages() {
        let text: Box<dyn std::any::Any + Send> = Box::new("it broke");
        assert_eq!(StoredFailure::from_panic(text).message(), "it broke");

        let owned: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(StoredFailure::from_panic(owned).message(), "owned");

        let opaque: Box<dyn std::any::Any + Send> = Box::new(17_u8);
        assert_eq!(
            StoredFailure::from_panic(opaque).message(),
            "opaque panic payload"
        );
    }
}
