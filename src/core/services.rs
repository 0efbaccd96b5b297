use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Process-observable count of live instances. Each `acquire` hands out a
/// handle; the count drops again when that handle is released.
#[derive(Debug, Clone, Default)]
pub struct InstanceCounter {
    live: Arc<AtomicUsize>,
}

impl InstanceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> CountedHandle {
        self.live.fetch_add(1, Ordering::SeqCst);
        CountedHandle {
            live: Arc::clone(&self.live),
        }
    }

    pub fn current(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct CountedHandle {
    live: Arc<AtomicUsize>,
}

impl CountedHandle {
    /// Same as dropping the handle, spelled out at the call site.
    pub fn release(self) {}
}

impl Drop for CountedHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Typed provider of one service, wired explicitly at startup.
pub struct ServiceSlot<T> {
    factory: Factory<T>,
    shared: Option<OnceLock<Arc<T>>>,
}

impl<T> ServiceSlot<T> {
    /// The first `get` builds the instance; later calls return the same one.
    pub fn shared<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            shared: Some(OnceLock::new()),
        }
    }

    /// Every `get` builds a fresh instance.
    pub fn per_call<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            shared: None,
        }
    }

    pub fn from_instance(instance: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::shared(move || instance.clone())
    }

    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }

    pub fn get(&self) -> Arc<T> {
        match &self.shared {
            Some(cell) => Arc::clone(cell.get_or_init(|| Arc::new((self.factory)()))),
            None => Arc::new((self.factory)()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tracked {
        _handle: CountedHandle,
    }

    #[test]
    fn test_counter_acquire_release() {
        let counter = InstanceCounter::new();
        let a = counter.acquire();
        let b = counter.acquire();
        assert_eq!(counter.current(), 2);
        a.release();
        assert_eq!(counter.current(), 1);
        drop(b);
        assert_eq!(counter.current(), 0);
    }

    #[test]
    fn test_shared_slot_builds_once() {
        let counter = InstanceCounter::new();
        let factory_counter = counter.clone();
        let slot = ServiceSlot::shared(move || Tracked {
            _handle: factory_counter.acquire(),
        });

        assert_eq!(counter.current(), 0);
        let first = slot.get();
        assert_eq!(counter.current(), 1);
        let second = slot.get();
        assert_eq!(counter.current(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_per_call_slot_builds_every_time() {
        let counter = InstanceCounter::new();
        let factory_counter = counter.clone();
        let slot = ServiceSlot::per_call(move || Tracked {
            _handle: factory_counter.acquire(),
        });

        let first = slot.get();
        let second = slot.get();
        assert_eq!(counter.current(), 2);
        assert!(!Arc::ptr_eq(&first, &second));

        drop(first);
        assert_eq!(counter.current(), 1);
        drop(second);
        assert_eq!(counter.current(), 0);
    }

    #[test]
    fn test_from_instance_is_shared() {
        let slot = ServiceSlot::from_instance("tintin".to_string());
        assert!(slot.is_shared());
        assert!(Arc::ptr_eq(&slot.get(), &slot.get()));
    }
}
