use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type Listener = Arc<dyn Fn(&mut Event) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    target: Option<String>,
    params: Vec<String>,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(name: impl Into<String>, target: Option<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            target,
            params,
            propagation_stopped: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_is_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseCollection {
    responses: Vec<String>,
    stopped: bool,
}

impl ResponseCollection {
    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn first(&self) -> Option<&str> {
        self.responses.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.responses.last().map(String::as_str)
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }
}

struct Registration {
    id: ListenerId,
    priority: i32,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<String, Vec<Registration>>,
}

/// Named-event dispatcher. Listeners run synchronously, highest priority
/// first, in attach order among equal priorities.
#[derive(Default)]
pub struct EventManager {
    registry: RwLock<Registry>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach<F>(&self, event: &str, priority: i32, listener: F) -> ListenerId
    where
        F: Fn(&mut Event) -> Option<String> + Send + Sync + 'static,
    {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;

        let registrations = registry.listeners.entry(event.to_string()).or_default();
        registrations.push(Registration {
            id,
            priority,
            listener: Arc::new(listener),
        });
        // stable sort 保留同優先權的註冊順序
        registrations.sort_by_key(|r| Reverse(r.priority));

        tracing::debug!("Attached listener {:?} to '{}' (priority {})", id, event, priority);
        id
    }

    pub fn detach(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        for registrations in registry.listeners.values_mut() {
            if let Some(pos) = registrations.iter().position(|r| r.id == id) {
                registrations.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn listener_count(&self, event: &str) -> usize {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        registry.listeners.get(event).map_or(0, Vec::len)
    }

    pub fn trigger(&self, event: &str, target: Option<String>, params: Vec<String>) -> ResponseCollection {
        // 先複製清單再釋放鎖，讓監聽器可以再次 attach/trigger
        let listeners: Vec<Listener> = {
            let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
            registry
                .listeners
                .get(event)
                .map(|regs| regs.iter().map(|r| Arc::clone(&r.listener)).collect())
                .unwrap_or_default()
        };

        let mut event = Event::new(event, target, params);
        let mut collection = ResponseCollection::default();

        for listener in listeners {
            if let Some(response) = listener(&mut event) {
                collection.responses.push(response);
            }
            if event.propagation_is_stopped() {
                collection.stopped = true;
                break;
            }
        }

        tracing::trace!(
            "Triggered '{}': {} response(s), stopped={}",
            event.name(),
            collection.responses.len(),
            collection.stopped
        );
        collection
    }
}
