//! Hook chain registry: priority-ordered interceptors for one extension point.
//!
//! Every invocation walks a fresh [`HookCursor`] over a snapshot of the
//! registered entries. An interceptor either continues the chain with
//! [`HookCursor::call_next`], jumps straight to the base behavior with
//! [`HookCursor::call_original`], or returns its own result and ends the
//! chain there.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use modhost_core::types::HookId;

/// Interceptor callback: receives the live cursor and the chain arguments.
pub type HookCallback<A, R> = Rc<dyn Fn(&mut HookCursor<'_, A, R>, A) -> R>;

/// One registered interceptor.
struct HookEntry<A, R> {
    id: HookId,
    priority: i32,
    /// Checked at every advance, so disabling or removing an entry is
    /// observed by cursors that are already running.
    enabled: Cell<bool>,
    callback: HookCallback<A, R>,
}

/// Ordered interceptors for one extension point.
///
/// Higher priority runs first; equal priorities run in registration order.
pub struct HookChainRegistry<A, R> {
    /// Extension point name, used in logs.
    name: &'static str,
    entries: RefCell<Vec<Rc<HookEntry<A, R>>>>,
    next_id: Cell<u32>,
}

impl<A, R> HookChainRegistry<A, R> {
    /// Creates an empty chain for the named extension point.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Registers an interceptor.
    pub fn register<F>(&self, callback: F, priority: i32) -> HookId
    where
        F: Fn(&mut HookCursor<'_, A, R>, A) -> R + 'static,
    {
        self.insert(Rc::new(callback), priority)
    }

    /// Registers an optional interceptor; a missing callback yields no handle.
    pub fn register_callback(
        &self,
        callback: Option<HookCallback<A, R>>,
        priority: i32,
    ) -> Option<HookId> {
        callback.map(|callback| self.insert(callback, priority))
    }

    fn insert(&self, callback: HookCallback<A, R>, priority: i32) -> HookId {
        let id = HookId::new(self.next_id.get());
        self.next_id.set(id.get() + 1);

        let entry = Rc::new(HookEntry {
            id,
            priority,
            enabled: Cell::new(true),
            callback,
        });

        let mut entries = self.entries.borrow_mut();
        let position = entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(entries.len());
        entries.insert(position, entry);

        debug!(hook = self.name, hook_id = %id, priority, "Hook registered");
        id
    }

    /// Removes an interceptor. Unknown ids are ignored.
    ///
    /// Returns whether an entry was removed.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(position) = entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = entries.remove(position);
        entry.enabled.set(false);

        debug!(hook = self.name, hook_id = %id, "Hook unregistered");
        true
    }

    /// Re-enables a disabled interceptor.
    pub fn enable(&self, id: HookId) -> bool {
        self.set_enabled(id, true)
    }

    /// Disables an interceptor without removing it.
    pub fn disable(&self, id: HookId) -> bool {
        self.set_enabled(id, false)
    }

    fn set_enabled(&self, id: HookId, enabled: bool) -> bool {
        let entries = self.entries.borrow();
        match entries.iter().find(|e| e.id == id) {
            Some(entry) => {
                entry.enabled.set(enabled);
                true
            }
            None => false,
        }
    }

    /// Returns whether the interceptor exists and is enabled.
    pub fn is_enabled(&self, id: HookId) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.id == id && e.enabled.get())
    }

    /// Removes every interceptor.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.entries.borrow_mut());
        for entry in &removed {
            entry.enabled.set(false);
        }
        debug!(hook = self.name, removed = removed.len(), "Hook chain cleared");
    }

    /// Number of registered interceptors.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns whether no interceptor is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Extension point name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the chain.
    ///
    /// With no enabled interceptor, `last` (else `original`) runs directly.
    pub fn call_chain(
        &self,
        original: &dyn Fn(A) -> R,
        last: Option<&dyn Fn(A) -> R>,
        args: A,
    ) -> R {
        let snapshot = self.entries.borrow().clone();
        trace!(hook = self.name, entries = snapshot.len(), "Calling hook chain");

        let mut cursor = HookCursor {
            entries: snapshot,
            position: 0,
            original,
            last,
        };
        cursor.call_next(args)
    }
}

impl<A, R> fmt::Debug for HookChainRegistry<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChainRegistry")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}

/// Per-invocation position inside a hook chain.
pub struct HookCursor<'a, A, R> {
    entries: Vec<Rc<HookEntry<A, R>>>,
    position: usize,
    original: &'a dyn Fn(A) -> R,
    last: Option<&'a dyn Fn(A) -> R>,
}

impl<A, R> HookCursor<'_, A, R> {
    /// Advances to the next enabled interceptor, falling through to `last`
    /// (else `original`) once the chain is exhausted.
    pub fn call_next(&mut self, args: A) -> R {
        while let Some(entry) = self.entries.get(self.position).cloned() {
            self.position += 1;
            if entry.enabled.get() {
                return (entry.callback)(self, args);
            }
        }

        match self.last {
            Some(last) => last(args),
            None => (self.original)(args),
        }
    }

    /// Invokes the original function, skipping every remaining interceptor
    /// and `last`.
    pub fn call_original(&mut self, args: A) -> R {
        self.position = self.entries.len();
        (self.original)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(
        log: &Log,
        tag: &'static str,
    ) -> impl Fn(&mut HookCursor<'_, i32, i32>, i32) -> i32 + 'static {
        let log = log.clone();
        move |cursor, args| {
            log.borrow_mut().push(tag);
            cursor.call_next(args)
        }
    }

    #[test]
    fn test_empty_chain_calls_original() {
        let chain: HookChainRegistry<i32, i32> = HookChainRegistry::new("test");
        assert_eq!(chain.call_chain(&|x| x * 2, None, 21), 42);
    }

    #[test]
    fn test_empty_chain_prefers_last() {
        let chain: HookChainRegistry<i32, i32> = HookChainRegistry::new("test");
        assert_eq!(chain.call_chain(&|_| 1, Some(&|_| 2), 0), 2);
    }

    #[test]
    fn test_descending_priority_ties_in_arrival_order() {
        let log: Log = Rc::default();
        let chain = HookChainRegistry::new("test");
        chain.register(recorder(&log, "5a"), 5);
        chain.register(recorder(&log, "10"), 10);
        chain.register(recorder(&log, "5b"), 5);
        chain.register(recorder(&log, "-1"), -1);

        let result = chain.call_chain(&|x| x + 1, None, 1);
        assert_eq!(result, 2);
        assert_eq!(*log.borrow(), vec!["10", "5a", "5b", "-1"]);
    }

    #[test]
    fn test_call_original_skips_remaining() {
        let log: Log = Rc::default();
        let original_calls = Rc::new(Cell::new(0));
        let chain = HookChainRegistry::new("test");
        chain.register(recorder(&log, "10"), 10);
        {
            let log = log.clone();
            chain.register(
                move |cursor: &mut HookCursor<'_, i32, i32>, args| {
                    log.borrow_mut().push("5a");
                    cursor.call_original(args)
                },
                5,
            );
        }
        chain.register(recorder(&log, "5b"), 5);

        let calls = original_calls.clone();
        let original = move |x: i32| {
            calls.set(calls.get() + 1);
            x * 100
        };
        let last = |_: i32| -1;
        let result = chain.call_chain(&original, Some(&last), 3);

        assert_eq!(result, 300);
        assert_eq!(original_calls.get(), 1);
        assert_eq!(*log.borrow(), vec!["10", "5a"]);
    }

    #[test]
    fn test_interceptor_can_end_chain() {
        let chain = HookChainRegistry::new("test");
        chain.register(|_: &mut HookCursor<'_, i32, i32>, _| 7, 1);
        let original_ran = Rc::new(Cell::new(false));
        let flag = original_ran.clone();
        let result = chain.call_chain(
            &move |_| {
                flag.set(true);
                0
            },
            None,
            0,
        );
        assert_eq!(result, 7);
        assert!(!original_ran.get());
    }

    #[test]
    fn test_exhausted_chain_falls_through_to_last() {
        let log: Log = Rc::default();
        let chain = HookChainRegistry::new("test");
        chain.register(recorder(&log, "a"), 0);
        assert_eq!(chain.call_chain(&|_| 1, Some(&|_| 2), 0), 2);
    }

    #[test]
    fn test_disabled_entries_skipped() {
        let log: Log = Rc::default();
        let chain = HookChainRegistry::new("test");
        chain.register(recorder(&log, "a"), 2);
        let b = chain.register(recorder(&log, "b"), 1);
        chain.disable(b);
        chain.call_chain(&|x| x, None, 0);
        assert_eq!(*log.borrow(), vec!["a"]);

        chain.enable(b);
        assert!(chain.is_enabled(b));
        chain.call_chain(&|x| x, None, 0);
        assert_eq!(*log.borrow(), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_unregister_mid_invocation() {
        let log: Log = Rc::default();
        let chain = Rc::new(HookChainRegistry::new("test"));
        let victim = Rc::new(Cell::new(None::<HookId>));
        {
            let chain_ref = Rc::downgrade(&chain);
            let victim = victim.clone();
            let log = log.clone();
            chain.register(
                move |cursor: &mut HookCursor<'_, i32, i32>, args| {
                    log.borrow_mut().push("remover");
                    if let (Some(chain), Some(id)) = (chain_ref.upgrade(), victim.get()) {
                        chain.unregister(id);
                    }
                    cursor.call_next(args)
                },
                10,
            );
        }
        victim.set(Some(chain.register(recorder(&log, "victim"), 1)));

        chain.call_chain(&|x| x, None, 0);
        assert_eq!(*log.borrow(), vec!["remover"]);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_null_callback_yields_no_handle() {
        let chain: HookChainRegistry<i32, i32> = HookChainRegistry::new("test");
        assert!(chain.register_callback(None, 0).is_none());
        assert!(chain.is_empty());
    }

    #[test]
    fn test_reentrant_call_chain() {
        let chain = Rc::new(HookChainRegistry::new("test"));
        let weak = Rc::downgrade(&chain);
        chain.register(
            move |cursor: &mut HookCursor<'_, i32, i32>, depth| {
                if depth < 3 {
                    if let Some(chain) = weak.upgrade() {
                        return chain.call_chain(&|x| x, None, depth + 1) + cursor.call_next(depth);
                    }
                }
                cursor.call_next(depth)
            },
            0,
        );
        // depth 3 → 3; 2 → 3 + 2; 1 → 5 + 1; 0 → 6 + 0
        assert_eq!(chain.call_chain(&|x| x, None, 0), 6);
    }

    #[test]
    fn test_clear_removes_everything() {
        let log: Log = Rc::default();
        let chain = HookChainRegistry::new("test");
        chain.register(recorder(&log, "a"), 0);
        chain.clear();
        assert!(chain.is_empty());
        chain.call_chain(&|x| x, None, 0);
        assert!(log.borrow().is_empty());
    }
}
