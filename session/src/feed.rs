//! Change-feed hub: one upstream subscription per collection, shared by every
//! mounted view that watches it.
//!
//! DESIGN
//! ======
//! Views subscribe through [`ChangeFeedHub::subscribe`] and hold the returned
//! [`FeedSubscription`]. The first local listener on a collection opens the
//! upstream feed; the last one dropped tears it down. Events fan out to the
//! listeners registered at delivery time, each exactly once.
//!
//! If opening the upstream fails the listener stays registered and the
//! failure is logged; the next subscribe on that collection retries.

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::backend::{ChangeCallback, ChangeEvent, ChangeFeedClient, Collection, Unsubscribe};

#[derive(Default)]
struct Channel {
    listeners: Vec<(u64, ChangeCallback)>,
    upstream: Option<Unsubscribe>,
}

struct HubInner {
    client: Rc<dyn ChangeFeedClient>,
    channels: RefCell<HashMap<Collection, Channel>>,
    next_id: Cell<u64>,
}

/// Shared realtime fan-out. Cheap to clone.
#[derive(Clone)]
pub struct ChangeFeedHub {
    inner: Rc<HubInner>,
}

impl ChangeFeedHub {
    #[must_use]
    pub fn new(client: Rc<dyn ChangeFeedClient>) -> Self {
        Self { inner: Rc::new(HubInner { client, channels: RefCell::new(HashMap::new()), next_id: Cell::new(0) }) }
    }

    /// Register `on_event` for changes on `collection` until the returned
    /// subscription is dropped.
    pub fn subscribe(&self, collection: Collection, on_event: impl Fn(ChangeEvent) + 'static) -> FeedSubscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let needs_upstream = {
            let mut channels = self.inner.channels.borrow_mut();
            let channel = channels.entry(collection).or_default();
            channel.listeners.push((id, Rc::new(on_event)));
            channel.upstream.is_none()
        };
        if needs_upstream {
            self.open_upstream(collection);
        }

        FeedSubscription { hub: Rc::downgrade(&self.inner), collection, id }
    }

    fn open_upstream(&self, collection: Collection) {
        let weak = Rc::downgrade(&self.inner);
        let dispatch: ChangeCallback = Rc::new(move |event: ChangeEvent| {
            if let Some(inner) = weak.upgrade() {
                dispatch(&inner, event);
            }
        });

        match self.inner.client.subscribe(collection, dispatch) {
            Ok(handle) => {
                tracing::debug!(channel = collection.channel(), "change feed opened");
                let mut channels = self.inner.channels.borrow_mut();
                if let Some(channel) = channels.get_mut(&collection) {
                    channel.upstream = Some(handle);
                }
            }
            Err(e) => {
                tracing::warn!(channel = collection.channel(), error = %e, "change feed failed to open");
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self, collection: Collection) -> usize {
        self.inner.channels.borrow().get(&collection).map_or(0, |c| c.listeners.len())
    }

    #[must_use]
    pub fn is_open(&self, collection: Collection) -> bool {
        self.inner.channels.borrow().get(&collection).is_some_and(|c| c.upstream.is_some())
    }
}

fn dispatch(inner: &HubInner, event: ChangeEvent) {
    let listeners: Vec<ChangeCallback> = inner
        .channels
        .borrow()
        .get(&event.collection)
        .map(|c| c.listeners.iter().map(|(_, l)| l.clone()).collect())
        .unwrap_or_default();
    for listener in listeners {
        listener(event.clone());
    }
}

/// Live registration on a [`ChangeFeedHub`]. Dropping it removes the listener.
#[must_use = "dropping the subscription stops delivery"]
pub struct FeedSubscription {
    hub: Weak<HubInner>,
    collection: Collection,
    id: u64,
}

impl FeedSubscription {
    #[must_use]
    pub fn collection(&self) -> Collection {
        self.collection
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        let Some(inner) = self.hub.upgrade() else {
            return;
        };
        // Teardown runs after the borrow is released.
        let upstream = {
            let mut channels = inner.channels.borrow_mut();
            let Some(channel) = channels.get_mut(&self.collection) else {
                return;
            };
            channel.listeners.retain(|(id, _)| *id != self.id);
            if channel.listeners.is_empty() {
                channels.remove(&self.collection).and_then(|c| c.upstream)
            } else {
                None
            }
        };
        if let Some(handle) = upstream {
            tracing::debug!(channel = self.collection.channel(), "change feed closed");
            handle.cancel();
        }
    }
}
