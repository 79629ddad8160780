use crate::capture::event::EventKind;
use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Something that can deliver page events of a given kind
pub trait EventHost: Send + Sync {
    fn attach(&self, kind: EventKind) -> Result<()>;
    fn detach(&self, kind: EventKind) -> Result<()>;
}

/// A registered listener; detaches itself when dropped
pub struct ListenerHandle {
    host: Arc<dyn EventHost>,
    kind: EventKind,
}

impl ListenerHandle {
    /// Attach a listener for `kind` on `host`
    pub fn attach(host: Arc<dyn EventHost>, kind: EventKind) -> Result<Self> {
        host.attach(kind)?;
        log::debug!("Attached {:?} listener", kind);
        Ok(Self { host, kind })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        match self.host.detach(self.kind) {
            Ok(()) => log::debug!("Detached {:?} listener", self.kind),
            Err(e) => log::warn!("Failed to detach {:?} listener: {}", self.kind, e),
        }
    }
}

/// The handles registered by one capture session
#[derive(Default)]
pub struct ListenerSet {
    handles: Vec<ListenerHandle>,
}

impl ListenerSet {
    /// Attach one listener per kind; already-attached kinds are released if
    /// a later one fails
    pub fn attach_all(host: Arc<dyn EventHost>, kinds: &[EventKind]) -> Result<Self> {
        let mut set = Self::default();
        for &kind in kinds {
            set.handles.push(ListenerHandle::attach(host.clone(), kind)?);
        }
        Ok(set)
    }

    /// Detach every listener
    pub fn release(&mut self) {
        self.handles.clear();
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Host that only tracks which kinds are attached.
///
/// Used where events are fed to the session directly rather than by a page.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    attached: Mutex<Vec<EventKind>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kinds currently attached, in attach order
    pub fn attached(&self) -> Vec<EventKind> {
        self.attached.lock().map(|kinds| kinds.clone()).unwrap_or_default()
    }
}

impl EventHost for InMemoryHost {
    fn attach(&self, kind: EventKind) -> Result<()> {
        if let Ok(mut kinds) = self.attached.lock() {
            kinds.push(kind);
        }
        Ok(())
    }

    fn detach(&self, kind: EventKind) -> Result<()> {
        if let Ok(mut kinds) = self.attached.lock() {
            kinds.retain(|k| *k != kind);
        }
        Ok(())
    }
}
