use leptos::prelude::*;
use leptos_dom::helpers::set_timeout;
use std::time::Duration;

const SUCCESS_TTL: Duration = Duration::from_millis(2000);
const ERROR_TTL: Duration = Duration::from_millis(4000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ToastKind {
    Loading,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    /// Bumped on every update so a pending dismissal of an older state is ignored.
    pub revision: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ToastQueue {
    next_id: u64,
    items: Vec<Toast>,
}

impl ToastQueue {
    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    pub fn push(&mut self, kind: ToastKind, message: &str) -> u64 {
        self.next_id += 1;
        self.items.push(Toast {
            id: self.next_id,
            kind,
            message: message.to_string(),
            revision: 0,
        });
        self.next_id
    }

    /// Update a toast in place; returns the new revision, or `None` if it is gone.
    pub fn update(&mut self, id: u64, kind: ToastKind, message: &str) -> Option<u64> {
        let t = self.items.iter_mut().find(|t| t.id == id)?;
        t.kind = kind;
        t.message = message.to_string();
        t.revision += 1;
        Some(t.revision)
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|t| t.id != id);
    }

    pub fn dismiss_if_unchanged(&mut self, id: u64, revision: u64) {
        self.items.retain(|t| !(t.id == id && t.revision == revision));
    }
}

/// Transient status notifications (pending → success/error), shared via `AppState`.
#[derive(Clone, Copy)]
pub(crate) struct Notifier {
    queue: RwSignal<ToastQueue>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            queue: RwSignal::new(ToastQueue::default()),
        }
    }

    pub fn items(&self) -> Vec<Toast> {
        self.queue.with(|q| q.items().to_vec())
    }

    pub fn loading(&self, message: &str) -> u64 {
        let mut id = 0;
        self.queue.update(|q| id = q.push(ToastKind::Loading, message));
        id
    }

    pub fn success(&self, id: Option<u64>, message: &str) {
        self.settle(id, ToastKind::Success, message, SUCCESS_TTL);
    }

    pub fn error(&self, id: Option<u64>, message: &str) {
        self.settle(id, ToastKind::Error, message, ERROR_TTL);
    }

    pub fn dismiss(&self, id: u64) {
        self.queue.update(|q| q.dismiss(id));
    }

    fn settle(&self, id: Option<u64>, kind: ToastKind, message: &str, ttl: Duration) {
        let mut target = (0, 0);
        self.queue.update(|q| {
            target = match id.and_then(|id| q.update(id, kind, message).map(|rev| (id, rev))) {
                Some(t) => t,
                None => (q.push(kind, message), 0),
            };
        });

        let queue = self.queue;
        let (id, revision) = target;
        set_timeout(
            move || queue.update(|q| q.dismiss_if_unchanged(id, revision)),
            ttl,
        );
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
