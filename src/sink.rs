use std::collections::HashMap;

use crossbeam_channel::Sender;

use crate::types::{EventKind, MotionEvent};

/// Receives lifecycle, frame and swipe events in emission order.
pub trait EventSink {
    fn emit(&mut self, event: MotionEvent);
}

impl EventSink for Vec<MotionEvent> {
    fn emit(&mut self, event: MotionEvent) {
        self.push(event);
    }
}

/// Forwards events into a channel; a dropped receiver silently discards them.
impl EventSink for Sender<MotionEvent> {
    fn emit(&mut self, event: MotionEvent) {
        let _ = self.send(event);
    }
}

impl<K: EventSink + ?Sized> EventSink for &mut K {
    fn emit(&mut self, event: MotionEvent) {
        (**self).emit(event);
    }
}

type Handler = Box<dyn FnMut(&MotionEvent) + Send>;

/// Per-kind callback registry.
#[derive(Default)]
pub struct Subscribers {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: FnMut(&MotionEvent) + Send + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
        self
    }

    pub fn on_start<F: FnMut() + Send + 'static>(&mut self, mut handler: F) -> &mut Self {
        self.on(EventKind::Started, move |_| handler())
    }

    pub fn on_stop<F: FnMut() + Send + 'static>(&mut self, mut handler: F) -> &mut Self {
        self.on(EventKind::Stopped, move |_| handler())
    }

    pub fn on_error<F: FnMut(&str) + Send + 'static>(&mut self, mut handler: F) -> &mut Self {
        self.on(EventKind::Error, move |event| {
            if let MotionEvent::Error(message) = event {
                handler(message);
            }
        })
    }

    pub fn on_swipe_left<F: FnMut() + Send + 'static>(&mut self, mut handler: F) -> &mut Self {
        self.on(EventKind::SwipeLeft, move |_| handler())
    }

    pub fn on_swipe_right<F: FnMut() + Send + 'static>(&mut self, mut handler: F) -> &mut Self {
        self.on(EventKind::SwipeRight, move |_| handler())
    }

    pub fn on_swipe_up<F: FnMut() + Send + 'static>(&mut self, mut handler: F) -> &mut Self {
        self.on(EventKind::SwipeUp, move |_| handler())
    }

    pub fn on_swipe_down<F: FnMut() + Send + 'static>(&mut self, mut handler: F) -> &mut Self {
        self.on(EventKind::SwipeDown, move |_| handler())
    }

    pub fn has_subscribers(&self, kind: EventKind) -> bool {
        self.handlers.get(&kind).is_some_and(|list| !list.is_empty())
    }
}

impl EventSink for Subscribers {
    fn emit(&mut self, event: MotionEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                handler(&event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use crossbeam_channel::unbounded;

    use super::*;

    #[test]
    fn dispatches_by_kind() {
        let lefts = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let mut subscribers = Subscribers::new();
        {
            let lefts = lefts.clone();
            subscribers.on_swipe_left(move || {
                lefts.fetch_add(1, Ordering::SeqCst);
            });
        }
        {
            let errors = errors.clone();
            subscribers.on_error(move |message| {
                assert_eq!(message, "boom");
                errors.fetch_add(1, Ordering::SeqCst);
            });
        }

        subscribers.emit(MotionEvent::SwipeLeft);
        subscribers.emit(MotionEvent::SwipeRight);
        subscribers.emit(MotionEvent::Error("boom".to_string()));
        subscribers.emit(MotionEvent::SwipeLeft);

        assert_eq!(lefts.load(Ordering::SeqCst), 2);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(subscribers.has_subscribers(EventKind::SwipeLeft));
        assert!(!subscribers.has_subscribers(EventKind::SwipeUp));
    }

    #[test]
    fn channel_sink_preserves_order() {
        let (tx, rx) = unbounded();
        let mut sink = tx;
        sink.emit(MotionEvent::Started);
        sink.emit(MotionEvent::SwipeUp);

        let kinds: Vec<_> = rx.try_iter().map(|event| event.kind()).collect();
        assert_eq!(kinds, vec![EventKind::Started, EventKind::SwipeUp]);
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut sink = tx;
        sink.emit(MotionEvent::Stopped);
    }
}
