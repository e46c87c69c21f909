use crate::app::{DiagramRuntime, Message};
use crate::engine::DiagramEngine;

impl<E: DiagramEngine + 'static> DiagramRuntime<E> {
    /// Run one turn of the event loop.
    ///
    /// Host signals and posted messages are applied first, so everything
    /// that changed since the last turn is seen as one batch and starts at
    /// most one compile. Engine futures are then polled until they stall,
    /// and whatever settled is applied and announced to listeners.
    pub fn tick(&mut self) {
        self.poll_host();
        self.drain_inbox();
        self.flush_compile();
        self.pool.run_until_stalled();
        self.drain_inbox();
        self.dispatch_events();
    }

    /// Keep ticking until no compile is pending or in flight.
    ///
    /// Blocks the thread while the engine works. Intended for batch use
    /// (the CLI, tests with engines that always finish).
    pub fn run_until_settled(&mut self) {
        loop {
            self.tick();
            if self.in_flight.get() == 0 && !self.model.compile_requested() {
                break;
            }
            self.pool.run();
        }
    }

    fn poll_host(&mut self) {
        while let Ok(Some(is_dark)) = self.dark_rx.try_next() {
            tracing::debug!(is_dark, "host dark mode changed");
            self.send(Message::DarkModeChanged(is_dark));
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(Some(msg)) = self.inbox_rx.try_next() {
            self.send(msg);
        }
    }
}
