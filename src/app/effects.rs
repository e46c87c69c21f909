use std::rc::Rc;

use futures::task::LocalSpawnExt;

use crate::app::{DiagramRuntime, Message};
use crate::compiler::CompileJob;
use crate::engine::DiagramEngine;

impl<E: DiagramEngine + 'static> DiagramRuntime<E> {
    /// Start the pending compile, if one was requested.
    ///
    /// Blank source short-circuits to idle without touching the engine.
    pub(super) fn flush_compile(&mut self) {
        if !self.model.take_compile_request() {
            return;
        }
        match self.model.prepare_compile() {
            None => {
                // Supersede anything still in flight.
                self.compiler.issue();
                self.compiler.clear();
                self.send(Message::CompileSkipped);
            }
            Some(job) => {
                let seq = self.compiler.issue();
                self.send(Message::CompileStarted(seq));
                self.spawn_compile(seq, job);
            }
        }
    }

    fn spawn_compile(&mut self, seq: u64, job: CompileJob) {
        let compiler = Rc::clone(&self.compiler);
        let inbox = self.inbox_tx.clone();
        let in_flight = Rc::clone(&self.in_flight);
        let task = async move {
            if let Some(outcome) = compiler.run(seq, job).await {
                let _ = inbox.unbounded_send(Message::CompileSettled(outcome));
            }
            in_flight.set(in_flight.get() - 1);
        };

        match self.pool.spawner().spawn_local(task) {
            Ok(()) => self.in_flight.set(self.in_flight.get() + 1),
            Err(err) => {
                tracing::error!(seq, error = %err, "failed to spawn compile task");
                self.send(Message::CompileSettled(crate::compiler::CompileOutcome {
                    seq,
                    result: Err(format!("failed to start compile: {err}")),
                }));
            }
        }
    }

    pub(super) fn dispatch_events(&mut self) {
        for event in self.model.take_events() {
            for listener in &mut self.listeners {
                listener(&event);
            }
        }
    }
}
