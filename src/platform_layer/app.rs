/*
 * The console platform's run loop. It feeds `AppEvent`s (typed by the user, or a
 * scripted list for one-shot runs) to the application logic and executes every
 * `PlatformCommand` the logic enqueues in response, in order, before the next
 * event is dispatched.
 */
use super::command_executor::{ConsoleExecutor, ExecutionOutcome};
use super::console;
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{AppEvent, PlatformEventHandler};
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

const PROMPT: &str = "prompt_packer> ";

pub struct PlatformInterface<W: Write> {
    executor: ConsoleExecutor<W>,
}

impl<W: Write> PlatformInterface<W> {
    pub fn new(executor: ConsoleExecutor<W>) -> Self {
        PlatformInterface { executor }
    }

    #[cfg(test)]
    pub(crate) fn executor(&self) -> &ConsoleExecutor<W> {
        &self.executor
    }

    /* Hands one event to the handler and drains the resulting command queue. */
    pub fn dispatch(
        &mut self,
        event_handler: &Arc<Mutex<dyn PlatformEventHandler>>,
        event: AppEvent,
    ) -> PlatformResult<ExecutionOutcome> {
        let mut handler = event_handler
            .lock()
            .map_err(|_| PlatformError::OperationFailed("Event handler lock poisoned".into()))?;
        handler.handle_event(event);

        let mut outcome = ExecutionOutcome::Continue;
        while let Some(command) = handler.try_dequeue_command() {
            if self.executor.execute(command)? == ExecutionOutcome::Quit {
                outcome = ExecutionOutcome::Quit;
            }
        }
        Ok(outcome)
    }

    fn finish(&mut self, event_handler: &Arc<Mutex<dyn PlatformEventHandler>>) {
        if let Ok(mut handler) = event_handler.lock() {
            handler.on_quit();
        }
        log::debug!("Platform: Run loop exited cleanly.");
    }

    /* Dispatches a fixed list of events, stopping early if one of them quits. */
    pub fn run_events(
        &mut self,
        event_handler: Arc<Mutex<dyn PlatformEventHandler>>,
        events: Vec<AppEvent>,
    ) -> PlatformResult<()> {
        for event in events {
            if self.dispatch(&event_handler, event)? == ExecutionOutcome::Quit {
                break;
            }
        }
        self.finish(&event_handler);
        Ok(())
    }

    /*
     * Reads commands line by line until `quit` or end of input. Lines that do not
     * parse are answered with a message and otherwise ignored.
     */
    pub fn run_interactive<R: BufRead>(
        &mut self,
        event_handler: Arc<Mutex<dyn PlatformEventHandler>>,
        input: R,
        prompt: &mut dyn Write,
    ) -> PlatformResult<()> {
        write!(prompt, "{PROMPT}")?;
        prompt.flush()?;
        for line in input.lines() {
            let line = line?;
            match console::parse_command(&line) {
                Ok(event) => {
                    if self.dispatch(&event_handler, event)? == ExecutionOutcome::Quit {
                        break;
                    }
                }
                Err(e) => writeln!(prompt, "{e}")?,
            }
            write!(prompt, "{PROMPT}")?;
            prompt.flush()?;
        }
        self.finish(&event_handler);
        Ok(())
    }
}
