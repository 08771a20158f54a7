use crate::world::state::WorldState;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce(&mut WorldState) + Send>;

enum Command {
    Run(Job),
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("game thread is not running")]
    Stopped,
    #[error("game thread dropped the reply")]
    NoReply,
    #[error("game thread panicked")]
    Panicked,
}

/// Owns the world on a dedicated thread. Every mutation is sent in as a
/// closure and runs to completion before the next one starts, and decay is
/// swept between commands on the configured interval.
pub struct GameHandle {
    commands: Sender<Command>,
    thread: Option<JoinHandle<WorldState>>,
}

impl GameHandle {
    pub fn spawn(world: WorldState) -> Self {
        let (commands, inbox) = mpsc::channel();
        let thread = thread::spawn(move || run_loop(world, inbox));
        GameHandle {
            commands,
            thread: Some(thread),
        }
    }

    /// Runs `job` against the world and waits for its result.
    pub fn execute<T, F>(&self, job: F) -> Result<T, GameError>
    where
        T: Send + 'static,
        F: FnOnce(&mut WorldState) -> T + Send + 'static,
    {
        let (reply, answer) = mpsc::channel();
        let job: Job = Box::new(move |world| {
            let _ = reply.send(job(world));
        });
        self.commands
            .send(Command::Run(job))
            .map_err(|_| GameError::Stopped)?;
        answer.recv().map_err(|_| GameError::NoReply)
    }

    /// Queues `job` without waiting for it.
    pub fn submit<F>(&self, job: F) -> Result<(), GameError>
    where
        F: FnOnce(&mut WorldState) + Send + 'static,
    {
        self.commands
            .send(Command::Run(Box::new(job)))
            .map_err(|_| GameError::Stopped)
    }

    /// Stops the thread after the queued commands and hands the world back.
    pub fn shutdown(mut self) -> Result<WorldState, GameError> {
        let _ = self.commands.send(Command::Shutdown);
        let thread = self.thread.take().ok_or(GameError::Stopped)?;
        thread.join().map_err(|_| GameError::Panicked)
    }
}

impl Drop for GameHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.commands.send(Command::Shutdown);
            let _ = thread.join();
        }
    }
}

fn run_loop(mut world: WorldState, inbox: Receiver<Command>) -> WorldState {
    let interval = Duration::from_millis(world.decay_interval_ms());
    let mut last_sweep = Instant::now();
    tracing::debug!(interval_ms = interval.as_millis() as u64, "game thread started");
    loop {
        let wait = interval.saturating_sub(last_sweep.elapsed());
        match inbox.recv_timeout(wait) {
            Ok(Command::Run(job)) => job(&mut world),
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        let elapsed = last_sweep.elapsed();
        if elapsed >= interval {
            last_sweep = Instant::now();
            world.tick_decay(elapsed.as_millis() as u64);
        }
    }
    tracing::debug!(items = world.item_count(), "game thread stopped");
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::test_support::{fixture_world, GOLD, TORCH};

    #[test]
    fn commands_run_in_order_on_the_world() {
        let handle = GameHandle::spawn(fixture_world());
        let coins = handle
            .execute(|world| world.spawn_on_tile(GOLD, 10))
            .unwrap();
        handle
            .submit(move |world| {
                if let Some(item) = world.item_mut(coins) {
                    item.count = 7;
                }
            })
            .unwrap();
        let count = handle
            .execute(move |world| world.item(coins).map(|item| item.count))
            .unwrap();
        assert_eq!(count, Some(7));

        let world = handle.shutdown().unwrap();
        assert_eq!(world.item(coins).map(|item| item.count), Some(7));
    }

    #[test]
    fn decay_advances_while_idle() {
        let handle = GameHandle::spawn(fixture_world());
        let torch = handle
            .execute(|world| {
                let torch = world.spawn_on_tile(TORCH, 1);
                world.start_decay(torch);
                torch
            })
            .unwrap();
        thread::sleep(Duration::from_millis(2000));
        let world = handle.shutdown().unwrap();
        let remaining = world.item(torch).map(|item| item.duration()).unwrap_or(0);
        assert!(remaining < 2000, "torch still at {remaining}ms");
    }
}
