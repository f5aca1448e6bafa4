//! Fixed-period engine thread with a command queue.
//!
//! All engine mutation happens on one thread. Commands and subscriptions arrive
//! over an mpsc queue and are drained between ticks, so a command is either
//! fully applied before a tick starts or waits for the next one.

use std::ops::ControlFlow;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use tk_sim::{Command, Engine, Snapshot};

use crate::error::{AppError, AppResult};

/// Tracks when the next tick is due.
///
/// Deadlines advance by whole periods. A tick that finishes after its
/// successor's deadline re-anchors the schedule on the current instant
/// instead of firing a catch-up burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    period: Duration,
    next_deadline: Instant,
}

impl TickClock {
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next_deadline: start + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    pub fn time_until_tick(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }

    /// Schedule the next deadline after a tick completed at `now`.
    pub fn advance(&mut self, now: Instant) {
        self.next_deadline += self.period;
        if self.next_deadline <= now {
            self.next_deadline = now + self.period;
        }
    }
}

enum Message {
    Command(Command),
    Subscribe(Sender<Snapshot>),
    Shutdown,
}

pub struct EngineRunner;

impl EngineRunner {
    /// Move the engine onto its own thread and start the clock.
    pub fn start(engine: Engine, period: Duration) -> AppResult<EngineHandle> {
        if period.is_zero() {
            return Err(AppError::Runner {
                message: "tick period must be positive".to_string(),
            });
        }
        let (tx, rx) = channel();
        let handle = thread::Builder::new()
            .name("tk-engine".to_string())
            .spawn(move || Self::run(engine, period, rx))?;

        Ok(EngineHandle {
            tx,
            join: Some(handle),
        })
    }

    fn run(mut engine: Engine, period: Duration, rx: Receiver<Message>) -> Engine {
        info!(period_ms = period.as_millis() as u64, "engine started");
        let mut clock = TickClock::new(period, Instant::now());
        let mut subscribers: Vec<Sender<Snapshot>> = Vec::new();

        'ticks: loop {
            // Everything already queued is handled before the next tick, even
            // when the previous tick overran its period.
            loop {
                match rx.try_recv() {
                    Ok(message) => {
                        if Self::handle(&mut engine, &mut subscribers, message).is_break() {
                            break 'ticks;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => break 'ticks,
                }
            }

            let wait = clock.time_until_tick(Instant::now());
            if !wait.is_zero() {
                match rx.recv_timeout(wait) {
                    Ok(message) => {
                        if Self::handle(&mut engine, &mut subscribers, message).is_break() {
                            break;
                        }
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }

            let snapshot = engine.tick();
            clock.advance(Instant::now());

            let alarms = snapshot.alarms.active();
            if !alarms.is_empty() {
                debug!(tick = snapshot.tick, ?alarms, "alarms active");
            }
            subscribers.retain(|s| s.send(snapshot.clone()).is_ok());
        }

        info!(ticks = engine.ticks(), "engine stopped");
        engine
    }

    fn handle(
        engine: &mut Engine,
        subscribers: &mut Vec<Sender<Snapshot>>,
        message: Message,
    ) -> ControlFlow<()> {
        match message {
            Message::Command(command) => {
                if let Err(e) = engine.apply(command) {
                    warn!(%command, error = %e, "command rejected");
                }
            }
            Message::Subscribe(subscriber) => subscribers.push(subscriber),
            Message::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }
}

/// Owner-side handle to a running engine.
///
/// Dropping the handle stops the engine and waits for the thread.
pub struct EngineHandle {
    tx: Sender<Message>,
    join: Option<JoinHandle<Engine>>,
}

impl EngineHandle {
    /// Queue a command for the next tick boundary.
    pub fn send(&self, command: Command) -> AppResult<()> {
        send_command(&self.tx, command)
    }

    /// A cloneable sender for issuing commands from other threads.
    pub fn commander(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Receive one snapshot per tick from now on.
    pub fn subscribe(&self) -> AppResult<Receiver<Snapshot>> {
        let (tx, rx) = channel();
        self.tx
            .send(Message::Subscribe(tx))
            .map_err(|_| AppError::Runner {
                message: "engine thread is not running".to_string(),
            })?;
        Ok(rx)
    }

    /// Stop the clock, let any in-flight tick finish, and hand the engine back.
    pub fn stop(mut self) -> AppResult<Engine> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> AppResult<Engine> {
        let _ = self.tx.send(Message::Shutdown);
        let join = self.join.take().ok_or_else(|| AppError::Runner {
            message: "engine already stopped".to_string(),
        })?;
        join.join().map_err(|_| AppError::Runner {
            message: "engine thread panicked".to_string(),
        })
    }
}

fn send_command(tx: &Sender<Message>, command: Command) -> AppResult<()> {
    tx.send(Message::Command(command))
        .map_err(|_| AppError::Runner {
            message: "engine thread is not running".to_string(),
        })
}

/// Command-only access to a running engine.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Message>,
}

impl CommandSender {
    pub fn send(&self, command: Command) -> AppResult<()> {
        send_command(&self.tx, command)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            let _ = self.shutdown();
        }
    }
}
