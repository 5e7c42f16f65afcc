//! Environment owner task.
//!
//! A single task owns the [`EnvironmentState`]. Every other task talks to
//! it through an [`EnvironmentHandle`]: commands travel over an mpsc
//! channel and the owner answers each one over a oneshot channel with the
//! state as it stands after the command. Commands are handled one at a
//! time, so every read-modify-write is atomic and every snapshot is
//! consistent across fields.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use homesim_domain::environment::{EnvironmentDelta, EnvironmentState};
use homesim_domain::error::SimError;

type Mutation = Box<dyn FnOnce(&mut EnvironmentState) + Send>;
/// Mutation that reports whether it changed anything.
type Guarded = Box<dyn FnOnce(&mut EnvironmentState) -> bool + Send>;

enum Command {
    Snapshot(oneshot::Sender<EnvironmentState>),
    Apply(EnvironmentDelta, oneshot::Sender<EnvironmentState>),
    Modify(Mutation, oneshot::Sender<EnvironmentState>),
    ModifyIf(Guarded, oneshot::Sender<Option<EnvironmentState>>),
}

const COMMAND_BUFFER: usize = 64;

/// Spawn the owner task.
///
/// The task ends once every handle has been dropped and yields the final
/// state.
#[must_use]
pub fn spawn(initial: EnvironmentState) -> (EnvironmentHandle, JoinHandle<EnvironmentState>) {
    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run(initial, receiver));
    (EnvironmentHandle { sender }, task)
}

async fn run(mut state: EnvironmentState, mut receiver: mpsc::Receiver<Command>) -> EnvironmentState {
    while let Some(command) = receiver.recv().await {
        let reply = match command {
            Command::Snapshot(reply) => reply,
            Command::Apply(delta, reply) => {
                state.apply(&delta);
                reply
            }
            Command::Modify(mutation, reply) => {
                mutation(&mut state);
                reply
            }
            Command::ModifyIf(mutation, reply) => {
                let applied = mutation(&mut state);
                let _ = reply.send(applied.then(|| state.clone()));
                continue;
            }
        };
        // the caller may have given up waiting
        let _ = reply.send(state.clone());
    }
    tracing::debug!(minute = state.minute, "environment owner stopped");
    state
}

/// Clonable access to the environment owner task.
#[derive(Clone)]
pub struct EnvironmentHandle {
    sender: mpsc::Sender<Command>,
}

impl EnvironmentHandle {
    /// Consistent copy of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotRunning`] if the owner task is gone.
    pub async fn snapshot(&self) -> Result<EnvironmentState, SimError> {
        self.request(Command::Snapshot).await
    }

    /// Apply an additive delta atomically and return the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotRunning`] if the owner task is gone.
    pub async fn apply(&self, delta: EnvironmentDelta) -> Result<EnvironmentState, SimError> {
        self.request(|reply| Command::Apply(delta, reply)).await
    }

    /// Run `mutation` on the state atomically and return the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotRunning`] if the owner task is gone.
    pub async fn modify<F>(&self, mutation: F) -> Result<EnvironmentState, SimError>
    where
        F: FnOnce(&mut EnvironmentState) + Send + 'static,
    {
        self.request(|reply| Command::Modify(Box::new(mutation), reply))
            .await
    }

    /// Run `mutation` atomically. It returns whether it applied; the
    /// resulting state is only returned when it did.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotRunning`] if the owner task is gone.
    pub async fn modify_if<F>(&self, mutation: F) -> Result<Option<EnvironmentState>, SimError>
    where
        F: FnOnce(&mut EnvironmentState) -> bool + Send + 'static,
    {
        self.request(|reply| Command::ModifyIf(Box::new(mutation), reply))
            .await
    }

    async fn request<T, F>(&self, build: F) -> Result<T, SimError>
    where
        F: FnOnce(oneshot::Sender<T>) -> Command,
    {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| SimError::NotRunning)?;
        response.await.map_err(|_| SimError::NotRunning)
    }
}
