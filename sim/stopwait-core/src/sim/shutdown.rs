use tokio::sync::broadcast;

/// A struct which can be used to shut down a simulation.
/// You can create multiple connected shutdowns by cloning.
///
/// Each clone starts listening as soon as it is created, so a shutdown sent
/// while its holder is busy elsewhere is still seen on the next wait.
#[derive(Debug)]
pub struct Shutdown {
    /// This channel can be used tell the simulation to shut down.
    notify: broadcast::Sender<ExitStatus>,
    listener: broadcast::Receiver<ExitStatus>,
    /// Keeps track of the last status received
    /// So users can call `wait_for_shutdown` multiple times
    last_status: Option<ExitStatus>,
}

impl Shutdown {
    /// Creates a new active shutdown.
    pub fn new() -> Self {
        let (notify, listener) = broadcast::channel(1);
        Self {
            notify,
            listener,
            last_status: None,
        }
    }

    /// Sends `ExitStatus::Exited` to all `Shutdowns` cloned from this one.
    pub fn shut_down(&self) {
        self.shut_down_with_status(ExitStatus::Exited)
    }

    /// Sends `status` to all `Shutdowns` cloned from this one.
    pub fn shut_down_with_status(&self, status: ExitStatus) {
        if let Err(e) = self.notify.send(status) {
            tracing::error!("Failed to initiate shutdown: {}", e);
        }
    }

    /// Waits to receive a shutdown status.
    pub async fn wait_for_shutdown(&mut self) -> ExitStatus {
        use tokio::sync::broadcast::error::RecvError;

        if let Some(status) = self.last_status {
            return status;
        }

        loop {
            match self.listener.recv().await {
                Ok(status) => {
                    self.last_status = Some(status);
                    return status;
                }
                // Unreachable while we hold a sender ourselves
                Err(RecvError::Closed) => return ExitStatus::Exited,
                Err(RecvError::Lagged(_)) => (),
            }
        }
    }
}

impl Clone for Shutdown {
    fn clone(&self) -> Self {
        Self {
            notify: self.notify.clone(),
            listener: self.notify.subscribe(),
            last_status: self.last_status,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a simulation stopped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExitStatus {
    /// The simulation ran for its configured time
    Exited,
    /// The simulation was stopped early from outside
    Interrupted,
}
