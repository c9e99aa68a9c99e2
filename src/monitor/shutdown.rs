use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// Fires the shutdown request. Cloneable so several sources can share one loop.
#[derive(Clone)]
pub struct ShutdownTrigger(Sender<()>);

impl ShutdownTrigger {
    pub fn fire(&self) {
        // The loop may already be gone, nothing left to stop then.
        let _ = self.0.send(());
    }
}

/// Interruptible wait used between polls
pub struct Shutdown {
    rx: Receiver<()>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = mpsc::channel();
        (ShutdownTrigger(tx), Shutdown { rx })
    }

    /// Block for up to `timeout`. Returns `true` if shutdown was requested.
    ///
    /// When every trigger has been dropped no request can arrive any more,
    /// so this degrades to a plain sleep instead of returning immediately.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                false
            }
        }
    }
}

/// Spawn a listener thread that fires `trigger` on Ctrl+C.
///
/// The runtime is built here so a failure surfaces before monitoring starts.
/// A second Ctrl+C exits the process immediately, for when the loop is stuck.
pub fn listen_for_interrupt(trigger: ShutdownTrigger) -> io::Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    thread::Builder::new().name("interrupt".into()).spawn(move || {
        runtime.block_on(relay_interrupts(tokio::signal::ctrl_c, trigger, || {
            eprintln!("Interrupted again, exiting immediately");
            std::process::exit(FORCED_EXIT_CODE);
        }));
    })
}

// 128 + SIGINT
const FORCED_EXIT_CODE: i32 = 130;

/// First signal requests a graceful stop, the second calls `force_exit`.
async fn relay_interrupts<F, Fut>(mut next_signal: F, trigger: ShutdownTrigger, force_exit: impl FnOnce())
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Interrupt received, stopping monitor");
    trigger.fire();

    match next_signal().await {
        Ok(()) => {
            warn!("Second interrupt received, forcing exit");
            force_exit();
        }
        Err(e) => error!("Failed to listen for a second Ctrl+C: {}", e),
    }
}
