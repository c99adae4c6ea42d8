//! The auto-settings actor.
//!
//! The auto-announce flag lives inside one task. Everyone else talks to it
//! through an [`AutoSettingsHandle`]; requests are served one at a time in
//! arrival order, so a `get` observes exactly the toggles queued before it.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::ActorStopped;

/// Snapshot of the auto settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AutoSettings {
    /// Announce every new song in the room.
    pub auto_announce_last: bool,
}

#[derive(Debug)]
enum Request {
    ToggleLast,
    Get(oneshot::Sender<AutoSettings>),
}

/// Cloneable handle to the actor. The actor stops when the last handle is
/// dropped.
#[derive(Clone, Debug)]
pub struct AutoSettingsHandle {
    tx: mpsc::Sender<Request>,
}

impl AutoSettingsHandle {
    /// Flip `auto_announce_last`.
    pub async fn toggle_last(&self) -> Result<(), ActorStopped> {
        self.tx
            .send(Request::ToggleLast)
            .await
            .map_err(|_| ActorStopped)
    }

    /// Current settings.
    pub async fn get(&self) -> Result<AutoSettings, ActorStopped> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Request::Get(reply_tx))
            .await
            .map_err(|_| ActorStopped)?;
        reply_rx.await.map_err(|_| ActorStopped)
    }
}

/// Spawn the actor with everything off.
pub fn spawn_auto_settings() -> AutoSettingsHandle {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(run(rx));
    AutoSettingsHandle { tx }
}

async fn run(mut requests: mpsc::Receiver<Request>) {
    let mut current = AutoSettings::default();
    while let Some(request) = requests.recv().await {
        match request {
            Request::ToggleLast => current.auto_announce_last = !current.auto_announce_last,
            Request::Get(reply) => {
                let _ = reply.send(current);
            }
        }
    }
    debug!("auto-settings actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_off() {
        let settings = spawn_auto_settings();
        assert_eq!(settings.get().await.unwrap(), AutoSettings::default());
    }

    #[tokio::test]
    async fn test_toggle_flips() {
        let settings = spawn_auto_settings();

        settings.toggle_last().await.unwrap();
        assert!(settings.get().await.unwrap().auto_announce_last);

        settings.toggle_last().await.unwrap();
        assert!(!settings.get().await.unwrap().auto_announce_last);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let a = spawn_auto_settings();
        let b = a.clone();

        a.toggle_last().await.unwrap();
        assert!(b.get().await.unwrap().auto_announce_last);
    }
}
