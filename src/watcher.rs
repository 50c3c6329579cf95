use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::panel::{Panel, PanelEntity, SharedPanel};
use crate::store::ChangeEvent;

/// Background listener that re-lists a panel when a watched table changes.
///
/// Lives as long as the panel is mounted; dropping it stops the task.
pub struct PanelWatcher {
    title: &'static str,
    handle: JoinHandle<()>,
}

impl PanelWatcher {
    pub fn spawn<E: PanelEntity>(
        panel: SharedPanel<E>,
        mut events: broadcast::Receiver<ChangeEvent>,
    ) -> Self {
        let watches = Panel::<E>::watches();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if watches.iter().any(|watch| watch.matches(&event)) {
                            debug!("{} panel refreshing after {:?}", E::TITLE, event);
                            panel.lock().await.reload().await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("{} panel missed {} change events; refreshing", E::TITLE, skipped);
                        panel.lock().await.reload().await;
                    }
                    Err(RecvError::Closed) => {
                        info!("change feed closed; {} watcher exiting", E::TITLE);
                        break;
                    }
                }
            }
        });

        Self {
            title: E::TITLE,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for PanelWatcher {
    fn drop(&mut self) {
        debug!("stopping {} watcher", self.title);
        self.handle.abort();
    }
}
