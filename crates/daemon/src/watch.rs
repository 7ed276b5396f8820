use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use library::Scanner;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::scan::run_scan;
use crate::state::AppState;

pub fn configure_watcher(state: &AppState, scanner: Arc<Scanner>, root: PathBuf) {
    let config = state.config.read().clone();
    if !config.watch_library {
        info!("Watcher disabled (watch_library=false)");
        *state.watcher.write() = None;
        return;
    }

    let watch_debounce_secs = if config.watch_debounce_secs == 0 {
        2
    } else {
        config.watch_debounce_secs
    };
    let watch_debounce = Duration::from_secs(watch_debounce_secs);

    match setup_watcher(state.clone(), scanner, root.clone(), watch_debounce) {
        Ok(watcher) => {
            info!(
                "Watching {} for changes (debounce {}s)",
                root.display(),
                watch_debounce.as_secs()
            );
            *state.watcher.write() = Some(watcher);
        }
        Err(err) => {
            warn!("Failed to start watcher: {}", err);
            *state.watcher.write() = None;
        }
    }
}

fn setup_watcher(
    state: AppState,
    scanner: Arc<Scanner>,
    root: PathBuf,
    debounce: Duration,
) -> Result<RecommendedWatcher, notify::Error> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    tokio::spawn(async move {
        watch_loop(state, scanner, rx, debounce).await;
    });

    Ok(watcher)
}

/// Waits for a relevant event, then for `debounce` of quiet, then rescans.
async fn watch_loop(
    state: AppState,
    scanner: Arc<Scanner>,
    mut rx: UnboundedReceiver<Event>,
    debounce: Duration,
) {
    loop {
        let event = match rx.recv().await {
            Some(event) => event,
            None => break,
        };
        if !is_relevant_event(&event) {
            continue;
        }
        if !wait_for_quiet(&mut rx, debounce).await {
            return;
        }
        info!("Library changed; rescanning");
        run_scan(&state, Arc::clone(&scanner)).await;
    }
}

/// Returns once `debounce` has passed without a relevant event, or `false`
/// when the channel closes first. Irrelevant events do not push the deadline.
async fn wait_for_quiet(rx: &mut UnboundedReceiver<Event>, debounce: Duration) -> bool {
    let deadline = tokio::time::sleep(debounce);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => return true,
            maybe_event = rx.recv() => match maybe_event {
                Some(event) if is_relevant_event(&event) => {
                    deadline.as_mut().reset(tokio::time::Instant::now() + debounce);
                }
                Some(_) => {}
                None => return false,
            },
        }
    }
}

fn is_relevant_event(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

#[cfg(test)]
mod tests {
    use super::{is_relevant_event, wait_for_quiet};
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
    use notify::{Event, EventKind};
    use std::time::Duration;

    #[test]
    fn only_content_changes_trigger_rescans() {
        assert!(is_relevant_event(&Event::new(EventKind::Create(CreateKind::File))));
        assert!(is_relevant_event(&Event::new(EventKind::Modify(ModifyKind::Any))));
        assert!(is_relevant_event(&Event::new(EventKind::Remove(RemoveKind::Folder))));
        assert!(!is_relevant_event(&Event::new(EventKind::Access(AccessKind::Read))));
    }

    #[tokio::test]
    async fn access_events_do_not_delay_rescan() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
        let sender = tokio::spawn(async move {
            for _ in 0..50 {
                if tx.send(Event::new(EventKind::Access(AccessKind::Read))).is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let quiet = tokio::time::timeout(
            Duration::from_millis(300),
            wait_for_quiet(&mut rx, Duration::from_millis(50)),
        )
        .await;
        assert_eq!(quiet.ok(), Some(true));
        sender.abort();
    }

    #[tokio::test]
    async fn closed_channel_stops_waiting() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
        tx.send(Event::new(EventKind::Modify(ModifyKind::Any))).unwrap();
        drop(tx);
        assert!(!wait_for_quiet(&mut rx, Duration::from_secs(5)).await);
    }
}
