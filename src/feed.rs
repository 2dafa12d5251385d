use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::source::{LeagueSource, fetch_slice};
use crate::state::{Delta, ProviderCommand};

/// Run fetches for one screen. Commands are handled in arrival order; every
/// fetch runs on its own pool job and reports back as a [`Delta`]. The thread
/// exits once the command sender is dropped.
pub fn spawn_provider(
    source: Arc<dyn LeagueSource>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    parallelism: usize,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let pool = build_fetch_pool(parallelism);
        while let Ok(cmd) = cmd_rx.recv() {
            let source = source.clone();
            let tx = tx.clone();
            let job = move || run_command(source.as_ref(), cmd, &tx);
            if let Some(pool) = pool.as_ref() {
                pool.spawn(job);
            } else {
                thread::spawn(job);
            }
        }
        debug!("provider command channel closed");
    })
}

fn run_command(source: &dyn LeagueSource, cmd: ProviderCommand, tx: &Sender<Delta>) {
    let delta = match cmd {
        ProviderCommand::FetchCatalog {
            entity_id,
            activation,
        } => match contained(|| source.fetch_period_catalog(entity_id)) {
            Ok(catalog) => Delta::SetCatalog {
                entity_id,
                activation,
                catalog,
            },
            Err(err) => {
                warn!(entity_id, error = %err, "season catalog fetch failed");
                Delta::CatalogFailed {
                    entity_id,
                    activation,
                    message: err.to_string(),
                }
            }
        },
        ProviderCommand::FetchSlice {
            entity_id,
            year,
            slice,
            request,
        } => match contained(|| fetch_slice(source, slice, entity_id, year)) {
            Ok(payload) => Delta::SetSlice {
                entity_id,
                year,
                request,
                payload,
            },
            Err(err) => {
                warn!(entity_id, year, slice = slice.label(), error = %err, "slice fetch failed");
                Delta::SliceFailed {
                    entity_id,
                    year,
                    request,
                    slice,
                    message: err.to_string(),
                }
            }
        },
    };
    // The screen may already be gone.
    let _ = tx.send(delta);
}

// Panics in a source surface as fetch errors.
fn contained<T>(fetch: impl FnOnce() -> Result<T, FetchError>) -> Result<T, FetchError> {
    panic::catch_unwind(AssertUnwindSafe(fetch))
        .unwrap_or_else(|_| Err(FetchError::unavailable("source panicked")))
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|idx| format!("fetch-{idx}"))
        .build()
        .ok()
}
