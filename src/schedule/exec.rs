//! Wavefront execution over the kind graph
//!
//! Kinds move pending -> running -> done. A kind starts once every
//! transitive ancestor is done; all entities of a running kind are
//! processed concurrently under a run-wide permit cap. The first fatal
//! entity error cancels the run: in-flight deletions finish, nothing new
//! starts, and the recorded error is returned.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::collect::WorkingSet;
use super::graph::KindGraph;
use crate::config::Settings;
use crate::provider::{Action, Provider, ProviderRegistry};
use crate::resource::{Entity, Kind};

/// Classifies a deletion error as "resource already absent" (non-fatal).
pub type AbsentClassifier = Arc<dyn Fn(&anyhow::Error) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindState {
    Pending,
    Running,
    Done,
}

/// Run every accepted entity through `action`, honoring the kind graph's
/// ordering. Returns the first fatal error if the run was aborted.
pub(crate) async fn execute(
    registry: &ProviderRegistry,
    settings: &Arc<Settings>,
    action: &Arc<dyn Action>,
    absent: &AbsentClassifier,
    graph: &KindGraph,
    mut set: WorkingSet,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Result<()> {
    let total = graph.len();
    if total == 0 {
        return Ok(());
    }

    // child token so an internal abort does not cancel the caller's token
    let cancel = cancel.child_token();
    let permits = Arc::new(Semaphore::new(concurrency));
    let first_error: Arc<Mutex<Option<anyhow::Error>>> = Arc::default();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Kind>();

    // ancestor sets are fixed once execution starts; resolve them up front
    let ancestors: HashMap<Kind, HashSet<Kind>> =
        graph.kinds().map(|k| (k, graph.ancestors(k))).collect();

    let mut state: HashMap<Kind, KindState> =
        graph.kinds().map(|k| (k, KindState::Pending)).collect();
    let mut done: HashSet<Kind> = HashSet::with_capacity(total);
    let mut running = 0usize;

    let ctx = KindTaskContext {
        settings: Arc::clone(settings),
        action: Arc::clone(action),
        absent: Arc::clone(absent),
        permits,
        first_error: Arc::clone(&first_error),
        cancel: cancel.clone(),
        done_tx,
    };

    for kind in graph.roots() {
        start_kind(registry, &ctx, &mut set, kind)?;
        state.insert(kind, KindState::Running);
        running += 1;
    }

    let mut done_count = 0usize;
    while done_count < total {
        let Some(kind) = done_rx.recv().await else {
            // all senders live in kind tasks; the loop holds ctx until every
            // kind has started, so this cannot happen on a well-formed graph
            bail!("kind completion channel closed with {} kinds outstanding", total - done_count);
        };
        state.insert(kind, KindState::Done);
        done.insert(kind);
        done_count += 1;
        running -= 1;
        debug!(kind = %kind, done = done_count, total, "kind complete");

        if cancel.is_cancelled() {
            // drain what is already running, start nothing new
            if running == 0 {
                break;
            }
            continue;
        }

        let ready: Vec<Kind> = state
            .iter()
            .filter(|(_, st)| **st == KindState::Pending)
            .filter(|(k, _)| ancestors[*k].iter().all(|a| done.contains(a)))
            .map(|(k, _)| *k)
            .collect();
        for kind in ready {
            start_kind(registry, &ctx, &mut set, kind)?;
            state.insert(kind, KindState::Running);
            running += 1;
        }

        if running == 0 && done_count < total {
            // the graph is acyclic, so some pending kind must have been
            // startable; reaching here means the scheduler lost track
            bail!(
                "scheduler stalled with {} kinds pending",
                total - done_count
            );
        }
    }

    let recorded = {
        let mut slot = first_error.lock().unwrap_or_else(|e| e.into_inner());
        slot.take()
    };
    if let Some(err) = recorded {
        return Err(err);
    }
    if cancel.is_cancelled() {
        bail!("run canceled");
    }

    info!(kinds = total, "execution complete");
    Ok(())
}

/// Shared handles every kind task needs.
struct KindTaskContext {
    settings: Arc<Settings>,
    action: Arc<dyn Action>,
    absent: AbsentClassifier,
    permits: Arc<Semaphore>,
    first_error: Arc<Mutex<Option<anyhow::Error>>>,
    cancel: CancellationToken,
    done_tx: mpsc::UnboundedSender<Kind>,
}

fn start_kind(
    registry: &ProviderRegistry,
    ctx: &KindTaskContext,
    set: &mut WorkingSet,
    kind: Kind,
) -> Result<()> {
    let entities = set.take(kind);
    let provider = registry
        .get(kind)
        .map(|r| Arc::clone(&r.provider))
        .ok_or_else(|| anyhow!("kind {kind} scheduled without a registered provider"))?;

    debug!(kind = %kind, entities = entities.len(), "kind started");

    let settings = Arc::clone(&ctx.settings);
    let action = Arc::clone(&ctx.action);
    let absent = Arc::clone(&ctx.absent);
    let permits = Arc::clone(&ctx.permits);
    let first_error = Arc::clone(&ctx.first_error);
    let cancel = ctx.cancel.clone();
    let done_tx = ctx.done_tx.clone();

    tokio::spawn(async move {
        let mut tasks = JoinSet::new();

        for entity in entities {
            // hold off spawning until a permit is free, so cancellation can
            // cut the queue before work starts rather than after
            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };

            let settings = Arc::clone(&settings);
            let action = Arc::clone(&action);
            let provider = Arc::clone(&provider);
            let absent = Arc::clone(&absent);
            let first_error = Arc::clone(&first_error);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = permit;
                run_one(&settings, &*action, &*provider, &absent, &first_error, &cancel, entity)
                    .await;
            });
        }

        while tasks.join_next().await.is_some() {}
        // receiver only drops after every kind reported; ignore the race
        let _ = done_tx.send(kind);
    });

    Ok(())
}

async fn run_one(
    settings: &Settings,
    action: &dyn Action,
    provider: &dyn Provider,
    absent: &AbsentClassifier,
    first_error: &Mutex<Option<anyhow::Error>>,
    cancel: &CancellationToken,
    entity: Entity,
) {
    match action.run(settings, provider, &entity).await {
        Ok(()) => {}
        Err(err) if absent(&err) => {
            warn!(entity = %entity, "resource already gone, treating as deleted");
        }
        Err(err) => {
            error!(entity = %entity, error = ?err, "processing failed, aborting run");
            let mut slot = first_error.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_none() {
                *slot = Some(err.context(format!("processing {entity}")));
            }
            drop(slot);
            cancel.cancel();
        }
    }
}
