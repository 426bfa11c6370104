//! Dependency-aware deletion scheduling
//!
//! A [`Plan`] ties the pieces together: it builds the kind graph from the
//! registry's static dependency declarations, discovers entities (merging
//! implied edges into the graph as it goes), then executes the per-entity
//! action kind-by-kind along the graph's wavefront.

pub mod collect;
pub mod exec;
pub mod graph;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Settings;
use crate::provider::{Action, ProviderRegistry};
use crate::resource::Entity;

pub use collect::WorkingSet;
pub use exec::AbsentClassifier;
pub use graph::{GraphError, KindGraph};

/// Default cap on concurrently processed entities across the whole run.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// A configured deletion run.
pub struct Plan {
    registry: ProviderRegistry,
    settings: Arc<Settings>,
    filter: Arc<dyn Fn(&Entity) -> bool + Send + Sync>,
    action: Arc<dyn Action>,
    absent: AbsentClassifier,
    concurrency: usize,
}

impl Plan {
    /// Build a plan over `registry`. `filter` selects which discovered root
    /// entities are in scope; `action` runs once per accepted entity.
    pub fn new(
        registry: ProviderRegistry,
        settings: Settings,
        filter: impl Fn(&Entity) -> bool + Send + Sync + 'static,
        action: Arc<dyn Action>,
    ) -> Self {
        Self {
            registry,
            settings: Arc::new(settings),
            filter: Arc::new(filter),
            action,
            absent: Arc::new(crate::aws::is_not_found_error),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Override the "resource already absent" error classifier. The default
    /// recognizes AWS not-found error codes.
    pub fn with_absent_classifier(
        mut self,
        classifier: impl Fn(&anyhow::Error) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.absent = Arc::new(classifier);
        self
    }

    /// The kind graph from static declarations only, before discovery.
    fn build_graph(&self) -> Result<KindGraph> {
        let mut graph = KindGraph::new();
        for kind in self.registry.kinds() {
            graph.add_kind(kind);
        }
        for registered in self.registry.iter() {
            let kind = registered.kind();
            for &dep in &registered.static_deps {
                graph
                    .add_edge(dep, kind)
                    .with_context(|| format!("static dependency {dep} of {kind}"))?;
            }
        }
        Ok(graph)
    }

    /// Discover and process everything in scope.
    ///
    /// Nothing is deleted until discovery has completed for every provider;
    /// any discovery error aborts the run before the first action fires.
    /// Cancelling `cancel` stops the run after in-flight actions finish.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut graph = self.build_graph()?;
        info!(
            kinds = graph.len(),
            region = %self.settings.region,
            "starting discovery"
        );

        let set = collect::collect(
            &self.registry,
            &self.settings,
            self.filter.as_ref(),
            &mut graph,
            &cancel,
        )
        .await?;

        // incremental edge checks already guarantee this; cheap to re-verify
        // before anything destructive starts
        graph.ensure_acyclic()?;

        exec::execute(
            &self.registry,
            &self.settings,
            &self.action,
            &self.absent,
            &graph,
            set,
            self.concurrency,
            &cancel,
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted providers and a recording action for scheduler tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::config::Settings;
    use crate::provider::{Action, Capabilities, Provider};
    use crate::resource::{Entity, Kind};

    pub fn ent(kind: Kind, id: &str) -> Entity {
        Entity::new(kind, vec![id.to_string()])
    }

    /// A provider scripted with fixed roots and dependents.
    pub struct FakeProvider {
        kind: Kind,
        caps: Capabilities,
        static_deps: Vec<Kind>,
        global: bool,
        roots: Vec<Entity>,
        dependents: HashMap<String, Vec<Entity>>,
        scanned: Arc<AtomicBool>,
    }

    impl FakeProvider {
        pub fn new(kind: Kind) -> Self {
            Self {
                kind,
                caps: Capabilities::NONE,
                static_deps: Vec::new(),
                global: false,
                roots: Vec::new(),
                dependents: HashMap::new(),
                scanned: Arc::new(AtomicBool::new(false)),
            }
        }

        pub fn with_roots(mut self, roots: Vec<Entity>) -> Self {
            self.caps.roots = true;
            self.roots = roots;
            self
        }

        pub fn with_dependents(mut self, of: &Entity, dependents: Vec<Entity>) -> Self {
            self.caps.dependents = true;
            self.dependents.insert(of.key(), dependents);
            self
        }

        pub fn with_static_deps(mut self, deps: Vec<Kind>) -> Self {
            self.static_deps = deps;
            self
        }

        pub fn global(mut self) -> Self {
            self.global = true;
            self
        }

        /// Set once `find_roots` has been called.
        pub fn scanned_flag(&self) -> Arc<AtomicBool> {
            Arc::clone(&self.scanned)
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn kind(&self) -> Kind {
            self.kind
        }

        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        fn static_dependencies(&self) -> Vec<Kind> {
            self.static_deps.clone()
        }

        fn is_global(&self) -> bool {
            self.global
        }

        async fn delete(&self, _settings: &Settings, _entity: &Entity) -> Result<()> {
            Ok(())
        }

        async fn find_roots(&self, _settings: &Settings) -> Result<Vec<Entity>> {
            self.scanned.store(true, Ordering::SeqCst);
            Ok(self.roots.clone())
        }

        async fn find_dependents(
            &self,
            _settings: &Settings,
            entity: &Entity,
        ) -> Result<Vec<Entity>> {
            Ok(self.dependents.get(&entity.key()).cloned().unwrap_or_default())
        }
    }

    pub enum Behavior {
        /// Fail with an error the test classifier treats as fatal.
        FailFatal,
        /// Fail with an error the test classifier treats as "already gone".
        FailAbsent,
        /// Block until the paired [`Behavior::Unblock`] entity has run.
        WaitFor(Arc<Notify>),
        /// Release a waiting entity.
        Unblock(Arc<Notify>),
        /// Signal `started`, then block until `release` fires.
        HoldUntilReleased {
            started: Arc<Notify>,
            release: Arc<Notify>,
        },
        /// Wait for `started`, fire `release`, then fail fatally.
        FailAfterRelease {
            started: Arc<Notify>,
            release: Arc<Notify>,
        },
    }

    /// Action that records per-entity invocations and tracks concurrency.
    pub struct RecordingAction {
        timeline: Mutex<Vec<String>>,
        completed: Mutex<Vec<String>>,
        behaviors: Mutex<HashMap<String, Behavior>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl RecordingAction {
        pub fn new() -> Arc<Self> {
            Self::with_delay(Duration::ZERO)
        }

        pub fn with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                timeline: Mutex::new(Vec::new()),
                completed: Mutex::new(Vec::new()),
                behaviors: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay,
            })
        }

        pub fn script(&self, entity: &Entity, behavior: Behavior) {
            self.behaviors
                .lock()
                .unwrap()
                .insert(entity.to_string(), behavior);
        }

        pub fn timeline(&self) -> Vec<String> {
            self.timeline.lock().unwrap().clone()
        }

        /// Entities whose action finished without an error.
        pub fn completions(&self) -> Vec<String> {
            self.completed.lock().unwrap().clone()
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        /// Indices in the timeline of entries for the given kind.
        pub fn positions(&self, kind: Kind) -> Vec<usize> {
            let prefix = format!("{kind}/");
            self.timeline()
                .iter()
                .enumerate()
                .filter(|(_, e)| e.starts_with(&prefix))
                .map(|(i, _)| i)
                .collect()
        }
    }

    #[async_trait]
    impl Action for RecordingAction {
        async fn run(
            &self,
            _settings: &Settings,
            _provider: &dyn Provider,
            entity: &Entity,
        ) -> Result<()> {
            let n = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(n, Ordering::SeqCst);
            self.timeline.lock().unwrap().push(entity.to_string());

            let behavior = self.behaviors.lock().unwrap().remove(&entity.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let result = match behavior {
                None => Ok(()),
                Some(Behavior::FailFatal) => Err(anyhow!("simulated failure")),
                Some(Behavior::FailAbsent) => Err(anyhow!("simulated AlreadyGone")),
                Some(Behavior::WaitFor(gate)) => {
                    gate.notified().await;
                    Ok(())
                }
                Some(Behavior::Unblock(gate)) => {
                    gate.notify_one();
                    Ok(())
                }
                Some(Behavior::HoldUntilReleased { started, release }) => {
                    started.notify_one();
                    release.notified().await;
                    Ok(())
                }
                Some(Behavior::FailAfterRelease { started, release }) => {
                    started.notified().await;
                    release.notify_one();
                    Err(anyhow!("simulated failure"))
                }
            };

            if result.is_ok() {
                self.completed.lock().unwrap().push(entity.to_string());
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Notify;
    use tokio_util::sync::CancellationToken;

    use super::testing::{ent, Behavior, FakeProvider, RecordingAction};
    use super::{Plan, DEFAULT_CONCURRENCY};
    use crate::config::testing::settings;
    use crate::provider::{Provider, ProviderRegistry};
    use crate::resource::Kind;

    const A: Kind = Kind::new("Test::A");
    const B: Kind = Kind::new("Test::B");
    const C: Kind = Kind::new("Test::C");

    fn plan(providers: Vec<Arc<dyn Provider>>, action: Arc<RecordingAction>) -> Plan {
        let registry = ProviderRegistry::new(providers).unwrap();
        Plan::new(registry, settings(), |_| true, action)
            .with_absent_classifier(|e| e.to_string().contains("AlreadyGone"))
    }

    async fn run(plan: Plan) -> anyhow::Result<()> {
        tokio::time::timeout(Duration::from_secs(10), plan.run(CancellationToken::new()))
            .await
            .expect("run did not finish in time")
    }

    #[tokio::test]
    async fn static_dependency_orders_kinds() {
        let action = RecordingAction::new();
        let p = plan(
            vec![
                Arc::new(FakeProvider::new(A).with_roots(vec![ent(A, "a1"), ent(A, "a2")])),
                Arc::new(
                    FakeProvider::new(B)
                        .with_roots(vec![ent(B, "b1")])
                        .with_static_deps(vec![A]),
                ),
            ],
            Arc::clone(&action),
        );
        run(p).await.unwrap();

        let a = action.positions(A);
        let b = action.positions(B);
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
        assert!(a.iter().max() < b.iter().min());
    }

    #[tokio::test]
    async fn implied_dependents_are_processed_first() {
        // roots of A each reference a B dependent; B must drain before A
        let action = RecordingAction::new();
        let a1 = ent(A, "a1");
        let p = plan(
            vec![
                Arc::new(
                    FakeProvider::new(A)
                        .with_roots(vec![a1.clone()])
                        .with_dependents(&a1, vec![ent(B, "b1"), ent(B, "b2")]),
                ),
                Arc::new(FakeProvider::new(B)),
            ],
            Arc::clone(&action),
        );
        run(p).await.unwrap();

        let a = action.positions(A);
        let b = action.positions(B);
        assert_eq!(b.len(), 2);
        assert!(b.iter().max() < a.iter().min());
    }

    #[tokio::test]
    async fn entity_discovered_twice_runs_once() {
        let action = RecordingAction::new();
        let a1 = ent(A, "a1");
        let a2 = ent(A, "a2");
        let shared = ent(B, "shared");
        let p = plan(
            vec![
                Arc::new(
                    FakeProvider::new(A)
                        .with_roots(vec![a1.clone(), a2.clone()])
                        .with_dependents(&a1, vec![shared.clone()])
                        .with_dependents(&a2, vec![shared.clone()]),
                ),
                Arc::new(FakeProvider::new(B)),
            ],
            Arc::clone(&action),
        );
        run(p).await.unwrap();

        assert_eq!(action.positions(B).len(), 1);
        assert_eq!(action.positions(A).len(), 2);
    }

    #[tokio::test]
    async fn filtered_roots_are_not_expanded() {
        let action = RecordingAction::new();
        let keep = ent(A, "keep");
        let skipped = ent(A, "skipped");
        let registry = ProviderRegistry::new(vec![
            Arc::new(
                FakeProvider::new(A)
                    .with_roots(vec![keep.clone(), skipped.clone()])
                    .with_dependents(&skipped, vec![ent(B, "orphan")]),
            ) as Arc<dyn Provider>,
            Arc::new(FakeProvider::new(B)),
        ])
        .unwrap();
        let p = Plan::new(
            registry,
            settings(),
            |e| e.key() == "keep",
            Arc::clone(&action) as Arc<dyn crate::provider::Action>,
        );
        run(p).await.unwrap();

        assert_eq!(action.timeline(), vec!["Test::A/keep".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_cap_is_respected() {
        let action = RecordingAction::with_delay(Duration::from_millis(20));
        let roots = (0..12).map(|i| ent(A, &format!("a{i}"))).collect();
        let p = plan(
            vec![Arc::new(FakeProvider::new(A).with_roots(roots))],
            Arc::clone(&action),
        )
        .with_concurrency(3);
        run(p).await.unwrap();

        assert_eq!(action.positions(A).len(), 12);
        assert!(action.max_in_flight() <= 3, "cap exceeded: {}", action.max_in_flight());
    }

    #[tokio::test]
    async fn absent_resource_does_not_abort_the_run() {
        let action = RecordingAction::new();
        let gone = ent(A, "gone");
        action.script(&gone, Behavior::FailAbsent);
        let p = plan(
            vec![
                Arc::new(FakeProvider::new(A).with_roots(vec![gone, ent(A, "a2")])),
                Arc::new(
                    FakeProvider::new(B)
                        .with_roots(vec![ent(B, "b1")])
                        .with_static_deps(vec![A]),
                ),
            ],
            Arc::clone(&action),
        );
        run(p).await.unwrap();

        assert_eq!(action.positions(B).len(), 1);
    }

    #[tokio::test]
    async fn fatal_error_stops_dependent_kinds() {
        let action = RecordingAction::new();
        let bad = ent(A, "bad");
        action.script(&bad, Behavior::FailFatal);
        let p = plan(
            vec![
                Arc::new(FakeProvider::new(A).with_roots(vec![bad])),
                Arc::new(
                    FakeProvider::new(B)
                        .with_roots(vec![ent(B, "b1")])
                        .with_static_deps(vec![A]),
                ),
            ],
            Arc::clone(&action),
        );
        let err = run(p).await.unwrap_err();

        assert!(err.to_string().contains("Test::A/bad"), "got: {err:#}");
        assert!(action.positions(B).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fatal_error_lets_in_flight_deletions_finish() {
        // "slow" is mid-deletion when "bad" fails; the abort must let it
        // run to completion while still reporting bad's error
        let action = RecordingAction::new();
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let bad = ent(A, "bad");
        let slow = ent(A, "slow");
        action.script(
            &slow,
            Behavior::HoldUntilReleased {
                started: Arc::clone(&started),
                release: Arc::clone(&release),
            },
        );
        action.script(&bad, Behavior::FailAfterRelease { started, release });
        let p = plan(
            vec![
                Arc::new(FakeProvider::new(A).with_roots(vec![bad, slow])),
                Arc::new(
                    FakeProvider::new(B)
                        .with_roots(vec![ent(B, "b1")])
                        .with_static_deps(vec![A]),
                ),
            ],
            Arc::clone(&action),
        );
        let err = run(p).await.unwrap_err();

        assert!(err.to_string().contains("Test::A/bad"), "got: {err:#}");
        assert!(
            action.completions().contains(&"Test::A/slow".to_string()),
            "in-flight deletion did not finish: {:?}",
            action.completions()
        );
        assert!(action.positions(B).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn independent_kinds_run_concurrently() {
        // a1 blocks until b1 has run; passes only if A and B overlap
        let action = RecordingAction::new();
        let gate = Arc::new(Notify::new());
        let a1 = ent(A, "a1");
        let b1 = ent(B, "b1");
        action.script(&a1, Behavior::WaitFor(Arc::clone(&gate)));
        action.script(&b1, Behavior::Unblock(gate));
        let p = plan(
            vec![
                Arc::new(FakeProvider::new(A).with_roots(vec![a1])),
                Arc::new(FakeProvider::new(B).with_roots(vec![b1])),
            ],
            Arc::clone(&action),
        );
        run(p).await.unwrap();

        assert_eq!(action.timeline().len(), 2);
    }

    #[tokio::test]
    async fn static_cycle_fails_before_discovery() {
        let action = RecordingAction::new();
        let pa = FakeProvider::new(A)
            .with_roots(vec![ent(A, "a1")])
            .with_static_deps(vec![B]);
        let scanned = pa.scanned_flag();
        let p = plan(
            vec![
                Arc::new(pa),
                Arc::new(FakeProvider::new(B).with_static_deps(vec![A])),
            ],
            Arc::clone(&action),
        );
        let err = run(p).await.unwrap_err();

        assert!(err.to_string().contains("static dependency"), "got: {err:#}");
        assert!(!scanned.load(Ordering::SeqCst), "discovery ran despite cycle");
        assert!(action.timeline().is_empty());
    }

    #[tokio::test]
    async fn dependent_of_unknown_kind_is_fatal() {
        let action = RecordingAction::new();
        let a1 = ent(A, "a1");
        let p = plan(
            vec![Arc::new(
                FakeProvider::new(A)
                    .with_roots(vec![a1.clone()])
                    .with_dependents(&a1, vec![ent(C, "c1")]),
            )],
            Arc::clone(&action),
        );
        let err = run(p).await.unwrap_err();

        assert!(
            format!("{err:#}").contains("no provider registered"),
            "got: {err:#}"
        );
        assert!(action.timeline().is_empty());
    }

    #[tokio::test]
    async fn global_kinds_skip_non_global_regions() {
        let action = RecordingAction::new();
        let mut s = settings();
        s.region = "eu-west-1".to_string();
        let registry = ProviderRegistry::new(vec![
            Arc::new(FakeProvider::new(A).with_roots(vec![ent(A, "a1")]).global())
                as Arc<dyn Provider>,
            Arc::new(FakeProvider::new(B).with_roots(vec![ent(B, "b1")])),
        ])
        .unwrap();
        let p = Plan::new(
            registry,
            s,
            |_| true,
            Arc::clone(&action) as Arc<dyn crate::provider::Action>,
        );
        run(p).await.unwrap();

        assert!(action.positions(A).is_empty());
        assert_eq!(action.positions(B).len(), 1);
    }

    #[tokio::test]
    async fn pre_canceled_token_aborts_before_discovery() {
        let action = RecordingAction::new();
        let p = plan(
            vec![Arc::new(FakeProvider::new(A).with_roots(vec![ent(A, "a1")]))],
            Arc::clone(&action),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = p.run(cancel).await.unwrap_err();

        assert!(err.to_string().contains("canceled"), "got: {err:#}");
        assert!(action.timeline().is_empty());
    }

    #[test]
    fn default_concurrency_matches_documented_cap() {
        assert_eq!(DEFAULT_CONCURRENCY, 20);
    }
}
