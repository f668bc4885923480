//! Service event source
//!
//! Watches services cluster-wide and feeds the reconciler one event at a
//! time. A local cache turns raw watch events into lifecycle events:
//! first sightings become `Added`, later ones `Updated` with the previous
//! state, and services that disappear across a relist become tombstones.
//! Every resync interval all cached services are re-delivered as `Added`.

use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::Service;
use kube::Client;
use kube::api::Api;
use kube::runtime::{WatchStreamExt, watcher};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

use expose_core::ServiceKey;

use crate::engine::Reconciler;
use crate::error::Result;
use crate::events::{DeletedService, ServiceEvent, service_key};

/// Last known state of every observed service
#[derive(Debug, Default)]
pub struct ServiceCache {
    known: HashMap<ServiceKey, Service>,
    /// Keys seen since the current relist started
    relist: Option<HashSet<ServiceKey>>,
}

impl ServiceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Translate one watch event into lifecycle events
    pub fn observe(&mut self, event: watcher::Event<Service>) -> Vec<ServiceEvent> {
        match event {
            watcher::Event::Apply(service) => self.upsert(service).into_iter().collect(),
            watcher::Event::Delete(service) => {
                if let Some(key) = service_key(&service) {
                    self.known.remove(&key);
                }
                vec![ServiceEvent::Deleted(DeletedService::Live(service))]
            }
            watcher::Event::Init => {
                self.relist = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(service) => {
                if let (Some(seen), Some(key)) = (self.relist.as_mut(), service_key(&service)) {
                    seen.insert(key);
                }
                self.upsert(service).into_iter().collect()
            }
            watcher::Event::InitDone => self.finish_relist(),
        }
    }

    /// Re-deliver every cached service, in key order
    pub fn resync(&self) -> Vec<ServiceEvent> {
        let mut keys: Vec<&ServiceKey> = self.known.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| self.known.get(key))
            .map(|service| ServiceEvent::Added(service.clone()))
            .collect()
    }

    fn upsert(&mut self, service: Service) -> Option<ServiceEvent> {
        let Some(key) = service_key(&service) else {
            tracing::warn!(
                name = ?service.metadata.name,
                "Ignoring service without name or namespace"
            );
            return None;
        };

        match self.known.insert(key, service.clone()) {
            Some(old) => Some(ServiceEvent::Updated { old, new: service }),
            None => Some(ServiceEvent::Added(service)),
        }
    }

    /// Services missing from the completed relist were deleted while unobserved
    fn finish_relist(&mut self) -> Vec<ServiceEvent> {
        let Some(seen) = self.relist.take() else {
            return Vec::new();
        };

        let mut vanished: Vec<ServiceKey> = self
            .known
            .keys()
            .filter(|key| !seen.contains(key))
            .cloned()
            .collect();
        vanished.sort();

        vanished
            .into_iter()
            .map(|key| {
                self.known.remove(&key);
                ServiceEvent::Deleted(DeletedService::Tombstone {
                    key: key.to_string(),
                })
            })
            .collect()
    }
}

/// Cluster-wide service watch
pub struct EventSource {
    api: Api<Service>,
    resync_interval: Duration,
}

impl EventSource {
    pub fn new(client: Client, resync_interval: Duration) -> Self {
        Self {
            api: Api::all(client),
            resync_interval,
        }
    }

    /// Watch until `shutdown` completes or a fatal error occurs
    pub async fn run(
        self,
        reconciler: &Reconciler,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        tracing::info!(
            resync_ms = self.resync_interval.as_millis() as u64,
            "Watching services in all namespaces"
        );
        let stream = watcher(self.api, watcher::Config::default()).default_backoff();
        run_stream(stream, reconciler, self.resync_interval, shutdown).await
    }
}

/// Drive `reconciler` from a stream of watch events
///
/// Events are handled strictly one at a time. Watch errors are logged and
/// the stream is polled again; fatal reconciler errors end the loop.
pub async fn run_stream<S>(
    stream: S,
    reconciler: &Reconciler,
    resync_interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    S: Stream<Item = std::result::Result<watcher::Event<Service>, watcher::Error>>,
{
    let mut cache = ServiceCache::new();
    let mut ticker = tokio::time::interval_at(Instant::now() + resync_interval, resync_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(stream);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down event source");
                return Ok(());
            }
            _ = ticker.tick() => {
                tracing::debug!(services = cache.len(), "Resync");
                for event in cache.resync() {
                    reconciler.handle(event).await?;
                }
            }
            item = stream.next() => match item {
                None => {
                    tracing::warn!("Service watch ended");
                    return Ok(());
                }
                Some(Err(e)) => tracing::warn!(error = %e, "Service watch error"),
                Some(Ok(event)) => {
                    for event in cache.observe(event) {
                        reconciler.handle(event).await?;
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::exposed_service;
    use crate::cluster::MockCluster;
    use crate::config::ConfigResolver;
    use futures::stream;
    use kube::ResourceExt;
    use std::sync::Arc;

    fn named(namespace: &str, name: &str) -> Service {
        let mut service = exposed_service();
        service.metadata.namespace = Some(namespace.to_string());
        service.metadata.name = Some(name.to_string());
        service
    }

    fn ingress_cluster() -> Arc<MockCluster> {
        Arc::new(
            MockCluster::new()
                .with_config_map(
                    "fabric8",
                    "exposecontroller",
                    &[("domain", "example.com"), ("expose-rule", "ingress")],
                )
                .with_service(exposed_service()),
        )
    }

    #[test]
    fn test_apply_then_update() {
        let mut cache = ServiceCache::new();

        let first = cache.observe(watcher::Event::Apply(exposed_service()));
        assert!(matches!(first.as_slice(), [ServiceEvent::Added(_)]));

        let second = cache.observe(watcher::Event::Apply(exposed_service()));
        assert!(matches!(second.as_slice(), [ServiceEvent::Updated { .. }]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_delete_carries_live_object() {
        let mut cache = ServiceCache::new();
        cache.observe(watcher::Event::Apply(exposed_service()));

        let events = cache.observe(watcher::Event::Delete(exposed_service()));
        assert!(matches!(
            events.as_slice(),
            [ServiceEvent::Deleted(DeletedService::Live(_))]
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_relist_emits_tombstones_for_vanished_services() {
        let mut cache = ServiceCache::new();
        cache.observe(watcher::Event::Init);
        cache.observe(watcher::Event::InitApply(named("bar", "foo")));
        cache.observe(watcher::Event::InitApply(named("bar", "baz")));
        assert!(cache.observe(watcher::Event::InitDone).is_empty());

        cache.observe(watcher::Event::Init);
        cache.observe(watcher::Event::InitApply(named("bar", "baz")));
        let events = cache.observe(watcher::Event::InitDone);

        match events.as_slice() {
            [ServiceEvent::Deleted(DeletedService::Tombstone { key })] => {
                assert_eq!(key, "bar/foo")
            }
            other => panic!("expected one tombstone, got {other:?}"),
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resync_redelivers_in_key_order() {
        let mut cache = ServiceCache::new();
        cache.observe(watcher::Event::Apply(named("b", "svc")));
        cache.observe(watcher::Event::Apply(named("a", "svc")));

        let names: Vec<String> = cache
            .resync()
            .into_iter()
            .map(|event| match event {
                ServiceEvent::Added(service) => service.namespace().unwrap_or_default(),
                other => panic!("expected Added, got {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_stream_events_reach_reconciler() {
        let cluster = ingress_cluster();
        let reconciler = Reconciler::new(cluster.clone(), ConfigResolver::new("fabric8"));

        let events = stream::iter(vec![
            Ok(watcher::Event::Apply(exposed_service())),
            Ok(watcher::Event::Delete(exposed_service())),
        ]);
        run_stream(events, &reconciler, Duration::from_secs(60), std::future::pending())
            .await
            .unwrap();

        let counts = cluster.operation_counts();
        assert_eq!(counts.creates, 1);
        assert_eq!(counts.deletes, 1);
        assert!(cluster.ingress("bar", "foo").is_none());
    }

    #[tokio::test]
    async fn test_fatal_error_stops_loop() {
        let cluster = Arc::new(MockCluster::new());
        let reconciler = Reconciler::new(cluster, ConfigResolver::new("fabric8"));

        let events = stream::iter(vec![Ok(watcher::Event::Apply(exposed_service()))]);
        let err = run_stream(events, &reconciler, Duration::from_secs(60), std::future::pending())
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_retries_failed_exposure() {
        let cluster = ingress_cluster();
        cluster.fail_writes(true);
        let reconciler = Reconciler::new(cluster.clone(), ConfigResolver::new("fabric8"));

        let events = stream::iter(vec![Ok(watcher::Event::Apply(exposed_service()))])
            .chain(stream::pending());
        let run = run_stream(
            events,
            &reconciler,
            Duration::from_millis(100),
            tokio::time::sleep(Duration::from_millis(250)),
        );
        let recover = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cluster.fail_writes(false);
        };

        let (result, _) = tokio::join!(run, recover);
        result.unwrap();
        assert!(cluster.ingress("bar", "foo").is_some());
    }
}
