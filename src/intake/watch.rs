// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch streams feeding the reflector caches and the event intake.

use super::{EventIntake, Notification};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::reflector::{store::Writer, ObjectRef, Store};
use kube::{Api, Resource};
use kube_runtime::watcher::{self, Config as WatcherConfig};
use kube_runtime::WatchStreamExt;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, info, warn};

/// Map a Service watch event to a notification. Must run before the event is
/// applied to the cache so the previous version can be compared.
pub fn service_notification(
    cache: &Store<Service>,
    event: &watcher::Event<Service>,
) -> Option<Notification> {
    match event {
        watcher::Event::Apply(service) | watcher::Event::InitApply(service) => {
            let previous = cache.get(&ObjectRef::from_obj(service));
            Some(match previous {
                Some(old) => Notification::OwnerUpdated {
                    old: (*old).clone(),
                    new: service.clone(),
                },
                None => Notification::OwnerAdded(service.clone()),
            })
        }
        // the API server garbage collects the owned Ingress
        watcher::Event::Delete(_) | watcher::Event::Init | watcher::Event::InitDone => None,
    }
}

/// Map an Ingress watch event to a notification. Only deletions count.
pub fn ingress_notification(
    _cache: &Store<Ingress>,
    event: &watcher::Event<Ingress>,
) -> Option<Notification> {
    match event {
        watcher::Event::Delete(ingress) => Some(Notification::OwnedDeleted(ingress.clone())),
        _ => None,
    }
}

/// Applies watch events to a reflector cache and hands the derived
/// notifications to the intake once the cache shows them.
///
/// During a relist (`Init` until `InitDone`) the writer buffers objects and
/// only swaps them into the store on `InitDone`, so notifications from that
/// window are held back until then. A worker picking up a key never reads an
/// older state than the one that triggered it.
pub struct CacheRelay<K, F>
where
    K: Resource + Clone + 'static,
    <K as Resource>::DynamicType: Eq + Hash + Clone,
{
    writer: Writer<K>,
    cache: Store<K>,
    intake: EventIntake,
    to_notification: F,
    relisting: bool,
    held: Vec<Notification>,
}

impl<K, F> CacheRelay<K, F>
where
    K: Resource + Clone + 'static,
    <K as Resource>::DynamicType: Eq + Hash + Clone,
    F: Fn(&Store<K>, &watcher::Event<K>) -> Option<Notification>,
{
    pub fn new(writer: Writer<K>, intake: EventIntake, to_notification: F) -> Self {
        let cache = writer.as_reader();
        Self {
            writer,
            cache,
            intake,
            to_notification,
            relisting: false,
            held: Vec::new(),
        }
    }

    pub fn process(&mut self, event: &watcher::Event<K>) {
        // compared against the cache as it was before this event
        let notification = (self.to_notification)(&self.cache, event);
        self.writer.apply_watcher_event(event);

        match event {
            watcher::Event::Init => {
                self.relisting = true;
                self.held.clear();
            }
            watcher::Event::InitDone => {
                self.relisting = false;
                for held in self.held.drain(..) {
                    self.intake.handle(held);
                }
            }
            _ => {}
        }

        if let Some(notification) = notification {
            if self.relisting {
                self.held.push(notification);
            } else {
                self.intake.handle(notification);
            }
        }
    }
}

/// Watch one kind, keep its cache current and forward notifications to the
/// intake through a [`CacheRelay`]. Runs until the stream ends.
pub async fn run_watch<K, F>(
    api: Api<K>,
    writer: Writer<K>,
    intake: EventIntake,
    to_notification: F,
) where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    <K as Resource>::DynamicType: Eq + Hash + Clone + Default,
    F: Fn(&Store<K>, &watcher::Event<K>) -> Option<Notification>,
{
    let kind = K::kind(&Default::default()).to_string();
    let mut relay = CacheRelay::new(writer, intake, to_notification);
    let mut stream = watcher::watcher(api, WatcherConfig::default())
        .default_backoff()
        .boxed();

    info!(%kind, "Watch started");

    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => {
                match &event {
                    watcher::Event::Init => debug!(%kind, "Relist started"),
                    watcher::Event::InitDone => debug!(%kind, "Cache synced"),
                    _ => {}
                }
                relay.process(&event);
            }
            Err(e) => warn!(%kind, error = %e, "Watch error, retrying"),
        }
    }

    warn!(%kind, "Watch stream ended");
}
