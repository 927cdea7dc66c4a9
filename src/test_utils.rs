// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked Kubernetes API, an in-memory resource store and
//! fixtures for Services and Ingresses.

use crate::constants::annotations;
use crate::error::{ControllerError, Result};
use crate::kubernetes::{DeleteOutcome, ResourceStore};
use crate::report::ErrorReporter;
use crate::types::{build_ingress, IngressTemplate};
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service as TowerService;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for DELETE requests matching the exact path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl TowerService<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, status_json(404, "NotFound")));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// A Kubernetes Status body for an API error
pub fn status_json(code: u16, reason: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": reason,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// A minimal Ingress as returned by the API server
pub fn ingress_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("uid-ingress-{}", name)
        }
    })
    .to_string()
}

pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: reason.to_string(),
        reason: reason.to_string(),
        code,
    })
}

/// A Service, optionally carrying the expose annotation
pub fn make_service(namespace: &str, name: &str, exposed: bool) -> Service {
    let annotations = exposed.then(|| {
        BTreeMap::from([(annotations::EXPOSE_HTTP.to_string(), "true".to_string())])
    });
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("uid-{}", name)),
            annotations,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// The Ingress the controller would create for a Service
pub fn make_ingress(service: &Service) -> Ingress {
    build_ingress(service, &IngressTemplate::default()).unwrap()
}

type ObjectKey = (String, String);

fn object_key(namespace: &str, name: &str) -> ObjectKey {
    (namespace.to_string(), name.to_string())
}

/// In-memory `ResourceStore` that records mutations and can inject failures.
#[derive(Default)]
pub struct FakeStore {
    services: Mutex<BTreeMap<ObjectKey, Service>>,
    ingresses: Mutex<BTreeMap<ObjectKey, Ingress>>,
    create_failures: AtomicU32,
    delete_failures: AtomicU32,
    creates: AtomicU32,
    deletes: AtomicU32,
    panic_on_lookup: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_service(&self, service: Service) {
        let key = object_key(&service.namespace().unwrap(), &service.name_any());
        self.services.lock().unwrap().insert(key, service);
    }

    pub fn remove_service(&self, namespace: &str, name: &str) {
        self.services
            .lock()
            .unwrap()
            .remove(&object_key(namespace, name));
    }

    pub fn put_ingress(&self, ingress: Ingress) {
        let key = object_key(&ingress.namespace().unwrap(), &ingress.name_any());
        self.ingresses.lock().unwrap().insert(key, ingress);
    }

    pub fn ingress(&self, namespace: &str, name: &str) -> Option<Ingress> {
        self.ingresses
            .lock()
            .unwrap()
            .get(&object_key(namespace, name))
            .cloned()
    }

    /// Fail the next `count` creates; `u32::MAX` fails them all
    pub fn fail_creates(&self, count: u32) {
        self.create_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, count: u32) {
        self.delete_failures.store(count, Ordering::SeqCst);
    }

    pub fn panic_on_lookup(&self, enabled: bool) {
        self.panic_on_lookup.store(enabled, Ordering::SeqCst);
    }

    /// Create calls received, failed ones included
    pub fn creates(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> u32 {
        self.deletes.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 => None,
                u32::MAX => Some(u32::MAX),
                n => Some(n - 1),
            })
            .is_ok()
    }
}

#[async_trait]
impl ResourceStore for FakeStore {
    async fn get_owner(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        if self.panic_on_lookup.load(Ordering::SeqCst) {
            panic!("lookup of {}/{} blew up", namespace, name);
        }
        Ok(self
            .services
            .lock()
            .unwrap()
            .get(&object_key(namespace, name))
            .cloned())
    }

    async fn get_owned(&self, namespace: &str, name: &str) -> Result<Option<Ingress>> {
        Ok(self.ingress(namespace, name))
    }

    async fn create_owned(&self, ingress: &Ingress) -> Result<Ingress> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let key = format!("{}/{}", ingress.namespace().unwrap(), ingress.name_any());
        if Self::take_failure(&self.create_failures) {
            return Err(ControllerError::CreateFailed {
                key,
                source: api_error(500, "InternalError"),
            });
        }
        self.put_ingress(ingress.clone());
        Ok(ingress.clone())
    }

    async fn delete_owned(&self, namespace: &str, name: &str) -> Result<DeleteOutcome> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.delete_failures) {
            return Err(ControllerError::DeleteFailed {
                key: format!("{}/{}", namespace, name),
                source: api_error(500, "InternalError"),
            });
        }
        Ok(
            match self
                .ingresses
                .lock()
                .unwrap()
                .remove(&object_key(namespace, name))
            {
                Some(_) => DeleteOutcome::Deleted,
                None => DeleteOutcome::NotFound,
            },
        )
    }
}

/// Reporter that keeps `(key, message)` pairs for assertions
#[derive(Default)]
pub struct CapturingReporter {
    reported: Mutex<Vec<(String, String)>>,
}

impl CapturingReporter {
    pub fn reported(&self) -> Vec<(String, String)> {
        self.reported.lock().unwrap().clone()
    }
}

impl ErrorReporter for CapturingReporter {
    fn report(&self, key: &str, error: &ControllerError) {
        self.reported
            .lock()
            .unwrap()
            .push((key.to_string(), error.to_string()));
    }
}
