// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deriving the owned Ingress from an exposed Service.

use crate::constants::{annotations, ingress};
use crate::error::{ControllerError, Result};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{api::ObjectMeta, Resource, ResourceExt};

/// Host and class put on every generated Ingress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressTemplate {
    pub host: String,
    pub class_name: String,
}

impl Default for IngressTemplate {
    fn default() -> Self {
        Self {
            host: ingress::DEFAULT_HOST.to_string(),
            class_name: ingress::DEFAULT_CLASS.to_string(),
        }
    }
}

/// Check if a Service asks for an Ingress. Only presence of the annotation counts.
pub fn wants_ingress(service: &Service) -> bool {
    service.annotations().contains_key(annotations::EXPOSE_HTTP)
}

/// The owner reference marked as controller, if any.
pub fn controller_of(ingress: &Ingress) -> Option<&OwnerReference> {
    ingress
        .metadata
        .owner_references
        .as_ref()?
        .iter()
        .find(|owner| owner.controller == Some(true))
}

/// Build the Ingress for a Service: same name and namespace, one controller owner
/// reference back to the Service, and one rule routing `/` to the Service on port 80.
pub fn build_ingress(service: &Service, template: &IngressTemplate) -> Result<Ingress> {
    let name = service
        .metadata
        .name
        .clone()
        .ok_or(ControllerError::MissingObjectKey("metadata.name"))?;
    let owner = service
        .controller_owner_ref(&())
        .ok_or(ControllerError::MissingObjectKey("metadata.uid"))?;

    let path = HTTPIngressPath {
        path: Some(ingress::ROOT_PATH.to_string()),
        path_type: ingress::PATH_TYPE.to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: name.clone(),
                port: Some(ServiceBackendPort {
                    number: Some(ingress::BACKEND_PORT),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        },
    };

    Ok(Ingress {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: service.metadata.namespace.clone(),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: Some(template.class_name.clone()),
            rules: Some(vec![IngressRule {
                host: Some(template.host.clone()),
                http: Some(HTTPIngressRuleValue { paths: vec![path] }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    })
}
