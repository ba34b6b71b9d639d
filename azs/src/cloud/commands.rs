//! Command dispatcher
//!
//! A [`Command`] is an opaque unit of off-loop work that, when executed,
//! yields exactly one terminal [`CloudMsg`]. Factories here close over an
//! `Arc<dyn CloudCli>` and the fully-specified inputs; the event loop
//! spawns the returned future and never touches the CLI directly.
//!
//! Results carry enough correlation (node index, resource id, operation
//! id) for the reducer to route them without shared state.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use super::cli::CloudCli;
use super::error::CloudError;
use super::types::{
    Blob, Container, Organization, Pipeline, Pod, Project, Resource, ResourceGroup, Subscription, SecretItem, ToolOp,
};

/// One unit of off-loop work; resolves to its single terminal message
pub type Command = BoxFuture<'static, CloudMsg>;

/// Terminal messages produced by commands
#[derive(Debug)]
pub enum CloudMsg {
    Subscriptions(Result<Vec<Subscription>, CloudError>),
    SubscriptionSet {
        id: String,
        result: Result<(), CloudError>,
    },
    /// Children of the tree node identified by `node`
    Groups {
        node: usize,
        result: Result<Vec<ResourceGroup>, CloudError>,
    },
    /// Children of the tree node identified by `node`
    Resources {
        node: usize,
        group: String,
        result: Result<Vec<Resource>, CloudError>,
    },
    Details {
        resource_id: String,
        result: Result<Value, CloudError>,
    },
    /// A mutating action finished
    ActionDone {
        op: u64,
        resource_id: String,
        action: String,
        result: Result<Option<Value>, CloudError>,
    },
    Containers {
        resource_id: String,
        result: Result<Vec<Container>, CloudError>,
    },
    Blobs {
        resource_id: String,
        container: String,
        result: Result<Vec<Blob>, CloudError>,
    },
    Secrets {
        resource_id: String,
        result: Result<Vec<SecretItem>, CloudError>,
    },
    Pods {
        resource_id: String,
        result: Result<Vec<Pod>, CloudError>,
    },
    DevOpsOrganizations(Result<Vec<Organization>, CloudError>),
    DevOpsProjects {
        org: String,
        result: Result<Vec<Project>, CloudError>,
    },
    DevOpsPipelines {
        org: String,
        project: String,
        result: Result<Vec<Pipeline>, CloudError>,
    },
    Tool {
        op: ToolOp,
        dir: PathBuf,
        result: Result<String, CloudError>,
    },
    /// AI analysis of a resource's details (provider errors are plain text)
    Analysis {
        resource_id: String,
        result: Result<String, String>,
    },
}

/// Typed command factories over a shared CLI handle
#[derive(Clone)]
pub struct Dispatcher {
    cli: Arc<dyn CloudCli>,
}

impl Dispatcher {
    pub fn new(cli: Arc<dyn CloudCli>) -> Self {
        Self { cli }
    }

    pub fn cli(&self) -> Arc<dyn CloudCli> {
        self.cli.clone()
    }

    pub fn list_subscriptions(&self) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move { CloudMsg::Subscriptions(cli.list_subscriptions().await) })
    }

    pub fn set_subscription(&self, id: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.set_subscription(&id).await;
            CloudMsg::SubscriptionSet { id, result }
        })
    }

    pub fn list_groups(&self, node: usize, subscription: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            CloudMsg::Groups {
                node,
                result: cli.list_groups(&subscription).await,
            }
        })
    }

    pub fn list_resources(&self, node: usize, subscription: String, group: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.list_resources(&subscription, &group).await;
            CloudMsg::Resources { node, group, result }
        })
    }

    pub fn describe_resource(&self, resource_id: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.describe_resource(&resource_id).await;
            CloudMsg::Details { resource_id, result }
        })
    }

    /// Dispatch a fully-built mutating invocation. `op` keys the progress
    /// descriptor the reducer created for this action. Ids are sequential,
    /// assigned by the reducer, so replays stay deterministic.
    pub fn mutate(&self, op: u64, resource_id: String, action: String, args: Vec<String>) -> Command {
        let cli = self.cli.clone();
        debug!(%op, %resource_id, %action, "Dispatcher::mutate");
        Box::pin(async move {
            let result = cli.mutate(&args).await;
            CloudMsg::ActionDone {
                op,
                resource_id,
                action,
                result,
            }
        })
    }

    pub fn list_containers(&self, resource_id: String, account: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.list_containers(&account).await;
            CloudMsg::Containers { resource_id, result }
        })
    }

    pub fn list_blobs(&self, resource_id: String, account: String, container: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.list_blobs(&account, &container).await;
            CloudMsg::Blobs {
                resource_id,
                container,
                result,
            }
        })
    }

    pub fn list_secrets(&self, resource_id: String, vault: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.list_secrets(&vault).await;
            CloudMsg::Secrets { resource_id, result }
        })
    }

    pub fn list_pods(&self, resource_id: String, cluster: String, group: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.list_pods(&cluster, &group).await;
            CloudMsg::Pods { resource_id, result }
        })
    }

    pub fn devops_organizations(&self) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move { CloudMsg::DevOpsOrganizations(cli.devops_organizations().await) })
    }

    pub fn devops_projects(&self, org: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.devops_projects(&org).await;
            CloudMsg::DevOpsProjects { org, result }
        })
    }

    pub fn devops_pipelines(&self, org: String, project: String) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.devops_pipelines(&org, &project).await;
            CloudMsg::DevOpsPipelines { org, project, result }
        })
    }

    pub fn run_tool(&self, dir: PathBuf, op: ToolOp, operand: Option<String>) -> Command {
        let cli = self.cli.clone();
        Box::pin(async move {
            let result = cli.run_tool(&dir, op, operand.as_deref()).await;
            CloudMsg::Tool { op, dir, result }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::demo::DemoCli;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(DemoCli::new()))
    }

    #[tokio::test]
    async fn test_command_yields_exactly_one_terminal_message() {
        let msg = dispatcher().list_subscriptions().await;
        match msg {
            CloudMsg::Subscriptions(Ok(subs)) => assert_eq!(subs.len(), 2),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_children_carry_correlation_node() {
        let msg = dispatcher()
            .list_resources(42, "sub-1".to_string(), "rg-web-prod".to_string())
            .await;
        match msg {
            CloudMsg::Resources { node, group, result } => {
                assert_eq!(node, 42);
                assert_eq!(group, "rg-web-prod");
                assert!(!result.unwrap().is_empty());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mutate_echoes_operation_id() {
        let op = 7u64;
        let msg = dispatcher()
            .mutate(op, "/vm/1".to_string(), "start".to_string(), vec!["vm".into(), "start".into()])
            .await;
        match msg {
            CloudMsg::ActionDone {
                op: echoed, action, ..
            } => {
                assert_eq!(echoed, op);
                assert_eq!(action, "start");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
