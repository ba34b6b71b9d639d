//! Cloud CLI abstraction
//!
//! `CloudCli` is the seam between the interactive core and the outside
//! world. The production implementation shells out to `az` (and `kubectl`
//! / `terraform` where the resource family requires it); tests and demo
//! mode substitute an in-memory implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::CloudError;
use super::process::{self, ProcessOutput};
use super::types::{
    Blob, Container, Organization, Pipeline, Pod, Project, Resource, ResourceGroup, SecretItem, Subscription, ToolOp,
};
use crate::config::Config;

/// Read-only and mutating operations the core dispatches.
///
/// Every call is bounded by a deadline internally and yields either a
/// decoded value or a typed [`CloudError`].
#[async_trait]
pub trait CloudCli: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, CloudError>;
    async fn set_subscription(&self, id: &str) -> Result<(), CloudError>;
    async fn list_groups(&self, subscription: &str) -> Result<Vec<ResourceGroup>, CloudError>;
    async fn list_resources(&self, subscription: &str, group: &str) -> Result<Vec<Resource>, CloudError>;
    async fn describe_resource(&self, id: &str) -> Result<Value, CloudError>;
    /// Run a fully-specified mutating invocation. The payload, when the
    /// CLI prints one, is returned verbatim.
    async fn mutate(&self, args: &[String]) -> Result<Option<Value>, CloudError>;
    async fn list_containers(&self, account: &str) -> Result<Vec<Container>, CloudError>;
    async fn list_blobs(&self, account: &str, container: &str) -> Result<Vec<Blob>, CloudError>;
    async fn list_secrets(&self, vault: &str) -> Result<Vec<SecretItem>, CloudError>;
    async fn list_pods(&self, cluster: &str, group: &str) -> Result<Vec<Pod>, CloudError>;
    async fn devops_organizations(&self) -> Result<Vec<Organization>, CloudError>;
    async fn devops_projects(&self, org: &str) -> Result<Vec<Project>, CloudError>;
    async fn devops_pipelines(&self, org: &str, project: &str) -> Result<Vec<Pipeline>, CloudError>;
    /// External infrastructure tool, executed in `dir`. `operand` is the
    /// extra argument ops like `workspace select` take. Text output.
    async fn run_tool(&self, dir: &Path, op: ToolOp, operand: Option<&str>) -> Result<String, CloudError>;
}

/// Production implementation over the `az` CLI
pub struct AzCli {
    program: String,
    kubectl: String,
    tool: String,
    timeout: Duration,
    mutate_timeout: Duration,
    devops_org: Option<String>,
}

impl AzCli {
    pub fn new(config: &Config) -> Self {
        Self {
            program: "az".to_string(),
            kubectl: "kubectl".to_string(),
            tool: "terraform".to_string(),
            timeout: config.timeout,
            mutate_timeout: config.mutate_timeout,
            devops_org: config.devops_org.clone(),
        }
    }

    async fn az(&self, args: &[&str], deadline: Duration) -> Result<ProcessOutput, CloudError> {
        let mut argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        argv.push("--output".to_string());
        argv.push("json".to_string());
        process::run(&self.program, &argv, deadline).await
    }

    fn decode<T: DeserializeOwned>(&self, out: &ProcessOutput) -> Result<T, CloudError> {
        if out.truncated {
            return Err(CloudError::Decode {
                program: self.program.clone(),
                detail: "output exceeded size cap and was truncated".to_string(),
            });
        }
        serde_json::from_slice(&out.stdout).map_err(|e| CloudError::Decode {
            program: self.program.clone(),
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl CloudCli for AzCli {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, CloudError> {
        let out = self.az(&["account", "list"], self.timeout).await?;
        self.decode(&out)
    }

    async fn set_subscription(&self, id: &str) -> Result<(), CloudError> {
        // `az account set` prints nothing on success
        let args: Vec<String> = ["account", "set", "--subscription", id]
            .iter()
            .map(|s| s.to_string())
            .collect();
        process::run(&self.program, &args, self.timeout).await?;
        Ok(())
    }

    async fn list_groups(&self, subscription: &str) -> Result<Vec<ResourceGroup>, CloudError> {
        let out = self
            .az(&["group", "list", "--subscription", subscription], self.timeout)
            .await?;
        self.decode(&out)
    }

    async fn list_resources(&self, subscription: &str, group: &str) -> Result<Vec<Resource>, CloudError> {
        let out = self
            .az(
                &[
                    "resource",
                    "list",
                    "--subscription",
                    subscription,
                    "--resource-group",
                    group,
                ],
                self.timeout,
            )
            .await?;
        self.decode(&out)
    }

    async fn describe_resource(&self, id: &str) -> Result<Value, CloudError> {
        let out = self.az(&["resource", "show", "--ids", id], self.timeout).await?;
        self.decode(&out)
    }

    async fn mutate(&self, args: &[String]) -> Result<Option<Value>, CloudError> {
        debug!(?args, "AzCli::mutate");
        let out = process::run(&self.program, args, self.mutate_timeout).await?;
        if out.stdout.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }
        // Most actions print JSON; a few (logs) print plain text. Either
        // way the payload is returned verbatim.
        match serde_json::from_slice(&out.stdout) {
            Ok(value) => Ok(Some(value)),
            Err(_) => Ok(Some(Value::String(
                String::from_utf8_lossy(&out.stdout).into_owned(),
            ))),
        }
    }

    async fn list_containers(&self, account: &str) -> Result<Vec<Container>, CloudError> {
        let out = self
            .az(
                &[
                    "storage",
                    "container",
                    "list",
                    "--account-name",
                    account,
                    "--auth-mode",
                    "login",
                ],
                self.timeout,
            )
            .await?;
        self.decode(&out)
    }

    async fn list_blobs(&self, account: &str, container: &str) -> Result<Vec<Blob>, CloudError> {
        let out = self
            .az(
                &[
                    "storage",
                    "blob",
                    "list",
                    "--account-name",
                    account,
                    "--container-name",
                    container,
                    "--auth-mode",
                    "login",
                ],
                self.timeout,
            )
            .await?;
        self.decode(&out)
    }

    async fn list_secrets(&self, vault: &str) -> Result<Vec<SecretItem>, CloudError> {
        let out = self
            .az(&["keyvault", "secret", "list", "--vault-name", vault], self.timeout)
            .await?;
        self.decode(&out)
    }

    async fn list_pods(&self, cluster: &str, group: &str) -> Result<Vec<Pod>, CloudError> {
        // Credentials are assumed merged; the pod listing itself comes
        // from kubectl against the cluster's current context.
        let _ = (cluster, group);
        let args: Vec<String> = ["get", "pods", "--all-namespaces", "-o", "json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = process::run(&self.kubectl, &args, self.timeout).await?;
        let value: Value = serde_json::from_slice(&out.stdout).map_err(|e| CloudError::Decode {
            program: self.kubectl.clone(),
            detail: e.to_string(),
        })?;
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| CloudError::Decode {
                program: self.kubectl.clone(),
                detail: "missing items array".to_string(),
            })?;
        let pods = items
            .iter()
            .map(|item| Pod {
                name: item
                    .pointer("/metadata/name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                namespace: item
                    .pointer("/metadata/namespace")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                phase: item
                    .pointer("/status/phase")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect();
        Ok(pods)
    }

    async fn devops_organizations(&self) -> Result<Vec<Organization>, CloudError> {
        // The CLI has no organization listing; the organization comes from
        // configuration. Absence is surfaced as a normal failure line.
        match &self.devops_org {
            Some(org) => Ok(vec![Organization {
                name: org.clone(),
                url: Some(format!("https://dev.azure.com/{}", org)),
            }]),
            None => Err(CloudError::Failed {
                program: self.program.clone(),
                exit_code: 1,
                stderr: "no DevOps organization configured (set AZSCOPE_DEVOPS_ORG)".to_string(),
            }),
        }
    }

    async fn devops_projects(&self, org: &str) -> Result<Vec<Project>, CloudError> {
        let url = format!("https://dev.azure.com/{}", org);
        let out = self
            .az(&["devops", "project", "list", "--organization", &url], self.timeout)
            .await?;
        // Wrapped shape: {"value": [...]}
        #[derive(serde::Deserialize)]
        struct Wrapper {
            value: Vec<Project>,
        }
        let wrapper: Wrapper = self.decode(&out)?;
        Ok(wrapper.value)
    }

    async fn devops_pipelines(&self, org: &str, project: &str) -> Result<Vec<Pipeline>, CloudError> {
        let url = format!("https://dev.azure.com/{}", org);
        let out = self
            .az(
                &["pipelines", "list", "--organization", &url, "--project", project],
                self.timeout,
            )
            .await?;
        self.decode(&out)
    }

    async fn run_tool(&self, dir: &Path, op: ToolOp, operand: Option<&str>) -> Result<String, CloudError> {
        let mut args = op.args();
        if let Some(operand) = operand {
            args.push(operand.to_string());
        }
        let out = process::run_in(&self.tool, &args, Some(dir), self.mutate_timeout).await?;
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azcli_from_config_defaults() {
        let config = Config::default();
        let cli = AzCli::new(&config);
        assert_eq!(cli.program, "az");
        assert_eq!(cli.timeout, Duration::from_secs(10));
        assert_eq!(cli.mutate_timeout, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_devops_orgs_unconfigured_fails() {
        let cli = AzCli::new(&Config::default());
        let err = cli.devops_organizations().await.unwrap_err();
        assert!(matches!(err, CloudError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_devops_orgs_configured() {
        let config = Config {
            devops_org: Some("contoso".to_string()),
            ..Config::default()
        };
        let cli = AzCli::new(&config);
        let orgs = cli.devops_organizations().await.unwrap();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "contoso");
    }
}
