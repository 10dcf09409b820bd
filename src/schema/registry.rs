use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Response from the provider versions API.
#[derive(Debug, Deserialize)]
struct ProviderVersionsResponse {
    versions: Vec<ProviderVersionEntry>,
}

#[derive(Debug, Deserialize)]
struct ProviderVersionEntry {
    version: String,
}

/// Response from the module versions API.
#[derive(Debug, Deserialize)]
struct ModuleVersionsResponse {
    modules: Vec<ModuleVersionsEntry>,
}

#[derive(Debug, Deserialize)]
struct ModuleVersionsEntry {
    versions: Vec<ModuleVersionEntry>,
}

#[derive(Debug, Deserialize)]
struct ModuleVersionEntry {
    version: String,
}

/// Client for the Terraform registry, used to pin provider and module
/// versions when the configuration carries no constraint.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://registry.terraform.io".to_string(),
        }
    }
}

impl RegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Parse a provider source like "hashicorp/aws" or
    /// "registry.terraform.io/hashicorp/aws" into (namespace, type).
    pub fn parse_provider_source(source: &str) -> Result<(String, String)> {
        let parts: Vec<&str> = source.split('/').collect();
        match parts.len() {
            1 => Ok(("hashicorp".to_string(), parts[0].to_string())),
            2 => Ok((parts[0].to_string(), parts[1].to_string())),
            3 => Ok((parts[1].to_string(), parts[2].to_string())),
            _ => bail!(
                "Invalid provider source '{}'. Expected namespace/type or hostname/namespace/type",
                source
            ),
        }
    }

    /// List available versions for a provider, newest last.
    pub async fn provider_versions(&self, namespace: &str, provider_type: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/v1/providers/{}/{}/versions",
            self.base_url, namespace, provider_type
        );

        let resp: ProviderVersionsResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to query provider registry")?
            .json()
            .await
            .context("Failed to parse registry response")?;

        Ok(resp.versions.into_iter().map(|v| v.version).collect())
    }

    /// Resolve the best provider version matching a constraint.
    /// Supports: exact ("1.2.3"), pessimistic ("~> 1.2"), and ">= 1.0".
    /// No constraint resolves to the highest version.
    pub async fn resolve_provider_version(
        &self,
        namespace: &str,
        provider_type: &str,
        constraint: Option<&str>,
    ) -> Result<String> {
        let mut versions = self.provider_versions(namespace, provider_type).await?;
        versions.sort_by(|a, b| compare_versions(a, b));

        let matching = versions
            .into_iter()
            .rev()
            .find(|v| matches_constraint(v, constraint));
        matching.with_context(|| {
            format!(
                "No version of {}/{} matches constraint {:?}",
                namespace, provider_type, constraint
            )
        })
    }

    /// Latest published version of a registry module
    /// (`namespace/name/provider`).
    pub async fn module_latest_version(&self, source: &str) -> Result<String> {
        let url = format!("{}/v1/modules/{}/versions", self.base_url, source);

        let resp: ModuleVersionsResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to query module registry")?
            .json()
            .await
            .context("Failed to parse registry response")?;

        let mut versions: Vec<String> = resp
            .modules
            .into_iter()
            .flat_map(|m| m.versions)
            .map(|v| v.version)
            .collect();
        versions.sort_by(|a, b| compare_versions(a, b));
        versions
            .pop()
            .with_context(|| format!("Module {} has no published versions", source))
    }
}

fn parse_semver(v: &str) -> (u64, u64, u64) {
    let mut parts = v.trim().trim_start_matches('v').splitn(3, '.');
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts
        .next()
        .map(|p| p.split(['-', '+']).next().unwrap_or("0"))
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    (major, minor, patch)
}

fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    parse_semver(a).cmp(&parse_semver(b))
}

fn matches_constraint(version: &str, constraint: Option<&str>) -> bool {
    let Some(constraint) = constraint else {
        return true;
    };
    let constraint = constraint.trim();
    let (maj, min, patch) = parse_semver(version);

    if let Some(rest) = constraint.strip_prefix("~>") {
        let (cmaj, cmin, _) = parse_semver(rest);
        // ~> x.y allows x.y and any higher minor-or-patch within major x.
        return maj == cmaj && (min, patch) >= (cmin, 0);
    }
    if let Some(rest) = constraint.strip_prefix(">=") {
        return (maj, min, patch) >= parse_semver(rest);
    }
    if let Some(rest) = constraint.strip_prefix('=') {
        return parse_semver(rest) == (maj, min, patch);
    }
    parse_semver(constraint) == (maj, min, patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_matching() {
        assert!(matches_constraint("1.2.3", None));
        assert!(matches_constraint("1.2.3", Some("1.2.3")));
        assert!(matches_constraint("1.2.3", Some("= 1.2.3")));
        assert!(!matches_constraint("1.2.4", Some("1.2.3")));
        assert!(matches_constraint("1.4.0", Some("~> 1.2")));
        assert!(!matches_constraint("2.0.0", Some("~> 1.2")));
        assert!(matches_constraint("2.0.0", Some(">= 1.5")));
        assert!(!matches_constraint("1.4.9", Some(">= 1.5")));
    }

    #[test]
    fn provider_source_forms() {
        assert_eq!(
            RegistryClient::parse_provider_source("aws").unwrap(),
            ("hashicorp".to_string(), "aws".to_string())
        );
        assert_eq!(
            RegistryClient::parse_provider_source("hashicorp/aws").unwrap(),
            ("hashicorp".to_string(), "aws".to_string())
        );
        assert_eq!(
            RegistryClient::parse_provider_source("registry.terraform.io/hashicorp/aws").unwrap(),
            ("hashicorp".to_string(), "aws".to_string())
        );
        assert!(RegistryClient::parse_provider_source("a/b/c/d").is_err());
    }
}
