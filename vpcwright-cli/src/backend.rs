//! Provider selection: the AWS API or the file-backed local store

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use colored::Colorize;

use vpcwright_core::memory::{MemoryProvider, Snapshot};
use vpcwright_core::provider::Provider;
use vpcwright_provider_aws::AwsProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderChoice {
    /// Amazon EC2 through the default credential chain
    Aws,
    /// In-memory store persisted to a JSON state file
    Local,
}

/// In-memory provider whose store survives between invocations
pub struct LocalBackend {
    state_file: PathBuf,
    provider: MemoryProvider,
}

impl LocalBackend {
    /// Load the store from `state_file`, or start a fresh one with a small catalog
    pub fn open(state_file: &Path) -> Result<Self, String> {
        let provider = if state_file.exists() {
            let content = fs::read_to_string(state_file)
                .map_err(|e| format!("Failed to read {}: {}", state_file.display(), e))?;
            let snapshot: Snapshot = serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse {}: {}", state_file.display(), e))?;
            log::debug!(
                "Loaded {} resource(s) from {}",
                snapshot.resources.len(),
                state_file.display()
            );
            MemoryProvider::from_snapshot(snapshot)
        } else {
            MemoryProvider::new().with_catalog()
        };

        Ok(Self {
            state_file: state_file.to_path_buf(),
            provider,
        })
    }

    pub fn save(&self) -> Result<(), String> {
        if let Some(parent) = self.state_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let content = serde_json::to_string_pretty(&self.provider.snapshot())
            .map_err(|e| format!("Failed to serialize state: {}", e))?;
        fs::write(&self.state_file, content)
            .map_err(|e| format!("Failed to write {}: {}", self.state_file.display(), e))
    }
}

pub enum Backend {
    Aws(AwsProvider),
    Local(LocalBackend),
}

impl Backend {
    pub async fn open(
        choice: ProviderChoice,
        region: Option<&str>,
        state_file: &Path,
    ) -> Result<Self, String> {
        match choice {
            ProviderChoice::Aws => {
                let provider = AwsProvider::new(region).await;
                println!(
                    "{}",
                    format!("Using AWS provider (region: {})", provider.region()).cyan()
                );
                Ok(Backend::Aws(provider))
            }
            ProviderChoice::Local => {
                let backend = LocalBackend::open(state_file)?;
                println!(
                    "{}",
                    format!("Using local provider (state: {})", state_file.display()).cyan()
                );
                Ok(Backend::Local(backend))
            }
        }
    }

    pub fn provider(&self) -> &dyn Provider {
        match self {
            Backend::Aws(provider) => provider,
            Backend::Local(backend) => &backend.provider,
        }
    }

    /// Persist the local store; a no-op for AWS
    pub fn persist(&self) -> Result<(), String> {
        match self {
            Backend::Aws(_) => Ok(()),
            Backend::Local(backend) => backend.save(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpcwright_core::resource::{Resource, ResourceKind, ResourceSpec};
    use vpcwright_core::tags::Tags;

    #[tokio::test]
    async fn local_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("nested").join("state.json");

        let backend = LocalBackend::open(&state_file).unwrap();
        let network = Resource::new(ResourceSpec::Network {
            cidr_block: "10.0.0.0/16".to_string(),
            enable_dns: false,
        })
        .with_tags(Tags::named("Test", "Dev"));
        let created = backend.provider.create(&network).await.unwrap();
        backend.save().unwrap();

        let reopened = LocalBackend::open(&state_file).unwrap();
        let snapshot = reopened.provider.snapshot();
        assert!(
            snapshot
                .resources
                .iter()
                .any(|s| s.kind == ResourceKind::Network && s.identifier == created.identifier)
        );
    }

    #[test]
    fn fresh_store_has_a_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(&dir.path().join("state.json")).unwrap();
        let snapshot = backend.provider.snapshot();
        assert!(snapshot.resources.iter().any(|s| s.kind == ResourceKind::Image));
        assert!(snapshot.resources.iter().any(|s| s.kind == ResourceKind::InstanceType));
    }

    #[test]
    fn corrupt_state_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("state.json");
        fs::write(&state_file, "not json").unwrap();
        let err = LocalBackend::open(&state_file).err().unwrap();
        assert!(err.contains("Failed to parse"));
    }
}
