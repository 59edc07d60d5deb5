//! Wallets: lookup of signing identities by label.
//!
//! The client only ever asks a wallet for one identity by name. Two stores are
//! provided: a directory of `<label>.id` JSON files and an in-memory map.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::identity::{Identity, WalletEntry, X509};

const ENTRY_SUFFIX: &str = ".id";

/// A store of identities keyed by label.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Returns the identity stored under `label`, if any.
    async fn get(&self, label: &str) -> Result<Option<Identity>>;

    /// Stores `identity` under its label, replacing any previous entry.
    async fn put(&self, identity: Identity) -> Result<()>;

    /// Labels of all stored identities, sorted.
    async fn list(&self) -> Result<Vec<String>>;
}

/// Resolves `label` to an identity, failing if the wallet has no such entry.
pub async fn resolve_identity(wallet: &dyn Wallet, label: &str) -> Result<Identity> {
    match wallet.get(label).await? {
        Some(identity) => Ok(identity),
        None => Err(Error::Authentication {
            identity: label.to_string(),
            reason: "identity not found in wallet".into(),
        }),
    }
}

fn check_label(label: &str) -> Result<()> {
    if label.is_empty() || label.contains(['/', '\\']) || label.starts_with('.') {
        return Err(Error::Configuration(format!(
            "invalid wallet label `{}`",
            label
        )));
    }
    Ok(())
}

/// Wallet backed by a directory of `<label>.id` files.
#[derive(Debug, Clone)]
pub struct FileSystemWallet {
    dir: PathBuf,
}

impl FileSystemWallet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{}{}", label, ENTRY_SUFFIX))
    }
}

#[async_trait]
impl Wallet for FileSystemWallet {
    async fn get(&self, label: &str) -> Result<Option<Identity>> {
        check_label(label)?;
        let path = self.entry_path(label);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "cannot read wallet entry {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let entry: WalletEntry = serde_json::from_slice(&raw).map_err(|e| {
            Error::Configuration(format!("malformed wallet entry {}: {}", path.display(), e))
        })?;
        if entry.kind != X509 {
            return Err(Error::Configuration(format!(
                "unsupported identity type `{}` for `{}`",
                entry.kind, label
            )));
        }

        tracing::debug!(label, msp_id = %entry.msp_id, "loaded identity from wallet");
        Ok(Some(Identity::from_entry(label, entry)))
    }

    async fn put(&self, identity: Identity) -> Result<()> {
        check_label(identity.label())?;
        let raw = serde_json::to_vec_pretty(&identity.to_entry())
            .map_err(|e| Error::Configuration(format!("cannot encode identity: {}", e)))?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Configuration(format!("cannot create wallet {}: {}", self.dir.display(), e))
        })?;
        let path = self.entry_path(identity.label());
        tokio::fs::write(&path, raw).await.map_err(|e| {
            Error::Configuration(format!("cannot write wallet entry {}: {}", path.display(), e))
        })
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "cannot list wallet {}: {}",
                    self.dir.display(),
                    e
                )))
            }
        };

        let mut labels = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| Error::Configuration(format!("cannot list wallet: {}", e)))?
        {
            let name = entry.file_name();
            if let Some(label) = name.to_str().and_then(|n| n.strip_suffix(ENTRY_SUFFIX)) {
                labels.push(label.to_string());
            }
        }
        labels.sort();
        Ok(labels)
    }
}

/// Wallet held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryWallet {
    entries: RwLock<BTreeMap<String, Identity>>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a wallet that already holds `identities`.
    pub fn with_identities(identities: impl IntoIterator<Item = Identity>) -> Self {
        let entries = identities
            .into_iter()
            .map(|id| (id.label().to_string(), id))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl Wallet for InMemoryWallet {
    async fn get(&self, label: &str) -> Result<Option<Identity>> {
        Ok(self.entries.read().get(label).cloned())
    }

    async fn put(&self, identity: Identity) -> Result<()> {
        check_label(identity.label())?;
        self.entries
            .write()
            .insert(identity.label().to_string(), identity);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn app_user() -> Identity {
        Identity::new("appUser", "Org1MSP", "-----BEGIN CERTIFICATE-----", "KEY")
    }

    #[tokio::test]
    async fn test_file_wallet_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = FileSystemWallet::new(dir.path().join("wallet"));

        wallet.put(app_user()).await.unwrap();
        let loaded = wallet.get("appUser").await.unwrap().expect("stored identity");
        assert_eq!(loaded, app_user());
        assert_eq!(wallet.list().await.unwrap(), vec!["appUser".to_string()]);
    }

    #[tokio::test]
    async fn test_file_wallet_missing_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = FileSystemWallet::new(dir.path());
        assert!(wallet.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_wallet_rejects_malformed_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("appUser.id"), b"{not json").unwrap();
        let wallet = FileSystemWallet::new(dir.path());

        let err = wallet.get("appUser").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_file_wallet_rejects_unknown_identity_type() {
        let dir = tempfile::tempdir().unwrap();
        let entry = r#"{"credentials":{"certificate":"C","privateKey":"K"},"mspId":"Org1MSP","type":"HSM-X.509","version":1}"#;
        std::fs::write(dir.path().join("appUser.id"), entry).unwrap();
        let wallet = FileSystemWallet::new(dir.path());

        let err = wallet.get("appUser").await.unwrap_err();
        assert!(err.to_string().contains("HSM-X.509"));
    }

    #[tokio::test]
    async fn test_label_cannot_escape_wallet_dir() {
        let wallet = FileSystemWallet::new("wallet");
        let err = wallet.get("../secrets").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_resolve_missing_identity_is_authentication_error() {
        let wallet = InMemoryWallet::new();
        let err = resolve_identity(&wallet, "appUser").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_in_memory_wallet_lists_sorted_labels() {
        let wallet = InMemoryWallet::with_identities([
            Identity::new("zed", "Org1MSP", "C", "K"),
            app_user(),
        ]);
        assert_eq!(
            wallet.list().await.unwrap(),
            vec!["appUser".to_string(), "zed".to_string()]
        );
    }
}
