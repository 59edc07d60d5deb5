//! Signing identities held by a wallet.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credential type understood by the network.
pub const X509: &str = "X.509";

/// A signing identity bound to a wallet label.
///
/// The private key never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    label: String,
    msp_id: String,
    certificate: String,
    private_key: String,
}

impl Identity {
    pub fn new(
        label: impl Into<String>,
        msp_id: impl Into<String>,
        certificate: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            msp_id: msp_id.into(),
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }

    /// Name the identity is stored under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Membership service provider that issued the certificate.
    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    /// PEM-encoded certificate presented to the network.
    pub fn certificate(&self) -> &str {
        &self.certificate
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Serialized creator bytes (MSP id followed by certificate).
    pub fn creator(&self) -> Vec<u8> {
        let mut creator = Vec::with_capacity(self.msp_id.len() + self.certificate.len());
        creator.extend_from_slice(self.msp_id.as_bytes());
        creator.extend_from_slice(self.certificate.as_bytes());
        creator
    }

    pub(crate) fn to_entry(&self) -> WalletEntry {
        WalletEntry {
            credentials: Credentials {
                certificate: self.certificate.clone(),
                private_key: self.private_key.clone(),
            },
            msp_id: self.msp_id.clone(),
            kind: X509.to_string(),
            version: 1,
        }
    }

    pub(crate) fn from_entry(label: &str, entry: WalletEntry) -> Self {
        Self::new(
            label,
            entry.msp_id,
            entry.credentials.certificate,
            entry.credentials.private_key,
        )
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("label", &self.label)
            .field("msp_id", &self.msp_id)
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// On-disk representation of an identity (`<label>.id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WalletEntry {
    pub credentials: Credentials,
    pub msp_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Credentials {
    pub certificate: String,
    pub private_key: String,
}

fn default_version() -> u32 {
    1
}
