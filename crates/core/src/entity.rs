//! Domain entities decoded from transaction responses.
//!
//! Decoding is a pure function of the response bytes. A buffer either yields
//! a fully populated entity or a [`Error::Decode`]; there is no partial
//! result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::{ArgType, ContractInterface, TransactionSignature};

/// A record that can be rebuilt from a committed response payload.
pub trait Entity: Sized + fmt::Display + Send {
    /// Class tag the contract stamps on serialized instances.
    const CLASS: &'static str;

    /// Decodes a response payload.
    fn decode(raw: &[u8]) -> Result<Self>;
}

/// A hospital asset: a report produced by a device for a patient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    pub asset_id: String,
    pub patient_id: String,
    pub version: u32,
    pub report_type: String,
    pub device_id: String,
}

/// Wire shape of an asset. `class` is optional so bare records decode too.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    asset_id: String,
    patient_id: String,
    version: u32,
    report_type: String,
    device_id: String,
}

impl Asset {
    pub const CREATE: &'static str = "createAsset";
    pub const READ: &'static str = "readAsset";

    /// Transactions of the asset contract and the arguments they take.
    pub fn contract_interface() -> ContractInterface {
        ContractInterface::new()
            .with(
                TransactionSignature::new(Self::CREATE)
                    .param("assetId", ArgType::String)
                    .param("patientId", ArgType::String)
                    .param("version", ArgType::Unsigned)
                    .param("reportType", ArgType::String)
                    .param("deviceId", ArgType::String),
            )
            .with(TransactionSignature::new(Self::READ).param("assetId", ArgType::String))
    }

    /// Serializes the asset the way the contract does, class tag included.
    pub fn encode(&self) -> Vec<u8> {
        let record = AssetRecord {
            class: Some(Self::CLASS.to_string()),
            asset_id: self.asset_id.clone(),
            patient_id: self.patient_id.clone(),
            version: self.version,
            report_type: self.report_type.clone(),
            device_id: self.device_id.clone(),
        };
        // A struct of strings and integers always serializes.
        serde_json::to_vec(&record).unwrap_or_default()
    }
}

impl Entity for Asset {
    const CLASS: &'static str = "org.hospitalnet.asset";

    fn decode(raw: &[u8]) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::Decode("empty response payload".into()));
        }
        if raw.iter().find(|b| !b.is_ascii_whitespace()) != Some(&b'{') {
            return Err(Error::Decode("expected a JSON object".into()));
        }
        let record: AssetRecord = serde_json::from_slice(raw)
            .map_err(|e| Error::Decode(format!("malformed asset: {}", e)))?;

        if let Some(class) = &record.class {
            if class != Self::CLASS {
                return Err(Error::Decode(format!(
                    "expected class `{}`, found `{}`",
                    Self::CLASS,
                    class
                )));
            }
        }
        if record.asset_id.is_empty() {
            return Err(Error::Decode("asset has an empty assetId".into()));
        }

        Ok(Asset {
            asset_id: record.asset_id,
            patient_id: record.patient_id,
            version: record.version,
            report_type: record.report_type,
            device_id: record.device_id,
        })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "asset {} ({} v{}) for patient {} recorded by device {}",
            self.asset_id, self.report_type, self.version, self.patient_id, self.device_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const FIXTURE: &[u8] = br#"{"class":"org.hospitalnet.asset","assetId":"1","patientId":"P001","version":1,"reportType":"Patient Report","deviceId":"D001"}"#;

    #[test]
    fn test_decode_fixture() {
        let asset = Asset::decode(FIXTURE).unwrap();
        assert_eq!(asset.asset_id, "1");
        assert_eq!(asset.patient_id, "P001");
        assert_eq!(asset.version, 1);
        assert_eq!(asset.report_type, "Patient Report");
        assert_eq!(asset.device_id, "D001");
    }

    #[test]
    fn test_decode_without_class_tag() {
        let raw = br#"{"assetId":"7","patientId":"P9","version":2,"reportType":"Scan","deviceId":"D3"}"#;
        assert_eq!(Asset::decode(raw).unwrap().asset_id, "7");
    }

    #[test]
    fn test_decode_rejects_foreign_class() {
        let raw = br#"{"class":"org.papernet.paper","assetId":"1","patientId":"P","version":1,"reportType":"R","deviceId":"D"}"#;
        let err = Asset::decode(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("org.papernet.paper"));
    }

    #[test]
    fn test_decode_rejects_wrong_field_type() {
        let raw = br#"{"assetId":"1","patientId":"P","version":"one","reportType":"R","deviceId":"D"}"#;
        assert_eq!(Asset::decode(raw).unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let raw = br#"{"assetId":"1","patientId":"P","version":1,"reportType":"R"}"#;
        assert_eq!(Asset::decode(raw).unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_decode_rejects_positional_form() {
        let raw = br#"[null,"1","P001",1,"Patient Report","D001"]"#;
        let err = Asset::decode(raw).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert_eq!(Asset::decode(b"").unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_encode_matches_contract_shape() {
        let asset = Asset::decode(FIXTURE).unwrap();
        assert_eq!(asset.encode(), FIXTURE.to_vec());
    }

    #[test]
    fn test_interface_knows_create_asset() {
        let interface = Asset::contract_interface();
        let signature = interface.signature(Asset::CREATE).unwrap();
        assert_eq!(signature.params().len(), 5);
    }

    #[test]
    fn test_interface_rejects_version_outside_u32() {
        let interface = Asset::contract_interface();
        for version in ["-1", "5000000000"] {
            let err = interface
                .parse(Asset::CREATE, &["1", "P001", version, "Patient Report", "D001"])
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Argument);
        }
        assert!(interface
            .parse(Asset::CREATE, &["1", "P001", "4294967295", "Patient Report", "D001"])
            .is_ok());
    }
}
