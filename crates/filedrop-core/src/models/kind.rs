use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend kinds
///
/// This enum tags every storage location with the backend that holds it.
/// It's defined in core because both configuration and persisted records
/// reference it.
///
/// Read and primary-selection priority is fixed: channel > cloud > local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Channel,
    Cloud,
    Local,
}

impl StorageKind {
    /// All kinds in primary-selection priority order.
    pub const PRIORITY: [StorageKind; 3] =
        [StorageKind::Channel, StorageKind::Cloud, StorageKind::Local];
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "channel" => Ok(StorageKind::Channel),
            "cloud" => Ok(StorageKind::Cloud),
            "local" => Ok(StorageKind::Local),
            _ => Err(anyhow::anyhow!("Invalid storage kind: {}", s)),
        }
    }
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageKind::Channel => write!(f, "channel"),
            StorageKind::Cloud => write!(f, "cloud"),
            StorageKind::Local => write!(f, "local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for kind in StorageKind::PRIORITY {
            assert_eq!(kind.to_string().parse::<StorageKind>().unwrap(), kind);
        }
        assert!("telegram".parse::<StorageKind>().is_err());
    }

    #[test]
    fn priority_order() {
        assert_eq!(StorageKind::PRIORITY[0], StorageKind::Channel);
        assert_eq!(StorageKind::PRIORITY[2], StorageKind::Local);
    }
}
