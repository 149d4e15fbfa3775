//! Config - Static network layout loaded once at startup

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cidr::Ipv4Cidr;

/// Errors raised while loading a network configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_destination() -> String {
    "0.0.0.0/0".to_string()
}

/// One network with public subnets, a route table and an internet gateway
///
/// Keys use the upper-snake-case form of the configuration file
/// (`CIDR_BLOCK`, `TAG_VPC_NAME`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NetworkConfig {
    pub cidr_block: String,
    pub tag_vpc_name: String,
    pub tag_env: String,
    #[serde(default)]
    pub cidr_public_subnets: Vec<String>,
    #[serde(default)]
    pub availability_zones: Vec<String>,
    #[serde(default)]
    pub tag_subnets: Vec<String>,
    pub tag_rtb: String,
    pub tag_igw_name: String,
    #[serde(default = "default_destination")]
    pub dest_cidr_block: String,
    #[serde(default)]
    pub enable_dns: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// A configured public subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetLayout<'a> {
    pub cidr_block: &'a str,
    pub availability_zone: &'a str,
    pub name: &'a str,
}

impl NetworkConfig {
    /// Read and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        log::debug!("Loaded network configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("TAG_VPC_NAME", &self.tag_vpc_name),
            ("TAG_ENV", &self.tag_env),
            ("TAG_RTB", &self.tag_rtb),
            ("TAG_IGW_NAME", &self.tag_igw_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
            }
        }

        let vpc_range = parse_cidr("CIDR_BLOCK", &self.cidr_block)?;
        parse_cidr("DEST_CIDR_BLOCK", &self.dest_cidr_block)?;

        let count = self.cidr_public_subnets.len();
        if self.availability_zones.len() != count || self.tag_subnets.len() != count {
            return Err(ConfigError::Invalid(format!(
                "CIDR_PUBLIC_SUBNETS ({}), AVAILABILITY_ZONES ({}) and TAG_SUBNETS ({}) must have the same length",
                count,
                self.availability_zones.len(),
                self.tag_subnets.len()
            )));
        }

        let mut ranges: Vec<Ipv4Cidr> = Vec::with_capacity(count);
        for subnet in self.subnets() {
            let range = parse_cidr("CIDR_PUBLIC_SUBNETS", subnet.cidr_block)?;
            if !vpc_range.contains(&range) {
                return Err(ConfigError::Invalid(format!(
                    "subnet {} is outside CIDR_BLOCK {}",
                    range, vpc_range
                )));
            }
            if let Some(other) = ranges.iter().find(|r| r.overlaps(&range)) {
                return Err(ConfigError::Invalid(format!(
                    "subnet {} overlaps {}",
                    range, other
                )));
            }
            if subnet.name.trim().is_empty() || subnet.availability_zone.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "subnet {} needs a name and an availability zone",
                    range
                )));
            }
            ranges.push(range);
        }

        Ok(())
    }

    /// Subnets in configuration order
    pub fn subnets(&self) -> impl Iterator<Item = SubnetLayout<'_>> {
        self.cidr_public_subnets
            .iter()
            .zip(&self.availability_zones)
            .zip(&self.tag_subnets)
            .map(|((cidr_block, availability_zone), name)| SubnetLayout {
                cidr_block,
                availability_zone,
                name,
            })
    }
}

fn parse_cidr(key: &str, value: &str) -> Result<Ipv4Cidr, ConfigError> {
    value
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const SAMPLE: &str = r#"{
        "CIDR_BLOCK": "10.0.0.0/16",
        "TAG_VPC_NAME": "AcmeLabs-Dev",
        "TAG_ENV": "Dev",
        "CIDR_PUBLIC_SUBNETS": ["10.0.1.0/24", "10.0.2.0/24"],
        "AVAILABILITY_ZONES": ["us-east-1a", "us-east-1b"],
        "TAG_SUBNETS": ["Public-Subnet-1", "Public-Subnet-2"],
        "TAG_RTB": "Public-RTB",
        "TAG_IGW_NAME": "AcmeLabs-IGW"
    }"#;

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = NetworkConfig::load(file.path()).unwrap();
        assert_eq!(config.tag_vpc_name, "AcmeLabs-Dev");
        assert_eq!(config.dest_cidr_block, "0.0.0.0/0");
        assert!(!config.enable_dns);
        assert_eq!(config.region, None);

        let subnets: Vec<_> = config.subnets().collect();
        assert_eq!(subnets.len(), 2);
        assert_eq!(subnets[1].availability_zone, "us-east-1b");
        assert_eq!(subnets[1].name, "Public-Subnet-2");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NetworkConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = NetworkConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn mismatched_subnet_lists_are_rejected() {
        let json = SAMPLE.replace(r#"["us-east-1a", "us-east-1b"]"#, r#"["us-east-1a"]"#);
        let err = NetworkConfig::from_json(&json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("same length")));
    }

    #[test]
    fn bad_cidrs_are_rejected() {
        let json = SAMPLE.replace("10.0.0.0/16", "10.0.0.0/40");
        assert!(matches!(
            NetworkConfig::from_json(&json),
            Err(ConfigError::Invalid(_))
        ));

        let json = SAMPLE.replace("10.0.2.0/24", "10.9.0.0/24");
        assert!(matches!(
            NetworkConfig::from_json(&json),
            Err(ConfigError::Invalid(ref m)) if m.contains("outside")
        ));

        let json = SAMPLE.replace("10.0.2.0/24", "10.0.1.0/25");
        assert!(matches!(
            NetworkConfig::from_json(&json),
            Err(ConfigError::Invalid(ref m)) if m.contains("overlaps")
        ));
    }

    #[test]
    fn empty_tag_is_rejected() {
        let json = SAMPLE.replace("\"Dev\"", "\"\"");
        assert!(NetworkConfig::from_json(&json).is_err());
    }
}
