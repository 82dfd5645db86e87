//! Compiled contract artifacts.
//!
//! Contracts are compiled by an external toolchain (Hardhat); this module only reads
//! its output and prepares creation bytecode.

use std::path::{Path, PathBuf};

use alloy_core::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use serde::Deserialize;

use crate::{ArtifactError, DeployError};

/// Directory Hardhat writes its build metadata to; never holds contract artifacts.
const BUILD_INFO_DIR: &str = "build-info";

/// A compiled contract: deployable bytecode plus its ABI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// ABI-encode constructor arguments against this artifact's constructor.
    pub fn encode_constructor(&self, args: &[DynSolValue]) -> Result<Bytes, DeployError> {
        match &self.abi.constructor {
            Some(constructor) => constructor
                .abi_encode_input(args)
                .map(Bytes::from)
                .map_err(|e| DeployError::ConstructorArgs {
                    contract: self.contract_name.clone(),
                    message: e.to_string(),
                }),
            None if args.is_empty() => Ok(Bytes::new()),
            None => Err(DeployError::ConstructorArgs {
                contract: self.contract_name.clone(),
                message: format!(
                    "contract has no constructor but {} argument(s) were given",
                    args.len()
                ),
            }),
        }
    }
}

/// Source of compiled contract artifacts.
pub trait ArtifactSource {
    /// Resolve the artifact for the named contract.
    fn artifact(&self, name: &str) -> Result<ContractArtifact, ArtifactError>;
}

/// Reads artifacts from a Hardhat `artifacts/` directory.
///
/// A contract `Name` is expected at `<root>/**/<File>.sol/Name.json`.
#[derive(Debug, Clone)]
pub struct HardhatArtifacts {
    root: PathBuf,
}

impl HardhatArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{name}.json");
        let mut matches = Vec::new();
        collect_matches(&self.root, &file_name, &mut matches)?;

        match matches.len() {
            0 => Err(ArtifactError::NotFound {
                name: name.to_string(),
                root: self.root.clone(),
            }),
            1 => Ok(matches.remove(0)),
            _ => {
                matches.sort();
                Err(ArtifactError::Ambiguous {
                    name: name.to_string(),
                    paths: matches,
                })
            }
        }
    }
}

impl ArtifactSource for HardhatArtifacts {
    fn artifact(&self, name: &str) -> Result<ContractArtifact, ArtifactError> {
        let path = self.find(name)?;
        tracing::debug!(contract = %name, path = %path.display(), "Loading contract artifact");

        let content = std::fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        let artifact: ContractArtifact =
            serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
                path: path.clone(),
                source,
            })?;

        if artifact.contract_name != name {
            return Err(ArtifactError::NotFound {
                name: name.to_string(),
                root: self.root.clone(),
            });
        }
        if artifact.bytecode.is_empty() {
            return Err(ArtifactError::NotDeployable {
                name: name.to_string(),
            });
        }

        Ok(artifact)
    }
}

/// Walk `dir` and collect every `<something>.sol/<file_name>` path.
fn collect_matches(
    dir: &Path,
    file_name: &str,
    matches: &mut Vec<PathBuf>,
) -> Result<(), ArtifactError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == BUILD_INFO_DIR) {
                continue;
            }
            collect_matches(&path, file_name, matches)?;
        } else if path.file_name().is_some_and(|n| n == file_name)
            && dir.extension().is_some_and(|ext| ext == "sol")
        {
            matches.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::U256;
    use tempdir::TempDir;

    const PROXY_ABI: &str = r#"[
        {"type": "constructor", "stateMutability": "nonpayable",
         "inputs": [{"name": "delay", "type": "uint256", "internalType": "uint256"}]}
    ]"#;

    fn write_artifact(root: &Path, source: &str, name: &str, abi: &str, bytecode: &str) {
        let dir = root.join("contracts").join(format!("{source}.sol"));
        std::fs::create_dir_all(&dir).unwrap();
        let json = format!(
            r#"{{"_format": "hh-sol-artifact-1", "contractName": "{name}", "sourceName": "contracts/{source}.sol",
                "abi": {abi}, "bytecode": "{bytecode}", "deployedBytecode": "0x", "linkReferences": {{}}}}"#
        );
        std::fs::write(dir.join(format!("{name}.json")), json).unwrap();
        std::fs::write(dir.join(format!("{name}.dbg.json")), "{}").unwrap();
    }

    #[test]
    fn test_loads_nested_artifact() {
        let tmp = TempDir::new("artifacts").unwrap();
        write_artifact(tmp.path(), "Starknet", "Starknet", "[]", "0x6080604052");
        std::fs::create_dir_all(tmp.path().join(BUILD_INFO_DIR)).unwrap();

        let artifact = HardhatArtifacts::new(tmp.path()).artifact("Starknet").unwrap();
        assert_eq!(artifact.contract_name, "Starknet");
        assert_eq!(artifact.bytecode, Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52]));
    }

    #[test]
    fn test_missing_artifact() {
        let tmp = TempDir::new("artifacts").unwrap();
        write_artifact(tmp.path(), "Starknet", "Starknet", "[]", "0x6080");

        let err = HardhatArtifacts::new(tmp.path()).artifact("Proxy").unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[test]
    fn test_ambiguous_artifact() {
        let tmp = TempDir::new("artifacts").unwrap();
        write_artifact(tmp.path(), "Proxy", "Proxy", "[]", "0x6080");
        write_artifact(tmp.path(), "Legacy", "Proxy", "[]", "0x6080");

        let err = HardhatArtifacts::new(tmp.path()).artifact("Proxy").unwrap_err();
        match err {
            ArtifactError::Ambiguous { paths, .. } => assert_eq!(paths.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_interface_is_not_deployable() {
        let tmp = TempDir::new("artifacts").unwrap();
        write_artifact(tmp.path(), "IStarknet", "IStarknet", "[]", "0x");

        let err = HardhatArtifacts::new(tmp.path()).artifact("IStarknet").unwrap_err();
        assert!(matches!(err, ArtifactError::NotDeployable { .. }));
    }

    #[test]
    fn test_encode_constructor_uint() {
        let artifact = ContractArtifact {
            contract_name: "Proxy".to_string(),
            abi: serde_json::from_str(PROXY_ABI).unwrap(),
            bytecode: Bytes::from_static(&[0x60, 0x80]),
        };

        let encoded = artifact
            .encode_constructor(&[DynSolValue::Uint(U256::from(1000), 256)])
            .unwrap();
        assert_eq!(encoded.len(), 32);
        assert_eq!(U256::from_be_slice(&encoded), U256::from(1000));
    }

    #[test]
    fn test_encode_constructor_arity_mismatch() {
        let artifact = ContractArtifact {
            contract_name: "Proxy".to_string(),
            abi: serde_json::from_str(PROXY_ABI).unwrap(),
            bytecode: Bytes::from_static(&[0x60, 0x80]),
        };
        assert!(matches!(
            artifact.encode_constructor(&[]),
            Err(DeployError::ConstructorArgs { .. })
        ));
    }

    #[test]
    fn test_encode_without_constructor() {
        let artifact = ContractArtifact {
            contract_name: "Starknet".to_string(),
            abi: JsonAbi::new(),
            bytecode: Bytes::from_static(&[0x60, 0x80]),
        };
        assert!(artifact.encode_constructor(&[]).unwrap().is_empty());
        assert!(artifact
            .encode_constructor(&[DynSolValue::Bool(true)])
            .is_err());
    }
}
