//! Read-modify-write of the Pro client configuration file.
//!
//! Only `contract_url` and `security_url` are touched; every other key is
//! carried over as parsed. Comments in the existing file are not preserved.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::{io_err, CoreError};
use crate::types::DEFAULT_CONTRACT_URL;

/// Default location of the Pro client configuration on Ubuntu hosts.
pub const UACLIENT_CONFIG: &str = "/etc/ubuntu-advantage/uaclient.conf";

const CONTRACT_URL_KEY: &str = "contract_url";
const SECURITY_URL_KEY: &str = "security_url";

/// Load `path` as a YAML mapping. An empty file is an empty mapping.
pub fn load_at(path: &Path) -> Result<Mapping, CoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let value: Value = serde_yaml::from_str(&contents).map_err(|source| CoreError::YamlParse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(CoreError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

/// Point the Pro client at `contract_url` (or the public default when `None`)
/// and set or remove `security_url`.
///
/// Write flow: parse → patch → `.tmp` sibling → copy mode and owner → `rename`.
pub fn update_at(
    path: &Path,
    contract_url: Option<&str>,
    security_url: Option<&str>,
) -> Result<(), CoreError> {
    let mut config = load_at(path)?;

    let contract_url = contract_url.unwrap_or(DEFAULT_CONTRACT_URL);
    config.insert(
        Value::from(CONTRACT_URL_KEY),
        Value::from(contract_url.to_owned()),
    );
    match security_url {
        Some(url) => {
            config.insert(Value::from(SECURITY_URL_KEY), Value::from(url.to_owned()));
        }
        None => {
            config.remove(SECURITY_URL_KEY);
        }
    }

    let yaml = serde_yaml::to_string(&config)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    let result = carry_over_metadata(path, &tmp)
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| io_err(path, e)));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// Give `replacement` the mode and owner of the file it is about to replace.
fn carry_over_metadata(original: &Path, replacement: &Path) -> Result<(), CoreError> {
    let metadata = std::fs::metadata(original).map_err(|e| io_err(original, e))?;
    std::fs::set_permissions(replacement, metadata.permissions())
        .map_err(|e| io_err(replacement, e))?;
    set_owner(replacement, &metadata)
}

#[cfg(unix)]
fn set_owner(path: &Path, metadata: &std::fs::Metadata) -> Result<(), CoreError> {
    use std::os::unix::fs::MetadataExt;
    std::os::unix::fs::chown(path, Some(metadata.uid()), Some(metadata.gid()))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_owner(_path: &Path, _metadata: &std::fs::Metadata) -> Result<(), CoreError> {
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.tmp", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_is_empty_mapping() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("uaclient.conf");
        std::fs::write(&path, "").unwrap();
        assert!(load_at(&path).unwrap().is_empty());
    }

    #[test]
    fn list_at_top_level_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("uaclient.conf");
        std::fs::write(&path, "- a\n- b\n").unwrap();
        let err = load_at(&path).unwrap_err();
        assert!(matches!(err, CoreError::NotAMapping { .. }), "got: {err}");
    }

    #[test]
    fn missing_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.conf");
        let err = update_at(&path, None, None).unwrap_err();
        assert!(err.to_string().contains("absent.conf"));
    }
}
