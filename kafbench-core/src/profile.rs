//! Connection profiles: named broker sets and metrics endpoints selectable
//! independently of any scenario file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name probed for profile definitions.
pub const PROFILE_FILE_NAME: &str = "profiles.json";

/// One named connection target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSpec {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Bootstrap broker addresses
    pub brokers: Vec<String>,
    /// Metrics endpoint for this environment
    pub metrics_url: String,
}

/// On-disk profile collection with the id selected when a scenario names
/// none.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFile {
    /// Profile selected when a scenario names none
    pub default_profile: String,
    /// Profiles by id, iterated in sorted order
    pub profiles: BTreeMap<String, ProfileSpec>,
}

/// Loads the profile file from `primary`, falling back to `fallback` when
/// the primary does not exist. Returns the parsed file and the path it was
/// actually read from.
pub fn load_with_fallback(primary: &Path, fallback: Option<&Path>) -> Result<(ProfileFile, PathBuf)> {
    let path = if primary.is_file() {
        Some(primary)
    } else {
        fallback.filter(|candidate| candidate.is_file())
    };
    let Some(path) = path else {
        return Err(Error::Config {
            message: format!("{} not found at {}", PROFILE_FILE_NAME, primary.display()),
        });
    };
    let file = load_from_path(path)?;
    Ok((file, path.to_path_buf()))
}

fn load_from_path(path: &Path) -> Result<ProfileFile> {
    let raw = std::fs::read(path)?;
    let file: ProfileFile = serde_json::from_slice(&raw)?;
    if file.default_profile.is_empty() {
        return Err(Error::Config {
            message: "default_profile is required".to_string(),
        });
    }
    Ok(file)
}

/// Resolves a profile id (empty selects the file's default) and validates
/// that it can actually be connected to.
pub fn resolve(file: &ProfileFile, profile_id: &str) -> Result<ProfileSpec> {
    let id = if profile_id.is_empty() {
        file.default_profile.as_str()
    } else {
        profile_id
    };
    let Some(profile) = file.profiles.get(id) else {
        return Err(Error::Config {
            message: format!("unknown profile: {id}"),
        });
    };
    if profile.brokers.is_empty() {
        return Err(Error::Config {
            message: format!("profile {id} missing brokers"),
        });
    }
    Ok(profile.clone())
}
