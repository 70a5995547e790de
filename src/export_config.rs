// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Configuration for exporting icons from the design source.
//!
//! The document lives in `figma-icon-config.json` at the project root.
//! Credentials and the batch size may be supplied through the environment
//! instead, which takes priority over the file.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{self, Error};

/// File name of the export configuration relative to the project root.
pub const CONFIG_FILE_NAME: &str = "figma-icon-config.json";
/// Number of icons requested per export batch by default.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Raw export configuration as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig
{
    /// API token for the design source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_access_token: Option<String,>,
    /// Identifier of the design file holding the icons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figma_file_id:      Option<String,>,
    /// Branch of the design file to export from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name:        Option<String,>,
    /// Pages whose frames hold icons.
    #[serde(default)]
    pub page_names:         Vec<String,>,
    /// Frames skipped during export.
    #[serde(default)]
    pub ignore_frames:      Vec<String,>,
    /// Icons per export request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size:         Option<usize,>,
    /// Directory receiving raw downloads, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_path:      Option<String,>,
}

/// Environment values that override the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct EnvOverrides
{
    /// `FIGMA_ACCESS_TOKEN`.
    pub access_token: Option<String,>,
    /// `FIGMA_FILE_ID`.
    pub file_id:      Option<String,>,
    /// `BATCH_SIZE`.
    pub batch_size:   Option<String,>,
}

impl EnvOverrides
{
    /// Reads overrides from the process environment, ignoring empty values.
    pub fn from_env() -> Self
    {
        let read = |key: &str| env::var(key,).ok().filter(|value| !value.trim().is_empty(),);
        Self {
            access_token: read("FIGMA_ACCESS_TOKEN",),
            file_id:      read("FIGMA_FILE_ID",),
            batch_size:   read("BATCH_SIZE",),
        }
    }
}

/// Validated export configuration with every required value present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedExportConfig
{
    /// API token for the design source.
    pub access_token:  String,
    /// Identifier of the design file.
    pub file_id:       String,
    /// Optional branch of the design file.
    pub branch_name:   Option<String,>,
    /// Pages to export.
    pub page_names:    Vec<String,>,
    /// Frames to skip.
    pub ignore_frames: Vec<String,>,
    /// Icons per export request, never zero.
    pub batch_size:    usize,
    /// Absolute download directory.
    pub download_path: PathBuf,
}

impl ResolvedExportConfig
{
    /// Copy of the configuration with the access token masked, suitable for
    /// printing.
    pub fn redacted(&self,) -> Self
    {
        let visible = self.access_token.chars().take(4,).collect::<String>();
        Self {
            access_token: format!("{visible}****"),
            ..self.clone()
        }
    }
}

/// Loads the export configuration from `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and [`Error::Parse`]
/// when it is not valid JSON for [`ExportConfig`].
pub fn load_export_config(path: &Path,) -> Result<ExportConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    let config = serde_json::from_str(&contents,).map_err(|source| error::parse_error(path, source,),)?;
    info!(path = %path.display(), "loaded export configuration");
    Ok(config,)
}

impl ExportConfig
{
    /// Applies `env` overrides and validates the result. The download path is
    /// joined onto `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the token, the file id or the
    /// download path is missing, or when a batch size is not a positive
    /// integer.
    pub fn resolve(self, root_dir: &Path, env: &EnvOverrides,) -> Result<ResolvedExportConfig, Error,>
    {
        let access_token = pick("access token", env.access_token.clone(), self.figma_access_token,)
            .ok_or_else(|| Error::validation("figma access token is not set",),)?;
        let file_id = pick("file id", env.file_id.clone(), self.figma_file_id,)
            .ok_or_else(|| Error::validation("figma file id is not set",),)?;

        let batch_size = match env.batch_size.as_deref() {
            Some(raw,) => {
                info!("using batch size from environment");
                parse_batch_size(raw,)?
            }
            None => match self.batch_size {
                Some(0,) => return Err(Error::validation("batchSize must be greater than zero",),),
                Some(size,) => size,
                None => {
                    debug!(batch_size = DEFAULT_BATCH_SIZE, "using default batch size");
                    DEFAULT_BATCH_SIZE
                }
            },
        };

        let download_path = self
            .download_path
            .filter(|path| !path.trim().is_empty(),)
            .ok_or_else(|| Error::validation("downloadPath is not set",),)?;

        Ok(ResolvedExportConfig {
            access_token,
            file_id,
            branch_name: self.branch_name.filter(|branch| !branch.is_empty(),),
            page_names: self.page_names,
            ignore_frames: self.ignore_frames,
            batch_size,
            download_path: root_dir.join(download_path,),
        },)
    }
}

/// Loads `<root_dir>/figma-icon-config.json` and resolves it against `env`.
///
/// # Errors
///
/// Propagates loading and validation errors.
pub fn load_and_resolve(root_dir: &Path, env: &EnvOverrides,) -> Result<ResolvedExportConfig, Error,>
{
    load_export_config(&root_dir.join(CONFIG_FILE_NAME,),)?.resolve(root_dir, env,)
}

fn pick(label: &str, from_env: Option<String,>, from_file: Option<String,>,) -> Option<String,>
{
    if let Some(value,) = from_env {
        info!("using {label} from environment");
        return Some(value,);
    }
    let value = from_file.filter(|value| !value.trim().is_empty(),)?;
    info!("using {label} from configuration file");
    Some(value,)
}

fn parse_batch_size(raw: &str,) -> Result<usize, Error,>
{
    match raw.trim().parse::<usize>() {
        Ok(size,) if size > 0 => Ok(size,),
        _ => Err(Error::validation(format!("BATCH_SIZE must be a positive integer, got '{raw}'"),),),
    }
}

/// Splits `items` into consecutive batches of at most `batch_size` items.
///
/// A zero `batch_size` is treated as one.
///
/// # Example
///
/// ```
/// use pine_icons::split_into_batches;
///
/// let batches = split_into_batches(&[1, 2, 3, 4, 5,], 2,);
/// assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);
/// ```
pub fn split_into_batches<T: Clone,>(items: &[T], batch_size: usize,) -> Vec<Vec<T,>,>
{
    items.chunks(batch_size.max(1,),).map(<[T]>::to_vec,).collect()
}

#[cfg(test)]
mod tests
{
    use tempfile::tempdir;

    use super::*;

    fn write_config(dir: &Path, json: &str,)
    {
        fs::write(dir.join(CONFIG_FILE_NAME,), json,).expect("write config");
    }

    const FULL: &str = r#"{
        "figmaAccessToken": "file-token",
        "figmaFileId": "file-id",
        "branchName": "icons",
        "pageNames": ["Icons", "Logos"],
        "ignoreFrames": ["Drafts"],
        "batchSize": 50,
        "downloadPath": "tmp/downloads"
    }"#;

    #[test]
    fn file_values_resolve()
    {
        let dir = tempdir().expect("tempdir");
        write_config(dir.path(), FULL,);

        let resolved = load_and_resolve(dir.path(), &EnvOverrides::default(),).expect("resolves");
        assert_eq!(resolved.access_token, "file-token");
        assert_eq!(resolved.file_id, "file-id");
        assert_eq!(resolved.branch_name.as_deref(), Some("icons"));
        assert_eq!(resolved.page_names, vec!["Icons", "Logos"]);
        assert_eq!(resolved.batch_size, 50);
        assert_eq!(resolved.download_path, dir.path().join("tmp/downloads"));
    }

    #[test]
    fn environment_overrides_file()
    {
        let dir = tempdir().expect("tempdir");
        write_config(dir.path(), FULL,);
        let env = EnvOverrides {
            access_token: Some("env-token".into(),),
            file_id:      Some("env-file".into(),),
            batch_size:   Some("25".into(),),
        };

        let resolved = load_and_resolve(dir.path(), &env,).expect("resolves");
        assert_eq!(resolved.access_token, "env-token");
        assert_eq!(resolved.file_id, "env-file");
        assert_eq!(resolved.batch_size, 25);
    }

    #[test]
    fn batch_size_defaults()
    {
        let config = ExportConfig {
            figma_access_token: Some("t".into(),),
            figma_file_id: Some("f".into(),),
            download_path: Some("dl".into(),),
            ..ExportConfig::default()
        };
        let resolved = config.resolve(Path::new("/root",), &EnvOverrides::default(),).expect("resolves");
        assert_eq!(resolved.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn missing_credentials_are_rejected()
    {
        let missing_token = ExportConfig {
            figma_file_id: Some("f".into(),),
            download_path: Some("dl".into(),),
            ..ExportConfig::default()
        };
        let error = missing_token.resolve(Path::new("/",), &EnvOverrides::default(),).expect_err("no token");
        assert!(matches!(error, Error::Validation { .. }));

        let missing_path = ExportConfig {
            figma_access_token: Some("t".into(),),
            figma_file_id: Some("f".into(),),
            ..ExportConfig::default()
        };
        let error = missing_path.resolve(Path::new("/",), &EnvOverrides::default(),).expect_err("no path");
        assert!(error.to_string().contains("downloadPath"));
    }

    #[test]
    fn invalid_batch_size_is_rejected()
    {
        let config = ExportConfig {
            figma_access_token: Some("t".into(),),
            figma_file_id: Some("f".into(),),
            download_path: Some("dl".into(),),
            ..ExportConfig::default()
        };
        let env = EnvOverrides {
            batch_size: Some("many".into(),),
            ..EnvOverrides::default()
        };
        assert!(config.clone().resolve(Path::new("/",), &env,).is_err());

        let zero = ExportConfig {
            batch_size: Some(0,),
            ..config
        };
        assert!(zero.resolve(Path::new("/",), &EnvOverrides::default(),).is_err());
    }

    #[test]
    fn unreadable_and_malformed_files_fail()
    {
        let dir = tempdir().expect("tempdir");
        let missing = load_and_resolve(dir.path(), &EnvOverrides::default(),).expect_err("missing");
        assert!(matches!(missing, Error::Io { .. }));

        write_config(dir.path(), "{ not json",);
        let malformed = load_and_resolve(dir.path(), &EnvOverrides::default(),).expect_err("malformed");
        assert!(matches!(malformed, Error::Parse { .. }));
    }

    #[test]
    fn redaction_masks_token()
    {
        let dir = tempdir().expect("tempdir");
        write_config(dir.path(), FULL,);
        let resolved = load_and_resolve(dir.path(), &EnvOverrides::default(),).expect("resolves");
        assert_eq!(resolved.redacted().access_token, "file****");
    }

    #[test]
    fn batches_preserve_order()
    {
        let items: Vec<u32,> = (0..7).collect();
        let batches = split_into_batches(&items, 3,);
        assert_eq!(batches, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
        assert!(split_into_batches::<u32,>(&[], 3,).is_empty());
        assert_eq!(split_into_batches(&items, 0,).len(), 7);
    }
}
