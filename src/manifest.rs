// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! The `icon-data.json` manifest published alongside the icon set.
//!
//! Entries are sorted by name. Each carries the frame it was exported from as
//! its category and a sorted tag list taken from the icon description, or
//! from the hyphen-separated parts of its name when no description exists.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{self, Error},
    sanitize::Sanitizer,
};

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE_NAME: &str = "icon-data.json";

/// Icon as known to the exporter, before it is turned into a manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Default,)]
pub struct IconRecord
{
    /// Icon name, e.g. `caret-down`.
    pub name:        String,
    /// Frame or directory the icon belongs to.
    pub frame:       Option<String,>,
    /// Comma-separated tags.
    pub description: Option<String,>,
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct ManifestEntry
{
    /// Icon name.
    pub name:     String,
    /// Category, `null` when the icon has no frame.
    pub category: Option<String,>,
    /// Sorted search tags.
    pub tags:     Vec<String,>,
}

/// Complete manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize,)]
pub struct IconManifest
{
    /// Entries sorted by name.
    pub icons: Vec<ManifestEntry,>,
}

impl ManifestEntry
{
    /// Builds the entry for `record`.
    pub fn from_record(record: &IconRecord,) -> Self
    {
        let mut tags: Vec<String,> = match record.description.as_deref().filter(|d| !d.is_empty(),) {
            Some(description,) => description.split(',',).map(|tag| tag.trim().to_owned(),).collect(),
            None => record.name.split('-',).map(str::to_owned,).collect(),
        };
        tags.sort();

        Self {
            name: record.name.clone(),
            category: record.frame.clone().filter(|frame| !frame.is_empty(),),
            tags,
        }
    }
}

/// Builds a manifest from `records`, sorted by icon name.
///
/// # Example
///
/// ```
/// use pine_icons::{IconRecord, build_manifest};
///
/// let manifest = build_manifest(&[IconRecord {
///     name: "caret-down".into(),
///     ..IconRecord::default()
/// }],);
/// assert_eq!(manifest.icons[0].tags, vec!["caret", "down"]);
/// assert_eq!(manifest.icons[0].category, None);
/// ```
pub fn build_manifest(records: &[IconRecord],) -> IconManifest
{
    let mut icons: Vec<ManifestEntry,> = records.iter().map(ManifestEntry::from_record,).collect();
    icons.sort_by(|a, b| a.name.cmp(&b.name,),);
    IconManifest {
        icons,
    }
}

impl IconManifest
{
    /// Serializes the manifest as pretty JSON terminated by a newline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] when serialization fails.
    pub fn to_json(&self,) -> Result<String, Error,>
    {
        let mut json = serde_json::to_string_pretty(self,)?;
        json.push('\n',);
        Ok(json,)
    }
}

/// Writes `manifest` to `<dir>/icon-data.json` and returns the file path.
///
/// # Errors
///
/// Returns [`Error::Io`] when the directory or file cannot be written.
pub fn write_manifest(manifest: &IconManifest, dir: &Path,) -> Result<PathBuf, Error,>
{
    fs::create_dir_all(dir,).map_err(|source| error::io_error(dir, source,),)?;
    let path = dir.join(MANIFEST_FILE_NAME,);
    fs::write(&path, manifest.to_json()?,).map_err(|source| error::io_error(&path, source,),)?;
    info!(path = %path.display(), icons = manifest.icons.len(), "wrote icon manifest");
    Ok(path,)
}

/// Reads a manifest previously written by [`write_manifest`].
///
/// # Errors
///
/// Returns [`Error::Io`] or [`Error::Parse`] when the file cannot be read or
/// decoded.
pub fn load_manifest(path: &Path,) -> Result<IconManifest, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    serde_json::from_str(&contents,).map_err(|source| error::parse_error(path, source,),)
}

/// Outcome of scanning a directory of SVG files.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct SvgScan
{
    /// Records for files that passed sanitization, sorted by name.
    pub records:  Vec<IconRecord,>,
    /// Files whose content was rejected by the sanitizer.
    pub rejected: Vec<PathBuf,>,
}

/// Collects icon records from `dir`.
///
/// `*.svg` files directly inside `dir` have no category; files one level
/// down take the subdirectory name as their category. Every file is checked
/// with `sanitizer` in parallel and rejected files are reported separately.
///
/// # Errors
///
/// Returns [`Error::SvgIo`] when a directory or file cannot be read.
pub fn scan_svg_directory(dir: &Path, sanitizer: &dyn Sanitizer,) -> Result<SvgScan, Error,>
{
    let mut files = Vec::new();
    collect_svg_files(dir, None, &mut files,)?;
    for entry in read_dir(dir,)? {
        if entry.is_dir() {
            let category = entry.file_name().and_then(|name| name.to_str(),).map(str::to_owned,);
            collect_svg_files(&entry, category, &mut files,)?;
        }
    }
    debug!(files = files.len(), dir = %dir.display(), "scanning svg files");

    let checked = files
        .par_iter()
        .map(|(path, category,)| {
            let contents = fs::read_to_string(path,).map_err(|source| error::svg_io_error(path, source,),)?;
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str(),)
                .map(str::to_lowercase,)
                .unwrap_or_default();
            let accepted = sanitizer.sanitize(&contents,).is_some();
            Ok((path.clone(), accepted, IconRecord {
                name,
                frame: category.clone(),
                description: None,
            },),)
        },)
        .collect::<Result<Vec<_,>, Error,>>()?;

    let mut scan = SvgScan::default();
    for (path, accepted, record,) in checked {
        if accepted {
            scan.records.push(record,);
        } else {
            warn!(path = %path.display(), "svg rejected by sanitizer");
            scan.rejected.push(path,);
        }
    }
    scan.records.sort_by(|a, b| a.name.cmp(&b.name,),);
    scan.rejected.sort();
    Ok(scan,)
}

fn read_dir(dir: &Path,) -> Result<Vec<PathBuf,>, Error,>
{
    let entries = fs::read_dir(dir,).map_err(|source| error::svg_io_error(dir, source,),)?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| error::svg_io_error(dir, source,),)?;
        paths.push(entry.path(),);
    }
    paths.sort();
    Ok(paths,)
}

fn collect_svg_files(
    dir: &Path,
    category: Option<String,>,
    files: &mut Vec<(PathBuf, Option<String,>,),>,
) -> Result<(), Error,>
{
    for path in read_dir(dir,)? {
        let is_svg = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("svg",),);
        if path.is_file() && is_svg {
            files.push((path, category.clone(),),);
        }
    }
    Ok((),)
}

#[cfg(test)]
mod tests
{
    use tempfile::tempdir;

    use super::*;
    use crate::sanitize::SvgSanitizer;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0h1v1z"/></svg>"#;

    #[test]
    fn entries_are_sorted_with_derived_tags()
    {
        let manifest = build_manifest(&[
            IconRecord {
                name:        "trash".into(),
                frame:       Some("Actions".into(),),
                description: Some("delete, remove ,bin".into(),),
            },
            IconRecord {
                name:        "arrow-left".into(),
                frame:       None,
                description: None,
            },
        ],);

        assert_eq!(manifest.icons[0].name, "arrow-left");
        assert_eq!(manifest.icons[0].tags, vec!["arrow", "left"]);
        assert_eq!(manifest.icons[0].category, None);
        assert_eq!(manifest.icons[1].tags, vec!["bin", "delete", "remove"]);
        assert_eq!(manifest.icons[1].category.as_deref(), Some("Actions"));
    }

    #[test]
    fn empty_description_falls_back_to_name()
    {
        let entry = ManifestEntry::from_record(&IconRecord {
            name:        "user-star".into(),
            frame:       Some(String::new(),),
            description: Some(String::new(),),
        },);
        assert_eq!(entry.tags, vec!["star", "user"]);
        assert_eq!(entry.category, None);
    }

    #[test]
    fn manifest_json_is_pretty_with_null_category()
    {
        let manifest = build_manifest(&[IconRecord {
            name: "add".into(),
            ..IconRecord::default()
        }],);
        let json = manifest.to_json().expect("serializes");
        assert_eq!(
            json,
            "{\n  \"icons\": [\n    {\n      \"name\": \"add\",\n      \"category\": null,\n      \"tags\": [\n        \"add\"\n      ]\n    }\n  ]\n}\n"
        );
    }

    #[test]
    fn write_then_load()
    {
        let dir = tempdir().expect("tempdir");
        let manifest = build_manifest(&[IconRecord {
            name: "archive".into(),
            frame: Some("Files".into(),),
            ..IconRecord::default()
        }],);
        let path = write_manifest(&manifest, &dir.path().join("out",),).expect("write");
        assert!(path.ends_with(MANIFEST_FILE_NAME));
        assert_eq!(load_manifest(&path,).expect("load"), manifest);
    }

    #[test]
    fn scan_uses_subdirectories_as_categories()
    {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("Arrows",),).expect("mkdir");
        fs::write(dir.path().join("Archive.svg",), SVG,).expect("write");
        fs::write(dir.path().join("Arrows/arrow-left.svg",), SVG,).expect("write");
        fs::write(dir.path().join("notes.txt",), "ignored",).expect("write");
        fs::write(dir.path().join("evil.svg",), "<svg><script>alert(1)</script></svg>",).expect("write");

        let scan = scan_svg_directory(dir.path(), &SvgSanitizer,).expect("scan");

        let names: Vec<&str,> = scan.records.iter().map(|r| r.name.as_str(),).collect();
        assert_eq!(names, vec!["archive", "arrow-left"]);
        assert_eq!(scan.records[0].frame, None);
        assert_eq!(scan.records[1].frame.as_deref(), Some("Arrows"));
        assert_eq!(scan.rejected, vec![dir.path().join("evil.svg")]);
    }

    #[test]
    fn scanning_missing_directory_fails()
    {
        let dir = tempdir().expect("tempdir");
        let error = scan_svg_directory(&dir.path().join("missing",), &SvgSanitizer,).expect_err("missing dir");
        assert!(matches!(error, Error::SvgIo { .. }));
    }
}
