// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Base URL under which named icons are published.
//!
//! The base is chosen from, in order: an explicit page-level value (the
//! `data-pine-asset-path` meta attribute in a browser host), a process-level
//! value (the `PINE_ASSET_PATH` environment variable), and finally the public
//! CDN. Serving icons from the CDN works but is logged once per process, since
//! applications are expected to bundle their assets.

use std::sync::Once;

use tracing::warn;

/// Public CDN hosting the latest published icon set.
pub const CDN_ASSET_PATH: &str = "https://cdn.jsdelivr.net/npm/@pine-ds/icons/";
/// Base used when rendering inside test harnesses.
pub const TESTING_ASSET_PATH: &str = "/dist/pds-icons";
/// Environment variable holding the process-level asset path.
pub const ASSET_PATH_ENV: &str = "PINE_ASSET_PATH";

const CDN_HOST_PREFIX: &str = "https://cdn.jsdelivr.net/npm/";

static CDN_WARNING: Once = Once::new();

/// Where an [`AssetBase`] value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum AssetSource
{
    /// Page-level configuration (meta tag).
    Meta,
    /// Process-level configuration (global variable / environment).
    Global,
    /// Built-in CDN default.
    Cdn,
    /// Fixed base used by test harnesses.
    Testing,
}

/// Resolved asset base path.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct AssetBase
{
    base:   String,
    source: AssetSource,
}

impl AssetBase
{
    /// Picks the first non-empty source: `meta`, then `global`, then the CDN.
    ///
    /// # Example
    ///
    /// ```
    /// use pine_icons::{AssetBase, AssetSource};
    ///
    /// let base = AssetBase::resolve(None, Some("/assets/icons",),);
    /// assert_eq!(base.source(), AssetSource::Global);
    /// assert_eq!(base.join("svg/archive.svg",), "/assets/icons/svg/archive.svg");
    /// ```
    pub fn resolve(meta: Option<&str,>, global: Option<&str,>,) -> Self
    {
        fn non_empty(value: Option<&str,>,) -> Option<&str,>
        {
            value.map(str::trim,).filter(|v| !v.is_empty(),)
        }

        if let Some(meta,) = non_empty(meta,) {
            return Self::new(meta, AssetSource::Meta,);
        }
        if let Some(global,) = non_empty(global,) {
            return Self::new(global, AssetSource::Global,);
        }
        Self::cdn()
    }

    /// Resolves using `meta` and the [`ASSET_PATH_ENV`] environment variable.
    pub fn from_env(meta: Option<&str,>,) -> Self
    {
        let global = std::env::var(ASSET_PATH_ENV,).ok();
        Self::resolve(meta, global.as_deref(),)
    }

    /// The CDN default.
    pub fn cdn() -> Self
    {
        Self::new(CDN_ASSET_PATH, AssetSource::Cdn,)
    }

    /// The base used by test harnesses.
    pub fn testing() -> Self
    {
        Self::new(TESTING_ASSET_PATH, AssetSource::Testing,)
    }

    fn new(base: &str, source: AssetSource,) -> Self
    {
        Self {
            base: base.to_owned(), source,
        }
    }

    /// Raw base path.
    pub fn as_str(&self,) -> &str
    {
        &self.base
    }

    /// Source the base was taken from.
    pub fn source(&self,) -> AssetSource
    {
        self.source
    }

    /// Joins `path` onto the base, stripping a leading `./` and inserting a
    /// separator when the base does not end with one.
    pub fn join(&self, path: &str,) -> String
    {
        if self.base.starts_with(CDN_HOST_PREFIX,) {
            CDN_WARNING.call_once(|| {
                warn!(
                    "Fetching Pine assets from jsDelivr CDN. It's recommended that you bundle \
                     Pine assets with your application and set the asset path accordingly."
                );
            },);
        }

        let path = path.strip_prefix("./",).unwrap_or(path,);
        let mut joined = String::with_capacity(self.base.len() + path.len() + 1,);
        joined.push_str(&self.base,);
        if !self.base.ends_with('/',) {
            joined.push('/',);
        }
        joined.push_str(path,);
        joined
    }
}

impl Default for AssetBase
{
    fn default() -> Self
    {
        Self::cdn()
    }
}
