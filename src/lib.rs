// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Icon resolution, loading and rendering for the `pds-icon` element.
//!
//! The crate turns the `name` / `icon` / `src` properties of an icon element
//! into a URL ([`IconResolver`]), loads the SVG through a shared coalescing
//! cache with bounded retries ([`IconCache`]), defers loading until the
//! element is likely visible ([`VisibilityGate`]) and renders the host
//! element ([`PdsIcon`]). Supporting modules cover inline data URLs, SVG
//! sanitization, the icon export configuration and the `icon-data.json`
//! manifest.

mod asset_path;
mod cache;
mod component;
mod data_url;
mod error;
mod export_config;
mod fetch;
mod manifest;
mod registry;
mod resolver;
mod retry;
mod rtl;
mod sanitize;
mod visibility;

pub use asset_path::{ASSET_PATH_ENV, AssetBase, AssetSource, CDN_ASSET_PATH, TESTING_ASSET_PATH};
pub use cache::{IconCache, LoadOptions};
pub use component::{IconSize, PdsIcon, RenderContext};
pub use data_url::{decode_svg_data_url, is_encoded_data_url, is_inline_svg, is_svg_data_url};
pub use error::{Error, io_error, parse_error, svg_io_error};
pub use export_config::{
    CONFIG_FILE_NAME, DEFAULT_BATCH_SIZE, EnvOverrides, ExportConfig, ResolvedExportConfig,
    load_and_resolve, load_export_config, split_into_batches,
};
pub use fetch::{DEFAULT_FETCH_TIMEOUT, FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use manifest::{
    IconManifest, IconRecord, MANIFEST_FILE_NAME, ManifestEntry, SvgScan, build_manifest,
    load_manifest, scan_svg_directory, write_manifest,
};
pub use registry::IconRegistry;
pub use resolver::{IconRequest, IconResolver, icon_name, is_src, src_url};
pub use retry::{Classify, ErrorClass, RetryConfig, RetryDecision, retry_with_backoff};
pub use rtl::{ICONS_TO_FLIP, is_rtl, should_rtl_flip_icon};
pub use sanitize::{Sanitizer, SvgSanitizer};
pub use visibility::{
    DEFAULT_FALLBACK, DEFAULT_ROOT_MARGIN_PX, GateCommand, GateState, Rect, VisibilityGate,
    VisibilityOptions,
};
