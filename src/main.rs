// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Command-line interface for the `pine-icons` binary.
//!
//! The CLI resolves icon properties to URLs, fetches and renders icons through
//! the shared loader, warms the cache for a set of names, and maintains the
//! icon export configuration and manifest.

use std::{
    io::{self, Write},
    path::PathBuf,
    process,
    sync::Arc,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use pine_icons::{
    AssetBase, EnvOverrides, Error, HttpFetcher, IconCache, IconRegistry, IconRequest,
    IconResolver, IconSize, LoadOptions, PdsIcon, Rect, RenderContext, SvgSanitizer,
    build_manifest, load_and_resolve, scan_svg_directory, write_manifest,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Command line interface for resolving, loading and rendering icons.
#[derive(Debug, Parser,)]
#[command(name = "pine-icons", version, about = "Resolve, load and render pds-icon assets")]
struct Cli
{
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// Print the URL an icon resolves to.
    Resolve(ResolveArgs,),
    /// Fetch an icon and print its markup.
    Fetch(FetchArgs,),
    /// Render the `pds-icon` host element.
    Render(RenderArgs,),
    /// Load a set of named icons concurrently.
    Prefetch(PrefetchArgs,),
    /// Build `icon-data.json` from a directory of SVG files.
    Manifest(ManifestArgs,),
    /// Validate the icon export configuration.
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs,),
}

/// Icon properties shared by commands that resolve a single icon.
#[derive(Debug, Args, Default,)]
struct IconArgs
{
    /// Name of a built-in icon.
    #[arg(long = "name", value_name = "NAME")]
    name: Option<String,>,

    /// Icon name or path.
    #[arg(long = "icon", value_name = "NAME|PATH")]
    icon: Option<String,>,

    /// Exact location of an SVG file.
    #[arg(long = "src", value_name = "URL")]
    src: Option<String,>,
}

impl IconArgs
{
    fn request(&self,) -> IconRequest
    {
        IconRequest {
            name: self.name.clone(), icon: self.icon.clone(), src: self.src.clone(),
        }
    }
}

/// Options controlling where named icons are looked up.
#[derive(Debug, Args, Default,)]
struct AssetArgs
{
    /// Base path or URL under which `svg/<name>.svg` is published.
    #[arg(long = "asset-path", env = "PINE_ASSET_PATH", value_name = "PATH")]
    asset_path: Option<String,>,

    /// Override the URL of a named icon; may be repeated.
    #[arg(long = "override", value_name = "NAME=URL", value_parser = parse_override)]
    overrides: Vec<(String, String,),>,
}

impl AssetArgs
{
    fn resolver(&self,) -> IconResolver
    {
        let registry = IconRegistry::new();
        registry.add_icons(self.overrides.iter().cloned(),);
        IconResolver::new(AssetBase::resolve(None, self.asset_path.as_deref(),), registry,)
    }
}

/// Options for the HTTP loader.
#[derive(Debug, Args, Default,)]
struct LoaderArgs
{
    /// Base URL used to fetch relative icon paths.
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String,>,

    /// Keep fetched markup as-is instead of sanitizing it.
    #[arg(long = "no-sanitize", action = ArgAction::SetTrue)]
    no_sanitize: bool,
}

impl LoaderArgs
{
    fn cache(&self,) -> Result<IconCache, Error,>
    {
        let mut fetcher = HttpFetcher::new()?;
        if let Some(base,) = self.base_url.as_deref() {
            fetcher = fetcher.with_base_url(base,)?;
        }
        Ok(IconCache::new(Arc::new(fetcher,),),)
    }

    fn options(&self,) -> LoadOptions
    {
        LoadOptions {
            sanitize: !self.no_sanitize,
        }
    }
}

#[derive(Debug, Args,)]
struct ResolveArgs
{
    #[command(flatten)]
    icon: IconArgs,

    #[command(flatten)]
    assets: AssetArgs,
}

#[derive(Debug, Args,)]
struct FetchArgs
{
    #[command(flatten)]
    icon: IconArgs,

    #[command(flatten)]
    assets: AssetArgs,

    #[command(flatten)]
    loader: LoaderArgs,
}

#[derive(Debug, Args,)]
struct RenderArgs
{
    #[command(flatten)]
    icon: IconArgs,

    #[command(flatten)]
    assets: AssetArgs,

    #[command(flatten)]
    loader: LoaderArgs,

    /// Icon size: small, regular, medium, large, auto or a CSS length.
    #[arg(long = "size", value_name = "SIZE", default_value = "regular")]
    size: IconSize,

    /// Fill color; adds the matching color classes.
    #[arg(long = "color", value_name = "COLOR")]
    color: Option<String,>,

    /// Force (`true`) or suppress (`false`) mirroring in RTL.
    #[arg(long = "flip-rtl", value_name = "BOOL")]
    flip_rtl: Option<bool,>,

    /// Text direction of the document.
    #[arg(long = "dir", value_name = "DIR")]
    dir: Option<String,>,

    /// Render as a static page: nothing is fetched.
    #[arg(long = "server", action = ArgAction::SetTrue)]
    server: bool,
}

#[derive(Debug, Args,)]
struct PrefetchArgs
{
    /// Icon names to load.
    #[arg(value_name = "NAME", required = true)]
    names: Vec<String,>,

    #[command(flatten)]
    assets: AssetArgs,

    #[command(flatten)]
    loader: LoaderArgs,
}

#[derive(Debug, Args,)]
struct ManifestArgs
{
    /// Directory containing the SVG files.
    #[arg(long = "svg-dir", value_name = "DIR")]
    svg_dir: PathBuf,

    /// Directory that receives `icon-data.json`.
    #[arg(long = "output", value_name = "DIR", default_value = "src")]
    output: PathBuf,
}

#[derive(Debug, Args,)]
struct CheckConfigArgs
{
    /// Project root holding `figma-icon-config.json`.
    #[arg(long = "root", value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Design source access token.
    #[arg(long = "access-token", env = "FIGMA_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String,>,

    /// Design file identifier.
    #[arg(long = "file-id", env = "FIGMA_FILE_ID")]
    file_id: Option<String,>,

    /// Icons per export request.
    #[arg(long = "batch-size", env = "BATCH_SIZE")]
    batch_size: Option<String,>,
}

fn parse_override(value: &str,) -> Result<(String, String,), String,>
{
    let (name, url,) = value.split_once('=',).ok_or_else(|| format!("expected NAME=URL, got '{value}'"),)?;
    let (name, url,) = (name.trim(), url.trim(),);
    if name.is_empty() || url.is_empty() {
        return Err(format!("expected NAME=URL, got '{value}'"),);
    }
    Ok((name.to_lowercase(), url.to_owned(),),)
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    init_tracing();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),),)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr,),)
        .init();
}

/// Executes the parsed command.
///
/// # Errors
///
/// Propagates resolution, loading, configuration and serialization errors.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match cli.command {
        Command::Resolve(args,) => run_resolve(&args, &mut handle,),
        Command::Fetch(args,) => run_fetch(&args, &mut handle,).await,
        Command::Render(args,) => run_render(&args, &mut handle,).await,
        Command::Prefetch(args,) => run_prefetch(&args,).await,
        Command::Manifest(args,) => run_manifest(&args,),
        Command::CheckConfig(args,) => run_check_config(&args, &mut handle,),
    }
}

fn write_line<W: Write,>(writer: &mut W, line: &str,) -> Result<(), Error,>
{
    writeln!(writer, "{line}").map_err(|e| Error::service(format!("failed to write output: {e}"),),)
}

fn resolve_url(icon: &IconArgs, resolver: &IconResolver,) -> Result<String, Error,>
{
    resolver
        .resolve(&icon.request(),)
        .ok_or_else(|| Error::validation("no valid --name, --icon or --src to resolve",),)
}

fn run_resolve<W: Write,>(args: &ResolveArgs, writer: &mut W,) -> Result<(), Error,>
{
    let url = resolve_url(&args.icon, &args.assets.resolver(),)?;
    write_line(writer, &url,)
}

async fn run_fetch<W: Write,>(args: &FetchArgs, writer: &mut W,) -> Result<(), Error,>
{
    let url = resolve_url(&args.icon, &args.assets.resolver(),)?;
    let cache = args.loader.cache()?;

    let content = cache.load_with(&url, args.loader.options(),).await;
    if content.is_empty() {
        return Err(Error::service(format!("icon at '{url}' could not be loaded"),),);
    }
    write_line(writer, &content,)
}

async fn run_render<W: Write,>(args: &RenderArgs, writer: &mut W,) -> Result<(), Error,>
{
    let resolver = args.assets.resolver();
    let cache = args.loader.cache()?;
    let context = if args.server { RenderContext::Server } else { RenderContext::Browser };

    let mut element = PdsIcon::new(context,)
        .with_size(args.size.clone(),)
        .with_direction(None, args.dir.as_deref(),);
    if let Some(name,) = &args.icon.name {
        element = element.with_name(name.clone(),);
    }
    if let Some(icon,) = &args.icon.icon {
        element = element.with_icon(icon.clone(),);
    }
    if let Some(src,) = &args.icon.src {
        element = element.with_src(src.clone(),);
    }
    if let Some(color,) = &args.color {
        element = element.with_color(color.clone(),);
    }
    if let Some(flip,) = args.flip_rtl {
        element = element.with_flip_rtl(flip,);
    }

    element.connected(Rect::default(), None,);
    element.load_icon(&resolver, &cache,).await;
    write_line(writer, &element.render(),)
}

async fn run_prefetch(args: &PrefetchArgs,) -> Result<(), Error,>
{
    let resolver = args.assets.resolver();
    let cache = args.loader.cache()?;
    let options = args.loader.options();

    let progress = ProgressBar::new(args.names.len() as u64,);
    progress.set_style(
        ProgressStyle::with_template("{bar:30.yellow} {pos}/{len} [{elapsed_precise}] {msg}",)
            .unwrap_or_else(|_| ProgressStyle::default_bar(),),
    );

    let mut failed = Vec::new();
    let mut pending = FuturesUnordered::new();
    for name in &args.names {
        let Some(url,) = resolver.resolve(&IconRequest::named(name.clone(),),) else {
            warn!("Skipping invalid icon name '{}'", name);
            failed.push(name.clone(),);
            progress.inc(1,);
            continue;
        };
        let cache = cache.clone();
        pending.push(async move {
            let content = cache.load_with(&url, options,).await;
            (name, content.is_empty(),)
        },);
    }

    while let Some((name, empty,),) = pending.next().await {
        progress.set_message(name.clone(),);
        progress.inc(1,);
        if empty {
            failed.push(name.clone(),);
        }
    }
    progress.finish_and_clear();

    info!("Prefetched {} of {} icons", args.names.len() - failed.len(), args.names.len());
    if failed.is_empty() {
        Ok((),)
    } else {
        Err(Error::service(format!("failed to load icons: {}", failed.join(", ")),),)
    }
}

fn run_manifest(args: &ManifestArgs,) -> Result<(), Error,>
{
    let scan = scan_svg_directory(&args.svg_dir, &SvgSanitizer,)?;
    if !scan.rejected.is_empty() {
        warn!("{} SVG files were rejected and left out of the manifest", scan.rejected.len());
    }

    let manifest = build_manifest(&scan.records,);
    write_manifest(&manifest, &args.output,)?;
    Ok((),)
}

fn run_check_config<W: Write,>(args: &CheckConfigArgs, writer: &mut W,) -> Result<(), Error,>
{
    let overrides = EnvOverrides {
        access_token: args.access_token.clone().filter(|value| !value.trim().is_empty(),),
        file_id:      args.file_id.clone().filter(|value| !value.trim().is_empty(),),
        batch_size:   args.batch_size.clone().filter(|value| !value.trim().is_empty(),),
    };

    let resolved = load_and_resolve(&args.root, &overrides,)?;
    let json = serde_json::to_string_pretty(&resolved.redacted(),)?;
    write_line(writer, &json,)
}
