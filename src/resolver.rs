// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Resolution of `name` / `icon` / `src` properties into a fetchable URL.
//!
//! Precedence is fixed: an explicit `src` that looks like a path wins, then a
//! validated icon name (from `name`, or from `icon` when it is not itself a
//! path), and finally `icon` treated as a path. Names are lowercased and must
//! consist of ASCII letters, digits and hyphens only.

use crate::{asset_path::AssetBase, registry::IconRegistry};

/// Icon properties as set on a `pds-icon` element.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct IconRequest
{
    /// Name of a built-in icon.
    pub name: Option<String,>,
    /// Either a name or a path; interpreted by [`IconResolver::resolve`].
    pub icon: Option<String,>,
    /// Exact location of an SVG file.
    pub src:  Option<String,>,
}

impl IconRequest
{
    /// Request for the built-in icon `name`.
    pub fn named<N: Into<String,>,>(name: N,) -> Self
    {
        Self {
            name: Some(name.into(),), ..Self::default()
        }
    }

    /// Request for the SVG at `src`.
    pub fn from_src<S: Into<String,>,>(src: S,) -> Self
    {
        Self {
            src: Some(src.into(),), ..Self::default()
        }
    }

    /// Request using the combined `icon` property.
    pub fn from_icon<S: Into<String,>,>(icon: S,) -> Self
    {
        Self {
            icon: Some(icon.into(),), ..Self::default()
        }
    }

    /// Validated icon name carried by this request, if any.
    pub fn icon_name(&self,) -> Option<String,>
    {
        icon_name(self.name.as_deref(), self.icon.as_deref(),)
    }
}

/// Returns `true` when `value` looks like a path or URL.
pub fn is_src(value: &str,) -> bool
{
    !value.is_empty() && value.contains(['/', '.',],)
}

/// Trims `src` and returns it when it looks like a path or URL.
pub fn src_url(src: Option<&str,>,) -> Option<String,>
{
    let trimmed = src?.trim();
    is_src(trimmed,).then(|| trimmed.to_owned(),)
}

/// Derives the validated, lowercased icon name from `name` or `icon`.
///
/// # Example
///
/// ```
/// use pine_icons::icon_name;
///
/// assert_eq!(icon_name(Some("Bar",), None,).as_deref(), Some("bar"));
/// assert_eq!(icon_name(None, Some("caret-down",),).as_deref(), Some("caret-down"));
/// assert_eq!(icon_name(Some("bar!",), None,), None);
/// assert_eq!(icon_name(None, Some("./caret.svg",),), None);
/// ```
pub fn icon_name(name: Option<&str,>, icon: Option<&str,>,) -> Option<String,>
{
    let candidate = match name.filter(|value| !value.is_empty(),) {
        Some(name,) => name,
        None => icon.filter(|value| !is_src(value,),)?,
    };

    let lowered = candidate.to_lowercase();
    if lowered.trim().is_empty() {
        return None;
    }

    let valid = lowered.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-',);
    valid.then_some(lowered,)
}

/// Maps icon requests to URLs using an asset base and the override registry.
#[derive(Debug, Clone, Default,)]
pub struct IconResolver
{
    asset_base: AssetBase,
    registry:   IconRegistry,
}

impl IconResolver
{
    /// Creates a resolver over `asset_base` consulting `registry` first.
    pub fn new(asset_base: AssetBase, registry: IconRegistry,) -> Self
    {
        Self {
            asset_base, registry,
        }
    }

    /// Asset base used for named icons.
    pub fn asset_base(&self,) -> &AssetBase
    {
        &self.asset_base
    }

    /// Registry consulted for named overrides.
    pub fn registry(&self,) -> &IconRegistry
    {
        &self.registry
    }

    /// URL of the named icon: the registered override, or
    /// `<asset base>/svg/<name>.svg`.
    pub fn named_url(&self, name: &str,) -> String
    {
        self.registry
            .get(name,)
            .unwrap_or_else(|| self.asset_base.join(&format!("svg/{name}.svg"),),)
    }

    /// Resolves `request` to the URL to load, or `None` when nothing is
    /// renderable.
    ///
    /// # Example
    ///
    /// ```
    /// use pine_icons::{AssetBase, IconRegistry, IconRequest, IconResolver};
    ///
    /// let resolver = IconResolver::new(AssetBase::testing(), IconRegistry::new(),);
    /// let request = IconRequest {
    ///     name: Some("bar".into(),),
    ///     src:  Some("foo.svg".into(),),
    ///     icon: None,
    /// };
    /// assert_eq!(resolver.resolve(&request,).as_deref(), Some("foo.svg"));
    /// assert_eq!(
    ///     resolver.resolve(&IconRequest::named("Bar",),).as_deref(),
    ///     Some("/dist/pds-icons/svg/bar.svg")
    /// );
    /// assert_eq!(resolver.resolve(&IconRequest::named("bar!",),), None);
    /// ```
    pub fn resolve(&self, request: &IconRequest,) -> Option<String,>
    {
        if let Some(url,) = src_url(request.src.as_deref(),) {
            return Some(url,);
        }

        if let Some(name,) = request.icon_name() {
            return Some(self.named_url(&name,),);
        }

        src_url(request.icon.as_deref(),)
    }
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;

    fn resolver() -> IconResolver
    {
        IconResolver::new(AssetBase::testing(), IconRegistry::new(),)
    }

    proptest! {
        #[test]
        fn valid_names_resolve_under_asset_base(name in "[a-zA-Z0-9][a-zA-Z0-9-]{0,31}") {
            let url = resolver().resolve(&IconRequest::named(name.clone())).expect("valid name resolves");
            prop_assert_eq!(url, format!("/dist/pds-icons/svg/{}.svg", name.to_lowercase()));
        }

        #[test]
        fn names_with_invalid_characters_never_resolve(
            prefix in "[a-z]{1,8}",
            bad in "[!@#$%^&*()_+=~ ]",
        ) {
            let request = IconRequest::named(format!("{prefix}{bad}"));
            prop_assert!(resolver().resolve(&request).is_none());
        }
    }

    #[test]
    fn src_takes_precedence_over_name()
    {
        let request = IconRequest {
            name: Some("bar".into(),), src: Some("  foo.svg ".into(),), icon: None,
        };
        assert_eq!(resolver().resolve(&request,).as_deref(), Some("foo.svg"));
    }

    #[test]
    fn src_without_path_markers_is_ignored()
    {
        let request = IconRequest {
            name: Some("bar".into(),), src: Some("foo".into(),), icon: None,
        };
        assert_eq!(resolver().resolve(&request,).as_deref(), Some("/dist/pds-icons/svg/bar.svg"));
    }

    #[test]
    fn icon_is_a_name_unless_it_looks_like_a_path()
    {
        assert_eq!(
            resolver().resolve(&IconRequest::from_icon("Trash",),).as_deref(),
            Some("/dist/pds-icons/svg/trash.svg")
        );
        assert_eq!(
            resolver().resolve(&IconRequest::from_icon(" /custom/trash.svg ",),).as_deref(),
            Some("/custom/trash.svg")
        );
    }

    #[test]
    fn name_wins_over_icon()
    {
        let request = IconRequest {
            name: Some("archive".into(),), icon: Some("trash".into(),), src: None,
        };
        assert_eq!(request.icon_name().as_deref(), Some("archive"));
    }

    #[test]
    fn empty_request_resolves_to_nothing()
    {
        assert_eq!(resolver().resolve(&IconRequest::default(),), None);
        assert_eq!(resolver().resolve(&IconRequest::named("",),), None);
        assert_eq!(resolver().resolve(&IconRequest::named("   ",),), None);
    }

    #[test]
    fn registry_override_is_consulted_first()
    {
        let registry = IconRegistry::new();
        registry.add_icons([("brand", "https://example.test/brand.svg",)],);
        let resolver = IconResolver::new(AssetBase::testing(), registry,);

        assert_eq!(
            resolver.resolve(&IconRequest::named("Brand",),).as_deref(),
            Some("https://example.test/brand.svg")
        );
        assert_eq!(
            resolver.resolve(&IconRequest::named("archive",),).as_deref(),
            Some("/dist/pds-icons/svg/archive.svg")
        );
    }

    #[test]
    fn is_src_detects_paths()
    {
        assert!(is_src("a/b",));
        assert!(is_src("a.svg",));
        assert!(!is_src("archive",));
        assert!(!is_src("",));
    }
}
