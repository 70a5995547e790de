// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Model of the `pds-icon` element.
//!
//! [`PdsIcon`] holds the element's properties and render state. The host
//! forwards lifecycle events (connect, intersection, fallback timer,
//! disconnect, property changes), executes the returned
//! [`GateCommand`]s, and calls [`PdsIcon::load_icon`] whenever a
//! [`GateCommand::Load`] is emitted. [`PdsIcon::render`] serializes the host
//! element with its inner content region.

use std::{convert::Infallible, fmt::Write as _, str::FromStr};

use crate::{
    cache::IconCache,
    resolver::{IconRequest, IconResolver},
    rtl::{is_rtl, should_rtl_flip_icon},
    visibility::{GateCommand, Rect, VisibilityGate, VisibilityOptions},
};

/// Rendered size of the icon.
#[derive(Debug, Clone, PartialEq, Eq, Default,)]
pub enum IconSize
{
    /// 12px.
    Small,
    /// 16px.
    #[default]
    Regular,
    /// 20px.
    Medium,
    /// 24px.
    Large,
    /// Sized by the surrounding layout.
    Auto,
    /// Any other CSS length, passed through verbatim.
    Custom(String,),
}

impl IconSize
{
    /// Parses the `size` attribute value.
    pub fn parse(value: &str,) -> Self
    {
        match value {
            "small" => Self::Small,
            "regular" => Self::Regular,
            "medium" => Self::Medium,
            "large" => Self::Large,
            "auto" => Self::Auto,
            other => Self::Custom(other.to_owned(),),
        }
    }

    /// Value reflected to the `size` attribute.
    pub fn attribute(&self,) -> &str
    {
        match self {
            Self::Small => "small",
            Self::Regular => "regular",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Auto => "auto",
            Self::Custom(value,) => value,
        }
    }

    /// CSS length used for the icon dimensions.
    pub fn css_value(&self,) -> &str
    {
        match self {
            Self::Small => "12px",
            Self::Regular => "16px",
            Self::Medium => "20px",
            Self::Large => "24px",
            Self::Auto => "auto",
            Self::Custom(value,) => value,
        }
    }
}

impl FromStr for IconSize
{
    type Err = Infallible;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        Ok(Self::parse(value,),)
    }
}

/// Environment the element renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default,)]
pub enum RenderContext
{
    /// Live document: icons are fetched and injected.
    #[default]
    Browser,
    /// Server-side or static rendering: nothing is fetched and the content
    /// region stays empty.
    Server,
}

/// State and properties of one `pds-icon` element.
#[derive(Debug, Clone,)]
pub struct PdsIcon
{
    request:              IconRequest,
    color:                Option<String,>,
    size:                 IconSize,
    flip_rtl:             Option<bool,>,
    inherited_aria_label: Option<String,>,
    aria_hidden:          bool,
    dir:                  Option<String,>,
    document_dir:         Option<String,>,
    context:              RenderContext,
    gate:                 VisibilityGate,
    icon_name:            Option<String,>,
    aria_label:           Option<String,>,
    svg_content:          Option<String,>,
    did_load_icon:        bool,
}

impl Default for PdsIcon
{
    fn default() -> Self
    {
        Self::new(RenderContext::Browser,)
    }
}

impl PdsIcon
{
    /// Creates an element with default properties.
    pub fn new(context: RenderContext,) -> Self
    {
        Self {
            request: IconRequest::default(),
            color: None,
            size: IconSize::Regular,
            flip_rtl: None,
            inherited_aria_label: None,
            aria_hidden: false,
            dir: None,
            document_dir: None,
            context,
            gate: VisibilityGate::default(),
            icon_name: None,
            aria_label: None,
            svg_content: None,
            did_load_icon: false,
        }
    }

    /// Sets the `name` property before connection.
    pub fn with_name<S: Into<String,>,>(mut self, name: S,) -> Self
    {
        self.request.name = Some(name.into(),);
        self
    }

    /// Sets the `icon` property before connection.
    pub fn with_icon<S: Into<String,>,>(mut self, icon: S,) -> Self
    {
        self.request.icon = Some(icon.into(),);
        self
    }

    /// Sets the `src` property before connection.
    pub fn with_src<S: Into<String,>,>(mut self, src: S,) -> Self
    {
        self.request.src = Some(src.into(),);
        self
    }

    /// Sets the `color` property.
    pub fn with_color<S: Into<String,>,>(mut self, color: S,) -> Self
    {
        self.color = Some(color.into(),);
        self
    }

    /// Sets the `size` property.
    pub fn with_size(mut self, size: IconSize,) -> Self
    {
        self.size = size;
        self
    }

    /// Sets the `flipRtl` property.
    pub fn with_flip_rtl(mut self, flip: bool,) -> Self
    {
        self.flip_rtl = Some(flip,);
        self
    }

    /// Sets an `aria-label` attribute authored on the host; it replaces the
    /// label derived from the icon name.
    pub fn with_aria_label<S: Into<String,>,>(mut self, label: S,) -> Self
    {
        self.inherited_aria_label = Some(label.into(),);
        self
    }

    /// Marks the host `aria-hidden="true"`.
    pub fn with_aria_hidden(mut self, hidden: bool,) -> Self
    {
        self.aria_hidden = hidden;
        self
    }

    /// Sets the host and document text directions.
    pub fn with_direction(mut self, host: Option<&str,>, document: Option<&str,>,) -> Self
    {
        self.dir = host.map(str::to_owned,);
        self.document_dir = document.map(str::to_owned,);
        self
    }

    /// Overrides the visibility gate tunables.
    pub fn with_visibility(mut self, options: VisibilityOptions,) -> Self
    {
        self.gate = VisibilityGate::new(options,);
        self
    }

    /// Current icon properties.
    pub fn request(&self,) -> &IconRequest
    {
        &self.request
    }

    /// Visibility gate of this element.
    pub fn gate(&self,) -> &VisibilityGate
    {
        &self.gate
    }

    /// Validated icon name, if any.
    pub fn icon_name(&self,) -> Option<&str,>
    {
        self.icon_name.as_deref()
    }

    /// Markup currently shown in the content region.
    pub fn svg_content(&self,) -> Option<&str,>
    {
        self.svg_content.as_deref()
    }

    /// Returns `true` once an icon has been loaded.
    pub fn did_load_icon(&self,) -> bool
    {
        self.did_load_icon
    }

    /// Handles attachment to a document.
    ///
    /// `viewport` is ignored in [`RenderContext::Server`], where the element
    /// is visible immediately.
    pub fn connected(&mut self, bounds: Rect, viewport: Option<Rect,>,) -> Vec<GateCommand,>
    {
        self.refresh_name();
        let viewport = match self.context {
            RenderContext::Browser => viewport,
            RenderContext::Server => None,
        };
        self.gate.attach(bounds, viewport,)
    }

    /// Forwards an intersection observer notification.
    pub fn intersection_changed(&mut self, is_intersecting: bool,) -> Vec<GateCommand,>
    {
        self.gate.intersection_changed(is_intersecting,)
    }

    /// Forwards expiry of the fallback timer.
    pub fn fallback_elapsed(&mut self,) -> Vec<GateCommand,>
    {
        self.gate.fallback_elapsed()
    }

    /// Handles detachment from the document.
    pub fn disconnected(&mut self,) -> Vec<GateCommand,>
    {
        self.gate.detach()
    }

    /// Changes the `name` property.
    pub fn set_name(&mut self, name: Option<String,>,) -> Vec<GateCommand,>
    {
        self.request.name = name;
        self.source_changed()
    }

    /// Changes the `icon` property.
    pub fn set_icon(&mut self, icon: Option<String,>,) -> Vec<GateCommand,>
    {
        self.request.icon = icon;
        self.source_changed()
    }

    /// Changes the `src` property.
    pub fn set_src(&mut self, src: Option<String,>,) -> Vec<GateCommand,>
    {
        self.request.src = src;
        self.source_changed()
    }

    /// Changes the `color` property.
    pub fn set_color(&mut self, color: Option<String,>,)
    {
        self.color = color;
    }

    /// Changes the `size` property.
    pub fn set_size(&mut self, size: IconSize,)
    {
        self.size = size;
    }

    fn source_changed(&mut self,) -> Vec<GateCommand,>
    {
        self.svg_content = None;
        self.refresh_name();
        self.gate.request_reload()
    }

    fn refresh_name(&mut self,)
    {
        self.icon_name = self.request.icon_name();
        self.aria_label = self.icon_name.as_ref().map(|name| name.replace('-', " ",),);
    }

    /// Resolves the current properties and loads the icon through `cache`.
    ///
    /// Nothing is loaded before the gate opens, in a server context, or when
    /// the properties resolve to no URL.
    pub async fn load_icon(&mut self, resolver: &IconResolver, cache: &IconCache,)
    {
        self.refresh_name();

        if self.context != RenderContext::Browser || !self.gate.is_visible() {
            return;
        }

        let Some(url,) = resolver.resolve(&self.request,) else {
            return;
        };

        let content = cache.load(&url,).await;
        self.svg_content = Some(content,);
        self.did_load_icon = true;
        self.gate.mark_loaded();
    }

    /// Returns `true` when the artwork should be mirrored.
    pub fn should_flip(&self,) -> bool
    {
        let auto_flip = self.icon_name.as_deref().is_some_and(|name| {
            should_rtl_flip_icon(name, self.dir.as_deref(), self.document_dir.as_deref(),)
                && self.flip_rtl != Some(false,)
        },);
        self.flip_rtl == Some(true,) || auto_flip
    }

    /// CSS custom properties applied to the host.
    pub fn css_variables(&self,) -> [(&'static str, &str,); 3]
    {
        let size = self.size.css_value();
        [
            ("--dimension-icon-height", size,),
            ("--dimension-icon-width", size,),
            ("--color-icon-fill", self.color.as_deref().unwrap_or("currentColor",),),
        ]
    }

    /// Classes applied to the host.
    pub fn classes(&self,) -> Vec<String,>
    {
        let mut classes = Vec::new();
        if let Some(color,) = &self.color {
            classes.push("pds-color".to_owned(),);
            classes.push(format!("pds-color-{color}"),);
        }
        if self.should_flip() {
            classes.push("flip-rtl".to_owned(),);
            if is_rtl(self.dir.as_deref(), self.document_dir.as_deref(),) {
                classes.push("icon-rtl".to_owned(),);
            }
        }
        classes
    }

    fn effective_aria_label(&self,) -> Option<&str,>
    {
        if let Some(label,) = &self.inherited_aria_label {
            return Some(label,);
        }
        if self.aria_hidden {
            return None;
        }
        self.aria_label.as_deref()
    }

    /// Serializes the host element and its content region.
    ///
    /// # Example
    ///
    /// ```
    /// use pine_icons::{IconSize, PdsIcon, RenderContext};
    ///
    /// let icon = PdsIcon::new(RenderContext::Browser,).with_size(IconSize::Small,);
    /// assert_eq!(
    ///     icon.render(),
    ///     "<pds-icon alt=\"\" role=\"img\" size=\"small\" style=\"--dimension-icon-height: 12px; \
    ///      --dimension-icon-width: 12px; --color-icon-fill: currentColor;\"><div \
    ///      class=\"icon-inner\"></div></pds-icon>"
    /// );
    /// ```
    pub fn render(&self,) -> String
    {
        let mut html = String::from("<pds-icon alt=\"\"",);

        if self.aria_hidden {
            html.push_str(" aria-hidden=\"true\"",);
        }
        if let Some(label,) = self.effective_aria_label() {
            push_attribute(&mut html, "aria-label", label,);
        }
        let classes = self.classes();
        if !classes.is_empty() {
            push_attribute(&mut html, "class", &classes.join(" ",),);
        }
        if let Some(color,) = &self.color {
            push_attribute(&mut html, "color", color,);
        }
        if let Some(name,) = &self.request.name {
            push_attribute(&mut html, "name", name,);
        }
        html.push_str(" role=\"img\"",);
        push_attribute(&mut html, "size", self.size.attribute(),);

        let style = self
            .css_variables()
            .iter()
            .map(|(property, value,)| format!("{property}: {value};"),)
            .collect::<Vec<_,>>()
            .join(" ",);
        push_attribute(&mut html, "style", &style,);
        html.push('>',);

        html.push_str("<div class=\"icon-inner\">",);
        if self.context == RenderContext::Browser
            && let Some(content,) = self.svg_content.as_deref()
        {
            html.push_str(content,);
        }
        html.push_str("</div></pds-icon>",);
        html
    }
}

fn push_attribute(html: &mut String, name: &str, value: &str,)
{
    let _ = write!(html, " {name}=\"",);
    for ch in value.chars() {
        match ch {
            '&' => html.push_str("&amp;",),
            '"' => html.push_str("&quot;",),
            '<' => html.push_str("&lt;",),
            '>' => html.push_str("&gt;",),
            other => html.push(other,),
        }
    }
    html.push('"',);
}
