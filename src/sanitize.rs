// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! SVG validation applied to untrusted icon markup before it is cached.
//!
//! The default [`SvgSanitizer`] parses the document with `roxmltree` and
//! rejects anything that could execute script or pull in external resources
//! once the markup is injected into a page. Accepted documents are reduced to
//! the markup of the root `<svg>` element, dropping prologs, doctypes and
//! comments around it.

use roxmltree::{Document, Node, ParsingOptions};

/// Upper bound on the size of an icon document.
const MAX_SVG_BYTES: usize = 512 * 1024;
/// Upper bound on the number of elements inside an icon document.
const MAX_SVG_ELEMENTS: usize = 10_000;
/// Elements that are never allowed inside an icon.
const FORBIDDEN_ELEMENTS: &[&str] = &["script", "foreignobject", "iframe", "embed", "object"];
/// SMIL elements that can rewrite attributes of their target.
const ANIMATION_ELEMENTS: &[&str] =
    &["set", "animate", "animatemotion", "animatetransform", "animatecolor"];

/// Collaborator that turns untrusted SVG text into markup safe to render.
pub trait Sanitizer: Send + Sync
{
    /// Returns the sanitized markup, or `None` when the document must not be
    /// rendered at all.
    fn sanitize(&self, svg: &str,) -> Option<String,>;
}

/// Default sanitizer rejecting scripts, event handlers and external
/// references.
#[derive(Debug, Clone, Copy, Default,)]
pub struct SvgSanitizer;

impl Sanitizer for SvgSanitizer
{
    fn sanitize(&self, svg: &str,) -> Option<String,>
    {
        if svg.len() > MAX_SVG_BYTES {
            return None;
        }

        let options = ParsingOptions {
            allow_dtd: true, ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(svg, options,).ok()?;
        let root = doc.root_element();
        if !root.tag_name().name().eq_ignore_ascii_case("svg",) {
            return None;
        }
        // Processing instructions survive into the returned markup and are
        // parsed as HTML once injected.
        if root.descendants().any(|node| node.is_pi(),) {
            return None;
        }

        let mut element_count = 0usize;
        for node in root.descendants().filter(|n| n.is_element(),) {
            element_count += 1;
            if element_count > MAX_SVG_ELEMENTS || is_unsafe_node(&node,) {
                return None;
            }
        }

        Some(svg[root.range()].to_owned(),)
    }
}

/// Extracts the first `<svg>` element of `document` without validating it.
pub(crate) fn extract_svg_element(document: &str,) -> Option<String,>
{
    let options = ParsingOptions {
        allow_dtd: true, ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(document, options,).ok()?;
    let svg = doc
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name().eq_ignore_ascii_case("svg",),)?;
    Some(document[svg.range()].to_owned(),)
}

fn is_unsafe_node(node: &Node<'_, '_,>,) -> bool
{
    let name = node.tag_name().name();
    if FORBIDDEN_ELEMENTS.iter().any(|forbidden| name.eq_ignore_ascii_case(forbidden,),) {
        return true;
    }
    if ANIMATION_ELEMENTS.iter().any(|animation| name.eq_ignore_ascii_case(animation,),)
        && node.attributes().any(|attr| {
            attr.name().eq_ignore_ascii_case("attributename",) && targets_href(attr.value(),)
        },)
    {
        return true;
    }

    for attr in node.attributes() {
        let attr_name = attr.name();
        if starts_with_case_insensitive(attr_name, "on",) {
            return true;
        }
        if attr_name.eq_ignore_ascii_case("href",) && is_disallowed_reference(attr.value(),) {
            return true;
        }
        if contains_disallowed_url_function(attr.value(),) {
            return true;
        }
    }

    if name.eq_ignore_ascii_case("style",)
        && node.text().is_some_and(contains_disallowed_url_function,)
    {
        return true;
    }

    false
}

/// `href` and `xlink:href`, with or without a namespace prefix.
fn targets_href(attribute_name: &str,) -> bool
{
    let local = attribute_name.trim().rsplit(':',).next().unwrap_or_default();
    local.eq_ignore_ascii_case("href",)
}

fn contains_disallowed_url_function(value: &str,) -> bool
{
    // URL parsers drop tabs and newlines inside a scheme.
    let compact: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control(),)
        .map(|c| c.to_ascii_lowercase(),)
        .collect();
    if compact.contains("javascript:",) {
        return true;
    }

    let lower = value.to_ascii_lowercase();

    let mut search_start = 0usize;
    while let Some(rel_idx,) = lower[search_start..].find("url(",) {
        let idx = search_start + rel_idx;
        let after = &value[idx + 4..];
        let Some(close_idx,) = after.find(')',) else {
            return true;
        };
        let target = after[..close_idx].trim().trim_matches(|c| matches!(c, '"' | '\''),);
        if is_disallowed_reference(target,) {
            return true;
        }
        search_start = idx + 4 + close_idx + 1;
    }

    false
}

/// Fragment and inline data references are fine; anything else reaches
/// outside the document.
fn is_disallowed_reference(target: &str,) -> bool
{
    let trimmed = target.trim();
    !(trimmed.is_empty() || trimmed.starts_with('#',) || starts_with_case_insensitive(trimmed, "data:",))
}

fn starts_with_case_insensitive(value: &str, prefix: &str,) -> bool
{
    value.get(..prefix.len(),).is_some_and(|head| head.eq_ignore_ascii_case(prefix,),)
}
