// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Inline SVG payloads carried in `data:` URLs.
//!
//! Icons registered with embedded content never touch the network: the cache
//! recognizes them with [`is_inline_svg`] and decodes them synchronously.

use base64::Engine;

use crate::sanitize::extract_svg_element;

const SVG_DATA_PREFIX: &str = "data:image/svg+xml";

/// Returns `true` when `url` is a `data:image/svg+xml` URL.
pub fn is_svg_data_url(url: &str,) -> bool
{
    url.trim_start()
        .get(..SVG_DATA_PREFIX.len(),)
        .is_some_and(|head| head.eq_ignore_ascii_case(SVG_DATA_PREFIX,),)
}

/// Returns `true` when the data URL declares its payload encoding
/// (`utf8`, `charset=utf-8` or `base64`). Undeclared payloads are still
/// decoded as percent-encoded text.
pub fn is_encoded_data_url(url: &str,) -> bool
{
    let Some((metadata, _,),) = url.split_once(',',) else {
        return false;
    };

    metadata.split(';',).skip(1,).any(|param| {
        let param = param.trim();
        param.eq_ignore_ascii_case("utf8",)
            || param.eq_ignore_ascii_case("charset=utf-8",)
            || param.eq_ignore_ascii_case("charset=utf8",)
            || param.eq_ignore_ascii_case("base64",)
    },)
}

/// Returns `true` when `url` carries an inline SVG document, whether or not
/// it declares an encoding. Such URLs are never fetched.
///
/// # Example
///
/// ```
/// use pine_icons::is_inline_svg;
///
/// assert!(is_inline_svg("data:image/svg+xml;utf8,<svg/>"));
/// assert!(is_inline_svg("data:image/svg+xml,%3Csvg%2F%3E"));
/// assert!(!is_inline_svg("https://cdn.jsdelivr.net/npm/@pine-ds/icons/svg/archive.svg"));
/// ```
pub fn is_inline_svg(url: &str,) -> bool
{
    is_svg_data_url(url,)
}

/// Decodes an inline SVG data URL and returns the markup of its `<svg>`
/// element, or `None` when the payload cannot be decoded or holds no SVG.
pub fn decode_svg_data_url(url: &str,) -> Option<String,>
{
    let (metadata, payload,) = url.trim().split_once(',',)?;
    let is_base64 =
        metadata.split(';',).skip(1,).any(|param| param.trim().eq_ignore_ascii_case("base64",),);

    // Raw utf8 payloads may contain a literal '%' (e.g. width="100%").
    let bytes = if is_base64 {
        decode_base64(payload,)?
    } else {
        percent_decode(payload,).unwrap_or_else(|| payload.as_bytes().to_vec(),)
    };
    let text = String::from_utf8(bytes,).ok()?;

    extract_svg_element(&text,)
}

/// Decodes base64 payloads, tolerating ASCII whitespace.
fn decode_base64(data: &str,) -> Option<Vec<u8,>,>
{
    let cleaned: Vec<u8,> = data.bytes().filter(|byte| !byte.is_ascii_whitespace(),).collect();
    base64::engine::general_purpose::STANDARD.decode(cleaned,).ok()
}

/// Percent-decodes a payload without treating '+' specially.
fn percent_decode(input: &str,) -> Option<Vec<u8,>,>
{
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len(),);
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = (*bytes.get(i + 1,)? as char).to_digit(16,)?;
            let lo = (*bytes.get(i + 2,)? as char).to_digit(16,)?;
            out.push(((hi << 4) | lo) as u8,);
            i += 3;
        } else {
            out.push(bytes[i],);
            i += 1;
        }
    }

    Some(out,)
}
