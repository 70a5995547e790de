// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Right-to-left handling for directional icons.

/// Icons whose artwork points in a reading direction and is mirrored in RTL
/// documents.
pub const ICONS_TO_FLIP: &[&str] = &[
    "align-horizontal-bottom",
    "align-horizontal-center",
    "align-horizontal-top",
    "align-left",
    "align-right",
    "align-vertical-left",
    "align-vertical-right",
    "arrow-corner",
    "arrow-left",
    "arrow-right",
    "calendar-schedule",
    "caret-left",
    "caret-right",
    "cart",
    "cart-add",
    "comment",
    "comment-no",
    "conversation",
    "copy",
    "copy-07",
    "delete-key",
    "delete-x",
    "downsell",
    "drawer-collapse",
    "drawer-expand",
    "duplicate",
    "feedback",
    "file-lock",
    "file-search",
    "form-field",
    "form-filled",
    "left-small",
    "launch",
    "list-bullet",
    "list-numbers",
    "margin-left",
    "margin-right",
    "move-left",
    "move-right",
    "newsletter-2",
    "one-off-session",
    "quote",
    "redo",
    "reset-password",
    "right-small",
    "send-message",
    "share",
    "super-admin",
    "tablet-landscape",
    "undo",
    "user-star",
    "user-star-filled",
    "users",
    "users-filled",
    "users-tone",
];

/// Returns `true` when the effective direction is RTL. A non-empty `dir` on
/// the host element takes priority over the document direction.
pub fn is_rtl(host_dir: Option<&str,>, document_dir: Option<&str,>,) -> bool
{
    let effective = match host_dir.filter(|dir| !dir.is_empty(),) {
        Some(dir,) => Some(dir,),
        None => document_dir,
    };
    effective.is_some_and(|dir| dir.eq_ignore_ascii_case("rtl",),)
}

/// Returns `true` when `icon_name` should be mirrored automatically.
pub fn should_rtl_flip_icon(icon_name: &str, host_dir: Option<&str,>, document_dir: Option<&str,>,) -> bool
{
    is_rtl(host_dir, document_dir,) && ICONS_TO_FLIP.contains(&icon_name,)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn host_direction_wins()
    {
        assert!(is_rtl(Some("RTL",), Some("ltr",),));
        assert!(!is_rtl(Some("ltr",), Some("rtl",),));
        assert!(is_rtl(Some("",), Some("rtl",),));
        assert!(!is_rtl(None, None,));
    }

    #[test]
    fn only_listed_icons_flip()
    {
        assert!(should_rtl_flip_icon("arrow-left", None, Some("rtl",),));
        assert!(!should_rtl_flip_icon("archive", None, Some("rtl",),));
        assert!(!should_rtl_flip_icon("arrow-left", None, Some("ltr",),));
    }
}
