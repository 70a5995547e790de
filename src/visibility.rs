// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Per-element gate that defers icon loading until the element is likely
//! visible.
//!
//! The gate is a plain state machine. It never owns observers or timers;
//! instead every transition returns the [`GateCommand`]s the host must carry
//! out (start observing, arm the fallback timer, disconnect, load). This keeps
//! the behaviour deterministic under test and lets hosts plug in whatever
//! intersection and timer primitives they have.
//!
//! ```text
//! Unattached -> WaitingForVisibility -> Visible -> Loaded
//!      \______________________________/^
//! ```

use std::time::Duration;

/// Margin around the viewport within which an element counts as visible.
pub const DEFAULT_ROOT_MARGIN_PX: f64 = 50.0;
/// Delay after which a still-waiting element is treated as visible.
pub const DEFAULT_FALLBACK: Duration = Duration::from_millis(1_000,);

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default,)]
pub struct Rect
{
    /// Left edge.
    pub x:      f64,
    /// Top edge.
    pub y:      f64,
    /// Width.
    pub width:  f64,
    /// Height.
    pub height: f64,
}

impl Rect
{
    /// Creates a rectangle from its origin and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64,) -> Self
    {
        Self {
            x, y, width, height,
        }
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expand(self, margin: f64,) -> Self
    {
        Self::new(self.x - margin, self.y - margin, self.width + 2.0 * margin, self.height + 2.0 * margin,)
    }

    /// Returns `true` when the rectangles overlap or touch.
    pub fn intersects(&self, other: &Rect,) -> bool
    {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }
}

/// Tunables for the gate.
#[derive(Debug, Clone, Copy, PartialEq,)]
pub struct VisibilityOptions
{
    /// Margin handed to the intersection observer.
    pub root_margin_px: f64,
    /// Fallback delay before forcing visibility.
    pub fallback:       Duration,
}

impl Default for VisibilityOptions
{
    fn default() -> Self
    {
        Self {
            root_margin_px: DEFAULT_ROOT_MARGIN_PX, fallback: DEFAULT_FALLBACK,
        }
    }
}

/// Lifecycle state of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum GateState
{
    /// Not connected to a document.
    Unattached,
    /// Connected, waiting for an intersection or the fallback timer.
    WaitingForVisibility,
    /// Allowed to load.
    Visible,
    /// Visible and an icon has been loaded at least once.
    Loaded,
    /// Disconnected; no further transitions happen.
    Detached,
}

/// Side effect the host performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq,)]
pub enum GateCommand
{
    /// Start an intersection observer with the given margin.
    Observe
    {
        /// Margin around the viewport in pixels.
        root_margin_px: f64,
    },
    /// Schedule [`VisibilityGate::fallback_elapsed`] after `after`.
    ArmFallback
    {
        /// Delay before the fallback fires.
        after: Duration,
    },
    /// Disconnect the intersection observer.
    Disconnect,
    /// Cancel the pending fallback timer.
    CancelFallback,
    /// Resolve and load the current icon.
    Load,
}

/// Visibility state machine for one element.
#[derive(Debug, Clone, PartialEq,)]
pub struct VisibilityGate
{
    state:          GateState,
    options:        VisibilityOptions,
    observing:      bool,
    fallback_armed: bool,
}

impl Default for VisibilityGate
{
    fn default() -> Self
    {
        Self::new(VisibilityOptions::default(),)
    }
}

impl VisibilityGate
{
    /// Creates an unattached gate.
    pub fn new(options: VisibilityOptions,) -> Self
    {
        Self {
            state: GateState::Unattached, options, observing: false, fallback_armed: false,
        }
    }

    /// Current state.
    pub fn state(&self,) -> GateState
    {
        self.state
    }

    /// Returns `true` once the element may load icons. Visibility is sticky.
    pub fn is_visible(&self,) -> bool
    {
        matches!(self.state, GateState::Visible | GateState::Loaded)
    }

    /// Handles attachment of an element with bounding box `bounds`.
    ///
    /// `viewport` is `None` when the host has no layout information (server
    /// rendering, headless contexts); the element is then treated as visible
    /// right away.
    pub fn attach(&mut self, bounds: Rect, viewport: Option<Rect,>,) -> Vec<GateCommand,>
    {
        if !matches!(self.state, GateState::Unattached | GateState::Detached) {
            return Vec::new();
        }

        match viewport {
            Some(viewport,) if !bounds.intersects(&viewport,) => {
                self.state = GateState::WaitingForVisibility;
                self.observing = true;
                self.fallback_armed = true;
                vec![
                    GateCommand::Observe {
                        root_margin_px: self.options.root_margin_px,
                    },
                    GateCommand::ArmFallback {
                        after: self.options.fallback,
                    },
                ]
            }
            _ => {
                self.state = GateState::Visible;
                vec![GateCommand::Load]
            }
        }
    }

    /// Handles an intersection observer notification.
    pub fn intersection_changed(&mut self, is_intersecting: bool,) -> Vec<GateCommand,>
    {
        if self.state != GateState::WaitingForVisibility || !is_intersecting {
            return Vec::new();
        }
        self.become_visible()
    }

    /// Handles expiry of the fallback timer.
    pub fn fallback_elapsed(&mut self,) -> Vec<GateCommand,>
    {
        if self.state != GateState::WaitingForVisibility {
            return Vec::new();
        }
        self.fallback_armed = false;
        self.become_visible()
    }

    /// Requests a new load after a property change. Only visible elements
    /// load; waiting elements pick the change up when they become visible.
    pub fn request_reload(&mut self,) -> Vec<GateCommand,>
    {
        if self.is_visible() {
            self.state = GateState::Visible;
            vec![GateCommand::Load]
        } else {
            Vec::new()
        }
    }

    /// Records that a load completed.
    pub fn mark_loaded(&mut self,)
    {
        if self.state == GateState::Visible {
            self.state = GateState::Loaded;
        }
    }

    /// Handles detachment, releasing the observer and timer.
    pub fn detach(&mut self,) -> Vec<GateCommand,>
    {
        let mut commands = Vec::new();
        if self.observing {
            commands.push(GateCommand::Disconnect,);
        }
        if self.fallback_armed {
            commands.push(GateCommand::CancelFallback,);
        }
        self.observing = false;
        self.fallback_armed = false;
        self.state = GateState::Detached;
        commands
    }

    fn become_visible(&mut self,) -> Vec<GateCommand,>
    {
        let mut commands = Vec::with_capacity(3,);
        if self.observing {
            commands.push(GateCommand::Disconnect,);
            self.observing = false;
        }
        if self.fallback_armed {
            commands.push(GateCommand::CancelFallback,);
            self.fallback_armed = false;
        }
        commands.push(GateCommand::Load,);
        self.state = GateState::Visible;
        commands
    }
}
