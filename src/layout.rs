// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Subcircuit-face layout for a scope.
//!
//! Documents written before layouts were stored get one synthesized
//! from their port counts.  The formula is load-bearing backward
//! compatibility: older documents must come out with bit-for-bit the
//! same geometry on every load, so the constants and rounding here are
//! pinned by tests and must not drift.

use crate::json::LayoutDoc;

pub const SCOPE_WIDTH: i32 = 100;
pub const PORT_PITCH: i32 = 20;
pub const HEIGHT_MARGIN: i32 = 20;
pub const TITLE_X: i32 = 50;
pub const TITLE_Y: i32 = 13;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    pub title_x: i32,
    pub title_y: i32,
    pub title_enabled: bool,
}

impl Layout {
    /// Layout for a scope that never stored one: fixed width, height
    /// scaled by the busier side's port count, title in the fixed spot.
    pub fn synthesize(input_count: usize, output_count: usize) -> Layout {
        let ports = input_count.max(output_count) as i32;
        Layout {
            width: SCOPE_WIDTH,
            height: ports * PORT_PITCH + HEIGHT_MARGIN,
            title_x: TITLE_X,
            title_y: TITLE_Y,
            title_enabled: true,
        }
    }

    pub fn to_doc(&self) -> LayoutDoc {
        LayoutDoc {
            width: self.width,
            height: self.height,
            title_x: self.title_x,
            title_y: self.title_y,
            title_enabled: Some(self.title_enabled),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::synthesize(0, 0)
    }
}

/// Evenly spaced positions for `count` ports along one edge at `x`.
/// Port i of n sits at y = round(height / (n + 1)) * (i + 1).
pub fn port_positions(height: i32, count: usize, x: i32) -> Vec<(i32, i32)> {
    let step = if count == 0 {
        0
    } else {
        (height as f64 / (count + 1) as f64).round() as i32
    };
    (0..count).map(|i| (x, step * (i as i32 + 1))).collect()
}
