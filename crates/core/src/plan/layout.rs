#![forbid(unsafe_code)]

//! Derived layout. Coordinates are always a pure function of
//! `(id, thread_view_index)` and are recomputed after every mutation;
//! stored coordinates are never authoritative.

/// Horizontal gap between consecutive node ids.
pub const NODE_GAP_X: i64 = 220;

/// Vertical gap between thread lanes.
pub const THREAD_GAP_Y: i64 = 120;

/// Y of the main lane. Larger view index = higher up = smaller y.
pub const MAIN_Y_BASELINE: i64 = 200;

pub fn node_x(id: i64) -> i64 {
    (id - 1) * NODE_GAP_X
}

pub fn thread_y(view_index: i64) -> i64 {
    MAIN_Y_BASELINE - view_index * THREAD_GAP_Y
}
