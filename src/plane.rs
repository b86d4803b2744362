//! Fluoroscopy plane labelling
//!
//! Consoles report which imaging plane produced an event with a small vendor
//! code. The labels depend on the set of codes found in the whole export:
//! a single code means a single plane system, two codes mean a biplane system
//! where the lower code is plane A.

use std::cmp::Ordering;

use itertools::Itertools;
use strum_macros::{Display, EnumString};

use crate::table::Cell;

#[derive(Debug, thiserror::Error)]
pub enum PlaneError {
    #[error("Expected only 1 or 2 Fluoro planes.")]
    Cardinality(usize),
}
type Result<T> = std::result::Result<T, PlaneError>;

/// Acquisition plane label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Plane {
    #[strum(serialize = "Single Plane")]
    Single,
    #[strum(serialize = "Plane A")]
    A,
    #[strum(serialize = "Plane B")]
    B,
}

/// Labels every event of a plane code column
///
/// The output has one label per input row, in the same order.
pub fn normalize_plane_codes(codes: &[Cell]) -> Result<Vec<Plane>> {
    let distinct: Vec<&Cell> = codes
        .iter()
        .sorted_by(|a, b| a.code_cmp(b))
        .dedup_by(|a, b| a.code_cmp(b) == Ordering::Equal)
        .collect();
    match distinct.as_slice() {
        [_] => Ok(vec![Plane::Single; codes.len()]),
        [lower, _] => Ok(codes
            .iter()
            .map(|code| match code.code_cmp(lower) {
                Ordering::Equal => Plane::A,
                _ => Plane::B,
            })
            .collect()),
        _ => Err(PlaneError::Cardinality(distinct.len())),
    }
}
