// File:    shape.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Cell layout of a code and conversion between flat code strings and per-cell values.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Code shapes and per-cell code state.

use crate::error::ShapeError;
use crate::validator::{ValidatorRule, accept_all};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Splits bulk text into candidate cell values for a shape.
///
/// Overrides [`CodeShape::split_raw`] when pasted codes carry separators.
pub type PasteParser = Arc<dyn Fn(&str, &CodeShape) -> Vec<String> + Send + Sync>;

/// The ordered capacities of the cells making up a code.
///
/// `[1, 1, 1, 1, 1, 1]` is six single-character cells, `[3, 3]` two cells of
/// three characters each.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct CodeShape {
    cells: Vec<usize>,
}

impl CodeShape {
    /// Validates and builds a shape.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Empty`] for an empty list and
    /// [`ShapeError::ZeroCapacity`] for the first cell declared with capacity 0.
    pub fn new(cells: impl Into<Vec<usize>>) -> Result<Self, ShapeError> {
        let cells = cells.into();
        if cells.is_empty() {
            return Err(ShapeError::Empty);
        }
        if let Some(index) = cells.iter().position(|&c| c == 0) {
            return Err(ShapeError::ZeroCapacity { index });
        }
        Ok(Self { cells })
    }

    /// Capacities in cell order.
    #[must_use]
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Capacity of the cell at `index`, if it exists.
    #[must_use]
    pub fn capacity(&self, index: usize) -> Option<usize> {
        self.cells.get(index).copied()
    }

    /// Total number of characters in a complete code.
    #[must_use]
    pub fn full_length(&self) -> usize {
        self.cells.iter().sum()
    }

    /// A state with every cell empty.
    #[must_use]
    pub fn empty_state(&self) -> CodeState {
        CodeState {
            cells: vec![String::new(); self.cells.len()],
        }
    }

    /// Splits `code` positionally into cells, validating each cell.
    ///
    /// A cell whose slice contains a rejected character is left empty as a
    /// whole. Short input leaves trailing cells partial or empty.
    #[must_use]
    pub fn split(&self, code: &str, rule: Option<&ValidatorRule>) -> CodeState {
        let cells = self
            .split_raw(code)
            .into_iter()
            .map(|cell| if accept_all(&cell, rule) { cell } else { String::new() })
            .collect();
        CodeState { cells }
    }

    /// Fixed-width split with no validation, the default bulk parser.
    ///
    /// ```
    /// use otp_entry_core::shape::CodeShape;
    ///
    /// let shape = CodeShape::new([3, 3]).unwrap();
    /// assert_eq!(shape.split_raw("ABCXYZ"), ["ABC", "XYZ"]);
    /// ```
    #[must_use]
    pub fn split_raw(&self, code: &str) -> Vec<String> {
        let mut chars = code.chars();
        self.cells
            .iter()
            .map(|&capacity| chars.by_ref().take(capacity).collect())
            .collect()
    }

    /// Strict completeness: one value per cell, each exactly at capacity and
    /// made only of characters accepted by `rule`.
    #[must_use]
    pub fn is_complete<S: AsRef<str>>(&self, cells: &[S], rule: Option<&ValidatorRule>) -> bool {
        cells.len() == self.cells.len()
            && cells.iter().zip(&self.cells).all(|(value, &capacity)| {
                let value = value.as_ref();
                value.chars().count() == capacity && accept_all(value, rule)
            })
    }
}

impl TryFrom<Vec<usize>> for CodeShape {
    type Error = ShapeError;

    fn try_from(cells: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(cells)
    }
}

impl From<CodeShape> for Vec<usize> {
    fn from(shape: CodeShape) -> Self {
        shape.cells
    }
}

/// The current value of every cell, in cell order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct CodeState {
    cells: Vec<String>,
}

impl CodeState {
    /// Cell values in order.
    #[must_use]
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Value of the cell at `index`.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    /// Concatenates the cells with no separator.
    #[must_use]
    pub fn join(&self) -> String {
        self.cells.concat()
    }

    /// Weak readiness: every cell holds at least one character.
    ///
    /// Weaker than [`CodeShape::is_complete`]; meant for enabling a submit
    /// button once every cell has been touched.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub(crate) const fn from_cells(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> Option<&mut String> {
        self.cells.get_mut(index)
    }
}

/// Builds a parser that splits pasted text on `delimiter`, so `ABC-XYZ` maps
/// onto a `[3, 3]` shape.
#[must_use]
pub fn delimited_parser(delimiter: impl Into<String>) -> PasteParser {
    let delimiter = delimiter.into();
    Arc::new(move |code: &str, _shape: &CodeShape| {
        code.split(delimiter.as_str()).map(String::from).collect()
    })
}
