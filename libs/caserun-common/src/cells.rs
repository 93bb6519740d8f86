/// Flat cell view of a suite and the pair selector over it.
///
/// The editing surface has no nesting: a suite is shown as
/// `[heading 0, input 0, output 0, heading 1, input 1, output 1, ...]` and
/// pairs are recovered from adjacency of data cells when a run is
/// requested.
use crate::config::{is_data_language, DATA_LANGUAGES};
use crate::types::{normalize_line_endings, Cell, CellKind, Node, TestSuite};
use std::collections::BTreeSet;

const HEADING_LANGUAGE: &str = "markdown";
const CELLS_PER_TEST: usize = 3;

pub fn render_cells(suite: &TestSuite) -> Vec<Cell> {
    let language = DATA_LANGUAGES[0];
    suite
        .iter()
        .flat_map(|(position, test)| {
            [
                Cell::new(
                    CellKind::Heading,
                    HEADING_LANGUAGE,
                    Node::Test(position).label(),
                ),
                Cell::new(CellKind::Input, language, test.input.data.clone()),
                Cell::new(CellKind::Output, language, test.output.data.clone()),
            ]
        })
        .collect()
}

/// Cell index of the input half of the test case at `position`.
pub fn input_cell_index(position: usize) -> usize {
    position * CELLS_PER_TEST + 1
}

/// Test position whose input half sits at cell `index`, for cells
/// produced by [`render_cells`].
pub fn position_of_input_cell(index: usize) -> Option<usize> {
    (index % CELLS_PER_TEST == 1).then_some(index / CELLS_PER_TEST)
}

/// Resolve the cells a user triggered into pair-start indices.
///
/// A data cell whose only data neighbour follows it is an input and
/// selects itself; one whose only data neighbour precedes it is an output
/// and selects that neighbour. Cells with data neighbours on both sides or
/// on neither side are ambiguous and skipped. Out-of-range indices are
/// ignored.
pub fn select_pairs(cells: &[Cell], selected: &[usize]) -> BTreeSet<usize> {
    let is_data = |i: usize| cells.get(i).is_some_and(|c| is_data_language(&c.language_id));

    let mut starts = BTreeSet::new();
    for &index in selected {
        if !is_data(index) {
            continue;
        }
        let next = is_data(index + 1);
        let prev = index > 0 && is_data(index - 1);
        match (prev, next) {
            (false, true) => {
                starts.insert(index);
            }
            (true, false) => {
                starts.insert(index - 1);
            }
            _ => {}
        }
    }
    starts
}

/// Input text and expected output of the pair starting at `start`,
/// with line endings normalized.
pub fn pair_at(cells: &[Cell], start: usize) -> Option<(String, String)> {
    let input = cells.get(start)?;
    let output = cells.get(start + 1)?;
    Some((
        normalize_line_endings(&input.text),
        normalize_line_endings(&output.text),
    ))
}
