use pulldown_cmark::Options;

use crate::build::pipeline::{PipelineError, Stage, StageContext};
use crate::build::tree::{Alignment, Node, RenderTree};

/// Turns on pipe-table parsing and normalizes the resulting tables.
///
/// Rows shorter than the header get empty cells so every row has one cell
/// per column, each carrying its column's alignment.
pub struct TablesStage;

impl Stage for TablesStage {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn parser_options(&self) -> Options {
        Options::ENABLE_TABLES
    }

    fn process(&self, tree: &mut RenderTree, _ctx: &StageContext) -> Result<(), PipelineError> {
        tree.walk_mut(&mut |node| {
            if let Node::Table {
                alignments,
                children,
            } = node
            {
                normalize_table(alignments, children);
            }
        });
        Ok(())
    }
}

fn normalize_table(alignments: &[Alignment], rows: &mut [Node]) {
    let columns = alignments.len();
    for row in rows {
        let Node::TableRow { header, children } = row else {
            continue;
        };
        while children.len() < columns {
            children.push(Node::TableCell {
                alignment: Alignment::None,
                header: *header,
                children: Vec::new(),
            });
        }
        for (index, cell) in children.iter_mut().enumerate() {
            if let Node::TableCell {
                alignment,
                header: cell_header,
                ..
            } = cell
            {
                *alignment = alignments.get(index).copied().unwrap_or_default();
                *cell_header = *header;
            }
        }
    }
}
