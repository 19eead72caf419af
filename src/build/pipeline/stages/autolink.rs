use crate::build::pipeline::{PipelineError, Stage, StageContext};
use crate::build::tree::{Node, RenderTree};

/// Marks headings with an id as permalinks to themselves.
///
/// The renderer appends a `#` link pointing at the heading id.
pub struct AutolinkStage;

impl Stage for AutolinkStage {
    fn name(&self) -> &'static str {
        "autolink"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["anchors"]
    }

    fn process(&self, tree: &mut RenderTree, _ctx: &StageContext) -> Result<(), PipelineError> {
        tree.walk_mut(&mut |node| {
            if let Node::Heading { id, permalink, .. } = node {
                *permalink = id.is_some();
            }
        });
        Ok(())
    }
}
