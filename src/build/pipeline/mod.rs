//! Transform pipeline for compiled post bodies.
//!
//! The pipeline runs an ordered list of stages over a render tree:
//! 1. Tables (pipe table syntax in the parser, row normalization)
//! 2. Anchors (deterministic heading ids)
//! 3. Code titles (`lang:title` fence annotations)
//! 4. Autolink (permalinks on headings)
//! 5. Highlight (line-level syntax highlighting)
//!
//! Later stages depend on structure produced by earlier ones, so each stage
//! declares its prerequisites and the pipeline refuses to run out of order.

mod context;
mod error;
mod stages;

pub use context::StageContext;
pub use error::PipelineError;

use pulldown_cmark::Options;

use super::tree::RenderTree;
use stages::{AnchorsStage, AutolinkStage, CodeTitlesStage, HighlightStage, TablesStage};

/// A stage in the transform pipeline.
///
/// Stages run sequentially over the whole tree and modify it in place.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used for insertion points and prerequisites).
    fn name(&self) -> &'static str;

    /// Names of stages that must run before this one.
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    /// Parser extensions this stage relies on.
    fn parser_options(&self) -> Options {
        Options::empty()
    }

    /// Transform the tree.
    fn process(&self, tree: &mut RenderTree, ctx: &StageContext) -> Result<(), PipelineError>;
}

/// The transform pipeline.
///
/// # Extension Points
///
/// Insert custom stages using `insert_before` or `insert_after`:
///
/// ```ignore
/// pipeline.insert_after("anchors", MyCustomStage)?;
/// ```
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create the default pipeline with standard stages.
    ///
    /// Stages: tables → anchors → code-titles → autolink → highlight
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(TablesStage);
        pipeline.add_stage(AnchorsStage);
        pipeline.add_stage(CodeTitlesStage);
        pipeline.add_stage(AutolinkStage);
        pipeline.add_stage(HighlightStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage before the named stage.
    pub fn insert_before<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self.position(name)?;
        self.stages.insert(pos, Box::new(stage));
        Ok(self)
    }

    /// Insert a stage after the named stage.
    pub fn insert_after<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self.position(name)?;
        self.stages.insert(pos + 1, Box::new(stage));
        Ok(self)
    }

    fn position(&self, name: &str) -> Result<usize, PipelineError> {
        self.stages
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| PipelineError::UnknownStage(name.to_string()))
    }

    /// Check that every stage's prerequisites run before it.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (index, stage) in self.stages.iter().enumerate() {
            for &required in stage.requires() {
                let satisfied = self.stages[..index].iter().any(|s| s.name() == required);
                if !satisfied {
                    return Err(PipelineError::Order {
                        stage: stage.name(),
                        requires: required,
                    });
                }
            }
        }
        Ok(())
    }

    /// Parser options needed by all stages combined.
    pub fn parser_options(&self) -> Options {
        self.stages
            .iter()
            .fold(Options::empty(), |options, stage| options | stage.parser_options())
    }

    /// Run the pipeline on a tree.
    pub fn run(&self, tree: &mut RenderTree, ctx: &StageContext) -> Result<(), PipelineError> {
        for stage in &self.stages {
            stage.process(tree, ctx)?;
        }
        Ok(())
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}
