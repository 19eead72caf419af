//! Pipeline context for sharing state across stages.

use crate::build::highlight::SyntaxHighlighter;

/// Shared services available to every stage.
///
/// Stages must not keep state between documents; anything per-document
/// lives in the tree itself.
pub struct StageContext<'a> {
    /// Syntax highlighter for code blocks
    pub highlighter: &'a SyntaxHighlighter,
}
