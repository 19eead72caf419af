//! Default pipeline stages.
//!
//! The standard transform pipeline consists of:
//!
//! 1. **TablesStage** - Enable pipe tables and square up ragged rows
//! 2. **AnchorsStage** - Give every heading a unique, deterministic id
//! 3. **CodeTitlesStage** - Pull `lang:title` annotations off code fences
//! 4. **AutolinkStage** - Mark anchored headings as self-linking
//! 5. **HighlightStage** - Split code blocks into highlighted, numbered lines

mod anchors;
mod autolink;
mod code_titles;
mod highlight;
mod tables;

pub use anchors::AnchorsStage;
pub use autolink::AutolinkStage;
pub use code_titles::CodeTitlesStage;
pub use highlight::HighlightStage;
pub use tables::TablesStage;
