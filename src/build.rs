mod compiler;
mod components;
mod document;
mod generator;
mod highlight;
mod jsx;
mod markdown;
mod paths;
pub mod pipeline;
mod render;
mod source;
mod store;
mod style;
mod template;
mod tree;
mod watch;

pub use generator::{BuildResult, PageGenerator, PageView};
pub use paths::{base_path_from_config, resolve_path};
pub use store::PageStore;
pub use watch::{FileWatcher, PathClassifier, WatchEvent, WatchPaths};
