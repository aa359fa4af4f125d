pub mod blocks;
pub mod engine;
pub mod pipeline;
pub mod report;
pub mod worklist;
pub mod writer;

pub use blocks::{read_preserved_blocks, scan_blocks, BlockMap};
pub use engine::{RenderSession, RenderedTemplate, TemplateEngine};
pub use pipeline::Renderer;
pub use report::{FileReport, RunReport, WriteAction};
pub use worklist::{build_worklist, WorklistSource};
pub use writer::{CommandFormatter, Formatter, OutputWriter};
