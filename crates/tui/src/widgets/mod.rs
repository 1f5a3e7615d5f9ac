//! TUI widgets.

pub mod command_composer;
pub mod pipeline_board;
pub mod preview;

pub use command_composer::CommandComposer;
pub use preview::Preview;
