//! Block rules
//!
//! Every block rule consumes whole lines. Inline-bearing blocks keep their
//! raw inline text as a placeholder child until the inline pass runs.

mod container;
mod leaf;
mod paragraph;
mod table;

pub use container::{Blockquote, List};
pub use leaf::{
    AtxHeading, BlankLine, FencedCode, HorizontalRule, HtmlBlock, IndentedCode, LinkDefinition,
    SetextHeading,
};
pub use paragraph::{BlockText, Paragraph};
pub use table::Table;
