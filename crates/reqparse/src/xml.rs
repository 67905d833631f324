//! XML engine: a byte-cursor parser producing an owned element tree

pub mod cursor;
pub mod model;
pub mod node;
pub mod parser;

pub use model::{Content, Document, Element};
pub use node::XmlNode;
pub use parser::{Config, Parser};
