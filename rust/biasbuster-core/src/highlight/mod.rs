pub mod error;
pub mod buffer;
pub mod span;
pub mod resolver;
pub mod score;
pub mod projection;
pub mod config;
pub mod oracle;
pub mod annotator;
pub mod session;
pub mod locator;
pub mod lexicon;
pub mod summary;
pub mod wasm;

pub use error::*;
pub use buffer::*;
pub use span::*;
pub use resolver::*;
pub use score::*;
pub use projection::*;
pub use config::*;
pub use oracle::*;
pub use annotator::*;
pub use session::*;
pub use locator::*;
pub use lexicon::*;
pub use summary::*;
pub use wasm::*;
