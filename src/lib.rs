pub use bytes::Bytes;

mod buffer;
mod element;
mod error;
mod index;
pub mod prototype;
mod sort;
pub mod species;
mod transfer;
mod traverse;
mod util;
mod value;
mod view;

pub use buffer::*;
pub use element::*;
pub use error::*;
pub use index::*;
pub use sort::*;
pub use species::*;
pub use traverse::*;
use util::*;
pub use value::*;
pub use view::*;
