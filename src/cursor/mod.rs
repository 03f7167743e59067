//! Pagination cursors

mod codec;

pub use codec::{CursorCodec, DecodedCursor};
