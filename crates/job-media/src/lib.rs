//! Media type negotiation: pick a representation from an Accept header.

mod negotiate;

pub use negotiate::{choose, parse_accept, AcceptEntry, MediaError, ANY};
