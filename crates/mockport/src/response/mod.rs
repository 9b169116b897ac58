//! Response assembly: status, headers, body expressions and content encodings.

mod assembler;
mod encoding;
mod template;

pub use assembler::{assemble, OutboundResponse};
pub use encoding::{encode, encode_all, EncodingError};
pub use template::{has_expressions, render, ExpressionContext};
