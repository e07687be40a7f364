mod base;
mod toc;

pub use base::*;
pub use toc::*;
