//! Library side of the `bls-brief` CLI: logging setup and the analyze run.

pub mod logging;
pub mod pipeline;
