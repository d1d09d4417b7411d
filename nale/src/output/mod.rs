//! Ambient output layer: converting `Alignment`s into the tabular report
//! file the `mmoreseqs` CLI writes, and the small `Path` convenience used
//! to open it (and the seeds file) for writing.

pub mod output_tabular;
pub mod path_buf_ext;
