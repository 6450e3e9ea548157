//! File I/O: DV containers (.dvc), scaffold frames, ranking tables, result vectors.

pub mod compression;
pub mod container;
pub mod mmap;
pub mod output;
pub mod ranking;
pub mod reader;
pub mod scaffold;
pub mod writer;

pub use container::DvContainer;
pub use mmap::MmapDvReader;
pub use output::{write_npy, write_vector, VectorFormat};
pub use ranking::{RankingRow, RankingTable};
pub use reader::{DvReader, FrameEntry};
pub use scaffold::{
    list_scaffold_frames, scaffold_path, ScaffoldFrame, ScaffoldReader, ScaffoldWriter,
};
pub use writer::DvWriter;
