pub mod buffer;
pub mod hierarchy;
pub mod mesh;
pub mod morph;
pub mod orchestrator;
pub mod pass;
pub mod report;
pub mod target;

pub use buffer::*;
pub use hierarchy::*;
pub use mesh::*;
pub use morph::*;
pub use orchestrator::*;
pub use pass::*;
pub use report::*;
pub use target::*;
