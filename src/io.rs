//! Reading trajectories and writing analysis results.

mod results_writer;
mod xyz_handler;

pub use results_writer::ResultsWriter;
pub use xyz_handler::{FrameWindow, XyzFileHandler, XyzHandlerError};
