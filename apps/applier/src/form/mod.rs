pub mod classifier;
pub mod descriptor;
pub mod detector;
pub mod filler;
pub mod purpose;
pub mod report;
pub mod resolver;

pub use descriptor::{FieldDescriptor, FieldTag};
pub use filler::FormFiller;
pub use purpose::Purpose;
pub use report::{FillOutcome, FillReport, UnfilledField};
