mod certificate;
mod options;
mod trust;

pub use certificate::*;
pub use options::*;
pub use trust::*;
