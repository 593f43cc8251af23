pub mod instances;
pub mod signals;

pub use instances::kill_other_instances;
pub use signals::terminate;
