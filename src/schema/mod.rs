pub mod features;
pub mod value;
