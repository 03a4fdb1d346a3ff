pub mod draft;
pub mod generator;
pub mod linkage;

pub use generator::BriefingGenerator;
