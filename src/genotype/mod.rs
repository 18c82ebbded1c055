pub mod likelihood;
pub mod model;
pub mod runner;
pub mod site;

pub use runner::genotype_graph;
pub use site::{AlleleInfo, GenotypeCall, GenotypedSite, NullReason};
