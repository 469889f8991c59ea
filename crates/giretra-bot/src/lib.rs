pub mod policy;

pub use policy::{Policy, PolicyContext, RandomPolicy, SteadyPolicy};
