pub mod batch;
pub mod builder;
pub mod defaults;
pub mod emission;
pub mod registry;
pub mod runtime;
pub mod traits;
