mod case;

pub use case::*;
