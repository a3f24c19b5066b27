pub mod artifact;
pub mod definition;
pub mod params;
pub mod reference;

pub use artifact::*;
pub use definition::*;
pub use params::*;
pub use reference::*;
