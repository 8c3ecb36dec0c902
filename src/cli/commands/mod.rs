pub mod collect;
pub mod fan_out;
pub mod handoff;
pub mod stream;
pub mod walkthrough;

pub use collect::*;
pub use fan_out::*;
pub use handoff::*;
pub use stream::*;
pub use walkthrough::*;
