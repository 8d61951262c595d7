pub mod acceptance;
pub mod directory;
pub mod feed;
pub mod intake;
pub mod lifecycle;
pub mod numbering;
pub mod schedule;

pub use acceptance::*;
pub use directory::*;
pub use feed::*;
pub use intake::*;
pub use lifecycle::*;
pub use numbering::*;
pub use schedule::*;
