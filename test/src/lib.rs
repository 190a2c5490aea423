pub mod test_entity;

pub use helpers::*;
pub use local_link::{LinkConditioner, LocalLink, LocalLinkPair};
pub use test_entity::{Position, TestEntity, CLIENT, SERVER};
