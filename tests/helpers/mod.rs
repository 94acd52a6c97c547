pub mod builders;

pub use builders::{course, GroupBuilder, UserBuilder};
