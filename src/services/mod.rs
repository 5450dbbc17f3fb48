pub mod catalog;
pub mod curriculum;
pub mod learners;
pub mod progress;
pub mod recommendation;
