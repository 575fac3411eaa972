pub mod containers;
pub mod descriptor;
pub mod member;
pub mod registry;
pub mod shape;
pub mod tag;
