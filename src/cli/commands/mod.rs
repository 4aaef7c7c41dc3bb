pub mod nav;
pub mod order;
