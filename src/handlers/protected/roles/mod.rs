pub mod page_order;
pub mod tree;

// Re-export handler functions for use in routing
pub use page_order::edit as page_order_edit;
pub use page_order::get as page_order_get;
pub use page_order::put as page_order_put;

pub use tree::get as tree_get;
