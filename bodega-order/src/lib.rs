pub mod memory;
pub mod models;
pub mod store;
pub mod workflow;

pub use memory::MemoryOrders;
pub use models::{Order, OrderLine, OrderStatus};
pub use store::OrderStore;
pub use workflow::{OrderWorkflow, PlaceOrder, RequestedLine, WorkflowError};
