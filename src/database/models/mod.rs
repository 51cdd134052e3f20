pub mod notification;
pub mod order;
pub mod plan;
pub mod product;
pub mod tenant;
pub mod ticket;
pub mod user;

pub use notification::{NewNotification, Notification};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderSummary, OrderWithItems};
pub use plan::{NewPlan, PlanUpdate, PricePlan};
pub use product::{
    InventoryHistory, NewProduct, NewVariant, Product, ProductUpdate, ProductVariant, ProductWithVariants,
};
pub use tenant::{NewTenant, Tenant, TenantUpdate};
pub use ticket::{NewTicket, NewTicketMessage, Ticket, TicketMessage, TicketThread};
pub use user::{NewUser, User, UserUpdate};
