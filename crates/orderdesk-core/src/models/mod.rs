//! Data models for the order-management backend.
//!
//! This module contains the request and response bodies exchanged with the
//! REST API:
//!
//! - `User`: accounts, including the signed-in identity
//! - `Customer`: customers with status history and notes
//! - `Order`, `OrderItem`, `Payment`: orders and their server-computed totals
//! - `Product`, `StockMovement`: catalogue and inventory ledger
//! - Report types: `DashboardReport`, `CustomerRevenueReport`, `StockReport`

pub mod customer;
pub mod order;
pub mod product;
pub mod report;
pub mod stock;
pub mod timestamp;
pub mod user;

pub use customer::{Customer, CustomerCreate, CustomerNote, CustomerStatus, CustomerUpdate, StatusCreate};
pub use order::{
    CancelRequest, NoteCreate, Order, OrderCreate, OrderItem, OrderItemCreate, OrderNote,
    OrderFilter, OrderStatus, Payment, PaymentCreate, PaymentType,
};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use report::{CustomerRevenueReport, DashboardReport, StockReport};
pub use stock::{MovementType, StockMovement, StockMovementCreate};
pub use user::{User, UserCreate, UserUpdate};
