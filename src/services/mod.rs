//! Business operations, one service per resource. Services own no state beyond
//! the shared store handle and can be cloned freely.
pub mod accounts;
pub mod cart;
pub mod catalog;

pub use accounts::{AccountService, AuthSession, LoginRequest, RegisterRequest, UserSummary};
pub use cart::{CartService, ResolvedCart, ResolvedLine};
pub use catalog::CatalogService;
