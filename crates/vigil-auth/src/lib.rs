//! vigil-auth
//!
//! Password hashing, JWT issue/validation and role permissions.

pub mod error;
pub mod jwt;
pub mod password;
pub mod permissions;

pub use error::AuthError;
pub use jwt::{Claims, JwtKeys, TokenKind};
pub use permissions::{Permission, RoleExt};
