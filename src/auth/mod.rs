//! Authentication and authorization for Homefront
//!
//! Provides:
//! - JWT token generation and validation
//! - Role gates for manager/employee endpoints
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;
pub mod roles;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenValidationResult};
pub use password::{hash_password, verify_password};
pub use roles::{require_role, Role};
