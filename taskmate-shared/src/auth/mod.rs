/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: session token issue and validation
///
/// Authorization (who may touch which task) is not here; it lives in
/// [`scope`](crate::scope), keyed by the context a token resolves to.

pub mod password;
pub mod jwt;
