/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id credential hashing and verification
/// - [`audit`]: Security audit hook for denied and destructive operations
///
/// Session tokens live with their model in [`crate::models::session`].
///
/// # Example
///
/// ```
/// use othello_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod audit;
pub mod password;
