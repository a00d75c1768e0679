// JWT token creation and verification
// Bearer tokens carry the owner id every swarm is tagged with

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (owner id)
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Owner ID (subject)
    pub sub: Uuid,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
}

/// Creates a JWT token for an owner
///
/// # Arguments
/// * `owner_id` - The owner's ID to include in the token
/// * `secret` - The secret key for signing
/// * `ttl_hours` - Token lifetime in hours
///
/// # Token Properties
/// - Signed with HS256 algorithm
/// - Contains owner_id in 'sub' claim
///
/// # Example
/// ```
/// use agentswarm_api::auth::jwt::create_token;
/// use uuid::Uuid;
///
/// let owner_id = Uuid::new_v4();
/// let token = create_token(owner_id, "your-secret-key", 8).expect("valid token");
/// assert!(!token.is_empty());
/// ```
pub fn create_token(owner_id: Uuid, secret: &str, ttl_hours: i64) -> Result<String, String> {
    let expiry = Utc::now() + Duration::hours(ttl_hours);
    let claims = Claims {
        sub: owner_id,
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes a JWT token
///
/// # Returns
/// * `Ok(Claims)` - The decoded claims if token is valid
/// * `Err(String)` - If token is invalid or expired
///
/// # Example
/// ```
/// use agentswarm_api::auth::jwt::{create_token, verify_token};
/// use uuid::Uuid;
///
/// let owner_id = Uuid::new_v4();
/// let token = create_token(owner_id, "your-secret-key", 8).unwrap();
///
/// let claims = verify_token(&token, "your-secret-key").expect("valid token");
/// assert_eq!(claims.sub, owner_id);
/// ```
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
