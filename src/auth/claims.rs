use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload carried by every bearer token. Email and name are
/// denormalized so "current user" reads never touch the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
