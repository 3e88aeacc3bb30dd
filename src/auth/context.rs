use super::verifier::AuthUser;
use uuid::Uuid;

/// Authenticated user context
/// Built once the auth service has accepted the bearer token
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID (from the auth service user record)
    pub user_id: Uuid,

    /// User email if available
    pub email: Option<String>,

    /// User role if specified
    pub role: Option<String>,
}

impl AuthContext {
    pub fn from_user(user: AuthUser) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&user.id).map_err(|_| "Invalid user ID from auth service")?;

        Ok(Self {
            user_id,
            email: user.email,
            role: user.role,
        })
    }

    /// Key under which this user's session state is stored
    pub fn session_key(&self) -> String {
        self.user_id.to_string()
    }
}
