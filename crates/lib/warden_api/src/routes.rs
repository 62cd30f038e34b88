//! Route paths served by [`crate::router`].

pub const GET_HEALTH: &str = "/health";
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const POST_AUTH_REGISTER: &str = "/api/auth/register";
pub const GET_AUTH_VERIFY: &str = "/api/auth/verify";
pub const POST_AUTH_REFRESH: &str = "/api/auth/refresh";
pub const GET_AUTH_ME: &str = "/api/auth/me";
pub const GET_USERS_ID: &str = "/api/users/{id}";
