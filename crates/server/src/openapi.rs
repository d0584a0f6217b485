use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorResponse { pub error: String }

#[derive(ToSchema)]
pub struct SignUpRequest { pub email: String, pub password: String, pub first_name: String, pub last_name: String }

#[derive(ToSchema)]
pub struct SignUpResponse { pub first_name: String, pub last_name: String, pub email: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginResponse { pub token: String }

#[derive(ToSchema)]
pub struct MessageResponse { pub message: String }

#[derive(ToSchema)]
pub struct ProfileResponse { pub id: Uuid, pub email: String, pub first_name: String, pub last_name: String }

#[derive(ToSchema)]
pub struct HistoryResponse {
    pub id: Uuid,
    pub date: chrono::DateTime<chrono::Utc>,
    pub activity: String,
    pub customer_id: Uuid,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::history,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            SignUpRequest,
            SignUpResponse,
            LoginRequest,
            LoginResponse,
            MessageResponse,
            ProfileResponse,
            HistoryResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth")
    )
)]
pub struct ApiDoc;
