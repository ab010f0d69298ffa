use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leadbook API",
        description = "Lead management backend. Leads are private to the user who created them; \
                       every lead endpoint requires a bearer access token."
    ),
    paths(
        crate::auth::register,
        crate::auth::login,
        crate::auth::refresh,
        crate::auth::profile,
        crate::leads::list_leads,
        crate::leads::create_lead,
        crate::leads::get_lead,
        crate::leads::update_lead,
        crate::leads::patch_lead,
        crate::leads::delete_lead,
    ),
    components(schemas(
        common::RegisterPayload,
        common::RegisterResponse,
        common::Credentials,
        common::TokenPair,
        common::RefreshPayload,
        common::UserProfile,
        common::LeadDto,
        common::LeadInput,
        common::LeadStatus,
        common::LeadPriority,
    )),
    tags(
        (name = "Auth", description = "Registration, tokens and the current user's profile."),
        (name = "Leads", description = "CRUD on the caller's own leads."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
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
