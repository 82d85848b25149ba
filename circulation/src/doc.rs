//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: All HTTP endpoints from the inbound layer (copies, lending,
//!   health)
//! - **Schemas**: The shared error envelope plus the request and response
//!   bodies of the copies handlers
//! - **Security**: The forwarded-identity header scheme set by the gateway
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::AdminCopyStatus;
use crate::domain::{ActivityKind, CopyStatusKind, Error, ErrorCode, Role};
use crate::inbound::http::copies::{
    ActivityBody, CancelReservationBody, CopyBody, IssueCopyBody, IssueCopyResponseBody,
    ListActivityBody, ListCopiesBody, PayFineBody, PayFineResponseBody, RegisterCopyBody,
    ReserveCopyBody, ReturnCopyBody, SetStatusBody, SetStatusResponseBody,
};

/// Enrich the generated document with the forwarded-identity security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "ForwardedIdentity",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "X-User-Id",
                "Caller identity forwarded by the authenticating gateway. \
                 X-User-Id carries the caller's UUID and the companion \
                 X-User-Role header carries their role.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Circulation API",
        description = "HTTP interface for copy registration, lending lifecycle \
                       transitions, fine settlement, and health probes.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("ForwardedIdentity" = [])),
    paths(
        crate::inbound::http::copies::register_copy,
        crate::inbound::http::copies::list_copies,
        crate::inbound::http::copies::get_copy,
        crate::inbound::http::copies::list_copy_activity,
        crate::inbound::http::copies::reserve_copy,
        crate::inbound::http::copies::cancel_reservation,
        crate::inbound::http::copies::issue_copy,
        crate::inbound::http::copies::return_copy,
        crate::inbound::http::copies::pay_fine,
        crate::inbound::http::copies::set_copy_status,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        CopyStatusKind,
        ActivityKind,
        AdminCopyStatus,
        RegisterCopyBody,
        CopyBody,
        ListCopiesBody,
        ActivityBody,
        ListActivityBody,
        ReserveCopyBody,
        CancelReservationBody,
        IssueCopyBody,
        IssueCopyResponseBody,
        ReturnCopyBody,
        PayFineBody,
        PayFineResponseBody,
        SetStatusBody,
        SetStatusResponseBody,
    )),
    tags(
        (name = "copies", description = "Registration and inspection of copies"),
        (name = "lending", description = "Lending lifecycle transitions and fines"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI document structure.

    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn openapi_registers_every_lifecycle_path() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/v1/copies",
            "/api/v1/copies/{id}",
            "/api/v1/copies/{id}/activity",
            "/api/v1/copies/{id}/reserve",
            "/api/v1/copies/{id}/cancel-reservation",
            "/api/v1/copies/{id}/issue",
            "/api/v1/copies/{id}/return",
            "/api/v1/copies/{id}/pay-fine",
            "/api/v1/copies/{id}/status",
            "/health/ready",
            "/health/live",
        ] {
            assert!(paths.contains_key(path), "document should expose {path}");
        }
    }
}
