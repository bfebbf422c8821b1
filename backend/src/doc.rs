//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler under `/api/v1`, the health probes,
//! the domain error wrappers from [`crate::inbound::http::schemas`] and the
//! bearer token security scheme. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` prints it for external tooling.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::{accounts, health, shipments};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Access token issued by POST /api/v1/{sellers|partners}/token.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "shiptrack API",
        description = "Shipment placement, partner assignment and delivery tracking.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        accounts::seller_signup,
        accounts::seller_login,
        accounts::seller_logout,
        accounts::seller_verify,
        accounts::seller_forgot_password,
        accounts::seller_reset_password,
        accounts::partner_signup,
        accounts::partner_login,
        accounts::partner_logout,
        accounts::partner_verify,
        accounts::partner_forgot_password,
        accounts::partner_reset_password,
        accounts::update_partner,
        shipments::create_shipment,
        shipments::get_shipment,
        shipments::update_shipment,
        shipments::cancel_shipment,
        shipments::delete_shipment,
        health::ready,
        health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "sellers", description = "Seller accounts"),
        (name = "partners", description = "Delivery partner accounts"),
        (name = "shipments", description = "Shipment lifecycle and timeline"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

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

    #[rstest]
    fn error_schema_is_registered_with_wire_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[rstest]
    #[case("/api/v1/sellers/signup")]
    #[case("/api/v1/partners/me")]
    #[case("/api/v1/shipments")]
    #[case("/api/v1/shipments/{id}")]
    #[case("/api/v1/shipments/{id}/cancel")]
    #[case("/health/ready")]
    fn paths_are_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    fn response_description(path: &str, status: &str) -> String {
        let doc = ApiDoc::openapi();
        let operation = doc.paths.paths[path].patch.clone().expect("patch operation");
        match operation.responses.responses.get(status) {
            Some(RefOr::T(response)) => response.description.clone(),
            _ => panic!("missing {status} response for {path}"),
        }
    }

    #[rstest]
    fn wrong_delivery_code_is_documented_as_unauthorized() {
        let path = "/api/v1/shipments/{id}";
        assert!(response_description(path, "401").contains("wrong verification code"));
        assert!(!response_description(path, "400").contains("code"));
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerToken"));
    }
}
