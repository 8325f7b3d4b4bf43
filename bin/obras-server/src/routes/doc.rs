use utoipa::OpenApi;

use crate::routes::{health, obras};

#[derive(OpenApi)]
#[openapi(info(
    title = "obras-server",
    description = "Catalog of literary works with CSV import/export",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(obras::ObrasApi::openapi());
    root
}
