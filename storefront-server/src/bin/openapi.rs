//! Prints the OpenAPI document of storefront-server to stdout.

use anyhow::Result;
use storefront_server::docs::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    println!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
