//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the course search API to `openapi.json`,
//! or to the path given as the first argument.

use api_lib::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    std::fs::write(&target, ApiDoc::openapi().to_pretty_json()?)?;
    println!("OpenAPI document written to {}", target.display());
    Ok(())
}
