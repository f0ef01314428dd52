//! Print the OpenAPI document as JSON.

use std::io;

use delivery_zones::ApiDoc;
use utoipa::OpenApi;

fn main() -> io::Result<()> {
    let rendered = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(|error| io::Error::other(format!("render OpenAPI document: {error}")))?;
    println!("{rendered}");
    Ok(())
}
