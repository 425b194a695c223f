//! Print the OpenAPI document as JSON.

use mentorship::ApiDoc;
use utoipa::OpenApi;

#[expect(clippy::print_stdout, reason = "the document is the program's output")]
fn main() -> Result<(), serde_json::Error> {
    println!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
