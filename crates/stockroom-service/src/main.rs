//! Service binary entry point.

#![deny(warnings)]

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    stockroom_service::run().await
}
