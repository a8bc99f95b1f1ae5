//! Blocking client example, configured from the environment.
//!
//! Set `API_BASE_URL` in the environment or a `.env` file (and optionally
//! `API_RETRIES`, `API_TIMEOUT`, `API_AUTH_TYPE`, `API_AUTH_CREDENTIALS`),
//! or let the example fall back to JSONPlaceholder.
//!
//! Run with: `cargo run --example blocking_call`

use apiclient::blocking::Client;
use apiclient::{ClientConfig, Error};
use serde_json::Value;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("apiclient=debug,blocking_call=info")
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("No usable API_* environment ({}), using defaults", e);
            ClientConfig::builder()
                .base_url("https://jsonplaceholder.typicode.com")?
                .build()?
        }
    };
    println!("Config: {:?}", config);

    let client = Client::new(config)?;

    println!("=== GET ===");
    let response = client.get::<Value>("/todos/1")?;
    println!("Data: {:?}", response.data);
    println!("Latency: {:?}, attempts: {}", response.latency, response.attempts);

    println!("=== HEAD ===");
    let head = client.head("/todos/1")?;
    println!("Status: {}", head.status);
    println!("Content-Type: {:?}", head.header("content-type"));

    println!("=== Error Handling ===");
    match client.get::<Value>("/this-does-not-exist") {
        Ok(response) => println!("Unexpected success: {:?}", response.data),
        Err(Error::HttpStatus { status, .. }) => println!("HTTP error: {}", status),
        Err(e) => println!("Other error: {}", e),
    }

    client.close();
    match client.get::<Value>("/todos/1") {
        Err(Error::Closed) => println!("Client closed"),
        other => println!("Unexpected: {:?}", other.map(|r| r.status)),
    }

    Ok(())
}
