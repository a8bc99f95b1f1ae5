//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Create a client from a configuration
//! - Make typed GET and POST requests
//! - Reuse a call with `api_call`
//! - Register a post-process hook
//! - Access response data and metadata
//!
//! Run with: `cargo run --example basic_call`

use apiclient::{Client, ClientConfig, Error, RequestBody, RequestOptions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("apiclient=debug,basic_call=info")
        .init();

    // A client for the JSONPlaceholder API
    let config = ClientConfig::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .retries(3)
        .timeout(Duration::from_secs(10))
        .backoff(Duration::from_millis(500))
        .build()?;
    let mut client = Client::new(config)?;

    println!("=== GET Request Example ===");
    let response = client.get::<Post>("/posts/1").await?;

    if let Some(post) = response.data() {
        println!("Post ID: {}", post.id);
        println!("Title: {}", post.title);
        println!("Body: {}", post.body);
        println!("Author: {}", post.user_id);
    }
    println!("Request latency: {:?}", response.latency);
    println!("Status code: {}", response.status);
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let response = client
        .post::<Post>("/posts", RequestBody::json(&new_post)?)
        .await?;

    if let Some(post) = response.data() {
        println!("Created post ID: {}", post.id);
        println!("Title: {}", post.title);
    }
    println!();

    println!("=== Reusable Call Example ===");
    {
        let posts_by_user = client.api_call::<Vec<Post>>("/posts", "get");
        for user_id in ["1", "2"] {
            let options = RequestOptions::new().with_query_param("userId", user_id);
            let response = posts_by_user(options).await?;
            if let Some(posts) = response.data() {
                println!("User {} wrote {} posts", user_id, posts.len());
            }
        }
    }
    println!();

    println!("=== Post-process Hook Example ===");
    client.set_post_process(Some(std::sync::Arc::new(|body: Value| {
        json!({ "title": body["title"], "length": body["body"].as_str().map(str::len) })
    })));

    let response = client.get::<Post>("/posts/1").await?;
    println!("Summary: {:?}", response.data.processed());
    println!();

    println!("=== Accessing Response Metadata ===");
    println!("Raw response length: {} bytes", response.raw_body.len());
    println!("Content-Type: {:?}", response.header("content-type"));
    println!("Attempts: {}", response.attempts);
    println!("Was retried: {}", response.was_retried());

    client.close();
    Ok(())
}
