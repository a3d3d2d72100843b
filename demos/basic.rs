use std::time::Duration;

use retrying_http::{Client, ClientOptions, Context, HeaderMap, Params};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("DEMO_BASE_URL").unwrap_or_else(|_| "https://httpbin.org".to_owned());

    let client = Client::with_options(ClientOptions {
        max_retries: 2,
        timeout_ms: 5_000,
        ..ClientOptions::from_env()?
    })?;

    let response = client
        .get(
            &format!("{base_url}/get"),
            [("family", "ohana")],
            &HeaderMap::new(),
        )
        .await?;
    println!("GET {} -> {}", response.status(), response.text()?);

    let response = client
        .post_json(
            &format!("{base_url}/post"),
            [("ohana", "family")],
            &HeaderMap::new(),
        )
        .await?;
    println!("POST json -> {}", response.status());

    let mut form = Params::new();
    form.add("ohana", "family").add("ohana", "friends");
    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    let response = client
        .post_form_with_ctx(&ctx, &format!("{base_url}/post"), form, &HeaderMap::new())
        .await?;
    println!("POST form -> {}", response.status());

    Ok(())
}
