//! Protection lookup example.
//!
//! Run with: cargo run --example protections -- "Main Page" Coffee
//!
//! Requires .env file with:
//! - WAPITI_API_URL (e.g. https://en.wikipedia.org/w/api.php)

use std::env;

use wapiti_lib::api::operations::get_protections;
use wapiti_lib::model::FieldValues;
use wapiti_lib::transport::HttpTransport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let url = env::var("WAPITI_API_URL").expect("WAPITI_API_URL not set");
    let titles: Vec<String> = env::args().skip(1).collect();
    if titles.is_empty() {
        eprintln!("usage: protections <title>...");
        return Ok(());
    }

    let transport = HttpTransport::builder()
        .url(url)
        .user_agent("wapiti-lib-example/0.1")
        .build()?;

    let pages = get_protections()?
        .execute(&transport, &FieldValues::new().set("titles", titles))
        .await?;

    for page in pages {
        let title = page.title.as_deref().unwrap_or("?");
        if page.is_unprotected() {
            println!("{} ({}): unprotected", title, page.page_id);
            continue;
        }
        println!("{} ({}):", title, page.page_id);
        for protection in &page.protections {
            println!(
                "  {} = {} (expiry: {:?}{})",
                protection.kind,
                protection.level,
                protection.expiry,
                if protection.cascade { ", cascading" } else { "" }
            );
        }
    }

    Ok(())
}
