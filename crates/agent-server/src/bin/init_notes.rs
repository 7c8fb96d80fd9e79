//! Note Collection Setup
//!
//! Drops and recreates the `Note` collection in Weaviate, then stores one
//! example note so searches have something to find.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use note_tools::{NewNote, NoteStore, WeaviateStore, NOTE_COLLECTION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = WeaviateStore::from_env()?;
    if !store.health_check().await {
        anyhow::bail!("Weaviate is not ready; check WEAVIATE_URL");
    }

    store.reset_collection().await?;

    let id = store.insert(NewNote::example()).await?;
    tracing::info!(collection = NOTE_COLLECTION, %id, "Seeded example note");

    Ok(())
}
