//! # Retrieval Demo
//!
//! Ingests a small corpus into an in-memory vector store and answers a query
//! with similarity or MMR search through a retriever.
//!
//! Uses `HashingEmbeddingProvider` and `InMemoryIndex`, so it runs with
//! **zero API keys**.
//!
//! Run: `cargo run -p adk-vectorstore-demos --bin retrieval -- "memory safety" --mode mmr`

use std::sync::Arc;

use adk_vectorstore::{
    Document, EmbeddingVectorStore, HashingEmbeddingProvider, InMemoryIndex, MetadataFilter,
    Retriever, SearchOptions, SearchParams, SearchType, VectorStoreConfig, VectorStoreExt,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "retrieval", about = "Similarity and MMR retrieval over a demo corpus")]
struct Args {
    /// The query text.
    #[arg(default_value = "memory safety without a garbage collector")]
    query: String,

    /// Search type: `similarity` or `mmr`.
    #[arg(long, default_value = "similarity")]
    mode: SearchType,

    /// Number of documents to return.
    #[arg(short, long, default_value_t = 3)]
    k: usize,

    /// MMR candidate window.
    #[arg(long, default_value_t = 8)]
    fetch_k: usize,

    /// MMR relevance/diversity trade-off in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    lambda: f32,

    /// Drop similarity results below this relevance score.
    #[arg(long)]
    threshold: Option<f32>,

    /// Only return documents with this `topic`.
    #[arg(long)]
    topic: Option<String>,

    /// Embedding dimensionality.
    #[arg(long, default_value_t = 256)]
    dimensions: usize,

    /// Log filter, overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()?;
    Ok(())
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new(
            "Rust achieves memory safety without a garbage collector through ownership \
             and borrowing.",
        )
        .with_metadata("topic", "rust"),
        Document::new("The Rust borrow checker enforces that references never outlive their data.")
            .with_metadata("topic", "rust"),
        Document::new("Rust ownership rules: each value has one owner, and it is dropped when the owner goes out of scope.")
            .with_metadata("topic", "rust"),
        Document::new("Go uses a concurrent garbage collector to manage heap memory.")
            .with_metadata("topic", "go"),
        Document::new("Java runs on the JVM, whose garbage collector reclaims unreachable objects.")
            .with_metadata("topic", "java"),
        Document::new("Python relies on reference counting plus a cycle-detecting garbage collector.")
            .with_metadata("topic", "python"),
        Document::new("Vector databases store embeddings and answer nearest-neighbor queries.")
            .with_metadata("topic", "retrieval"),
        Document::new("Maximal marginal relevance balances query relevance against redundancy.")
            .with_metadata("topic", "retrieval"),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref())?;

    let config = VectorStoreConfig::builder().batch_size(4).build()?;
    let store = Arc::new(
        EmbeddingVectorStore::builder()
            .config(config)
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(args.dimensions)?))
            .backend(Arc::new(InMemoryIndex::new(args.dimensions)))
            .build()?,
    );

    let documents = corpus();
    let count = store.from_documents(&documents).await?;
    info!(count, "ingested corpus");

    let mut params = SearchParams::builder().k(args.k).fetch_k(args.fetch_k).lambda_mult(args.lambda);
    if let Some(threshold) = args.threshold {
        params = params.score_threshold(threshold);
    }
    if let Some(topic) = &args.topic {
        params = params.filter(MetadataFilter::eq("topic", topic.as_str()));
    }
    let params = params.build()?;

    if args.mode == SearchType::Similarity {
        let options = SearchOptions { filter: params.options.filter.clone(), namespace: None };
        let scored = store.similarity_search_with_relevance_scores(&args.query, args.k, &options).await?;
        println!("Relevance scores for \"{}\":", args.query);
        for result in &scored {
            println!("  [score={:.4}] {}", result.score, result.document.page_content);
        }
    }

    let retriever = store.as_retriever(args.mode).with_params(params);
    let docs = retriever.retrieve(&args.query).await?;

    println!("\n{} results ({}):", docs.len(), args.mode);
    for (i, doc) in docs.iter().enumerate() {
        let topic = doc.metadata.get("topic").and_then(|v| v.as_str()).unwrap_or("-");
        println!("  {}. [{topic}] {}", i + 1, doc.page_content);
    }

    Ok(())
}
