use std::env;
use std::fs;
use std::sync::Arc;

use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use skillit_bids::catalog::{
    InMemoryCatalog, InMemoryDirectory, ItemSummary, UserRole, UserSummary,
};
use skillit_bids::effects::{Effects, InMemoryLedger, InMemoryNotifier};
use skillit_bids::engine::BidEngine;
use skillit_bids::model::{ItemId, ItemRef, UserId};
use skillit_bids::query::BidQueryService;
use skillit_bids::request::Request;
use skillit_bids::store::{BidFilter, BidStore, InMemoryBidStore};
use skillit_bids::Amount;

/// Seed records for the in-memory collaborators, so a scenario file is
/// self-contained: users and items first, then negotiation requests.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Seed {
    User {
        id: UserId,
        display_name: String,
        #[serde(default)]
        avatar: Option<String>,
        role: UserRole,
    },
    Session {
        id: ItemId,
        title: String,
        base_price: Amount,
        owner_id: UserId,
    },
    Content {
        id: ItemId,
        title: String,
        base_price: Amount,
        owner_id: UserId,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Line {
    Seed(Seed),
    Request(Request),
}

fn apply_seed(catalog: &InMemoryCatalog, directory: &InMemoryDirectory, seed: Seed) {
    match seed {
        Seed::User {
            id,
            display_name,
            avatar,
            role,
        } => directory.insert(UserSummary {
            id,
            display_name,
            avatar,
            role,
        }),
        Seed::Session {
            id,
            title,
            base_price,
            owner_id,
        } => catalog.insert(ItemSummary {
            item: ItemRef::Session(id),
            title,
            base_price,
            owner: owner_id,
        }),
        Seed::Content {
            id,
            title,
            base_price,
            owner_id,
        } => catalog.insert(ItemSummary {
            item: ItemRef::Content(id),
            title,
            base_price,
            owner: owner_id,
        }),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .expect("usage: skillit-bids <scenario.jsonl>");

    let store = Arc::new(InMemoryBidStore::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let notifier = Arc::new(InMemoryNotifier::new());

    let engine = BidEngine::new(
        store.clone(),
        catalog.clone(),
        Effects::new(ledger.clone(), notifier),
    );

    let contents = fs::read_to_string(&path).expect("failed to read scenario file");
    let (sender, receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn({
        let catalog = catalog.clone();
        let directory = directory.clone();
        async move {
            for (idx, raw) in contents.lines().enumerate() {
                let line = idx + 1;
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Line>(raw) {
                    Ok(Line::Seed(seed)) => apply_seed(&catalog, &directory, seed),
                    Ok(Line::Request(request)) => match request.into_command() {
                        Ok(command) => sender.send(command).await.unwrap(),
                        Err(e) => warn!(line, "{e}"),
                    },
                    Err(e) => warn!(line, "failed to parse scenario line: {e}"),
                }
            }
        }
    });

    engine.run(ReceiverStream::new(receiver)).await;

    let queries = BidQueryService::new(store.clone(), catalog, directory);
    let bids = store
        .query(&BidFilter::default())
        .await
        .expect("failed to list bids");

    let mut rows = Vec::with_capacity(bids.len());
    for bid in bids {
        let enriched = queries
            .get_by_id(bid.id)
            .await
            .expect("failed to enrich bid")
            .expect("bid disappeared");
        rows.push(format!(
            "{},{},{},{},{}",
            enriched.item_title,
            enriched.student.display_name,
            enriched.bid.status,
            enriched.bid.proposed_price,
            enriched.discount_percent,
        ));
    }
    rows.sort();

    println!("item,student,status,price,discount");
    for row in rows {
        println!("{row}");
    }
    println!("grants,{}", ledger.grants().len());
}
