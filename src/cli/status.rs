//! Status command - report index artifacts and document count

use clap::Args;

use crate::config::Config;
use crate::index::{IndexStore, MetadataRegistry};

use super::StorageArgs;

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub storage: StorageArgs,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let config = Config::load();
    let storage = args.storage.resolve(&config);

    let store = IndexStore::new(&storage.index_dir());

    println!("Index directory: {}", storage.index_dir().display());

    if !store.exists() {
        println!("Status: not built");
        println!("\nGet started:");
        println!("   casevec build --corpus {}", storage.corpus_dir().display());
        return Ok(());
    }

    let registry = MetadataRegistry::load(store.registry_file())?;
    let index_size = std::fs::metadata(store.index_file())?.len();

    if registry.is_empty() {
        println!("Status: built (empty)");
    } else {
        println!("Status: built");
    }
    println!("  Documents: {}", registry.len());
    println!(
        "  Index file: {} [{:.1} KB]",
        store.index_file().display(),
        index_size as f64 / 1024.0
    );
    println!("  Registry file: {}", store.registry_file().display());

    Ok(())
}
