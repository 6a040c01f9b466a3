//! Presence indexes: mark, check, list, purge.

use pathdb_core::Database;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("pathdb-index");
    println!("using store: {}", path.display());

    let db = Database::open(&path)?;

    let key1 = db.index("index.key1");
    key1.purge()?;
    key1.mark("v1")?;
    key1.mark("v2")?;
    db.index("index.key2").mark("v3")?;

    println!("\nkey1 members: {:?}", key1.list()?);
    println!("key1 has v1:  {}", key1.check("v1"));

    key1.clear("v1")?;
    println!("after clear:  {:?}", key1.list()?);

    println!("\nindexes under root: {:?}", db.root().list_indexes()?);

    key1.purge()?;
    db.index("index.key2").purge()?;

    Ok(())
}
