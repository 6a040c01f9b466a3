//! Collection navigation and subtree copy/move/purge.

use pathdb_core::Database;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("pathdb-collections");
    println!("using store: {}", path.display());

    let db = Database::open(&path)?;
    let root = db.root();
    root.purge("a").ok();
    root.purge("b").ok();
    root.purge("c").ok();

    for key in ["a.1.11", "a.1.12", "a.2.21", "b.1.11", "c.1.11"] {
        db.set(key, &[0, 1, 2, 3])?;
    }

    println!("\nchildren of root: {:?}", root.list_children()?);
    println!("children of a:    {:?}", root.child("a").list_children()?);

    root.copy("a", "c.1")?;
    println!("\nafter copy, c.1 holds {:?}", root.child("c.1").list_children()?);

    root.move_to("c.1.a", "b")?;
    println!("after move, b holds  {:?}", root.child("b").list_children()?);

    root.purge("b.a")?;
    println!("after purge, b holds {:?}", root.child("b").list_children()?);

    Ok(())
}
