//! Plain byte records: set, get, overwrite, delete.

use pathdb_core::Database;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("pathdb-simple");
    println!("using store: {}", path.display());

    let db = Database::open(&path)?;

    let keys = ["a.1.11", "a.1.12", "a.2.21", "b.1.11", "c.1.11"];
    for key in keys {
        db.set(key, &[0, 1, 2, 3])?;
    }

    println!("\nreading back:");
    for key in keys {
        println!("{key} = {:?}", db.get(key)?);
    }

    println!("\noverwriting:");
    for key in keys {
        db.set(key, &[10, 11, 12, 13])?;
        println!("{key} = {:?}", db.get(key)?);
    }

    db.delete("c.1.11")?;
    println!("\nc.1.11 exists after delete: {}", db.is_exist("c.1.11"));

    Ok(())
}
