//! Structured JSON records with the `Buffer` payload type.

use pathdb_core::{Buffer, Database, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("pathdb-buffers");
    println!("using store: {}", path.display());

    let db = Database::open(&path)?;

    let mut record = Buffer::new();
    record.insert("name".to_string(), Value::from("gateway-1"));
    record.insert("port".to_string(), Value::from(8443));
    record.insert("tags".to_string(), Value::from(vec!["edge", "prod"]));

    db.set_buffer("devices.gw1", &record)?;

    let loaded = db.get_buffer("devices.gw1")?;
    println!("name = {:?}", loaded.get("name"));
    println!("port = {:?}", loaded.get("port"));

    db.set_buffer_list("devices.all", &[record.clone(), record])?;
    println!("stored {} records", db.get_buffer_list("devices.all")?.len());

    Ok(())
}
