//! Encrypted records: every payload is AES-256-GCM ciphertext on disk.

use pathdb_core::Database;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = std::env::temp_dir().join("pathdb-encrypted");
    println!("using store: {}", path.display());

    let db = Database::open(&path)?;
    db.init_aes256("s3cret-passphrase")?;

    db.set_secure("devices.gw1.token", b"charlie-7")?;
    println!(
        "devices.gw1.token = {}",
        String::from_utf8_lossy(&db.get_secure("devices.gw1.token")?)
    );

    // The raw on-disk bytes are ciphertext; reading them without the cipher
    // yields opaque data.
    let raw = db.get("devices.gw1.token")?;
    println!("on-disk bytes: {} bytes of ciphertext", raw.len());

    Ok(())
}
