//! Compresses the reference database into `OUT_DIR`.

use std::io::Result;
use std::path::PathBuf;

const DATABASE_SOURCE: &str = "resources/reference.csv";

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed={DATABASE_SOURCE}");

    let text = std::fs::read(DATABASE_SOURCE)?;
    let compressed = lz4_flex::compress_prepend_size(&text);

    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").unwrap_or_default());
    std::fs::write(out_dir.join("reference.csv.lz4"), compressed)?;
    Ok(())
}
