//! Client side of the auxiliary-port byte relay: streaming a file up,
//! streaming a download to disk, and the SHA-256 integrity check.

use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use parley_proto::payload::TransferRole;

use crate::config::Config;

const COPY_BUF: usize = 64 * 1024;

/// Streaming SHA-256 of a file, hex-encoded lowercase.
pub async fn checksum_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; COPY_BUF];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Connects to the relay as the sending half: 37-byte header, then the file
/// bytes, then a half-close so the relay sees EOF.
pub async fn send_file(config: &Config, uuid: &str, path: &Path) -> io::Result<()> {
    let mut stream = connect(config, uuid, TransferRole::Sender).await?;

    let mut file = File::open(path).await?;
    let sent = tokio::io::copy(&mut file, &mut stream).await?;
    stream.shutdown().await?;

    println!("Upload complete ({sent} bytes sent).");
    Ok(())
}

/// Connects to the relay as the receiving half and streams the download to
/// the configured directory, hashing as it writes. A checksum mismatch is
/// reported but the file stays on disk.
pub async fn receive_file(
    config: &Config,
    uuid: &str,
    filename: &str,
    expected_checksum: &str,
) -> io::Result<()> {
    let mut stream = connect(config, uuid, TransferRole::Receiver).await?;

    fs::create_dir_all(&config.download_dir).await?;
    let dest = unique_destination(&config.download_dir, filename).await?;

    let mut out = File::create(&dest).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; COPY_BUF];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        out.write_all(&buf[..n]).await?;
    }
    out.flush().await?;

    let actual = hex::encode(hasher.finalize());
    if actual == expected_checksum {
        println!("File download complete. Saved to {}", dest.display());
    } else {
        println!("Checksum mismatch for {}!", dest.display());
        println!("  expected: {expected_checksum}");
        println!("  actual:   {actual}");
    }
    Ok(())
}

async fn connect(config: &Config, uuid: &str, role: TransferRole) -> io::Result<TcpStream> {
    let mut stream =
        TcpStream::connect((config.server_host.as_str(), config.relay_port)).await?;
    stream.write_all(uuid.as_bytes()).await?;
    stream.write_all(&[role.as_byte()]).await?;
    Ok(stream)
}

/// First of `name`, `name(1)`, `name(2)`, … that does not exist in `dir`.
/// Only the final path component of `filename` is honored.
async fn unique_destination(dir: &Path, filename: &str) -> io::Result<PathBuf> {
    let filename = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());

    let mut candidate = dir.join(&filename);
    let mut count = 0u32;
    while fs::try_exists(&candidate).await? {
        count += 1;
        candidate = dir.join(numbered_filename(&filename, count));
    }
    Ok(candidate)
}

/// `notes.pdf` → `notes(2).pdf`; extension-less names get the plain suffix.
fn numbered_filename(filename: &str, count: u32) -> String {
    match filename.rfind('.') {
        Some(dot) if dot > 0 && dot < filename.len() - 1 => {
            format!("{}({}){}", &filename[..dot], count, &filename[dot..])
        }
        _ => format!("{filename}({count})"),
    }
}
