use crate::config::OutputSettings;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Gzip when the output path ends in `.gz`.
    Auto,
    Always,
    Never,
}

impl Compression {
    pub fn applies_to(self, path: &str) -> bool {
        match self {
            Self::Auto => path.ends_with(".gz"),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Decompresses gzip content, passes anything else through.
pub fn gunzip_if_needed(data: Vec<u8>) -> Result<Vec<u8>> {
    if !is_gzip(&data) {
        return Ok(data);
    }

    let mut decoder = GzDecoder::new(data.as_slice());
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    tracing::debug!(
        "Decompressed gzip content: {} -> {} bytes",
        data.len(),
        decompressed.len()
    );
    Ok(decompressed)
}

/// Writes the guide (and the optional gzip copy); returns the main output path.
pub async fn persist<S: Storage>(
    storage: &S,
    settings: &OutputSettings,
    xml: &[u8],
) -> Result<String> {
    let compressed = settings.compression.applies_to(&settings.path);

    if compressed {
        let data = gzip(xml)?;
        tracing::debug!("Writing {} gzip bytes ({} raw)", data.len(), xml.len());
        storage.write_file(&settings.path, &data).await?;
    } else {
        tracing::debug!("Writing {} bytes", xml.len());
        storage.write_file(&settings.path, xml).await?;

        if settings.gzip_copy {
            let copy_path = format!("{}.gz", settings.path);
            storage.write_file(&copy_path, &gzip(xml)?).await?;
            tracing::info!("📦 Gzip copy written to {}", copy_path);
        }
    }

    tracing::info!("💾 Wrote {} ({} bytes of XML)", settings.path, xml.len());
    Ok(settings.path.clone())
}
