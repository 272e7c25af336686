use crate::models::ExifTags;
use std::path::Path;

/// Decodes EXIF tags from image bytes. Returns `None` when the container has
/// no EXIF block, decoding fails, or no tag was found.
pub fn read_tags(bytes: &[u8]) -> Option<ExifTags> {
    decode(&mut std::io::Cursor::new(bytes))
}

/// Same as [`read_tags`], reading the container straight from disk so only
/// the EXIF segment is buffered.
pub fn read_file_tags(path: &Path) -> Option<ExifTags> {
    match std::fs::File::open(path) {
        Ok(file) => decode(&mut std::io::BufReader::new(file)),
        Err(e) => {
            tracing::debug!("cannot open {:?} for EXIF: {}", path, e);
            None
        }
    }
}

#[cfg(feature = "exif")]
fn decode<R: std::io::BufRead + std::io::Seek>(reader: &mut R) -> Option<ExifTags> {
    let data = match exif::Reader::new().read_from_container(reader) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!("no usable EXIF data: {}", e);
            return None;
        }
    };
    let mut tags = ExifTags::new();
    for f in data.fields() {
        let key = if f.ifd_num == exif::In::PRIMARY {
            f.tag.to_string()
        } else {
            format!("{} ({})", f.tag, f.ifd_num)
        };
        tags.insert(key, f.display_value().with_unit(&data).to_string());
    }
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

#[cfg(not(feature = "exif"))]
fn decode<R: std::io::BufRead + std::io::Seek>(_reader: &mut R) -> Option<ExifTags> {
    None
}

/// Little-endian TIFF with a single IFD holding one ASCII `Make` entry.
#[cfg(all(test, feature = "exif"))]
pub(crate) fn minimal_tiff_with_make(make: &str) -> Vec<u8> {
    let mut value = make.as_bytes().to_vec();
    value.push(0);
    let count = value.len() as u32;
    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());
    // IFD0: one entry
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0x010Fu16.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    let value_offset = 8 + 2 + 12 + 4;
    if count <= 4 {
        let mut inline = value.clone();
        inline.resize(4, 0);
        out.extend_from_slice(&inline);
    } else {
        out.extend_from_slice(&(value_offset as u32).to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    if count > 4 {
        out.extend_from_slice(&value);
    }
    out
}
