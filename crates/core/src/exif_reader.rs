use anyhow::{Context, Result};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// `DateTimeOriginal` の生文字列を返す。
///
/// EXIF ブロック自体が無い、またはフィールドが無い場合は `Ok(None)`。
/// ファイルを開けない場合のみエラーになる。
pub fn read_embedded_capture(path: &Path) -> Result<Option<String>> {
    let file = File::open(path)
        .with_context(|| format!("EXIF読み込み対象を開けませんでした: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        Err(exif::Error::Io(err)) => {
            return Err(anyhow::Error::from(err)
                .context(format!("EXIFを読み込めませんでした: {}", path.display())));
        }
        Err(_) => return Ok(None),
    };

    let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) else {
        return Ok(None);
    };

    Ok(ascii_value(&field.value))
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .filter(|v| !v.is_empty()),
        _ => None,
    }
}
