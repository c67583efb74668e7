use std::path::Path;

use super::LoadError;

/// Reads a raw ROM image from disk. Size checks happen on load.
pub fn read_rom(path: impl AsRef<Path>) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    let rom = std::fs::read(path).map_err(|source| LoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Read {} bytes from {}", rom.len(), path.display());
    Ok(rom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_unreadable() {
        let err = read_rom("/nonexistent/definitely/not/a.ch8").unwrap_err();
        assert!(matches!(err, LoadError::Unreadable { .. }));
        assert!(err.to_string().contains("a.ch8"));
    }

    #[test]
    fn reads_bytes_verbatim() {
        let path = std::env::temp_dir().join(format!("chip8-rom-{}.ch8", std::process::id()));
        std::fs::write(&path, [0x00, 0xE0, 0x12, 0x00]).unwrap();

        let rom = read_rom(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(rom, vec![0x00, 0xE0, 0x12, 0x00]);
    }
}
