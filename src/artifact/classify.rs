//! Two-predicate artifact classification
//!
//! A file is accepted only when both the extension check and the content sniff
//! agree. Thin-LTO builds emit `.o` files that are really bitcode; plain ELF
//! objects with the same extension must be rejected, as must stray `.bc` files
//! that are not bitcode at all.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Raw LLVM bitcode magic: 'B' 'C' 0xC0 0xDE
const BITCODE_MAGIC: [u8; 4] = [0x42, 0x43, 0xC0, 0xDE];

/// Bitcode wrapper magic (little-endian 0x0B17C0DE)
const WRAPPER_MAGIC: [u8; 4] = [0xDE, 0xC0, 0x17, 0x0B];

/// Closed classification of a build output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// A native-side object file carrying bitcode (C origin, thin-LTO `.o`)
    NativeObject,
    /// A Rust-side intermediate representation module (`.bc`)
    IrModule,
    /// Anything else in the build tree
    Irrelevant,
}

/// Classifies a file by extension and binary signature together
///
/// Unreadable files classify as [`ArtifactKind::Irrelevant`]; classification
/// never fails and has no side effects.
pub fn classify(path: &Path) -> ArtifactKind {
    let candidate = match path.extension().and_then(|e| e.to_str()) {
        Some("o") => ArtifactKind::NativeObject,
        Some("bc") => ArtifactKind::IrModule,
        _ => return ArtifactKind::Irrelevant,
    };

    if is_bitcode(path) {
        candidate
    } else {
        ArtifactKind::Irrelevant
    }
}

/// Content sniff: does the file start with an LLVM bitcode signature?
fn is_bitcode(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    match File::open(path).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) => magic == BITCODE_MAGIC || magic == WRAPPER_MAGIC,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_bitcode_object_is_native() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "ffi.o", &BITCODE_MAGIC);
        assert_eq!(classify(&path), ArtifactKind::NativeObject);
    }

    #[test]
    fn test_bitcode_module_is_ir() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "crate-hash.bc", &BITCODE_MAGIC);
        assert_eq!(classify(&path), ArtifactKind::IrModule);
    }

    #[test]
    fn test_wrapper_magic_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "wrapped.bc", &WRAPPER_MAGIC);
        assert_eq!(classify(&path), ArtifactKind::IrModule);
    }

    #[test]
    fn test_elf_object_rejected() {
        // Right extension, wrong signature
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "native.o", &[0x7F, b'E', b'L', b'F']);
        assert_eq!(classify(&path), ArtifactKind::Irrelevant);
    }

    #[test]
    fn test_bitcode_with_other_extension_rejected() {
        // Right signature, wrong extension
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "module.rlib", &BITCODE_MAGIC);
        assert_eq!(classify(&path), ArtifactKind::Irrelevant);
    }

    #[test]
    fn test_short_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "tiny.bc", &[0x42, 0x43]);
        assert_eq!(classify(&path), ArtifactKind::Irrelevant);
    }

    #[test]
    fn test_missing_file_rejected() {
        assert_eq!(
            classify(Path::new("/nonexistent/ghost.bc")),
            ArtifactKind::Irrelevant
        );
    }

    #[test]
    fn test_no_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "noext", &BITCODE_MAGIC);
        assert_eq!(classify(&path), ArtifactKind::Irrelevant);
    }
}
