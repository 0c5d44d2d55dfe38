use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Read a binary file using memory mapping
pub fn read_binary_file_mmap(path: impl AsRef<Path>) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // Safety: The file is not modified while the mmap is active
    unsafe { Mmap::map(&file) }
}

/// Write `chunks` to `path` in order, replacing any existing file.
pub fn write_binary_file(path: impl AsRef<Path>, chunks: &[&[u8]]) -> io::Result<()> {
    let mut file = io::BufWriter::new(File::create(path)?);
    for chunk in chunks {
        file.write_all(chunk)?;
    }
    file.flush()
}
