use crate::index::memory::MemoryIndex;
use crate::index::types::*;
use crate::utils::{encode_posting, write_u16_le, write_u32_le, write_u64_le};
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const META_FILE: &str = "meta.json";
pub const DICT_FILE: &str = "terms.dict";
pub const POSTINGS_FILE: &str = "postings.bin";
pub const DOC_LENS_FILE: &str = "doclens.bin";
pub const NAMES_FILE: &str = "names.bin";

/// Writes a [`MemoryIndex`] to an index directory
pub struct IndexWriter {
    index_path: PathBuf,
}

impl IndexWriter {
    pub fn new(index_path: &Path) -> Self {
        Self {
            index_path: index_path.to_path_buf(),
        }
    }

    /// Write the index to disk, replacing any previous files
    pub fn write(&self, index: &MemoryIndex) -> Result<IndexMeta> {
        fs::create_dir_all(&self.index_path).with_context(|| {
            format!("Failed to create index directory {}", self.index_path.display())
        })?;

        let terms = index.sorted_terms();
        if terms.len() > u32::MAX as usize {
            bail!("Too many terms to index: {}", terms.len());
        }

        self.write_dict_and_postings(&terms)?;
        self.write_doc_lens(index.doc_lens())?;
        self.write_names(index.doc_names())?;

        let meta = IndexMeta {
            version: IndexMeta::VERSION,
            doc_count: index.doc_lens().len() as u32,
            term_count: terms.len() as u32,
            total_doc_len: index.total_doc_len(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };

        // meta.json last: its presence marks a complete index
        self.write_meta(&meta)?;

        debug!(
            path = %self.index_path.display(),
            docs = meta.doc_count,
            terms = meta.term_count,
            "index written"
        );

        Ok(meta)
    }

    /// Write the term dictionary and encoded postings
    fn write_dict_and_postings(&self, terms: &[(&str, &[PostingItem])]) -> Result<()> {
        let mut dict = BufWriter::new(File::create(self.index_path.join(DICT_FILE))?);
        let mut postings = BufWriter::new(File::create(self.index_path.join(POSTINGS_FILE))?);

        write_u32_le(&mut dict, terms.len() as u32)?;

        let mut offset = 0u64;
        let mut buf = Vec::new();

        for (term, items) in terms {
            let bytes = term.as_bytes();
            if bytes.len() > u16::MAX as usize {
                bail!("Term too long to index: {} bytes", bytes.len());
            }

            buf.clear();
            encode_posting(items, &mut buf);
            postings.write_all(&buf)?;

            write_u16_le(&mut dict, bytes.len() as u16)?;
            dict.write_all(bytes)?;
            write_u64_le(&mut dict, offset)?;
            write_u32_le(&mut dict, buf.len() as u32)?;
            write_u32_le(&mut dict, items.len() as u32)?;

            offset += buf.len() as u64;
        }

        dict.flush()?;
        postings.flush()?;
        Ok(())
    }

    /// Write document lengths, indexed by doc_id - 1
    fn write_doc_lens(&self, doc_lens: &[u32]) -> Result<()> {
        let mut file = BufWriter::new(File::create(self.index_path.join(DOC_LENS_FILE))?);

        write_u32_le(&mut file, doc_lens.len() as u32)?;
        for &len in doc_lens {
            write_u32_le(&mut file, len)?;
        }

        file.flush()?;
        Ok(())
    }

    /// Write document names: count, then [length, bytes]...
    fn write_names(&self, names: &[String]) -> Result<()> {
        let mut file = BufWriter::new(File::create(self.index_path.join(NAMES_FILE))?);

        write_u32_le(&mut file, names.len() as u32)?;
        for name in names {
            let bytes = name.as_bytes();
            write_u32_le(&mut file, bytes.len() as u32)?;
            file.write_all(bytes)?;
        }

        file.flush()?;
        Ok(())
    }

    fn write_meta(&self, meta: &IndexMeta) -> Result<()> {
        let file = File::create(self.index_path.join(META_FILE))?;
        serde_json::to_writer_pretty(file, meta).context("Failed to write meta.json")?;
        Ok(())
    }
}
