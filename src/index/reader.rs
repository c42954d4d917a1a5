use crate::index::types::*;
use crate::index::writer::{DICT_FILE, DOC_LENS_FILE, META_FILE, NAMES_FILE, POSTINGS_FILE};
use crate::index::TermIndex;
use crate::merge::EncodedCursor;
use crate::utils::{read_u16_le, read_u32_le, read_u64_le};
use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Term dictionary entry
struct TermDictEntry {
    term: String,
    entry: DictEntry,
}

/// Term dictionary, sorted by term text
struct TermDict {
    entries: Vec<TermDictEntry>,
}

impl TermDict {
    /// Position of the term; term ids are position + 1
    fn position(&self, term: &str) -> Option<usize> {
        self.entries
            .binary_search_by(|e| e.term.as_str().cmp(term))
            .ok()
    }

    fn get(&self, term_id: TermId) -> Option<&DictEntry> {
        let idx = (term_id as usize).checked_sub(1)?;
        self.entries.get(idx).map(|e| &e.entry)
    }
}

/// Memory-mapped, read-only term index.
///
/// Safe to share across threads; postings are never mutated once written.
pub struct IndexReader {
    pub meta: IndexMeta,
    dict: TermDict,
    /// `None` when the postings file is empty (zero-length files cannot be mapped)
    postings: Option<Mmap>,
    doc_lens: Vec<u32>,
    names: Vec<String>,
}

impl IndexReader {
    /// Open an existing index. Fails when no index is found at `index_path`.
    pub fn open(index_path: &Path) -> Result<Self> {
        let meta_path = index_path.join(META_FILE);
        if !meta_path.exists() {
            bail!("index not found at {}", index_path.display());
        }

        let meta_file = File::open(&meta_path).context("Failed to open meta.json")?;
        let meta: IndexMeta =
            serde_json::from_reader(meta_file).context("Failed to parse meta.json")?;
        if meta.version != IndexMeta::VERSION {
            bail!(
                "Unsupported index version {} (expected {})",
                meta.version,
                IndexMeta::VERSION
            );
        }

        let dict = read_term_dict(&index_path.join(DICT_FILE))?;
        let postings = map_postings(&index_path.join(POSTINGS_FILE))?;
        let doc_lens = read_doc_lens(&index_path.join(DOC_LENS_FILE))?;
        let names = read_names(&index_path.join(NAMES_FILE))?;

        if doc_lens.len() != meta.doc_count as usize {
            bail!(
                "Corrupt index: {} document lengths for {} documents",
                doc_lens.len(),
                meta.doc_count
            );
        }

        debug!(
            path = %index_path.display(),
            docs = meta.doc_count,
            terms = dict.entries.len(),
            "index opened"
        );

        Ok(Self {
            meta,
            dict,
            postings,
            doc_lens,
            names,
        })
    }

    pub fn term_count(&self) -> usize {
        self.dict.entries.len()
    }

    /// Raw encoded posting bytes for a term
    fn posting_bytes(&self, term_id: TermId) -> Option<&[u8]> {
        let entry = self.dict.get(term_id)?;
        let start = entry.offset as usize;
        let end = start.checked_add(entry.length as usize)?;
        match &self.postings {
            Some(mmap) => mmap.get(start..end),
            None if entry.length == 0 => Some(&[]),
            None => None,
        }
    }
}

impl TermIndex for IndexReader {
    type Cursor<'a> = EncodedCursor<'a>;

    fn lookup(&self, term: &str) -> Option<TermId> {
        self.dict.position(term).map(|pos| pos as TermId + 1)
    }

    fn posting(&self, term_id: TermId) -> Option<EncodedCursor<'_>> {
        self.posting_bytes(term_id).map(EncodedCursor::new)
    }

    fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    fn doc_freq(&self, term_id: TermId) -> u32 {
        self.dict.get(term_id).map_or(0, |e| e.doc_freq)
    }

    fn doc_len(&self, doc_id: DocId) -> u32 {
        (doc_id as usize)
            .checked_sub(1)
            .and_then(|idx| self.doc_lens.get(idx))
            .copied()
            .unwrap_or(0)
    }

    fn avg_doc_len(&self) -> f32 {
        self.meta.avg_doc_len()
    }

    fn doc_name(&self, doc_id: DocId) -> Option<&str> {
        let idx = (doc_id as usize).checked_sub(1)?;
        self.names.get(idx).map(String::as_str)
    }
}

fn map_postings(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    // SAFETY: index files are written once and never modified in place
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Some(mmap))
}

/// Read the term dictionary
fn read_term_dict(path: &Path) -> Result<TermDict> {
    let (mut file, file_len) = open_index_file(path)?;

    // u16 length + u64 offset + u32 length + u32 doc_freq, term bytes on top
    let count = read_count(&mut file, path, 18, file_len)?;
    let mut entries = Vec::with_capacity(count);

    for _ in 0..count {
        let term_len = read_u16_le(&mut file)? as usize;
        let mut term_bytes = vec![0u8; term_len];
        file.read_exact(&mut term_bytes)?;
        let term = String::from_utf8(term_bytes).context("Corrupt index: term is not UTF-8")?;

        let offset = read_u64_le(&mut file)?;
        let length = read_u32_le(&mut file)?;
        let doc_freq = read_u32_le(&mut file)?;

        entries.push(TermDictEntry {
            term,
            entry: DictEntry {
                offset,
                length,
                doc_freq,
            },
        });
    }

    // Written from a sorted list; lookups rely on it
    if entries.windows(2).any(|w| w[0].term >= w[1].term) {
        bail!("Corrupt index: term dictionary is not sorted");
    }

    Ok(TermDict { entries })
}

fn open_index_file(path: &Path) -> Result<(BufReader<File>, u64)> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let len = file.metadata()?.len();
    Ok((BufReader::new(file), len))
}

/// Read a record count header, rejecting counts the file cannot hold
fn read_count<R: Read>(reader: &mut R, path: &Path, min_record: u64, file_len: u64) -> Result<usize> {
    let count = read_u32_le(reader)
        .with_context(|| format!("Corrupt index: {} is truncated", path.display()))?;
    if u64::from(count).saturating_mul(min_record) > file_len {
        bail!(
            "Corrupt index: {} claims {} records in {} bytes",
            path.display(),
            count,
            file_len
        );
    }
    Ok(count as usize)
}

/// Read document lengths
fn read_doc_lens(path: &Path) -> Result<Vec<u32>> {
    let (mut file, file_len) = open_index_file(path)?;

    let count = read_count(&mut file, path, 4, file_len)?;
    let mut lens = Vec::with_capacity(count);
    for _ in 0..count {
        lens.push(read_u32_le(&mut file)?);
    }

    Ok(lens)
}

/// Read document names
fn read_names(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let (mut file, file_len) = open_index_file(path)?;

    let count = read_count(&mut file, path, 4, file_len)?;
    let mut names = Vec::with_capacity(count);

    for _ in 0..count {
        let len = read_u32_le(&mut file)? as usize;
        if len as u64 > file_len {
            bail!("Corrupt index: name of {} bytes in {}", len, path.display());
        }
        let mut bytes = vec![0u8; len];
        file.read_exact(&mut bytes)?;
        names.push(String::from_utf8_lossy(&bytes).into_owned());
    }

    Ok(names)
}
