//! Directory file writer
//!
//! Writes the file front to back in one pass. Record offsets are laid
//! out before any record is encoded; the two root offsets in the
//! top-level dataset are patched in place once the records are down.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codec::{encode_meta, Encoder, TransferSyntax, ITEM_HEADER_SIZE, MAGIC, PREAMBLE_LEN};
use crate::dataset::{tags, Dataset, Vr};
use crate::error::{FileSetError, Result};
use crate::tree::{NodeId, RecordTree};

use super::UL_HEADER_SIZE;

/// Summary of a finished directory file
#[derive(Debug, Clone)]
pub struct WrittenDirectory {
    pub path: PathBuf,
    pub record_count: usize,
    pub first_root_offset: u32,
    pub last_root_offset: u32,
    pub file_size: u64,
}

/// Writer for a directory file
pub struct DirectoryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    encoder: Encoder,
    /// Bytes written so far
    position: u64,
    /// File positions of the (0004,1200) and (0004,1202) values
    first_root_at: Option<u64>,
    last_root_at: Option<u64>,
    first_root_offset: u32,
    last_root_offset: u32,
    record_count: usize,
}

impl DirectoryWriter {
    /// Create the file and write the preamble and magic
    ///
    /// Call `write_meta()`, then `write_dataset()`, then `finish()`.
    pub fn new(path: &Path, syntax: TransferSyntax) -> Result<Self> {
        let encoder = Encoder::new(syntax)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            encoder,
            position: 0,
            first_root_at: None,
            last_root_at: None,
            first_root_offset: 0,
            last_root_offset: 0,
            record_count: 0,
        };
        writer.write_bytes(&[0u8; PREAMBLE_LEN])?;
        writer.write_bytes(MAGIC)?;
        Ok(writer)
    }

    /// Write the file meta group
    pub fn write_meta(&mut self, meta: &Dataset) -> Result<()> {
        let bytes = encode_meta(meta)?;
        self.write_bytes(&bytes)
    }

    /// Write the top-level dataset with every record in `tree`
    ///
    /// Any record sequence already in `top` is replaced by the tree. Each
    /// node's offset and pointer fields are updated to match the file.
    pub fn write_dataset(&mut self, mut top: Dataset, tree: &mut RecordTree) -> Result<()> {
        top.remove(tags::DIRECTORY_RECORD_SEQUENCE);
        top.put(tags::OFFSET_OF_FIRST_ROOT_RECORD, 0u32);
        top.put(tags::OFFSET_OF_LAST_ROOT_RECORD, 0u32);
        // Records are items of the top-level dataset and share its character set
        let encoder = self.encoder.scoped(&top);

        let mut head = Vec::new();
        let mut tail = Vec::new();
        for (&tag, element) in &top {
            if tag.is_group_length() {
                continue;
            }
            if tag > tags::DIRECTORY_RECORD_SEQUENCE {
                encoder.write_element(&mut tail, tag, element)?;
                continue;
            }
            let value_at = self.position + head.len() as u64 + UL_HEADER_SIZE;
            match tag {
                tags::OFFSET_OF_FIRST_ROOT_RECORD => self.first_root_at = Some(value_at),
                tags::OFFSET_OF_LAST_ROOT_RECORD => self.last_root_at = Some(value_at),
                _ => {}
            }
            encoder.write_element(&mut head, tag, element)?;
        }
        self.write_bytes(&head)?;

        let order: Vec<NodeId> = tree.iter().collect();
        let start = self.position + encoder.syntax().sequence_header_size();
        let end = assign_offsets(tree, &order, start, &encoder)?;
        link_records(tree, &order)?;

        let mut body = Vec::with_capacity((end - start) as usize);
        for &id in &order {
            encoder.write_item(&mut body, tree[id].record())?;
        }
        if start + body.len() as u64 != end {
            return Err(FileSetError::Codec(format!(
                "record layout expected {} bytes of records but encoded {}",
                end - start,
                body.len()
            )));
        }

        let mut header = Vec::with_capacity(12);
        encoder.write_header(
            &mut header,
            tags::DIRECTORY_RECORD_SEQUENCE,
            Vr::SQ,
            offset_u32(body.len() as u64)?,
        )?;
        self.write_bytes(&header)?;
        self.write_bytes(&body)?;
        self.write_bytes(&tail)?;

        let root_offset = |id: Option<&NodeId>| id.and_then(|id| tree[*id].offset()).unwrap_or(0);
        self.first_root_offset = offset_u32(root_offset(tree.roots().first()))?;
        self.last_root_offset = offset_u32(root_offset(tree.roots().last()))?;
        self.record_count = order.len();
        Ok(())
    }

    /// Flush, then seek back and fill in the two root offsets
    pub fn finish(mut self) -> Result<WrittenDirectory> {
        self.writer.flush()?;

        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| FileSetError::Io(e.into_error()))?;
        for (at, value) in [
            (self.first_root_at, self.first_root_offset),
            (self.last_root_at, self.last_root_offset),
        ] {
            if let Some(at) = at {
                file.seek(SeekFrom::Start(at))?;
                file.write_all(&value.to_le_bytes())?;
            }
        }
        file.sync_all()?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %self.path.display(),
            records = self.record_count,
            bytes = file_size,
            "directory file written"
        );

        Ok(WrittenDirectory {
            path: self.path,
            record_count: self.record_count,
            first_root_offset: self.first_root_offset,
            last_root_offset: self.last_root_offset,
            file_size,
        })
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }
}

/// First pass: give every node the offset of its item header
///
/// Returns the position just past the last record.
fn assign_offsets(
    tree: &mut RecordTree,
    order: &[NodeId],
    start: u64,
    encoder: &Encoder,
) -> Result<u64> {
    let mut cursor = start;
    for &id in order {
        let node = &mut tree[id];
        let record = node.record_mut();
        record.put(tags::OFFSET_OF_NEXT_RECORD, 0u32);
        record.put(tags::OFFSET_OF_LOWER_LEVEL_ENTITY, 0u32);
        let length = encoder.encode_dataset(node.record())?.len() as u64;
        offset_u32(cursor)?;
        node.offset = Some(cursor);
        cursor += ITEM_HEADER_SIZE + length;
    }
    Ok(cursor)
}

/// Second pass: point each record at its next sibling and first child
fn link_records(tree: &mut RecordTree, order: &[NodeId]) -> Result<()> {
    let mut next = HashMap::with_capacity(order.len());
    let view: &RecordTree = tree;
    let levels = std::iter::once(view.roots()).chain(order.iter().map(|&id| view[id].children()));
    for level in levels {
        for pair in level.windows(2) {
            next.insert(pair[0], view[pair[1]].offset().unwrap_or(0));
        }
    }

    for &id in order {
        let next_offset = next.get(&id).copied().unwrap_or(0);
        let lower_offset = tree[id]
            .children()
            .first()
            .and_then(|&child| tree[child].offset())
            .unwrap_or(0);

        let record = tree[id].record_mut();
        record.put(tags::OFFSET_OF_NEXT_RECORD, offset_u32(next_offset)?);
        record.put(tags::OFFSET_OF_LOWER_LEVEL_ENTITY, offset_u32(lower_offset)?);
    }
    Ok(())
}

fn offset_u32(offset: u64) -> Result<u32> {
    u32::try_from(offset).map_err(|_| {
        FileSetError::Capacity(format!(
            "offset {} does not fit in a 32-bit directory record pointer",
            offset
        ))
    })
}
