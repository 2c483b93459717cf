//! Human-readable File-set summary

use std::collections::BTreeMap;
use std::fmt;

use crate::dataset::{tags, Tag};
use crate::records::RecordType;
use crate::tree::{NodeId, RecordNode};

use super::FileSet;

const NO_VALUE: &str = "(no value available)";
const INDENT: &str = "  ";

impl fmt::Display for FileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DICOM File-set")?;
        match &self.path {
            Some(path) => writeln!(f, "  Root directory: {}", path.display())?,
            None => writeln!(f, "  Root directory: {}", NO_VALUE)?,
        }
        writeln!(f, "  File-set ID: {}", self.id.as_deref().unwrap_or(NO_VALUE))?;
        writeln!(f, "  File-set UID: {}", self.uid)?;
        match &self.descriptor_file_id {
            Some(file_id) => writeln!(f, "  Descriptor file ID: {}", file_id.join("\\"))?,
            None => writeln!(f, "  Descriptor file ID: {}", NO_VALUE)?,
        }
        write!(
            f,
            "  Descriptor file character set: {}",
            self.descriptor_character_set.as_deref().unwrap_or(NO_VALUE)
        )?;

        if self.is_staged() {
            let mut changes = vec![if self.has_directory {
                "DICOMDIR update".to_string()
            } else {
                "DICOMDIR creation".to_string()
            }];
            if self.stage.restructure {
                changes.push("directory structure update".to_string());
            }
            if !self.stage.additions.is_empty() {
                changes.push(counted(self.stage.additions.len(), "addition"));
            }
            if !self.stage.removals.is_empty() {
                changes.push(counted(self.stage.removals.len(), "removal"));
            }
            write!(f, "\n  Changes staged for write(): {}", changes.join(", "))?;
        }

        if self.tree.is_empty() {
            return Ok(());
        }
        write!(f, "\n\n  Managed instances:")?;
        for line in self.tree_lines() {
            write!(f, "\n    {}", line)?;
        }
        Ok(())
    }
}

impl FileSet {
    /// One line per branch, plus one summary line per leaf type under it
    fn tree_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for id in self.tree.iter() {
            let node = &self.tree[id];
            let depth = self.tree.depth(id);
            let indent = INDENT.repeat(depth);

            if !node.children().is_empty() {
                lines.push(format!("{}{}", indent, describe(node)));
                if node.children().iter().any(|&child| self.tree[child].has_instance()) {
                    lines.extend(self.leaf_summary(node.children(), depth + 1));
                }
            } else if depth == 0 {
                if let Some(instance) = node.instance() {
                    let suffix = if instance.for_addition() {
                        " (to be added)"
                    } else if instance.for_removal() {
                        " (to be removed)"
                    } else {
                        ""
                    };
                    lines.push(format!("{}: 1 SOP Instance{}", node.record_type(), suffix));
                }
            }
        }
        lines
    }

    /// e.g. `IMAGE: 15 SOP Instances (10 initial, 9 additions, 4 removals)`
    fn leaf_summary(&self, siblings: &[NodeId], depth: usize) -> Vec<String> {
        let mut by_type: BTreeMap<String, (usize, usize, usize)> = BTreeMap::new();
        for &id in siblings {
            let node = &self.tree[id];
            if let Some(instance) = node.instance() {
                let counts = by_type
                    .entry(node.record_type().to_string())
                    .or_default();
                counts.0 += 1;
                counts.1 += usize::from(instance.for_addition());
                counts.2 += usize::from(instance.for_removal());
            }
        }

        let indent = INDENT.repeat(depth);
        by_type
            .into_iter()
            .map(|(record_type, (total, added, removed))| {
                let initial = total - added;
                let result = total - removed;

                let mut changes = Vec::new();
                if (added > 0 || removed > 0) && initial > 0 {
                    changes.push(format!("{} initial", initial));
                }
                if added > 0 {
                    changes.push(counted(added, "addition"));
                }
                if removed > 0 {
                    changes.push(counted(removed, "removal"));
                }

                let mut line = format!(
                    "{}{}: {}",
                    indent,
                    record_type,
                    counted(result, "SOP Instance")
                );
                if !changes.is_empty() {
                    line.push_str(&format!(" ({})", changes.join(", ")));
                }
                line
            })
            .collect()
    }
}

/// `PATIENT: PatientID='P1', PatientName='Doe^J'` and the like
fn describe(node: &RecordNode) -> String {
    let record = node.record();
    let text = |tag: Tag| record.string(tag).unwrap_or_default();

    let fields = match node.record_type() {
        RecordType::Patient => format!(
            "PatientID='{}', PatientName='{}'",
            text(tags::PATIENT_ID),
            text(tags::PATIENT_NAME)
        ),
        RecordType::Study => {
            let mut fields = format!(
                "StudyDate={}, StudyTime={}",
                text(tags::STUDY_DATE),
                text(tags::STUDY_TIME)
            );
            let description = text(tags::STUDY_DESCRIPTION);
            if !description.is_empty() {
                fields.push_str(&format!(", StudyDescription='{}'", description));
            }
            fields
        }
        RecordType::Series => format!(
            "Modality={}, SeriesNumber={}",
            text(tags::MODALITY),
            text(tags::SERIES_NUMBER)
        ),
        RecordType::Image => format!("InstanceNumber={}", text(tags::INSTANCE_NUMBER)),
        _ => node.key().to_string(),
    };
    format!("{}: {}", node.record_type(), fields)
}

fn counted(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}
