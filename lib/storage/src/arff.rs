//! ARFF writer for the assembled feature vectors
//!
//! One numeric attribute per feature slot, preceded by a string attribute
//! holding the resource subject.

use crate::provenance::Provenance;
use anyhow::{Context, Result};
use simthings_similarity::PipelineOutput;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write the feature table of `output` to `writer`
pub fn write_arff<W: Write>(
    writer: &mut W,
    provenance: &Provenance,
    output: &PipelineOutput,
) -> Result<()> {
    for line in provenance.header_lines(output.resource_count()) {
        writeln!(writer, "% {}", line)?;
    }
    writeln!(writer)?;

    writeln!(writer, "@RELATION {}", quote(&provenance.source_id()))?;
    writeln!(writer)?;
    writeln!(writer, "@ATTRIBUTE subject STRING")?;
    for label in output.schema.slot_labels() {
        writeln!(writer, "@ATTRIBUTE {} NUMERIC", quote(&label))?;
    }
    writeln!(writer)?;

    writeln!(writer, "@DATA")?;
    for (subject, vector) in output.rows() {
        write!(writer, "{}", quote(subject))?;
        for value in vector.as_slice() {
            write!(writer, ",{}", value)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Write `<dir>/<source_id>.arff` and return its path
pub fn write_arff_file<P: AsRef<Path>>(
    dir: P,
    provenance: &Provenance,
    output: &PipelineOutput,
) -> Result<PathBuf> {
    let path = dir.as_ref().join(format!("{}.arff", provenance.source_id()));
    info!("Writing arff to {}", path.display());

    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_arff(&mut writer, provenance, output)?;
    writer.flush()?;
    Ok(path)
}

/// Single-quoted ARFF string
fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use simthings_core::RawRecord;
    use simthings_similarity::Pipeline;

    fn output() -> PipelineOutput {
        let records = vec![
            RawRecord::new("http://example.com/a")
                .with_property("color", "red")
                .with_property("size", "1"),
            RawRecord::new("http://example.com/b")
                .with_property("color", "blue")
                .with_property("size", "3"),
        ];
        Pipeline::default().run(&records).unwrap()
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_arff_layout() {
        let provenance = Provenance::new("demo", vec!["in.json".to_string()]);
        let mut buffer = Vec::new();
        write_arff(&mut buffer, &provenance, &output()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("% Similar resources generated by"));
        assert!(text.contains("% Found 2 distinct resources"));
        assert!(text.contains(&format!("@RELATION '{}'", provenance.source_id())));
        assert!(text.contains("@ATTRIBUTE 'color=red' NUMERIC"));
        assert!(text.contains("@ATTRIBUTE 'color=blue' NUMERIC"));
        assert!(text.contains("@ATTRIBUTE 'size' NUMERIC"));

        // size: sorted [1, 3], median 3, deviation 1
        let data: Vec<&str> = text.split("@DATA\n").nth(1).unwrap().lines().collect();
        assert_eq!(data, vec!["'http://example.com/a',1,0,-2", "'http://example.com/b',0,1,0"]);
    }

    #[test]
    fn test_arff_file_named_by_source_id() {
        let dir = tempfile::tempdir().unwrap();
        let provenance = Provenance::new("demo", vec![]);
        let path = write_arff_file(dir.path(), &provenance, &output()).unwrap();

        assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("{}.arff", provenance.source_id()));
        assert!(std::fs::read_to_string(path).unwrap().contains("@DATA"));
    }
}
