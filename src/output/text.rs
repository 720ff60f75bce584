//! Human-readable report for duplicate scan results.
//!
//! Renders duplicate groups tier by tier with the kept file marked, then a
//! one-line summary. This is what `scan` prints when no machine format is
//! requested.

use std::io::Write;

use bytesize::ByteSize;

use crate::dedupe::grouping;
use crate::dedupe::{DedupeResult, DuplicateGroup, Fingerprint, GroupingConfig, SimilarityTier};

/// Text renderer over a finished run.
#[derive(Debug)]
pub struct TextReport<'a> {
    result: &'a DedupeResult,
    config: &'a GroupingConfig,
}

impl<'a> TextReport<'a> {
    /// Create a renderer; `config` supplies the threshold shown per tier.
    #[must_use]
    pub fn new(result: &'a DedupeResult, config: &'a GroupingConfig) -> Self {
        Self { result, config }
    }

    /// Write the full report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "Scanned {} images.", self.result.scanned_count)?;

        if self.result.interrupted {
            writeln!(
                writer,
                "Interrupted: results cover only the files hashed before the stop."
            )?;
        }

        if !self.result.has_duplicates() {
            writeln!(writer, "No duplicates found.")?;
            self.write_failures(writer)?;
            return Ok(());
        }

        self.write_tier(
            writer,
            SimilarityTier::Identical,
            self.config.identical_max,
            &self.result.identical_groups,
        )?;
        self.write_tier(
            writer,
            SimilarityTier::Similar,
            self.config.similar_max,
            &self.result.similar_groups,
        )?;
        self.write_failures(writer)?;

        writeln!(
            writer,
            "Summary: {} groups, {} duplicates, {} reclaimable, {} unmatched",
            self.result.group_count(),
            self.result.duplicate_count(),
            ByteSize::b(self.result.reclaimable_bytes()),
            self.result.unmatched.len()
        )?;
        Ok(())
    }

    fn write_tier<W: Write>(
        &self,
        writer: &mut W,
        tier: SimilarityTier,
        threshold: u32,
        groups: &[DuplicateGroup],
    ) -> std::io::Result<()> {
        if groups.is_empty() {
            return Ok(());
        }

        let copies: usize = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        writeln!(writer)?;
        writeln!(
            writer,
            "{} (distance <= {}): {} groups, {} redundant copies",
            heading(tier),
            threshold,
            groups.len(),
            copies
        )?;

        for (i, group) in groups.iter().enumerate() {
            writeln!(
                writer,
                "  [{}] mean distance {:.1}",
                i + 1,
                group.mean_distance
            )?;
            write_file_line(writer, "keep", &group.representative)?;
            for member in &group.members {
                write_file_line(writer, "dup ", member)?;
            }
        }
        Ok(())
    }

    fn write_failures<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.result.hash_failures.is_empty() {
            return Ok(());
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "{} images could not be read:",
            self.result.hash_failures.len()
        )?;
        for failure in &self.result.hash_failures {
            writeln!(writer, "  {}: {}", failure.path.display(), failure.reason)?;
        }
        Ok(())
    }
}

fn heading(tier: SimilarityTier) -> &'static str {
    match tier {
        SimilarityTier::Identical => "Identical",
        SimilarityTier::Similar => "Similar",
    }
}

fn write_file_line<W: Write>(
    writer: &mut W,
    label: &str,
    fingerprint: &Fingerprint,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "      {}  {} ({})",
        label,
        fingerprint.path.display(),
        ByteSize::b(grouping::file_size(&fingerprint.path))
    )
}
