/// Stats from one ingest cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub fetched: u32,
    pub bots_skipped: u32,
    pub inserted: u32,
    pub duplicates: u32,
    pub failed: u32,
    /// Whether this run established the first-inserted-at marker.
    pub created_at_set: bool,
}

impl std::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Ingest Complete ===")?;
        writeln!(f, "Events fetched:  {}", self.fetched)?;
        writeln!(f, "Bots skipped:    {}", self.bots_skipped)?;
        writeln!(f, "Inserted:        {}", self.inserted)?;
        writeln!(f, "Duplicates:      {}", self.duplicates)?;
        writeln!(f, "Failed:          {}", self.failed)?;
        if self.created_at_set {
            writeln!(f, "First run: created-at marker written")?;
        }
        Ok(())
    }
}
