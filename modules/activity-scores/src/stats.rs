use chrono::NaiveDate;

/// Counts for one processed hour.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HourOutcome {
    pub events: u64,
    pub scored: u64,
    pub malformed: u64,
}

/// Stats from one score run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreStats {
    pub date: NaiveDate,
    /// `None` when no hour of the day has fully elapsed yet.
    pub last_complete_hour: Option<u32>,
    pub hours_processed: u32,
    pub hours_failed: u32,
    /// Hour whose existing bucket stopped the backward walk.
    pub resumed_at: Option<u32>,
    pub events_processed: u64,
    pub events_scored: u64,
    pub lines_malformed: u64,
    /// Members in the daily summary after the rollup.
    pub summary_members: u64,
    /// Another run held the day's lease; nothing was done.
    pub lease_conflict: bool,
    /// The lease was gone by the time this run released it.
    pub lease_lost: bool,
}

impl ScoreStats {
    pub fn new(date: NaiveDate, last_complete_hour: Option<u32>) -> Self {
        Self {
            date,
            last_complete_hour,
            hours_processed: 0,
            hours_failed: 0,
            resumed_at: None,
            events_processed: 0,
            events_scored: 0,
            lines_malformed: 0,
            summary_members: 0,
            lease_conflict: false,
            lease_lost: false,
        }
    }

    pub fn record_hour(&mut self, outcome: HourOutcome) {
        self.hours_processed += 1;
        self.events_processed += outcome.events;
        self.events_scored += outcome.scored;
        self.lines_malformed += outcome.malformed;
    }
}

impl std::fmt::Display for ScoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Processing Complete ===")?;
        writeln!(f, "Date:             {}", self.date)?;
        match self.last_complete_hour {
            Some(hour) => writeln!(f, "Hours covered:    0-{hour}")?,
            None => writeln!(f, "Hours covered:    none (first UTC hour)")?,
        }
        if self.lease_conflict {
            writeln!(f, "Skipped: another run holds the lease")?;
            return Ok(());
        }
        writeln!(f, "Hours processed:  {}", self.hours_processed)?;
        writeln!(f, "Hours failed:     {}", self.hours_failed)?;
        if let Some(hour) = self.resumed_at {
            writeln!(f, "Resumed at:       hour {hour} (0-{hour} already done)")?;
        }
        writeln!(f, "Events processed: {}", self.events_processed)?;
        writeln!(f, "Events scored:    {}", self.events_scored)?;
        writeln!(f, "Malformed lines:  {}", self.lines_malformed)?;
        writeln!(f, "Summary members:  {}", self.summary_members)?;
        if self.lease_lost {
            writeln!(f, "Warning: lease expired before the run finished")?;
        }
        Ok(())
    }
}
