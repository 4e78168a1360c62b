use crate::stats::StatisticsSnapshot;
use core::fmt;

/// Result of one complete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Value returned by the program's entry point.
    pub return_value: i32,
    pub statistics: StatisticsSnapshot,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- SimpleSmartLoader Report ---")?;
        writeln!(f, "User _start return value = {}", self.return_value)?;
        writeln!(f, "Total number of page faults = {}", self.statistics.faults)?;
        writeln!(f, "Total number of page allocations = {}", self.statistics.allocations)?;
        writeln!(
            f,
            "Total internal fragmentation = {:.6} KB",
            self.statistics.fragmentation_kib()
        )?;
        write!(f, "------------------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_report_block() {
        let report = Report {
            return_value: 42,
            statistics: StatisticsSnapshot {
                faults: 1,
                allocations: 1,
                fragmentation_bytes: 4080,
            },
        };
        assert_eq!(
            report.to_string(),
            "--- SimpleSmartLoader Report ---\n\
             User _start return value = 42\n\
             Total number of page faults = 1\n\
             Total number of page allocations = 1\n\
             Total internal fragmentation = 3.984375 KB\n\
             ------------------------------"
        );
    }

    #[test]
    fn zero_fragmentation_keeps_six_decimals() {
        let report = Report {
            return_value: -3,
            statistics: StatisticsSnapshot {
                faults: 2,
                allocations: 2,
                fragmentation_bytes: 0,
            },
        };
        let text = report.to_string();
        assert!(text.contains("User _start return value = -3\n"));
        assert!(text.contains("Total internal fragmentation = 0.000000 KB\n"));
    }
}
