// Plain-text rendering of ranges, close to a unified diff.

use std::fmt;

use linestat_core::{ChangeSummary, Range, RangeType};

fn label(kind: RangeType) -> &'static str {
    match kind {
        RangeType::Inserted => "inserted",
        RangeType::Deleted => "deleted",
        RangeType::Modified => "modified",
    }
}

/// One hunk header per range followed by its base (`-`) and current (`+`)
/// lines. Line numbers are one-based.
pub struct Report<'a> {
    pub ranges: &'a [Range],
    pub base: &'a [String],
    pub current: &'a [String],
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in self.ranges {
            writeln!(
                f,
                "@@ -{},{} +{},{} @@ {}",
                r.base_line1 + 1,
                r.base_len(),
                r.line1 + 1,
                r.current_len(),
                label(r.kind)
            )?;
            for line in self.base.get(r.base_line1..r.base_line2).unwrap_or_default() {
                writeln!(f, "-{}", line)?;
            }
            for line in self.current.get(r.line1..r.line2).unwrap_or_default() {
                writeln!(f, "+{}", line)?;
            }
        }
        let s = ChangeSummary::from_ranges(self.ranges);
        writeln!(
            f,
            "{} changed range{}, +{} -{}",
            s.changed_ranges,
            if s.changed_ranges == 1 { "" } else { "s" },
            s.added_lines,
            s.removed_lines
        )
    }
}

pub fn render(ranges: &[Range], base: &[String], current: &[String]) -> String {
    Report { ranges, base, current }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(s: &[&str]) -> Vec<String> {
        s.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn renders_hunks_and_summary() {
        let base = lines(&["a", "b", "c", "d"]);
        let current = lines(&["a", "x", "y", "c"]);
        let ranges = vec![
            Range::new(1, 3, 1, 2, RangeType::Modified),
            Range::new(4, 4, 3, 4, RangeType::Deleted),
        ];
        let text = render(&ranges, &base, &current);
        assert_eq!(
            text,
            "@@ -2,1 +2,2 @@ modified\n-b\n+x\n+y\n@@ -4,1 +5,0 @@ deleted\n-d\n2 changed ranges, +2 -2\n"
        );
    }

    #[test]
    fn single_range_summary_is_singular() {
        let base = lines(&["a"]);
        let current = lines(&["a", "b"]);
        let ranges = vec![Range::new(1, 2, 1, 1, RangeType::Inserted)];
        let report = Report { ranges: &ranges, base: &base, current: &current };
        assert_eq!(format!("{}", report), "@@ -2,0 +2,1 @@ inserted\n+b\n1 changed range, +1 -0\n");
    }

    #[test]
    fn no_ranges_prints_only_summary() {
        assert_eq!(render(&[], &[], &[]), "0 changed ranges, +0 -0\n");
    }
}
