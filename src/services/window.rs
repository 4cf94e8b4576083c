use chrono::{Months, NaiveDateTime, TimeDelta};

/// Inclusive timestamp range handed to the report query as its two bind parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Walks `[start, end]` in calendar-month steps.
///
/// Each window ends one second before the next one starts, and the last
/// window is clamped to `end`. Adding months clamps the day to the end of the
/// target month (Aug 31 + 6 months is Feb 28), and the walk continues from
/// the clamped date.
#[derive(Debug, Clone)]
pub struct Windows {
    cursor: Option<NaiveDateTime>,
    end: NaiveDateTime,
    step: Months,
}

/// A step of zero months yields no windows.
pub fn windows(start: NaiveDateTime, end: NaiveDateTime, step_months: u32) -> Windows {
    Windows {
        cursor: (step_months > 0).then_some(start),
        end,
        step: Months::new(step_months),
    }
}

impl Iterator for Windows {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        let cursor = self.cursor?;
        if cursor > self.end {
            self.cursor = None;
            return None;
        }

        let next = cursor.checked_add_months(self.step);
        let window_end = match next {
            Some(next) => (next - TimeDelta::seconds(1)).min(self.end),
            None => self.end,
        };
        self.cursor = next;

        Some(TimeWindow {
            start: cursor,
            end: window_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    fn assert_contiguous(list: &[TimeWindow], global_end: NaiveDateTime) {
        for w in list {
            assert!(w.start <= w.end, "start after end in {w}");
            assert!(w.end <= global_end, "window {w} overruns the range");
        }
        for pair in list.windows(2) {
            assert_eq!(pair[0].end, pair[1].start - TimeDelta::seconds(1));
        }
    }

    #[test]
    fn test_one_year_yields_two_half_years() {
        let list: Vec<_> = windows(at(2014, 7, 1, 0, 0, 0), at(2015, 6, 30, 0, 0, 0), 6).collect();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].start, at(2014, 7, 1, 0, 0, 0));
        assert_eq!(list[0].end, at(2014, 12, 31, 23, 59, 59));
        assert_eq!(list[1].start, at(2015, 1, 1, 0, 0, 0));
        assert_eq!(list[1].end, at(2015, 6, 30, 0, 0, 0));
    }

    #[test]
    fn test_one_year_ending_last_second() {
        let end = at(2015, 6, 30, 23, 59, 59);
        let list: Vec<_> = windows(at(2014, 7, 1, 0, 0, 0), end, 6).collect();
        assert_eq!(
            list,
            vec![
                TimeWindow {
                    start: at(2014, 7, 1, 0, 0, 0),
                    end: at(2014, 12, 31, 23, 59, 59),
                },
                TimeWindow {
                    start: at(2015, 1, 1, 0, 0, 0),
                    end: at(2015, 6, 30, 23, 59, 59),
                },
            ]
        );
    }

    #[test]
    fn test_full_extraction_range() {
        let end = at(2020, 12, 31, 23, 59, 59);
        let list: Vec<_> = windows(at(2014, 7, 1, 0, 0, 0), end, 6).collect();
        assert_eq!(list.len(), 13);
        assert_eq!(list.last().unwrap().start, at(2020, 7, 1, 0, 0, 0));
        assert_eq!(list.last().unwrap().end, end);
        assert_contiguous(&list, end);
    }

    #[test]
    fn test_remainder_gets_a_short_window() {
        // 20.5 months at a 6-month step: ceil = 4
        let end = at(2016, 3, 15, 12, 0, 0);
        let list: Vec<_> = windows(at(2014, 7, 1, 0, 0, 0), end, 6).collect();
        assert_eq!(list.len(), 4);
        assert_eq!(list[3].start, at(2016, 1, 1, 0, 0, 0));
        assert_eq!(list[3].end, end);
        assert_contiguous(&list, end);
    }

    #[test]
    fn test_start_after_end_yields_nothing() {
        let mut it = windows(at(2016, 1, 1, 0, 0, 0), at(2015, 1, 1, 0, 0, 0), 6);
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn test_single_instant_range() {
        let t = at(2015, 3, 1, 8, 0, 0);
        let list: Vec<_> = windows(t, t, 6).collect();
        assert_eq!(list, vec![TimeWindow { start: t, end: t }]);
    }

    #[test]
    fn test_zero_step_yields_nothing() {
        assert_eq!(windows(at(2014, 7, 1, 0, 0, 0), at(2015, 7, 1, 0, 0, 0), 0).count(), 0);
    }

    #[test]
    fn test_month_end_clamping() {
        let end = at(2015, 12, 31, 23, 59, 59);
        let list: Vec<_> = windows(at(2014, 8, 31, 0, 0, 0), end, 6).collect();
        assert_eq!(list[0].end, at(2015, 2, 27, 23, 59, 59));
        assert_eq!(list[1].start, at(2015, 2, 28, 0, 0, 0));
        assert_eq!(list[1].end, at(2015, 8, 27, 23, 59, 59));
        assert_contiguous(&list, end);
    }

    #[test]
    fn test_display_label() {
        let w = TimeWindow {
            start: at(2014, 7, 1, 0, 0, 0),
            end: at(2014, 12, 31, 23, 59, 59),
        };
        assert_eq!(w.to_string(), "2014-07-01 -> 2014-12-31");
    }
}
