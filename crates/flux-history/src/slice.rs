use chrono::{DateTime, Duration, Utc};

/// 一个输出时间窗口
///
/// `start`/`end` 总是按时间先后排列；`backward` 只影响报告时间戳
/// 以及 Start/End 类函数取哪一侧的边界。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlice {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,

    /// 是否包含 `end` 时刻（只有整个请求范围的最后一个时间片包含）
    pub closed: bool,

    /// 被请求结束时间截断
    pub partial: bool,

    pub backward: bool,
}

impl TimeSlice {
    /// 报告时间戳：请求方向上的起始边界
    pub fn timestamp(&self) -> DateTime<Utc> {
        if self.backward {
            self.end
        } else {
            self.start
        }
    }

    /// 请求方向上的结束边界
    pub fn trailing_edge(&self) -> DateTime<Utc> {
        if self.backward {
            self.start
        } else {
            self.end
        }
    }

    pub fn width_ms(&self) -> f64 {
        millis_between(self.start, self.end)
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && (t < self.end || (self.closed && t == self.end))
    }
}

/// 两个时间点之间的毫秒数（带小数）
pub fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1000.0,
        None => delta.num_milliseconds() as f64,
    }
}

/// 毫秒数转处理间隔：非正值为零（整个范围一个时间片），超出表示范围时取最大值
pub fn interval_from_millis(ms: i64) -> Duration {
    if ms <= 0 {
        return Duration::zero();
    }
    Duration::try_milliseconds(ms).unwrap_or(Duration::MAX)
}

/// 时间片规划：按请求方向依次产出时间片
#[derive(Debug, Clone)]
pub struct SlicePlan {
    lo: DateTime<Utc>,
    hi: DateTime<Utc>,
    interval: Option<Duration>,
    backward: bool,
    count: u64,
    next: u64,
}

impl SlicePlan {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, interval: Duration) -> Self {
        let backward = end < start;
        let (lo, hi) = if backward { (end, start) } else { (start, end) };
        let total = hi - lo;

        let (interval, count) = if total.is_zero() {
            (None, 0)
        } else if interval <= Duration::zero() {
            (None, 1)
        } else if interval >= total {
            // 整个范围一个时间片，宽度小于间隔时为 Partial
            (Some(interval), 1)
        } else {
            let count = ceil_div(total, interval);
            (Some(interval), count)
        };

        Self {
            lo,
            hi,
            interval,
            backward,
            count,
            next: 0,
        }
    }

    /// 时间片总数
    pub fn slice_count(&self) -> u64 {
        self.count
    }

    pub fn backward(&self) -> bool {
        self.backward
    }

    /// 时间范围（先小后大）
    pub fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.lo, self.hi)
    }

    fn slice_at(&self, index: u64) -> TimeSlice {
        let Some(interval) = self.interval else {
            return TimeSlice {
                start: self.lo,
                end: self.hi,
                closed: true,
                partial: false,
                backward: self.backward,
            };
        };

        // offset < hi - lo，边界只在 [lo, hi] 内移动
        let offset = scale(interval, index);
        let (start, end, closed) = if self.backward {
            let end = self.hi - offset;
            let start = if interval >= end - self.lo {
                self.lo
            } else {
                end - interval
            };
            (start, end, index == 0)
        } else {
            let start = self.lo + offset;
            let end = if interval >= self.hi - start {
                self.hi
            } else {
                start + interval
            };
            (start, end, end == self.hi)
        };

        TimeSlice {
            start,
            end,
            closed,
            partial: end - start < interval,
            backward: self.backward,
        }
    }
}

impl Iterator for SlicePlan {
    type Item = TimeSlice;

    fn next(&mut self) -> Option<TimeSlice> {
        if self.next >= self.count {
            return None;
        }
        let slice = self.slice_at(self.next);
        self.next += 1;
        Some(slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

fn ceil_div(total: Duration, interval: Duration) -> u64 {
    let (t, i) = match (total.num_microseconds(), interval.num_microseconds()) {
        (Some(t), Some(i)) => (i128::from(t), i128::from(i)),
        _ => (
            i128::from(total.num_milliseconds()),
            i128::from(interval.num_milliseconds()),
        ),
    };
    let (t, i) = (t.max(0), i.max(1));
    u64::try_from((t + i - 1) / i).unwrap_or(u64::MAX)
}

fn scale(interval: Duration, index: u64) -> Duration {
    let index = i64::try_from(index).unwrap_or(i64::MAX);
    match interval.num_microseconds() {
        Some(us) => Duration::microseconds(us.saturating_mul(index)),
        None => Duration::try_milliseconds(interval.num_milliseconds().saturating_mul(index))
            .unwrap_or(Duration::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_forward_slices_with_partial_tail() {
        let slices: Vec<_> = SlicePlan::new(t(0), t(25), Duration::seconds(10)).collect();

        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].start, t(0));
        assert_eq!(slices[0].end, t(10));
        assert!(!slices[0].closed);
        assert!(!slices[0].partial);
        assert_eq!(slices[2].start, t(20));
        assert_eq!(slices[2].end, t(25));
        assert!(slices[2].closed);
        assert!(slices[2].partial);
    }

    #[test]
    fn test_backward_slices() {
        let plan = SlicePlan::new(t(25), t(0), Duration::seconds(10));
        assert!(plan.backward());

        let slices: Vec<_> = plan.collect();
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].timestamp(), t(25));
        assert_eq!(slices[0].start, t(15));
        assert!(slices[0].closed);
        assert_eq!(slices[2].start, t(0));
        assert_eq!(slices[2].end, t(5));
        assert!(slices[2].partial);
        assert_eq!(slices[2].trailing_edge(), t(0));
    }

    #[test]
    fn test_zero_interval_gives_single_slice() {
        let slices: Vec<_> = SlicePlan::new(t(0), t(7), Duration::zero()).collect();
        assert_eq!(slices.len(), 1);
        assert!(!slices[0].partial);
        assert!(slices[0].contains(t(7)));
        assert_eq!(slices[0].width_ms(), 7000.0);
    }

    #[test]
    fn test_empty_range_has_no_slices() {
        assert_eq!(SlicePlan::new(t(3), t(3), Duration::seconds(1)).slice_count(), 0);
    }

    #[test]
    fn test_interior_boundary_belongs_to_later_slice() {
        let slices: Vec<_> = SlicePlan::new(t(0), t(20), Duration::seconds(10)).collect();
        assert!(!slices[0].contains(t(10)));
        assert!(slices[1].contains(t(10)));
        assert!(slices[1].contains(t(20)));
    }

    #[test]
    fn test_interval_wider_than_range() {
        for interval in [
            Duration::seconds(9),
            Duration::milliseconds(i64::MAX / 2),
            Duration::MAX,
        ] {
            let forward: Vec<_> = SlicePlan::new(t(0), t(9), interval).collect();
            assert_eq!(forward.len(), 1);
            assert_eq!((forward[0].start, forward[0].end), (t(0), t(9)));
            assert!(forward[0].closed);

            let backward: Vec<_> = SlicePlan::new(t(9), t(0), interval).collect();
            assert_eq!(backward.len(), 1);
            assert_eq!((backward[0].start, backward[0].end), (t(0), t(9)));
        }

        // 间隔恰好等于范围时不是 Partial
        let exact = SlicePlan::new(t(0), t(9), Duration::seconds(9)).next().unwrap();
        assert!(!exact.partial);
        let wide = SlicePlan::new(t(0), t(9), Duration::MAX).next().unwrap();
        assert!(wide.partial);
    }

    #[test]
    fn test_interval_from_millis() {
        assert_eq!(interval_from_millis(1500), Duration::milliseconds(1500));
        assert_eq!(interval_from_millis(0), Duration::zero());
        assert_eq!(interval_from_millis(i64::MIN), Duration::zero());
        assert!(interval_from_millis(i64::MAX) > Duration::zero());
    }

    #[test]
    fn test_slice_count_with_extreme_interval() {
        assert_eq!(ceil_div(Duration::seconds(9), Duration::MAX), 1);
        assert_eq!(ceil_div(Duration::MAX, Duration::MAX), 1);
        assert_eq!(ceil_div(Duration::MAX, Duration::milliseconds(1)), i64::MAX as u64);
    }
}
