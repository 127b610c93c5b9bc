//! Pagination windows across a primary and a backfill result set.
//!
//! The secondary set conceptually follows the primary one in global rank
//! order: global ordinals `1..=primary_total` belong to the primary provider
//! and everything after that to the secondary provider. For a requested page
//! the assembler works out which local offsets of each provider fill the
//! window, then stitches the fetched rows together primary-first.
//!
//! # Example
//!
//! With 6 primary and 35 secondary results at 20 per page:
//!
//! | page | window    | primary   | secondary      |
//! |------|-----------|-----------|----------------|
//! | 1    | `[1,20]`  | 0..6      | 0..14          |
//! | 2    | `[21,40]` | none      | 14..34         |
//! | 3    | `[41,60]` | none      | 34..35         |

use crate::types::Total;

/// A contiguous range of one provider's local result positions (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub offset: u64,
    pub len: u64,
}

impl Slice {
    /// One past the last local position.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// What to fetch, and from where, to fill one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendPlan {
    pub page: u32,
    pub per_page: u32,
    /// First global ordinal of the window (1-based, inclusive).
    pub start: u64,
    /// Last global ordinal of the window (1-based, inclusive).
    pub end: u64,
    pub primary: Option<Slice>,
    pub secondary: Option<Slice>,
    pub total: Total,
    pub total_pages: Option<u64>,
}

/// Rows fetched from one provider, starting at local position `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRows<T> {
    pub offset: u64,
    pub rows: Vec<T>,
}

impl<T> SourceRows<T> {
    pub fn new(offset: u64, rows: Vec<T>) -> Self {
        Self { offset, rows }
    }

    pub fn empty() -> Self {
        Self {
            offset: 0,
            rows: Vec::new(),
        }
    }

    /// Whether these rows cover every position of `slice`, assuming the
    /// provider returns full pages until it runs out.
    pub fn covers(&self, slice: Slice) -> bool {
        slice.offset >= self.offset && slice.end() <= self.offset + self.rows.len() as u64
    }
}

/// The results for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedWindow<T> {
    pub page: u32,
    pub per_page: u32,
    pub start: u64,
    pub end: u64,
    /// Primary rows first, then secondary rows, each in provider rank order.
    pub results: Vec<T>,
    /// How many of `results` came from the primary provider.
    pub primary_count: usize,
    pub total: Total,
    pub total_pages: Option<u64>,
}

impl<T> BlendedWindow<T> {
    /// Ordinal of the first returned result, if any.
    pub fn startrecord(&self) -> Option<u64> {
        (!self.results.is_empty()).then_some(self.start)
    }

    /// Ordinal of the last returned result, if any.
    pub fn endrecord(&self) -> Option<u64> {
        (!self.results.is_empty()).then(|| self.start + self.results.len() as u64 - 1)
    }

    /// How many of `results` came from the secondary provider.
    pub fn secondary_count(&self) -> usize {
        self.results.len() - self.primary_count
    }
}

/// `ceil(total / per_page)` for exact totals; `None` when unbounded.
pub fn total_pages(total: Total, per_page: u32) -> Option<u64> {
    total
        .exact()
        .map(|total| total.div_ceil(u64::from(per_page.max(1))))
}

/// Computes backfill windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlendedResultAssembler {
    primary_max_offset: Option<u64>,
}

impl BlendedResultAssembler {
    /// `primary_max_offset` is the deepest local offset the primary provider
    /// serves; `None` means no limit.
    pub fn new(primary_max_offset: Option<u64>) -> Self {
        Self { primary_max_offset }
    }

    fn reachable(&self, offset: u64) -> bool {
        self.primary_max_offset.map_or(true, |max| offset <= max)
    }

    /// Plan the window for `page`.
    ///
    /// An unbounded primary total serves the whole window from the primary
    /// provider with no backfill. Otherwise the window is split against
    /// `[1, primary_total]` and the remainder comes from the secondary set
    /// starting at its first unused position. A primary slice beyond the
    /// maximum offset is skipped and the window is served from the secondary
    /// set instead, from its start when the window still overlaps the
    /// primary range.
    pub fn plan(&self, primary_total: Total, secondary_total: u64, page: u32, per_page: u32) -> BlendPlan {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let per = u64::from(per_page);
        let start = u64::from(page - 1) * per + 1;
        let end = u64::from(page) * per;

        let Total::Exact(primary_total) = primary_total else {
            let primary = self
                .reachable(start - 1)
                .then_some(Slice {
                    offset: start - 1,
                    len: per,
                });
            return BlendPlan {
                page,
                per_page,
                start,
                end,
                primary,
                secondary: None,
                total: Total::Unbounded,
                total_pages: None,
            };
        };

        let (mut primary, mut secondary_offset) = if end <= primary_total {
            (Some(Slice { offset: start - 1, len: per }), None)
        } else if start > primary_total {
            (None, Some(start - primary_total - 1))
        } else {
            let len = primary_total - start + 1;
            (Some(Slice { offset: start - 1, len }), Some(0))
        };

        if let Some(slice) = primary.filter(|slice| !self.reachable(slice.offset)) {
            tracing::debug!(offset = slice.offset, "primary slice beyond max offset, serving from backfill");
            primary = None;
            secondary_offset = Some(start.saturating_sub(primary_total + 1));
        }

        let wanted = per - primary.map_or(0, |slice| slice.len);
        let secondary = secondary_offset.and_then(|offset| {
            let len = wanted.min(secondary_total.saturating_sub(offset));
            (len > 0).then_some(Slice { offset, len })
        });

        let total = Total::Exact(primary_total + secondary_total);
        BlendPlan {
            page,
            per_page,
            start,
            end,
            primary,
            secondary,
            total,
            total_pages: total_pages(total, per_page),
        }
    }

    /// Cut the planned slices out of the fetched rows and concatenate them,
    /// primary first. Positions the fetched rows do not cover are left out.
    pub fn assemble<T>(
        &self,
        plan: &BlendPlan,
        primary: SourceRows<T>,
        secondary: SourceRows<T>,
    ) -> BlendedWindow<T> {
        let mut results = take(plan.primary, primary);
        let primary_count = results.len();
        results.extend(take(plan.secondary, secondary));

        BlendedWindow {
            page: plan.page,
            per_page: plan.per_page,
            start: plan.start,
            end: plan.end,
            results,
            primary_count,
            total: plan.total,
            total_pages: plan.total_pages,
        }
    }
}

fn take<T>(slice: Option<Slice>, source: SourceRows<T>) -> Vec<T> {
    let Some(slice) = slice else {
        return Vec::new();
    };
    let Some(skip) = slice.offset.checked_sub(source.offset) else {
        return Vec::new();
    };
    source
        .rows
        .into_iter()
        .skip(skip as usize)
        .take(slice.len as usize)
        .collect()
}
