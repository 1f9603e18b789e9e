/// Per-edge affinity statistic accumulators.
///
/// Presented as a capability set (`empty`/`observe`/`combine`/`value`)
/// rather than an inheritance hierarchy: a
/// [`StatisticFamily`] is a stateless (or configuration-only) policy object,
/// and [`Stat`] is the small value it accumulates into per edge.
///
/// [`StatKind`] is the one family this crate ships, covering the four
/// representative instances the design calls for: max affinity, count-weighted
/// mean, a bounded-bin histogram quantile, and an exact vector-backed
/// quantile with a configurable degrade-to-histogram fallback for when the
/// caller has opted into bounded memory up front (resource exhaustion is a
/// configuration choice here, never a runtime surprise).
use std::fmt;

/// A capability set over a statistic family's accumulated value type.
///
/// `combine` must be commutative and associative: combining `(a, b)` then
/// `c` must equal combining `a` then `(b, c)`, and `combine(a, b)` must equal
/// `combine(b, a)` up to the accumulated value (not necessarily up to
/// floating-point bit-identity for the vector-backed quantile, whose
/// `value` is nonetheless bit-identical regardless of combine order since
/// it sorts before selecting).
pub trait StatisticFamily: Clone {
    /// The accumulated per-edge value this family maintains.
    type Stat: Clone + fmt::Debug;

    /// Returns a fresh, empty accumulator.
    fn empty(&self) -> Self::Stat;

    /// Folds one contributing affinity into `stat`.
    fn observe(&self, stat: &mut Self::Stat, affinity: f64);

    /// Merges `src` into `dst` in place. Used when two edges are combined
    /// during [`crate::graph::RegionGraph::merge_nodes`].
    fn combine(&self, dst: &mut Self::Stat, src: &Self::Stat);

    /// Reduces the accumulator to the scalar a [`crate::score::Scoring`]
    /// function consumes.
    fn value(&self, stat: &Self::Stat) -> f64;
}

/// A bounded-bin histogram over `[lo, hi]`, used by both
/// [`StatKind::QuantileHistogram`] and the degraded form of
/// [`StatKind::QuantileVector`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistStat {
    counts: Vec<u64>,
    lo: f64,
    hi: f64,
}

impl HistStat {
    fn new(bins: usize, lo: f64, hi: f64) -> Self {
        Self {
            counts: vec![0u64; bins.max(1)],
            lo,
            hi,
        }
    }

    fn bin_index(&self, affinity: f64) -> usize {
        let bins = self.counts.len();
        if self.hi <= self.lo {
            return 0;
        }
        let frac = ((affinity - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0);
        let idx = (frac * bins as f64) as usize;
        idx.min(bins - 1)
    }

    fn observe(&mut self, affinity: f64) {
        let idx = self.bin_index(affinity);
        self.counts[idx] += 1;
    }

    fn combine(&mut self, other: &Self) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }

    fn quantile(&self, q: f64) -> f64 {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return self.lo;
        }
        let bins = self.counts.len();
        let width = (self.hi - self.lo) / bins as f64;
        let target = q.clamp(0.0, 1.0) * total as f64;
        let mut cumulative = 0.0;
        for (i, &count) in self.counts.iter().enumerate() {
            let next_cumulative = cumulative + count as f64;
            if target <= next_cumulative || i == bins - 1 {
                let bin_lo = self.lo + i as f64 * width;
                if count == 0 {
                    return bin_lo;
                }
                let within = ((target - cumulative) / count as f64).clamp(0.0, 1.0);
                return bin_lo + within * width;
            }
            cumulative = next_cumulative;
        }
        self.hi
    }

    fn from_samples(samples: &[f64], bins: usize, lo: f64, hi: f64) -> Self {
        let mut h = Self::new(bins, lo, hi);
        for &a in samples {
            h.observe(a);
        }
        h
    }
}

/// The exact (vector-backed) or degraded (histogram-backed) accumulator for
/// [`StatKind::QuantileVector`].
#[derive(Debug, Clone, PartialEq)]
pub enum VecStat {
    /// Holds the full multiset of contributing affinities.
    Exact(Vec<f64>),
    /// Degraded to a bounded histogram after exceeding the configured
    /// sample-count capacity.
    Degraded(HistStat),
}

/// Union of every accumulated value a [`StatKind`] family can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Stat {
    /// Running maximum.
    Max(f64),
    /// Running count-weighted sum for a mean.
    Mean {
        /// Sum of observed affinities.
        sum: f64,
        /// Number of observations.
        count: u64,
    },
    /// Bounded-bin histogram.
    Hist(HistStat),
    /// Exact or degraded vector-backed quantile.
    Vec(VecStat),
}

/// Configuration for one of the four representative statistic families.
#[derive(Debug, Clone, PartialEq)]
pub enum StatKind {
    /// Value is the maximum observed affinity; combine is `max`.
    Max,
    /// Value is the count-weighted mean; combine sums counts and weighted
    /// sums.
    Mean,
    /// Value is the interpolated `q`-th quantile of a histogram over
    /// `[lo, hi]`; combine sums bin counts.
    QuantileHistogram {
        /// Number of bins.
        bins: usize,
        /// Quantile in `[0, 1]`.
        q: f64,
        /// Lower bound of the histogram range.
        lo: f64,
        /// Upper bound of the histogram range.
        hi: f64,
    },
    /// Value is the exact `q`-th order statistic of the contributing
    /// multiset; combine concatenates. Degrades to a `fallback_bins`-wide
    /// histogram over `[0, 1]` once the sample count would exceed
    /// `max_samples`, if configured.
    QuantileVector {
        /// Quantile in `[0, 1]`.
        q: f64,
        /// Sample-count capacity before degrading to a histogram. `None`
        /// means unbounded (never degrades).
        max_samples: Option<usize>,
        /// Bin count used for the degraded fallback.
        fallback_bins: usize,
    },
}

impl StatKind {
    fn quantile_of(&self) -> f64 {
        match self {
            Self::QuantileHistogram { q, .. } | Self::QuantileVector { q, .. } => *q,
            Self::Max | Self::Mean => 0.5,
        }
    }
}

impl StatisticFamily for StatKind {
    type Stat = Stat;

    fn empty(&self) -> Stat {
        match self {
            Self::Max => Stat::Max(f64::NEG_INFINITY),
            Self::Mean => Stat::Mean { sum: 0.0, count: 0 },
            Self::QuantileHistogram { bins, lo, hi, .. } => {
                Stat::Hist(HistStat::new(*bins, *lo, *hi))
            }
            Self::QuantileVector { .. } => Stat::Vec(VecStat::Exact(Vec::new())),
        }
    }

    fn observe(&self, stat: &mut Stat, affinity: f64) {
        match (self, stat) {
            (Self::Max, Stat::Max(m)) => *m = m.max(affinity),
            (Self::Mean, Stat::Mean { sum, count }) => {
                *sum += affinity;
                *count += 1;
            }
            (Self::QuantileHistogram { .. }, Stat::Hist(h)) => h.observe(affinity),
            (
                Self::QuantileVector {
                    max_samples,
                    fallback_bins,
                    ..
                },
                Stat::Vec(v),
            ) => match v {
                VecStat::Exact(samples) => {
                    samples.push(affinity);
                    if let Some(max) = max_samples {
                        if samples.len() > *max {
                            let hist = HistStat::from_samples(samples, *fallback_bins, 0.0, 1.0);
                            *v = VecStat::Degraded(hist);
                        }
                    }
                }
                VecStat::Degraded(h) => h.observe(affinity),
            },
            _ => {}
        }
    }

    fn combine(&self, dst: &mut Stat, src: &Stat) {
        match (self, dst, src) {
            (Self::Max, Stat::Max(d), Stat::Max(s)) => *d = d.max(*s),
            (
                Self::Mean,
                Stat::Mean {
                    sum: ds,
                    count: dc,
                },
                Stat::Mean {
                    sum: ss,
                    count: sc,
                },
            ) => {
                *ds += ss;
                *dc += sc;
            }
            (Self::QuantileHistogram { .. }, Stat::Hist(d), Stat::Hist(s)) => d.combine(s),
            (
                Self::QuantileVector {
                    max_samples,
                    fallback_bins,
                    ..
                },
                Stat::Vec(d),
                Stat::Vec(s),
            ) => {
                let combined = match (&d, s) {
                    (VecStat::Exact(dv), VecStat::Exact(sv)) => {
                        let mut merged = dv.clone();
                        merged.extend_from_slice(sv);
                        if let Some(max) = max_samples {
                            if merged.len() > *max {
                                VecStat::Degraded(HistStat::from_samples(
                                    &merged,
                                    *fallback_bins,
                                    0.0,
                                    1.0,
                                ))
                            } else {
                                VecStat::Exact(merged)
                            }
                        } else {
                            VecStat::Exact(merged)
                        }
                    }
                    (VecStat::Degraded(dh), VecStat::Exact(sv)) => {
                        let mut dh = dh.clone();
                        for &a in sv {
                            dh.observe(a);
                        }
                        VecStat::Degraded(dh)
                    }
                    (VecStat::Exact(dv), VecStat::Degraded(sh)) => {
                        let mut sh = sh.clone();
                        for &a in dv {
                            sh.observe(a);
                        }
                        VecStat::Degraded(sh)
                    }
                    (VecStat::Degraded(dh), VecStat::Degraded(sh)) => {
                        let mut dh = dh.clone();
                        dh.combine(sh);
                        VecStat::Degraded(dh)
                    }
                };
                *d = combined;
            }
            _ => {}
        }
    }

    fn value(&self, stat: &Stat) -> f64 {
        match stat {
            Stat::Max(m) => {
                if m.is_finite() {
                    *m
                } else {
                    0.0
                }
            }
            Stat::Mean { sum, count } => {
                if *count == 0 {
                    0.0
                } else {
                    sum / *count as f64
                }
            }
            Stat::Hist(h) => h.quantile(self.quantile_of()),
            Stat::Vec(VecStat::Exact(samples)) => {
                if samples.is_empty() {
                    return 0.0;
                }
                let mut sorted = samples.clone();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let q = self.quantile_of().clamp(0.0, 1.0);
                let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
                sorted[idx.min(sorted.len() - 1)]
            }
            Stat::Vec(VecStat::Degraded(h)) => h.quantile(self.quantile_of()),
        }
    }
}
