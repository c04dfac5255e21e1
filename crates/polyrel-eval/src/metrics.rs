//! Rank-based binary classification and ranking metrics.
//!
//! These are the standard definitions; no learning logic lives here.
//!
//! - [`auroc`] - area under the ROC curve via the Mann-Whitney rank
//!   statistic, with average ranks for tied scores
//! - [`average_precision`] - area under the precision-recall curve, with
//!   precision taken once per tied-score group
//! - [`apk`] - average precision at cutoff k over a ranked candidate list
//!
//! Degenerate inputs (a missing class) yield `NaN` rather than panicking;
//! the caller decides how to report undefined values.

use std::cmp::Ordering;
use std::collections::HashSet;

/// Area under the ROC curve.
///
/// `labels[i]` marks whether `scores[i]` belongs to the positive class.
/// Tied scores receive their average rank, so a constant scorer comes out
/// at exactly 0.5. Returns `NaN` when either class is empty.
pub fn auroc(labels: &[bool], scores: &[f64]) -> f64 {
    debug_assert_eq!(labels.len(), scores.len());

    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    // Average ranks over tie groups (1-based).
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos_f = n_pos as f64;
    (rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64)
}

/// Average precision (area under the precision-recall curve).
///
/// Precision is evaluated at the end of each tie group, so equal-scored
/// positives and negatives share one operating point instead of taking
/// whichever interleaving the sort happened to produce; a constant scorer
/// comes out at exactly the positive prevalence. Returns `NaN` when there
/// are no positives.
pub fn average_precision(labels: &[bool], scores: &[f64]) -> f64 {
    debug_assert_eq!(labels.len(), scores.len());

    let n_pos = labels.iter().filter(|&&l| l).count();
    if n_pos == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut hits = 0usize;
    let mut weighted_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let group_hits = order[i..=j].iter().filter(|&&idx| labels[idx]).count();
        hits += group_hits;
        let precision = hits as f64 / (j + 1) as f64;
        weighted_sum += group_hits as f64 * precision;
        i = j + 1;
    }
    weighted_sum / n_pos as f64
}

/// Average precision at cutoff `k`.
///
/// `predicted` is a ranked candidate list (best first); `actual` is the
/// relevant set. Precision is accumulated at every rank within the top `k`
/// where a relevant item appears, normalized by `min(|actual|, k)`.
pub fn apk(actual: &HashSet<usize>, predicted: &[usize], k: usize) -> f64 {
    if actual.is_empty() || k == 0 {
        return 0.0;
    }

    let mut hits = 0usize;
    let mut score = 0.0;
    for (rank0, item) in predicted.iter().take(k).enumerate() {
        if actual.contains(item) {
            hits += 1;
            score += hits as f64 / (rank0 + 1) as f64;
        }
    }
    score / actual.len().min(k) as f64
}

/// Rank candidate indices by descending score.
///
/// The sort is stable: equal-scored candidates keep their enumeration
/// order, so when positives are enumerated before negatives a constant
/// scorer still ranks every positive ahead of every tied negative.
pub fn rank_by_score(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
    order
}
