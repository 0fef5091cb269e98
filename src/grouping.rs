//! Stroke grouping: the segmentation half of an oracle.
//!
//! Groups are built either one per ground-truth symbol ([`Granularity::Symbol`])
//! or one per ground-truth stroke ([`Granularity::Stroke`]). Strokes that no
//! ground-truth symbol covers become singleton `ABSENT_<n>` groups, numbered
//! in trace order. The result is always a total partition of the trace.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::annotation::{GroundTruthSymbol, sanitize};
use crate::ink::Trace;

/// Class label of groups not covered by ground truth.
pub const ABSENT_CLASS: &str = "ABSENT";

/// How finely ground-truth symbols are split into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// Every stroke is its own group.
    Stroke,
    /// Every ground-truth symbol is one group.
    Symbol,
}

/// The working hypothesis for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolGroup {
    /// Synthetic identifier, unique within one oracle run.
    pub id: String,
    pub class: String,
    /// Member stroke ids; never empty.
    pub strokes: Vec<String>,
    /// Ground-truth id the group was derived from. Used only to match
    /// relationships; ABSENT groups carry their own synthetic id.
    pub ground_truth_id: String,
}

/// Output identifiers handed out during one grouping pass.
///
/// Ground-truth ids are reserved up front so synthetic ids never shadow them.
struct IdRegistry {
    reserved: HashSet<String>,
    taken: HashSet<String>,
}

impl IdRegistry {
    fn new(symbols: &[GroundTruthSymbol]) -> Self {
        Self {
            reserved: symbols.iter().map(|s| sanitize(&s.id).into_owned()).collect(),
            taken: HashSet::new(),
        }
    }

    fn is_free_synthetic(&self, id: &str) -> bool {
        !self.taken.contains(id) && !self.reserved.contains(id)
    }

    /// Claim a ground-truth id verbatim when possible.
    fn claim_ground_truth(&mut self, id: String) -> String {
        if self.taken.insert(id.clone()) {
            return id;
        }
        self.claim_suffixed(&id)
    }

    /// Claim a synthetic id, avoiding every ground-truth id.
    fn claim_synthetic(&mut self, candidate: String) -> String {
        if self.is_free_synthetic(&candidate) {
            self.taken.insert(candidate.clone());
            return candidate;
        }
        self.claim_suffixed(&candidate)
    }

    fn claim_suffixed(&mut self, base: &str) -> String {
        let mut k = 2usize;
        loop {
            let candidate = format!("{base}~{k}");
            if self.is_free_synthetic(&candidate) {
                self.taken.insert(candidate.clone());
                return candidate;
            }
            k += 1;
        }
    }

    /// Next free `ABSENT_<n>`; `counter` holds the last number used.
    fn claim_absent(&mut self, counter: &mut usize) -> String {
        loop {
            *counter += 1;
            let candidate = format!("{ABSENT_CLASS}_{counter}");
            if self.is_free_synthetic(&candidate) {
                self.taken.insert(candidate.clone());
                return candidate;
            }
        }
    }
}

/// Partition the strokes of `trace` into symbol groups.
///
/// Ground-truth stroke references that are not in the trace, or that an
/// earlier symbol already claimed, are dropped with a warning; a symbol left
/// with no strokes yields no group.
pub fn build_groups(
    trace: &Trace,
    symbols: &[GroundTruthSymbol],
    granularity: Granularity,
) -> Vec<SymbolGroup> {
    let mut registry = IdRegistry::new(symbols);
    let mut assigned: HashSet<&str> = HashSet::new();
    let mut groups = Vec::with_capacity(trace.len());

    for symbol in symbols {
        let gt_id = sanitize(&symbol.id).into_owned();
        let class = sanitize(&symbol.class).into_owned();

        // (position in the ground-truth list, stroke id)
        let mut members: Vec<(usize, &str)> = Vec::with_capacity(symbol.strokes.len());
        for (position, stroke) in symbol.strokes.iter().enumerate() {
            if !trace.contains(stroke) {
                tracing::warn!(
                    symbol = %gt_id,
                    stroke = %stroke,
                    "ground truth references unknown stroke"
                );
                continue;
            }
            if !assigned.insert(stroke.as_str()) {
                tracing::warn!(
                    symbol = %gt_id,
                    stroke = %stroke,
                    "stroke already claimed by another symbol"
                );
                continue;
            }
            members.push((position, stroke.as_str()));
        }
        if members.is_empty() {
            tracing::debug!(symbol = %gt_id, "ground-truth symbol covers no strokes, skipped");
            continue;
        }

        match granularity {
            Granularity::Symbol => groups.push(SymbolGroup {
                id: registry.claim_ground_truth(gt_id.clone()),
                class,
                strokes: members.iter().map(|(_, s)| s.to_string()).collect(),
                ground_truth_id: gt_id,
            }),
            Granularity::Stroke => {
                for (position, stroke) in members {
                    groups.push(SymbolGroup {
                        id: registry.claim_synthetic(format!("{gt_id}_{position}")),
                        class: class.clone(),
                        strokes: vec![stroke.to_string()],
                        ground_truth_id: gt_id.clone(),
                    });
                }
            }
        }
    }

    let mut absent = 0usize;
    for stroke in trace.ids().filter(|id| !assigned.contains(id)) {
        let id = registry.claim_absent(&mut absent);
        groups.push(SymbolGroup {
            ground_truth_id: id.clone(),
            id,
            class: ABSENT_CLASS.to_string(),
            strokes: vec![stroke.to_string()],
        });
    }

    groups
}
