//! Options controlling a hinting run.

use std::collections::BTreeSet;

/// Subpath count above which a dimension is skipped, unless glyphs were
/// selected explicitly.
pub const DEFAULT_MAX_SEGMENTS: usize = 100;

/// When outlines are run through an external overlap remover before
/// analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OverlapPolicy {
    /// Always analyze the outline as provided.
    Never,
    /// Remove overlaps only for glyphs with more than one master.
    #[default]
    MultiMaster,
    /// Remove overlaps for every glyph.
    Always,
}

/// Settings shared by every glyph in a run.
///
/// Options are immutable once a run has started; workers share them
/// through an `Arc`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HintOptions {
    /// Rehint glyphs that already carry hints.
    pub force: bool,
    /// Permit small geometry fixes, such as turning straight curves into
    /// lines.
    pub allow_geometry_changes: bool,
    /// Explicitly selected glyph names. `None` selects every glyph.
    pub glyphs: Option<BTreeSet<String>>,
    pub overlap: OverlapPolicy,
    /// Worker count. `None` uses the available parallelism.
    pub jobs: Option<usize>,
    /// Analyze glyphs and produce reports instead of hints.
    pub report_only: bool,
    /// Allow hint replacement with stems outside the main set.
    pub hint_substitution: bool,
    /// Detect and mark flex curve pairs.
    pub flex: bool,
    /// Accept FdDicts without alignment zones.
    pub allow_no_blues: bool,
    /// Accept FdDicts without dominant stem widths.
    pub allow_no_stems: bool,
    pub max_segments: usize,
}

impl Default for HintOptions {
    fn default() -> Self {
        Self {
            force: false,
            allow_geometry_changes: false,
            glyphs: None,
            overlap: OverlapPolicy::default(),
            jobs: None,
            report_only: false,
            hint_substitution: true,
            flex: true,
            allow_no_blues: false,
            allow_no_stems: false,
            max_segments: DEFAULT_MAX_SEGMENTS,
        }
    }
}

impl HintOptions {
    /// Returns true if the user named the glyphs to process.
    pub fn explicit_glyph_selection(&self) -> bool {
        self.glyphs.is_some()
    }

    /// Returns true if the named glyph is part of this run.
    pub fn selects(&self, name: &str) -> bool {
        self.glyphs
            .as_ref()
            .map(|glyphs| glyphs.contains(name))
            .unwrap_or(true)
    }

    pub(crate) fn removes_overlap(&self, master_count: usize) -> bool {
        match self.overlap {
            OverlapPolicy::Never => false,
            OverlapPolicy::MultiMaster => master_count > 1,
            OverlapPolicy::Always => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_selection() {
        let mut options = HintOptions::default();
        assert!(!options.explicit_glyph_selection());
        assert!(options.selects("a"));
        options.glyphs = Some(["b".to_string()].into_iter().collect());
        assert!(options.explicit_glyph_selection());
        assert!(!options.selects("a"));
        assert!(options.selects("b"));
    }

    #[test]
    fn overlap_policy() {
        let mut options = HintOptions::default();
        assert!(!options.removes_overlap(1));
        assert!(options.removes_overlap(2));
        options.overlap = OverlapPolicy::Never;
        assert!(!options.removes_overlap(2));
        options.overlap = OverlapPolicy::Always;
        assert!(options.removes_overlap(1));
    }
}
