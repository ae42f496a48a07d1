//! Style table and conditional style overlays.

use std::collections::BTreeMap;

use crate::grid::SpecGrid;
use crate::spec::{SpecCellFormat, SpecStyleOverlayPolicy};

////////////////////////////////////////////////////////////////////////////////
// #region StyleTable

/// Interned cell formats addressed by id.
#[derive(Debug, Clone, Default)]
pub struct SpecStyleTable {
    l_formats: Vec<SpecCellFormat>,
    dict_id_by_format: BTreeMap<SpecCellFormat, usize>,
}

impl SpecStyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `fmt`, adding it on first sight.
    pub fn intern(&mut self, fmt: SpecCellFormat) -> usize {
        if let Some(id) = self.dict_id_by_format.get(&fmt) {
            return *id;
        }
        let id = self.l_formats.len();
        self.l_formats.push(fmt.clone());
        self.dict_id_by_format.insert(fmt, id);
        id
    }

    pub fn get(&self, id: usize) -> Option<&SpecCellFormat> {
        self.l_formats.get(id)
    }

    /// All formats, indexed by id.
    pub fn formats(&self) -> &[SpecCellFormat] {
        &self.l_formats
    }

    pub fn len(&self) -> usize {
        self.l_formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l_formats.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleOverlay

/// Attribute patch layered over a cell's current style.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumStyleOverlay {
    /// Solid fill with the given color.
    Fill(String),
    /// Horizontal and vertical centering.
    Center,
}

impl EnumStyleOverlay {
    fn to_patch(&self) -> SpecCellFormat {
        match self {
            EnumStyleOverlay::Fill(color) => SpecCellFormat {
                bg_color: Some(color.clone()),
                ..Default::default()
            },
            EnumStyleOverlay::Center => SpecCellFormat {
                align: Some("center".to_string()),
                valign: Some("vcenter".to_string()),
                ..Default::default()
            },
        }
    }
}

/// Applies fills and alignment to body rows.
///
/// Derived styles are cached by `(base style id, overlay)` so cells sharing
/// a base style share one derived style. The cache lives as long as the
/// overlay, i.e. one report.
#[derive(Debug, Clone)]
pub struct StyleOverlay {
    policy: SpecStyleOverlayPolicy,
    height_header: usize,
    dict_derived: BTreeMap<(usize, EnumStyleOverlay), usize>,
}

impl StyleOverlay {
    pub fn new(policy: SpecStyleOverlayPolicy, height_header: usize) -> Self {
        Self {
            policy,
            height_header,
            dict_derived: BTreeMap::new(),
        }
    }

    /// Number of cached derivations.
    pub fn cache_len(&self) -> usize {
        self.dict_derived.len()
    }

    /// Style id of `id_base` with `overlay` applied.
    pub fn derive_style(
        &mut self,
        styles: &mut SpecStyleTable,
        id_base: usize,
        overlay: EnumStyleOverlay,
    ) -> usize {
        if let Some(id) = self.dict_derived.get(&(id_base, overlay.clone())) {
            return *id;
        }
        let fmt_base = styles.get(id_base).cloned().unwrap_or_default();
        let id = styles.intern(fmt_base.merge(&overlay.to_patch()));
        self.dict_derived.insert((id_base, overlay), id);
        id
    }

    /// Restyle body row `row`. Missing cells in styled columns are created
    /// blank.
    pub fn apply_row(&mut self, grid: &mut SpecGrid, styles: &mut SpecStyleTable, row: usize) {
        if row < self.height_header {
            return;
        }

        let if_summary = self
            .policy
            .marker_summary
            .as_ref()
            .is_some_and(|marker| grid.if_row_has_marker(row, marker));

        let mut l_overlays: Vec<(usize, EnumStyleOverlay)> = Vec::new();
        if if_summary {
            if let Some(fill) = &self.policy.summary_fill {
                for col in fill.col_start..=fill.col_end {
                    l_overlays.push((col, EnumStyleOverlay::Fill(fill.color.clone())));
                }
            }
        } else {
            for col in &self.policy.cols_fill {
                l_overlays.push((*col, EnumStyleOverlay::Fill(self.policy.color_fill.clone())));
            }
        }
        for col in &self.policy.cols_center {
            l_overlays.push((*col, EnumStyleOverlay::Center));
        }

        for (col, overlay) in l_overlays {
            let id_base = grid.cell(row, col).id_style;
            let id_derived = self.derive_style(styles, id_base, overlay);
            grid.cell_mut(row, col).id_style = id_derived;
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
