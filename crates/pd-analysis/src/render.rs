//! Chart rendering backends and the scoped surface that drives them.
//!
//! A backend is acquired through [`ChartSurface::acquire`] and released when
//! the surface drops. Each `draw` returns a [`RenderReceipt`] once the
//! backend has finished, carrying the rendered artifact.

use pd_core::Real;
use serde::Serialize;
use tracing::debug;

use crate::chart::{ChartKind, ChartOptions, RenderableTable};
use crate::error::{AnalysisError, AnalysisResult};

pub trait ChartRenderer {
    /// Prepares the backend for drawing.
    fn acquire(&mut self) -> AnalysisResult<()> {
        Ok(())
    }

    /// Draws `table` and returns the rendered artifact.
    fn draw(&mut self, table: &RenderableTable, options: &ChartOptions) -> AnalysisResult<String>;

    fn release(&mut self) {}
}

/// Completion signal of a draw call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReceipt {
    pub kind: ChartKind,
    pub series_count: usize,
    pub row_count: usize,
    pub placeholder: bool,
    pub artifact: String,
}

/// Scoped handle on a renderer; releases the backend on drop.
pub struct ChartSurface<'r, R: ChartRenderer + ?Sized> {
    renderer: &'r mut R,
}

impl<'r, R: ChartRenderer + ?Sized> ChartSurface<'r, R> {
    pub fn acquire(renderer: &'r mut R) -> AnalysisResult<Self> {
        renderer.acquire()?;
        Ok(Self { renderer })
    }

    pub fn draw(
        &mut self,
        table: &RenderableTable,
        options: &ChartOptions,
    ) -> AnalysisResult<RenderReceipt> {
        let artifact = self.renderer.draw(table, options)?;
        debug!(kind = %table.kind, rows = table.rows.len(), "chart drawn");
        Ok(RenderReceipt {
            kind: table.kind,
            series_count: if table.placeholder {
                0
            } else {
                table.series_count()
            },
            row_count: table.rows.len(),
            placeholder: table.placeholder,
            artifact,
        })
    }
}

impl<R: ChartRenderer + ?Sized> Drop for ChartSurface<'_, R> {
    fn drop(&mut self) {
        self.renderer.release();
    }
}

/// Plain CSV, header first.
#[derive(Debug, Default)]
pub struct CsvRenderer;

impl ChartRenderer for CsvRenderer {
    fn draw(&mut self, table: &RenderableTable, _options: &ChartOptions) -> AnalysisResult<String> {
        Ok(table.to_csv())
    }
}

/// Table and options as one pretty JSON document.
#[derive(Debug, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonChart<'a> {
    options: &'a ChartOptions,
    table: &'a RenderableTable,
}

impl ChartRenderer for JsonRenderer {
    fn draw(&mut self, table: &RenderableTable, options: &ChartOptions) -> AnalysisResult<String> {
        Ok(serde_json::to_string_pretty(&JsonChart { options, table })?)
    }
}

/// Aligned text table for terminals.
#[derive(Debug)]
pub struct TextTableRenderer {
    pub precision: usize,
    active: bool,
}

impl Default for TextTableRenderer {
    fn default() -> Self {
        Self {
            precision: 4,
            active: false,
        }
    }
}

impl TextTableRenderer {
    pub fn new(precision: usize) -> Self {
        Self {
            precision,
            active: false,
        }
    }

    fn cell(&self, value: Option<Real>, is_key: bool) -> String {
        match value {
            None => "-".to_string(),
            Some(v) if is_key => v.to_string(),
            Some(v) => format!("{:.*}", self.precision, v),
        }
    }
}

impl ChartRenderer for TextTableRenderer {
    fn acquire(&mut self) -> AnalysisResult<()> {
        if self.active {
            return Err(AnalysisError::SurfaceUnavailable {
                message: "text surface already acquired".to_string(),
            });
        }
        self.active = true;
        Ok(())
    }

    fn draw(&mut self, table: &RenderableTable, options: &ChartOptions) -> AnalysisResult<String> {
        if !self.active {
            return Err(AnalysisError::Render {
                message: "draw without an acquired surface".to_string(),
            });
        }

        let header: Vec<String> = table
            .columns
            .iter()
            .map(|c| c.label.trim().to_string())
            .collect();
        let body: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, v)| self.cell(*v, i == 0))
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        if let Some(title) = &options.title {
            out.push_str(title);
            out.push('\n');
        }
        if let Some(v_title) = &options.v_axis.title {
            out.push_str(&format!("[{v_title}]\n"));
        }
        let format_row = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{c:>w$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };
        out.push_str(&format_row(&header));
        out.push('\n');
        for row in &body {
            out.push_str(&format_row(row));
            out.push('\n');
        }
        Ok(out)
    }

    fn release(&mut self) {
        self.active = false;
    }
}
