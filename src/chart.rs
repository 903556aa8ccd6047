// File: src/chart.rs
use crate::core::types::Posterior;
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use std::cmp::Ordering;
use std::io::{self, Write};

const BAR_CHAR: char = '█';

#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    /// Width in cells of a bar at probability 1.
    pub width: usize,
    pub color: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self { width: 40, color: true }
    }
}

/// Horizontal bar chart of the posterior, most likely first. The predicted
/// category is highlighted when color is on and marked with `*` otherwise.
pub fn render_chart<W: Write>(
    out: &mut W,
    posterior: &Posterior,
    predicted: &str,
    style: ChartStyle,
) -> io::Result<()> {
    let mut rows: Vec<(&String, f64)> = posterior.iter().map(|(c, p)| (c, *p)).collect();
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    let label_width = rows.iter().map(|(c, _)| c.chars().count()).max().unwrap_or(0);

    writeln!(out, "Posterior probability")?;
    for (category, p) in rows {
        let cells = (p.clamp(0.0, 1.0) * style.width as f64).round() as usize;
        let bar: String = std::iter::repeat(BAR_CHAR).take(cells).collect();
        let is_predicted = category == predicted;
        let marker = if is_predicted { '*' } else { ' ' };
        let label = format!("{marker} {category:<label_width$} |");
        let value = format!(" {:>6.2}%", p * 100.0);

        if style.color {
            if is_predicted {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }
            let bar_color = if is_predicted { Color::Green } else { Color::DarkGrey };
            queue!(
                out,
                Print(label),
                SetForegroundColor(bar_color),
                Print(bar),
                ResetColor,
                SetAttribute(Attribute::Reset),
                Print(value),
                Print("\n")
            )?;
        } else {
            writeln!(out, "{label}{bar}{value}")?;
        }
    }
    out.flush()
}
