//! Match chart — a two-slice pie (match vs. remaining) rendered as a standalone SVG.
//!
//! Visual encoding is fixed: green match slice pulled out by a tenth of the radius,
//! orange remainder, slices laid counter-clockwise from 12 o'clock, drop shadow,
//! one-decimal percentage label inside each slice and the category name outside.

use std::f64::consts::PI;

use serde::Serialize;

use crate::analysis::parser::MatchPercentage;

pub const MATCH_LABEL: &str = "Match";
pub const REMAINING_LABEL: &str = "Remaining";
pub const MATCH_COLOR: &str = "#4CAF50";
pub const REMAINING_COLOR: &str = "#FF5733";

const MATCH_EXPLODE: f64 = 0.1;
const START_ANGLE_DEG: f64 = 90.0;

const WIDTH: f64 = 400.0;
const HEIGHT: f64 = 400.0;
const RADIUS: f64 = 130.0;
/// Percentage labels sit at this fraction of the radius, category names just outside.
const PCT_LABEL_DISTANCE: f64 = 0.6;
const NAME_LABEL_DISTANCE: f64 = 1.15;

/// One wedge of the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: &'static str,
    pub value: u8,
    pub color: &'static str,
    /// Radial offset as a fraction of the radius.
    pub explode: f64,
}

/// Two-slice proportion: `[match, remaining]`, always summing to 100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub slices: [ChartSlice; 2],
    pub start_angle_deg: f64,
    pub shadow: bool,
}

impl From<MatchPercentage> for ChartSpec {
    fn from(percentage: MatchPercentage) -> Self {
        ChartSpec {
            slices: [
                ChartSlice {
                    label: MATCH_LABEL,
                    value: percentage.value(),
                    color: MATCH_COLOR,
                    explode: MATCH_EXPLODE,
                },
                ChartSlice {
                    label: REMAINING_LABEL,
                    value: percentage.remainder(),
                    color: REMAINING_COLOR,
                    explode: 0.0,
                },
            ],
            start_angle_deg: START_ANGLE_DEG,
            shadow: true,
        }
    }
}

/// A `ChartSpec` plus its rendered SVG document.
#[derive(Debug, Clone, Serialize)]
pub struct ChartArtifact {
    pub spec: ChartSpec,
    pub svg: String,
}

pub fn render(percentage: MatchPercentage) -> ChartArtifact {
    let spec = ChartSpec::from(percentage);
    let svg = render_svg(&spec);
    ChartArtifact { spec, svg }
}

/// Point on a circle for a math-convention angle (counter-clockwise from 3 o'clock).
/// SVG's y axis points down, hence the subtraction.
fn polar(cx: f64, cy: f64, r: f64, angle_deg: f64) -> (f64, f64) {
    let rad = angle_deg * PI / 180.0;
    (cx + r * rad.cos(), cy - r * rad.sin())
}

fn render_svg(spec: &ChartSpec) -> String {
    let cx = WIDTH / 2.0;
    let cy = HEIGHT / 2.0;

    let mut wedges = String::new();
    let mut labels = String::new();
    let mut angle = spec.start_angle_deg;

    for slice in &spec.slices {
        let sweep = 360.0 * f64::from(slice.value) / 100.0;
        let mid = angle + sweep / 2.0;
        let (ox, oy) = polar(0.0, 0.0, slice.explode * RADIUS, mid);
        let (sx, sy) = (cx + ox, cy + oy);

        if slice.value == MatchPercentage::FULL.value() {
            wedges.push_str(&format!(
                r#"<circle cx="{sx:.2}" cy="{sy:.2}" r="{RADIUS:.2}" fill="{}" data-label="{}"/>"#,
                slice.color, slice.label
            ));
        } else if slice.value > 0 {
            let (x1, y1) = polar(sx, sy, RADIUS, angle);
            let (x2, y2) = polar(sx, sy, RADIUS, angle + sweep);
            let large_arc = u8::from(sweep > 180.0);
            // sweep-flag 0: counter-clockwise on screen
            wedges.push_str(&format!(
                r#"<path d="M {sx:.2} {sy:.2} L {x1:.2} {y1:.2} A {RADIUS:.2} {RADIUS:.2} 0 {large_arc} 0 {x2:.2} {y2:.2} Z" fill="{}" data-label="{}"/>"#,
                slice.color, slice.label
            ));
        }

        if slice.value > 0 {
            let (px, py) = polar(sx, sy, RADIUS * PCT_LABEL_DISTANCE, mid);
            let (nx, ny) = polar(sx, sy, RADIUS * NAME_LABEL_DISTANCE, mid);
            let anchor = if nx < cx - 1.0 {
                "end"
            } else if nx > cx + 1.0 {
                "start"
            } else {
                "middle"
            };
            labels.push_str(&format!(
                r##"<text x="{px:.2}" y="{py:.2}" text-anchor="middle" dominant-baseline="middle" fill="#ffffff">{:.1}%</text><text x="{nx:.2}" y="{ny:.2}" text-anchor="{anchor}" dominant-baseline="middle">{}</text>"##,
                f64::from(slice.value),
                slice.label
            ));
        }

        angle += sweep;
    }

    let mut legend = String::new();
    for (i, slice) in spec.slices.iter().enumerate() {
        let y = 16.0 + 20.0 * i as f64;
        legend.push_str(&format!(
            r#"<rect x="10" y="{:.0}" width="12" height="12" fill="{}"/><text x="28" y="{:.0}">{} ({}%)</text>"#,
            y,
            slice.color,
            y + 10.0,
            slice.label,
            slice.value
        ));
    }

    let filter = if spec.shadow {
        r#"<defs><filter id="shadow" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="4" dy="4" stdDeviation="3" flood-opacity="0.35"/></filter></defs>"#
    } else {
        ""
    };
    let group_attr = if spec.shadow { r#" filter="url(#shadow)""# } else { "" };

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{HEIGHT:.0}" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}" font-family="sans-serif" font-size="14">{filter}<g{group_attr}>{wedges}</g><g>{labels}</g><g>{legend}</g></svg>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(v: u32) -> MatchPercentage {
        MatchPercentage::new(v).unwrap()
    }

    #[test]
    fn test_spec_slices_sum_to_100() {
        let spec = ChartSpec::from(pct(73));
        assert_eq!(spec.slices[0].label, "Match");
        assert_eq!(spec.slices[0].value, 73);
        assert_eq!(spec.slices[1].label, "Remaining");
        assert_eq!(spec.slices[1].value, 27);
    }

    #[test]
    fn test_spec_fixed_encoding() {
        let spec = ChartSpec::from(pct(50));
        assert_eq!(spec.slices[0].color, MATCH_COLOR);
        assert_eq!(spec.slices[1].color, REMAINING_COLOR);
        assert!(spec.slices[0].explode > 0.0);
        assert_eq!(spec.slices[1].explode, 0.0);
        assert_eq!(spec.start_angle_deg, 90.0);
        assert!(spec.shadow);
    }

    #[test]
    fn test_render_regular_value_draws_two_wedges() {
        let chart = render(pct(73));
        assert_eq!(chart.svg.matches("<path").count(), 2);
        assert!(chart.svg.contains("73.0%"));
        assert!(chart.svg.contains("27.0%"));
        assert!(chart.svg.starts_with("<svg"));
        assert!(chart.svg.ends_with("</svg>"));
    }

    #[test]
    fn test_render_zero_is_two_slice_chart() {
        let chart = render(MatchPercentage::ZERO);
        assert_eq!(chart.spec.slices.len(), 2);
        assert_eq!(chart.spec.slices[1].value, 100);
        assert!(chart.svg.contains(r#"<circle"#));
        assert!(chart.svg.contains("Match (0%)"));
        assert!(chart.svg.contains("Remaining (100%)"));
    }

    #[test]
    fn test_render_full_is_two_slice_chart() {
        let chart = render(MatchPercentage::FULL);
        assert_eq!(chart.spec.slices[0].value, 100);
        assert_eq!(chart.spec.slices[1].value, 0);
        assert!(chart.svg.contains(r##"fill="#4CAF50""##));
        assert!(!chart.svg.contains("<path"));
        assert!(chart.svg.contains("Remaining (0%)"));
    }

    #[test]
    fn test_large_slice_uses_large_arc_flag() {
        let chart = render(pct(80));
        // match wedge covers 288 degrees
        assert!(chart.svg.contains(" 0 1 0 "));
    }

    #[test]
    fn test_match_slice_starts_at_twelve_oclock() {
        let chart = render(pct(25));
        // exploded center is shifted up-left; the wedge's first edge runs straight up from it
        let (sx, sy) = polar(200.0, 200.0, MATCH_EXPLODE * RADIUS, 135.0);
        let (x1, y1) = polar(sx, sy, RADIUS, 90.0);
        let expected = format!("L {x1:.2} {y1:.2}");
        assert!(chart.svg.contains(&expected), "missing {expected}");
    }

    #[test]
    fn test_polar_uses_screen_coordinates() {
        let (x, y) = polar(0.0, 0.0, 10.0, 90.0);
        assert!(x.abs() < 1e-9);
        assert!((y + 10.0).abs() < 1e-9);
    }
}
