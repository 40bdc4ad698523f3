//! # Text Renderer
//!
//! Renders `module_id`, `serial_url`, and LED-code free text. Baseline is
//! centered at the configured origin; rotation is supported at any angle
//! (0/90/180/270 are common but not special-cased).
//!
//! ## Tracking
//!
//! The downstream engraving tool ignores CSS letter-spacing and `tspan`
//! `dx` — only explicit per-glyph X coordinates are honored. So any run
//! with `tracking_multiplier != 1.0` is rendered as one `<text>` primitive
//! per character, each with an explicit `x`, spaced at
//! `nominal_advance_mm(text_height_mm) * tracking_multiplier`, and the
//! whole run is horizontally centered around the origin X.

/// Nominal per-character advance for the thin sans geometry, as a function
/// of the configured text height. Only metrics matter for placement — the
/// laser host substitutes the actual font at engrave time (spec Open
/// Questions).
pub fn nominal_advance_mm(text_height_mm: f64) -> f64 {
    text_height_mm * 0.6
}

/// A single free-text element to render.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub content: String,
    pub origin_mm: (f64, f64),
    pub rotation_deg: f64,
    pub text_height_mm: f64,
    /// `None` or `Some(1.0)` means default spacing (one `<text>` element).
    pub tracking_multiplier: Option<f64>,
}

impl TextRun {
    /// Render this run as SVG. No CSS, no `letter-spacing`, no `tspan`.
    pub fn render_svg(&self) -> String {
        if self.content.is_empty() {
            return String::new();
        }

        match self.tracking_multiplier {
            Some(t) if (t - 1.0).abs() > f64::EPSILON => self.render_tracked(t),
            _ => self.render_single(),
        }
    }

    fn transform_attr(&self, x: f64, y: f64) -> String {
        if self.rotation_deg == 0.0 {
            String::new()
        } else {
            format!(" transform=\"rotate({:.4} {:.4} {:.4})\"", self.rotation_deg, x, y)
        }
    }

    fn render_single(&self) -> String {
        let (x, y) = self.origin_mm;
        format!(
            "<text x=\"{x:.4}\" y=\"{y:.4}\" font-size=\"{h:.4}\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"#000000\" stroke=\"none\"{t}>{content}</text>",
            h = self.text_height_mm,
            t = self.transform_attr(x, y),
            content = escape_text(&self.content),
        )
    }

    fn render_tracked(&self, tracking: f64) -> String {
        let (ox, oy) = self.origin_mm;
        let advance = nominal_advance_mm(self.text_height_mm) * tracking;
        let chars: Vec<char> = self.content.chars().collect();
        let n = chars.len();
        let total_width = advance * (n.saturating_sub(1)) as f64;
        let start_x = ox - total_width / 2.0;

        let mut out = String::new();
        for (i, ch) in chars.iter().enumerate() {
            let x = start_x + advance * i as f64;
            out.push_str(&format!(
                "<text x=\"{x:.4}\" y=\"{y:.4}\" font-size=\"{h:.4}\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"#000000\" stroke=\"none\"{t}>{content}</text>",
                y = oy,
                h = self.text_height_mm,
                t = self.transform_attr(x, oy),
                content = escape_text(&ch.to_string()),
            ));
        }
        out
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &str, tracking: Option<f64>) -> TextRun {
        TextRun {
            content: content.to_string(),
            origin_mm: (10.0, 20.0),
            rotation_deg: 0.0,
            text_height_mm: 2.0,
            tracking_multiplier: tracking,
        }
    }

    #[test]
    fn default_tracking_emits_one_text_element() {
        let svg = run("SN-001", None).render_svg();
        assert_eq!(svg.matches("<text").count(), 1);
        assert!(svg.contains("SN-001"));
    }

    #[test]
    fn tracking_emits_one_element_per_char() {
        let r = run("ABC", Some(1.5));
        let svg = r.render_svg();
        assert_eq!(svg.matches("<text").count(), 3);
    }

    #[test]
    fn tracked_run_is_centered_on_origin_x() {
        let r = run("AB", Some(2.0));
        let advance = nominal_advance_mm(r.text_height_mm) * 2.0;
        // Two chars: centers should be symmetric around origin x.
        let expected_left = r.origin_mm.0 - advance / 2.0;
        let expected_right = r.origin_mm.0 + advance / 2.0;
        let svg = r.render_svg();
        assert!(svg.contains(&format!("x=\"{expected_left:.4}\"")));
        assert!(svg.contains(&format!("x=\"{expected_right:.4}\"")));
    }

    #[test]
    fn rotation_adds_transform() {
        let mut r = run("X", None);
        r.rotation_deg = 90.0;
        let svg = r.render_svg();
        assert!(svg.contains("rotate(90.0000"));
    }

    #[test]
    fn no_css_or_letter_spacing() {
        let svg = run("Z", Some(1.2)).render_svg();
        assert!(!svg.contains("letter-spacing"));
        assert!(!svg.contains("<tspan"));
        assert!(!svg.contains("style="));
    }

    #[test]
    fn empty_content_renders_nothing() {
        assert_eq!(run("", None).render_svg(), "");
    }
}
