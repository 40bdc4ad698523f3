//! # Code Generation
//!
//! Converts an SVG IR [`Program`] to a UTF-8 SVG document string.

use super::ops::{Program, SvgOp};

impl Program {
    /// Serialize the program to a complete SVG document.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.4}\" height=\"{h:.4}\" units=\"mm\" viewBox=\"0 0 {w:.4} {h:.4}\">\n",
            w = self.canvas_width_mm,
            h = self.canvas_height_mm,
        ));

        for op in &self.ops {
            match op {
                SvgOp::GroupStart { transform } => match transform {
                    Some(t) => out.push_str(&format!("<g transform=\"{t}\">\n")),
                    None => out.push_str("<g>\n"),
                },
                SvgOp::GroupEnd => out.push_str("</g>\n"),
                SvgOp::Circle { cx, cy, r } => {
                    out.push_str(&format!(
                        "<circle cx=\"{cx:.4}\" cy=\"{cy:.4}\" r=\"{r:.4}\" fill=\"#000000\" stroke=\"none\"/>\n",
                    ));
                }
                SvgOp::Rect { x, y, size } => {
                    out.push_str(&format!(
                        "<rect x=\"{x:.4}\" y=\"{y:.4}\" width=\"{size:.4}\" height=\"{size:.4}\" fill=\"#000000\" stroke=\"none\"/>\n",
                    ));
                }
                SvgOp::Text { x, y, font_size, content, transform } => {
                    let t = transform
                        .as_ref()
                        .map(|t| format!(" transform=\"{t}\""))
                        .unwrap_or_default();
                    out.push_str(&format!(
                        "<text x=\"{x:.4}\" y=\"{y:.4}\" font-size=\"{font_size:.4}\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"#000000\" stroke=\"none\"{t}>{content}</text>\n",
                    ));
                }
                SvgOp::Raw(fragment) => {
                    out.push_str(fragment);
                    out.push('\n');
                }
            }
        }

        out.push_str("</svg>\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_xml_declaration_and_root_svg() {
        let program = Program::new(148.0, 113.7);
        let xml = program.to_xml();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(xml.contains("units=\"mm\""));
        assert!(xml.contains("width=\"148.0000\""));
        assert!(xml.contains("height=\"113.7000\""));
    }

    #[test]
    fn every_primitive_carries_explicit_fill_and_no_stroke() {
        let mut program = Program::new(148.0, 113.7);
        program.push(SvgOp::Circle { cx: 1.0, cy: 1.0, r: 0.05 });
        program.push(SvgOp::Rect { x: 2.0, y: 2.0, size: 1.0 });
        program.push(SvgOp::Text {
            x: 3.0,
            y: 3.0,
            font_size: 2.0,
            content: "X".to_string(),
            transform: None,
        });
        let xml = program.to_xml();
        assert_eq!(xml.matches("fill=\"#000000\"").count(), 3);
        assert_eq!(xml.matches("stroke=\"none\"").count(), 3);
        assert!(!xml.contains("style="));
    }

    #[test]
    fn groups_nest_with_transform_attributes() {
        let mut program = Program::new(148.0, 113.7);
        program.push(SvgOp::GroupStart { transform: Some("translate(0, 1.0)".to_string()) });
        program.push(SvgOp::Circle { cx: 0.0, cy: 0.0, r: 0.05 });
        program.push(SvgOp::GroupEnd);
        let xml = program.to_xml();
        assert!(xml.contains("<g transform=\"translate(0, 1.0)\">"));
        assert!(xml.contains("</g>"));
    }
}
