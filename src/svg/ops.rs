//! # SVG IR Opcodes
//!
//! The SVG document assembler composes a document as a flat sequence
//! of opcodes before serializing, the same `Components -> IR -> Codegen`
//! shape the reference receipt assembler uses for its printer bytecode:
//! a program here is inspectable and testable without ever touching a
//! string builder.

/// One drawable or structural opcode in an SVG program.
#[derive(Debug, Clone, PartialEq)]
pub enum SvgOp {
    /// Begin a `<g transform="...">` group. Paired with a matching
    /// [`SvgOp::GroupEnd`].
    GroupStart { transform: Option<String> },

    /// Close the innermost open group.
    GroupEnd,

    /// A filled circle, `cx`/`cy`/`r` in millimetres.
    Circle { cx: f64, cy: f64, r: f64 },

    /// A filled, unstroked square (Data-Matrix / QR cell).
    Rect { x: f64, y: f64, size: f64 },

    /// A single text primitive. `transform` carries a per-element
    /// rotation when the run isn't rotated as a whole group.
    Text {
        x: f64,
        y: f64,
        font_size: f64,
        content: String,
        transform: Option<String>,
    },

    /// A pre-rendered SVG fragment, spliced in verbatim. Used for
    /// leaf-renderer output (Micro-ID grids, Data-Matrix/QR cells, text
    /// runs) that already carries its own `fill`/`stroke` attributes —
    /// modeling every cell as an individual [`SvgOp`] would just be
    /// re-parsing what the renderer already built.
    Raw(String),
}

/// A compiled SVG program: a flat op sequence plus the root canvas size.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub canvas_width_mm: f64,
    pub canvas_height_mm: f64,
    pub ops: Vec<SvgOp>,
}

impl Program {
    pub fn new(canvas_width_mm: f64, canvas_height_mm: f64) -> Self {
        Self {
            canvas_width_mm,
            canvas_height_mm,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: SvgOp) {
        self.ops.push(op);
    }

    pub fn extend(&mut self, ops: impl IntoIterator<Item = SvgOp>) {
        self.ops.extend(ops);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
